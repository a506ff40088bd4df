//! Poll entity and the single-choice voting rules

use chrono::{DateTime, Utc};
use ecole_database::{Record, Table};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum PollType {
    #[default]
    Single,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollOption {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub voter_ids: Vec<String>,
}

impl PollOption {
    pub fn votes(&self) -> usize {
        self.voter_ids.len()
    }
}

/// A class poll. A user id appears in at most one option's `voter_ids`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    pub id: String,
    pub question: String,
    #[serde(rename = "type", default)]
    pub poll_type: PollType,
    pub options: Vec<PollOption>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_anonymous: bool,
    pub class_id: String,
}

impl Poll {
    pub fn option(&self, option_id: &str) -> Option<&PollOption> {
        self.options.iter().find(|option| option.id == option_id)
    }

    /// The option currently holding `user_id`'s vote.
    pub fn choice_of(&self, user_id: &str) -> Option<&PollOption> {
        self.options
            .iter()
            .find(|option| option.voter_ids.iter().any(|voter| voter == user_id))
    }

    pub fn total_votes(&self) -> usize {
        self.options.iter().map(PollOption::votes).sum()
    }

    /// Move `user_id`'s single vote onto `option_id`.
    ///
    /// The id is removed from every option, then appended to the target.
    /// Returns `false` (leaving the poll untouched) if the option does not
    /// exist.
    pub fn cast_vote(&mut self, option_id: &str, user_id: &str) -> bool {
        if self.option(option_id).is_none() {
            return false;
        }

        for option in &mut self.options {
            option.voter_ids.retain(|voter| voter != user_id);
        }
        if let Some(target) = self.options.iter_mut().find(|option| option.id == option_id) {
            target.voter_ids.push(user_id.to_string());
        }
        true
    }
}

impl Record for Poll {
    const TABLE: Table = Table::Polls;

    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poll() -> Poll {
        Poll {
            id: "p1".into(),
            question: "Sortie au musée ?".into(),
            poll_type: PollType::Single,
            options: vec![
                PollOption {
                    id: "a".into(),
                    label: "Oui".into(),
                    voter_ids: vec![],
                },
                PollOption {
                    id: "b".into(),
                    label: "Non".into(),
                    voter_ids: vec![],
                },
            ],
            active: true,
            created_at: Utc::now(),
            is_anonymous: false,
            class_id: "c1".into(),
        }
    }

    #[test]
    fn vote_transfer_moves_the_single_vote() {
        let mut poll = poll();
        assert!(poll.cast_vote("a", "u1"));
        assert!(poll.cast_vote("b", "u1"));

        assert_eq!(poll.option("a").unwrap().votes(), 0);
        assert_eq!(poll.option("b").unwrap().voter_ids, vec!["u1".to_string()]);
        assert_eq!(poll.total_votes(), 1);
    }

    #[test]
    fn revoting_same_option_keeps_counts() {
        let mut poll = poll();
        poll.cast_vote("a", "u1");
        poll.cast_vote("a", "u2");
        poll.cast_vote("a", "u1");

        assert_eq!(poll.option("a").unwrap().votes(), 2);
        assert_eq!(poll.option("b").unwrap().votes(), 0);
    }

    #[test]
    fn unknown_option_is_rejected() {
        let mut poll = poll();
        poll.cast_vote("a", "u1");
        assert!(!poll.cast_vote("zzz", "u1"));
        assert_eq!(poll.choice_of("u1").map(|o| o.id.as_str()), Some("a"));
    }

    #[test]
    fn single_choice_holds_over_any_sequence() {
        let mut poll = poll();
        let sequence = [
            ("a", "u1"),
            ("b", "u2"),
            ("b", "u1"),
            ("a", "u3"),
            ("a", "u2"),
            ("b", "u3"),
            ("a", "u1"),
        ];
        for (option, user) in sequence {
            poll.cast_vote(option, user);
            for voter in ["u1", "u2", "u3"] {
                let held = poll
                    .options
                    .iter()
                    .filter(|o| o.voter_ids.iter().any(|v| v == voter))
                    .count();
                assert!(held <= 1, "{voter} holds {held} votes");
            }
        }
        assert_eq!(poll.total_votes(), 3);
    }

    #[test]
    fn type_field_uses_wire_name() {
        let value = serde_json::to_value(poll()).unwrap();
        assert_eq!(value["type"], "SINGLE");
        assert!(value.get("pollType").is_none());
        assert_eq!(value["options"][0]["voterIds"], serde_json::json!([]));
    }
}
