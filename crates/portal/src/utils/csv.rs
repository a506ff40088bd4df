//! CSV text helpers for user import and exam export.

use crate::entities::{ClassGroup, Exam, Role};
use crate::types::NewUser;

/// Result of parsing an import payload, before any user is created.
#[derive(Debug, Default)]
pub struct ParsedImport {
    pub rows: Vec<NewUser>,
    pub skipped: usize,
}

/// Parse `name,email,role,class` lines.
///
/// A leading header line (second column titled like "email", "courriel" or
/// "adresse") is ignored, as are blank lines. Fields are trimmed of whitespace and quote characters.
/// Rows without a name or an e-mail are counted as skipped.
pub fn parse_user_rows(payload: &str, classes: &[ClassGroup]) -> ParsedImport {
    let mut parsed = ParsedImport::default();
    let mut lines = payload.lines().filter(|line| !line.trim().is_empty()).peekable();

    if lines.peek().map(|line| is_header(line)).unwrap_or(false) {
        lines.next();
    }

    for line in lines {
        let fields: Vec<String> = line.split(',').map(clean_field).collect();
        let field = |index: usize| fields.get(index).map(String::as_str).unwrap_or("");

        let name = field(0);
        let email = field(1);
        if name.is_empty() || email.is_empty() {
            parsed.skipped += 1;
            continue;
        }

        parsed.rows.push(NewUser {
            name: name.to_string(),
            email: email.to_string(),
            role: Role::from_token(field(2)),
            class_id: resolve_class(field(3), classes),
            avatar: None,
        });
    }

    parsed
}

const EMAIL_TITLES: [&str; 3] = ["mail", "courriel", "adresse"];

fn is_header(line: &str) -> bool {
    line.split(',')
        .nth(1)
        .map(|column| {
            let column = clean_field(column).to_lowercase();
            !column.contains('@') && EMAIL_TITLES.iter().any(|title| column.contains(title))
        })
        .unwrap_or(false)
}

fn clean_field(raw: &str) -> String {
    raw.trim()
        .trim_matches(|ch| ch == '"' || ch == '\'')
        .trim()
        .to_string()
}

/// Case-insensitive exact match on the class name.
fn resolve_class(name: &str, classes: &[ClassGroup]) -> Option<String> {
    if name.is_empty() {
        return None;
    }
    let wanted = name.to_lowercase();
    classes
        .iter()
        .find(|class| class.name.trim().to_lowercase() == wanted)
        .map(|class| class.id.clone())
}

/// Render the exam schedule as CSV, one exam per line in the given order.
pub fn exams_to_csv(exams: &[Exam], classes: &[ClassGroup]) -> String {
    let mut out = String::from("Matière,Date,Durée (min),Salle,Classe,Notes\r\n");
    for exam in exams {
        let class_name = classes
            .iter()
            .find(|class| class.id == exam.class_id)
            .map(|class| class.name.as_str())
            .unwrap_or("");
        let duration = exam.duration_minutes.to_string();
        let date = exam.date.to_rfc3339();
        let cells = [
            exam.subject.as_str(),
            date.as_str(),
            duration.as_str(),
            exam.room.as_str(),
            class_name,
            exam.notes.as_deref().unwrap_or(""),
        ];
        let line: Vec<String> = cells.iter().map(|cell| quote(cell)).collect();
        out.push_str(&line.join(","));
        out.push_str("\r\n");
    }
    out
}

fn quote(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn classes() -> Vec<ClassGroup> {
        vec![ClassGroup {
            id: "c-a".into(),
            name: "ClassA".into(),
            description: None,
            contact_email: None,
        }]
    }

    #[test]
    fn skips_rows_without_name_or_email() {
        let payload = "Nom,Email,Role,Classe\n\
                       Jean Dupont,jean@x.com,STUDENT,ClassA\n\
                       ,missing@x.com,STUDENT,ClassA\n\
                       NoEmail,,STUDENT,ClassA\n";

        let parsed = parse_user_rows(payload, &classes());

        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.skipped, 2);
        assert_eq!(parsed.rows[0].name, "Jean Dupont");
        assert_eq!(parsed.rows[0].class_id.as_deref(), Some("c-a"));
    }

    #[test]
    fn headerless_payload_keeps_first_row() {
        let parsed = parse_user_rows("Jean Dupont,jean@x.com,STUDENT,ClassA", &classes());
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.skipped, 0);
    }

    #[test]
    fn french_headers_are_recognised() {
        for header in ["Nom,Courriel,Rôle,Classe", "Nom,Adresse électronique,Rôle,Classe"] {
            let payload = format!("{header}\nJean Dupont,jean@x.com,STUDENT,ClassA\n");
            let parsed = parse_user_rows(&payload, &classes());
            assert_eq!(parsed.rows.len(), 1, "{header}");
            assert_eq!(parsed.skipped, 0, "{header}");
        }
    }

    #[test]
    fn roles_and_classes_are_resolved_loosely() {
        let payload = "\"Alice\", \"alice@x.com\" ,admin,\n\
                       Bob,bob@x.com,Responsible,classa\n\
                       Chloé,chloe@x.com,prof,Terminale Z\n";

        let parsed = parse_user_rows(payload, &classes());

        assert_eq!(parsed.rows.len(), 3);
        assert_eq!(parsed.rows[0].name, "Alice");
        assert_eq!(parsed.rows[0].email, "alice@x.com");
        assert_eq!(parsed.rows[0].role, Role::Admin);
        assert_eq!(parsed.rows[0].class_id, None);
        assert_eq!(parsed.rows[1].role, Role::Responsible);
        assert_eq!(parsed.rows[1].class_id.as_deref(), Some("c-a"));
        assert_eq!(parsed.rows[2].role, Role::Student);
        assert_eq!(parsed.rows[2].class_id, None);
    }

    #[test]
    fn export_quotes_special_cells() {
        let exam = Exam {
            id: "e1".into(),
            subject: "Algèbre".into(),
            date: Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap(),
            duration_minutes: 90,
            room: "S1".into(),
            notes: Some("Calculatrice \"collège\", règle".into()),
            author_id: "u1".into(),
            class_id: "c-a".into(),
        };

        let csv = exams_to_csv(&[exam], &classes());
        let lines: Vec<&str> = csv.split("\r\n").collect();

        assert_eq!(lines[0], "Matière,Date,Durée (min),Salle,Classe,Notes");
        assert_eq!(
            lines[1],
            "Algèbre,2025-01-10T09:00:00+00:00,90,S1,ClassA,\"Calculatrice \"\"collège\"\", règle\""
        );
    }
}
