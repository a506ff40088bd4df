//! User entity definitions

use ecole_database::{Record, Table};
use serde::{Deserialize, Serialize};

/// Portal user. Administrators carry no class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub role: Role,
    pub email: String,
    #[serde(default)]
    pub class_id: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Admins and class responsibles may publish class content.
    pub fn can_publish(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Responsible)
    }
}

impl Record for User {
    const TABLE: Table = Table::Users;

    fn id(&self) -> &str {
        &self.id
    }
}

/// User role enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Responsible,
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Responsible => "RESPONSIBLE",
            Role::Student => "STUDENT",
        }
    }

    /// Map a free-text token to a role. Anything unrecognised is a student.
    pub fn from_token(token: &str) -> Self {
        let token = token.trim();
        if token.eq_ignore_ascii_case("ADMIN") {
            Role::Admin
        } else if token.eq_ignore_ascii_case("RESPONSIBLE") {
            Role::Responsible
        } else {
            Role::Student
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
