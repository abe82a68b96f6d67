use serde::{Deserialize, Serialize};

use super::Identity;

/// A registered voter and their voting status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Voter {
    pub id: Identity,
    pub name: String,
    pub national_id: String,
    pub age: u32,
    pub is_registered: bool,
    pub has_voted: bool,
    /// Only ever set together with `has_voted`.
    pub voted_for: Option<Identity>,
}

impl Voter {
    /// Create a freshly registered voter who has not voted.
    pub fn new(id: Identity, name: String, national_id: String, age: u32) -> Self {
        Self {
            id,
            name,
            national_id,
            age,
            is_registered: true,
            has_voted: false,
            voted_for: None,
        }
    }

    /// Check a credential-based login attempt against this record.
    pub fn matches_credentials(&self, national_id: &str) -> bool {
        self.is_registered && self.national_id == national_id
    }
}
