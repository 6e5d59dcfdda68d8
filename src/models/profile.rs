use serde::{Deserialize, Serialize};

/// A row of the `profiles` table, owned by the identity service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub id: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}
