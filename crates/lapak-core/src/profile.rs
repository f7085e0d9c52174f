use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Marketplace role. The backend stores the historical Indonesian wire
/// strings, so the serde names keep them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "pembeli")]
    Buyer,
    #[serde(rename = "penjual")]
    Seller,
}

impl Role {
    #[must_use]
    pub fn is_seller(self) -> bool {
        matches!(self, Role::Seller)
    }

    /// The string stored in the `profiles.role` column.
    #[must_use]
    pub fn as_wire_str(self) -> &'static str {
        match self {
            Role::Buyer => "pembeli",
            Role::Seller => "penjual",
        }
    }
}

/// A row from the `profiles` table, keyed by the auth service's user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub full_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub role: Role,
}
