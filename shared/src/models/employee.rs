//! Employee Model

use serde::{Deserialize, Serialize};

use super::Division;
use crate::util::null_as_default;

/// Generated-initials avatar service
pub const AVATAR_FALLBACK_URL: &str = "https://ui-avatars.com/api/";

/// Employee entity (division embedded, not resolved client-side)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: String,
    /// Image URL, empty when the employee has no photo
    #[serde(default, deserialize_with = "null_as_default")]
    pub image: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub phone: String,
    pub division: Division,
    pub position: String,
}

impl Employee {
    /// Photo URL, or a generated initials avatar when there is none
    pub fn avatar_url(&self) -> String {
        if !self.image.is_empty() {
            return self.image.clone();
        }
        format!(
            "{}?name={}&background=09617c&color=fff",
            AVATAR_FALLBACK_URL,
            urlencoding::encode(&self.name)
        )
    }
}
