//! Division Model

use serde::{Deserialize, Serialize};

/// Division entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Division {
    pub id: String,
    pub name: String,
}
