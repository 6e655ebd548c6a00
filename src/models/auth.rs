//! Login response model.

use serde::{Deserialize, Serialize};

/// Bearer token issued by `POST /auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Token {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

pub fn default_token_type() -> String {
    "bearer".to_string()
}
