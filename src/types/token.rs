use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Serialize, Deserialize, Clone, Copy, Debug)]
pub enum TokenType {
    Session,
    PasswordReset,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::Session => write!(f, "ses"),
            TokenType::PasswordReset => write!(f, "pwr"),
        }
    }
}
