//! User accounts and opaque session tokens.

mod accounts;
mod password;
mod token;

pub use accounts::{LoginOutcome, Registration, authenticate, login, logout, normalize_email, register};
pub use password::{hash_password, verify_password};
pub use token::{generate_session_token, hash_token};
