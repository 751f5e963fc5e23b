use rand::RngCore;
use sha2::{Digest, Sha256};

/// SHA-256 hex digest of a session token; only the digest is persisted.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

pub fn generate_session_token() -> String {
    let mut buf = [0u8; 32];
    rand::rng().fill_bytes(&mut buf);
    format!("cov_{}", hex::encode(buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_token_is_deterministic_hex() {
        let h1 = hash_token("test");
        assert_eq!(h1, hash_token("test"));
        assert_eq!(h1.len(), 64);
        assert!(h1.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn session_tokens_are_prefixed_and_unique() {
        let a = generate_session_token();
        let b = generate_session_token();
        assert!(a.starts_with("cov_"));
        assert_eq!(a.len(), 4 + 64);
        assert_ne!(a, b);
    }
}
