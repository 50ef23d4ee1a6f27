use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};

use crate::consts::limits::INVITATION_TOKEN_LEN;

/// Returns a fresh bearer token and its digest. Only the digest may be persisted.
pub fn generate_invitation_token() -> (String, String) {
    let token = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(INVITATION_TOKEN_LEN)
        .map(char::from)
        .collect::<String>();

    let hash = hash_token(&token);
    (token, hash)
}

pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());

    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_token_matches_its_hash() {
        let (token, hash) = generate_invitation_token();
        assert_eq!(token.len(), INVITATION_TOKEN_LEN);
        assert_eq!(hash.len(), 64);
        assert_eq!(hash_token(&token), hash);
        assert_ne!(token, hash);
    }

    #[test]
    fn test_tokens_are_unique() {
        let (a, _) = generate_invitation_token();
        let (b, _) = generate_invitation_token();
        assert_ne!(a, b);
    }
}
