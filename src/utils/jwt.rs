use chrono::{Duration, Utc};
use jsonwebtoken::{
    DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode, errors::ErrorKind,
};

use crate::errors::{Error, Result};

pub const ISSUER: &str = "hive-api";

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct Claims {
    /// Account record key
    pub id: String,
    pub exp: usize,
    pub iat: usize,
    pub iss: String,
}

impl Claims {
    pub fn new(id: String, ttl_minutes: i64) -> Self {
        let now = Utc::now();
        Self {
            id,
            exp: (now + Duration::minutes(ttl_minutes)).timestamp() as usize,
            iat: now.timestamp() as usize,
            iss: ISSUER.to_string(),
        }
    }
}

pub fn encode_jwt(claim: &Claims, secret: &str) -> Result<String> {
    let token = encode(
        &Header::default(),
        claim,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

/// Decodes and validates a bearer token. Failures are reported as authentication errors.
pub fn decode_jwt(token: &str, secret: &str) -> Result<TokenData<Claims>> {
    let mut validation = Validation::default();
    validation.set_issuer(&[ISSUER]);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => Error::TokenExpired,
        _ => Error::InvalidToken,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_and_decode() {
        let claims = Claims::new("abc".to_string(), 5);
        let token = encode_jwt(&claims, "secret").expect("encode");
        let data = decode_jwt(&token, "secret").expect("decode");
        assert_eq!(data.claims.id, "abc");
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = encode_jwt(&Claims::new("abc".to_string(), 5), "secret").unwrap();
        assert!(matches!(
            decode_jwt(&token, "other"),
            Err(Error::InvalidToken)
        ));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let token = encode_jwt(&Claims::new("abc".to_string(), -10), "secret").unwrap();
        assert!(matches!(
            decode_jwt(&token, "secret"),
            Err(Error::TokenExpired)
        ));
    }
}
