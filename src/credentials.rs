//! Password hashing and signed session tokens.
//!
//! Passwords are stored as `pbkdf2-sha256$<iterations>$<salt>$<hash>` with
//! standard base64 fields. Session tokens are `header.claims.signature`,
//! base64url without padding, signed with HMAC-SHA256.

use std::fmt;

use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use pbkdf2::pbkdf2_hmac;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;
use uuid::Uuid;

use crate::db::models::{Role, User};

type HmacSha256 = Hmac<Sha256>;

pub const PBKDF2_ITERATIONS: u32 = 600_000;
const SALT_LENGTH: usize = 16;
const HASH_LENGTH: usize = 32;
const HASH_SCHEME: &str = "pbkdf2-sha256";

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Malformed password hash")]
    MalformedHash,
    #[error("Invalid token: {0}")]
    InvalidToken(&'static str),
    #[error("Token expired")]
    Expired,
    #[error("Failed to sign token: {0}")]
    Signing(String),
    #[error("Failed to encode token: {0}")]
    Encoding(#[from] serde_json::Error),
}

pub fn hash_password(password: &str) -> String {
    hash_password_with(password, PBKDF2_ITERATIONS)
}

pub fn hash_password_with(password: &str, iterations: u32) -> String {
    let salt: [u8; SALT_LENGTH] = rand::random();
    let mut hash = [0u8; HASH_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, iterations, &mut hash);
    format!(
        "{}${}${}${}",
        HASH_SCHEME,
        iterations,
        STANDARD_NO_PAD.encode(salt),
        STANDARD_NO_PAD.encode(hash)
    )
}

/// Checks `password` against a stored hash in constant time.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, CredentialError> {
    let mut parts = stored.split('$');
    let (Some(scheme), Some(iterations), Some(salt), Some(expected), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return Err(CredentialError::MalformedHash);
    };
    if scheme != HASH_SCHEME {
        return Err(CredentialError::MalformedHash);
    }
    let iterations: u32 = iterations
        .parse()
        .map_err(|_| CredentialError::MalformedHash)?;
    let salt = STANDARD_NO_PAD
        .decode(salt)
        .map_err(|_| CredentialError::MalformedHash)?;
    let expected = STANDARD_NO_PAD
        .decode(expected)
        .map_err(|_| CredentialError::MalformedHash)?;

    let mut actual = vec![0u8; expected.len()];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, iterations, &mut actual);
    Ok(actual.ct_eq(&expected).into())
}

/// Stable fingerprint of a token, used to remember revoked sessions.
pub fn token_fingerprint(token: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(token.as_bytes()))
}

#[derive(Serialize, Deserialize)]
struct TokenHeader {
    alg: String,
    typ: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: Uuid,
}

impl Claims {
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct TokenSigner {
    secret: Vec<u8>,
    issuer: String,
    ttl: Duration,
}

impl fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSigner")
            .field("issuer", &self.issuer)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenSigner {
    pub fn new(secret: impl Into<Vec<u8>>, issuer: impl Into<String>, ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            issuer: issuer.into(),
            ttl,
        }
    }

    pub fn issue(&self, user: &User) -> Result<IssuedToken, CredentialError> {
        self.issue_at(user, Utc::now())
    }

    pub fn issue_at(&self, user: &User, now: DateTime<Utc>) -> Result<IssuedToken, CredentialError> {
        let expires_at = now + self.ttl;
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4(),
        };
        let header = TokenHeader {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        };

        let message = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?),
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?)
        );
        let signature = self.mac(&message)?.finalize().into_bytes();

        Ok(IssuedToken {
            token: format!("{}.{}", message, URL_SAFE_NO_PAD.encode(signature)),
            expires_at,
        })
    }

    pub fn verify(&self, token: &str) -> Result<Claims, CredentialError> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, CredentialError> {
        let mut parts = token.split('.');
        let (Some(header), Some(claims), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(CredentialError::InvalidToken("malformed token"));
        };

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| CredentialError::InvalidToken("malformed signature"))?;
        self.mac(&format!("{}.{}", header, claims))?
            .verify_slice(&signature)
            .map_err(|_| CredentialError::InvalidToken("bad signature"))?;

        let claims = URL_SAFE_NO_PAD
            .decode(claims)
            .map_err(|_| CredentialError::InvalidToken("malformed claims"))?;
        let claims: Claims = serde_json::from_slice(&claims)
            .map_err(|_| CredentialError::InvalidToken("malformed claims"))?;

        if claims.iss != self.issuer {
            return Err(CredentialError::InvalidToken("unexpected issuer"));
        }
        if claims.exp <= now.timestamp() {
            return Err(CredentialError::Expired);
        }
        Ok(claims)
    }

    fn mac(&self, message: &str) -> Result<HmacSha256, CredentialError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| CredentialError::Signing(e.to_string()))?;
        mac.update(message.as_bytes());
        Ok(mac)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doctor() -> User {
        User {
            id: Uuid::new_v4(),
            name: "Dr. Strange".into(),
            email: "doc@example.com".into(),
            role: Role::Doctor,
            password_hash: String::new(),
        }
    }

    fn signer() -> TokenSigner {
        TokenSigner::new("test-secret", "clinic", Duration::hours(24))
    }

    #[test]
    fn password_round_trip() {
        let hash = hash_password_with("doc123", 1_000);
        assert!(hash.starts_with("pbkdf2-sha256$1000$"));
        assert!(verify_password("doc123", &hash).unwrap());
        assert!(!verify_password("doc124", &hash).unwrap());
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        assert_ne!(
            hash_password_with("recep123", 1_000),
            hash_password_with("recep123", 1_000)
        );
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(matches!(
            verify_password("x", "plaintext"),
            Err(CredentialError::MalformedHash)
        ));
        assert!(matches!(
            verify_password("x", "bcrypt$10$abc$def"),
            Err(CredentialError::MalformedHash)
        ));
    }

    #[test]
    fn issued_token_verifies() {
        let user = doctor();
        let issued = signer().issue(&user).unwrap();
        let claims = signer().verify(&issued.token).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.role, Role::Doctor);
        assert_eq!(claims.expires_at().timestamp(), issued.expires_at.timestamp());
    }

    #[test]
    fn tampered_claims_fail_signature_check() {
        let issued = signer().issue(&doctor()).unwrap();
        let mut parts: Vec<&str> = issued.token.split('.').collect();
        let forged = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&serde_json::json!({
                "sub": Uuid::new_v4(),
                "email": "x@example.com",
                "role": "receptionist",
                "iss": "clinic",
                "iat": 0,
                "exp": i64::MAX,
            }))
            .unwrap(),
        );
        parts[1] = &forged;
        let result = signer().verify(&parts.join("."));
        assert!(matches!(result, Err(CredentialError::InvalidToken("bad signature"))));
    }

    #[test]
    fn other_secret_is_rejected() {
        let issued = signer().issue(&doctor()).unwrap();
        let other = TokenSigner::new("another-secret", "clinic", Duration::hours(24));
        assert!(other.verify(&issued.token).is_err());
    }

    #[test]
    fn other_issuer_is_rejected() {
        let issued = signer().issue(&doctor()).unwrap();
        let other = TokenSigner::new("test-secret", "someone-else", Duration::hours(24));
        assert!(matches!(
            other.verify(&issued.token),
            Err(CredentialError::InvalidToken("unexpected issuer"))
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let now = Utc::now();
        let issued = signer().issue_at(&doctor(), now - Duration::hours(25)).unwrap();
        assert!(matches!(
            signer().verify_at(&issued.token, now),
            Err(CredentialError::Expired)
        ));
    }

    #[test]
    fn tokens_issued_together_differ() {
        let user = doctor();
        let now = Utc::now();
        let a = signer().issue_at(&user, now).unwrap();
        let b = signer().issue_at(&user, now).unwrap();
        assert_ne!(a.token, b.token);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(signer().verify("not-a-token").is_err());
        assert!(signer().verify("a.b.c.d").is_err());
    }

    #[test]
    fn fingerprint_is_deterministic() {
        assert_eq!(token_fingerprint("abc"), token_fingerprint("abc"));
        assert_ne!(token_fingerprint("abc"), token_fingerprint("abd"));
    }

    #[test]
    fn debug_hides_secret() {
        let rendered = format!("{:?}", signer());
        assert!(!rendered.contains("test-secret"));
    }
}
