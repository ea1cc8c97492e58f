//! JWT token service
//!
//! HS256 bearer tokens carrying the user id (`sub`) and email, valid for a
//! fixed 24 hours.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use shared::error::AppError;
use thiserror::Error;
use uuid::Uuid;

pub const JWT_EXPIRY_HOURS: i64 = 24;

/// Claims stored in the token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// User email (normalized)
    pub email: String,
    /// Expiration (Unix timestamp seconds)
    pub exp: i64,
    /// Issued at (Unix timestamp seconds)
    pub iat: i64,
}

#[derive(Error, Debug)]
pub enum JwtError {
    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("token has expired")]
    ExpiredToken,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("missing or empty claim: {0}")]
    MissingClaim(&'static str),

    #[error("token generation failed: {0}")]
    GenerationFailed(String),
}

impl From<JwtError> for AppError {
    fn from(e: JwtError) -> Self {
        match e {
            JwtError::ExpiredToken => AppError::token_expired(),
            JwtError::GenerationFailed(msg) => AppError::internal(msg),
            other => AppError::invalid_token(other.to_string()),
        }
    }
}

/// JWT token service
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry: Duration,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("expiry", &self.expiry)
            .finish_non_exhaustive()
    }
}

impl JwtService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiry: Duration::hours(JWT_EXPIRY_HOURS),
        }
    }

    /// Issue a token for a user
    pub fn generate_token(&self, user_id: Uuid, email: &str) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            exp: (now + self.expiry).timestamp(),
            iat: now.timestamp(),
        };
        self.encode_claims(&claims)
    }

    fn encode_claims(&self, claims: &Claims) -> Result<String, JwtError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| JwtError::GenerationFailed(e.to_string()))
    }

    /// Verify signature and expiry, then decode
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["sub", "exp", "iat"]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
                ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                _ => JwtError::InvalidToken(e.to_string()),
            }
        })?;

        Ok(token_data.claims)
    }

    /// Token part of an `Authorization: Bearer <token>` header
    pub fn extract_from_header(header: &str) -> Option<&str> {
        header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// Authenticated caller, injected into request extensions by the auth
/// middleware
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
}

impl TryFrom<Claims> for CurrentUser {
    type Error = JwtError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        if claims.sub.is_empty() {
            return Err(JwtError::MissingClaim("sub"));
        }
        if claims.email.is_empty() {
            return Err(JwtError::MissingClaim("email"));
        }
        let id = Uuid::parse_str(&claims.sub)
            .map_err(|_| JwtError::InvalidToken("sub is not a valid user id".into()))?;
        Ok(Self {
            id,
            email: claims.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::error::ErrorCode;

    const SECRET: &str = "test-secret-at-least-32-bytes-long!!";

    #[test]
    fn test_generate_and_validate() {
        let service = JwtService::new(SECRET);
        let id = Uuid::new_v4();
        let token = service.generate_token(id, "ana@x.com").unwrap();

        let claims = service.validate_token(&token).unwrap();
        assert_eq!(claims.sub, id.to_string());
        assert_eq!(claims.email, "ana@x.com");
        assert_eq!(claims.exp - claims.iat, JWT_EXPIRY_HOURS * 3600);

        let user = CurrentUser::try_from(claims).unwrap();
        assert_eq!(user.id, id);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = JwtService::new(SECRET)
            .generate_token(Uuid::new_v4(), "a@b.c")
            .unwrap();
        let other = JwtService::new("a-completely-different-secret-value");
        assert!(matches!(
            other.validate_token(&token),
            Err(JwtError::InvalidSignature)
        ));
    }

    #[test]
    fn test_expired_token() {
        let service = JwtService::new(SECRET);
        let issued = Utc::now() - Duration::hours(30);
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            email: "a@b.c".into(),
            exp: (issued + Duration::hours(JWT_EXPIRY_HOURS)).timestamp(),
            iat: issued.timestamp(),
        };
        let token = service.encode_claims(&claims).unwrap();
        let err = service.validate_token(&token).unwrap_err();
        assert!(matches!(err, JwtError::ExpiredToken));
        assert_eq!(AppError::from(err).code, ErrorCode::TokenExpired);
    }

    #[test]
    fn test_garbage_token() {
        let service = JwtService::new(SECRET);
        let err = service.validate_token("not.a.jwt").unwrap_err();
        assert_eq!(AppError::from(err).code, ErrorCode::TokenInvalid);
    }

    #[test]
    fn test_empty_claims_rejected() {
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            email: String::new(),
            exp: 0,
            iat: 0,
        };
        assert!(matches!(
            CurrentUser::try_from(claims),
            Err(JwtError::MissingClaim("email"))
        ));

        let claims = Claims {
            sub: "not-a-uuid".into(),
            email: "a@b.c".into(),
            exp: 0,
            iat: 0,
        };
        assert!(CurrentUser::try_from(claims).is_err());
    }

    #[test]
    fn test_extract_from_header() {
        assert_eq!(JwtService::extract_from_header("Bearer abc"), Some("abc"));
        assert_eq!(JwtService::extract_from_header("Bearer "), None);
        assert_eq!(JwtService::extract_from_header("Basic abc"), None);
        assert_eq!(JwtService::extract_from_header("abc"), None);
    }
}
