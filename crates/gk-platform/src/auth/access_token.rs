//! Access Tokens
//!
//! HS256 JWTs issued on login and checked by the bearer extractor.

use chrono::{Duration, Utc};
use gk_common::Secret;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::shared::error::{PlatformError, Result};
use crate::shared::tsid::TsidGenerator;
use crate::user::entity::User;

/// JWT Claims for access tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject (user ID)
    pub sub: String,

    /// Issuer
    pub iss: String,

    /// Audience
    pub aud: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// JWT ID (unique identifier)
    pub jti: String,

    pub email: String,

    /// Display name
    pub name: String,
}

/// Token handed to a user after a successful login.
#[derive(Debug, Clone, Serialize)]
pub struct AccessGrant {
    pub access_token: Secret,
    pub token_type: &'static str,
    /// Lifetime in seconds
    pub expires_in: i64,
}

/// Issues and checks access tokens.
pub trait AccessTokenIssuer: Send + Sync {
    fn issue(&self, user: &User) -> Result<AccessGrant>;

    fn validate(&self, token: &str) -> Result<AccessTokenClaims>;
}

/// HMAC-SHA256 JWT issuer
pub struct JwtIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
    expiry_secs: i64,
}

impl JwtIssuer {
    pub fn new_with_secret(
        secret: &str,
        issuer: impl Into<String>,
        audience: impl Into<String>,
        expiry_secs: i64,
    ) -> Self {
        info!("JwtIssuer initialized with HS256");

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
            audience: audience.into(),
            expiry_secs,
        }
    }

    pub fn from_config(config: &gk_config::JwtConfig) -> Self {
        Self::new_with_secret(
            &config.secret,
            &config.issuer,
            &config.audience,
            config.access_token_expiry_secs,
        )
    }
}

impl AccessTokenIssuer for JwtIssuer {
    fn issue(&self, user: &User) -> Result<AccessGrant> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.expiry_secs);

        let claims = AccessTokenClaims {
            sub: user.id.clone(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            jti: TsidGenerator::generate(),
            email: user.email.clone(),
            name: user.name.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| PlatformError::TokenSigning { message: format!("Failed to encode JWT: {}", e) })?;

        Ok(AccessGrant {
            access_token: Secret::new(token),
            token_type: "Bearer",
            expires_in: self.expiry_secs,
        })
    }

    fn validate(&self, token: &str) -> Result<AccessTokenClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);

        decode::<AccessTokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => PlatformError::TokenExpired,
                _ => PlatformError::InvalidToken { message: format!("{}", e) },
            })
    }
}

/// Extract bearer token from Authorization header value
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> JwtIssuer {
        JwtIssuer::new_with_secret("test-secret", "gatekeeper", "gatekeeper", 3600)
    }

    #[test]
    fn test_issue_and_validate() {
        let issuer = issuer();
        let user = User::new("ada@example.com", "Ada", "h");

        let grant = issuer.issue(&user).unwrap();
        assert_eq!(grant.token_type, "Bearer");
        assert_eq!(grant.expires_in, 3600);

        let claims = issuer.validate(grant.access_token.expose()).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, "ada@example.com");
    }

    #[test]
    fn test_rejects_foreign_signature() {
        let user = User::new("ada@example.com", "Ada", "h");
        let other = JwtIssuer::new_with_secret("other-secret", "gatekeeper", "gatekeeper", 3600);
        let grant = other.issue(&user).unwrap();

        let err = issuer().validate(grant.access_token.expose()).unwrap_err();
        assert!(matches!(err, PlatformError::InvalidToken { .. }));
    }

    #[test]
    fn test_expired_token() {
        let user = User::new("ada@example.com", "Ada", "h");
        let expired = JwtIssuer::new_with_secret("test-secret", "gatekeeper", "gatekeeper", -3600);
        let grant = expired.issue(&user).unwrap();

        let err = issuer().validate(grant.access_token.expose()).unwrap_err();
        assert!(matches!(err, PlatformError::TokenExpired));
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("Basic abc"), None);
    }
}
