//! services/api/src/web/tokens.rs
//!
//! Issues and validates the HS256 access/refresh token pair.

use crate::error::{ApiError, ApiResult};
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use tutoring_core::Role;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: String,
    pub kind: TokenKind,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

impl Claims {
    pub fn role(&self) -> ApiResult<Role> {
        self.role
            .parse::<Role>()
            .map_err(|_| ApiError::Unauthorized("Invalid token".to_string()))
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0).single().unwrap_or_else(Utc::now)
    }
}

pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Lifetime of the access token in seconds.
    pub expires_in: i64,
}

#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, access_ttl_minutes: i64, refresh_ttl_days: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl: Duration::minutes(access_ttl_minutes),
            refresh_ttl: Duration::days(refresh_ttl_days),
        }
    }

    pub fn issue_pair(&self, user_id: Uuid, role: Role) -> ApiResult<TokenPair> {
        Ok(TokenPair {
            access_token: self.issue(user_id, role, TokenKind::Access)?,
            refresh_token: self.issue(user_id, role, TokenKind::Refresh)?,
            expires_in: self.access_ttl.num_seconds(),
        })
    }

    fn issue(&self, user_id: Uuid, role: Role, kind: TokenKind) -> ApiResult<String> {
        let now = Utc::now();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let claims = Claims {
            sub: user_id,
            role: role.as_str().to_string(),
            kind,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            error!("JWT encoding failed: {}", e);
            ApiError::Internal("token encoding failed".to_string())
        })
    }

    /// Decodes `token` and checks that it is of the `expected` kind.
    pub fn decode(&self, token: &str, expected: TokenKind) -> ApiResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            debug!("Rejected token: {}", e);
            ApiError::Unauthorized("Invalid or expired token".to_string())
        })?;

        if data.claims.kind != expected {
            debug!("Rejected {:?} token where {:?} was expected", data.claims.kind, expected);
            return Err(ApiError::Unauthorized("Wrong token type".to_string()));
        }
        Ok(data.claims)
    }
}
