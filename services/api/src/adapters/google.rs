//! services/api/src/adapters/google.rs
//!
//! Google sign-in over plain HTTPS calls: ID-token verification through the
//! `tokeninfo` endpoint and the authorization-code flow for browser redirects.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::warn;
use tutoring_core::domain::GoogleIdentity;
use tutoring_core::ports::{IdentityProvider, PortError, PortResult};

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const TOKEN_INFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";
const USER_INFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";

pub struct GoogleIdentityAdapter {
    http: Client,
    client_id: Option<String>,
    client_secret: Option<String>,
    redirect_url: String,
}

impl GoogleIdentityAdapter {
    pub fn new(
        http: Client,
        client_id: Option<String>,
        client_secret: Option<String>,
        redirect_url: String,
    ) -> Self {
        Self {
            http,
            client_id,
            client_secret,
            redirect_url,
        }
    }

    fn client_id(&self) -> PortResult<&str> {
        self.client_id
            .as_deref()
            .ok_or_else(|| PortError::Unexpected("GOOGLE_CLIENT_ID is not configured".to_string()))
    }

    fn client_secret(&self) -> PortResult<&str> {
        self.client_secret.as_deref().ok_or_else(|| {
            PortError::Unexpected("GOOGLE_CLIENT_SECRET is not configured".to_string())
        })
    }
}

// `tokeninfo` encodes booleans as strings, `userinfo` as JSON booleans.
#[derive(Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Text(String),
}

impl Flag {
    fn is_true(&self) -> bool {
        match self {
            Flag::Bool(b) => *b,
            Flag::Text(s) => s.eq_ignore_ascii_case("true"),
        }
    }
}

#[derive(Deserialize)]
struct TokenInfo {
    aud: String,
    email: Option<String>,
    email_verified: Option<Flag>,
    name: Option<String>,
    picture: Option<String>,
}

#[derive(Deserialize)]
struct TokenExchange {
    access_token: String,
}

#[derive(Deserialize)]
struct UserInfo {
    email: Option<String>,
    email_verified: Option<Flag>,
    name: Option<String>,
    picture: Option<String>,
}

fn identity_from(
    email: Option<String>,
    email_verified: Option<Flag>,
    name: Option<String>,
    picture: Option<String>,
) -> PortResult<GoogleIdentity> {
    let email = email.ok_or(PortError::Unauthorized)?;
    let email_verified = email_verified.map(|f| f.is_true()).unwrap_or(false);
    if !email_verified {
        warn!("Rejected Google identity with unverified email {}", email);
        return Err(PortError::Unauthorized);
    }
    let name = name.unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());
    Ok(GoogleIdentity {
        email,
        name,
        picture,
        email_verified,
    })
}

#[async_trait]
impl IdentityProvider for GoogleIdentityAdapter {
    fn authorization_url(&self, state: &str) -> String {
        let client_id = self.client_id.as_deref().unwrap_or_default();
        let params = [
            ("client_id", client_id),
            ("redirect_uri", self.redirect_url.as_str()),
            ("response_type", "code"),
            ("scope", "openid email profile"),
            ("access_type", "offline"),
            ("prompt", "consent"),
            ("state", state),
        ];
        match Url::parse_with_params(AUTH_URL, &params) {
            Ok(url) => url.to_string(),
            Err(_) => AUTH_URL.to_string(),
        }
    }

    async fn verify_id_token(&self, id_token: &str) -> PortResult<GoogleIdentity> {
        let client_id = self.client_id()?;

        let response = self
            .http
            .get(TOKEN_INFO_URL)
            .query(&[("id_token", id_token)])
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Google answers 400 for malformed or expired tokens.
        if response.status().is_client_error() {
            return Err(PortError::Unauthorized);
        }
        if !response.status().is_success() {
            return Err(PortError::Unexpected(format!(
                "tokeninfo returned {}",
                response.status()
            )));
        }

        let info: TokenInfo = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        if info.aud != client_id {
            warn!("Rejected Google ID token issued for another audience");
            return Err(PortError::Unauthorized);
        }

        identity_from(info.email, info.email_verified, info.name, info.picture)
    }

    async fn exchange_code(&self, code: &str) -> PortResult<GoogleIdentity> {
        let client_id = self.client_id()?;
        let client_secret = self.client_secret()?;

        let response = self
            .http
            .post(TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("redirect_uri", self.redirect_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        if response.status().is_client_error() {
            return Err(PortError::Unauthorized);
        }
        let exchange: TokenExchange = response
            .error_for_status()
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .json()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let info: UserInfo = self
            .http
            .get(USER_INFO_URL)
            .bearer_auth(&exchange.access_token)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .json()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        identity_from(info.email, info.email_verified, info.name, info.picture)
    }
}
