//! Browser session management.
//!
//! A session is a signed token whose subject is the identity URL asserted by
//! the gateway, carried in an `HttpOnly` cookie. Resolution policy is
//! reload-per-request: the identity URL is looked up in the store before each
//! request, never cached across requests.

use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::user::User;
use crate::{AppState, ServerError};

/// Two weeks, in seconds.
pub const DEFAULT_MAX_AGE: u64 = 60 * 60 * 24 * 14;
const COOKIE_NAME: &str = "session";

/// Pieces of information asserted on a session token.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Claims {
    /// Identifies the expiration time on or after which the token must not be
    /// accepted for processing.
    pub exp: u64,
    /// Identifies the time at which the token was issued.
    pub iat: u64,
    /// Identifies the instance that issued the token.
    pub iss: String,
    /// Identity URL of the signed-in browser.
    pub sub: String,
}

/// Manage session tokens and their cookie carrier.
#[derive(Clone)]
pub struct SessionManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    max_age: u64,
}

impl SessionManager {
    /// Create a new [`SessionManager`] signing with `secret`.
    pub fn new(secret: &str, issuer: &str, max_age: Option<u64>) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.to_owned(),
            max_age: max_age.unwrap_or(DEFAULT_MAX_AGE),
        }
    }

    /// Create a new session token for `identity_url`.
    pub fn create(&self, identity_url: &str) -> Result<String> {
        let time = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
        let claims = Claims {
            exp: time + self.max_age,
            iat: time,
            iss: self.issuer.clone(),
            sub: identity_url.to_owned(),
        };

        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding,
        )?)
    }

    /// Decode and check a session token.
    pub fn decode(&self, token: &str) -> Result<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        Ok(decode::<Claims>(token, &self.decoding, &validation)?.claims)
    }

    /// Cookie carrying `token`.
    pub fn cookie(&self, token: &str) -> String {
        format!(
            "{COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.max_age
        )
    }

    /// Cookie clearing the session.
    pub fn clear_cookie(&self) -> String {
        format!("{COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
    }
}

/// Caller state resolved from the session, passed to handlers explicitly.
#[derive(Clone, Debug)]
pub enum Visitor {
    /// No session, or a session that failed verification.
    Anonymous,
    /// Handshake completed but no profile exists for the identity URL yet.
    Pending(String),
    /// Signed-in user with a live profile.
    User(User),
}

impl Visitor {
    /// Whether a live profile backs the session.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Visitor::User(_))
    }

    /// Signed-in [`User`], if any.
    pub fn into_user(self) -> Option<User> {
        match self {
            Visitor::User(user) => Some(user),
            _ => None,
        }
    }
}

/// Session token from the `Cookie` request header, if present.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == COOKIE_NAME)
        .map(|(_, value)| value.to_owned())
}

/// Middleware resolving the [`Visitor`] before each request.
///
/// A missing or unverifiable token yields [`Visitor::Anonymous`]; store
/// unavailability is fatal to the request.
pub async fn resolve(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> std::result::Result<Response, ServerError> {
    let visitor = match token_from_headers(req.headers()) {
        None => Visitor::Anonymous,
        Some(token) => match state.session.decode(&token) {
            Err(_) => Visitor::Anonymous,
            Ok(claims) => {
                match state.db.users().find_by_identity(&claims.sub).await? {
                    Some(user) => Visitor::User(user),
                    None => Visitor::Pending(claims.sub),
                }
            },
        },
    };

    req.extensions_mut().insert(visitor);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "an-unguessable-development-secret";
    const IDENTITY: &str = "https://alice.example.com/";

    fn manager() -> SessionManager {
        SessionManager::new(SECRET, "https://matcha.example.com/", None)
    }

    #[test]
    fn test_token_roundtrip() {
        let session = manager();
        let token = session.create(IDENTITY).unwrap();

        let claims = session.decode(&token).unwrap();
        assert_eq!(claims.sub, IDENTITY);
        assert_eq!(claims.iss, "https://matcha.example.com/");
        assert_eq!(claims.exp, claims.iat + DEFAULT_MAX_AGE);
    }

    #[test]
    fn test_tampered_token_rejected() {
        let session = manager();
        let mut token = session.create(IDENTITY).unwrap();
        token.pop();

        assert!(session.decode(&token).is_err());
    }

    #[test]
    fn test_foreign_secret_rejected() {
        let token = manager().create(IDENTITY).unwrap();
        let other =
            SessionManager::new("another-secret", "https://matcha.example.com/", None);

        assert!(other.decode(&token).is_err());
    }

    #[test]
    fn test_token_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            "theme=dark; session=abc.def.ghi; lang=en".parse().unwrap(),
        );

        assert_eq!(
            token_from_headers(&headers),
            Some("abc.def.ghi".to_owned())
        );
    }

    #[test]
    fn test_no_cookie_header() {
        assert_eq!(token_from_headers(&HeaderMap::new()), None);
    }

    #[test]
    fn test_clear_cookie_expires() {
        assert!(manager().clear_cookie().contains("Max-Age=0"));
    }
}
