//! HTTP surface.
pub mod index;
pub mod login;
pub mod logout;
pub mod profile;

use axum::extract::{Form, FromRequest, Request};
use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::ServerError;
use crate::user::Sex;

/// Fallback redirect target after login, logout and profile creation.
pub const DEFAULT_NEXT: &str = "/";

/// Post-action redirect target carried through the flow.
#[derive(Debug, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

impl NextQuery {
    /// Submitted target, or the landing page.
    pub fn target(self) -> String {
        self.next.unwrap_or_else(|| DEFAULT_NEXT.to_owned())
    }
}

/// Check `sex` is exactly one of the two recognized values.
pub fn validate_sex(sex: &str) -> Result<(), ValidationError> {
    match Sex::parse(sex) {
        Some(_) => Ok(()),
        None => Err(ValidationError::new("sex")),
    }
}

/// Form extractor running `validator` rules before the handler.
pub struct ValidForm<T>(pub T);

impl<S, T> FromRequest<S> for ValidForm<T>
where
    S: Send + Sync,
    T: serde::de::DeserializeOwned + Validate,
{
    type Rejection = ServerError;

    async fn from_request(
        req: Request,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let Form(value) = Form::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(ValidForm(value))
    }
}

/// MUST NEVER be used in production.
#[cfg(test)]
pub(crate) fn state(pool: sqlx::SqlitePool) -> crate::AppState {
    use std::sync::Arc;

    crate::AppState {
        config: Arc::new(crate::config::Configuration::default()),
        db: crate::database::Database { sqlite: pool },
        session: crate::session::SessionManager::new(
            "an-unguessable-development-secret",
            "https://matcha.test/",
            None,
        ),
        gateway: crate::identity::Gateway::default(),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use axum::Router;
    use axum::http::{HeaderValue, Method, StatusCode, header};

    use crate::make_request;

    /// `name=value` pair of a `Set-Cookie` header.
    pub fn cookie_pair(header: &HeaderValue) -> String {
        header
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_owned()
    }

    /// Complete the handshake for `identifier`, returning the session cookie.
    pub async fn sign_in(app: &Router, identifier: &str) -> String {
        let response = make_request(
            app.clone(),
            Method::POST,
            "/login",
            None,
            format!("identifier={identifier}"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        cookie_pair(
            response
                .headers()
                .get(header::SET_COOKIE)
                .expect("missing session cookie"),
        )
    }

    /// Sign in and submit a profile, returning the session cookie.
    pub async fn create_user(
        app: &Router,
        identifier: &str,
        name: &str,
        email: &str,
        sex: &str,
    ) -> String {
        let cookie = sign_in(app, identifier).await;
        let response = make_request(
            app.clone(),
            Method::POST,
            "/create-profile",
            Some(&cookie),
            format!("name={name}&email={email}&sex={sex}"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        cookie
    }
}
