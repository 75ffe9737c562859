//! Delegated sign-in.

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::Result;
use crate::identity::Assertion;
use crate::router::{DEFAULT_NEXT, NextQuery, ValidForm};
use crate::session::Visitor;
use crate::AppState;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(length(
        min = 1,
        message = "You have to provide an identifier."
    ))]
    pub identifier: String,
    pub next: Option<String>,
}

/// Form descriptor for the sign-in page.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginForm {
    pub next: String,
}

/// `GET /login`.
pub async fn form(
    Extension(visitor): Extension<Visitor>,
    Query(query): Query<NextQuery>,
) -> Response {
    let next = query.target();

    if visitor.is_authenticated() {
        Redirect::to(&next).into_response()
    } else {
        Json(LoginForm { next }).into_response()
    }
}

/// Handler to sign a browser in.
///
/// A known identity goes straight to `next`; a fresh one is sent to the
/// profile creation form, its claims carried as query parameters.
pub async fn handler(
    State(state): State<AppState>,
    Extension(visitor): Extension<Visitor>,
    ValidForm(body): ValidForm<Body>,
) -> Result<Response> {
    let next = body.next.unwrap_or_else(|| DEFAULT_NEXT.to_owned());

    if visitor.is_authenticated() {
        return Ok(Redirect::to(&next).into_response());
    }

    let assertion = state.gateway.assert(&body.identifier)?;
    let token = state.session.create(&assertion.identity_url)?;
    let cookie = state.session.cookie(&token);

    let target = match state
        .db
        .users()
        .find_by_identity(&assertion.identity_url)
        .await?
    {
        Some(user) => {
            tracing::info!(user_id = user.id, "signed in");
            next
        },
        None => create_profile_target(&next, &assertion),
    };

    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Redirect::to(&target),
    )
        .into_response())
}

fn create_profile_target(next: &str, assertion: &Assertion) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    query.append_pair("next", next);
    if let Some(name) = &assertion.name {
        query.append_pair("name", name);
    }
    if let Some(email) = &assertion.email {
        query.append_pair("email", email);
    }

    format!("/create-profile?{}", query.finish())
}

#[cfg(test)]
pub(super) mod tests {
    use axum::http::{Method, StatusCode, header};
    use http_body_util::BodyExt;
    use sqlx::{Pool, Sqlite};

    use super::*;
    use crate::*;

    #[sqlx::test]
    async fn test_login_new_identity(pool: Pool<Sqlite>) {
        let app = app(router::state(pool));

        let response = make_request(
            app,
            Method::POST,
            "/login",
            None,
            "identifier=alice.example.com".to_owned(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let location =
            response.headers().get(header::LOCATION).unwrap().to_str().unwrap();
        assert_eq!(location, "/create-profile?next=%2F");

        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(cookie.starts_with("session="));
        assert!(cookie.contains("HttpOnly"));
    }

    #[sqlx::test(fixtures("../../fixtures/users.sql"))]
    async fn test_login_known_identity(pool: Pool<Sqlite>) {
        let app = app(router::state(pool));

        let response = make_request(
            app,
            Method::POST,
            "/login",
            None,
            "identifier=bob.example.com&next=/profile".to_owned(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let location =
            response.headers().get(header::LOCATION).unwrap().to_str().unwrap();
        assert_eq!(location, "/profile");
        assert!(response.headers().contains_key(header::SET_COOKIE));
    }

    #[sqlx::test]
    async fn test_login_requires_identifier(pool: Pool<Sqlite>) {
        let app = app(router::state(pool));

        let response = make_request(
            app,
            Method::POST,
            "/login",
            None,
            "identifier=".to_owned(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    async fn test_login_rejects_invalid_identifier(pool: Pool<Sqlite>) {
        let app = app(router::state(pool));

        let response = make_request(
            app,
            Method::POST,
            "/login",
            None,
            "identifier=not%20a%20url".to_owned(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    async fn test_login_form_descriptor(pool: Pool<Sqlite>) {
        let app = app(router::state(pool));

        let response = make_request(
            app,
            Method::GET,
            "/login?next=/profile",
            None,
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: LoginForm = serde_json::from_slice(&body).unwrap();
        assert_eq!(body.next, "/profile");
    }

    #[sqlx::test(fixtures("../../fixtures/users.sql"))]
    async fn test_login_form_redirects_signed_in(pool: Pool<Sqlite>) {
        let app = app(router::state(pool));
        let cookie = router::testing::sign_in(&app, "bob.example.com").await;

        let response = make_request(
            app,
            Method::GET,
            "/login",
            Some(&cookie),
            String::default(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }
}
