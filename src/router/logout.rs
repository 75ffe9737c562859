//! Sign a browser out.

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{AppendHeaders, IntoResponse, Redirect};

use crate::AppState;
use crate::router::NextQuery;

/// `GET /logout`.
pub async fn handler(
    State(state): State<AppState>,
    Query(query): Query<NextQuery>,
) -> impl IntoResponse {
    (
        AppendHeaders([(header::SET_COOKIE, state.session.clear_cookie())]),
        Redirect::to(&query.target()),
    )
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode, header};
    use sqlx::{Pool, Sqlite};

    use crate::*;

    #[sqlx::test]
    async fn test_logout_clears_session(pool: Pool<Sqlite>) {
        let app = app(router::state(pool));

        let response = make_request(
            app,
            Method::GET,
            "/logout?next=/login",
            None,
            String::default(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let location =
            response.headers().get(header::LOCATION).unwrap().to_str().unwrap();
        assert_eq!(location, "/login");

        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(cookie.starts_with("session="));
        assert!(cookie.contains("Max-Age=0"));
    }
}
