//! Matcha is a small profile matching service with delegated sign-in.

#[forbid(unsafe_code)]
#[deny(missing_docs, unused_mut)]
pub mod database;
pub mod error;
pub mod identity;
pub mod router;
pub mod session;
pub mod user;

pub mod config;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{Method, StatusCode, header};
use axum::routing::get;
use axum::{Router, middleware as AxumMiddleware};
pub use error::ServerError;
use tower::ServiceBuilder;
use tower_http::LatencyUnit;
use tower_http::cors::{Any, CorsLayer};
use tower_http::sensitive_headers::SetSensitiveHeadersLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{
    DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer,
};

/// MUST NEVER be used in production.
#[cfg(test)]
pub async fn make_request(
    app: Router,
    method: Method,
    path: &str,
    cookie: Option<&str>,
    body: String,
) -> axum::http::Response<axum::body::Body> {
    use axum::extract::Request;
    use tower::util::ServiceExt;

    let mut request = Request::builder().method(method).uri(path).header(
        header::CONTENT_TYPE,
        "application/x-www-form-urlencoded",
    );
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }

    app.oneshot(request.body(axum::body::Body::from(body)).unwrap())
        .await
        .unwrap()
}

/// State sharing between routes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::Configuration>,
    pub db: database::Database,
    pub session: session::SessionManager,
    pub gateway: identity::Gateway,
}

/// Create router.
pub fn app(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        // Add high level tracing/logging to all requests.
        .layer(
            TraceLayer::new_for_http()
                .on_body_chunk(|chunk: &Bytes, latency: Duration, _span: &tracing::Span| {
                    tracing::trace!(size_bytes = chunk.len(), latency = ?latency, "sending body chunk")
                })
                .make_span_with(DefaultMakeSpan::new().include_headers(true). level(tracing::Level::INFO))
                .on_request(DefaultOnRequest::new())
                .on_response(DefaultOnResponse::new(). include_headers(true). latency_unit(LatencyUnit::Micros)),
        )
        // Set a timeout.
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, Duration::from_secs(10)))
        // Remove senstive headers from trace.
        .layer(SetSensitiveHeadersLayer::new([header::COOKIE]))
        // Add CORS preflight support.
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers(Any)
                .vary([header::COOKIE]),
        );

    Router::new()
        // `GET /` goes to `index`.
        .route("/", get(router::index::handler))
        // `GET,POST /login` goes to the handshake.
        .route(
            "/login",
            get(router::login::form).post(router::login::handler),
        )
        // `GET,POST /create-profile` goes to profile creation.
        .route(
            "/create-profile",
            get(router::profile::create_form).post(router::profile::create),
        )
        // `GET,POST /profile` goes to own profile and matches.
        .route(
            "/profile",
            get(router::profile::handler).post(router::profile::update),
        )
        // `GET /logout` clears the session.
        .route("/logout", get(router::logout::handler))
        // Resolve the visitor before every route.
        .route_layer(AxumMiddleware::from_fn_with_state(
            state.clone(),
            session::resolve,
        ))
        .with_state(state)
        .layer(middleware)
}

/// Initialize the application state.
pub async fn initialize_state() -> Result<AppState, Box<dyn std::error::Error>>
{
    // read configuration file.  let it in memory.
    let config = config::Configuration::default().read()?;

    let db = match config.sqlite {
        Some(ref sqlite) => {
            database::Database::new(
                &sqlite.path,
                sqlite.pool_size.unwrap_or(database::DEFAULT_POOL_SIZE),
            )
            .await?
        },
        None => {
            database::Database::new(
                database::DEFAULT_DATABASE_PATH,
                database::DEFAULT_POOL_SIZE,
            )
            .await?
        },
    };

    // execute migrations scripts on start.
    sqlx::migrate!().run(&db.sqlite).await?;

    // handle browser sessions.
    let session_config = config.session.clone().unwrap_or_default();
    let secret = match session_config
        .secret
        .or_else(|| std::env::var("SESSION_SECRET").ok())
    {
        Some(secret) => secret,
        None => {
            tracing::error!(
                "missing session secret: set `session.secret` on `config.yaml` file or the `SESSION_SECRET` environment variable"
            );
            std::process::exit(0);
        },
    };
    let session = session::SessionManager::new(
        &secret,
        &config.url,
        session_config.max_age,
    );

    let gateway = identity::Gateway::new(
        config
            .gateway
            .clone()
            .map(|gateway| gateway.safe_roots)
            .unwrap_or_default(),
    );

    Ok(AppState {
        config,
        db,
        session,
        gateway,
    })
}
