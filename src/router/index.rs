//! Landing page with public instance metadata.

use axum::extract::State;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::session::Visitor;

/// Public instance description.
#[derive(Debug, Serialize, Deserialize)]
pub struct Landing {
    pub name: String,
    pub version: String,
    pub authenticated: bool,
}

/// `GET /`.
pub async fn handler(
    State(state): State<AppState>,
    Extension(visitor): Extension<Visitor>,
) -> Json<Landing> {
    Json(Landing {
        name: state.config.name.clone(),
        version: env!("CARGO_PKG_VERSION").into(),
        authenticated: visitor.is_authenticated(),
    })
}
