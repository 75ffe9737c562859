//! Profile creation, edition and match listing.

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use axum::{Extension, Form, Json};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::Result;
use crate::router::{DEFAULT_NEXT, NextQuery};
use crate::session::Visitor;
use crate::user::{Sex, User, favorites};
use crate::{AppState, ServerError};

const PROFILE_ROUTE: &str = "/profile";

/// Profile fields as submitted; echoed back on rejection so the form can be
/// re-rendered as filled.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Validate)]
pub struct Fields {
    #[validate(length(min = 1, message = "You have to provide a name."))]
    pub name: String,
    #[validate(contains(
        pattern = "@",
        message = "You have to enter a valid email address."
    ))]
    pub email: String,
    #[validate(custom(
        function = "crate::router::validate_sex",
        message = "You have to provide a sex."
    ))]
    pub sex: String,
}

impl Fields {
    /// Run field rules, returning the declared sex.
    fn parse(&self) -> std::result::Result<Sex, ValidationErrors> {
        self.validate()?;

        Sex::parse(&self.sex).ok_or_else(|| {
            let mut errors = ValidationErrors::new();
            errors.add(
                "sex",
                ValidationError::new("sex")
                    .with_message("You have to provide a sex.".into()),
            );
            errors
        })
    }

    fn rejected(&self, errors: ValidationErrors) -> ServerError {
        ServerError::Profile {
            errors,
            form: self.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateQuery {
    pub next: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Form descriptor for profile creation, prefilled from identity claims.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateForm {
    pub next: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

/// `GET /create-profile`.
///
/// Only a completed handshake without a profile sees the form; everyone else
/// goes back to the landing page.
pub async fn create_form(
    Extension(visitor): Extension<Visitor>,
    Query(query): Query<CreateQuery>,
) -> Response {
    match visitor {
        Visitor::Pending(_) => Json(CreateForm {
            next: query.next.unwrap_or_else(|| DEFAULT_NEXT.to_owned()),
            name: query.name,
            email: query.email,
        })
        .into_response(),
        _ => Redirect::to(DEFAULT_NEXT).into_response(),
    }
}

/// Handler to create a profile.
pub async fn create(
    State(state): State<AppState>,
    Extension(visitor): Extension<Visitor>,
    Query(query): Query<NextQuery>,
    Form(fields): Form<Fields>,
) -> Result<Response> {
    let identity_url = match visitor {
        Visitor::Pending(identity_url) => identity_url,
        _ => return Ok(Redirect::to(DEFAULT_NEXT).into_response()),
    };

    let sex = fields.parse().map_err(|errors| fields.rejected(errors))?;

    let user = User {
        id: 0,
        name: fields.name.clone(),
        email: fields.email.clone(),
        identity_url: Some(identity_url),
        sex,
        favorite: String::new(),
        created_at: chrono::Utc::now().naive_utc(),
        deleted_at: None,
    };
    let id = state.db.users().insert(&user).await?;
    tracing::info!(user_id = id, "profile created");

    Ok(Redirect::to(&query.target()).into_response())
}

/// Own profile fields plus the opposite-sex listing.
#[derive(Debug, Serialize, Deserialize)]
pub struct View {
    pub form: FormState,
    pub users: Vec<User>,
    pub users_len: usize,
}

/// Saved profile values, used to fill the edit form.
#[derive(Debug, Serialize, Deserialize)]
pub struct FormState {
    pub name: String,
    pub email: String,
    pub sex: Sex,
    pub favorite: String,
}

/// `GET /profile`.
pub async fn handler(
    State(state): State<AppState>,
    Extension(visitor): Extension<Visitor>,
) -> Result<Json<View>> {
    let user = visitor.into_user().ok_or(ServerError::Unauthorized)?;
    let users = state.db.users().matches_for(&user).await?;

    Ok(Json(View {
        form: FormState {
            name: user.name,
            email: user.email,
            sex: user.sex,
            favorite: user.favorite,
        },
        users_len: users.len(),
        users,
    }))
}

/// Handler to edit or retire a profile.
pub async fn update(
    State(state): State<AppState>,
    Extension(visitor): Extension<Visitor>,
    Form(form): Form<Vec<(String, String)>>,
) -> Result<Response> {
    let mut user = match visitor {
        Visitor::User(user) => user,
        _ => return Err(ServerError::Unauthorized),
    };

    let submission = EditSubmission::from_pairs(&form);

    if submission.delete {
        state.db.users().delete(user.id).await?;
        tracing::info!(user_id = user.id, "profile retired");

        return Ok((
            AppendHeaders([(header::SET_COOKIE, state.session.clear_cookie())]),
            Redirect::to(DEFAULT_NEXT),
        )
            .into_response());
    }

    let sex = submission
        .fields
        .parse()
        .map_err(|errors| submission.fields.rejected(errors))?;

    user.name = submission.fields.name;
    user.email = submission.fields.email;
    user.sex = sex;
    user.favorite = submission.favorite;
    state.db.users().update(&user).await?;

    Ok(Redirect::to(PROFILE_ROUTE).into_response())
}

/// Edit form split into named fields, the delete action and the recomputed
/// favorites bitstring.
struct EditSubmission {
    delete: bool,
    fields: Fields,
    favorite: String,
}

impl EditSubmission {
    fn from_pairs(pairs: &[(String, String)]) -> Self {
        let mut fields = Fields::default();
        let mut delete = false;

        for (key, value) in pairs {
            match key.as_str() {
                "name" => fields.name = value.clone(),
                "email" => fields.email = value.clone(),
                "sex" => fields.sex = value.clone(),
                "delete" => delete = true,
                _ => {},
            }
        }

        let favorite =
            favorites::encode(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        Self {
            delete,
            fields,
            favorite,
        }
    }
}
