pub mod favorites;
mod repository;

pub use repository::*;

use serde::{Deserialize, Serialize};

/// User as saved on database.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    #[serde(skip)]
    pub email: String,
    /// Join key to the external identity; `None` once the account is retired.
    #[serde(skip)]
    pub identity_url: Option<String>,
    pub sex: Sex,
    /// Bitstring of '0'/'1' characters; position `i` set when favorite item
    /// `i` is checked. Trailing unset positions are omitted.
    pub favorite: String,
    pub created_at: chrono::NaiveDateTime,
    #[serde(skip)]
    pub deleted_at: Option<chrono::NaiveDateTime>,
}

/// Declared sex of a [`User`].
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type,
)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    /// Parse the exact form values `Male` and `Female`; anything else is
    /// rejected.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Male" => Some(Sex::Male),
            "Female" => Some(Sex::Female),
            _ => None,
        }
    }
}

impl std::fmt::Display for Sex {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Sex::Male => write!(f, "Male"),
            Sex::Female => write!(f, "Female"),
        }
    }
}
