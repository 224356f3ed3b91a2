//! Domain service for accounts: signup and activation, token issuance and
//! user administration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::{User, is_unique_violation};
use crate::domain::{Actor, Denial, FieldError, Role};

/// Errors specific to account operations.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Authentication credentials were not provided")]
    Unauthenticated,

    #[error("You do not have permission to perform this action")]
    Forbidden,

    #[error("Invalid {}: {}", .0.field, .0.message)]
    InvalidField(FieldError),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Failed to send mail: {0}")]
    Mail(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<Denial> for AccountError {
    fn from(denial: Denial) -> Self {
        match denial {
            Denial::Unauthenticated => Self::Unauthenticated,
            Denial::Forbidden => Self::Forbidden,
        }
    }
}

impl From<FieldError> for AccountError {
    fn from(err: FieldError) -> Self {
        Self::InvalidField(err)
    }
}

impl From<sea_orm::DbErr> for AccountError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AccountError {
    fn from(err: anyhow::Error) -> Self {
        if is_unique_violation(&err) {
            return Self::Conflict("email or username already taken".to_string());
        }
        Self::Internal(format!("{err:#}"))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignupInput {
    pub email: String,
    pub username: String,
}

/// What signup echoes back; the code itself only travels by mail.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SignupReceipt {
    pub email: String,
    pub username: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActivationInput {
    pub email: String,
    pub confirmation_code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

/// Account created by an admin.
#[derive(Debug, Clone, Deserialize)]
pub struct UserInput {
    pub email: String,
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
}

#[async_trait::async_trait]
pub trait AccountService: Send + Sync {
    /// Maps a bearer token to the actor it belongs to. Unknown tokens and
    /// inactive accounts resolve to [`Actor::Anonymous`].
    async fn resolve_token(&self, token: &str) -> Result<Actor, AccountError>;

    /// Registers an inactive account and mails its confirmation code.
    ///
    /// Repeating the signup for a still-inactive account re-sends the code.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::Conflict`] if the email or username belongs
    /// to another account, and [`AccountError::Mail`] if the code could not
    /// be sent.
    async fn signup(&self, actor: &Actor, input: SignupInput)
    -> Result<SignupReceipt, AccountError>;

    /// Activates the account and returns its new bearer token.
    async fn activate(&self, input: ActivationInput) -> Result<String, AccountError>;

    /// Password login; returns the account's bearer token.
    async fn login(&self, input: LoginInput) -> Result<String, AccountError>;

    /// Replaces the caller's bearer token.
    async fn refresh_token(&self, actor: &Actor) -> Result<String, AccountError>;

    async fn get_me(&self, actor: &Actor) -> Result<User, AccountError>;

    async fn update_me(&self, actor: &Actor, patch: UserPatch) -> Result<User, AccountError>;

    /// Always refused; accounts are removed by an admin.
    async fn delete_me(&self, actor: &Actor) -> Result<(), AccountError>;

    async fn list_users(&self, actor: &Actor) -> Result<Vec<User>, AccountError>;

    async fn create_user(&self, actor: &Actor, input: UserInput) -> Result<User, AccountError>;

    async fn get_user(&self, actor: &Actor, username: &str) -> Result<User, AccountError>;

    async fn update_user(
        &self,
        actor: &Actor,
        username: &str,
        patch: UserPatch,
    ) -> Result<User, AccountError>;

    /// Removes the account with its reviews and comments, recomputing the
    /// rating of every title that lost a review.
    async fn delete_user(&self, actor: &Actor, username: &str) -> Result<(), AccountError>;

    /// Creates an active admin with a password, bypassing the policy.
    /// Used to bootstrap an empty database from the command line.
    async fn bootstrap_admin(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<User, AccountError>;
}
