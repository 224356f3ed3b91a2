//! `SeaORM` implementation of the `AccountService` trait.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::config::Config;
use crate::constants::accounts::CONFIRMATION_SUBJECT;
use crate::db::{NewUser, Store, User, UserChanges};
use crate::domain::{Action, Actor, FieldError, Owner, Resource, Role, require, validation};
use crate::services::account_service::{
    AccountError, AccountService, ActivationInput, LoginInput, SignupInput, SignupReceipt,
    UserInput, UserPatch,
};
use crate::services::mail::{MailMessage, Mailer};
use crate::services::token::TokenCodec;

pub struct SeaOrmAccountService {
    store: Store,
    config: Arc<RwLock<Config>>,
    mailer: Arc<dyn Mailer>,
    codec: Arc<dyn TokenCodec>,
}

impl SeaOrmAccountService {
    #[must_use]
    pub fn new(
        store: Store,
        config: Arc<RwLock<Config>>,
        mailer: Arc<dyn Mailer>,
        codec: Arc<dyn TokenCodec>,
    ) -> Self {
        Self {
            store,
            config,
            mailer,
            codec,
        }
    }

    async fn current_user(&self, actor: &Actor) -> Result<User, AccountError> {
        let id = actor.user_id().ok_or(AccountError::Unauthenticated)?;
        self.store
            .get_user(id)
            .await?
            .ok_or(AccountError::Unauthenticated)
    }

    async fn load_by_username(&self, username: &str) -> Result<User, AccountError> {
        self.store
            .get_user_by_username(username)
            .await?
            .ok_or_else(|| AccountError::NotFound(format!("User '{username}'")))
    }

    /// Addressing arbitrary accounts by username needs directory rights,
    /// which only admins hold.
    fn require_directory(actor: &Actor) -> Result<(), AccountError> {
        require(actor, Action::List, Resource::UserAccount, None)?;
        Ok(())
    }

    async fn send_confirmation(&self, user: &User) -> Result<(), AccountError> {
        let code = self.codec.make_token(user);
        let message = MailMessage {
            to: user.email.clone(),
            subject: CONFIRMATION_SUBJECT.to_string(),
            body: format!("Hello, your confirmation_code: {code}"),
        };

        self.mailer.send(message).await.map_err(|e| {
            warn!(user_id = user.id, error = %e, "Failed to send confirmation code");
            AccountError::Mail(e.to_string())
        })
    }

    async fn ensure_email_free(&self, email: &str, except: Option<i32>) -> Result<(), AccountError> {
        match self.store.get_user_by_email(email).await? {
            Some(other) if Some(other.id) != except => Err(AccountError::Conflict(format!(
                "A user with email '{email}' already exists"
            ))),
            _ => Ok(()),
        }
    }

    async fn ensure_username_free(
        &self,
        username: &str,
        except: Option<i32>,
    ) -> Result<(), AccountError> {
        match self.store.get_user_by_username(username).await? {
            Some(other) if Some(other.id) != except => Err(AccountError::Conflict(format!(
                "A user with username '{username}' already exists"
            ))),
            _ => Ok(()),
        }
    }

    /// Validates a patch against `target` and turns it into store changes.
    async fn changes_for(&self, target: &User, patch: UserPatch) -> Result<UserChanges, AccountError> {
        let email = patch.email.as_deref().map(validation::email).transpose()?;
        if let Some(email) = &email {
            self.ensure_email_free(email, Some(target.id)).await?;
        }

        let username = patch
            .username
            .as_deref()
            .map(validation::username)
            .transpose()?;
        if let Some(username) = &username {
            self.ensure_username_free(username, Some(target.id)).await?;
        }

        Ok(UserChanges {
            email,
            username,
            first_name: patch
                .first_name
                .as_deref()
                .map(|v| validation::profile_field("first_name", v))
                .transpose()?,
            last_name: patch
                .last_name
                .as_deref()
                .map(|v| validation::profile_field("last_name", v))
                .transpose()?,
            bio: patch.bio.map(|b| b.trim().to_string()),
            role: patch.role,
        })
    }

    async fn apply(&self, target: &User, changes: UserChanges) -> Result<User, AccountError> {
        self.store
            .update_user(target.id, changes)
            .await?
            .ok_or_else(|| AccountError::NotFound(format!("User '{}'", target.username)))
    }
}

#[async_trait]
impl AccountService for SeaOrmAccountService {
    async fn resolve_token(&self, token: &str) -> Result<Actor, AccountError> {
        Ok(self
            .store
            .verify_token(token)
            .await?
            .map_or(Actor::Anonymous, |user| Actor::user(user.id, user.role)))
    }

    async fn signup(
        &self,
        actor: &Actor,
        input: SignupInput,
    ) -> Result<SignupReceipt, AccountError> {
        if actor.is_authenticated() {
            return Err(AccountError::Forbidden);
        }

        let email = validation::email(&input.email)?;
        let username = validation::username(&input.username)?;

        let by_email = self.store.get_user_by_email(&email).await?;
        let by_username = self.store.get_user_by_username(&username).await?;

        let user = match (by_email, by_username) {
            (Some(a), Some(b)) if a.id == b.id && !a.is_active => {
                info!(user_id = a.id, "Re-sending confirmation code");
                a
            }
            (Some(_), _) => {
                return Err(AccountError::Conflict(format!(
                    "A user with email '{email}' already exists"
                )));
            }
            (None, Some(_)) => {
                return Err(AccountError::Conflict(format!(
                    "A user with username '{username}' already exists"
                )));
            }
            (None, None) => {
                let user = self
                    .store
                    .create_user(NewUser {
                        email,
                        username,
                        first_name: String::new(),
                        last_name: String::new(),
                        bio: String::new(),
                        role: Role::User,
                        is_active: false,
                    })
                    .await?;
                info!(user_id = user.id, username = %user.username, "User signed up");
                user
            }
        };

        self.send_confirmation(&user).await?;

        Ok(SignupReceipt {
            email: user.email,
            username: user.username,
        })
    }

    async fn activate(&self, input: ActivationInput) -> Result<String, AccountError> {
        let email = validation::email(&input.email)?;
        let user = self
            .store
            .get_user_by_email(&email)
            .await?
            .ok_or_else(|| AccountError::NotFound(format!("User with email '{email}'")))?;

        if !self.codec.check_token(&user, input.confirmation_code.trim()) {
            warn!(user_id = user.id, "Rejected confirmation code");
            return Err(AccountError::InvalidField(FieldError::new(
                "confirmation_code",
                "Invalid confirmation code.",
            )));
        }

        let token = self.store.activate_user(user.id).await?;
        info!(user_id = user.id, "Account activated");
        Ok(token)
    }

    async fn login(&self, input: LoginInput) -> Result<String, AccountError> {
        let user = self
            .store
            .verify_user_password(&input.username, &input.password)
            .await?
            .ok_or(AccountError::InvalidCredentials)?;

        Ok(self.store.ensure_user_token(user.id).await?)
    }

    async fn refresh_token(&self, actor: &Actor) -> Result<String, AccountError> {
        let user = self.current_user(actor).await?;
        let token = self.store.regenerate_user_token(user.id).await?;
        info!(user_id = user.id, "Token rotated");
        Ok(token)
    }

    async fn get_me(&self, actor: &Actor) -> Result<User, AccountError> {
        let user = self.current_user(actor).await?;
        require(
            actor,
            Action::Retrieve,
            Resource::UserAccount,
            Some(Owner(user.id)),
        )?;
        Ok(user)
    }

    async fn update_me(&self, actor: &Actor, patch: UserPatch) -> Result<User, AccountError> {
        let user = self.current_user(actor).await?;
        require(
            actor,
            Action::Update,
            Resource::UserAccount,
            Some(Owner(user.id)),
        )?;

        if patch.role.is_some_and(|role| role != user.role) && !actor.is_admin() {
            return Err(AccountError::Forbidden);
        }

        let changes = self.changes_for(&user, patch).await?;
        self.apply(&user, changes).await
    }

    async fn delete_me(&self, actor: &Actor) -> Result<(), AccountError> {
        let user = self.current_user(actor).await?;
        require(
            actor,
            Action::Delete,
            Resource::UserAccount,
            Some(Owner(user.id)),
        )?;
        // Self-deletion is denied by the policy; never report success.
        Err(AccountError::Forbidden)
    }

    async fn list_users(&self, actor: &Actor) -> Result<Vec<User>, AccountError> {
        require(actor, Action::List, Resource::UserAccount, None)?;
        Ok(self.store.list_users().await?)
    }

    async fn create_user(&self, actor: &Actor, input: UserInput) -> Result<User, AccountError> {
        require(actor, Action::Create, Resource::UserAccount, None)?;

        let email = validation::email(&input.email)?;
        let username = validation::username(&input.username)?;
        self.ensure_email_free(&email, None).await?;
        self.ensure_username_free(&username, None).await?;

        let user = self
            .store
            .create_user(NewUser {
                email,
                username,
                first_name: validation::profile_field("first_name", &input.first_name)?,
                last_name: validation::profile_field("last_name", &input.last_name)?,
                bio: input.bio.trim().to_string(),
                role: input.role.unwrap_or_default(),
                is_active: true,
            })
            .await?;

        info!(user_id = user.id, username = %user.username, role = %user.role, "User created by admin");
        Ok(user)
    }

    async fn get_user(&self, actor: &Actor, username: &str) -> Result<User, AccountError> {
        Self::require_directory(actor)?;
        let user = self.load_by_username(username).await?;
        require(
            actor,
            Action::Retrieve,
            Resource::UserAccount,
            Some(Owner(user.id)),
        )?;
        Ok(user)
    }

    async fn update_user(
        &self,
        actor: &Actor,
        username: &str,
        patch: UserPatch,
    ) -> Result<User, AccountError> {
        Self::require_directory(actor)?;
        let user = self.load_by_username(username).await?;
        require(
            actor,
            Action::Update,
            Resource::UserAccount,
            Some(Owner(user.id)),
        )?;

        let changes = self.changes_for(&user, patch).await?;
        self.apply(&user, changes).await
    }

    async fn delete_user(&self, actor: &Actor, username: &str) -> Result<(), AccountError> {
        Self::require_directory(actor)?;
        let user = self.load_by_username(username).await?;
        require(
            actor,
            Action::Delete,
            Resource::UserAccount,
            Some(Owner(user.id)),
        )?;

        if !self.store.delete_user(user.id).await? {
            return Err(AccountError::NotFound(format!("User '{username}'")));
        }

        info!(user_id = user.id, %username, "User deleted");
        Ok(())
    }

    async fn bootstrap_admin(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<User, AccountError> {
        let email = validation::email(email)?;
        let username = validation::username(username)?;
        let password = validation::password(password)?;
        self.ensure_email_free(&email, None).await?;
        self.ensure_username_free(&username, None).await?;

        let user = self
            .store
            .create_user(NewUser {
                email,
                username,
                first_name: String::new(),
                last_name: String::new(),
                bio: String::new(),
                role: Role::Admin,
                is_active: true,
            })
            .await?;

        let security = self.config.read().await.security.clone();
        self.store
            .set_user_password(user.id, password, &security)
            .await?;
        self.store.ensure_user_token(user.id).await?;

        info!(user_id = user.id, username = %user.username, "Admin account created");

        self.store
            .get_user(user.id)
            .await?
            .ok_or_else(|| AccountError::Internal("Failed to retrieve created admin".into()))
    }
}
