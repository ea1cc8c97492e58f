//! User lifecycle: registration, login, profile and soft deletion

use std::sync::Arc;

use shared::error::{AppError, ErrorCode};
use shared::models::{
    ChangePasswordRequest, LoginRequest, LoginResponse, UserCreate, UserResponse, UserUpdate,
};
use shared::pagination::Page;
use uuid::Uuid;

use super::{Paged, parse_id};
use crate::auth::JwtService;
use crate::db::{NewUser, UserChanges, UserFilter, UserRepository};
use crate::error::{ServiceError, ServiceResult};
use crate::util::{hash_password, verify_password};

/// Trimmed and lowercased; the form stored and looked up
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn hash(password: &str) -> ServiceResult<String> {
    hash_password(password)
        .map_err(|e| ServiceError::Db(format!("password hashing failed: {e}").into()))
}

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    jwt: JwtService,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>, jwt: JwtService) -> Self {
        Self { users, jwt }
    }

    async fn load(&self, id: Uuid) -> ServiceResult<shared::models::User> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::UserNotFound).into())
    }

    pub async fn register(&self, req: UserCreate) -> ServiceResult<UserResponse> {
        let email = normalize_email(&req.email);

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::new(ErrorCode::EmailAlreadyRegistered)
                .with_detail("email", email)
                .into());
        }

        let user = self
            .users
            .create(NewUser {
                id: Uuid::new_v4(),
                name: req.name.trim().to_string(),
                email,
                phone: req.phone.as_deref().map(str::trim).unwrap_or_default().to_string(),
                password_hash: hash(&req.password)?,
            })
            .await?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user.into())
    }

    /// Unknown email and wrong password are indistinguishable; an inactive
    /// account is only reported after the password matched
    pub async fn login(&self, req: LoginRequest) -> ServiceResult<LoginResponse> {
        let email = normalize_email(&req.email);

        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(AppError::invalid_credentials)?;

        if !verify_password(&req.password, &user.password_hash) {
            tracing::debug!(user_id = %user.id, "Login rejected: wrong password");
            return Err(AppError::invalid_credentials().into());
        }

        if !user.is_active() {
            return Err(AppError::new(ErrorCode::AccountDisabled).into());
        }

        let token = self
            .jwt
            .generate_token(user.id, &user.email)
            .map_err(AppError::from)?;

        tracing::info!(user_id = %user.id, "User logged in");
        Ok(LoginResponse {
            token,
            user: user.into(),
        })
    }

    pub async fn change_password(
        &self,
        user_id: Uuid,
        req: ChangePasswordRequest,
    ) -> ServiceResult<()> {
        let user = self.load(user_id).await?;

        if !verify_password(&req.current_password, &user.password_hash) {
            return Err(AppError::new(ErrorCode::WrongPassword).into());
        }

        let changes = UserChanges {
            password_hash: Some(hash(&req.new_password)?),
            ..Default::default()
        };
        self.users
            .update(user_id, changes)
            .await
            .map_err(ServiceError::or_not_found(ErrorCode::UserNotFound))?;

        tracing::info!(user_id = %user_id, "Password changed");
        Ok(())
    }

    pub async fn profile(&self, user_id: Uuid) -> ServiceResult<UserResponse> {
        Ok(self.load(user_id).await?.into())
    }

    pub async fn get(&self, raw_id: &str) -> ServiceResult<UserResponse> {
        let id = parse_id(raw_id, "user")?;
        Ok(self.load(id).await?.into())
    }

    pub async fn list(&self, page: Page) -> ServiceResult<Paged<UserResponse>> {
        self.list_filtered(&UserFilter::default(), page).await
    }

    /// Case-insensitive substring match on name or email; blank lists all
    pub async fn search(
        &self,
        query: Option<&str>,
        page: Page,
    ) -> ServiceResult<Paged<UserResponse>> {
        let search = query
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_string);
        self.list_filtered(&UserFilter { search }, page).await
    }

    async fn list_filtered(
        &self,
        filter: &UserFilter,
        page: Page,
    ) -> ServiceResult<Paged<UserResponse>> {
        let users = self
            .users
            .list(filter, page.limit as i64, page.offset())
            .await?;
        let total = self.users.count(filter).await?;
        Ok(Paged {
            items: users.into_iter().map(UserResponse::from).collect(),
            meta: page.meta(total),
        })
    }

    pub async fn update(&self, raw_id: &str, req: UserUpdate) -> ServiceResult<UserResponse> {
        let id = parse_id(raw_id, "user")?;

        let changes = UserChanges {
            name: req.name.map(|n| n.trim().to_string()),
            phone: req.phone.map(|p| p.trim().to_string()),
            password_hash: req.password.as_deref().map(hash).transpose()?,
        };
        if changes.is_empty() {
            return Err(AppError::new(ErrorCode::NothingToUpdate).into());
        }

        let user = self
            .users
            .update(id, changes)
            .await
            .map_err(ServiceError::or_not_found(ErrorCode::UserNotFound))?;

        tracing::info!(user_id = %id, "User updated");
        Ok(user.into())
    }

    /// Soft delete: the user stays readable but can no longer log in or subscribe
    pub async fn delete(&self, raw_id: &str) -> ServiceResult<()> {
        let id = parse_id(raw_id, "user")?;
        self.users
            .soft_delete(id)
            .await
            .map_err(ServiceError::or_not_found(ErrorCode::UserNotFound))?;
        tracing::info!(user_id = %id, "User deactivated");
        Ok(())
    }
}
