use argon2::{password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use lazy_static::lazy_static;
use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};
use regex::Regex;
use tracing::{error, info, warn};

use crate::{
    auth::{
        dto::RegisterRequest,
        repo::UserRepo,
        repo_types::{NewUser, User},
    },
    error::StoreError,
};

const API_TOKEN_LEN: usize = 24;
const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid email")]
    InvalidEmail,
    #[error("Password too short")]
    PasswordTooShort,
    #[error("Name can't be blank")]
    BlankName,
    #[error("Email already registered")]
    EmailTaken,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Random alphanumeric token for the JSON API.
pub fn generate_api_token() -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(API_TOKEN_LEN)
        .map(char::from)
        .collect()
}

pub async fn register_user<R>(repo: &R, req: RegisterRequest) -> Result<User, AuthError>
where
    R: UserRepo + ?Sized,
{
    let email = normalize_email(&req.email);
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AuthError::InvalidEmail);
    }
    if req.password.len() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(AuthError::PasswordTooShort);
    }
    let first_name = req.first_name.trim().to_string();
    let last_name = req.last_name.trim().to_string();
    if first_name.is_empty() || last_name.is_empty() {
        return Err(AuthError::BlankName);
    }

    // Ensure email is not taken
    if repo
        .find_user_by_email(&email)
        .await
        .map_err(anyhow::Error::from)?
        .is_some()
    {
        warn!(email = %email, "email already registered");
        return Err(AuthError::EmailTaken);
    }

    let new = NewUser {
        email,
        first_name,
        last_name,
        password_hash: hash_password(&req.password)?,
        authentication_token: generate_api_token(),
    };

    match repo.insert_user(&new).await {
        Ok(user) => {
            info!(user_id = %user.id, email = %user.email, "user registered");
            Ok(user)
        }
        Err(StoreError::UniqueViolation(_)) => Err(AuthError::EmailTaken),
        Err(StoreError::Other(e)) => Err(AuthError::Internal(e)),
    }
}

/// Returns the user when the email/password pair is valid.
pub async fn authenticate<R>(repo: &R, email: &str, password: &str) -> anyhow::Result<Option<User>>
where
    R: UserRepo + ?Sized,
{
    let email = normalize_email(email);
    let Some(user) = repo.find_user_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Ok(None);
    };
    if !verify_password(password, &user.password_hash)? {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Ok(None);
    }
    Ok(Some(user))
}

/// Resolves API credentials (`user_email` + `user_token`) to their user.
pub async fn authenticate_token<R>(repo: &R, email: &str, token: &str) -> anyhow::Result<Option<User>>
where
    R: UserRepo + ?Sized,
{
    let user = repo.find_user_by_email(&normalize_email(email)).await?;
    Ok(user.filter(|u| !token.is_empty() && u.authentication_token == token))
}
