use crate::error::{AppError, AppResult};
use crate::models::{NewUser, User};
use crate::storage::MemStorage;
use bcrypt::{hash, verify};

pub fn hash_password(password: &str, cost: u32) -> AppResult<String> {
    hash(password, cost).map_err(|err| AppError::Internal(format!("password hashing failed: {err}")))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    verify(password, hash).unwrap_or(false)
}

pub fn check_credentials(username: &str, password: &str) -> AppResult<()> {
    if username.trim().is_empty() || password.is_empty() {
        return Err(AppError::BadRequest("Username and password are required".into()));
    }
    Ok(())
}

/// Registers a regular (non-admin) user; usernames already in use are refused.
pub fn register(storage: &mut MemStorage, username: &str, password_hash: &str) -> AppResult<User> {
    let username = username.trim();
    if storage.get_user_by_username(username).is_some() {
        return Err(AppError::BadRequest("User already exists".into()));
    }

    Ok(storage.create_user(NewUser {
        username,
        password_hash,
        is_admin: false,
    }))
}

/// Checks a password against the looked-up account, if there is one.
pub fn authenticate(user: Option<User>, password: &str) -> AppResult<User> {
    user.filter(|user| verify_password(password, &user.password_hash))
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".into()))
}
