use super::models::{self as users, UserCreate, UserUpdate};
use super::tokens::models as tokens;
use crate::common::errors::{BusinessError, BusinessResult, DbErrorExt};
use crate::common::validation::required_text;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    ModelTrait, QueryFilter,
};
use uuid::Uuid;

pub fn hash_password(password: &str, cost: u32) -> BusinessResult<String> {
    bcrypt::hash(password, cost).map_err(|e| BusinessError::Internal {
        message: format!("Failed to hash password: {e}"),
    })
}

pub fn verify_password(password: &str, hash: &str) -> BusinessResult<bool> {
    bcrypt::verify(password, hash).map_err(|e| BusinessError::Internal {
        message: format!("Failed to verify password: {e}"),
    })
}

/// 40 lowercase hex characters drawn from the thread RNG
pub fn generate_token_key() -> String {
    let bytes: [u8; 20] = rand::random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

pub fn validate_username(username: &str) -> BusinessResult<()> {
    if username.chars().count() > 150 {
        return Err(crate::invalid_input!(
            "username",
            "Username is too long (max 150 characters)"
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        return Err(crate::invalid_input!(
            "username",
            "Username can only contain letters, numbers and @/./+/-/_ characters"
        ));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> BusinessResult<()> {
    let invalid = || crate::invalid_input!("email", "Enter a valid email address");

    if email.len() > 254 {
        return Err(crate::invalid_input!("email", "Email is too long"));
    }
    let (local_part, domain_part) = email.split_once('@').ok_or_else(invalid)?;
    if local_part.is_empty()
        || domain_part.is_empty()
        || domain_part.contains('@')
        || !domain_part.contains('.')
        || domain_part.starts_with('.')
        || domain_part.ends_with('.')
    {
        return Err(invalid());
    }
    Ok(())
}

pub fn validate_password(password: &str) -> BusinessResult<()> {
    if password.chars().count() < 8 {
        return Err(crate::invalid_input!(
            "password",
            "Password must be at least 8 characters long"
        ));
    }
    Ok(())
}

pub fn validate_phone_number(phone_number: &str) -> BusinessResult<()> {
    let digits = phone_number.strip_prefix('+').unwrap_or(phone_number);
    if digits.is_empty() || digits.len() > 14 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(crate::invalid_input!(
            "phone_number",
            "Phone number must contain up to 15 digits, optionally prefixed with +"
        ));
    }
    Ok(())
}

/// Blank optional strings are stored as NULL so the unique indexes ignore them
fn normalise_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub async fn create_user(
    db: &DatabaseConnection,
    hash_cost: u32,
    data: UserCreate,
) -> BusinessResult<users::Model> {
    let username = required_text("username", data.username)?;
    validate_username(&username)?;
    let password = data
        .password
        .ok_or_else(|| crate::invalid_input!("password", "password is required"))?;
    validate_password(&password)?;

    let email = normalise_optional(data.email);
    if let Some(email) = &email {
        validate_email(email)?;
    }
    let phone_number = normalise_optional(data.phone_number);
    if let Some(phone_number) = &phone_number {
        validate_phone_number(phone_number)?;
    }

    let now = Utc::now();
    let user = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(username),
        email: Set(email),
        password_hash: Set(hash_password(&password, hash_cost)?),
        first_name: Set(data.first_name.unwrap_or_default().trim().to_string()),
        last_name: Set(data.last_name.unwrap_or_default().trim().to_string()),
        phone_number: Set(phone_number),
        created_at: Set(now),
        last_updated: Set(now),
    }
    .insert(db)
    .await
    .map_err(|e| e.to_business_error("user"))?;

    tracing::info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(user)
}

pub async fn find_user(db: &DatabaseConnection, id: Uuid) -> BusinessResult<users::Model> {
    users::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| crate::not_found!("User", id))
}

pub async fn update_user(
    db: &DatabaseConnection,
    hash_cost: u32,
    id: Uuid,
    data: UserUpdate,
) -> BusinessResult<users::Model> {
    let existing = find_user(db, id).await?;
    let mut user: users::ActiveModel = existing.into();

    if data.username.is_some() {
        let username = required_text("username", data.username)?;
        validate_username(&username)?;
        user.username = Set(username);
    }
    if let Some(password) = data.password {
        validate_password(&password)?;
        user.password_hash = Set(hash_password(&password, hash_cost)?);
    }
    if data.email.is_some() {
        let email = normalise_optional(data.email);
        if let Some(email) = &email {
            validate_email(email)?;
        }
        user.email = Set(email);
    }
    if data.phone_number.is_some() {
        let phone_number = normalise_optional(data.phone_number);
        if let Some(phone_number) = &phone_number {
            validate_phone_number(phone_number)?;
        }
        user.phone_number = Set(phone_number);
    }
    if let Some(first_name) = data.first_name {
        user.first_name = Set(first_name.trim().to_string());
    }
    if let Some(last_name) = data.last_name {
        user.last_name = Set(last_name.trim().to_string());
    }
    user.last_updated = Set(Utc::now());

    user.update(db)
        .await
        .map_err(|e| e.to_business_error("user"))
}

pub async fn delete_user(db: &DatabaseConnection, id: Uuid) -> BusinessResult<()> {
    let user = find_user(db, id).await?;
    user.delete(db).await?;
    tracing::info!(user_id = %id, "user deleted");
    Ok(())
}

/// Checks the credentials and returns the user's token, issuing one on first login
pub async fn obtain_token(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
) -> BusinessResult<String> {
    let invalid_credentials = || BusinessError::Unauthorized {
        message: "Unable to log in with provided credentials".to_string(),
    };

    let user = users::Entity::find()
        .filter(users::Column::Username.eq(username))
        .one(db)
        .await?
        .ok_or_else(invalid_credentials)?;

    if !verify_password(password, &user.password_hash)? {
        tracing::warn!(username = %username, "rejected login attempt");
        return Err(invalid_credentials());
    }

    let existing = tokens::Entity::find()
        .filter(tokens::Column::UserId.eq(user.id))
        .one(db)
        .await?;
    if let Some(token) = existing {
        return Ok(token.key);
    }

    let token = tokens::ActiveModel {
        key: Set(generate_token_key()),
        user_id: Set(user.id),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await?;

    tracing::info!(user_id = %user.id, "issued auth token");
    Ok(token.key)
}

/// Resolves a token key to its owner
pub async fn authenticate_token(db: &DatabaseConnection, key: &str) -> BusinessResult<users::Model> {
    let unauthorized = || BusinessError::Unauthorized {
        message: "Invalid token".to_string(),
    };

    let (_, user) = tokens::Entity::find_by_id(key.to_string())
        .find_also_related(users::Entity)
        .one(db)
        .await?
        .ok_or_else(unauthorized)?;

    user.ok_or_else(unauthorized)
}

pub async fn revoke_token(db: &DatabaseConnection, key: &str) -> BusinessResult<()> {
    tokens::Entity::delete_by_id(key.to_string())
        .exec(db)
        .await?;
    Ok(())
}
