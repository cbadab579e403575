use sqlx::{Pool, Postgres};

use crate::{
    authentication::{
        cryptography::{hash_password, verify_password},
        jwt::generate_jwt_session,
    },
    error::{Error, QueryError},
    schema::{NewUser, User, UserProfile},
    validate::validate_new_user,
};

pub async fn get_user_by_email(
    pool: &Pool<Postgres>,
    email: &str,
) -> Result<Option<User>, Error> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
        .map_err(|e| Error::from(QueryError::from(e)))?;

    Ok(row)
}

pub async fn get_user_by_id(pool: &Pool<Postgres>, user_id: i32) -> Result<Option<User>, Error> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| Error::from(QueryError::from(e)))?;

    Ok(row)
}

/// Registers a user. The email is the login identifier; both email and
/// username must be unique. The stored password is the argon2 hash.
pub async fn register_user(payload: &NewUser, pool: &Pool<Postgres>) -> Result<User, Error> {
    validate_new_user(payload)?;

    let password = hash_password(&payload.password)
        .map_err(|e| Error::Query(format!("password hashing failed: {e}")))?;

    let row: Option<User> = sqlx::query_as(
        "
        INSERT INTO users (email, username, first_name, last_name, password)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT DO NOTHING RETURNING *;
    ",
    )
    .bind(&payload.email)
    .bind(&payload.username)
    .bind(&payload.first_name)
    .bind(&payload.last_name)
    .bind(password)
    .fetch_optional(pool)
    .await
    .map_err(|e| Error::from(QueryError::from(e)))?;

    row.ok_or_else(|| {
        Error::AlreadyExists(String::from(
            "A user with this email or username already exists",
        ))
    })
}

pub async fn login_user(
    email: &str,
    password: &str,
    pool: &Pool<Postgres>,
) -> Result<String, Error> {
    let user = match get_user_by_email(pool, email).await? {
        Some(user) => user,
        None => return Err(Error::Unauthenticated),
    };

    let authenticated = verify_password(password, &user.password).unwrap_or(false);
    if !authenticated {
        return Err(Error::Unauthenticated);
    }

    Ok(generate_jwt_session(&user))
}

/// Public profile of a user as seen by an optional viewer.
pub async fn get_profile(
    user_id: i32,
    viewer_id: Option<i32>,
    pool: &Pool<Postgres>,
) -> Result<UserProfile, Error> {
    let user = get_user_by_id(pool, user_id)
        .await?
        .ok_or_else(|| Error::NotFound(String::from("No user exists with specified id")))?;

    let is_subscribed = match viewer_id {
        Some(viewer_id) => super::is_subscribed(viewer_id, user_id, pool).await?,
        None => false,
    };

    Ok(UserProfile::from_user(user, is_subscribed))
}

pub async fn set_avatar(user_id: i32, avatar: &str, pool: &Pool<Postgres>) -> Result<(), Error> {
    sqlx::query("UPDATE users SET avatar = $1 WHERE id = $2")
        .bind(avatar)
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(|e| Error::from(QueryError::from(e)))?;

    Ok(())
}

pub async fn remove_avatar(user_id: i32, pool: &Pool<Postgres>) -> Result<(), Error> {
    sqlx::query("UPDATE users SET avatar = NULL WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(|e| Error::from(QueryError::from(e)))?;

    Ok(())
}
