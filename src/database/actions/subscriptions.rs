use sqlx::{Pool, Postgres};

use crate::{
    constants::SUBSCRIPTION_COUNT_PER_PAGE,
    error::{Error, FieldError, QueryError},
    jwt::SessionData,
    pagination::PageContext,
    schema::{RecipeSummary, SubscriptionProfile, User, UserProfile},
};

pub async fn is_subscribed(
    user_id: i32,
    author_id: i32,
    pool: &Pool<Postgres>,
) -> Result<bool, Error> {
    let row: Option<(i32,)> = sqlx::query_as(
        "SELECT author_id FROM subscriptions WHERE user_id = $1 AND author_id = $2",
    )
    .bind(user_id)
    .bind(author_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| Error::from(QueryError::from(e)))?;

    Ok(row.is_some())
}

async fn author_summaries(
    author_id: i32,
    recipes_limit: Option<i64>,
    pool: &Pool<Postgres>,
) -> Result<(Vec<RecipeSummary>, i64), Error> {
    let recipes: Vec<RecipeSummary> = sqlx::query_as(
        "
        SELECT id, name, image, cooking_time
        FROM recipes
        WHERE author_id = $1
        ORDER BY pub_date DESC
        LIMIT $2
    ",
    )
    .bind(author_id)
    .bind(recipes_limit)
    .fetch_all(pool)
    .await
    .map_err(|e| Error::from(QueryError::from(e)))?;

    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM recipes WHERE author_id = $1")
        .bind(author_id)
        .fetch_one(pool)
        .await
        .map_err(|e| Error::from(QueryError::from(e)))?;

    Ok((recipes, count.0))
}

async fn subscription_profile(
    author: User,
    recipes_limit: Option<i64>,
    pool: &Pool<Postgres>,
) -> Result<SubscriptionProfile, Error> {
    let (recipes, recipes_count) = author_summaries(author.id, recipes_limit, pool).await?;

    Ok(SubscriptionProfile {
        author: UserProfile::from_user(author, true),
        recipes,
        recipes_count,
    })
}

/// Subscribes the session user to an author. Self-subscription and duplicate
/// subscriptions are rejected at write time.
pub async fn subscribe(
    author_id: i32,
    session: &SessionData,
    recipes_limit: Option<i64>,
    pool: &Pool<Postgres>,
) -> Result<SubscriptionProfile, Error> {
    if session.user_id == author_id {
        return Err(Error::Validation(vec![FieldError::new(
            "author",
            "You cannot subscribe to yourself",
        )]));
    }

    let author = super::get_user_by_id(pool, author_id)
        .await?
        .ok_or_else(|| Error::NotFound(String::from("No user exists with specified id")))?;

    let result = sqlx::query(
        "INSERT INTO subscriptions (user_id, author_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(session.user_id)
    .bind(author_id)
    .execute(pool)
    .await
    .map_err(|e| Error::from(QueryError::from(e)))?;

    if result.rows_affected() == 0 {
        return Err(Error::AlreadyExists(format!(
            "You are already subscribed to {}",
            author.username
        )));
    }

    subscription_profile(author, recipes_limit, pool).await
}

pub async fn unsubscribe(
    author_id: i32,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    let result = sqlx::query("DELETE FROM subscriptions WHERE user_id = $1 AND author_id = $2")
        .bind(session.user_id)
        .bind(author_id)
        .execute(pool)
        .await
        .map_err(|e| Error::from(QueryError::from(e)))?;

    if result.rows_affected() == 0 {
        return Err(Error::NotInSet(String::from(
            "You are not subscribed to this user",
        )));
    }

    Ok(())
}

/// Paginated list of the authors the user is subscribed to, each with their
/// recipe summaries (capped by `recipes_limit`) and total recipe count.
pub async fn fetch_subscriptions(
    session: &SessionData,
    offset: i64,
    recipes_limit: Option<i64>,
    pool: &Pool<Postgres>,
) -> Result<PageContext<SubscriptionProfile>, Error> {
    let authors: Vec<User> = sqlx::query_as(
        "
        SELECT u.*
        FROM subscriptions s
        INNER JOIN users u ON u.id = s.author_id
        WHERE s.user_id = $1
        ORDER BY u.username
        LIMIT $2 OFFSET $3
    ",
    )
    .bind(session.user_id)
    .bind(SUBSCRIPTION_COUNT_PER_PAGE)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(|e| Error::from(QueryError::from(e)))?;

    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM subscriptions WHERE user_id = $1")
        .bind(session.user_id)
        .fetch_one(pool)
        .await
        .map_err(|e| Error::from(QueryError::from(e)))?;

    let mut rows = Vec::with_capacity(authors.len());
    for author in authors {
        rows.push(subscription_profile(author, recipes_limit, pool).await?);
    }

    Ok(PageContext::from_rows(
        rows,
        total.0,
        SUBSCRIPTION_COUNT_PER_PAGE,
        offset,
    ))
}

#[cfg(test)]
mod tests {
    use sqlx::postgres::PgPoolOptions;

    use super::*;
    use crate::schema::UserRole;

    fn session(user_id: i32) -> SessionData {
        SessionData {
            user_id,
            email: String::from("cook@example.com"),
            username: String::from("cook"),
            role: UserRole::User,
            is_admin: false,
        }
    }

    // The guard runs before any query, so a lazy pool is never connected.
    #[tokio::test]
    async fn self_subscription_always_fails() {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unreachable")
            .unwrap();

        let error = subscribe(7, &session(7), None, &pool).await.unwrap_err();
        match error {
            Error::Validation(errors) => assert_eq!(errors[0].field, "author"),
            other => panic!("expected a validation error, got {other:?}"),
        }
    }
}
