use sqlx::{Pool, Postgres};

use crate::{
    error::{Error, QueryError},
    jwt::SessionData,
    schema::{RecipeSummary, RelationKind},
};

/// Whether the (user, recipe) pair is in the membership set of `kind`.
pub async fn has_relation(
    kind: RelationKind,
    user_id: i32,
    recipe_id: i32,
    pool: &Pool<Postgres>,
) -> Result<bool, Error> {
    let row: Option<(i32,)> = sqlx::query_as(
        "
        SELECT recipe_id FROM user_recipe_relations
        WHERE kind = $1 AND user_id = $2 AND recipe_id = $3
    ",
    )
    .bind(kind)
    .bind(user_id)
    .bind(recipe_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| Error::from(QueryError::from(e)))?;

    Ok(row.is_some())
}

/// Adds a recipe to the user's favorite or cart set. A boolean membership,
/// not a state machine: inserting an existing pair is a conflict.
pub async fn add_relation(
    kind: RelationKind,
    recipe_id: i32,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<RecipeSummary, Error> {
    let summary: Option<RecipeSummary> =
        sqlx::query_as("SELECT id, name, image, cooking_time FROM recipes WHERE id = $1")
            .bind(recipe_id)
            .fetch_optional(pool)
            .await
            .map_err(|e| Error::from(QueryError::from(e)))?;

    let summary = summary
        .ok_or_else(|| Error::NotFound(String::from("No recipe exists with specified id")))?;

    let result = sqlx::query(
        "
        INSERT INTO user_recipe_relations (kind, user_id, recipe_id)
        VALUES ($1, $2, $3)
        ON CONFLICT DO NOTHING
    ",
    )
    .bind(kind)
    .bind(session.user_id)
    .bind(recipe_id)
    .execute(pool)
    .await
    .map_err(|e| Error::from(QueryError::from(e)))?;

    if result.rows_affected() == 0 {
        return Err(Error::AlreadyExists(format!(
            "Recipe is already in {}",
            kind.label()
        )));
    }

    Ok(summary)
}

pub async fn remove_relation(
    kind: RelationKind,
    recipe_id: i32,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    let result = sqlx::query(
        "
        DELETE FROM user_recipe_relations
        WHERE kind = $1 AND user_id = $2 AND recipe_id = $3
    ",
    )
    .bind(kind)
    .bind(session.user_id)
    .bind(recipe_id)
    .execute(pool)
    .await
    .map_err(|e| Error::from(QueryError::from(e)))?;

    if result.rows_affected() == 0 {
        return Err(Error::NotInSet(format!(
            "Recipe is not in {}",
            kind.label()
        )));
    }

    Ok(())
}
