use sqlx::{Pool, Postgres};

use crate::{
    error::{Error, QueryError},
    schema::Ingredient,
};

/// Escapes LIKE metacharacters so a search prefix matches literally.
fn escape_like(prefix: &str) -> String {
    prefix
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Ingredient catalogue, optionally narrowed by a case-insensitive name
/// prefix (the same name may exist under different measurement units).
pub async fn list_ingredients(
    search: Option<&str>,
    pool: &Pool<Postgres>,
) -> Result<Vec<Ingredient>, Error> {
    let list: Vec<Ingredient> = match search {
        Some(prefix) => {
            sqlx::query_as("SELECT * FROM ingredients WHERE name ILIKE $1 || '%' ORDER BY name")
                .bind(escape_like(prefix))
                .fetch_all(pool)
                .await
                .map_err(|e| Error::from(QueryError::from(e)))?
        }
        None => sqlx::query_as("SELECT * FROM ingredients ORDER BY name")
            .fetch_all(pool)
            .await
            .map_err(|e| Error::from(QueryError::from(e)))?,
    };

    Ok(list)
}

pub async fn get_ingredient(id: i32, pool: &Pool<Postgres>) -> Result<Option<Ingredient>, Error> {
    let row: Option<Ingredient> = sqlx::query_as("SELECT * FROM ingredients WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| Error::from(QueryError::from(e)))?;

    Ok(row)
}

pub async fn existing_ingredient_ids(
    ids: &[i32],
    pool: &Pool<Postgres>,
) -> Result<Vec<i32>, Error> {
    let rows: Vec<(i32,)> = sqlx::query_as("SELECT id FROM ingredients WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(pool)
        .await
        .map_err(|e| Error::from(QueryError::from(e)))?;

    Ok(rows.into_iter().map(|row| row.0).collect())
}
