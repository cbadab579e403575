use sqlx::{Pool, Postgres};

use crate::{
    error::{Error, QueryError},
    schema::Tag,
};

pub async fn list_tags(pool: &Pool<Postgres>) -> Result<Vec<Tag>, Error> {
    let list: Vec<Tag> = sqlx::query_as("SELECT * FROM tags ORDER BY name")
        .fetch_all(pool)
        .await
        .map_err(|e| Error::from(QueryError::from(e)))?;

    Ok(list)
}

pub async fn get_tag(id: i32, pool: &Pool<Postgres>) -> Result<Option<Tag>, Error> {
    let tag: Option<Tag> = sqlx::query_as("SELECT * FROM tags WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| Error::from(QueryError::from(e)))?;

    Ok(tag)
}

pub async fn find_tag(slug: &str, pool: &Pool<Postgres>) -> Result<Option<i32>, Error> {
    let row: Option<(i32,)> = sqlx::query_as("SELECT id FROM tags WHERE slug = $1")
        .bind(slug)
        .fetch_optional(pool)
        .await
        .map_err(|e| Error::from(QueryError::from(e)))?;

    Ok(row.map(|tag| tag.0))
}

/// Ids of the tags referenced by `ids` that actually exist.
pub async fn existing_tag_ids(ids: &[i32], pool: &Pool<Postgres>) -> Result<Vec<i32>, Error> {
    let rows: Vec<(i32,)> = sqlx::query_as("SELECT id FROM tags WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(pool)
        .await
        .map_err(|e| Error::from(QueryError::from(e)))?;

    Ok(rows.into_iter().map(|row| row.0).collect())
}
