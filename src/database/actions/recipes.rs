use sqlx::{Pool, Postgres, QueryBuilder};

use crate::{
    authentication::permissions::ActionType,
    constants::RECIPE_COUNT_PER_PAGE,
    error::{Error, FieldError, QueryError},
    jwt::SessionData,
    pagination::PageContext,
    schema::{
        IngredientAmount, NewRecipe, Recipe, RecipeFilter, RecipeIngredient, RecipeRepresentation,
        RecipeRow, RecipeUpdate, RelationKind, Tag, Uuid,
    },
    validate::{validate_new_recipe, validate_recipe_update},
};

pub async fn get_recipe(id: i32, pool: &Pool<Postgres>) -> Result<Option<Recipe>, Error> {
    let row: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| Error::from(QueryError::from(e)))?;

    Ok(row)
}

/// Fetches a recipe for mutation. Authors may edit their own recipes; admins
/// may edit any. Everyone else gets a forbidden error.
pub async fn get_recipe_mut(
    id: i32,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<Recipe, Error> {
    let recipe = get_recipe(id, pool).await?;
    session.authenticate(ActionType::ManageOwnRecipes)?;

    match recipe {
        Some(recipe) => match session.authenticate(ActionType::ManageAllRecipes) {
            Ok(_) => Ok(recipe),
            Err(_) => {
                if recipe.author_id != session.user_id {
                    Err(Error::Forbidden(String::from(
                        "Only the author may modify this recipe",
                    )))
                } else {
                    Ok(recipe)
                }
            }
        },
        None => Err(Error::NotFound(String::from(
            "No recipe exists with specified id",
        ))),
    }
}

/// Rejects payloads that reference missing ingredients or tags, itemized the
/// same way as the shape validation.
async fn check_references(
    ingredients: &[IngredientAmount],
    tags: &[Uuid],
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    let mut errors = Vec::new();

    let ids: Vec<Uuid> = ingredients.iter().map(|part| part.id).collect();
    let existing = super::existing_ingredient_ids(&ids, pool).await?;
    for id in ids {
        if !existing.contains(&id) {
            errors.push(FieldError::new(
                "ingredients",
                &format!("Ingredient {id} does not exist"),
            ));
        }
    }

    let existing = super::existing_tag_ids(tags, pool).await?;
    for id in tags {
        if !existing.contains(id) {
            errors.push(FieldError::new("tags", &format!("Tag {id} does not exist")));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(Error::Validation(errors))
    }
}

/// Creates a recipe with its ingredient and tag joins in one transaction,
/// under the author identity taken from the request context. Returns the
/// re-serialized persisted representation, never the input payload.
pub async fn create_recipe(
    payload: &NewRecipe,
    session: Option<&SessionData>,
    pool: &Pool<Postgres>,
) -> Result<RecipeRepresentation, Error> {
    let session = session.ok_or(Error::Unauthenticated)?;
    session.authenticate(ActionType::CreateRecipes)?;

    validate_new_recipe(payload)?;
    check_references(&payload.ingredients, &payload.tags, pool).await?;

    let mut tr = pool
        .begin()
        .await
        .map_err(|_| Error::Query(String::from("Could not start transaction")))?;

    let recipe: (i32,) = sqlx::query_as(
        "
        INSERT INTO recipes (author_id, name, image, text, cooking_time)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
    ",
    )
    .bind(session.user_id)
    .bind(&payload.name)
    .bind(&payload.image)
    .bind(&payload.text)
    .bind(payload.cooking_time)
    .fetch_one(&mut *tr)
    .await
    .map_err(|e| Error::from(QueryError::from(e)))?;

    let recipe_id = recipe.0;

    insert_ingredients(recipe_id, &payload.ingredients, &mut tr).await?;
    insert_tags(recipe_id, &payload.tags, &mut tr).await?;

    tr.commit()
        .await
        .map_err(|_| Error::Query(String::from("Could not commit transaction")))?;

    read_full(recipe_id, Some(session), pool).await
}

/// Partial update. Absent fields stay untouched; supplied ingredient or tag
/// lists fully replace the prior joins (delete-then-insert, no diffing).
/// The publication timestamp is never touched.
pub async fn update_recipe(
    id: i32,
    payload: &RecipeUpdate,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<RecipeRepresentation, Error> {
    get_recipe_mut(id, session, pool).await?;
    validate_recipe_update(payload)?;

    let empty: Vec<IngredientAmount> = Vec::new();
    let no_tags: Vec<Uuid> = Vec::new();
    check_references(
        payload.ingredients.as_deref().unwrap_or(&empty),
        payload.tags.as_deref().unwrap_or(&no_tags),
        pool,
    )
    .await?;

    let mut tr = pool
        .begin()
        .await
        .map_err(|_| Error::Query(String::from("Could not start transaction")))?;

    sqlx::query(
        "
        UPDATE recipes SET
            name = COALESCE($1, name),
            image = COALESCE($2, image),
            text = COALESCE($3, text),
            cooking_time = COALESCE($4, cooking_time)
        WHERE id = $5
    ",
    )
    .bind(&payload.name)
    .bind(&payload.image)
    .bind(&payload.text)
    .bind(payload.cooking_time)
    .bind(id)
    .execute(&mut *tr)
    .await
    .map_err(|e| Error::from(QueryError::from(e)))?;

    if let Some(ingredients) = &payload.ingredients {
        sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
            .bind(id)
            .execute(&mut *tr)
            .await
            .map_err(|e| Error::from(QueryError::from(e)))?;
        insert_ingredients(id, ingredients, &mut tr).await?;
    }

    if let Some(tags) = &payload.tags {
        sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
            .bind(id)
            .execute(&mut *tr)
            .await
            .map_err(|e| Error::from(QueryError::from(e)))?;
        insert_tags(id, tags, &mut tr).await?;
    }

    tr.commit()
        .await
        .map_err(|_| Error::Query(String::from("Could not commit transaction")))?;

    read_full(id, Some(session), pool).await
}

async fn insert_ingredients(
    recipe_id: i32,
    ingredients: &[IngredientAmount],
    tr: &mut sqlx::Transaction<'_, Postgres>,
) -> Result<(), Error> {
    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) ");
    builder.push_values(ingredients, |mut row, part| {
        row.push_bind(recipe_id)
            .push_bind(part.id)
            .push_bind(part.amount);
    });
    builder
        .build()
        .execute(&mut **tr)
        .await
        .map_err(|e| Error::from(QueryError::from(e)))?;

    Ok(())
}

async fn insert_tags(
    recipe_id: i32,
    tags: &[Uuid],
    tr: &mut sqlx::Transaction<'_, Postgres>,
) -> Result<(), Error> {
    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO recipe_tags (recipe_id, tag_id) ");
    builder.push_values(tags, |mut row, tag_id| {
        row.push_bind(recipe_id).push_bind(*tag_id);
    });
    builder
        .build()
        .execute(&mut **tr)
        .await
        .map_err(|e| Error::from(QueryError::from(e)))?;

    Ok(())
}

/// Full persisted representation of a recipe, with the favorite and cart
/// membership flags computed for the viewer (false for anonymous viewers).
pub async fn read_full(
    recipe_id: i32,
    viewer: Option<&SessionData>,
    pool: &Pool<Postgres>,
) -> Result<RecipeRepresentation, Error> {
    let recipe = get_recipe(recipe_id, pool).await?.ok_or_else(|| {
        Error::NotFound(String::from("No recipe exists with specified id"))
    })?;

    let tags: Vec<Tag> = sqlx::query_as(
        "
        SELECT t.*
        FROM recipe_tags rt
        INNER JOIN tags t ON t.id = rt.tag_id
        WHERE rt.recipe_id = $1
        ORDER BY t.id
    ",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await
    .map_err(|e| Error::from(QueryError::from(e)))?;

    let ingredients: Vec<RecipeIngredient> = sqlx::query_as(
        "
        SELECT i.id AS id, i.name AS name, i.measurement_unit AS measurement_unit, ri.amount AS amount
        FROM recipe_ingredients ri
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE ri.recipe_id = $1
        ORDER BY i.id
    ",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await
    .map_err(|e| Error::from(QueryError::from(e)))?;

    let viewer_id = viewer.map(|session| session.user_id);
    let author = super::get_profile(recipe.author_id, viewer_id, pool).await?;

    let (is_favorited, is_in_shopping_cart) = match viewer_id {
        Some(user_id) => (
            super::has_relation(RelationKind::Favorite, user_id, recipe_id, pool).await?,
            super::has_relation(RelationKind::ShoppingCart, user_id, recipe_id, pool).await?,
        ),
        None => (false, false),
    };

    Ok(RecipeRepresentation {
        id: recipe.id,
        tags,
        author,
        ingredients,
        is_favorited,
        is_in_shopping_cart,
        name: recipe.name,
        image: recipe.image,
        text: recipe.text,
        cooking_time: recipe.cooking_time,
    })
}

/// Filtered, paginated recipe listing, newest first. An anonymous viewer
/// with either membership filter on gets an empty page, never an error.
pub async fn fetch_recipes(
    filter: &RecipeFilter,
    viewer: Option<&SessionData>,
    offset: i64,
    pool: &Pool<Postgres>,
) -> Result<PageContext<RecipeRow>, Error> {
    let viewer_id = viewer.map(|session| session.user_id);

    if (filter.is_favorited || filter.is_in_shopping_cart) && viewer_id.is_none() {
        return Ok(PageContext::no_rows());
    }

    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT r.*, COUNT(*) OVER() AS count FROM recipes r WHERE TRUE");

    if let Some(author) = filter.author {
        builder.push(" AND r.author_id = ").push_bind(author);
    }

    if !filter.tags.is_empty() {
        builder
            .push(
                " AND r.id IN (SELECT rt.recipe_id FROM recipe_tags rt \
                 INNER JOIN tags t ON t.id = rt.tag_id WHERE t.slug = ANY(",
            )
            .push_bind(&filter.tags)
            .push("))");
    }

    for (enabled, kind) in [
        (filter.is_favorited, RelationKind::Favorite),
        (filter.is_in_shopping_cart, RelationKind::ShoppingCart),
    ] {
        if enabled {
            builder
                .push(
                    " AND r.id IN (SELECT recipe_id FROM user_recipe_relations \
                     WHERE kind = ",
                )
                .push_bind(kind)
                .push(" AND user_id = ")
                .push_bind(viewer_id)
                .push(")");
        }
    }

    builder
        .push(" ORDER BY r.pub_date DESC LIMIT ")
        .push_bind(RECIPE_COUNT_PER_PAGE)
        .push(" OFFSET ")
        .push_bind(offset);

    let rows: Vec<RecipeRow> = builder
        .build_query_as()
        .fetch_all(pool)
        .await
        .map_err(|e| Error::from(QueryError::from(e)))?;

    let total_count = rows.first().map(|row| row.count).unwrap_or(0);
    Ok(PageContext::from_rows(
        rows,
        total_count,
        RECIPE_COUNT_PER_PAGE,
        offset,
    ))
}

/// Deletes a recipe and its joins. Uniqueness and cascade behavior live in
/// the application, so the joins go inside the same transaction.
pub async fn delete_recipe(
    id: i32,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    get_recipe_mut(id, session, pool).await?;

    let mut tr = pool
        .begin()
        .await
        .map_err(|_| Error::Query(String::from("Could not start transaction")))?;

    sqlx::query("DELETE FROM user_recipe_relations WHERE recipe_id = $1")
        .bind(id)
        .execute(&mut *tr)
        .await
        .map_err(|e| Error::from(QueryError::from(e)))?;

    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(id)
        .execute(&mut *tr)
        .await
        .map_err(|e| Error::from(QueryError::from(e)))?;

    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
        .bind(id)
        .execute(&mut *tr)
        .await
        .map_err(|e| Error::from(QueryError::from(e)))?;

    sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(id)
        .execute(&mut *tr)
        .await
        .map_err(|e| Error::from(QueryError::from(e)))?;

    tr.commit()
        .await
        .map_err(|_| Error::Query(String::from("Could not commit transaction")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use sqlx::postgres::PgPoolOptions;

    use super::*;

    // Anonymous viewers with a membership filter on short-circuit to an
    // empty page before any query, so a lazy pool is never connected.
    #[tokio::test]
    async fn anonymous_favorited_filter_yields_an_empty_page() {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unreachable")
            .unwrap();

        let filter = RecipeFilter {
            is_favorited: true,
            ..RecipeFilter::default()
        };
        let page = fetch_recipes(&filter, None, 0, &pool).await.unwrap();
        assert!(page.rows.is_empty());
        assert_eq!(page.total_rows, 0);
    }

    #[tokio::test]
    async fn anonymous_cart_filter_yields_an_empty_page() {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unreachable")
            .unwrap();

        let filter = RecipeFilter {
            is_in_shopping_cart: true,
            ..RecipeFilter::default()
        };
        let page = fetch_recipes(&filter, None, 0, &pool).await.unwrap();
        assert!(page.rows.is_empty());
    }
}
