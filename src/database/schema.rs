use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type Uuid = i32;

#[derive(
    Clone, Debug, PartialEq, PartialOrd, sqlx::Type, Serialize, Eq, Ord, Hash, Deserialize,
)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    User,
    Admin,
}

/// Membership kind for the shared (user, recipe) relation table. Favorites
/// and the shopping cart have identical shape and differ only by this tag.
#[derive(
    Clone, Copy, Debug, PartialEq, PartialOrd, sqlx::Type, Serialize, Eq, Ord, Hash, Deserialize,
)]
#[sqlx(type_name = "relation_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    Favorite,
    ShoppingCart,
}

impl RelationKind {
    pub fn label(&self) -> &'static str {
        match self {
            RelationKind::Favorite => "favorites",
            RelationKind::ShoppingCart => "shopping cart",
        }
    }
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub role: UserRole,
    pub avatar: Option<String>,
}

/// Read-side user representation; `is_subscribed` is computed for the viewer.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub email: String,
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
    pub avatar: Option<String>,
}

impl UserProfile {
    pub fn from_user(user: User, is_subscribed: bool) -> Self {
        Self {
            email: user.email,
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            is_subscribed,
            avatar: user.avatar,
        }
    }
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Ingredient {
    pub id: Uuid,
    pub name: String,
    pub measurement_unit: String,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Recipe {
    pub id: Uuid,
    pub author_id: Uuid,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
    pub pub_date: DateTime<Utc>,
}

/// Listing row; `count` carries the window total for pagination.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct RecipeRow {
    pub id: Uuid,
    pub author_id: Uuid,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
    pub pub_date: DateTime<Utc>,

    pub count: i64,
}

/// Joined recipe/ingredient row as it appears in representations.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct RecipeIngredient {
    pub id: Uuid,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct RecipeSummary {
    pub id: Uuid,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

/// Full recipe representation. Both the read endpoints and the write workflow
/// re-serialize the persisted state through this type, so create/update
/// responses always match a subsequent read.
#[derive(Debug, Clone, Serialize)]
pub struct RecipeRepresentation {
    pub id: Uuid,
    pub tags: Vec<Tag>,
    pub author: UserProfile,
    pub ingredients: Vec<RecipeIngredient>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionProfile {
    #[serde(flatten)]
    pub author: UserProfile,
    pub recipes: Vec<RecipeSummary>,
    pub recipes_count: i64,
}

/// Joined cart row fed to the shopping-list aggregator.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct CartIngredientRow {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

// Write payloads

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct IngredientAmount {
    pub id: Uuid,
    pub amount: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewRecipe {
    pub ingredients: Vec<IngredientAmount>,
    pub tags: Vec<Uuid>,
    pub image: String,
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
}

/// Partial update payload. Absent fields stay untouched; a supplied
/// ingredient or tag list fully replaces the prior set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeUpdate {
    #[serde(default)]
    pub ingredients: Option<Vec<IngredientAmount>>,
    #[serde(default)]
    pub tags: Option<Vec<Uuid>>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub cooking_time: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

/// Query filters accepted by the recipe listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeFilter {
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub author: Option<Uuid>,
    #[serde(default)]
    pub is_favorited: bool,
    #[serde(default)]
    pub is_in_shopping_cart: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recipe_update_fields_default_to_absent() {
        let update: RecipeUpdate = serde_json::from_str(r#"{"name": "Borscht"}"#).unwrap();

        assert_eq!(update.name.as_deref(), Some("Borscht"));
        assert!(update.ingredients.is_none());
        assert!(update.tags.is_none());
        assert!(update.image.is_none());
        assert!(update.text.is_none());
        assert!(update.cooking_time.is_none());
    }

    #[test]
    fn recipe_update_distinguishes_supplied_empty_list_from_absent() {
        let update: RecipeUpdate = serde_json::from_str(r#"{"ingredients": []}"#).unwrap();

        assert_eq!(update.ingredients.as_deref(), Some(&[][..]));
        assert!(update.tags.is_none());
    }

    #[test]
    fn new_recipe_payload_parses() {
        let payload: NewRecipe = serde_json::from_str(
            r#"{
                "ingredients": [{"id": 5, "amount": 200}],
                "tags": [1, 2],
                "image": "recipes/images/1.png",
                "name": "Pancakes",
                "text": "Mix and fry.",
                "cooking_time": 20
            }"#,
        )
        .unwrap();

        assert_eq!(payload.ingredients.len(), 1);
        assert_eq!(payload.ingredients[0].id, 5);
        assert_eq!(payload.tags, vec![1, 2]);
        assert_eq!(payload.cooking_time, 20);
    }

    #[test]
    fn relation_kind_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&RelationKind::ShoppingCart).unwrap(),
            "\"shopping_cart\""
        );
        assert_eq!(RelationKind::Favorite.label(), "favorites");
    }
}
