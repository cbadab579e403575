use std::collections::HashSet;

use crate::constants::{
    EMAIL_LENGTH, FIRST_NAME_LENGTH, LAST_NAME_LENGTH, MIN_COOKING_TIME, MIN_INGREDIENT_AMOUNT,
    PASSWORD_MIN_LENGTH, RECIPE_NAME_LENGTH, USERNAME_LENGTH,
};
use crate::error::{Error, FieldError};
use crate::schema::{IngredientAmount, NewRecipe, NewUser, RecipeUpdate, Uuid};

fn ingredient_errors(ingredients: &[IngredientAmount], errors: &mut Vec<FieldError>) {
    if ingredients.is_empty() {
        errors.push(FieldError::new(
            "ingredients",
            "At least one ingredient is required",
        ));
        return;
    }

    let unique: HashSet<Uuid> = ingredients.iter().map(|part| part.id).collect();
    if unique.len() != ingredients.len() {
        errors.push(FieldError::new(
            "ingredients",
            "Ingredients must be unique within a recipe",
        ));
    }

    if ingredients
        .iter()
        .any(|part| part.amount < MIN_INGREDIENT_AMOUNT)
    {
        errors.push(FieldError::new(
            "ingredients",
            "Each ingredient amount must be positive",
        ));
    }
}

fn tag_errors(tags: &[Uuid], errors: &mut Vec<FieldError>) {
    if tags.is_empty() {
        errors.push(FieldError::new("tags", "At least one tag is required"));
        return;
    }

    let unique: HashSet<Uuid> = tags.iter().copied().collect();
    if unique.len() != tags.len() {
        errors.push(FieldError::new("tags", "Tags must be unique within a recipe"));
    }
}

fn name_errors(name: &str, errors: &mut Vec<FieldError>) {
    if name.trim().is_empty() {
        errors.push(FieldError::new("name", "A name is required"));
    } else if name.len() > RECIPE_NAME_LENGTH {
        errors.push(FieldError::new("name", "Name is too long"));
    }
}

fn cooking_time_errors(cooking_time: i32, errors: &mut Vec<FieldError>) {
    if cooking_time < MIN_COOKING_TIME {
        errors.push(FieldError::new(
            "cooking_time",
            "Cooking time must be at least one minute",
        ));
    }
}

/// Validates a creation payload against the full rejection list: absent
/// image, empty or duplicated ingredient/tag lists, non-positive amounts,
/// and a cooking time below the minimum.
pub fn validate_new_recipe(payload: &NewRecipe) -> Result<(), Error> {
    let mut errors = Vec::new();

    if payload.image.trim().is_empty() {
        errors.push(FieldError::new("image", "An image is required"));
    }
    name_errors(&payload.name, &mut errors);
    ingredient_errors(&payload.ingredients, &mut errors);
    tag_errors(&payload.tags, &mut errors);
    cooking_time_errors(payload.cooking_time, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(Error::Validation(errors))
    }
}

/// Validates a partial update: only supplied fields are checked, but a
/// supplied list must satisfy the same rules as at creation.
pub fn validate_recipe_update(payload: &RecipeUpdate) -> Result<(), Error> {
    let mut errors = Vec::new();

    if let Some(image) = &payload.image {
        if image.trim().is_empty() {
            errors.push(FieldError::new("image", "An image is required"));
        }
    }
    if let Some(name) = &payload.name {
        name_errors(name, &mut errors);
    }
    if let Some(ingredients) = &payload.ingredients {
        ingredient_errors(ingredients, &mut errors);
    }
    if let Some(tags) = &payload.tags {
        tag_errors(tags, &mut errors);
    }
    if let Some(cooking_time) = payload.cooking_time {
        cooking_time_errors(cooking_time, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(Error::Validation(errors))
    }
}

pub fn validate_new_user(payload: &NewUser) -> Result<(), Error> {
    let mut errors = Vec::new();

    if payload.email.trim().is_empty() || !payload.email.contains('@') {
        errors.push(FieldError::new("email", "A valid email is required"));
    } else if payload.email.len() > EMAIL_LENGTH {
        errors.push(FieldError::new("email", "Email is too long"));
    }
    if payload.username.trim().is_empty() {
        errors.push(FieldError::new("username", "A username is required"));
    } else if payload.username.len() > USERNAME_LENGTH {
        errors.push(FieldError::new("username", "Username is too long"));
    }
    if payload.first_name.len() > FIRST_NAME_LENGTH {
        errors.push(FieldError::new("first_name", "First name is too long"));
    }
    if payload.last_name.len() > LAST_NAME_LENGTH {
        errors.push(FieldError::new("last_name", "Last name is too long"));
    }
    if payload.password.len() < PASSWORD_MIN_LENGTH {
        errors.push(FieldError::new(
            "password",
            "Password is too short",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(Error::Validation(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_payload() -> NewRecipe {
        NewRecipe {
            ingredients: vec![
                IngredientAmount { id: 1, amount: 200 },
                IngredientAmount { id: 2, amount: 2 },
            ],
            tags: vec![1, 2],
            image: String::from("recipes/images/1.png"),
            name: String::from("Pancakes"),
            text: String::from("Mix and fry."),
            cooking_time: 20,
        }
    }

    fn fields(error: Error) -> Vec<String> {
        match error {
            Error::Validation(errors) => errors.into_iter().map(|e| e.field).collect(),
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn accepts_a_valid_payload() {
        assert!(validate_new_recipe(&valid_payload()).is_ok());
    }

    #[test]
    fn rejects_a_missing_image() {
        let mut payload = valid_payload();
        payload.image = String::from("  ");
        assert_eq!(fields(validate_new_recipe(&payload).unwrap_err()), ["image"]);
    }

    #[test]
    fn rejects_empty_ingredient_and_tag_lists() {
        let mut payload = valid_payload();
        payload.ingredients.clear();
        payload.tags.clear();
        assert_eq!(
            fields(validate_new_recipe(&payload).unwrap_err()),
            ["ingredients", "tags"]
        );
    }

    #[test]
    fn rejects_duplicate_ingredient_references_regardless_of_amounts() {
        let mut payload = valid_payload();
        payload.ingredients = vec![
            IngredientAmount { id: 5, amount: 100 },
            IngredientAmount { id: 5, amount: 250 },
        ];
        assert_eq!(
            fields(validate_new_recipe(&payload).unwrap_err()),
            ["ingredients"]
        );
    }

    #[test]
    fn rejects_duplicate_tags() {
        let mut payload = valid_payload();
        payload.tags = vec![3, 3];
        assert_eq!(fields(validate_new_recipe(&payload).unwrap_err()), ["tags"]);
    }

    #[test]
    fn rejects_non_positive_amounts() {
        let mut payload = valid_payload();
        payload.ingredients[0].amount = 0;
        assert_eq!(
            fields(validate_new_recipe(&payload).unwrap_err()),
            ["ingredients"]
        );
    }

    #[test]
    fn rejects_cooking_time_below_minimum() {
        let mut payload = valid_payload();
        payload.cooking_time = 0;
        assert_eq!(
            fields(validate_new_recipe(&payload).unwrap_err()),
            ["cooking_time"]
        );
    }

    #[test]
    fn update_with_no_fields_passes() {
        assert!(validate_recipe_update(&RecipeUpdate::default()).is_ok());
    }

    #[test]
    fn update_with_supplied_empty_list_fails() {
        let update = RecipeUpdate {
            ingredients: Some(vec![]),
            ..RecipeUpdate::default()
        };
        assert_eq!(
            fields(validate_recipe_update(&update).unwrap_err()),
            ["ingredients"]
        );
    }

    #[test]
    fn update_checks_only_supplied_fields() {
        let update = RecipeUpdate {
            cooking_time: Some(0),
            ..RecipeUpdate::default()
        };
        assert_eq!(
            fields(validate_recipe_update(&update).unwrap_err()),
            ["cooking_time"]
        );
    }

    #[test]
    fn rejects_short_passwords_at_registration() {
        let user = NewUser {
            email: String::from("cook@example.com"),
            username: String::from("cook"),
            first_name: String::from("Anna"),
            last_name: String::from("Smith"),
            password: String::from("short"),
        };
        assert_eq!(fields(validate_new_user(&user).unwrap_err()), ["password"]);
    }

    #[test]
    fn rejects_overlong_names_at_registration() {
        let user = NewUser {
            email: String::from("cook@example.com"),
            username: String::from("cook"),
            first_name: "a".repeat(FIRST_NAME_LENGTH + 1),
            last_name: "b".repeat(LAST_NAME_LENGTH + 1),
            password: String::from("long enough"),
        };
        assert_eq!(
            fields(validate_new_user(&user).unwrap_err()),
            ["first_name", "last_name"]
        );
    }
}
