use std::collections::HashMap;

use sqlx::{Pool, Postgres};
use warp::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use warp::reply::Response;

use crate::{
    constants::{SHOPPING_LIST_FILENAME, SHOPPING_LIST_HEADER},
    error::{Error, QueryError},
    schema::{CartIngredientRow, RelationKind},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoppingListItem {
    pub name: String,
    pub measurement_unit: String,
    pub total_amount: i64,
}

/// Merges duplicate (name, unit) pairs by summing amounts and orders the
/// groups alphabetically by ingredient name.
pub fn aggregate(rows: Vec<CartIngredientRow>) -> Vec<ShoppingListItem> {
    let mut groups: HashMap<(String, String), i64> = HashMap::new();
    for row in rows {
        *groups
            .entry((row.name, row.measurement_unit))
            .or_insert(0) += i64::from(row.amount);
    }

    let mut items: Vec<ShoppingListItem> = groups
        .into_iter()
        .map(|((name, measurement_unit), total_amount)| ShoppingListItem {
            name,
            measurement_unit,
            total_amount,
        })
        .collect();
    items.sort_by(|a, b| a.name.cmp(&b.name).then(a.measurement_unit.cmp(&b.measurement_unit)));
    items
}

/// Flat text document: fixed header, blank separator, one line per group.
/// An empty cart yields the header with no ingredient lines.
pub fn render(items: &[ShoppingListItem]) -> String {
    let lines = items
        .iter()
        .map(|item| {
            format!(
                "{} - {} {}",
                item.name, item.total_amount, item.measurement_unit
            )
        })
        .collect::<Vec<String>>()
        .join("\n");

    format!("{SHOPPING_LIST_HEADER}\n\n{lines}")
}

/// Aggregated shopping list over every recipe in the user's cart.
pub async fn build_shopping_list(user_id: i32, pool: &Pool<Postgres>) -> Result<String, Error> {
    let rows: Vec<CartIngredientRow> = sqlx::query_as(
        "
        SELECT i.name AS name, i.measurement_unit AS measurement_unit, ri.amount AS amount
        FROM user_recipe_relations c
        INNER JOIN recipe_ingredients ri ON ri.recipe_id = c.recipe_id
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE c.user_id = $1 AND c.kind = $2
    ",
    )
    .bind(user_id)
    .bind(RelationKind::ShoppingCart)
    .fetch_all(pool)
    .await
    .map_err(|e| Error::from(QueryError::from(e)))?;

    Ok(render(&aggregate(rows)))
}

/// Wraps the rendered document as a plain-text file attachment.
pub fn as_attachment(document: String) -> Response {
    let mut response = Response::new(document.into());
    response
        .headers_mut()
        .insert(CONTENT_TYPE, "text/plain; charset=utf-8".parse().unwrap());
    response.headers_mut().insert(
        CONTENT_DISPOSITION,
        format!("attachment; filename=\"{SHOPPING_LIST_FILENAME}\"")
            .parse()
            .unwrap(),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, unit: &str, amount: i32) -> CartIngredientRow {
        CartIngredientRow {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
            amount,
        }
    }

    #[test]
    fn duplicate_ingredient_unit_pairs_are_summed() {
        let items = aggregate(vec![
            row("flour", "g", 200),
            row("flour", "g", 300),
            row("eggs", "pcs", 2),
        ]);

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "eggs");
        assert_eq!(items[0].total_amount, 2);
        assert_eq!(items[1].name, "flour");
        assert_eq!(items[1].total_amount, 500);
    }

    #[test]
    fn aggregation_is_commutative() {
        let forward = aggregate(vec![row("flour", "g", 200), row("sugar", "g", 50)]);
        let reversed = aggregate(vec![row("sugar", "g", 50), row("flour", "g", 200)]);
        assert_eq!(forward, reversed);
    }

    #[test]
    fn same_name_under_different_units_stays_separate() {
        let items = aggregate(vec![row("milk", "ml", 500), row("milk", "g", 30)]);
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn document_has_header_separator_and_lines() {
        let items = aggregate(vec![row("flour", "g", 200), row("eggs", "pcs", 2)]);
        let document = render(&items);

        assert_eq!(
            document,
            "Shopping list:\n\neggs - 2 pcs\nflour - 200 g"
        );
    }

    #[test]
    fn empty_cart_yields_header_only() {
        assert_eq!(render(&[]), "Shopping list:\n\n");
    }

    #[test]
    fn attachment_reply_carries_the_file_headers() {
        let response = as_attachment(render(&[]));
        assert_eq!(
            response.headers()[CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
        assert_eq!(
            response.headers()[CONTENT_DISPOSITION],
            "attachment; filename=\"shopping_list.txt\""
        );
    }
}
