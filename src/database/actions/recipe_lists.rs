use crate::{
    error::{Error, HtmlError, QueryError},
    schema::{CartLine, Recipe, RecipeListEntry, Uuid},
};

use sqlx::{Pool, Postgres};

use super::get_plain_recipe;

/// Per-user recipe collections stored as (user, recipe) edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeList {
    Favorites,
    ShoppingCart,
}

impl RecipeList {
    fn table(&self) -> &'static str {
        match self {
            RecipeList::Favorites => "favorites",
            RecipeList::ShoppingCart => "shopping_cart",
        }
    }

    fn already_added(&self) -> &'static str {
        match self {
            RecipeList::Favorites => "The recipe is already in favorites.",
            RecipeList::ShoppingCart => "The recipe is already in the shopping cart.",
        }
    }

    fn not_added(&self) -> &'static str {
        match self {
            RecipeList::Favorites => "The recipe is not in favorites.",
            RecipeList::ShoppingCart => "The recipe is not in the shopping cart.",
        }
    }
}

/// Adds a recipe to one of the user's lists and returns the recipe.
pub async fn add_to_list(
    list: RecipeList,
    user_id: Uuid,
    recipe_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Recipe, Error> {
    let recipe = get_plain_recipe(recipe_id, pool)
        .await?
        .ok_or_else(|| HtmlError::NotFound.new("Recipe not found."))?;

    let statement = format!(
        "INSERT INTO {} (user_id, recipe_id) VALUES ($1, $2) ON CONFLICT DO NOTHING RETURNING *",
        list.table()
    );
    let created: Option<RecipeListEntry> = sqlx::query_as(&statement)
        .bind(user_id)
        .bind(recipe_id)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    match created {
        Some(entry) => {
            log::debug!("Added recipe {} to {} of user {}", entry.recipe_id, list.table(), entry.user_id);
            Ok(recipe)
        }
        None => Err(HtmlError::InvalidRequest.new(list.already_added())),
    }
}

pub async fn remove_from_list(
    list: RecipeList,
    user_id: Uuid,
    recipe_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    if get_plain_recipe(recipe_id, pool).await?.is_none() {
        return Err(HtmlError::NotFound.new("Recipe not found."));
    }

    let statement = format!(
        "DELETE FROM {} WHERE user_id = $1 AND recipe_id = $2",
        list.table()
    );
    let query = sqlx::query(&statement)
        .bind(user_id)
        .bind(recipe_id)
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    if query.rows_affected() == 0 {
        return Err(HtmlError::NotFound.new(list.not_added()));
    }
    Ok(())
}

/// Every ingredient line of every recipe in the user's shopping cart.
pub async fn list_cart_lines(user_id: Uuid, pool: &Pool<Postgres>) -> Result<Vec<CartLine>, Error> {
    let rows: Vec<CartLine> = sqlx::query_as(
        "
        SELECT i.name AS name, i.measurement_unit AS measurement_unit, ri.amount AS amount
        FROM shopping_cart sc
        INNER JOIN recipe_ingredients ri ON ri.recipe_id = sc.recipe_id
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE sc.user_id = $1
    ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(rows)
}
