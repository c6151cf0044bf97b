use crate::{
    error::{Error, HtmlError, QueryError},
    pagination::{PageContext, PageRequest},
    schema::{IngredientAmount, Recipe, RecipeDraft, RecipeRow, Uuid},
};

use sqlx::{Pool, Postgres, QueryBuilder, Transaction};

use super::{ensure_ingredients_exist, ensure_tags_exist};

/// Filters of the recipe list. `is_favorited` and `is_in_shopping_cart` only
/// apply when a viewer is known.
#[derive(Debug, Default, Clone)]
pub struct RecipeFilter {
    pub author: Option<Uuid>,
    pub tags: Vec<String>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

fn select_recipe_rows<'a>(viewer: Option<Uuid>) -> QueryBuilder<'a, Postgres> {
    let mut query = QueryBuilder::new(
        "SELECT r.*, EXISTS(SELECT 1 FROM favorites f WHERE f.recipe_id = r.id AND f.user_id = ",
    );
    query.push_bind(viewer);
    query.push(
        ") AS is_favorited, EXISTS(SELECT 1 FROM shopping_cart s WHERE s.recipe_id = r.id AND s.user_id = ",
    );
    query.push_bind(viewer);
    query.push(") AS is_in_shopping_cart, COUNT(*) OVER() AS count FROM recipes r WHERE TRUE");
    query
}

pub async fn fetch_recipes(
    filter: &RecipeFilter,
    viewer: Option<Uuid>,
    request: PageRequest,
    pool: &Pool<Postgres>,
) -> Result<PageContext<RecipeRow>, Error> {
    let mut query = select_recipe_rows(viewer);

    if let Some(author) = filter.author {
        query.push(" AND r.author_id = ").push_bind(author);
    }
    if !filter.tags.is_empty() {
        query
            .push(
                " AND EXISTS(SELECT 1 FROM recipe_tags rt INNER JOIN tags t ON t.id = rt.tag_id WHERE rt.recipe_id = r.id AND t.slug = ANY(",
            )
            .push_bind(filter.tags.clone())
            .push("))");
    }
    if let Some(viewer) = viewer {
        if filter.is_favorited {
            query
                .push(" AND EXISTS(SELECT 1 FROM favorites f WHERE f.recipe_id = r.id AND f.user_id = ")
                .push_bind(viewer)
                .push(")");
        }
        if filter.is_in_shopping_cart {
            query
                .push(" AND EXISTS(SELECT 1 FROM shopping_cart s WHERE s.recipe_id = r.id AND s.user_id = ")
                .push_bind(viewer)
                .push(")");
        }
    }

    query
        .push(" ORDER BY r.pub_date DESC, r.id DESC LIMIT ")
        .push_bind(request.limit)
        .push(" OFFSET ")
        .push_bind(request.offset());

    let rows: Vec<RecipeRow> = query
        .build_query_as()
        .fetch_all(pool)
        .await
        .map_err(QueryError::from)?;

    let total_count = rows.first().map(|row| row.count).unwrap_or(0);
    PageContext::from_rows(rows, total_count, request)
}

pub async fn get_recipe(
    id: Uuid,
    viewer: Option<Uuid>,
    pool: &Pool<Postgres>,
) -> Result<Option<RecipeRow>, Error> {
    let mut query = select_recipe_rows(viewer);
    query.push(" AND r.id = ").push_bind(id);

    let row: Option<RecipeRow> = query
        .build_query_as()
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(row)
}

pub async fn get_recipe_or_404(
    id: Uuid,
    viewer: Option<Uuid>,
    pool: &Pool<Postgres>,
) -> Result<RecipeRow, Error> {
    get_recipe(id, viewer, pool)
        .await?
        .ok_or_else(|| HtmlError::NotFound.new("Recipe not found."))
}

pub async fn get_plain_recipe(id: Uuid, pool: &Pool<Postgres>) -> Result<Option<Recipe>, Error> {
    let row: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(row)
}

/// Every recipe of `author_id` in insertion order.
pub async fn list_author_recipes(
    author_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Vec<Recipe>, Error> {
    let rows: Vec<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE author_id = $1 ORDER BY id")
        .bind(author_id)
        .fetch_all(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(rows)
}

async fn write_recipe_parts(
    recipe_id: Uuid,
    ingredients: &[IngredientAmount],
    tags: &[Uuid],
    tr: &mut Transaction<'_, Postgres>,
) -> Result<(), Error> {
    let mut query = QueryBuilder::<Postgres>::new(
        "INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) ",
    );
    query.push_values(ingredients, |mut row, ingredient| {
        row.push_bind(recipe_id)
            .push_bind(ingredient.id)
            .push_bind(ingredient.amount);
    });
    query
        .build()
        .execute(&mut **tr)
        .await
        .map_err(QueryError::from)?;

    let mut query = QueryBuilder::<Postgres>::new("INSERT INTO recipe_tags (recipe_id, tag_id) ");
    query.push_values(tags, |mut row, tag| {
        row.push_bind(recipe_id).push_bind(*tag);
    });
    query
        .build()
        .execute(&mut **tr)
        .await
        .map_err(QueryError::from)?;

    Ok(())
}

async fn ensure_parts_exist(draft: &RecipeDraft, pool: &Pool<Postgres>) -> Result<(), Error> {
    let ids: Vec<Uuid> = draft.ingredients.iter().map(|i| i.id).collect();
    ensure_ingredients_exist(&ids, pool).await?;
    ensure_tags_exist(&draft.tags, pool).await
}

/// Creates a recipe with its ingredients and tags in one transaction.
pub async fn create_recipe(
    author_id: Uuid,
    draft: &RecipeDraft,
    pool: &Pool<Postgres>,
) -> Result<Uuid, Error> {
    ensure_parts_exist(draft, pool).await?;

    let mut tr = pool
        .begin()
        .await
        .map_err(|_| QueryError::new("Could not start transaction".to_owned()))?;

    let id: (Uuid,) = sqlx::query_as(
        "
        INSERT INTO recipes (author_id, name, image, text, cooking_time)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
    ",
    )
    .bind(author_id)
    .bind(&draft.name)
    .bind(&draft.image)
    .bind(&draft.text)
    .bind(draft.cooking_time)
    .fetch_one(&mut *tr)
    .await
    .map_err(QueryError::from)?;

    write_recipe_parts(id.0, &draft.ingredients, &draft.tags, &mut tr).await?;

    tr.commit()
        .await
        .map_err(|_| QueryError::new("Could not commit transaction".to_owned()))?;

    log::info!("User {author_id} created recipe {}", id.0);
    Ok(id.0)
}

/// Replaces the fields, ingredients and tags of a recipe. The image is kept
/// when `draft.image` is `None`.
/// ATTENTION: DOES NOT CHECK FOR OWNERSHIP BY ITSELF
pub async fn update_recipe(id: Uuid, draft: &RecipeDraft, pool: &Pool<Postgres>) -> Result<(), Error> {
    ensure_parts_exist(draft, pool).await?;

    let mut tr = pool
        .begin()
        .await
        .map_err(|_| QueryError::new("Could not start transaction".to_owned()))?;

    sqlx::query(
        "
        UPDATE recipes
        SET name = $2, image = COALESCE($3, image), text = $4, cooking_time = $5
        WHERE id = $1
    ",
    )
    .bind(id)
    .bind(&draft.name)
    .bind(&draft.image)
    .bind(&draft.text)
    .bind(draft.cooking_time)
    .execute(&mut *tr)
    .await
    .map_err(QueryError::from)?;

    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(id)
        .execute(&mut *tr)
        .await
        .map_err(QueryError::from)?;

    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
        .bind(id)
        .execute(&mut *tr)
        .await
        .map_err(QueryError::from)?;

    write_recipe_parts(id, &draft.ingredients, &draft.tags, &mut tr).await?;

    tr.commit()
        .await
        .map_err(|_| QueryError::new("Could not commit transaction".to_owned()))?;

    Ok(())
}

/// Deletes a recipe; ingredients, tags, favorites and cart rows cascade.
/// ATTENTION: DOES NOT CHECK FOR OWNERSHIP BY ITSELF
pub async fn delete_recipe(id: Uuid, pool: &Pool<Postgres>) -> Result<(), Error> {
    let query = sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    if query.rows_affected() == 0 {
        return Err(HtmlError::NotFound.new("Recipe not found."));
    }
    Ok(())
}

/// Loads a recipe for modification by `user_id`.
pub async fn get_recipe_mut(
    id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Recipe, Error> {
    let recipe = get_plain_recipe(id, pool)
        .await?
        .ok_or_else(|| HtmlError::NotFound.new("Recipe not found."))?;

    if recipe.author_id != user_id {
        return Err(HtmlError::Forbidden.new("You do not have permission to perform this action."));
    }
    Ok(recipe)
}
