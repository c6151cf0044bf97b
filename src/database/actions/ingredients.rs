use crate::{
    error::{Error, HtmlError, QueryError},
    schema::{Ingredient, MeasurementUnit, NewIngredient, RecipeIngredientRow, Uuid},
};

use sqlx::{Pool, Postgres, QueryBuilder};

/// Ingredients ordered by name, optionally narrowed to a case-insensitive
/// name prefix.
pub async fn list_ingredients(
    name: Option<&str>,
    pool: &Pool<Postgres>,
) -> Result<Vec<Ingredient>, Error> {
    let rows: Vec<Ingredient> = match name.map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) => {
            let pattern = format!("{}%", escape_like(name));
            sqlx::query_as("SELECT * FROM ingredients WHERE lower(name) LIKE lower($1) ORDER BY name, id")
                .bind(pattern)
                .fetch_all(pool)
                .await
                .map_err(QueryError::from)?
        }
        None => sqlx::query_as("SELECT * FROM ingredients ORDER BY name, id")
            .fetch_all(pool)
            .await
            .map_err(QueryError::from)?,
    };

    Ok(rows)
}

pub async fn get_ingredient(id: Uuid, pool: &Pool<Postgres>) -> Result<Option<Ingredient>, Error> {
    let row: Option<Ingredient> = sqlx::query_as("SELECT * FROM ingredients WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(row)
}

/// Fails with an `ingredients` field error when any id has no ingredient.
pub async fn ensure_ingredients_exist(ids: &[Uuid], pool: &Pool<Postgres>) -> Result<(), Error> {
    let found: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM ingredients WHERE id = ANY($1)")
        .bind(ids)
        .fetch_one(pool)
        .await
        .map_err(QueryError::from)?;

    if found.0 != ids.len() as i64 {
        return Err(HtmlError::InvalidRequest.field("ingredients", "Ingredient doesn't exist."));
    }
    Ok(())
}

pub async fn list_recipe_ingredients(
    recipe_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipeIngredientRow>, Error> {
    let rows: Vec<RecipeIngredientRow> = sqlx::query_as(
        "
        SELECT i.id AS id, i.name AS name, i.measurement_unit AS measurement_unit, ri.amount AS amount
        FROM recipe_ingredients ri
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE ri.recipe_id = $1
        ORDER BY ri.id
    ",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(rows)
}

/// Bulk insert used by the fixture loader. Already known (name, unit) pairs
/// are skipped; returns the number of inserted rows.
pub async fn create_ingredients(
    ingredients: &[NewIngredient],
    pool: &Pool<Postgres>,
) -> Result<u64, Error> {
    if ingredients.is_empty() {
        return Ok(0);
    }

    let parsed = ingredients
        .iter()
        .map(|ingredient| {
            ingredient
                .measurement_unit
                .parse::<MeasurementUnit>()
                .map(|unit| (ingredient.name.trim(), unit))
                .map_err(Error::from)
        })
        .collect::<Result<Vec<(&str, MeasurementUnit)>, Error>>()?;

    let mut inserted = 0;
    // Postgres caps bind parameters at 65535 per statement.
    for chunk in parsed.chunks(1000) {
        let mut query = QueryBuilder::<Postgres>::new("INSERT INTO ingredients (name, measurement_unit) ");
        query.push_values(chunk, |mut row, (name, unit)| {
            row.push_bind(*name).push_bind(*unit);
        });
        query.push(" ON CONFLICT DO NOTHING");

        let result = query
            .build()
            .execute(pool)
            .await
            .map_err(QueryError::from)?;
        inserted += result.rows_affected();
    }

    Ok(inserted)
}

fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
