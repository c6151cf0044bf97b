use serde::Serialize;
use sqlx::{Pool, Postgres};

use crate::{
    actions::{get_user_or_404, list_recipe_ingredients, list_recipe_tags},
    error::Error,
    form::QueryParams,
    schema::{Recipe, RecipeIngredientRow, RecipeRow, Tag, Uuid},
    storage::MediaStorage,
};

use super::profile::{render_profile, ProfileView};

/// Short form of a recipe used inside lists.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RecipeSummary {
    pub id: Uuid,
    pub name: String,
    pub image: Option<String>,
    pub cooking_time: i32,
}

impl RecipeSummary {
    pub fn render(recipe: &Recipe, storage: &MediaStorage) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name.to_owned(),
            image: storage.optional_url(recipe.image.as_deref()),
            cooking_time: recipe.cooking_time,
        }
    }
}

/// Bound on the number of recipes embedded in a profile, read from the
/// `recipes_limit` query parameter.
///
/// Anything that is not a non-negative integer leaves the list unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecipesLimit(Option<usize>);

impl RecipesLimit {
    pub fn parse(value: Option<&str>) -> Self {
        // An absent parameter means no bound, not an empty list.
        Self(value.and_then(|value| value.trim().parse::<usize>().ok()))
    }

    pub fn from_query(params: &QueryParams) -> Self {
        Self::parse(params.get("recipes_limit"))
    }

    pub fn apply<T>(&self, mut items: Vec<T>) -> Vec<T> {
        if let Some(limit) = self.0 {
            items.truncate(limit);
        }
        items
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct RecipeView {
    pub id: Uuid,
    pub tags: Vec<Tag>,
    pub author: ProfileView,
    pub ingredients: Vec<RecipeIngredientRow>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: Option<String>,
    pub text: String,
    pub cooking_time: i32,
}

pub async fn render_recipe(
    row: RecipeRow,
    viewer: Option<Uuid>,
    pool: &Pool<Postgres>,
    storage: &MediaStorage,
) -> Result<RecipeView, Error> {
    let author = get_user_or_404(pool, row.author_id).await?;
    let author = render_profile(&author, viewer, pool, storage).await?;
    let tags = list_recipe_tags(row.id, pool).await?;
    let ingredients = list_recipe_ingredients(row.id, pool).await?;

    Ok(RecipeView {
        id: row.id,
        tags,
        author,
        ingredients,
        is_favorited: row.is_favorited,
        is_in_shopping_cart: row.is_in_shopping_cart,
        image: storage.optional_url(row.image.as_deref()),
        name: row.name,
        text: row.text,
        cooking_time: row.cooking_time,
    })
}

pub async fn render_recipes(
    rows: Vec<RecipeRow>,
    viewer: Option<Uuid>,
    pool: &Pool<Postgres>,
    storage: &MediaStorage,
) -> Result<Vec<RecipeView>, Error> {
    let mut views = Vec::with_capacity(rows.len());
    for row in rows {
        views.push(render_recipe(row, viewer, pool, storage).await?);
    }
    Ok(views)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::views::profile::tests::storage;

    #[test]
    fn limits_parse_non_negative_integers_only() {
        assert_eq!(RecipesLimit::parse(Some("2")), RecipesLimit(Some(2)));
        assert_eq!(RecipesLimit::parse(Some("0")), RecipesLimit(Some(0)));
        assert_eq!(RecipesLimit::parse(Some("abc")), RecipesLimit(None));
        assert_eq!(RecipesLimit::parse(Some("-1")), RecipesLimit(None));
        assert_eq!(RecipesLimit::parse(None), RecipesLimit(None));
    }

    #[test]
    fn limits_keep_the_first_items() {
        let recipes = vec![1, 2, 3, 4, 5];

        assert_eq!(RecipesLimit::parse(Some("2")).apply(recipes.clone()), vec![1, 2]);
        assert_eq!(RecipesLimit::parse(Some("abc")).apply(recipes.clone()), recipes);
        assert_eq!(RecipesLimit::parse(Some("10")).apply(recipes.clone()), recipes);
    }

    #[test]
    fn limits_read_the_query_string() {
        let params = QueryParams::from(vec![("recipes_limit".to_string(), "3".to_string())]);

        assert_eq!(RecipesLimit::from_query(&params), RecipesLimit(Some(3)));
        assert_eq!(RecipesLimit::from_query(&QueryParams::default()), RecipesLimit(None));
    }

    #[test]
    fn summaries_render_the_image_url() {
        let recipe = Recipe {
            id: 9,
            author_id: 1,
            name: "Borscht".to_string(),
            image: Some("recipes/b.png".to_string()),
            text: "Beets".to_string(),
            cooking_time: 90,
            pub_date: Utc::now(),
        };

        assert_eq!(
            RecipeSummary::render(&recipe, &storage()),
            RecipeSummary {
                id: 9,
                name: "Borscht".to_string(),
                image: Some("/media/recipes/b.png".to_string()),
                cooking_time: 90,
            }
        );
    }
}
