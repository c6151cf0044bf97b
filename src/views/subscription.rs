use serde::Serialize;
use sqlx::{Pool, Postgres};

use crate::{
    actions::list_author_recipes,
    error::Error,
    schema::{Recipe, User, Uuid},
    storage::MediaStorage,
};

use super::{
    profile::{render_profile, ProfileView},
    recipe::{RecipeSummary, RecipesLimit},
};

/// Profile extended with the user's (bounded) recipes and their total count.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ProfileWithRecipes {
    #[serde(flatten)]
    pub profile: ProfileView,
    pub recipes: Vec<RecipeSummary>,
    pub recipes_count: usize,
}

impl ProfileWithRecipes {
    pub fn compose(
        profile: ProfileView,
        recipes: Vec<Recipe>,
        limit: RecipesLimit,
        storage: &MediaStorage,
    ) -> Self {
        let recipes_count = recipes.len();
        let recipes = limit
            .apply(recipes)
            .iter()
            .map(|recipe| RecipeSummary::render(recipe, storage))
            .collect();

        Self {
            profile,
            recipes,
            recipes_count,
        }
    }
}

pub async fn render_profile_with_recipes(
    user: &User,
    viewer: Option<Uuid>,
    limit: RecipesLimit,
    pool: &Pool<Postgres>,
    storage: &MediaStorage,
) -> Result<ProfileWithRecipes, Error> {
    let profile = render_profile(user, viewer, pool, storage).await?;
    let recipes = list_author_recipes(user.id, pool).await?;

    Ok(ProfileWithRecipes::compose(profile, recipes, limit, storage))
}

pub async fn render_profiles_with_recipes(
    users: &[User],
    viewer: Option<Uuid>,
    limit: RecipesLimit,
    pool: &Pool<Postgres>,
    storage: &MediaStorage,
) -> Result<Vec<ProfileWithRecipes>, Error> {
    let mut views = Vec::with_capacity(users.len());
    for user in users {
        views.push(render_profile_with_recipes(user, viewer, limit, pool, storage).await?);
    }
    Ok(views)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use super::*;
    use crate::views::profile::tests::{storage, user};

    fn recipes(author_id: Uuid, count: i32) -> Vec<Recipe> {
        (1..=count)
            .map(|id| Recipe {
                id,
                author_id,
                name: format!("r{id}"),
                image: None,
                text: String::new(),
                cooking_time: 10,
                pub_date: Utc::now(),
            })
            .collect()
    }

    #[test]
    fn limit_bounds_recipes_but_not_the_count() {
        let profile = ProfileView::render(&user(1), true, &storage());
        let view = ProfileWithRecipes::compose(
            profile,
            recipes(1, 5),
            RecipesLimit::parse(Some("2")),
            &storage(),
        );

        let names: Vec<&str> = view.recipes.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["r1", "r2"]);
        assert_eq!(view.recipes_count, 5);
    }

    #[test]
    fn unparsable_limit_keeps_every_recipe() {
        let profile = ProfileView::render(&user(1), false, &storage());
        let view = ProfileWithRecipes::compose(
            profile,
            recipes(1, 5),
            RecipesLimit::parse(Some("abc")),
            &storage(),
        );

        assert_eq!(view.recipes.len(), 5);
        assert_eq!(view.recipes_count, 5);
    }

    #[test]
    fn profile_fields_are_flattened() {
        let profile = ProfileView::render(&user(3), true, &storage());
        let view = ProfileWithRecipes::compose(
            profile,
            recipes(3, 1),
            RecipesLimit::default(),
            &storage(),
        );

        assert_eq!(
            serde_json::to_value(view).unwrap(),
            json!({
                "email": "cook3@example.com",
                "id": 3,
                "username": "cook3",
                "first_name": "Anna",
                "last_name": "Cook",
                "is_subscribed": true,
                "avatar": null,
                "recipes": [{ "id": 1, "name": "r1", "image": null, "cooking_time": 10 }],
                "recipes_count": 1,
            })
        );
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn stored_recipes_are_counted_before_the_limit(pool: sqlx::PgPool) {
        use crate::actions::fixtures::{cook, plain_recipe};

        let anna = cook("anna", &pool).await;
        let boris = cook("boris", &pool).await;
        for name in ["r1", "r2", "r3", "r4", "r5"] {
            plain_recipe(boris.id, name, &pool).await;
        }
        plain_recipe(anna.id, "elsewhere", &pool).await;

        let view = render_profile_with_recipes(
            &boris,
            Some(anna.id),
            RecipesLimit::parse(Some("2")),
            &pool,
            &storage(),
        )
        .await
        .unwrap();

        let names: Vec<&str> = view.recipes.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["r1", "r2"]);
        assert_eq!(view.recipes_count, 5);
        assert!(!view.profile.is_subscribed);
    }
}
