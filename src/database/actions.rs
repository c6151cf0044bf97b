mod ingredients;
mod recipe_lists;
mod recipes;
mod subscriptions;
mod tags;
mod users;

pub use ingredients::*;
pub use recipe_lists::*;
pub use recipes::*;
pub use subscriptions::*;
pub use tags::*;
pub use users::*;

#[cfg(test)]
pub(crate) mod fixtures {
    use sqlx::{Pool, Postgres};

    use crate::schema::{NewUser, User, Uuid};

    use super::register_user;

    pub async fn cook(username: &str, pool: &Pool<Postgres>) -> User {
        let new_user = NewUser {
            email: format!("{username}@example.com"),
            username: username.to_string(),
            first_name: "Anna".to_string(),
            last_name: "Cook".to_string(),
            password: "hash".to_string(),
        };
        register_user(&new_user, pool).await.unwrap()
    }

    pub async fn plain_recipe(author_id: Uuid, name: &str, pool: &Pool<Postgres>) -> Uuid {
        let (id,): (Uuid,) = sqlx::query_as(
            "INSERT INTO recipes (author_id, name, text, cooking_time) VALUES ($1, $2, 'Stir.', 10) RETURNING id",
        )
        .bind(author_id)
        .bind(name)
        .fetch_one(pool)
        .await
        .unwrap();
        id
    }
}
