use crate::{
    error::{Error, HtmlError, QueryError},
    schema::{Tag, Uuid},
};

use sqlx::{Pool, Postgres};

pub async fn get_tag(id: Uuid, pool: &Pool<Postgres>) -> Result<Option<Tag>, Error> {
    let tag: Option<Tag> = sqlx::query_as("SELECT * FROM tags WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(tag)
}

pub async fn list_tags(pool: &Pool<Postgres>) -> Result<Vec<Tag>, Error> {
    let list: Vec<Tag> = sqlx::query_as("SELECT * FROM tags ORDER BY id")
        .fetch_all(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(list)
}

pub async fn list_recipe_tags(recipe_id: Uuid, pool: &Pool<Postgres>) -> Result<Vec<Tag>, Error> {
    let list: Vec<Tag> = sqlx::query_as(
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
    .map_err(QueryError::from)?;

    Ok(list)
}

/// Fails with a `tags` field error when any id has no tag.
pub async fn ensure_tags_exist(ids: &[Uuid], pool: &Pool<Postgres>) -> Result<(), Error> {
    let found: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tags WHERE id = ANY($1)")
        .bind(ids)
        .fetch_one(pool)
        .await
        .map_err(QueryError::from)?;

    if found.0 != ids.len() as i64 {
        return Err(HtmlError::InvalidRequest.field("tags", "Tag doesn't exist."));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use sqlx::PgPool;

    use super::*;

    async fn insert_tag(name: &str, slug: &str, pool: &PgPool) -> Result<Uuid, Error> {
        let (id,): (Uuid,) =
            sqlx::query_as("INSERT INTO tags (name, slug) VALUES ($1, $2) RETURNING id")
                .bind(name)
                .bind(slug)
                .fetch_one(pool)
                .await
                .map_err(QueryError::from)?;
        Ok(id)
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn tags_accept_long_slugs_and_short_names(pool: PgPool) {
        let slug = "s".repeat(50);
        let id = insert_tag(&"n".repeat(25), &slug, &pool).await.unwrap();

        let tag = get_tag(id, &pool).await.unwrap().unwrap();
        assert_eq!(tag.slug, slug);

        assert!(insert_tag(&"n".repeat(26), "breakfast", &pool).await.is_err());
        assert!(insert_tag("Breakfast", &"s".repeat(51), &pool).await.is_err());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn slugs_are_unique_but_names_are_not(pool: PgPool) {
        insert_tag("Lunch", "lunch", &pool).await.unwrap();
        insert_tag("Lunch", "lunch-2", &pool).await.unwrap();

        let error = insert_tag("Dinner", "lunch", &pool).await.unwrap_err();
        assert_eq!(error.code, 400);
        assert_eq!(list_tags(&pool).await.unwrap().len(), 2);
    }
}
