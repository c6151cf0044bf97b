use crate::{
    error::{Error, HtmlError, QueryError},
    pagination::{PageContext, PageRequest},
    schema::{Subscription, User, UserRow, Uuid},
    validation::{already_subscribed_error, validate_subscription},
};

use sqlx::{Pool, Postgres};

use super::get_user_or_404;

pub async fn subscription_exists(
    follower: Uuid,
    following: Uuid,
    pool: &Pool<Postgres>,
) -> Result<bool, Error> {
    let exists: (bool,) = sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM subscriptions WHERE user_id = $1 AND following_id = $2)",
    )
    .bind(follower)
    .bind(following)
    .fetch_one(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(exists.0)
}

/// Makes `follower` follow `following` and returns the followed user.
pub async fn subscribe(
    follower: Uuid,
    following: Uuid,
    pool: &Pool<Postgres>,
) -> Result<User, Error> {
    validate_subscription(follower, following, false)?;

    let target = get_user_or_404(pool, following).await?;
    let exists = subscription_exists(follower, following, pool).await?;
    validate_subscription(follower, following, exists)?;

    let subscription = insert_subscription(follower, following, pool).await?;
    log::debug!(
        "User {} now follows {} ({})",
        subscription.user_id,
        subscription.following_id,
        subscription.id
    );
    Ok(target)
}

/// Inserts the edge. An existing identical edge, for instance one written by
/// a concurrent request after the existence check, is a validation error.
async fn insert_subscription(
    follower: Uuid,
    following: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Subscription, Error> {
    let created: Option<Subscription> = sqlx::query_as(
        "
        INSERT INTO subscriptions (user_id, following_id)
        VALUES ($1, $2)
        ON CONFLICT DO NOTHING RETURNING *
    ",
    )
    .bind(follower)
    .bind(following)
    .fetch_optional(pool)
    .await
    .map_err(QueryError::from)?;

    created.ok_or_else(already_subscribed_error)
}

pub async fn unsubscribe(
    follower: Uuid,
    following: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    get_user_or_404(pool, following).await?;

    let query = sqlx::query("DELETE FROM subscriptions WHERE user_id = $1 AND following_id = $2")
        .bind(follower)
        .bind(following)
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    if query.rows_affected() == 0 {
        return Err(HtmlError::NotFound.new("You are not subscribed to this user."));
    }
    Ok(())
}

/// Users followed by `follower`, oldest subscription first.
pub async fn fetch_subscriptions(
    follower: Uuid,
    request: PageRequest,
    pool: &Pool<Postgres>,
) -> Result<PageContext<User>, Error> {
    let rows: Vec<UserRow> = sqlx::query_as(
        "
        SELECT u.*, COUNT(*) OVER() AS count
        FROM subscriptions s
        INNER JOIN users u ON u.id = s.following_id
        WHERE s.user_id = $1
        ORDER BY s.id
        LIMIT $2 OFFSET $3
    ",
    )
    .bind(follower)
    .bind(request.limit)
    .bind(request.offset())
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    let total_count = rows.first().map(|row| row.count).unwrap_or(0);
    let rows: Vec<User> = rows.into_iter().map(User::from).collect();

    PageContext::from_rows(rows, total_count, request)
}
