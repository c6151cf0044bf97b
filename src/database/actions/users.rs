use crate::{
    authentication::{
        cryptography::{hash_password, verify_password},
        jwt::generate_jwt_session,
    },
    error::{Error, HtmlError, QueryError},
    pagination::{PageContext, PageRequest},
    schema::{NewUser, User, UserRow, Uuid},
};

use sqlx::{Pool, Postgres};

pub async fn get_user_by_email(
    pool: &Pool<Postgres>,
    email: &str,
) -> Result<Option<User>, Error> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE lower(email) = lower($1)")
        .bind(email)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(row)
}

pub async fn get_user_by_id(pool: &Pool<Postgres>, user_id: Uuid) -> Result<Option<User>, Error> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(row)
}

pub async fn get_user_or_404(pool: &Pool<Postgres>, user_id: Uuid) -> Result<User, Error> {
    get_user_by_id(pool, user_id)
        .await?
        .ok_or_else(|| HtmlError::NotFound.new("User not found."))
}

pub async fn fetch_users(
    request: PageRequest,
    pool: &Pool<Postgres>,
) -> Result<PageContext<User>, Error> {
    let rows: Vec<UserRow> =
        sqlx::query_as("SELECT u.*, COUNT(*) OVER() AS count FROM users u ORDER BY u.id LIMIT $1 OFFSET $2")
            .bind(request.limit)
            .bind(request.offset())
            .fetch_all(pool)
            .await
            .map_err(QueryError::from)?;

    let total_count = rows.first().map(|row| row.count).unwrap_or(0);
    let rows: Vec<User> = rows.into_iter().map(User::from).collect();

    PageContext::from_rows(rows, total_count, request)
}

/// Creates a user. `new_user.password` must already be hashed.
pub async fn register_user(new_user: &NewUser, pool: &Pool<Postgres>) -> Result<User, Error> {
    let taken: (bool, bool) = sqlx::query_as(
        "
        SELECT
            COALESCE(bool_or(lower(email) = lower($1)), FALSE),
            COALESCE(bool_or(username = $2), FALSE)
        FROM users
        WHERE lower(email) = lower($1) OR username = $2
    ",
    )
    .bind(&new_user.email)
    .bind(&new_user.username)
    .fetch_one(pool)
    .await
    .map_err(QueryError::from)?;

    match taken {
        (true, _) => {
            return Err(HtmlError::InvalidRequest
                .field("email", "A user with that email already exists."))
        }
        (_, true) => {
            return Err(HtmlError::InvalidRequest
                .field("username", "A user with that username already exists."))
        }
        _ => {}
    }

    let user: User = sqlx::query_as(
        "
        INSERT INTO users (email, username, first_name, last_name, password)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
    ",
    )
    .bind(&new_user.email)
    .bind(&new_user.username)
    .bind(&new_user.first_name)
    .bind(&new_user.last_name)
    .bind(&new_user.password)
    .fetch_one(pool)
    .await
    .map_err(QueryError::from)?;

    log::info!("Registered user {} ({})", user.id, user.username);
    Ok(user)
}

pub async fn login_user(
    email: &str,
    password: &str,
    secret: &str,
    lifetime_hours: i64,
    pool: &Pool<Postgres>,
) -> Result<String, Error> {
    let invalid = || {
        HtmlError::InvalidRequest
            .field("non_field_errors", "Unable to log in with provided credentials.")
    };

    let user = get_user_by_email(pool, email).await?.ok_or_else(invalid)?;
    if !verify_password(password, &user.password)? {
        return Err(invalid());
    }

    generate_jwt_session(&user, secret, lifetime_hours)
}

pub async fn set_password(
    user_id: Uuid,
    current_password: &str,
    new_password: &str,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    let user = get_user_or_404(pool, user_id).await?;
    if !verify_password(current_password, &user.password)? {
        return Err(HtmlError::InvalidRequest.field("current_password", "Invalid password."));
    }

    let hash = hash_password(new_password)?;
    sqlx::query("UPDATE users SET password = $2 WHERE id = $1")
        .bind(user_id)
        .bind(hash)
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(())
}

/// Replaces the stored avatar path; `None` clears it.
pub async fn update_avatar(
    user_id: Uuid,
    avatar: Option<&str>,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    let query = sqlx::query("UPDATE users SET avatar = $2 WHERE id = $1")
        .bind(user_id)
        .bind(avatar)
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    if query.rows_affected() == 0 {
        return Err(HtmlError::NotFound.new("User not found."));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use sqlx::PgPool;

    use crate::actions::fixtures::cook;

    use super::*;

    #[sqlx::test(migrations = "./migrations")]
    async fn pages_past_the_end_are_not_found(pool: PgPool) {
        for name in ["anna", "boris", "clara", "dmitri", "elena"] {
            cook(name, &pool).await;
        }

        let last = fetch_users(PageRequest { page: 3, limit: 2 }, &pool)
            .await
            .unwrap();
        assert_eq!(last.count, 5);
        assert_eq!(last.next, None);
        assert_eq!(last.previous, Some(2));
        assert_eq!(last.results[0].username, "elena");

        for page in [4, i64::MAX] {
            let error = fetch_users(PageRequest { page, limit: 2 }, &pool)
                .await
                .unwrap_err();
            assert_eq!(error.code, 404);
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn emails_are_unique_regardless_of_case(pool: PgPool) {
        cook("anna", &pool).await;

        let error = register_user(
            &NewUser {
                email: "ANNA@example.com".to_string(),
                username: "anna2".to_string(),
                first_name: "Anna".to_string(),
                last_name: "Other".to_string(),
                password: "hash".to_string(),
            },
            &pool,
        )
        .await
        .unwrap_err();
        assert_eq!(error.field.as_deref(), Some("email"));
    }
}
