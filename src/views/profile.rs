use serde::Serialize;
use sqlx::{Pool, Postgres};

use crate::{
    actions::subscription_exists,
    error::Error,
    schema::{User, Uuid},
    storage::MediaStorage,
};

/// Public view of a user.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ProfileView {
    pub email: String,
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
    pub avatar: Option<String>,
}

/// Response of a successful registration.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RegisteredUserView {
    pub email: String,
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct AvatarView {
    pub avatar: Option<String>,
}

/// `viewer` is subscribed to `subject` only when it is a different, known
/// user holding a follow edge to it.
pub fn is_subscribed(viewer: Option<Uuid>, subject: Uuid, edge_exists: bool) -> bool {
    match viewer {
        Some(viewer) => edge_exists && viewer != subject,
        None => false,
    }
}

impl ProfileView {
    pub fn render(user: &User, is_subscribed: bool, storage: &MediaStorage) -> Self {
        Self {
            email: user.email.to_owned(),
            id: user.id,
            username: user.username.to_owned(),
            first_name: user.first_name.to_owned(),
            last_name: user.last_name.to_owned(),
            is_subscribed,
            avatar: storage.optional_url(user.avatar.as_deref()),
        }
    }
}

impl From<&User> for RegisteredUserView {
    fn from(user: &User) -> Self {
        Self {
            email: user.email.to_owned(),
            id: user.id,
            username: user.username.to_owned(),
            first_name: user.first_name.to_owned(),
            last_name: user.last_name.to_owned(),
        }
    }
}

/// Renders `user` as seen by `viewer`, looking up the follow edge when it
/// can matter.
pub async fn render_profile(
    user: &User,
    viewer: Option<Uuid>,
    pool: &Pool<Postgres>,
    storage: &MediaStorage,
) -> Result<ProfileView, Error> {
    let edge_exists = match viewer {
        Some(viewer) if viewer != user.id => subscription_exists(viewer, user.id, pool).await?,
        _ => false,
    };

    Ok(ProfileView::render(
        user,
        is_subscribed(viewer, user.id, edge_exists),
        storage,
    ))
}

pub async fn render_profiles(
    users: &[User],
    viewer: Option<Uuid>,
    pool: &Pool<Postgres>,
    storage: &MediaStorage,
) -> Result<Vec<ProfileView>, Error> {
    let mut views = Vec::with_capacity(users.len());
    for user in users {
        views.push(render_profile(user, viewer, pool, storage).await?);
    }
    Ok(views)
}
