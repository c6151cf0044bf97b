use bytes::BufMut;
use futures_util::TryStreamExt;
use serde_json::Value;
use warp::{filters::BoxedFilter, http::StatusCode, reject::Rejection, reply::Response, Filter};

use crate::{
    actions::{fetch_users, get_user_or_404, register_user, set_password, update_avatar},
    codec::{decode_image, ImagePayload},
    constants::{AVATAR_UPLOAD_TO, MAX_UPLOAD_SIZE, USER_COUNT_PER_PAGE, USER_NAME_MAX_LENGTH},
    cryptography::hash_password,
    error::{Error, HtmlError},
    form::{Form, FormData, QueryParams},
    jwt::SessionData,
    middleware::{with_possible_session, with_session},
    pagination::PageRequest,
    profile::{render_profile, render_profiles, AvatarView, RegisteredUserView},
    schema::{NewUser, Uuid},
    state::SharedState,
    validation::{validate_email, validate_max_length, validate_username},
};

use super::{json_body, json_reply, no_content, query_params, with_state};

const AVATAR_REQUIRED: &str = "An avatar must be attached.";

/// Avatar sent either inline as JSON or as a multipart upload.
enum AvatarUpload {
    Json(FormData),
    Multipart(warp::multipart::FormData),
}

fn avatar_upload() -> impl Filter<Extract = (AvatarUpload,), Error = Rejection> + Clone {
    let multipart = warp::multipart::form()
        .max_length(MAX_UPLOAD_SIZE)
        .map(AvatarUpload::Multipart);
    let json = json_body().map(AvatarUpload::Json);

    multipart.or(json).unify()
}

pub fn routes(state: SharedState) -> BoxedFilter<(Response,)> {
    let register = warp::path!("api" / "users")
        .and(warp::post())
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(register_handler);

    let list = warp::path!("api" / "users")
        .and(warp::get())
        .and(query_params())
        .and(with_possible_session(state.clone()))
        .and(with_state(state.clone()))
        .and_then(list_handler);

    let me = warp::path!("api" / "users" / "me")
        .and(warp::get())
        .and(with_session(state.clone()))
        .and(with_state(state.clone()))
        .and_then(me_handler);

    let retrieve = warp::path!("api" / "users" / Uuid)
        .and(warp::get())
        .and(with_possible_session(state.clone()))
        .and(with_state(state.clone()))
        .and_then(retrieve_handler);

    let change_password = warp::path!("api" / "users" / "set_password")
        .and(warp::post())
        .and(with_session(state.clone()))
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(set_password_handler);

    let put_avatar = warp::path!("api" / "users" / "me" / "avatar")
        .and(warp::put())
        .and(with_session(state.clone()))
        .and(avatar_upload())
        .and(with_state(state.clone()))
        .and_then(put_avatar_handler);

    let delete_avatar = warp::path!("api" / "users" / "me" / "avatar")
        .and(warp::delete())
        .and(with_session(state.clone()))
        .and(with_state(state))
        .and_then(delete_avatar_handler);

    register
        .or(list)
        .unify()
        .or(me)
        .unify()
        .or(retrieve)
        .unify()
        .or(change_password)
        .unify()
        .or(put_avatar)
        .unify()
        .or(delete_avatar)
        .unify()
        .boxed()
}

fn read_new_user(form: &Form) -> Result<NewUser, Error> {
    let email = form.get_str("email")?;
    validate_email(&email)?;
    let username = form.get_str("username")?;
    validate_username(&username)?;
    let first_name = form.get_str("first_name")?;
    validate_max_length("first_name", &first_name, USER_NAME_MAX_LENGTH)?;
    let last_name = form.get_str("last_name")?;
    validate_max_length("last_name", &last_name, USER_NAME_MAX_LENGTH)?;
    let password = form.get_str("password")?;

    Ok(NewUser {
        email,
        username,
        first_name,
        last_name,
        password: hash_password(&password)?,
    })
}

async fn register_handler(data: FormData, state: SharedState) -> Result<Response, Rejection> {
    let new_user = read_new_user(&Form::from_data(data))?;
    let user = register_user(&new_user, &state.pool).await?;

    Ok(json_reply(&RegisteredUserView::from(&user), StatusCode::CREATED))
}

async fn list_handler(
    params: QueryParams,
    session: Option<SessionData>,
    state: SharedState,
) -> Result<Response, Rejection> {
    let viewer = session.map(|s| s.user_id);
    let request = PageRequest::from_query(&params, USER_COUNT_PER_PAGE);

    let mut page = fetch_users(request, &state.pool).await?;
    let users = std::mem::take(&mut page.results);
    let views = render_profiles(&users, viewer, &state.pool, &state.storage).await?;

    Ok(json_reply(&page.with_results(views), StatusCode::OK))
}

async fn me_handler(session: SessionData, state: SharedState) -> Result<Response, Rejection> {
    let user = get_user_or_404(&state.pool, session.user_id).await?;
    let view = render_profile(&user, Some(session.user_id), &state.pool, &state.storage).await?;

    Ok(json_reply(&view, StatusCode::OK))
}

async fn retrieve_handler(
    id: Uuid,
    session: Option<SessionData>,
    state: SharedState,
) -> Result<Response, Rejection> {
    let user = get_user_or_404(&state.pool, id).await?;
    let viewer = session.map(|s| s.user_id);
    let view = render_profile(&user, viewer, &state.pool, &state.storage).await?;

    Ok(json_reply(&view, StatusCode::OK))
}

async fn set_password_handler(
    session: SessionData,
    data: FormData,
    state: SharedState,
) -> Result<Response, Rejection> {
    let form = Form::from_data(data);
    let current_password = form.get_str("current_password")?;
    let new_password = form.get_str("new_password")?;

    set_password(session.user_id, &current_password, &new_password, &state.pool).await?;
    log::info!("User {} changed their password", session.user_id);

    Ok(no_content())
}

fn inline_avatar(data: &FormData) -> Option<ImagePayload> {
    match data.get("avatar") {
        Some(Value::String(avatar)) if !avatar.trim().is_empty() => {
            Some(ImagePayload::Encoded(avatar.to_owned()))
        }
        _ => None,
    }
}

async fn multipart_avatar(
    mut form: warp::multipart::FormData,
) -> Result<Option<ImagePayload>, Error> {
    let malformed = |e: warp::Error| HtmlError::InvalidRequest.field("avatar", &e.to_string());

    while let Some(part) = form.try_next().await.map_err(malformed)? {
        if part.name() != "avatar" {
            continue;
        }
        let filename = part.filename().map(str::to_owned);
        let bytes = part
            .stream()
            .try_fold(Vec::new(), |mut bytes, chunk| async move {
                bytes.put(chunk);
                Ok(bytes)
            })
            .await
            .map_err(malformed)?;

        if bytes.is_empty() {
            return Ok(None);
        }
        return Ok(Some(ImagePayload::Raw { bytes, filename }));
    }
    Ok(None)
}

async fn put_avatar_handler(
    session: SessionData,
    upload: AvatarUpload,
    state: SharedState,
) -> Result<Response, Rejection> {
    let payload = match upload {
        AvatarUpload::Json(data) => inline_avatar(&data),
        AvatarUpload::Multipart(form) => multipart_avatar(form).await?,
    }
    .ok_or_else(|| HtmlError::InvalidRequest.field("avatar", AVATAR_REQUIRED))?;

    let file = decode_image(payload).map_err(|e| e.into_field_error("avatar"))?;
    let path = state.storage.save(&file, AVATAR_UPLOAD_TO).await?;
    state
        .storage
        .keep_if(
            Some(&path),
            update_avatar(session.user_id, Some(&path), &state.pool),
        )
        .await?;

    let view = AvatarView {
        avatar: Some(state.storage.url(&path)),
    };
    Ok(json_reply(&view, StatusCode::OK))
}

async fn delete_avatar_handler(
    session: SessionData,
    state: SharedState,
) -> Result<Response, Rejection> {
    update_avatar(session.user_id, None, &state.pool).await?;
    Ok(no_content())
}
