mod auth;
mod catalog;
mod recipes;
mod subscriptions;
mod users;

use std::convert::Infallible;

use serde::Serialize;
use serde_json::json;
use warp::{
    filters::{body::BodyDeserializeError, BoxedFilter},
    http::StatusCode,
    reject::{
        InvalidQuery, LengthRequired, MethodNotAllowed, PayloadTooLarge, Rejection,
        UnsupportedMediaType,
    },
    reply::Response,
    Filter, Reply,
};

use crate::{
    constants::MAX_UPLOAD_SIZE,
    error::Error,
    form::{FormData, QueryParams},
    state::SharedState,
};

/// Every `/api` endpoint with JSON error recovery.
pub fn api(state: SharedState) -> BoxedFilter<(Response,)> {
    subscriptions::routes(state.clone())
        .or(users::routes(state.clone()))
        .unify()
        .or(auth::routes(state.clone()))
        .unify()
        .or(catalog::routes(state.clone()))
        .unify()
        .or(recipes::routes(state))
        .unify()
        .recover(handle_rejection)
        .unify()
        .boxed()
}

pub(crate) fn with_state(
    state: SharedState,
) -> impl Filter<Extract = (SharedState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

/// JSON object body. Image fields travel inline, so the limit leaves room for
/// base64 overhead.
pub(crate) fn json_body() -> impl Filter<Extract = (FormData,), Error = Rejection> + Clone {
    warp::body::content_length_limit(MAX_UPLOAD_SIZE * 2).and(warp::body::json())
}

pub(crate) fn query_params() -> impl Filter<Extract = (QueryParams,), Error = Rejection> + Clone {
    warp::query::<QueryParams>()
}

pub(crate) fn json_reply<T: Serialize>(value: &T, status: StatusCode) -> Response {
    warp::reply::with_status(warp::reply::json(value), status).into_response()
}

pub(crate) fn no_content() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

pub async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    let (status, body) = if let Some(error) = err.find::<Error>() {
        if error.code >= 500 {
            log::error!("Request failed: {error}");
        }
        (error.status(), error.body())
    } else if let Some(error) = err.find::<BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, json!({ "errors": error.to_string() }))
    } else if err.find::<InvalidQuery>().is_some() {
        (
            StatusCode::BAD_REQUEST,
            json!({ "errors": "Invalid query string." }),
        )
    } else if err.find::<PayloadTooLarge>().is_some() {
        (
            StatusCode::PAYLOAD_TOO_LARGE,
            json!({ "detail": "Request body is too large." }),
        )
    } else if err.find::<LengthRequired>().is_some() {
        (
            StatusCode::LENGTH_REQUIRED,
            json!({ "detail": "A content length is required." }),
        )
    } else if err.find::<UnsupportedMediaType>().is_some() {
        (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            json!({ "detail": "Unsupported media type." }),
        )
    } else if err.find::<MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            json!({ "detail": "Method not allowed." }),
        )
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, json!({ "detail": "Not found." }))
    } else {
        log::error!("Unhandled rejection: {err:?}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "detail": "Internal server error" }),
        )
    };

    Ok(json_reply(&body, status))
}
