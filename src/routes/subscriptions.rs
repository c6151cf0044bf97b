use warp::{filters::BoxedFilter, http::StatusCode, reject::Rejection, reply::Response, Filter};

use crate::{
    actions::{fetch_subscriptions, subscribe, unsubscribe},
    constants::USER_COUNT_PER_PAGE,
    form::QueryParams,
    jwt::SessionData,
    middleware::with_session,
    pagination::PageRequest,
    recipe::RecipesLimit,
    schema::Uuid,
    state::SharedState,
    subscription::{render_profile_with_recipes, render_profiles_with_recipes},
};

use super::{json_reply, no_content, query_params, with_state};

pub fn routes(state: SharedState) -> BoxedFilter<(Response,)> {
    let list = warp::path!("api" / "users" / "subscriptions")
        .and(warp::get())
        .and(with_session(state.clone()))
        .and(query_params())
        .and(with_state(state.clone()))
        .and_then(list_handler);

    let create = warp::path!("api" / "users" / Uuid / "subscribe")
        .and(warp::post())
        .and(with_session(state.clone()))
        .and(query_params())
        .and(with_state(state.clone()))
        .and_then(create_handler);

    let delete = warp::path!("api" / "users" / Uuid / "subscribe")
        .and(warp::delete())
        .and(with_session(state.clone()))
        .and(with_state(state))
        .and_then(delete_handler);

    list.or(create).unify().or(delete).unify().boxed()
}

async fn list_handler(
    session: SessionData,
    params: QueryParams,
    state: SharedState,
) -> Result<Response, Rejection> {
    let request = PageRequest::from_query(&params, USER_COUNT_PER_PAGE);
    let limit = RecipesLimit::from_query(&params);

    let mut page = fetch_subscriptions(session.user_id, request, &state.pool).await?;
    let users = std::mem::take(&mut page.results);
    let views = render_profiles_with_recipes(
        &users,
        Some(session.user_id),
        limit,
        &state.pool,
        &state.storage,
    )
    .await?;

    Ok(json_reply(&page.with_results(views), StatusCode::OK))
}

async fn create_handler(
    following: Uuid,
    session: SessionData,
    params: QueryParams,
    state: SharedState,
) -> Result<Response, Rejection> {
    let target = subscribe(session.user_id, following, &state.pool).await?;
    let view = render_profile_with_recipes(
        &target,
        Some(session.user_id),
        RecipesLimit::from_query(&params),
        &state.pool,
        &state.storage,
    )
    .await?;

    Ok(json_reply(&view, StatusCode::CREATED))
}

async fn delete_handler(
    following: Uuid,
    session: SessionData,
    state: SharedState,
) -> Result<Response, Rejection> {
    unsubscribe(session.user_id, following, &state.pool).await?;
    Ok(no_content())
}
