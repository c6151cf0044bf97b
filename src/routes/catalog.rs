use warp::{filters::BoxedFilter, http::StatusCode, reject::Rejection, reply::Response, Filter};

use crate::{
    actions::{get_ingredient, get_tag, list_ingredients, list_tags},
    error::HtmlError,
    form::QueryParams,
    schema::Uuid,
    state::SharedState,
};

use super::{json_reply, query_params, with_state};

pub fn routes(state: SharedState) -> BoxedFilter<(Response,)> {
    let tags = warp::path!("api" / "tags")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(list_tags_handler);

    let tag = warp::path!("api" / "tags" / Uuid)
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(tag_handler);

    let ingredients = warp::path!("api" / "ingredients")
        .and(warp::get())
        .and(query_params())
        .and(with_state(state.clone()))
        .and_then(list_ingredients_handler);

    let ingredient = warp::path!("api" / "ingredients" / Uuid)
        .and(warp::get())
        .and(with_state(state))
        .and_then(ingredient_handler);

    tags.or(tag)
        .unify()
        .or(ingredients)
        .unify()
        .or(ingredient)
        .unify()
        .boxed()
}

async fn list_tags_handler(state: SharedState) -> Result<Response, Rejection> {
    let tags = list_tags(&state.pool).await?;
    Ok(json_reply(&tags, StatusCode::OK))
}

async fn tag_handler(id: Uuid, state: SharedState) -> Result<Response, Rejection> {
    let tag = get_tag(id, &state.pool)
        .await?
        .ok_or_else(|| HtmlError::NotFound.new("Tag not found."))?;
    Ok(json_reply(&tag, StatusCode::OK))
}

/// `?name=` filters by case-insensitive name prefix.
async fn list_ingredients_handler(
    params: QueryParams,
    state: SharedState,
) -> Result<Response, Rejection> {
    let ingredients = list_ingredients(params.get("name"), &state.pool).await?;
    Ok(json_reply(&ingredients, StatusCode::OK))
}

async fn ingredient_handler(id: Uuid, state: SharedState) -> Result<Response, Rejection> {
    let ingredient = get_ingredient(id, &state.pool)
        .await?
        .ok_or_else(|| HtmlError::NotFound.new("Ingredient not found."))?;
    Ok(json_reply(&ingredient, StatusCode::OK))
}
