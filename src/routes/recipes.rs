use warp::{
    filters::BoxedFilter, http::StatusCode, reject::Rejection, reply::Response, Filter, Reply,
};

use crate::{
    actions::{
        add_to_list, create_recipe, delete_recipe, fetch_recipes, get_recipe_mut,
        get_recipe_or_404, list_cart_lines, remove_from_list, update_recipe, RecipeFilter,
        RecipeList,
    },
    codec::{decode_image, ContentFile, ImagePayload},
    constants::{RECIPE_COUNT_PER_PAGE, RECIPE_UPLOAD_TO, SHOPPING_LIST_FILENAME},
    error::{Error, HtmlError},
    form::{Form, FormData, QueryParams},
    jwt::SessionData,
    middleware::{with_possible_session, with_session},
    pagination::PageRequest,
    recipe::{render_recipe, render_recipes, RecipeSummary},
    schema::{IngredientAmount, RecipeDraft, Uuid},
    shopping_list::{aggregate_shopping_list, render_shopping_list},
    state::SharedState,
    validation::{validate_cooking_time, validate_ingredients, validate_recipe_name, validate_tags},
};

use super::{json_body, json_reply, no_content, query_params, with_state};

/// Recipe fields read from a request body, with the image decoded but not
/// yet stored.
struct RecipeInput {
    name: String,
    text: String,
    cooking_time: i32,
    ingredients: Vec<IngredientAmount>,
    tags: Vec<Uuid>,
    image: Option<ContentFile>,
}

impl RecipeInput {
    fn into_draft(self, image: Option<String>) -> RecipeDraft {
        RecipeDraft {
            name: self.name,
            text: self.text,
            cooking_time: self.cooking_time,
            image,
            ingredients: self.ingredients,
            tags: self.tags,
        }
    }
}

fn read_recipe(form: &Form, image_required: bool) -> Result<RecipeInput, Error> {
    let ingredients: Vec<IngredientAmount> = form.get_json("ingredients")?;
    validate_ingredients(&ingredients)?;
    let tags: Vec<Uuid> = form.get_json("tags")?;
    validate_tags(&tags)?;

    let image = match image_required {
        true => Some(form.get_str("image")?),
        false => form.get_optional_str("image")?,
    };
    let image = image
        .map(|data| decode_image(ImagePayload::Encoded(data)))
        .transpose()
        .map_err(|e| e.into_field_error("image"))?;

    let name = form.get_str("name")?;
    validate_recipe_name(&name)?;
    let text = form.get_str("text")?;
    let cooking_time: i32 = form.get_number("cooking_time")?;
    validate_cooking_time(cooking_time)?;

    Ok(RecipeInput {
        name,
        text,
        cooking_time,
        ingredients,
        tags,
        image,
    })
}

fn read_filter(params: &QueryParams) -> Result<RecipeFilter, Error> {
    let author = params
        .get("author")
        .map(|author| {
            author.trim().parse::<Uuid>().map_err(|_| {
                HtmlError::InvalidRequest.field("author", "A valid integer is required.")
            })
        })
        .transpose()?;

    Ok(RecipeFilter {
        author,
        tags: params.get_all("tags"),
        is_favorited: params.get_flag("is_favorited"),
        is_in_shopping_cart: params.get_flag("is_in_shopping_cart"),
    })
}

pub fn routes(state: SharedState) -> BoxedFilter<(Response,)> {
    let list = warp::path!("api" / "recipes")
        .and(warp::get())
        .and(query_params())
        .and(with_possible_session(state.clone()))
        .and(with_state(state.clone()))
        .and_then(list_handler);

    let create = warp::path!("api" / "recipes")
        .and(warp::post())
        .and(with_session(state.clone()))
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(create_handler);

    let download = warp::path!("api" / "recipes" / "download_shopping_cart")
        .and(warp::get())
        .and(with_session(state.clone()))
        .and(with_state(state.clone()))
        .and_then(download_handler);

    let retrieve = warp::path!("api" / "recipes" / Uuid)
        .and(warp::get())
        .and(with_possible_session(state.clone()))
        .and(with_state(state.clone()))
        .and_then(retrieve_handler);

    let update = warp::path!("api" / "recipes" / Uuid)
        .and(warp::patch())
        .and(with_session(state.clone()))
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(update_handler);

    let delete = warp::path!("api" / "recipes" / Uuid)
        .and(warp::delete())
        .and(with_session(state.clone()))
        .and(with_state(state.clone()))
        .and_then(delete_handler);

    let favorite = list_routes("favorite", RecipeList::Favorites, state.clone());
    let shopping_cart = list_routes("shopping_cart", RecipeList::ShoppingCart, state);

    list.or(create)
        .unify()
        .or(download)
        .unify()
        .or(retrieve)
        .unify()
        .or(update)
        .unify()
        .or(delete)
        .unify()
        .or(favorite)
        .unify()
        .or(shopping_cart)
        .unify()
        .boxed()
}

/// `POST` and `DELETE` on `/api/recipes/{id}/<segment>` toggle membership of
/// the viewer's `list`.
fn list_routes(
    segment: &'static str,
    list: RecipeList,
    state: SharedState,
) -> BoxedFilter<(Response,)> {
    let path = warp::path!("api" / "recipes" / Uuid / ..)
        .and(warp::path(segment))
        .and(warp::path::end());

    let add = path
        .clone()
        .and(warp::post())
        .and(with_session(state.clone()))
        .and(with_state(state.clone()))
        .and_then(move |id: Uuid, session: SessionData, state: SharedState| {
            add_handler(list, id, session, state)
        });

    let remove = path
        .and(warp::delete())
        .and(with_session(state.clone()))
        .and(with_state(state))
        .and_then(move |id: Uuid, session: SessionData, state: SharedState| {
            remove_handler(list, id, session, state)
        });

    add.or(remove).unify().boxed()
}

async fn list_handler(
    params: QueryParams,
    session: Option<SessionData>,
    state: SharedState,
) -> Result<Response, Rejection> {
    let viewer = session.map(|s| s.user_id);
    let filter = read_filter(&params)?;
    let request = PageRequest::from_query(&params, RECIPE_COUNT_PER_PAGE);

    let mut page = fetch_recipes(&filter, viewer, request, &state.pool).await?;
    let rows = std::mem::take(&mut page.results);
    let views = render_recipes(rows, viewer, &state.pool, &state.storage).await?;

    Ok(json_reply(&page.with_results(views), StatusCode::OK))
}

async fn store_image(file: Option<ContentFile>, state: &SharedState) -> Result<Option<String>, Error> {
    match file {
        Some(file) => Ok(Some(state.storage.save(&file, RECIPE_UPLOAD_TO).await?)),
        None => Ok(None),
    }
}

async fn respond_with_recipe(
    id: Uuid,
    viewer: Uuid,
    status: StatusCode,
    state: &SharedState,
) -> Result<Response, Rejection> {
    let row = get_recipe_or_404(id, Some(viewer), &state.pool).await?;
    let view = render_recipe(row, Some(viewer), &state.pool, &state.storage).await?;
    Ok(json_reply(&view, status))
}

async fn create_handler(
    session: SessionData,
    data: FormData,
    state: SharedState,
) -> Result<Response, Rejection> {
    let mut input = read_recipe(&Form::from_data(data), true)?;
    let image = store_image(input.image.take(), &state).await?;
    let draft = input.into_draft(image);

    let id = state
        .storage
        .keep_if(
            draft.image.as_deref(),
            create_recipe(session.user_id, &draft, &state.pool),
        )
        .await?;
    respond_with_recipe(id, session.user_id, StatusCode::CREATED, &state).await
}

async fn retrieve_handler(
    id: Uuid,
    session: Option<SessionData>,
    state: SharedState,
) -> Result<Response, Rejection> {
    let viewer = session.map(|s| s.user_id);
    let row = get_recipe_or_404(id, viewer, &state.pool).await?;
    let view = render_recipe(row, viewer, &state.pool, &state.storage).await?;

    Ok(json_reply(&view, StatusCode::OK))
}

async fn update_handler(
    id: Uuid,
    session: SessionData,
    data: FormData,
    state: SharedState,
) -> Result<Response, Rejection> {
    get_recipe_mut(id, session.user_id, &state.pool).await?;

    let mut input = read_recipe(&Form::from_data(data), false)?;
    let image = store_image(input.image.take(), &state).await?;
    let draft = input.into_draft(image);

    state
        .storage
        .keep_if(draft.image.as_deref(), update_recipe(id, &draft, &state.pool))
        .await?;
    respond_with_recipe(id, session.user_id, StatusCode::OK, &state).await
}

async fn delete_handler(
    id: Uuid,
    session: SessionData,
    state: SharedState,
) -> Result<Response, Rejection> {
    get_recipe_mut(id, session.user_id, &state.pool).await?;
    delete_recipe(id, &state.pool).await?;
    log::info!("User {} deleted recipe {id}", session.user_id);

    Ok(no_content())
}

async fn add_handler(
    list: RecipeList,
    id: Uuid,
    session: SessionData,
    state: SharedState,
) -> Result<Response, Rejection> {
    let recipe = add_to_list(list, session.user_id, id, &state.pool).await?;
    Ok(json_reply(
        &RecipeSummary::render(&recipe, &state.storage),
        StatusCode::CREATED,
    ))
}

async fn remove_handler(
    list: RecipeList,
    id: Uuid,
    session: SessionData,
    state: SharedState,
) -> Result<Response, Rejection> {
    remove_from_list(list, session.user_id, id, &state.pool).await?;
    Ok(no_content())
}

async fn download_handler(session: SessionData, state: SharedState) -> Result<Response, Rejection> {
    let lines = list_cart_lines(session.user_id, &state.pool).await?;
    let text = render_shopping_list(&aggregate_shopping_list(lines));

    let reply = warp::reply::with_header(
        text,
        "Content-Disposition",
        format!("attachment; filename=\"{SHOPPING_LIST_FILENAME}\""),
    );
    Ok(reply.into_response())
}
