use serde::Serialize;
use warp::{filters::BoxedFilter, http::StatusCode, reject::Rejection, reply::Response, Filter};

use crate::{
    actions::login_user,
    form::{Form, FormData},
    jwt::SessionData,
    middleware::with_session,
    state::SharedState,
};

use super::{json_body, json_reply, no_content, with_state};

#[derive(Serialize)]
struct TokenView {
    auth_token: String,
}

pub fn routes(state: SharedState) -> BoxedFilter<(Response,)> {
    let login = warp::path!("api" / "auth" / "token" / "login")
        .and(warp::post())
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(login_handler);

    let logout = warp::path!("api" / "auth" / "token" / "logout")
        .and(warp::post())
        .and(with_session(state))
        .and_then(logout_handler);

    login.or(logout).unify().boxed()
}

async fn login_handler(data: FormData, state: SharedState) -> Result<Response, Rejection> {
    let form = Form::from_data(data);
    let email = form.get_str("email")?;
    let password = form.get_str("password")?;

    let auth_token = login_user(
        &email,
        &password,
        &state.config.secret,
        state.config.token_lifetime_hours,
        &state.pool,
    )
    .await?;

    Ok(json_reply(&TokenView { auth_token }, StatusCode::OK))
}

/// Sessions are stateless tokens; logging out only confirms the token is valid.
async fn logout_handler(session: SessionData) -> Result<Response, Rejection> {
    log::debug!("User {} logged out", session.user_id);
    Ok(no_content())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::routes::{
        api,
        tests::{body_json, test_state, token_for},
    };

    #[tokio::test]
    async fn logout_accepts_a_valid_token() {
        let response = warp::test::request()
            .method("POST")
            .path("/api/auth/token/logout/")
            .header("authorization", token_for(3))
            .reply(&api(test_state()))
            .await;

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn logout_rejects_tokens_signed_elsewhere() {
        let response = warp::test::request()
            .method("POST")
            .path("/api/auth/token/logout/")
            .header("authorization", "Token not.a.token")
            .reply(&api(test_state()))
            .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn login_requires_both_fields() {
        let response = warp::test::request()
            .method("POST")
            .path("/api/auth/token/login/")
            .json(&json!({ "email": "anna@example.com" }))
            .reply(&api(test_state()))
            .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(&response),
            json!({ "password": ["This field is required."] })
        );
    }
}
