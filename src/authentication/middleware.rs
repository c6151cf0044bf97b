use warp::{reject::Rejection, Filter};

use crate::{
    error::HtmlError,
    state::SharedState,
};

use super::jwt::{verify_jwt_session, SessionData};

/// Token from an `Authorization: Token <jwt>` or `Bearer <jwt>` header.
pub fn parse_authorization(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    match scheme {
        "Token" | "Bearer" => Some(token),
        _ => None,
    }
}

fn resolve(header: Option<&str>, secret: &str) -> Option<SessionData> {
    let token = parse_authorization(header?)?;
    verify_jwt_session(token, secret).ok().map(SessionData::from)
}

pub fn with_session(
    state: SharedState,
) -> impl Filter<Extract = (SessionData,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization").and_then(move |header: Option<String>| {
        let state = state.clone();
        async move {
            match resolve(header.as_deref(), &state.config.secret) {
                Some(session) => Ok(session),
                None => Err(Rejection::from(HtmlError::Unauthorized.new(
                    "Authentication credentials were not provided.",
                ))),
            }
        }
    })
}

/// Anonymous requests and invalid tokens both resolve to `None`.
pub fn with_possible_session(
    state: SharedState,
) -> impl Filter<Extract = (Option<SessionData>,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization").map(move |header: Option<String>| {
        resolve(header.as_deref(), &state.config.secret)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_and_bearer_schemes_are_accepted() {
        assert_eq!(parse_authorization("Token abc"), Some("abc"));
        assert_eq!(parse_authorization("Bearer abc "), Some("abc"));
        assert_eq!(parse_authorization("Basic abc"), None);
        assert_eq!(parse_authorization("Token "), None);
        assert_eq!(parse_authorization("abc"), None);
    }
}
