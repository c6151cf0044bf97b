use std::fmt::{self, Display};

use serde_json::{json, Map, Value};
use warp::{http::StatusCode, reject::Reject};

/// Error carried from the query layer up to the HTTP response.
///
/// `field` is set for validation failures tied to a single request field, in
/// which case the response body is `{"<field>": ["<info>"]}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    pub code: u16,
    pub info: Option<String>,
    pub field: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HtmlError {
    InvalidRequest,
    Unauthorized,
    InvalidSession,
    Forbidden,
    NotFound,
    Internal,
}

impl HtmlError {
    pub fn code(self) -> u16 {
        match self {
            HtmlError::InvalidRequest => 400,
            HtmlError::Unauthorized | HtmlError::InvalidSession => 401,
            HtmlError::Forbidden => 403,
            HtmlError::NotFound => 404,
            HtmlError::Internal => 500,
        }
    }

    pub fn new(self, info: &str) -> Error {
        Error {
            code: self.code(),
            info: Some(info.to_string()),
            field: None,
        }
    }

    pub fn field(self, field: &str, info: &str) -> Error {
        Error {
            code: self.code(),
            info: Some(info.to_string()),
            field: Some(field.to_string()),
        }
    }
}

impl Error {
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn body(&self) -> Value {
        if self.code >= 500 {
            return json!({ "detail": "Internal server error" });
        }

        let info = self.info.clone().unwrap_or_default();
        match &self.field {
            Some(field) => {
                let mut body = Map::new();
                body.insert(field.to_owned(), json!([info]));
                Value::Object(body)
            }
            None if self.code == 400 => json!({ "errors": info }),
            None => json!({ "detail": info }),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.field, &self.info) {
            (Some(field), Some(info)) => write!(f, "{} ({field}: {info})", self.code),
            (None, Some(info)) => write!(f, "{} ({info})", self.code),
            (_, None) => write!(f, "{}", self.code),
        }
    }
}

impl std::error::Error for Error {}
impl Reject for Error {}

pub struct QueryError {
    info: String,
    kind: QueryErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QueryErrorKind {
    Conflict,
    Constraint,
    Other,
}

impl QueryError {
    pub fn new(info: String) -> Self {
        Self {
            info,
            kind: QueryErrorKind::Other,
        }
    }
}

impl From<sqlx::Error> for QueryError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::Database(e) => {
                let kind = if e.is_unique_violation() {
                    QueryErrorKind::Conflict
                } else if e.is_check_violation() || e.is_foreign_key_violation() {
                    QueryErrorKind::Constraint
                } else {
                    QueryErrorKind::Other
                };
                Self {
                    info: format!("{e}"),
                    kind,
                }
            }
            sqlx::Error::RowNotFound => Self::new(String::from("RowNotFound")),
            sqlx::Error::PoolTimedOut => Self::new(String::from("Pool timed out")),
            sqlx::Error::PoolClosed => Self::new(String::from("Pool closed")),
            e => Self::new(format!("{e}")),
        }
    }
}

impl From<QueryError> for Error {
    fn from(value: QueryError) -> Self {
        match value.kind {
            QueryErrorKind::Conflict => {
                log::debug!("Unique constraint rejected write: {}", value.info);
                HtmlError::InvalidRequest.new("Such a record already exists.")
            }
            QueryErrorKind::Constraint => {
                log::debug!("Constraint rejected write: {}", value.info);
                HtmlError::InvalidRequest.new("The record violates a data constraint.")
            }
            QueryErrorKind::Other => {
                log::error!("Query failed: {}", value.info);
                Error {
                    code: 500,
                    info: Some(value.info),
                    field: None,
                }
            }
        }
    }
}

/// Failure to read a typed value out of a request body or query string.
#[derive(Debug)]
pub struct TypeError {
    field: String,
    info: String,
}

impl TypeError {
    pub fn new(field: &str, info: &str) -> Self {
        Self {
            field: field.to_string(),
            info: info.to_string(),
        }
    }
}

impl From<TypeError> for Error {
    fn from(value: TypeError) -> Self {
        HtmlError::InvalidRequest.field(&value.field, &value.info)
    }
}

impl Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}: {})", self.field, self.info)
    }
}

impl std::error::Error for TypeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_errors_render_as_lists() {
        let error = HtmlError::InvalidRequest.field("following", "You cannot follow yourself.");

        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            error.body(),
            json!({ "following": ["You cannot follow yourself."] })
        );
    }

    #[test]
    fn non_field_errors_use_detail_or_errors() {
        assert_eq!(
            HtmlError::NotFound.new("Not found.").body(),
            json!({ "detail": "Not found." })
        );
        assert_eq!(
            HtmlError::InvalidRequest.new("Such a record already exists.").body(),
            json!({ "errors": "Such a record already exists." })
        );
    }

    #[test]
    fn internal_errors_hide_their_info() {
        let error: Error = QueryError::new(String::from("connection refused")).into();

        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.body(), json!({ "detail": "Internal server error" }));
    }

    #[test]
    fn row_not_found_is_a_server_fault() {
        let error: Error = QueryError::from(sqlx::Error::RowNotFound).into();
        assert_eq!(error.code, 500);
    }

    #[test]
    fn type_errors_point_at_their_field() {
        let error: Error = TypeError::new("cooking_time", "A valid integer is required.").into();

        assert_eq!(error.code, 400);
        assert_eq!(error.field.as_deref(), Some("cooking_time"));
    }

    #[test]
    fn errors_convert_into_rejections() {
        let rejection = warp::reject::Rejection::from(HtmlError::NotFound.new("Invalid page."));

        assert_eq!(
            rejection.find::<Error>().map(Error::status),
            Some(StatusCode::NOT_FOUND)
        );
    }
}
