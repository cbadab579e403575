use std::convert::Infallible;

use serde::Serialize;
use warp::{http::StatusCode, reject::Rejection, reply::Reply};

/// One itemized validation message, keyed by the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

/// Request-shape error taxonomy. Every action surfaces one of these
/// synchronously; none is fatal to the serving process.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("validation failed")]
    Validation(Vec<FieldError>),
    #[error("{0}")]
    AlreadyExists(String),
    #[error("{0}")]
    NotInSet(String),
    #[error("{0}")]
    NotFound(String),
    #[error("authentication required")]
    Unauthenticated,
    #[error("{0}")]
    Forbidden(String),
    #[error("database error: {0}")]
    Query(String),
    #[error("cache error: {0}")]
    Cache(String),
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::Validation(_) | Error::AlreadyExists(_) | Error::NotInSet(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Unauthenticated => StatusCode::UNAUTHORIZED,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::Query(_) | Error::Cache(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn into_rejection(self) -> Rejection {
        warp::reject::custom(self)
    }
}

impl warp::reject::Reject for Error {}

pub struct QueryError {
    info: String,
}

impl QueryError {
    pub fn new(info: String) -> Self {
        Self { info }
    }
}

impl From<sqlx::Error> for QueryError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::Configuration(e) => Self::new(format!("{e}")),
            sqlx::Error::Database(e) => Self::new(format!("{e}")),
            sqlx::Error::Io(e) => Self::new(format!("{e}")),
            sqlx::Error::Tls(e) => Self::new(format!("{e}")),
            sqlx::Error::Protocol(e) => Self::new(format!("{e}")),
            sqlx::Error::RowNotFound => Self::new(String::from("Row not found")),
            sqlx::Error::TypeNotFound { type_name } => {
                Self::new(format!("Type not found: {type_name}"))
            }
            sqlx::Error::ColumnIndexOutOfBounds { index, len } => {
                Self::new(format!("Column index out of bounds {index} ({len})"))
            }
            sqlx::Error::ColumnNotFound(e) => Self::new(format!("{e}")),
            sqlx::Error::ColumnDecode { index, source } => {
                Self::new(format!("Column decode {index} ({source})"))
            }
            sqlx::Error::Decode(e) => Self::new(format!("{e}")),
            sqlx::Error::AnyDriverError(e) => Self::new(format!("{e}")),
            sqlx::Error::PoolTimedOut => Self::new(String::from("Pool timed out")),
            sqlx::Error::PoolClosed => Self::new(String::from("Pool closed")),
            sqlx::Error::WorkerCrashed => Self::new(String::from("Worker crashed")),
            sqlx::Error::Migrate(e) => Self::new(format!("{e}")),
            _ => Self::new(String::from("Unknown error")),
        }
    }
}

impl From<QueryError> for Error {
    fn from(value: QueryError) -> Self {
        Error::Query(value.info)
    }
}

pub struct CacheError {
    info: String,
}

impl CacheError {
    pub fn new(info: String) -> Self {
        Self { info }
    }
}

impl From<redis::RedisError> for CacheError {
    fn from(value: redis::RedisError) -> Self {
        Self {
            info: format!("{:?} - {:?}", value.code(), value.detail()),
        }
    }
}

impl From<CacheError> for Error {
    fn from(value: CacheError) -> Self {
        Error::Cache(value.info)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Serialize)]
struct ValidationBody<'a> {
    errors: &'a [FieldError],
}

/// Recovery handler for routers built on this crate: maps the error taxonomy
/// to status codes and JSON bodies, with itemized messages for validation.
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    if let Some(error) = err.find::<Error>() {
        let status = error.status();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            log::error!("request failed: {error}");
        }

        let reply = match error {
            Error::Validation(errors) => warp::reply::json(&ValidationBody {
                errors: errors.as_slice(),
            }),
            other => warp::reply::json(&ErrorBody {
                error: other.to_string(),
            }),
        };
        return Ok(warp::reply::with_status(reply, status));
    }

    if err.is_not_found() {
        let reply = warp::reply::json(&ErrorBody {
            error: String::from("Not found"),
        });
        return Ok(warp::reply::with_status(reply, StatusCode::NOT_FOUND));
    }

    let reply = warp::reply::json(&ErrorBody {
        error: String::from("Bad request"),
    });
    Ok(warp::reply::with_status(reply, StatusCode::BAD_REQUEST))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_expected_status_codes() {
        assert_eq!(
            Error::Validation(vec![]).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::AlreadyExists(String::from("x")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::NotInSet(String::from("x")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::NotFound(String::from("x")).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(Error::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            Error::Forbidden(String::from("x")).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            Error::Query(String::from("x")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn query_error_carries_database_detail() {
        let error: Error = QueryError::from(sqlx::Error::PoolTimedOut).into();
        assert_eq!(error.to_string(), "database error: Pool timed out");
    }

    #[tokio::test]
    async fn validation_rejection_renders_itemized_messages() {
        let rejection = Error::Validation(vec![
            FieldError::new("tags", "At least one tag is required"),
            FieldError::new("image", "An image is required"),
        ])
        .into_rejection();

        let reply = handle_rejection(rejection).await.unwrap();
        let response = reply.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = warp::hyper::body::to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["errors"][0]["field"], "tags");
        assert_eq!(json["errors"][1]["message"], "An image is required");
    }
}
