use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use mongodb::error::{ErrorKind, WriteFailure};

const DUPLICATE_KEY: i32 = 11000;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("No user found with {field} {value}")]
    NotFound { field: &'static str, value: i64 },
    #[error("A user with this id or externalId already exists")]
    Conflict,
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Database(mongodb::error::Error),
}

impl From<mongodb::error::Error> for ApiError {
    fn from(err: mongodb::error::Error) -> Self {
        if is_duplicate_key(&err) {
            Self::Conflict
        } else {
            Self::Database(err)
        }
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == DUPLICATE_KEY
    )
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let Self::Database(err) = self {
            tracing::error!(error = %err, "database operation failed");
        }
        HttpResponse::build(self.status_code()).body(self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use mongodb::bson::{doc, from_document};
    use mongodb::error::WriteError;

    fn write_error(code: i32) -> mongodb::error::Error {
        let write_error: WriteError = from_document(doc! {
            "code": code,
            "codeName": "DuplicateKey",
            "errmsg": "E11000 duplicate key error collection: bookkeeping.users",
        })
        .unwrap();
        ErrorKind::Write(WriteFailure::WriteError(write_error)).into()
    }

    #[test]
    fn maps_variants_to_status_codes() {
        let not_found = ApiError::NotFound {
            field: "id",
            value: 3,
        };
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Conflict.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::BadRequest("missing field `id`".to_owned()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn io_failures_are_not_conflicts() {
        let io = std::io::Error::other("connection reset");
        let err = ApiError::from(mongodb::error::Error::from(io));
        assert!(matches!(err, ApiError::Database(_)));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn duplicate_key_becomes_conflict() {
        let err = ApiError::from(write_error(DUPLICATE_KEY));
        assert!(matches!(err, ApiError::Conflict));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn other_write_errors_stay_database_errors() {
        let err = ApiError::from(write_error(121));
        assert!(matches!(err, ApiError::Database(_)));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[actix_web::test]
    async fn not_found_body_names_the_lookup_key() {
        let not_found = ApiError::NotFound {
            field: "externalId",
            value: 42,
        };
        let response = not_found.error_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = to_bytes(response.into_body()).await.unwrap();
        assert_eq!(body, "No user found with externalId 42");
    }
}
