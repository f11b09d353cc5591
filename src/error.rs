use derive_more::Display;
use salvo::{prelude::StatusError, writer::Json, Piece, Response};

use self::http::ErrorResponse;

pub type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Display)]
pub struct UnknownError(BoxedError);

impl std::error::Error for UnknownError {}

impl UnknownError {
    pub fn new(err: BoxedError) -> Self {
        Self(err)
    }
}

impl From<BoxedError> for UnknownError {
    fn from(err: BoxedError) -> Self {
        Self::new(err)
    }
}

impl From<sqlx::error::Error> for UnknownError {
    fn from(err: sqlx::error::Error) -> Self {
        Self::new(err.into())
    }
}

impl Piece for UnknownError {
    fn render(self, res: &mut Response) {
        let status = StatusError::internal_server_error();
        res.render(Json(ErrorResponse::from_status_error(&status, ())));
        res.set_status_error(status);
    }
}

pub mod store {
    use derive_more::Display;
    use sqlx::postgres::PgDatabaseError;

    use super::UnknownError;

    /// SQLSTATE for unique_violation.
    const UNIQUE_VIOLATION: &str = "23505";
    /// SQLSTATE class for integrity constraint violations.
    const INTEGRITY_CLASS: &str = "23";

    /// Outcome of a failed [`UserStore`](crate::domain::service::UserStore) call.
    ///
    /// Uniqueness violations carry the constraint identifier reported by the
    /// database so the caller can decide which field collided.
    #[derive(Debug, Display)]
    pub enum StoreError {
        #[display(fmt = "unique constraint violated: {_0}")]
        UniqueViolation(String),
        #[display(fmt = "integrity constraint violated")]
        IntegrityViolation,
        #[display(fmt = "record not found")]
        NotFound,
        #[display(fmt = "unexpected store error: {_0}")]
        Unexpected(UnknownError),
    }

    impl std::error::Error for StoreError {}

    impl From<sqlx::error::Error> for StoreError {
        fn from(err: sqlx::error::Error) -> Self {
            if matches!(err, sqlx::error::Error::RowNotFound) {
                return Self::NotFound;
            }

            if let sqlx::error::Error::Database(ref db) = err {
                if let Some(pg) = db.try_downcast_ref::<PgDatabaseError>() {
                    let code = pg.code();
                    if code == UNIQUE_VIOLATION {
                        let constraint = pg.constraint().unwrap_or_default();
                        return Self::UniqueViolation(constraint.into());
                    }
                    if code.starts_with(INTEGRITY_CLASS) {
                        return Self::IntegrityViolation;
                    }
                }
            }

            Self::Unexpected(err.into())
        }
    }
}

pub mod merge {
    use derive_more::Display;
    use salvo::{prelude::StatusError, writer::Json, Piece, Response};

    use super::{http::ErrorResponse, store::StoreError, UnknownError};
    use crate::domain::datatype::image::ImageError;

    /// Which unique field a persistence conflict refers to.
    #[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
    pub enum ConflictKind {
        Username,
        Email,
        Other,
    }

    /// Unique fields of the user table, keyed by the field name their
    /// constraint identifier references.
    const UNIQUE_FIELDS: [(&str, ConflictKind); 2] = [
        ("username", ConflictKind::Username),
        ("email", ConflictKind::Email),
    ];

    impl ConflictKind {
        pub fn from_constraint(constraint: &str) -> Self {
            UNIQUE_FIELDS
                .iter()
                .find(|(field, _)| constraint.contains(field))
                .map(|(_, kind)| *kind)
                .unwrap_or(Self::Other)
        }

        pub fn message(&self) -> &'static str {
            match self {
                Self::Username => "username already in use",
                Self::Email => "email already in use",
                Self::Other => "data integrity error",
            }
        }
    }

    /// Outcome of a failed user mutation.
    #[derive(Debug, Display)]
    pub enum MergeError {
        #[display(fmt = "invalid role: {_0}")]
        InvalidRole(String),
        #[display(fmt = "failed to process image")]
        ImageProcessing(ImageError),
        #[display(fmt = "{}", "_0.message()")]
        Conflict(ConflictKind),
        #[display(fmt = "user not found")]
        NotFound,
        #[display(fmt = "unexpected internal error")]
        Unexpected(UnknownError),
    }

    impl std::error::Error for MergeError {}

    impl From<StoreError> for MergeError {
        fn from(err: StoreError) -> Self {
            match err {
                StoreError::UniqueViolation(constraint) => {
                    Self::Conflict(ConflictKind::from_constraint(&constraint))
                }
                StoreError::IntegrityViolation => Self::Conflict(ConflictKind::Other),
                StoreError::NotFound => Self::NotFound,
                StoreError::Unexpected(err) => Self::Unexpected(err),
            }
        }
    }

    impl From<ImageError> for MergeError {
        fn from(err: ImageError) -> Self {
            Self::ImageProcessing(err)
        }
    }

    impl Piece for MergeError {
        fn render(self, res: &mut Response) {
            let status = match &self {
                Self::InvalidRole(_) => StatusError::bad_request(),
                Self::Conflict(_) => StatusError::conflict(),
                Self::NotFound => StatusError::not_found(),
                Self::ImageProcessing(_) | Self::Unexpected(_) => {
                    StatusError::internal_server_error()
                }
            };
            if let Self::Unexpected(err) = &self {
                tracing::error!("unexpected failure handling user mutation: {err}");
            }
            let body = ErrorResponse {
                title: status.name.clone(),
                message: self.to_string(),
                error: (),
            };
            res.render(Json(body));
            res.set_status_error(status);
        }
    }
}

pub mod http {
    use derive_more::{Display, Error};
    use salvo::{http::ParseError, prelude::StatusError, writer::Json, Piece, Response};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Display, Clone, Serialize, Deserialize)]
    pub enum BadRequest {
        #[display(fmt = "invalid request content")]
        InvalidContent,
        #[display(fmt = "missing required field: {_0}")]
        MissingField(String),
        #[display(fmt = "malformed field: {_0}")]
        MalformedField(String),
    }

    impl std::error::Error for BadRequest {}

    #[derive(Debug, Display, Clone, Error, Serialize, Deserialize)]
    #[display(fmt = "Response error: {title}, {message}")]
    pub struct ErrorResponse<T> {
        pub title: String,
        pub message: String,
        pub error: T,
    }

    impl<T> ErrorResponse<T> {
        pub fn from_status_error(status: &StatusError, err: T) -> Self {
            Self {
                title: status.name.clone(),
                message: status
                    .summary
                    .clone()
                    .unwrap_or_else(|| status.name.clone()),
                error: err,
            }
        }
    }

    impl From<ParseError> for BadRequest {
        fn from(_: ParseError) -> Self {
            BadRequest::InvalidContent
        }
    }

    impl Piece for BadRequest {
        fn render(self, res: &mut Response) {
            let status = StatusError::bad_request();
            let body = ErrorResponse {
                title: status.name.clone(),
                message: self.to_string(),
                error: self,
            };
            res.render(Json(body));
            res.set_status_error(status);
        }
    }
}
