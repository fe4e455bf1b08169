use std::borrow::Cow;

use sqlx::error::ErrorKind;
use sqlx::postgres::PgDatabaseError;
use thiserror::Error;

use crate::carrier::{ErrorCarrier, Problem};

/// Postgres SQLSTATE for `string_data_right_truncation`
const VALUE_TOO_LONG: &str = "22001";

/// Persistence engine failures, reduced to the shape the classifier needs
#[derive(Debug, Error)]
pub enum StoreError {
    /// The engine understood the request and refused it
    #[error("{message}")]
    KnownRequest {
        kind: RequestErrorKind,
        message: String,
        meta: StoreMeta,
    },

    /// The query itself was malformed (unknown column, undecodable value)
    #[error("{0}")]
    InvalidQuery(String),

    /// The engine could not be reached
    #[error("{0}")]
    Unavailable(String),

    /// Anything the adapter could not place
    #[error("{0}")]
    Unknown(String),
}

/// Sub-kind of a refused request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestErrorKind {
    UniqueViolation,
    RecordNotFound,
    ForeignKeyViolation,
    ValueTooLong,
    /// Any other refusal, with the engine's error code when it gave one
    Other(Option<String>),
}

/// Optional payload attached to a refused request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreMeta {
    /// Fields involved in a constraint violation
    pub target: Vec<String>,
    /// Engine-provided explanation
    pub cause: Option<String>,
}

impl StoreError {
    pub fn known(kind: RequestErrorKind, message: impl Into<String>) -> Self {
        Self::KnownRequest {
            kind,
            message: message.into(),
            meta: StoreMeta::default(),
        }
    }

    #[must_use]
    pub fn with_meta(self, meta: StoreMeta) -> Self {
        match self {
            Self::KnownRequest { kind, message, .. } => Self::KnownRequest { kind, message, meta },
            other => other,
        }
    }
}

/// Translate a persistence failure
pub fn translate(err: &StoreError) -> ErrorCarrier {
    let carrier = match err {
        StoreError::KnownRequest { kind, message, meta } => known_request(kind, message, meta),
        StoreError::InvalidQuery(message) => {
            ErrorCarrier::new(400, "Invalid database query").with_problem(Problem::general(message.as_str()))
        }
        StoreError::Unavailable(_) => {
            ErrorCarrier::new(503, "Database unavailable").with_problem(Problem::general("Failed to connect to database"))
        }
        StoreError::Unknown(_) => {
            ErrorCarrier::new(500, "Internal server error").with_problem(Problem::general("Unknown database error"))
        }
    };

    carrier.with_trace(Some(format!("{err:?}")))
}

fn known_request(kind: &RequestErrorKind, message: &str, meta: &StoreMeta) -> ErrorCarrier {
    match kind {
        RequestErrorKind::UniqueViolation => ErrorCarrier::new(409, "Duplicate field value")
            .with_problem(Problem::new(meta.target.join(", "), "Already exists")),
        RequestErrorKind::RecordNotFound => ErrorCarrier::new(404, "Record not found")
            .with_problem(Problem::general(meta.cause.as_deref().unwrap_or(message))),
        RequestErrorKind::ForeignKeyViolation => {
            ErrorCarrier::new(400, "Foreign key constraint failed").with_problem(Problem::general("Invalid reference"))
        }
        RequestErrorKind::ValueTooLong => {
            ErrorCarrier::new(400, "Value too long for column").with_problem(Problem::general("Input value is too long"))
        }
        RequestErrorKind::Other(_) => ErrorCarrier::new(400, "Database error").with_problem(Problem::general(message)),
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::KnownRequest {
                kind: RequestErrorKind::RecordNotFound,
                message: err.to_string(),
                meta: StoreMeta {
                    target: Vec::new(),
                    cause: Some("No record found for the requested operation.".to_owned()),
                },
            },
            sqlx::Error::Database(db) => from_database(db.as_ref()),
            sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::ColumnIndexOutOfBounds { .. }
            | sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::TypeNotFound { .. }
            | sqlx::Error::Decode(_) => Self::InvalidQuery(err.to_string()),
            sqlx::Error::Configuration(_)
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed => Self::Unavailable(err.to_string()),
            other => Self::Unknown(other.to_string()),
        }
    }
}

fn from_database(db: &dyn sqlx::error::DatabaseError) -> StoreError {
    let message = db.message().to_owned();
    let code = db.code().map(Cow::into_owned);

    let kind = match db.kind() {
        ErrorKind::UniqueViolation => RequestErrorKind::UniqueViolation,
        ErrorKind::ForeignKeyViolation => RequestErrorKind::ForeignKeyViolation,
        _ if code.as_deref() == Some(VALUE_TOO_LONG) => RequestErrorKind::ValueTooLong,
        _ => RequestErrorKind::Other(code),
    };

    let detail = db.try_downcast_ref::<PgDatabaseError>().and_then(PgDatabaseError::detail);
    let target = match (&kind, detail) {
        (RequestErrorKind::UniqueViolation, Some(detail)) => key_columns(detail),
        _ => Vec::new(),
    };
    let target = if target.is_empty() {
        db.constraint().map(|c| vec![c.to_owned()]).unwrap_or_default()
    } else {
        target
    };

    StoreError::KnownRequest {
        kind,
        message,
        meta: StoreMeta {
            target,
            cause: detail.map(str::to_owned),
        },
    }
}

/// Column names from a Postgres key detail such as `Key (email, org)=(a, b) already exists.`
fn key_columns(detail: &str) -> Vec<String> {
    let Some(rest) = detail.strip_prefix("Key (") else {
        return Vec::new();
    };
    let Some(end) = rest.find(")=(") else {
        return Vec::new();
    };

    rest[..end]
        .split(',')
        .map(|column| column.trim().trim_matches('"').to_owned())
        .filter(|column| !column.is_empty())
        .collect()
}
