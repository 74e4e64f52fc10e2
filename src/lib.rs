//! Pantry Ledger is a web service for tracking personal incomes, expenses and
//! receipts.
//!
//! This library provides a JSON API over a SQLite database. The centrepiece is
//! the balance aggregator, [aggregate], which rolls a user's transactions up
//! into month-by-month snapshots with a running balance.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;
use tokio::signal;

mod amount;
mod app_state;
mod auth;
mod balance;
mod db;
pub mod endpoints;
mod logging;
mod receipt;
mod routing;
mod store;
mod timezone;
mod transaction;
mod user;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{DEFAULT_COOKIE_DURATION, set_auth_cookie};
pub use balance::{BalanceSnapshot, DateRange, Period, aggregate, aggregate_transactions};
pub use db::{DatabaseId, initialize as initialize_db};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use receipt::{NewReceipt, NewReceiptItem, Receipt, ReceiptItem, create_receipt};
pub use routing::build_router;
pub use store::{SQLiteTransactionSource, TransactionSource};
pub use transaction::{
    Recurrence, Transaction, TransactionBuilder, TransactionKind, create_transaction,
};
pub use user::{User, UserID, create_user, get_user_by_id};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The start of a date range came after its end.
    #[error("the start date {start} is after the end date {end}")]
    InvalidRange {
        /// The requested start date.
        start: Date,
        /// The requested end date.
        end: Date,
    },

    /// The request did not carry a valid session.
    #[error("you must be logged in to access this resource")]
    Unauthorized,

    /// The query string or body of a request could not be parsed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A transaction or receipt item was given a negative amount.
    ///
    /// Amounts are stored as magnitudes, whether a transaction adds or
    /// removes money is decided by its kind.
    #[error("{0} is negative, amounts must be zero or greater")]
    NegativeAmount(Decimal),

    /// A recurring transaction was given an end date before its start date.
    #[error("the recurrence end date {end} is before the transaction date {date}")]
    InvalidRecurrenceEnd {
        /// The date of the first occurrence.
        date: Date,
        /// The requested recurrence end date.
        end: Date,
    },

    /// A receipt was submitted without any line items.
    #[error("a receipt must have at least one item")]
    EmptyReceipt,

    /// A receipt item was given a quantity of zero.
    #[error("the item \"{0}\" must have a quantity of at least one")]
    InvalidQuantity(String),

    /// A sum or product of amounts was too large to represent.
    #[error("the amounts involved are too large to add up")]
    AmountOverflow,

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Tried to delete an income or expense that does not exist.
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// The persistence layer failed.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("a data access error occurred: {0}")]
    DataAccessError(String),

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// A response body could not be buffered for logging.
    #[error("could not read the response body: {0}")]
    ResponseBodyError(String),

    /// A session token could not be serialized.
    #[error("could not serialize the session token: {0}")]
    TokenSerializationError(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::DataAccessError(error.to_string())
            }
        }
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Error::InvalidRequest(rejection.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Error::InvalidRequest(rejection.body_text())
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::InvalidRequest(rejection.body_text())
    }
}

/// The JSON body sent to the client when a request fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// A short, human-readable description of what went wrong.
    pub error: String,
}

impl Error {
    /// The HTTP status code the error is reported with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidRange { .. }
            | Error::InvalidRequest(_)
            | Error::NegativeAmount(_)
            | Error::InvalidRecurrenceEnd { .. }
            | Error::EmptyReceipt
            | Error::InvalidQuantity(_)
            | Error::AmountOverflow => StatusCode::BAD_REQUEST,
            Error::Unauthorized => StatusCode::UNAUTHORIZED,
            Error::NotFound | Error::DeleteMissingTransaction => StatusCode::NOT_FOUND,
            Error::DataAccessError(_)
            | Error::DatabaseLockError
            | Error::InvalidTimezoneError(_)
            | Error::ResponseBodyError(_)
            | Error::TokenSerializationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let error = if status.is_server_error() {
            // Server-side details are not intended to be shown to the client.
            tracing::error!("An unexpected error occurred: {}", self);
            "An unexpected error occurred, check the server logs for more details.".to_owned()
        } else {
            self.to_string()
        };

        (status, Json(ErrorBody { error })).into_response()
    }
}

#[cfg(test)]
mod error_tests {
    use axum::{http::StatusCode, response::IntoResponse};
    use time::macros::date;

    use crate::{Error, ErrorBody};

    async fn into_error_body(error: Error) -> (StatusCode, ErrorBody) {
        let response = error.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("could not read response body");
        let body = serde_json::from_slice(&bytes).expect("response body was not an error body");

        (status, body)
    }

    #[tokio::test]
    async fn invalid_range_is_bad_request() {
        let (status, body) = into_error_body(Error::InvalidRange {
            start: date!(2024 - 03 - 01),
            end: date!(2024 - 01 - 01),
        })
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body.error,
            "the start date 2024-03-01 is after the end date 2024-01-01"
        );
    }

    #[tokio::test]
    async fn unauthorized_is_401() {
        let (status, _) = into_error_body(Error::Unauthorized).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn data_access_error_hides_details() {
        let (status, body) =
            into_error_body(Error::DataAccessError("no such table: income".to_owned())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(
            !body.error.contains("income"),
            "internal details leaked to client: {}",
            body.error
        );
    }

    #[tokio::test]
    async fn response_body_error_is_internal_server_error() {
        let (status, body) =
            into_error_body(Error::ResponseBodyError("stream closed".to_owned())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.error.contains("stream closed"));
    }

    #[tokio::test]
    async fn amount_overflow_is_bad_request() {
        let (status, body) = into_error_body(Error::AmountOverflow).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "the amounts involved are too large to add up");
    }

    #[test]
    fn no_rows_maps_to_not_found() {
        assert_eq!(
            Error::from(rusqlite::Error::QueryReturnedNoRows),
            Error::NotFound
        );
    }

    #[test]
    fn other_sql_errors_map_to_data_access_error() {
        let error = Error::from(rusqlite::Error::InvalidQuery);

        assert!(matches!(error, Error::DataAccessError(_)));
    }
}
