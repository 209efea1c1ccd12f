//! Conversions from external infrastructure errors into domain errors.

use keystay_common::StorageError;
use keystay_domain::KeystayError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub KeystayError);

impl From<InfraError> for KeystayError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<KeystayError> for InfraError {
    fn from(value: KeystayError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoKeystayError {
    fn into_keystay(self) -> KeystayError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → KeystayError */
/* -------------------------------------------------------------------------- */

impl IntoKeystayError for SqlError {
    fn into_keystay(self) -> KeystayError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => {
                        KeystayError::Database("database is busy".into())
                    }
                    (ErrorCode::DatabaseLocked, _) => {
                        KeystayError::Database("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 1555) | (ErrorCode::ConstraintViolation, 2067) => {
                        KeystayError::Database("unique constraint violation".into())
                    }
                    (ErrorCode::ConstraintViolation, 787) => {
                        KeystayError::Database("foreign key constraint violation".into())
                    }
                    _ => KeystayError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => KeystayError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                KeystayError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                KeystayError::Database(format!("invalid column type: {ty}"))
            }
            RE::InvalidQuery => KeystayError::Database("invalid SQL query".into()),
            other => KeystayError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_keystay())
    }
}

/* -------------------------------------------------------------------------- */
/* StorageError → KeystayError */
/* -------------------------------------------------------------------------- */

impl IntoKeystayError for StorageError {
    fn into_keystay(self) -> KeystayError {
        match self {
            StorageError::Rusqlite(err) => err.into_keystay(),
            StorageError::Timeout(secs) => {
                KeystayError::Database(format!("connection timeout after {secs}s"))
            }
            other => KeystayError::Database(other.to_string()),
        }
    }
}

impl From<StorageError> for InfraError {
    fn from(value: StorageError) -> Self {
        InfraError(value.into_keystay())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → KeystayError */
/* -------------------------------------------------------------------------- */

impl IntoKeystayError for HttpError {
    fn into_keystay(self) -> KeystayError {
        if self.is_timeout() {
            return KeystayError::FeedFetch("feed request timed out".into());
        }

        if self.is_connect() {
            return KeystayError::FeedFetch("feed connection failure".into());
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            return KeystayError::FeedFetch(format!(
                "HTTP {} {}",
                code,
                status.canonical_reason().unwrap_or("unknown status")
            ));
        }

        KeystayError::FeedFetch(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_keystay())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use rusqlite::ffi::{Error as FfiError, ErrorCode};
    use rusqlite::Error as SqlError;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[test]
    fn sqlite_busy_maps_to_database_error() {
        let err = SqlError::SqliteFailure(
            FfiError { code: ErrorCode::DatabaseBusy, extended_code: 5 },
            Some("database is locked".into()),
        );

        let mapped: KeystayError = InfraError::from(err).into();
        match mapped {
            KeystayError::Database(msg) => {
                assert!(msg.contains("busy") || msg.contains("locked"));
            }
            other => panic!("expected database error, got {other:?}"),
        }
    }

    #[test]
    fn no_rows_maps_to_not_found() {
        let mapped: KeystayError = InfraError::from(SqlError::QueryReturnedNoRows).into();
        assert!(matches!(mapped, KeystayError::NotFound(_)));
    }

    #[test]
    fn storage_timeout_maps_to_database_error() {
        let mapped: KeystayError = InfraError::from(StorageError::Timeout(5)).into();
        match mapped {
            KeystayError::Database(msg) => assert!(msg.contains("timeout")),
            other => panic!("expected database error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn http_status_500_maps_to_feed_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        let error =
            client.get(server.uri()).send().await.unwrap().error_for_status().unwrap_err();

        let mapped: KeystayError = InfraError::from(error).into();
        match mapped {
            KeystayError::FeedFetch(msg) => assert!(msg.contains("500")),
            other => panic!("expected feed fetch error, got {other:?}"),
        }
    }
}
