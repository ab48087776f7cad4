use crate::collector::{FieldError, SubmitError};
use axum::{http::StatusCode, Json};
use serde::Serialize;

/// Failure to write the state file.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("failed to serialize state: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write state file: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
    pub fields: Vec<FieldError>,
}

#[derive(Serialize)]
struct FieldErrorBody<'a> {
    error: &'a str,
    fields: &'a [FieldError],
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
            fields: Vec::new(),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        Self::internal(err)
    }
}

impl From<SubmitError> for AppError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::Invalid(invalid) => Self {
                status: StatusCode::BAD_REQUEST,
                message: invalid.to_string(),
                fields: invalid.fields,
            },
            SubmitError::Storage(storage) => storage.into(),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        if self.fields.is_empty() {
            return (self.status, self.message).into_response();
        }

        let body = FieldErrorBody {
            error: &self.message,
            fields: &self.fields,
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Activity, AppData, Category};
    use crate::storage::{ActivityStore, StateBackend};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    struct ReadOnlyBackend;

    #[async_trait]
    impl StateBackend for ReadOnlyBackend {
        async fn load(&self) -> AppData {
            AppData::default()
        }

        async fn save(&self, _data: &AppData) -> Result<(), StorageError> {
            Err(io::Error::other("read-only volume").into())
        }
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn failed_persist_is_logged_once() {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let _default = tracing::subscriber::set_default(subscriber);

        let store = ActivityStore::with_data(Arc::new(ReadOnlyBackend), AppData::default());
        let err = store
            .append(Activity {
                name: "Commute".into(),
                category: Category::Transportation,
                carbon_value: 2.5,
                date: Utc::now(),
            })
            .await
            .unwrap_err();
        let app_err = AppError::from(err);
        assert_eq!(app_err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(app_err.message.contains("read-only volume"));

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert_eq!(output.matches("read-only volume").count(), 1, "{output}");
    }
}
