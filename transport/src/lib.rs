//! HTTP transport for the remote document store.
//!
//! The store has no per-field update endpoint: every write resends the complete
//! document as one multipart form (one part per slot field plus the anti-forgery
//! field). Reads return the current field values together with a fresh session
//! token.
//!
//! # Wire format
//!
//! | Operation | Request | Response |
//! |-----------|---------|----------|
//! | fetch | `GET {endpoint}` with `Accept: application/json` | `{"token": "...", "fields": {"name": "text", ...}}` |
//! | save | `POST {endpoint}` multipart form, one text part per field | any 2xx or 3xx is success |
//!
//! Redirects are never followed: a CMS typically answers a successful form POST
//! with a 302 back to the edit page, and that redirect *is* the success signal.
//!
//! # Failure classification
//!
//! [`TransportError`] separates "could not reach the server" from "the server
//! answered and refused", so callers can phrase the notice (and decide on a
//! retry) accordingly.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{ACCEPT, HeaderValue};
use reqwest::multipart::Form;
use serde::Deserialize;
use slotedit_types::{FieldMap, excerpt};
use thiserror::Error;

const CONNECT_TIMEOUT_SECS: u64 = 10;
const REQUEST_TIMEOUT_SECS: u64 = 30;
const MAX_ERROR_BODY_BYTES: usize = 16 * 1024;
const ERROR_DETAIL_CHARS: usize = 160;

#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection refused, DNS failure, timeout: nothing reached the server.
    #[error("server unreachable: {message}")]
    Unreachable { message: String },
    /// The server answered with a non-success, non-redirect status.
    #[error("server rejected the request ({status}): {detail}")]
    Rejected { status: u16, detail: String },
    /// The server answered 2xx but the body was not a document.
    #[error("malformed server response: {message}")]
    Malformed { message: String },
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl TransportError {
    /// Whether retrying the same request later could plausibly succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            TransportError::Unreachable { .. } => true,
            TransportError::Rejected { status, .. } => {
                matches!(*status, 408 | 425 | 429 | 500..=599)
            }
            TransportError::Malformed { .. } | TransportError::Client(_) => false,
        }
    }

    /// One-line notice suitable for a toast.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            TransportError::Unreachable { .. } => {
                "Could not reach the server. Check your connection and try again.".to_string()
            }
            TransportError::Rejected { status, detail } if detail.is_empty() => {
                format!("The server rejected the save (HTTP {status}).")
            }
            TransportError::Rejected { status, detail } => {
                format!("The server rejected the save (HTTP {status}): {detail}")
            }
            TransportError::Malformed { .. } => {
                "The server sent an unexpected response.".to_string()
            }
            TransportError::Client(_) => "The HTTP client could not be initialised.".to_string(),
        }
    }

    fn from_send(err: &reqwest::Error) -> Self {
        TransportError::Unreachable {
            message: err.to_string(),
        }
    }
}

/// A document as fetched from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedDocument {
    /// Anti-forgery token required on every subsequent write.
    pub session_token: String,
    /// Current server-side field values, keyed by form field name.
    pub fields: FieldMap,
}

/// Proof that a write was conclusively accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostReceipt {
    pub status: u16,
}

#[derive(Deserialize)]
struct DocumentBody {
    token: String,
    #[serde(default)]
    fields: FieldMap,
}

/// Success for a document write: any 2xx, or a redirect.
#[must_use]
pub fn is_accepted(status: StatusCode) -> bool {
    status.is_success() || status.is_redirection()
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(TransportError::Client)?;
        Ok(Self { client })
    }

    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Fetch the current document and a fresh session token.
    pub async fn fetch_document(&self, endpoint: &str) -> Result<FetchedDocument, TransportError> {
        tracing::debug!(endpoint, "Fetching document");
        let response = self
            .client
            .get(endpoint)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .send()
            .await
            .map_err(|e| TransportError::from_send(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = read_capped_error_body(response).await;
            return Err(TransportError::Rejected {
                status: status.as_u16(),
                detail: excerpt(&body, ERROR_DETAIL_CHARS),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::from_send(&e))?;
        let body: DocumentBody =
            serde_json::from_slice(&bytes).map_err(|e| TransportError::Malformed {
                message: e.to_string(),
            })?;
        if body.token.trim().is_empty() {
            return Err(TransportError::Malformed {
                message: "empty session token".to_string(),
            });
        }

        Ok(FetchedDocument {
            session_token: body.token,
            fields: body.fields,
        })
    }

    /// Write the complete document.
    ///
    /// `fields` must already contain every slot field and the anti-forgery field.
    pub async fn post_document(
        &self,
        endpoint: &str,
        fields: &FieldMap,
    ) -> Result<PostReceipt, TransportError> {
        let form = fields
            .iter()
            .fold(Form::new(), |form, (name, value)| {
                form.text(name.clone(), value.clone())
            });

        tracing::debug!(endpoint, field_count = fields.len(), "Posting document");
        let response = self
            .client
            .post(endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| TransportError::from_send(&e))?;

        let status = response.status();
        if is_accepted(status) {
            return Ok(PostReceipt {
                status: status.as_u16(),
            });
        }

        let body = read_capped_error_body(response).await;
        tracing::warn!(status = status.as_u16(), "Document save rejected");
        Err(TransportError::Rejected {
            status: status.as_u16(),
            detail: excerpt(&body, ERROR_DETAIL_CHARS),
        })
    }
}

async fn read_capped_error_body(mut response: reqwest::Response) -> String {
    let mut body = Vec::new();
    while let Ok(Some(chunk)) = response.chunk().await {
        body.extend_from_slice(&chunk);
        if body.len() > MAX_ERROR_BODY_BYTES {
            body.truncate(MAX_ERROR_BODY_BYTES);
            break;
        }
    }
    String::from_utf8_lossy(&body).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepted_statuses() {
        assert!(is_accepted(StatusCode::OK));
        assert!(is_accepted(StatusCode::NO_CONTENT));
        assert!(is_accepted(StatusCode::FOUND));
        assert!(is_accepted(StatusCode::SEE_OTHER));
        assert!(!is_accepted(StatusCode::FORBIDDEN));
        assert!(!is_accepted(StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[test]
    fn transient_classification() {
        let unreachable = TransportError::Unreachable {
            message: "connection refused".into(),
        };
        assert!(unreachable.is_transient());

        let forbidden = TransportError::Rejected {
            status: 403,
            detail: String::new(),
        };
        assert!(!forbidden.is_transient());

        let busy = TransportError::Rejected {
            status: 503,
            detail: String::new(),
        };
        assert!(busy.is_transient());
    }

    #[test]
    fn user_message_names_status() {
        let err = TransportError::Rejected {
            status: 403,
            detail: "CSRF token mismatch".into(),
        };
        assert_eq!(
            err.user_message(),
            "The server rejected the save (HTTP 403): CSRF token mismatch"
        );
    }
}
