//! HTTP error responses for the web adapter.

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::domain::error::VaultexError;

#[derive(Debug)]
pub struct WebError {
    pub status: StatusCode,
    pub message: String,
}

impl WebError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<VaultexError> for WebError {
    fn from(err: VaultexError) -> Self {
        let status = match &err {
            VaultexError::ConfigMissing { .. }
            | VaultexError::ConfigInvalid { .. }
            | VaultexError::ConfigParse { .. } => StatusCode::BAD_REQUEST,
            VaultexError::InvalidOrder { .. }
            | VaultexError::InsufficientFunds { .. }
            | VaultexError::InsufficientPosition { .. }
            | VaultexError::FundingOutOfRange { .. }
            | VaultexError::NoData { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            VaultexError::QuoteFetch { .. } | VaultexError::NewsFetch { .. } => {
                StatusCode::BAD_GATEWAY
            }
            VaultexError::HttpClient { .. } | VaultexError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let template = super::templates::ErrorTemplate {
            message: &self.message,
            status: self.status.as_u16(),
        };
        match template.render() {
            Ok(html) => (self.status, Html(html)).into_response(),
            Err(_) => (self.status, self.message).into_response(),
        }
    }
}
