use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use strum_macros::AsRefStr;

use super::routes::SubmitFormError;
use crate::app::StoreInitError;

pub type WebResult<T> = core::result::Result<T, Error>;

#[derive(Debug, AsRefStr, thiserror::Error)]
pub enum Error {
    #[error("submit form error: {0}")]
    SubmitForm(#[from] SubmitFormError),
}

impl Error {
    pub fn status_code_and_client_error(&self) -> (StatusCode, ClientError) {
        match self {
            Error::SubmitForm(sf_er) => match sf_er {
                SubmitFormError::MethodNotAllowed(_) => {
                    (StatusCode::METHOD_NOT_ALLOWED, ClientError::MethodNotAllowed)
                }
                SubmitFormError::DataParsing(data_er) => {
                    use super::types::DataParsingError::*;
                    match data_er {
                        EmailMissing => (StatusCode::BAD_REQUEST, ClientError::EmailRequired),
                        EmailInvalid(_) => {
                            (StatusCode::BAD_REQUEST, ClientError::InvalidEmailFormat)
                        }
                    }
                }
                SubmitFormError::StoreInit(StoreInitError::MissingServiceAccountKey) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ClientError::MissingServiceAccountKey,
                ),
                SubmitFormError::StoreInit(StoreInitError::Store(_))
                | SubmitFormError::Store(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, ClientError::ServiceError)
                }
            },
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        tracing::debug!("{:<20} - into_response(Error: {self:?})", "INTO_RESP");

        // Construct a response
        let mut res = StatusCode::INTERNAL_SERVER_ERROR.into_response();

        // Insert the Error into response so that it can be retrieved later.
        res.extensions_mut().insert(Arc::new(self));

        res
    }
}

/// The errors the caller gets to see. The `Display` output is the response `message`.
#[derive(Debug, AsRefStr, derive_more::Display)]
pub enum ClientError {
    #[display("Method Not Allowed")]
    MethodNotAllowed,
    #[display("Email is required")]
    EmailRequired,
    #[display("Invalid email format")]
    InvalidEmailFormat,
    #[display("Firebase service account key is missing.")]
    MissingServiceAccountKey,
    #[display("Internal Server Error")]
    ServiceError,
}
