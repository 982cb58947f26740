use axum::{
    body::Bytes,
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap, Method, StatusCode},
    Json,
};
use tracing::{error, info, warn};

use crate::{
    app::StoreInitError,
    store::{StoreError, EMAILS_COLLECTION},
    web::{
        types::{DataParsingError, DeserSubmission, MessageBody, ValidEmail},
        WebResult,
    },
    AppState,
};

// ###################################
// ->   ERROR
// ###################################
#[derive(Debug, thiserror::Error)]
pub enum SubmitFormError {
    #[error("method not allowed: {0}, only POST is accepted")]
    MethodNotAllowed(Method),

    #[error("data parsing error: {0}")]
    DataParsing(#[from] DataParsingError),

    #[error("store initialization error: {0}")]
    StoreInit(#[from] StoreInitError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

// ###################################
// ->   API
// ###################################
/// Validates the submitted email and appends it to the `emails` collection.
/// The same email submitted twice is stored twice.
#[tracing::instrument(name = "Submitting a signup email", skip(app_state, headers, body))]
pub async fn submit_form(
    State(app_state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> WebResult<(StatusCode, Json<MessageBody>)> {
    if method != Method::POST {
        warn!("{:<20} - Rejecting {method} request", "submit_form");
        return Err(SubmitFormError::MethodNotAllowed(method).into());
    }

    let content_type = headers.get(CONTENT_TYPE).and_then(|ct| ct.to_str().ok());
    let email = parse_email(content_type, &body).map_err(SubmitFormError::DataParsing)?;
    info!("{:<20} - Received email for signup: {}", "submit_form", email.as_ref());

    let store_client = app_state
        .store_client()
        .await
        .map_err(SubmitFormError::StoreInit)?;

    let document = store_client
        .add_document(EMAILS_COLLECTION, [("email", email.as_ref())])
        .await
        .map_err(|er| {
            error!(
                error = %er,
                "{:<20} - Critical failure while saving the email to the store",
                "submit_form"
            );
            SubmitFormError::Store(er)
        })?;

    info!(
        "{:<20} - Saved email {} as: {}",
        "submit_form",
        email.as_ref(),
        document.name
    );

    Ok((
        StatusCode::OK,
        Json(MessageBody::new("Email saved successfully")),
    ))
}

// ###################################
// ->   HELPERS
// ###################################
/// Parses the body and validates the email, logging why a submission got rejected.
fn parse_email(content_type: Option<&str>, body: &[u8]) -> Result<ValidEmail, DataParsingError> {
    let res = DeserSubmission::from_body(content_type, body).and_then(ValidEmail::try_from);

    match &res {
        Err(DataParsingError::EmailMissing) => {
            warn!(
                "{:<20} - The request body is missing or the email is empty",
                "submit_form"
            )
        }
        Err(DataParsingError::EmailInvalid(email)) => {
            warn!("{:<20} - Invalid email format received: {email}", "submit_form")
        }
        Ok(_) => {}
    }

    res
}
