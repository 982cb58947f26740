use std::sync::Arc;

use axum::{
    http::{HeaderMap, Method, Uri},
    response::{IntoResponse, Response},
    Json,
};

use crate::web::{log, types::MessageBody, Error, REQUEST_ID_HEADER};

/// Turns an `Error` stashed in the response extensions into the status code and
/// `{"message": ...}` body the caller gets to see, and logs the request.
pub async fn response_mapper(
    req_method: Method,
    uri: Uri,
    headers: HeaderMap,
    resp: Response,
) -> Response {
    // Set on the request by `SetRequestIdLayer`
    let req_id = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|id| id.to_str().ok())
        .unwrap_or_default();

    let web_error = resp.extensions().get::<Arc<Error>>().map(Arc::as_ref);
    let client_status_and_error = web_error.map(Error::status_code_and_client_error);

    log::log_request(
        req_id,
        &req_method,
        &uri,
        client_status_and_error
            .as_ref()
            .map(|(status, _)| *status)
            .unwrap_or(resp.status()),
        web_error,
        client_status_and_error.as_ref().map(|(_, cl_err)| cl_err),
    );

    match client_status_and_error {
        Some((status, cl_err)) => {
            (status, Json(MessageBody::new(cl_err.to_string()))).into_response()
        }
        None => resp,
    }
}
