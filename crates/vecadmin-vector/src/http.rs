//! Response handling shared by both clients

use reqwest::Response;
use serde::de::DeserializeOwned;
use vecadmin_core::{Result, VecAdminError};

/// Map a send failure to `Transport`
pub(crate) fn transport_error(url: &str, err: reqwest::Error) -> VecAdminError {
    VecAdminError::Transport {
        url: url.to_string(),
        message: err.to_string(),
    }
}

/// Read the body of a response, failing with `Remote` on status >= 400
///
/// `message` turns the raw error body into the text carried by the error.
pub(crate) async fn read_body(
    url: &str,
    response: Response,
    message: impl FnOnce(String) -> String,
) -> Result<String> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| transport_error(url, e))?;

    if status.is_client_error() || status.is_server_error() {
        return Err(VecAdminError::remote(url, status.as_u16(), message(body)));
    }

    Ok(body)
}

/// Parse a success body as JSON
pub(crate) fn decode<T: DeserializeOwned>(url: &str, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| VecAdminError::decode(url, e))
}
