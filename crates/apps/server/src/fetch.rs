//! Outbound JSON plumbing shared by the provider adapters.

use bytes::Bytes;
use routes::ProviderError;
use serde::de::DeserializeOwned;
use url::Url;

/// `base` with `path` appended to whatever path it already carries.
pub fn endpoint(base: &Url, path: &str) -> Url {
    let mut url = base.clone();
    let joined = format!(
        "{}/{}",
        base.path().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    url.set_path(&joined);
    url
}

pub fn transport(err: reqwest::Error) -> ProviderError {
    ProviderError::Transport(err.to_string())
}

pub fn decode<T: DeserializeOwned>(body: &Bytes) -> Result<T, ProviderError> {
    serde_json::from_slice(body).map_err(|e| ProviderError::Malformed(e.to_string()))
}

/// GET `url` and decode a 2xx JSON body.
pub async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: Url,
) -> Result<T, ProviderError> {
    let resp = client.get(url).send().await.map_err(transport)?;
    if !resp.status().is_success() {
        return Err(ProviderError::Status(resp.status().as_u16()));
    }
    let body = resp.bytes().await.map_err(transport)?;
    decode(&body)
}
