// API client module: contains a small blocking HTTP client that talks to
// the Reverb marketplace API. It is intentionally small and synchronous;
// one request is in flight at a time and failures carry the server's raw
// status and body.

use anyhow::{Context, Result};
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use crate::errors::{CloneError, UploadError};
use crate::models::{DraftListing, DraftPayload, PhotoRef, SourceListing};

/// Production API root; override with `REVERB_API_URL` to point at a
/// sandbox.
pub const DEFAULT_BASE_URL: &str = "https://api.reverb.com/api";

/// Version pin the listing endpoints require.
const ACCEPT_VERSION: &str = "3.0";
/// Reverb answers with hal+json hypermedia documents.
const HAL_JSON: &str = "application/hal+json";

/// Generous ceiling; photo downloads can be several megabytes.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Where the client points and what it authenticates with. The token is
/// collected interactively and lives only as long as the process.
// No Debug derive: the token must never end up in debug output.
#[derive(Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub token: String,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        ApiConfig {
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    /// Configuration from the environment variable `REVERB_API_URL` or
    /// fallback to the production API root.
    pub fn from_env(token: impl Into<String>) -> Self {
        let base_url =
            std::env::var("REVERB_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        ApiConfig::new(base_url, token)
    }
}

/// The listing operations the clone pipeline runs against. `ReverbClient`
/// is the live implementation; tests substitute recording fakes.
pub trait MarketplaceApi {
    /// Read one listing's metadata.
    fn fetch_listing(&self, listing_id: &str) -> Result<SourceListing, CloneError>;

    /// Read a listing's photo references. Used when the listing document
    /// itself embeds none.
    fn listing_photos(&self, listing_id: &str) -> Result<Vec<PhotoRef>, CloneError>;

    /// Create a draft listing and return its server-assigned identity.
    fn create_draft(&self, payload: &DraftPayload) -> Result<DraftListing, CloneError>;

    /// Download one photo's bytes from its CDN URL.
    fn download_photo(&self, url: &str) -> Result<Vec<u8>, UploadError>;
}

/// Blocking client for the Reverb API. Holds the reqwest client, the base
/// URL and the ready-made Authorization header. Cheap to clone, so the
/// upload strategies share it.
#[derive(Clone)]
pub struct ReverbClient {
    client: Client,
    base_url: String,
    auth: HeaderValue,
}

impl ReverbClient {
    /// Build a client from the given configuration. Fails when the token
    /// contains bytes that cannot travel in an HTTP header.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.token))
            .context("API token contains characters that cannot be sent in a header")?;
        // Keeps the credential out of any request traces.
        auth.set_sensitive(true);

        let client = Client::builder()
            .user_agent(concat!("reverb-draft-cli/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(ReverbClient {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth,
        })
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn http(&self) -> &Client {
        &self.client
    }

    /// Authorization plus the version pin; every call to the API proper
    /// carries these.
    pub(crate) fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, self.auth.clone());
        headers.insert("Accept-Version", HeaderValue::from_static(ACCEPT_VERSION));
        headers
    }

    /// Header set for the metadata endpoints, which also want the hal+json
    /// Accept header.
    fn metadata_headers(&self) -> HeaderMap {
        let mut headers = self.auth_headers();
        headers.insert(ACCEPT, HeaderValue::from_static(HAL_JSON));
        headers
    }
}

impl MarketplaceApi for ReverbClient {
    fn fetch_listing(&self, listing_id: &str) -> Result<SourceListing, CloneError> {
        let url = self.endpoint(&format!("/listings/{}", listing_id));
        let res = self
            .client
            .get(&url)
            .headers(self.metadata_headers())
            .send()?;
        if !res.status().is_success() {
            return Err(fetch_error(res));
        }
        Ok(res.json()?)
    }

    fn listing_photos(&self, listing_id: &str) -> Result<Vec<PhotoRef>, CloneError> {
        let url = self.endpoint(&format!("/listings/{}/images", listing_id));
        let res = self
            .client
            .get(&url)
            .headers(self.metadata_headers())
            .send()?;
        if !res.status().is_success() {
            return Err(fetch_error(res));
        }
        let list: PhotoList = res.json()?;
        Ok(list.photos)
    }

    fn create_draft(&self, payload: &DraftPayload) -> Result<DraftListing, CloneError> {
        let url = self.endpoint("/listings");
        let res = self
            .client
            .post(&url)
            .headers(self.metadata_headers())
            .json(payload)
            .send()?;
        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().unwrap_or_else(|_| "".into());
            return Err(CloneError::DraftCreation { status, body });
        }
        let value: Value = res.json()?;
        match draft_id_from_response(&value) {
            Some(id) => Ok(DraftListing { id }),
            None => Err(CloneError::DraftIdMissing {
                body: value.to_string(),
            }),
        }
    }

    fn download_photo(&self, url: &str) -> Result<Vec<u8>, UploadError> {
        // Photo URLs point at the CDN; no auth or version headers here.
        let mut res = self.client.get(url).send().map_err(UploadError::other)?;
        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().unwrap_or_else(|_| "".into());
            return Err(UploadError::http(status, body));
        }
        let mut bytes = Vec::new();
        res.copy_to(&mut bytes).map_err(UploadError::other)?;
        Ok(bytes)
    }
}

/// Shape of `GET /listings/{id}/images`.
#[derive(Deserialize)]
struct PhotoList {
    #[serde(default)]
    photos: Vec<PhotoRef>,
}

fn fetch_error(res: Response) -> CloneError {
    let status = res.status().as_u16();
    let body = res.text().unwrap_or_else(|_| "".into());
    CloneError::Fetch { status, body }
}

/// The create endpoint answers with `{"id": ...}` in some deployments and
/// `{"listing": {"id": ...}}` in others; the top-level field wins when both
/// are present. Ids arrive as numbers or strings.
fn draft_id_from_response(value: &Value) -> Option<String> {
    value
        .get("id")
        .and_then(id_as_string)
        .or_else(|| value.pointer("/listing/id").and_then(id_as_string))
}

pub(crate) fn id_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn draft_id_prefers_the_top_level_field() {
        let both = json!({ "id": 111, "listing": { "id": 222 } });
        assert_eq!(draft_id_from_response(&both), Some("111".into()));
    }

    #[test]
    fn draft_id_falls_back_to_the_nested_listing() {
        let nested = json!({ "listing": { "id": "333" } });
        assert_eq!(draft_id_from_response(&nested), Some("333".into()));
    }

    #[test]
    fn draft_ids_may_be_numbers_or_strings() {
        assert_eq!(
            draft_id_from_response(&json!({ "id": 123456 })),
            Some("123456".into())
        );
        assert_eq!(
            draft_id_from_response(&json!({ "id": "123456" })),
            Some("123456".into())
        );
    }

    #[test]
    fn missing_draft_ids_are_detected() {
        assert_eq!(draft_id_from_response(&json!({ "message": "created" })), None);
        assert_eq!(draft_id_from_response(&json!({ "id": null })), None);
        assert_eq!(draft_id_from_response(&json!({ "id": "" })), None);
    }

    #[test]
    fn the_photo_list_tolerates_a_missing_photos_key() {
        let list: PhotoList = serde_json::from_value(json!({})).unwrap();
        assert!(list.photos.is_empty());

        let list: PhotoList = serde_json::from_value(json!({
            "photos": [ { "_links": { "full": { "href": "https://x/y.jpg" } } } ]
        }))
        .unwrap();
        assert_eq!(list.photos.len(), 1);
    }

    #[test]
    fn endpoints_join_cleanly_around_trailing_slashes() {
        let client =
            ReverbClient::new(&ApiConfig::new("https://api.example.com/api/", "token")).unwrap();
        assert_eq!(
            client.endpoint("/listings"),
            "https://api.example.com/api/listings"
        );
    }

    #[test]
    fn tokens_with_control_characters_are_rejected() {
        assert!(ReverbClient::new(&ApiConfig::new(DEFAULT_BASE_URL, "bad\ntoken")).is_err());
    }
}
