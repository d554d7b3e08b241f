// Photo upload strategies. Reverb's photo endpoints are not pinned down by
// public documentation (the per-draft images endpoint has been seen
// answering 404), so the transfer step hides behind one small trait and the
// wire contract can be swapped without touching the clone loop.

use reqwest::blocking::{multipart, Response};
use serde_json::{json, Value};

use crate::api::{id_as_string, ReverbClient};
use crate::errors::UploadError;

/// One photo transfer. Implementations receive the raw bytes, a filename
/// for the multipart part and the draft the photo belongs to.
pub trait PhotoUploader {
    fn upload(&self, photo: &[u8], filename: &str, draft_id: &str) -> Result<(), UploadError>;
}

/// Which wire contract to use for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStrategy {
    /// Single multipart POST straight to the per-draft images endpoint.
    Direct,
    /// Upload the bytes first, then associate the returned photo id with
    /// the draft in a second call.
    TwoStep,
}

impl UploadStrategy {
    /// Strategy from the environment variable `REVERB_UPLOAD_STRATEGY`;
    /// direct unless it says otherwise.
    pub fn from_env() -> Self {
        Self::from_env_value(std::env::var("REVERB_UPLOAD_STRATEGY").ok().as_deref())
    }

    fn from_env_value(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("two-step") | Some("two_step") | Some("twostep") => UploadStrategy::TwoStep,
            _ => UploadStrategy::Direct,
        }
    }
}

/// Build the uploader for the selected strategy on top of a shared client.
pub fn uploader_for(strategy: UploadStrategy, api: ReverbClient) -> Box<dyn PhotoUploader> {
    match strategy {
        UploadStrategy::Direct => Box::new(DirectUploader::new(api)),
        UploadStrategy::TwoStep => Box::new(TwoStepUploader::new(api)),
    }
}

/// Default contract: `POST /listings/{draft_id}/images` with the photo as
/// a multipart `photo` field.
pub struct DirectUploader {
    api: ReverbClient,
}

impl DirectUploader {
    pub fn new(api: ReverbClient) -> Self {
        DirectUploader { api }
    }
}

impl PhotoUploader for DirectUploader {
    fn upload(&self, photo: &[u8], filename: &str, draft_id: &str) -> Result<(), UploadError> {
        let url = self.api.endpoint(&format!("/listings/{}/images", draft_id));
        let form = multipart::Form::new().part("photo", photo_part(photo, filename)?);
        let res = self
            .api
            .http()
            .post(&url)
            .headers(self.api.auth_headers())
            .multipart(form)
            .send()
            .map_err(UploadError::other)?;
        check_upload_response(res)
    }
}

/// Alternate contract: `POST /photos` with the bytes, then bind the
/// returned photo id to the draft via `POST /listings/{draft_id}/photos`.
pub struct TwoStepUploader {
    api: ReverbClient,
}

impl TwoStepUploader {
    pub fn new(api: ReverbClient) -> Self {
        TwoStepUploader { api }
    }

    fn upload_bytes(&self, photo: &[u8], filename: &str) -> Result<String, UploadError> {
        let url = self.api.endpoint("/photos");
        let form = multipart::Form::new().part("file", photo_part(photo, filename)?);
        let res = self
            .api
            .http()
            .post(&url)
            .headers(self.api.auth_headers())
            .multipart(form)
            .send()
            .map_err(UploadError::other)?;
        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().unwrap_or_else(|_| "".into());
            return Err(UploadError::http(status, body));
        }
        let value: Value = res.json().map_err(UploadError::other)?;
        photo_id_from_response(&value).ok_or_else(|| {
            UploadError::other(format!("photo id not returned by the API: {}", value))
        })
    }

    fn associate(&self, photo_id: &str, draft_id: &str) -> Result<(), UploadError> {
        let url = self.api.endpoint(&format!("/listings/{}/photos", draft_id));
        let res = self
            .api
            .http()
            .post(&url)
            .headers(self.api.auth_headers())
            .json(&json!({ "photo_id": photo_id }))
            .send()
            .map_err(UploadError::other)?;
        check_upload_response(res)
    }
}

impl PhotoUploader for TwoStepUploader {
    fn upload(&self, photo: &[u8], filename: &str, draft_id: &str) -> Result<(), UploadError> {
        let photo_id = self.upload_bytes(photo, filename)?;
        self.associate(&photo_id, draft_id)
    }
}

fn photo_part(photo: &[u8], filename: &str) -> Result<multipart::Part, UploadError> {
    multipart::Part::bytes(photo.to_vec())
        .file_name(filename.to_string())
        .mime_str(content_type_for(filename))
        .map_err(UploadError::other)
}

fn check_upload_response(res: Response) -> Result<(), UploadError> {
    if res.status().is_success() {
        return Ok(());
    }
    let status = res.status().as_u16();
    let body = res.text().unwrap_or_else(|_| "".into());
    Err(UploadError::http(status, body))
}

/// Content type from the file extension. The accepted photo formats are
/// png/jpg/jpeg; anything else goes up as a generic byte stream.
pub(crate) fn content_type_for(filename: &str) -> &'static str {
    let ext = filename.rsplit('.').next().map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

/// Same dual-shape dance as draft creation: some replies nest the photo
/// object, some return it bare.
fn photo_id_from_response(value: &Value) -> Option<String> {
    value
        .get("id")
        .and_then(id_as_string)
        .or_else(|| value.pointer("/photo/id").and_then(id_as_string))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn content_types_follow_the_extension() {
        assert_eq!(content_type_for("amp.png"), "image/png");
        assert_eq!(content_type_for("amp.jpg"), "image/jpeg");
        assert_eq!(content_type_for("amp.jpeg"), "image/jpeg");
        assert_eq!(content_type_for("AMP.JPG"), "image/jpeg");
        assert_eq!(content_type_for("notes.txt"), "application/octet-stream");
        assert_eq!(content_type_for("no-extension"), "application/octet-stream");
    }

    #[test]
    fn photo_ids_come_from_either_response_shape() {
        assert_eq!(photo_id_from_response(&json!({ "id": 7 })), Some("7".into()));
        assert_eq!(
            photo_id_from_response(&json!({ "photo": { "id": "abc" } })),
            Some("abc".into())
        );
        assert_eq!(
            photo_id_from_response(&json!({ "id": 1, "photo": { "id": 2 } })),
            Some("1".into())
        );
        assert_eq!(photo_id_from_response(&json!({ "ok": true })), None);
    }

    #[test]
    fn strategy_selection_defaults_to_direct() {
        assert_eq!(UploadStrategy::from_env_value(None), UploadStrategy::Direct);
        assert_eq!(
            UploadStrategy::from_env_value(Some("two-step")),
            UploadStrategy::TwoStep
        );
        assert_eq!(
            UploadStrategy::from_env_value(Some("TWO_STEP")),
            UploadStrategy::TwoStep
        );
        assert_eq!(
            UploadStrategy::from_env_value(Some("direct")),
            UploadStrategy::Direct
        );
        assert_eq!(
            UploadStrategy::from_env_value(Some("anything else")),
            UploadStrategy::Direct
        );
    }
}
