// The clone pipeline: validate the listing URL, fetch the source listing,
// create a draft from it, then move photos over one at a time. Photo
// problems are recorded and skipped; everything before the photo loop is
// terminal.

use std::path::PathBuf;

use crate::api::MarketplaceApi;
use crate::errors::CloneError;
use crate::models::{DraftListing, DraftPayload, PhotoRef, UploadResult, UploadStatus};
use crate::upload::PhotoUploader;

/// Path segment that precedes the listing id in a Reverb listing URL.
const ITEM_MARKER: &str = "/item/";

/// Pull the numeric listing id out of a pasted listing URL: the digits
/// right after the `/item/` segment, with the query string and any slug
/// text ignored. `None` when the marker is missing or no digits follow it.
pub fn extract_listing_id(url: &str) -> Option<String> {
    let (_, rest) = url.split_once(ITEM_MARKER)?;
    let rest = rest.split('?').next().unwrap_or(rest);
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    if digits.is_empty() {
        None
    } else {
        Some(digits)
    }
}

/// Where the draft's photos come from, chosen in the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoSource {
    /// Create the draft without photos.
    None,
    /// Re-download the source listing's own photos and upload the copies.
    CopyFromListing,
    /// Upload files picked from disk.
    LocalFiles(Vec<PathBuf>),
}

/// One user-initiated clone action.
#[derive(Debug, Clone)]
pub struct CloneRequest {
    pub listing_url: String,
    pub photos: PhotoSource,
}

/// Severity of one status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Progress,
    Success,
    Warning,
}

/// One human-readable line of pipeline progress, streamed to the caller
/// while the run is underway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub kind: StatusKind,
    pub message: String,
}

impl Status {
    fn progress(message: impl Into<String>) -> Self {
        Status {
            kind: StatusKind::Progress,
            message: message.into(),
        }
    }

    fn success(message: impl Into<String>) -> Self {
        Status {
            kind: StatusKind::Success,
            message: message.into(),
        }
    }

    fn warning(message: impl Into<String>) -> Self {
        Status {
            kind: StatusKind::Warning,
            message: message.into(),
        }
    }
}

/// What a completed run produced. The draft exists even when photos
/// failed; callers decide how loudly to complain about the misses.
#[derive(Debug, Clone)]
pub struct CloneOutcome {
    pub source_id: String,
    pub draft: DraftListing,
    pub uploads: Vec<UploadResult>,
}

impl CloneOutcome {
    /// How many photos did not make it onto the draft.
    pub fn missing_photos(&self) -> usize {
        self.uploads
            .iter()
            .filter(|upload| !upload.status.is_uploaded())
            .count()
    }
}

/// Run the whole clone sequence against `api`, pushing photos through
/// `uploader`. Terminal failures return early; per-photo failures land in
/// the outcome and the loop keeps going. Status lines are emitted in
/// pipeline order.
pub fn run_clone<F>(
    api: &dyn MarketplaceApi,
    uploader: &dyn PhotoUploader,
    request: &CloneRequest,
    mut on_status: F,
) -> Result<CloneOutcome, CloneError>
where
    F: FnMut(Status),
{
    let listing_id = extract_listing_id(&request.listing_url).ok_or_else(|| {
        CloneError::Input(format!(
            "not a Reverb listing URL: {}",
            request.listing_url
        ))
    })?;

    on_status(Status::progress(format!(
        "Fetching listing {} metadata...",
        listing_id
    )));
    let listing = api.fetch_listing(&listing_id)?;

    let payload = DraftPayload::from_listing(&listing);
    on_status(Status::progress("Creating draft listing..."));
    let draft = api.create_draft(&payload)?;
    on_status(Status::success(format!("Draft created! ID: {}", draft.id)));

    let uploads = match &request.photos {
        PhotoSource::None => Vec::new(),
        PhotoSource::CopyFromListing => {
            let refs = if listing.photos.is_empty() {
                api.listing_photos(&listing_id)?
            } else {
                listing.photos
            };
            copy_remote_photos(api, uploader, &draft, &refs, &mut on_status)
        }
        PhotoSource::LocalFiles(paths) => {
            upload_local_photos(uploader, &draft, paths, &mut on_status)
        }
    };

    if uploads.is_empty() {
        on_status(Status::progress(
            "No photos uploaded. You can add them later from Reverb.",
        ));
    }

    Ok(CloneOutcome {
        source_id: listing_id,
        draft,
        uploads,
    })
}

fn copy_remote_photos<F>(
    api: &dyn MarketplaceApi,
    uploader: &dyn PhotoUploader,
    draft: &DraftListing,
    refs: &[PhotoRef],
    on_status: &mut F,
) -> Vec<UploadResult>
where
    F: FnMut(Status),
{
    if refs.is_empty() {
        return Vec::new();
    }
    on_status(Status::progress(format!(
        "Copying {} photo(s) from the source listing...",
        refs.len()
    )));

    let mut results = Vec::with_capacity(refs.len());
    for (index, photo) in refs.iter().enumerate() {
        let result = match photo.full_url() {
            None => {
                on_status(Status::warning(format!(
                    "Photo {}: missing download URL, skipped",
                    index + 1
                )));
                UploadResult {
                    filename: fallback_filename(index),
                    status: UploadStatus::Skipped("missing download URL".into()),
                }
            }
            Some(url) => {
                let filename = filename_from_url(url, index);
                // Bytes live for this iteration only, uploaded or not.
                let status = match api.download_photo(url) {
                    Err(err) => {
                        on_status(Status::warning(format!(
                            "Photo {}: download failed: {}",
                            filename, err
                        )));
                        UploadStatus::from(err)
                    }
                    Ok(bytes) => {
                        attempt_upload(uploader, &bytes, &filename, &draft.id, on_status)
                    }
                };
                UploadResult { filename, status }
            }
        };
        results.push(result);
    }
    results
}

fn upload_local_photos<F>(
    uploader: &dyn PhotoUploader,
    draft: &DraftListing,
    paths: &[PathBuf],
    on_status: &mut F,
) -> Vec<UploadResult>
where
    F: FnMut(Status),
{
    if paths.is_empty() {
        return Vec::new();
    }
    on_status(Status::progress(format!(
        "Uploading {} photo(s)...",
        paths.len()
    )));

    let mut results = Vec::with_capacity(paths.len());
    for (index, path) in paths.iter().enumerate() {
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.to_string())
            .unwrap_or_else(|| fallback_filename(index));
        let status = match std::fs::read(path) {
            Err(err) => {
                on_status(Status::warning(format!(
                    "Photo {}: could not read file: {}",
                    filename, err
                )));
                UploadStatus::Failed {
                    status: None,
                    body: err.to_string(),
                }
            }
            Ok(bytes) => attempt_upload(uploader, &bytes, &filename, &draft.id, on_status),
        };
        results.push(UploadResult { filename, status });
    }
    results
}

fn attempt_upload<F>(
    uploader: &dyn PhotoUploader,
    bytes: &[u8],
    filename: &str,
    draft_id: &str,
    on_status: &mut F,
) -> UploadStatus
where
    F: FnMut(Status),
{
    match uploader.upload(bytes, filename, draft_id) {
        Ok(()) => {
            on_status(Status::success(format!("Uploaded {}", filename)));
            UploadStatus::Uploaded
        }
        Err(err) => {
            on_status(Status::warning(format!(
                "Photo {}: upload failed: {}",
                filename, err
            )));
            UploadStatus::from(err)
        }
    }
}

/// Part filename for an uploaded copy: the URL's last path segment with
/// the query stripped, or a numbered fallback.
fn filename_from_url(url: &str, index: usize) -> String {
    let name = url
        .split('?')
        .next()
        .unwrap_or(url)
        .rsplit('/')
        .next()
        .unwrap_or("");
    if name.is_empty() {
        fallback_filename(index)
    } else {
        name.to_string()
    }
}

fn fallback_filename(index: usize) -> String {
    format!("photo-{}.jpg", index + 1)
}
