// Wire models for the listing endpoints plus the payload the pipeline
// submits. Every copied field may be absent on the wire; payload
// construction fills the documented defaults instead of propagating nulls.

use serde::{Deserialize, Serialize};

use crate::errors::UploadError;

/// Amount used when the source listing carries no price.
pub const DEFAULT_PRICE_AMOUNT: &str = "1.00";
pub const DEFAULT_PRICE_CURRENCY: &str = "USD";
/// Drafts are always created unpublished, whatever the source state was.
pub const DRAFT_STATE: &str = "draft";

/// Listing metadata as returned by `GET /listings/{id}`. A small slice of
/// the wire shape; unmodeled parts of the (large) hal+json document are
/// ignored on deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceListing {
    /// Ids arrive as numbers here but strings elsewhere, so the raw value
    /// is kept.
    pub id: Option<serde_json::Value>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub state: Option<String>,
    pub price: Option<Price>,
    #[serde(default)]
    pub photos: Vec<PhotoRef>,
}

/// Price object attached to a listing; amounts travel as decimal strings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Price {
    pub amount: Option<String>,
    pub currency: Option<String>,
}

/// One photo owned by a listing: a hal `_links` block of sized renditions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PhotoRef {
    #[serde(rename = "_links", default)]
    pub links: PhotoLinks,
}

impl PhotoRef {
    /// Download URL of the full-resolution rendition, if the API supplied
    /// one. Empty hrefs count as missing.
    pub fn full_url(&self) -> Option<&str> {
        self.links
            .full
            .as_ref()
            .map(|link| link.href.as_str())
            .filter(|href| !href.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PhotoLinks {
    pub full: Option<Link>,
    pub large_crop: Option<Link>,
    pub small_crop: Option<Link>,
    pub thumbnail: Option<Link>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Link {
    #[serde(default)]
    pub href: String,
}

/// Body of `POST /listings`, built once per run from the source listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DraftPayload {
    pub title: String,
    pub description: String,
    pub brand: String,
    pub model: String,
    pub price: PricePayload,
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PricePayload {
    pub amount: String,
    pub currency: String,
}

impl DraftPayload {
    /// Map a source listing onto a creation payload. Absent text fields
    /// become empty strings, a missing price falls back to 1.00 USD, and
    /// the state is forced to "draft".
    pub fn from_listing(listing: &SourceListing) -> Self {
        let price = listing.price.clone().unwrap_or_default();
        DraftPayload {
            title: listing.title.clone().unwrap_or_default(),
            description: listing.description.clone().unwrap_or_default(),
            brand: listing.make.clone().unwrap_or_default(),
            model: listing.model.clone().unwrap_or_default(),
            price: PricePayload {
                amount: price
                    .amount
                    .unwrap_or_else(|| DEFAULT_PRICE_AMOUNT.to_string()),
                currency: price
                    .currency
                    .unwrap_or_else(|| DEFAULT_PRICE_CURRENCY.to_string()),
            },
            state: DRAFT_STATE.to_string(),
        }
    }
}

/// Identity of a freshly created draft. Held in memory for the rest of the
/// run only; nothing is persisted between runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftListing {
    pub id: String,
}

/// Per-photo outcome: one entry per supplied photo, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    pub filename: String,
    pub status: UploadStatus,
}

/// What happened to one photo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStatus {
    /// The upload endpoint accepted the bytes.
    Uploaded,
    /// No transfer was attempted, with the reason (for example a photo ref
    /// without a download URL).
    Skipped(String),
    /// Download, file read, or upload failed. The HTTP status is present
    /// when a server answered; the body holds the raw response or error
    /// text.
    Failed { status: Option<u16>, body: String },
}

impl UploadStatus {
    pub fn is_uploaded(&self) -> bool {
        matches!(self, UploadStatus::Uploaded)
    }
}

impl From<UploadError> for UploadStatus {
    fn from(err: UploadError) -> Self {
        UploadStatus::Failed {
            status: err.status,
            body: err.body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn listing_from(value: serde_json::Value) -> SourceListing {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn payload_copies_the_mapped_fields() {
        let listing = listing_from(json!({
            "id": 123456,
            "title": "Vintage Amp",
            "description": "Warm tubes, light wear.",
            "make": "Fender",
            "model": "Deluxe Reverb",
            "state": "live",
            "price": { "amount": "950.00", "currency": "EUR" },
            "sku": "ignored-field"
        }));
        assert_eq!(listing.id, Some(json!(123456)));

        let payload = DraftPayload::from_listing(&listing);
        assert_eq!(payload.title, "Vintage Amp");
        assert_eq!(payload.description, "Warm tubes, light wear.");
        assert_eq!(payload.brand, "Fender");
        assert_eq!(payload.model, "Deluxe Reverb");
        assert_eq!(
            payload.price,
            PricePayload {
                amount: "950.00".into(),
                currency: "EUR".into(),
            }
        );
        assert_eq!(payload.state, DRAFT_STATE);
    }

    #[test]
    fn a_missing_price_defaults_to_one_dollar() {
        let payload = DraftPayload::from_listing(&listing_from(json!({ "title": "No price" })));
        assert_eq!(
            payload.price,
            PricePayload {
                amount: "1.00".into(),
                currency: "USD".into(),
            }
        );
    }

    #[test]
    fn partial_prices_default_per_field() {
        let payload =
            DraftPayload::from_listing(&listing_from(json!({ "price": { "amount": "50.00" } })));
        assert_eq!(payload.price.amount, "50.00");
        assert_eq!(payload.price.currency, "USD");
    }

    #[test]
    fn absent_text_fields_become_empty_strings() {
        let payload = DraftPayload::from_listing(&listing_from(json!({})));
        assert_eq!(payload.title, "");
        assert_eq!(payload.description, "");
        assert_eq!(payload.brand, "");
        assert_eq!(payload.model, "");
    }

    #[test]
    fn the_draft_state_overrides_the_source_state() {
        let payload = DraftPayload::from_listing(&listing_from(json!({ "state": "live" })));
        assert_eq!(payload.state, "draft");
    }

    #[test]
    fn photo_refs_expose_their_full_resolution_url() {
        let listing = listing_from(json!({
            "photos": [
                { "_links": {
                    "full": { "href": "https://images.reverb.com/1/full.jpg" },
                    "thumbnail": { "href": "https://images.reverb.com/1/thumb.jpg" }
                } },
                { "_links": { "full": { "href": "" } } },
                { "_links": {} },
                {}
            ]
        }));
        assert_eq!(listing.photos.len(), 4);
        assert_eq!(
            listing.photos[0].full_url(),
            Some("https://images.reverb.com/1/full.jpg")
        );
        assert_eq!(listing.photos[1].full_url(), None);
        assert_eq!(listing.photos[2].full_url(), None);
        assert_eq!(listing.photos[3].full_url(), None);
    }

    #[test]
    fn the_payload_serializes_the_creation_shape() {
        let payload = DraftPayload::from_listing(&listing_from(json!({ "title": "Amp" })));
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["state"], "draft");
        assert_eq!(value["price"]["amount"], "1.00");
        assert_eq!(value["price"]["currency"], "USD");
        assert_eq!(value["brand"], "");
    }

    #[test]
    fn upload_status_keeps_the_failure_details() {
        let status = UploadStatus::from(UploadError::http(404, r#"{"message":"not found"}"#));
        assert_eq!(
            status,
            UploadStatus::Failed {
                status: Some(404),
                body: r#"{"message":"not found"}"#.into(),
            }
        );
        assert!(!status.is_uploaded());
        assert!(UploadStatus::Uploaded.is_uploaded());
    }
}
