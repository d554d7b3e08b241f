// Library root
// -----------
// This crate exposes a small library surface for the CLI. The binary
// (`main.rs`) uses these modules to implement the interactive flow.
//
// Module responsibilities:
// - `api`: the blocking Reverb client and the `MarketplaceApi` seam the
//   pipeline runs against.
// - `clone`: the listing-clone pipeline (validate, fetch, create draft,
//   transfer photos) and its status feed.
// - `errors`: terminal pipeline errors plus the per-photo upload error.
// - `models`: wire models and the draft payload mapping.
// - `upload`: the pluggable photo upload strategies.
// - `ui`: the terminal form and status rendering around the pipeline.
//
// Keeping this separation makes it easy to exercise the pipeline against
// fakes and to swap the upload wire contract without touching the flow.
pub mod api;
pub mod clone;
pub mod errors;
pub mod models;
pub mod ui;
pub mod upload;
