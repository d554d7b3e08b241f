// UI layer: the interactive form in front of the clone pipeline, built
// with `dialoguer`. The functions are small and synchronous to make the
// flow easy to follow; the pipeline's status feed is rendered around an
// indicatif spinner while requests run.

use anyhow::Result;
use crossterm::style::Stylize;
use dialoguer::{Confirm, Input, Password, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;

use crate::api::{ApiConfig, ReverbClient};
use crate::clone::{run_clone, CloneOutcome, CloneRequest, PhotoSource, Status, StatusKind};
use crate::upload::{uploader_for, PhotoUploader, UploadStrategy};

/// Run the interactive session: collect the token once, then loop over
/// clone runs until the user is done.
///
/// Note: `Select::interact()` is keyboard-driven: arrow keys and Enter
/// choose an option.
pub fn run() -> Result<()> {
    println!("{}", "Reverb Draft Creator".bold());
    println!("Copies a public listing's metadata and photos into a new draft on your account.");
    println!();

    let token = prompt_token()?;
    let config = ApiConfig::from_env(token);
    let api = ReverbClient::new(&config)?;
    let uploader = uploader_for(UploadStrategy::from_env(), api.clone());

    loop {
        let url: String = Input::new()
            .with_prompt("Reverb listing URL")
            .interact_text()?;
        if url.trim().is_empty() {
            println!("{}", "Please paste a listing URL.".red());
            continue;
        }

        let photos = prompt_photo_source()?;
        let request = CloneRequest {
            listing_url: url.trim().to_string(),
            photos,
        };
        execute(&api, uploader.as_ref(), &request);

        if !Confirm::new()
            .with_prompt("Clone another listing?")
            .default(false)
            .interact()?
        {
            break;
        }
    }
    Ok(())
}

/// Masked token prompt. The token stays in this process's memory for the
/// session; it is never echoed and never written anywhere.
fn prompt_token() -> Result<String> {
    loop {
        // `Password` hides input in the terminal.
        let token: String = Password::new().with_prompt("Reverb API token").interact()?;
        if !token.trim().is_empty() {
            return Ok(token.trim().to_string());
        }
        println!("{}", "An API token is required to create drafts.".red());
    }
}

/// Ask where the draft's photos should come from.
fn prompt_photo_source() -> Result<PhotoSource> {
    let items = vec![
        "Copy photos from the source listing",
        "Upload my own photos",
        "No photos",
    ];
    let selection = Select::new()
        .with_prompt("Photos for the draft")
        .items(&items)
        .default(0)
        .interact()?;
    Ok(match selection {
        0 => PhotoSource::CopyFromListing,
        1 => {
            let files = pick_local_photos()?;
            if files.is_empty() {
                println!(
                    "{}",
                    "No files selected; the draft will be created without photos.".yellow()
                );
                PhotoSource::None
            } else {
                PhotoSource::LocalFiles(files)
            }
        }
        _ => PhotoSource::None,
    })
}

/// Native multi-file picker filtered to the accepted photo formats, with a
/// typed-path fallback for terminals without a desktop dialog.
fn pick_local_photos() -> Result<Vec<PathBuf>> {
    if let Some(files) = rfd::FileDialog::new()
        .set_title("Photos for the draft")
        .add_filter("Images", &["png", "jpg", "jpeg"])
        .pick_files()
    {
        return Ok(files);
    }
    let typed: String = Input::new()
        .with_prompt("Image file paths (comma separated, blank for none)")
        .allow_empty(true)
        .interact_text()?;
    Ok(typed
        .split(',')
        .map(str::trim)
        .filter(|path| !path.is_empty())
        .map(PathBuf::from)
        .collect())
}

/// Run one clone and render its status feed and outcome.
fn execute(api: &ReverbClient, uploader: &dyn PhotoUploader, request: &CloneRequest) {
    // The spinner carries the current stage message while lines that should
    // stay visible are printed above it.
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}").unwrap());
    spinner.enable_steady_tick(Duration::from_millis(120));

    let result = run_clone(api, uploader, request, |status| {
        render_status(&spinner, status)
    });
    spinner.finish_and_clear();

    match result {
        Ok(outcome) => print_summary(&outcome),
        Err(e) => println!("{}", format!("Clone failed: {}", e).red()),
    }
}

fn render_status(spinner: &ProgressBar, status: Status) {
    match status.kind {
        StatusKind::Progress => {
            spinner.println(status.message.clone().dim().to_string());
            spinner.set_message(status.message);
        }
        StatusKind::Success => spinner.println(status.message.green().to_string()),
        StatusKind::Warning => spinner.println(status.message.yellow().to_string()),
    }
}

fn print_summary(outcome: &CloneOutcome) {
    println!("{}", "Draft ready!".green().bold());
    println!(
        "Review it at https://reverb.com/my/listings/{} (drafts are only visible to you).",
        outcome.draft.id
    );
    let missing = outcome.missing_photos();
    if missing > 0 {
        println!(
            "{}",
            format!(
                "{} photo(s) could not be transferred; add them manually on the draft page.",
                missing
            )
            .yellow()
        );
    }
    println!();
}
