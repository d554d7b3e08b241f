// Entrypoint for the CLI application.
// - Keeps `main` small: the UI session collects the token, builds the API
//   client and drives the whole flow.
// - Returns `anyhow::Result` to simplify error handling at the edge.

use reverb_draft_cli::ui;

fn main() -> anyhow::Result<()> {
    // Start the interactive session. This call blocks until the user is
    // done cloning listings.
    ui::run()
}
