//! Progress display for download runs
//!
//! Renders the orchestrator's progress events as an indicatif bar. The bar is
//! only drawn on a real terminal; piped output just gets the final summary.

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;

use crate::app::ProgressUpdate;

/// Create a progress bar for `total` documents, if stderr is a terminal
pub fn download_progress_bar(total: usize) -> Option<ProgressBar> {
    if !atty::is(atty::Stream::Stderr) {
        return None;
    }

    let bar = ProgressBar::new(total as u64);
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        )
        .expect("progress template must parse")
        .progress_chars("=>-"),
    );
    bar.set_message("starting");
    Some(bar)
}

/// Drain progress events, updating the bar until the channel closes
///
/// Runs alongside the orchestrator; when no bar is drawn the events are
/// consumed and dropped so the channel never fills.
pub async fn render_progress(mut events: mpsc::Receiver<ProgressUpdate>, bar: Option<ProgressBar>) {
    while let Some(update) = events.recv().await {
        if let Some(bar) = &bar {
            bar.set_position(update.completed as u64);
            bar.set_message(format!("{} ok", update.succeeded));
        }
    }
    if let Some(bar) = &bar {
        bar.finish_and_clear();
    }
}
