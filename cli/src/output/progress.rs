//! Progress indicators built on indicatif.

use std::time::Duration;

use handoff_common::ProgressEvent;
use indicatif::{ProgressBar, ProgressStyle};

/// Create a byte-transfer bar for snapshot uploads and restores.
#[must_use]
pub fn transfer_bar(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::with_template(
            "  {spinner:.cyan} {msg} [{bar:30.cyan/dim}] {bytes}/{total_bytes}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    pb.set_message(msg.to_owned());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Build a sink that drives `bar` from restic's JSON progress stream.
/// The bar is cleared once the summary line arrives.
pub fn transfer_sink(bar: ProgressBar) -> impl Fn(ProgressEvent) + Send + Sync {
    move |event| match event {
        ProgressEvent::Status {
            total_bytes,
            bytes_done,
            ..
        } => {
            if let Some(total) = total_bytes {
                bar.set_length(total);
            }
            if let Some(done) = bytes_done {
                bar.set_position(done);
            }
        }
        ProgressEvent::Summary { .. } => bar.finish_and_clear(),
        ProgressEvent::ExitError { .. } => {}
    }
}
