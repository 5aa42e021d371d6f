//! Progress bars for bulk transfers.

use croco_core::TransferProgress;
use croco_core::util::format_bytes;
use indicatif::{ProgressBar, ProgressStyle};

/// Bar sized in bytes, labelled with the payload kind.
pub(crate) fn transfer_bar(label: &str) -> ProgressBar {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::with_template(
            "  {spinner:.cyan} {msg} [{bar:30.cyan/blue}] {bytes}/{total_bytes} ({eta})",
        )
        .expect("static pattern")
        .tick_chars("/-\\|")
        .progress_chars("=> "),
    );
    pb.set_message(label.to_string());
    pb
}

pub(crate) fn apply(pb: &ProgressBar, progress: TransferProgress) {
    pb.set_length(progress.total_bytes);
    pb.set_position(progress.bytes_done);
    if progress.total_banks > 0 {
        pb.set_message(format!(
            "{} bank {}/{}",
            progress.kind.display_name(),
            progress.banks_done.min(progress.total_banks),
            progress.total_banks
        ));
    }
}

/// Stop the bar and print a one-line summary.
pub(crate) fn finish(pb: &ProgressBar, what: &str, bytes: u64) {
    pb.finish_and_clear();
    log::info!("{} ({})", what, format_bytes(bytes));
}
