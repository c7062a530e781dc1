//! Transfer progress display.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

const BAR_TEMPLATE: &str =
    "{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos:>3}%";

/// Percentage-driven progress bar for a single transfer.
///
/// Spins until the first percentage arrives, so transfers of unknown size
/// still show activity.
pub struct TransferProgress {
    bar: ProgressBar,
}

impl TransferProgress {
    pub fn new(label: &str) -> Self {
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::default_bar()
            .template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        bar.set_style(style);
        bar.set_message(label.to_string());
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }

    /// Hidden bar, for non-interactive use and tests.
    #[cfg(test)]
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    pub fn set_percentage(&self, pct: u8) {
        self.bar.set_position(u64::from(pct.min(100)));
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn finish(&self, msg: String) {
        self.bar.set_position(100);
        self.bar.finish_with_message(msg);
    }

    pub fn abandon(&self, msg: String) {
        self.bar.abandon_with_message(msg);
    }
}

/// Formats a byte count with binary units, e.g. `1.50 MB`.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }

    let mut size = bytes as f64;
    let mut unit_idx = 0;
    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }
    format!("{size:.2} {}", UNITS[unit_idx])
}
