// Fetch progress reporting
//
// Progress is a side channel: reporter methods are infallible and a
// broken display can never fail the fetch that feeds it.

use indicatif::{ProgressBar, ProgressStyle};

/// Point-in-time progress of a single fetch. Ephemeral; exists only for
/// the duration of the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchProgress {
    pub bytes_read: u64,
    /// Total expected size, when the network knows it up front.
    pub total_bytes: Option<u64>,
}

/// Side-channel observer for streaming fetch progress.
pub trait ProgressReporter: Send + Sync {
    /// A fetch is starting. `name` is the display name (last path segment
    /// of the identifier), `total` the best-effort expected size.
    fn start(&self, name: &str, total: Option<u64>);

    /// A chunk landed; `progress.bytes_read` is cumulative.
    fn advance(&self, progress: FetchProgress);

    /// The fetch completed with `total_read` bytes.
    fn finish(&self, total_read: u64);
}

/// Reporter that does nothing. Used by the raw fetch paths.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn start(&self, _name: &str, _total: Option<u64>) {}
    fn advance(&self, _progress: FetchProgress) {}
    fn finish(&self, _total_read: u64) {}
}

/// Terminal progress bar backed by indicatif.
///
/// Falls back to a spinner when the total size is unknown.
pub struct IndicatifReporter {
    bar: ProgressBar,
}

impl IndicatifReporter {
    pub fn new() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }
}

impl Default for IndicatifReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for IndicatifReporter {
    fn start(&self, name: &str, total: Option<u64>) {
        match total {
            Some(len) => {
                self.bar.set_length(len);
                self.bar.set_style(
                    ProgressStyle::with_template(
                        "{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes}",
                    )
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=> "),
                );
            }
            None => {
                self.bar.set_style(
                    ProgressStyle::with_template("{msg} {spinner} {bytes}")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                );
            }
        }
        self.bar.set_message(name.to_string());
        self.bar.set_draw_target(indicatif::ProgressDrawTarget::stderr());
    }

    fn advance(&self, progress: FetchProgress) {
        self.bar.set_position(progress.bytes_read);
    }

    fn finish(&self, total_read: u64) {
        self.bar.set_position(total_read);
        self.bar.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_reporter_accepts_all_events() {
        let reporter = NoopReporter;
        reporter.start("scene.tif", Some(1024));
        reporter.advance(FetchProgress {
            bytes_read: 512,
            total_bytes: Some(1024),
        });
        reporter.finish(1024);
    }
}
