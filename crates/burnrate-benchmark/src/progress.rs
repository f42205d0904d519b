use std::sync::atomic::{AtomicI64, Ordering};

use indicatif::{ProgressBar, ProgressStyle};

/// Receives token-count increments from in-flight exchanges.
///
/// Implementations must accept concurrent calls without losing increments.
/// Negative values correct earlier over-estimates and never exceed what the
/// same exchange already added.
pub trait ProgressSink: Send + Sync {
    fn add(&self, tokens: i64);
}

/// Atomic token total, optionally mirrored to a terminal progress bar.
#[derive(Default)]
pub struct TokenCounter {
    total: AtomicI64,
    bar: Option<ProgressBar>,
}

impl TokenCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counter that also drives a bar sized for `expected_tokens`.
    pub fn with_bar(expected_tokens: u64, label: &str) -> Self {
        let bar = ProgressBar::new(expected_tokens);
        if let Ok(style) =
            ProgressStyle::with_template("{msg} [{bar:40}] {pos}/{len} tokens ({per_sec})")
        {
            bar.set_style(style.progress_chars("=> "));
        }
        bar.set_message(label.to_string());
        Self {
            total: AtomicI64::new(0),
            bar: Some(bar),
        }
    }

    pub fn total(&self) -> i64 {
        self.total.load(Ordering::Relaxed)
    }

    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

impl ProgressSink for TokenCounter {
    fn add(&self, tokens: i64) {
        self.total.fetch_add(tokens, Ordering::Relaxed);
        if let Some(bar) = &self.bar {
            if tokens >= 0 {
                bar.inc(tokens.unsigned_abs());
            } else {
                bar.dec(tokens.unsigned_abs());
            }
        }
    }
}
