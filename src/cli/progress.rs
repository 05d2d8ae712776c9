//! Progress display for thumbnail downloads
//!
//! Uses an indicatif bar when stderr is a terminal and falls back to
//! periodic text lines otherwise.
//!
//! # Examples
//!
//! ```rust,no_run
//! use movie_feed::cli::{ProgressConfig, ThumbnailProgress};
//!
//! let progress = ThumbnailProgress::start(20, ProgressConfig::default());
//! progress.record(true);
//! progress.record(false);
//! let summary = progress.finish();
//! println!("{} downloaded, {} unavailable", summary.downloaded, summary.unavailable);
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

/// Configuration for progress display
#[derive(Debug, Clone)]
pub struct ProgressConfig {
    /// Enable visual progress bars
    pub enable_progress_bars: bool,
    /// Minimum time between text-mode reports
    pub text_report_interval: Duration,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            enable_progress_bars: true,
            text_report_interval: Duration::from_secs(5),
        }
    }
}

/// Counts at the end of a thumbnail run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ThumbnailSummary {
    pub total: usize,
    pub downloaded: usize,
    /// Failed, skipped or without a poster
    pub unavailable: usize,
    pub elapsed: Duration,
}

/// Progress of one batch of thumbnail downloads
pub struct ThumbnailProgress {
    bar: Option<ProgressBar>,
    total: usize,
    downloaded: AtomicUsize,
    unavailable: AtomicUsize,
    started: Instant,
    text_report_interval: Duration,
    last_report: std::sync::Mutex<Instant>,
}

impl ThumbnailProgress {
    /// Start displaying progress for `total` thumbnails
    pub fn start(total: usize, config: ProgressConfig) -> Self {
        let is_terminal = atty::is(atty::Stream::Stderr);
        let bar = (config.enable_progress_bars && is_terminal).then(|| Self::build_bar(total));

        debug!("Thumbnail progress started for {} movies (bar: {})", total, bar.is_some());
        let now = Instant::now();
        Self {
            bar,
            total,
            downloaded: AtomicUsize::new(0),
            unavailable: AtomicUsize::new(0),
            started: now,
            text_report_interval: config.text_report_interval,
            last_report: std::sync::Mutex::new(now),
        }
    }

    fn build_bar(total: usize) -> ProgressBar {
        let bar = ProgressBar::new(total as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-");
        bar.set_style(style);
        bar.set_message("thumbnails");
        bar.enable_steady_tick(Duration::from_millis(120));
        bar
    }

    /// Record one finished thumbnail
    pub fn record(&self, downloaded: bool) {
        if downloaded {
            self.downloaded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.unavailable.fetch_add(1, Ordering::Relaxed);
        }

        match &self.bar {
            Some(bar) => bar.inc(1),
            None => self.report_text(),
        }
    }

    fn report_text(&self) {
        let done = self.completed();
        let mut last = self.last_report.lock().unwrap_or_else(|p| p.into_inner());
        if done < self.total && last.elapsed() < self.text_report_interval {
            return;
        }
        *last = Instant::now();
        if self.total > 0 {
            eprintln!(
                "Thumbnails: {}/{} ({:.1}%)",
                done,
                self.total,
                done as f64 / self.total as f64 * 100.0
            );
        }
    }

    /// Thumbnails finished so far
    pub fn completed(&self) -> usize {
        self.downloaded.load(Ordering::Relaxed) + self.unavailable.load(Ordering::Relaxed)
    }

    /// Stop the display and return the final counts
    pub fn finish(self) -> ThumbnailSummary {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
        ThumbnailSummary {
            total: self.total,
            downloaded: self.downloaded.load(Ordering::Relaxed),
            unavailable: self.unavailable.load(Ordering::Relaxed),
            elapsed: self.started.elapsed(),
        }
    }
}
