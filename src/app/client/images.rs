//! In-flight image download tracking
//!
//! A URL is in the set while a download for it is running. A second request
//! for the same URL is dropped rather than attached to the first one. The set
//! can be flushed wholesale when connectivity is restored; each entry carries
//! a ticket so that a flushed download finishing late cannot remove the entry
//! of a newer download for the same URL.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;
use url::Url;

#[derive(Debug, Default)]
struct Entries {
    next_ticket: u64,
    urls: HashMap<Url, u64>,
}

/// Set of image URLs currently being downloaded
#[derive(Debug, Clone, Default)]
pub struct InFlightImages {
    inner: Arc<Mutex<Entries>>,
}

impl InFlightImages {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claim `url` for download
    ///
    /// Returns `None` if the URL is already in flight. The returned guard
    /// releases the claim when dropped, on every exit path.
    pub fn try_begin(&self, url: &Url) -> Option<InFlightGuard> {
        let mut entries = self.lock();
        if entries.urls.contains_key(url) {
            return None;
        }
        entries.next_ticket += 1;
        let ticket = entries.next_ticket;
        entries.urls.insert(url.clone(), ticket);

        Some(InFlightGuard {
            set: self.clone(),
            url: url.clone(),
            ticket,
        })
    }

    /// Forget every tracked download
    ///
    /// Downloads still running keep going and deliver their results; they
    /// just no longer block new requests for the same URL.
    pub fn flush(&self) -> usize {
        let mut entries = self.lock();
        let flushed = entries.urls.len();
        entries.urls.clear();
        if flushed > 0 {
            debug!("Flushed {} in-flight image downloads", flushed);
        }
        flushed
    }

    pub fn contains(&self, url: &Url) -> bool {
        self.lock().urls.contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.lock().urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().urls.is_empty()
    }

    fn release(&self, url: &Url, ticket: u64) {
        let mut entries = self.lock();
        if entries.urls.get(url) == Some(&ticket) {
            entries.urls.remove(url);
        }
    }
}

/// Claim on one in-flight URL
#[derive(Debug)]
pub struct InFlightGuard {
    set: InFlightImages,
    url: Url,
    ticket: u64,
}

impl InFlightGuard {
    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.set.release(&self.url, self.ticket);
    }
}
