//! Network connectivity monitoring
//!
//! The monitor turns raw path observations into `Connected` /
//! `Disconnected` events on a broadcast channel. Observations come either
//! from a polling task driven by a [`PathProbe`] or from an embedding
//! platform calling [`ConnectivityMonitor::report`]. Reported statuses are
//! forwarded as-is, repeats included, with no debouncing.
//!
//! The polling task stands in for a platform path monitor, which only
//! calls back when the path changes: it publishes its first probe result
//! and then only results that differ from the previous probe. Embedders
//! with a real platform monitor should call `report` instead.

use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::constants::connectivity;

/// Reachability of the network path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectivityStatus {
    Connected,
    Disconnected,
}

impl fmt::Display for ConnectivityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectivityStatus::Connected => write!(f, "connected"),
            ConnectivityStatus::Disconnected => write!(f, "disconnected"),
        }
    }
}

/// Source of path observations
#[async_trait]
pub trait PathProbe: Send + Sync + 'static {
    /// Observe the current path status
    async fn probe(&self) -> ConnectivityStatus;
}

/// Probe that considers the path usable when a TCP connection succeeds
#[derive(Debug, Clone)]
pub struct TcpProbe {
    address: String,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(address: impl Into<String>, timeout: Duration) -> Self {
        Self {
            address: address.into(),
            timeout,
        }
    }
}

#[async_trait]
impl PathProbe for TcpProbe {
    async fn probe(&self) -> ConnectivityStatus {
        match tokio::time::timeout(self.timeout, TcpStream::connect(&self.address)).await {
            Ok(Ok(_)) => ConnectivityStatus::Connected,
            Ok(Err(e)) => {
                debug!("Probe of {} failed: {}", self.address, e);
                ConnectivityStatus::Disconnected
            }
            Err(_) => {
                debug!("Probe of {} timed out", self.address);
                ConnectivityStatus::Disconnected
            }
        }
    }
}

/// Runtime settings of the polling monitor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// `host:port` probed for reachability
    pub probe_address: String,
    /// Interval between probes
    pub poll_interval: Duration,
    /// Timeout of one probe
    pub probe_timeout: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            probe_address: connectivity::DEFAULT_PROBE_ADDRESS.to_string(),
            poll_interval: connectivity::DEFAULT_POLL_INTERVAL,
            probe_timeout: connectivity::DEFAULT_PROBE_TIMEOUT,
        }
    }
}

impl MonitorConfig {
    /// The TCP probe described by this configuration
    pub fn tcp_probe(&self) -> TcpProbe {
        TcpProbe::new(self.probe_address.clone(), self.probe_timeout)
    }
}

/// Publishes connectivity changes to subscribers
#[derive(Debug)]
pub struct ConnectivityMonitor {
    events: broadcast::Sender<ConnectivityStatus>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectivityMonitor {
    /// Create a monitor with no observation source attached
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(connectivity::EVENT_CHANNEL_CAPACITY);
        Self {
            events,
            task: Mutex::new(None),
        }
    }

    /// Receive every status reported from now on
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectivityStatus> {
        self.events.subscribe()
    }

    /// Publish a raw path observation
    ///
    /// Returns the number of subscribers that will receive it.
    pub fn report(&self, status: ConnectivityStatus) -> usize {
        publish(&self.events, status)
    }

    /// Start polling `probe` every `interval` on a background task
    ///
    /// The first observation is always published; later ones only when the
    /// status differs from the previous probe. Replaces a running poller.
    pub fn start<P: PathProbe>(&self, probe: P, interval: Duration) {
        let events = self.events.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            let mut last: Option<ConnectivityStatus> = None;

            loop {
                ticker.tick().await;
                let status = probe.probe().await;
                if last != Some(status) {
                    info!("Network path is {}", status);
                    publish(&events, status);
                    last = Some(status);
                }
            }
        });

        let mut slot = self.task.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(previous) = slot.replace(task) {
            previous.abort();
        }
    }

    /// Start polling with a TCP probe built from `config`
    pub fn start_with_config(&self, config: &MonitorConfig) {
        self.start(config.tcp_probe(), config.poll_interval);
    }

    /// Stop the polling task, if running
    pub fn stop(&self) {
        let mut slot = self.task.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(task) = slot.take() {
            task.abort();
            debug!("Connectivity polling stopped");
        }
    }

    /// Whether a polling task is attached
    pub fn is_running(&self) -> bool {
        let slot = self.task.lock().unwrap_or_else(|p| p.into_inner());
        slot.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for ConnectivityMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

fn publish(events: &broadcast::Sender<ConnectivityStatus>, status: ConnectivityStatus) -> usize {
    // No subscribers is not an error
    events.send(status).unwrap_or(0)
}
