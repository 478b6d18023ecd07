//! USB Detector - diffs attached devices against a cached snapshot
//!
//! Every appearance, disappearance and attachment-count change of a device id
//! that is not ignored raises one dispatch. The cache is guarded for the whole
//! poll so two polls never interleave their read-modify-write.
//!
//! Until one enumeration has succeeded the cache is unprimed: the first
//! successful snapshot fills it without dispatching, so a failed startup
//! enumeration never turns every attached device into a new one.

use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn, Level};

use crate::domain::{DeviceSnapshot, ScopeId, TriggerSource};
use crate::port::{DeviceEnumerator, Dispatcher};

/// Change observed for one device id during a poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    Appeared { id: String },
    CountChanged { id: String, before: u32, after: u32 },
    Disappeared { id: String },
}

impl DeviceEvent {
    pub fn id(&self) -> &str {
        match self {
            DeviceEvent::Appeared { id }
            | DeviceEvent::CountChanged { id, .. }
            | DeviceEvent::Disappeared { id } => id,
        }
    }
}

/// Summary of one poll
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollReport {
    pub events: Vec<DeviceEvent>,
    /// Number of dispatches raised (events of ignored ids excluded)
    pub dispatched: usize,
}

/// Why a poll did not diff
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollSkipped {
    /// Another poll still holds the cache
    InFlight,
    /// The enumerator failed; the cache is left untouched
    EnumerationFailed(String),
}

pub struct UsbDetector {
    enumerator: Arc<dyn DeviceEnumerator>,
    dispatcher: Arc<dyn Dispatcher>,
    ignored: HashSet<String>,
    scope_id: ScopeId,
    /// `None` until an enumeration has succeeded
    cache: Mutex<Option<DeviceSnapshot>>,
}

/// Level for changes of ignored devices; `verbose` lifts them to info
fn ignored_change_level(verbose: bool) -> Level {
    if verbose {
        Level::INFO
    } else {
        Level::DEBUG
    }
}

impl UsbDetector {
    pub fn new(
        enumerator: Arc<dyn DeviceEnumerator>,
        dispatcher: Arc<dyn Dispatcher>,
        ignored: impl IntoIterator<Item = String>,
        scope_id: ScopeId,
    ) -> Self {
        Self {
            enumerator,
            dispatcher,
            ignored: ignored.into_iter().collect(),
            scope_id,
            cache: Mutex::new(None),
        }
    }

    pub fn is_ignored(&self, id: &str) -> bool {
        self.ignored.contains(id)
    }

    /// Populate the cache without dispatching
    pub async fn init(&self, verbose: bool) {
        let snapshot = match self.enumerator.enumerate().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!(error = %e, "Initial USB enumeration failed, first successful poll primes the cache");
                return;
            }
        };

        if verbose {
            info!("Connected at start: ID        Count Name");
            for (id, device) in &snapshot {
                info!("{:<9} {:<5} {}", id, device.total(), device.name);
            }
        }
        info!(devices = snapshot.len(), "USB device cache initialized");
        *self.cache.lock().await = Some(snapshot);
    }

    pub async fn is_primed(&self) -> bool {
        self.cache.lock().await.is_some()
    }

    /// Copy of the current cache (empty while unprimed)
    pub async fn cached(&self) -> DeviceSnapshot {
        self.cache.lock().await.clone().unwrap_or_default()
    }

    /// One poll: enumerate, diff, dispatch, update the cache
    pub async fn track(&self, suppress: bool, verbose: bool) -> Result<PollReport, PollSkipped> {
        let Ok(mut slot) = self.cache.try_lock() else {
            debug!("USB poll still in flight, skipping this tick");
            return Err(PollSkipped::InFlight);
        };

        let current = match self.enumerator.enumerate().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!(error = %e, "USB enumeration failed, skipping diff");
                return Err(PollSkipped::EnumerationFailed(e.to_string()));
            }
        };

        let Some(cache) = slot.as_mut() else {
            warn!(devices = current.len(), "USB device cache primed late, no changes raised");
            *slot = Some(current);
            return Ok(PollReport::default());
        };

        let mut report = PollReport::default();

        for (id, device) in &current {
            let event = match cache.get(id) {
                None => {
                    info!(id = %id, name = %device.name, "New USB device");
                    DeviceEvent::Appeared { id: id.clone() }
                }
                Some(cached) if !cached.same_attachments(device) => {
                    info!(
                        id = %id,
                        name = %device.name,
                        old_count = cached.total(),
                        new_count = device.total(),
                        "USB device count differs"
                    );
                    DeviceEvent::CountChanged {
                        id: id.clone(),
                        before: cached.total(),
                        after: device.total(),
                    }
                }
                Some(_) => continue,
            };

            self.raise(&event, suppress, verbose, &mut report).await;
            cache.insert(id.clone(), device.clone());
        }

        let missing: Vec<String> = cache
            .keys()
            .filter(|id| !current.contains_key(*id))
            .cloned()
            .collect();
        for id in missing {
            if let Some(device) = cache.get(&id) {
                info!(id = %id, name = %device.name, "USB device missing");
            }
            let event = DeviceEvent::Disappeared { id: id.clone() };
            self.raise(&event, suppress, verbose, &mut report).await;
            cache.remove(&id);
        }

        Ok(report)
    }

    async fn raise(&self, event: &DeviceEvent, suppress: bool, verbose: bool, report: &mut PollReport) {
        if self.is_ignored(event.id()) {
            if ignored_change_level(verbose) == Level::INFO {
                info!(event = ?event, "Change of ignored USB device");
            } else {
                debug!(event = ?event, "Change of ignored USB device");
            }
        } else {
            self.dispatcher
                .dispatch(TriggerSource::Usb, self.scope_id, suppress)
                .await;
            report.dispatched += 1;
        }
        report.events.push(event.clone());
    }
}
