// USB Device Domain Model

use std::collections::BTreeMap;

/// Device id in `vendor:product` form
pub type DeviceId = String;

/// Snapshot of every attached device, keyed by id
pub type DeviceSnapshot = BTreeMap<DeviceId, UsbDevice>;

/// All attachments of one vendor:product id, counted per bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsbDevice {
    pub id: DeviceId,
    pub name: String,
    pub bus_count: BTreeMap<String, u32>,
}

impl UsbDevice {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            bus_count: BTreeMap::new(),
        }
    }

    /// Record one more attachment on `bus`
    pub fn attach(&mut self, bus: impl Into<String>) {
        *self.bus_count.entry(bus.into()).or_insert(0) += 1;
    }

    pub fn with_bus(mut self, bus: impl Into<String>, count: u32) -> Self {
        self.bus_count.insert(bus.into(), count);
        self
    }

    /// Total attachment count across all buses
    pub fn total(&self) -> u32 {
        self.bus_count.values().sum()
    }

    /// Same set of buses with the same count on each
    pub fn same_attachments(&self, other: &UsbDevice) -> bool {
        self.bus_count == other.bus_count
    }
}
