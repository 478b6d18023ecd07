// Application Layer - Detectors and the execution gate

pub mod execution_gate;
pub mod interval_detector;
pub mod ping_detector;
pub mod shutdown;
pub mod time_detector;
pub mod usb_detector;
pub mod web_detector;

// Re-exports
pub use execution_gate::ExecutionGate;
pub use interval_detector::IntervalDetector;
pub use ping_detector::PingDetector;
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};
pub use time_detector::TimeDetector;
pub use usb_detector::{DeviceEvent, PollReport, PollSkipped, UsbDetector};
pub use web_detector::{WebDetector, WebSnapshot};
