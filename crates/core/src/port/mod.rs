// Port Layer - Interfaces for external dependencies

pub mod command_runner;
pub mod device_enumerator;
pub mod dispatcher;
pub mod http_fetcher;
pub mod icmp_prober;
pub mod lock_file;
pub mod probe_error;
pub mod time_provider; // For deterministic testing

// Re-exports
pub use command_runner::{CommandOutput, CommandRunner, ExecutionError};
pub use device_enumerator::DeviceEnumerator;
pub use dispatcher::Dispatcher;
pub use http_fetcher::{HttpFetcher, HttpResponse};
pub use icmp_prober::{IcmpProber, PingStatistics};
pub use lock_file::LockFile;
pub use probe_error::ProbeError;
pub use time_provider::TimeProvider;
