// Tripwire Core - Detection, Dispatch & Ports
// NO infrastructure dependencies: processes, sockets and files sit behind ports

pub mod application;
pub mod domain;
pub mod port;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
