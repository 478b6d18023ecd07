// Tripwire Infrastructure - System Adapters
// Implements: CommandRunner, DeviceEnumerator, IcmpProber, HttpFetcher, LockFile

pub mod fs_lock_file;
pub mod lsusb_enumerator;
pub mod reqwest_fetcher;
pub mod subprocess_runner;
pub mod system_pinger;

pub use fs_lock_file::FsLockFile;
pub use lsusb_enumerator::LsusbEnumerator;
pub use reqwest_fetcher::ReqwestFetcher;
pub use subprocess_runner::SubprocessRunner;
pub use system_pinger::SystemPinger;
