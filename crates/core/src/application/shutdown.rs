// Shutdown Token

use std::time::Duration;
use tokio::sync::watch;

/// Shutdown signal shared by scheduler loops and interval tasks
#[derive(Clone)]
pub struct ShutdownToken {
    rx: watch::Receiver<bool>,
}

impl ShutdownToken {
    /// Check if shutdown was requested
    pub fn is_shutdown(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait for shutdown signal
    pub async fn wait(&mut self) {
        while !self.is_shutdown() {
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }

    /// Sleep for `duration` unless shutdown arrives first.
    ///
    /// Returns `false` when the sleep was cut short by shutdown (or the
    /// sender is gone).
    pub async fn sleep(&mut self, duration: Duration) -> bool {
        if self.is_shutdown() {
            return false;
        }
        tokio::select! {
            _ = tokio::time::sleep(duration) => true,
            _ = self.wait() => false,
        }
    }
}

/// Shutdown sender
pub struct ShutdownSender {
    tx: watch::Sender<bool>,
}

impl ShutdownSender {
    /// Signal shutdown to every token
    pub fn shutdown(&self) {
        let _ = self.tx.send(true);
    }
}

/// Create a shutdown channel
pub fn shutdown_channel() -> (ShutdownSender, ShutdownToken) {
    let (tx, rx) = watch::channel(false);
    (ShutdownSender { tx }, ShutdownToken { rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_sleep_completes_without_shutdown() {
        let (_tx, mut token) = shutdown_channel();

        assert!(token.sleep(Duration::from_secs(60)).await);
        assert!(!token.is_shutdown());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_interrupted_by_shutdown() {
        let (tx, mut token) = shutdown_channel();

        let sleeper = tokio::spawn(async move { token.sleep(Duration::from_secs(3600)).await });
        tokio::task::yield_now().await;
        tx.shutdown();

        assert!(!sleeper.await.unwrap());
    }

    #[tokio::test]
    async fn test_sleep_after_shutdown_returns_immediately() {
        let (tx, mut token) = shutdown_channel();
        tx.shutdown();

        assert!(token.is_shutdown());
        assert!(!token.sleep(Duration::from_secs(3600)).await);
    }
}
