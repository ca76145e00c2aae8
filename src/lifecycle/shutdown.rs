//! Shutdown coordination for the route server.
//!
//! Backed by a `watch` channel holding a single flag, so a task that subscribes
//! after the trigger still observes it.

use tokio::sync::watch;

/// Owner side of the shutdown flag.
pub struct Shutdown {
    tx: watch::Sender<bool>,
}

/// Subscriber side, handed to each long-running task.
#[derive(Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }

    /// Raise the flag. Idempotent.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownSignal {
    /// Resolve once shutdown is triggered or the `Shutdown` is dropped.
    pub async fn recv(mut self) {
        let _ = self.rx.wait_for(|triggered| *triggered).await;
    }
}
