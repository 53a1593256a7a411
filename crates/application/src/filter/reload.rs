use std::sync::Mutex;
use tokio::sync::Notify;
use warden_dns_domain::FilterListSource;

/// Parameters for one engine rebuild.
pub(crate) struct ReloadParams {
    pub allow: Vec<FilterListSource>,
    pub block: Vec<FilterListSource>,
}

/// Single-slot coalescing mailbox feeding the reload worker. Publishing
/// replaces any pending item, so the worker only ever rebuilds with the most
/// recent parameters and the queue depth is exactly one.
pub(crate) struct ReloadQueue {
    slot: Mutex<Option<ReloadParams>>,
    notify: Notify,
}

impl ReloadQueue {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            notify: Notify::new(),
        }
    }

    pub fn publish(&self, params: ReloadParams) {
        {
            let mut slot = self.slot.lock().unwrap();
            *slot = Some(params);
        }
        self.notify.notify_one();
    }

    /// Waits for the next published item. The slot is checked before
    /// parking so a publish that raced ahead of the worker is not lost.
    pub async fn next(&self) -> ReloadParams {
        loop {
            if let Some(params) = self.slot.lock().unwrap().take() {
                return params;
            }

            self.notify.notified().await;
        }
    }
}
