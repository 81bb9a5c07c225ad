use std::sync::{Arc, Mutex};
use std::time::Duration;

use treewatch::engine::{FileWatchEvent, FileWatchListener};

/// Records every notification a service delivers.
#[derive(Debug, Clone, Default)]
pub struct ListenerRecorder {
    events: Arc<Mutex<Vec<FileWatchEvent>>>,
}

impl ListenerRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A listener feeding this recorder.
    pub fn listener(&self) -> impl FileWatchListener + use<> {
        let events = Arc::clone(&self.events);
        move |event: FileWatchEvent| events.lock().unwrap().push(event)
    }

    pub fn count(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn events(&self) -> Vec<FileWatchEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Wait until at least `n` notifications arrived, up to `limit`.
    pub async fn wait_for(&self, n: usize, limit: Duration) -> bool {
        crate::eventually(limit, || self.count() >= n).await
    }

    /// Let `window` pass and return how many notifications arrived meanwhile.
    pub async fn count_during(&self, window: Duration) -> usize {
        let before = self.count();
        tokio::time::sleep(window).await;
        self.count() - before
    }
}
