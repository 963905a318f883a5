//! Shared agent state handed to every connection.

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use crate::broadcast::Broadcaster;

pub struct AppState<S> {
    pub broadcaster: Broadcaster<S>,

    // Connected viewer count, for logs
    pub viewers: Arc<AtomicUsize>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            broadcaster: self.broadcaster.clone(),
            viewers: Arc::clone(&self.viewers),
        }
    }
}

impl<S> AppState<S> {
    pub fn new(broadcaster: Broadcaster<S>) -> Self {
        Self {
            broadcaster,
            viewers: Arc::new(AtomicUsize::new(0)),
        }
    }
}
