use crate::models::Snapshot;
use crate::session::Session;
use crate::storage::Store;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared handler state. Holding the session lock across a write and its reload keeps
/// the view model from being computed against a half-applied change.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub session: Arc<Mutex<Session>>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, snapshot: Snapshot) -> Self {
        Self {
            store,
            session: Arc::new(Mutex::new(Session::new(snapshot))),
        }
    }
}
