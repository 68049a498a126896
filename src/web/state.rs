use std::sync::Arc;

use crate::storage::Store;

/// Shared handle to the file store. Handlers take a fresh snapshot per
/// request, so an open dashboard always shows the latest send/response
/// activity after a reload.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
}

impl AppState {
    pub fn new(store: Store) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}
