use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::models::proposal::PendingProposal;

/// Per-user storage for the one proposal awaiting confirmation.
///
/// `lock_user` hands back an owned guard over the user's slot; holding
/// it for a whole turn serializes that user's read-modify-write against
/// concurrent turns without blocking other users.
#[async_trait]
pub trait PendingStore: Send + Sync {
    async fn lock_user(&self, user_id: &str) -> OwnedMutexGuard<Option<PendingProposal>>;

    async fn get(&self, user_id: &str) -> Option<PendingProposal>;

    async fn set(&self, user_id: &str, proposal: PendingProposal);

    async fn clear(&self, user_id: &str);
}

pub struct InMemoryPendingStore {
    slots: Mutex<HashMap<String, Arc<Mutex<Option<PendingProposal>>>>>,
}

impl InMemoryPendingStore {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    async fn slot(&self, user_id: &str) -> Arc<Mutex<Option<PendingProposal>>> {
        // Cells are never removed, so a user's lock identity stays
        // stable for the lifetime of the store.
        let mut slots = self.slots.lock().await;
        slots
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone()
    }
}

impl Default for InMemoryPendingStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PendingStore for InMemoryPendingStore {
    async fn lock_user(&self, user_id: &str) -> OwnedMutexGuard<Option<PendingProposal>> {
        self.slot(user_id).await.lock_owned().await
    }

    async fn get(&self, user_id: &str) -> Option<PendingProposal> {
        self.slot(user_id).await.lock().await.clone()
    }

    async fn set(&self, user_id: &str, proposal: PendingProposal) {
        *self.slot(user_id).await.lock().await = Some(proposal);
    }

    async fn clear(&self, user_id: &str) {
        *self.slot(user_id).await.lock().await = None;
    }
}
