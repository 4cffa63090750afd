//! In-memory scan results, kept only so the export endpoints can serve the
//! CSV and original attachment bytes after a scan. One process, no
//! persistence; everything here is gone on restart.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::candidate::Candidate;

pub struct StoredScan {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub candidates: Vec<Candidate>,
}

#[derive(Clone, Default)]
pub struct ScanStore {
    inner: Arc<RwLock<HashMap<Uuid, Arc<StoredScan>>>>,
}

impl ScanStore {
    pub async fn insert(&self, candidates: Vec<Candidate>) -> Uuid {
        let id = Uuid::new_v4();
        let scan = Arc::new(StoredScan {
            id,
            created_at: Utc::now(),
            candidates,
        });
        self.inner.write().await.insert(id, scan);
        id
    }

    pub async fn get(&self, id: Uuid) -> Option<Arc<StoredScan>> {
        self.inner.read().await.get(&id).cloned()
    }
}
