use std::sync::Arc;

use anyhow::bail;
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::models::referrals::ReferralWithId;

/// Storage seam for referral records.
///
/// Ids come from `next_id`, which never hands out the same value twice for
/// the lifetime of the store, deletions included.
#[async_trait]
pub trait ReferralStore: Send + Sync {
    async fn next_id(&self) -> Result<i64, anyhow::Error>;

    async fn insert(&self, record: ReferralWithId) -> Result<ReferralWithId, anyhow::Error>;

    async fn find(&self, id: i64) -> Result<Option<ReferralWithId>, anyhow::Error>;

    async fn find_by_email(&self, email: &str) -> Result<Option<ReferralWithId>, anyhow::Error>;

    /// Replaces the record with the same id. `None` when there is no such record.
    async fn update(
        &self,
        record: ReferralWithId,
    ) -> Result<Option<ReferralWithId>, anyhow::Error>;

    async fn delete(&self, id: i64) -> Result<Option<ReferralWithId>, anyhow::Error>;

    async fn list(&self) -> Result<Vec<ReferralWithId>, anyhow::Error>;
}

#[derive(Default)]
struct ReferralTable {
    records: Vec<ReferralWithId>,
    last_id: i64,
}

#[derive(Clone, Default)]
pub struct InMemoryReferralStore {
    table: Arc<RwLock<ReferralTable>>,
}

impl InMemoryReferralStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReferralStore for InMemoryReferralStore {
    async fn next_id(&self) -> Result<i64, anyhow::Error> {
        let mut table = self.table.write().await;
        table.last_id += 1;

        Ok(table.last_id)
    }

    async fn insert(&self, record: ReferralWithId) -> Result<ReferralWithId, anyhow::Error> {
        let mut table = self.table.write().await;

        if table.records.iter().any(|stored| stored.id == record.id) {
            bail!("Referral id {} is already taken", record.id)
        }

        // Keep the allocator ahead of ids that were not handed out by next_id.
        table.last_id = table.last_id.max(record.id);
        table.records.push(record.clone());

        Ok(record)
    }

    async fn find(&self, id: i64) -> Result<Option<ReferralWithId>, anyhow::Error> {
        let table = self.table.read().await;

        Ok(table.records.iter().find(|record| record.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<ReferralWithId>, anyhow::Error> {
        let table = self.table.read().await;

        Ok(table
            .records
            .iter()
            .find(|record| record.referral.email == email)
            .cloned())
    }

    async fn update(
        &self,
        record: ReferralWithId,
    ) -> Result<Option<ReferralWithId>, anyhow::Error> {
        let mut table = self.table.write().await;

        match table.records.iter_mut().find(|stored| stored.id == record.id) {
            Some(stored) => {
                *stored = record.clone();
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: i64) -> Result<Option<ReferralWithId>, anyhow::Error> {
        let mut table = self.table.write().await;

        match table.records.iter().position(|record| record.id == id) {
            Some(index) => Ok(Some(table.records.remove(index))),
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<ReferralWithId>, anyhow::Error> {
        let table = self.table.read().await;

        Ok(table.records.clone())
    }
}
