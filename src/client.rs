//! Client-side mirror of the referral store.
//!
//! [`ReferralSync`] calls the server through a [`ReferralApi`], folds each
//! confirmed result into its [`ReferralCache`], and reports every outcome to a
//! [`Notifier`]. Errors are still returned to the caller; the notification is
//! the user-facing copy.

use tokio::sync::RwLock;

use crate::models::referrals::{Referral, ReferralWithId};

pub mod api;
pub mod cache;
pub mod notifications;

pub use api::{ClientError, HttpReferralApi, ReferralApi};
pub use cache::ReferralCache;
pub use notifications::{LogNotifier, Notification, NotificationKind, Notifier};

pub const CREATED: &str = "New referral has been added.";
pub const UPDATED: &str = "Referral has been updated.";
pub const REMOVED: &str = "Referral has been removed.";

const FETCH_FAILED: &str = "Failed to fetch referrals";
const CREATE_FAILED: &str = "Failed to create referral";
const UPDATE_FAILED: &str = "Failed to update referral";
const DELETE_FAILED: &str = "Failed to delete referral";

pub struct ReferralSync<A, N> {
    api: A,
    notifier: N,
    cache: RwLock<ReferralCache>,
}

impl<A, N> ReferralSync<A, N>
where
    A: ReferralApi,
    N: Notifier,
{
    pub fn new(api: A, notifier: N) -> Self {
        Self {
            api,
            notifier,
            cache: RwLock::new(ReferralCache::default()),
        }
    }

    pub async fn snapshot(&self) -> ReferralCache {
        self.cache.read().await.clone()
    }

    pub async fn referrals(&self) -> Vec<ReferralWithId> {
        self.cache.read().await.records().to_vec()
    }

    pub async fn selected(&self) -> Option<ReferralWithId> {
        self.cache.read().await.selected().cloned()
    }

    pub async fn select(&self, id: Option<i64>) {
        self.cache.write().await.select(id);
    }

    /// Replaces the cached list with the server's.
    pub async fn fetch(&self) -> Result<Vec<ReferralWithId>, ClientError> {
        match self.api.fetch_all().await {
            Ok(records) => {
                self.cache.write().await.replace_all(records.clone());
                Ok(records)
            }
            Err(e) => Err(self.report(e, FETCH_FAILED)),
        }
    }

    pub async fn refetch(&self) -> Result<Vec<ReferralWithId>, ClientError> {
        self.fetch().await
    }

    pub async fn create(&self, referral: &Referral) -> Result<ReferralWithId, ClientError> {
        match self.api.create(referral).await {
            Ok(record) => {
                self.cache.write().await.add(record.clone());
                self.notifier.notify(Notification::success(CREATED));
                Ok(record)
            }
            Err(e) => Err(self.report(e, CREATE_FAILED)),
        }
    }

    /// The server answers an update without a body, so the submitted fields
    /// are merged locally the same way the server merged them.
    pub async fn update(&self, id: i64, referral: &Referral) -> Result<(), ClientError> {
        match self.api.update(id, referral).await {
            Ok(()) => {
                self.cache
                    .write()
                    .await
                    .apply_update(id, referral.clone());
                self.notifier.notify(Notification::success(UPDATED));
                Ok(())
            }
            Err(e) => Err(self.report(e, UPDATE_FAILED)),
        }
    }

    pub async fn delete(&self, id: i64) -> Result<(), ClientError> {
        match self.api.delete(id).await {
            Ok(()) => {
                self.cache.write().await.remove(id);
                self.notifier.notify(Notification::success(REMOVED));
                Ok(())
            }
            Err(e) => Err(self.report(e, DELETE_FAILED)),
        }
    }

    /// Server rejections show the server's text; anything without a usable
    /// body shows the operation that failed followed by the cause.
    fn report(&self, error: ClientError, failed: &str) -> ClientError {
        let description = match &error {
            ClientError::Api { message, .. } => message.clone(),
            ClientError::Transport(_) | ClientError::Decode(_) => format!("{failed}: {error}"),
        };
        self.notifier.notify(Notification::error(&description));

        error
    }
}
