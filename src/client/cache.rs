use crate::models::referrals::{Referral, ReferralWithId};

/// Local mirror of the server's referral list plus the record picked for
/// editing.
#[derive(Clone, Debug, Default)]
pub struct ReferralCache {
    records: Vec<ReferralWithId>,
    selected: Option<i64>,
}

impl ReferralCache {
    pub fn records(&self) -> &[ReferralWithId] {
        &self.records
    }

    pub fn selected(&self) -> Option<&ReferralWithId> {
        let id = self.selected?;
        self.records.iter().find(|record| record.id == id)
    }

    /// Drops whatever was cached and takes the server's list as is.
    pub fn replace_all(&mut self, records: Vec<ReferralWithId>) {
        self.records = records;
        self.forget_missing_selection();
    }

    pub fn add(&mut self, record: ReferralWithId) {
        self.records.push(record);
    }

    pub fn apply_update(&mut self, id: i64, changes: Referral) {
        if let Some(record) = self.records.iter_mut().find(|record| record.id == id) {
            record.referral.merge(changes);
        }
    }

    pub fn remove(&mut self, id: i64) {
        self.records.retain(|record| record.id != id);
        self.forget_missing_selection();
    }

    /// An unknown id clears the selection.
    pub fn select(&mut self, id: Option<i64>) {
        self.selected = id.filter(|id| self.records.iter().any(|record| record.id == *id));
    }

    fn forget_missing_selection(&mut self) {
        let selected = self.selected;
        self.select(selected);
    }
}
