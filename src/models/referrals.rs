use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Referral {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub prefix: String,
    pub phone: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suburb: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postcode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Filename returned by the upload endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl Referral {
    /// Applies an update onto this referral.
    ///
    /// Required fields are always replaced. Optional fields are only replaced
    /// when the update carries a value, so an update without an `avatar`
    /// keeps the stored one. The server and the client cache both go through
    /// here.
    pub fn merge(&mut self, changes: Referral) {
        self.first_name = changes.first_name;
        self.last_name = changes.last_name;
        self.email = changes.email;
        self.prefix = changes.prefix;
        self.phone = changes.phone;

        replace_if_present(&mut self.home_name, changes.home_name);
        replace_if_present(&mut self.street, changes.street);
        replace_if_present(&mut self.suburb, changes.suburb);
        replace_if_present(&mut self.state, changes.state);
        replace_if_present(&mut self.postcode, changes.postcode);
        replace_if_present(&mut self.country, changes.country);
        replace_if_present(&mut self.avatar, changes.avatar);
    }
}

fn replace_if_present(slot: &mut Option<String>, value: Option<String>) {
    if value.is_some() {
        *slot = value;
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ReferralWithId {
    pub id: i64,
    #[serde(flatten)]
    pub referral: Referral,
}

impl ReferralWithId {
    pub fn new(id: i64, referral: Referral) -> Self {
        Self { id, referral }
    }
}
