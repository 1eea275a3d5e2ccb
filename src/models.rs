pub mod referrals;
pub mod validation;
