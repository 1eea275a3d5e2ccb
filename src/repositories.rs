pub mod referrals;
pub mod uploads;
