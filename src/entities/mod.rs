//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod admin_settings;
pub mod cpm_rate;
pub mod link;
pub mod link_view;
pub mod referral;
pub mod referral_earning;
pub mod user;
pub mod withdrawal;

// Re-export specific types to avoid conflicts
pub use admin_settings::{
    Column as AdminSettingsColumn, Entity as AdminSettings, Model as AdminSettingsModel,
};
pub use cpm_rate::{Column as CpmRateColumn, Entity as CpmRate, Model as CpmRateModel};
pub use link::{Column as LinkColumn, Entity as Link, Model as LinkModel};
pub use link_view::{Column as LinkViewColumn, Entity as LinkView, Model as LinkViewModel};
pub use referral::{Column as ReferralColumn, Entity as Referral, Model as ReferralModel};
pub use referral_earning::{
    Column as ReferralEarningColumn, Entity as ReferralEarning, Model as ReferralEarningModel,
};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
pub use withdrawal::{
    Column as WithdrawalColumn, Entity as Withdrawal, Model as WithdrawalModel,
};
