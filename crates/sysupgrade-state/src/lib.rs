mod layout;
mod store;

pub use layout::{default_upgrade_root, UpgradeLayout};
pub use store::{StateStore, StateTransaction, UpgradeState};
