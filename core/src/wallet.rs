mod types;
mod version_helper;
mod versioned;
mod wallet_helper;

pub use types::*;
pub use version_helper::*;
pub use versioned::*;
pub use wallet_helper::*;
