pub mod cell;
pub mod crypto;
pub mod message;
pub mod tlb_types;
pub mod types;
pub mod wallet;

pub use crate::types::{TonAddress, TonAddressParseError, TonHash};
