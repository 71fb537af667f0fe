mod common_msg_info;
mod error;
mod transfer;

pub use common_msg_info::*;
pub use error::*;
pub use transfer::*;
