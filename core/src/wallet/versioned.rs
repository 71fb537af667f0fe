mod utils;
mod v2;
mod v3;
mod v4;

pub use v2::*;
pub use v3::*;
pub use v4::*;
