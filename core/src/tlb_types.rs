mod state_init;
mod traits;

pub use state_init::*;
pub use traits::*;
