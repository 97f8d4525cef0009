//! Route handlers for the trigger server
//!
//! - [`events`] - Pipeline invocation
//! - [`system`] - Health

mod events;
mod system;

pub use events::*;
pub use system::*;
