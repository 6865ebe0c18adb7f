pub mod events;
pub mod reducer;

pub use events::{SessionEvent, SessionMessage, Update};
pub use reducer::reduce;
