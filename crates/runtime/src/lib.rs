pub mod event_bus;
pub mod liveness;

pub use event_bus::*;
pub use liveness::*;
