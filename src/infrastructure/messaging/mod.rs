pub mod foreground_channel;
pub mod registrar;

pub use foreground_channel::{ForegroundChannel, ForegroundEvent};
pub use registrar::InProcessSyncRegistrar;
