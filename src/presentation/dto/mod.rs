pub mod messages;
pub mod push;

pub use messages::{CommandReply, ForegroundCommand};
pub use push::NotificationActionMessage;
