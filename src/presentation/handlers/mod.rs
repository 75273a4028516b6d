pub mod message_handler;
pub mod push_handler;

pub use message_handler::MessageHandler;
pub use push_handler::PushHandler;
