pub mod chat;
pub mod recording;
