pub mod commands;
pub mod crc;
pub mod frame;

pub use commands::CommandId;
pub use frame::Frame;
