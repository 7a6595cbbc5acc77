//! Protocol core for Huawei FreeBuds headphones.
//!
//! Frames vendor commands for the earbuds' SPP service, serializes them over
//! a single link and decodes responses and notifications into typed state.

pub mod config;
pub mod device;
pub mod dispatch;
pub mod error;
pub mod protocol;
pub mod transport;

pub use device::{ConnectionState, Session};
pub use error::{Error, Result};
