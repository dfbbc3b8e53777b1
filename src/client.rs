//! Chat gateway client.
//!
//! Keep the public surface small: one [`ChatGateway`], built by
//! [`ChatGatewayBuilder`]. Implementation details are split into submodules
//! under `src/client/`.

pub mod builder;
pub mod chat;
pub mod core;
pub mod sessions;

pub use builder::ChatGatewayBuilder;
pub use chat::SendMessageBuilder;
pub use core::ChatGateway;
