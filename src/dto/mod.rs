//! Wire shapes exchanged with the messaging platform.

/// Reply keyboards.
pub mod keyboard;
/// Inbound and outbound chat messages.
pub mod message;
/// Two-stage button payload codec.
pub mod payload;
