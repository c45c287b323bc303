//! Conversation behaviour built on top of state and persistence.

/// Welcome menu.
pub mod menu;
/// Per-message entry point: identity, routing, replies.
pub mod message_service;
/// Guided result recording.
pub mod recording_service;
/// "My results" listing.
pub mod results_service;
/// Top-level action selection.
pub mod router;
