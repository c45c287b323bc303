//! VK community bot adapter: API client and Bots Long Poll loop.

pub mod client;
pub mod error;
pub mod long_poll;
pub mod models;

pub use client::VkClient;
pub use error::{VkError, VkResult};
pub use long_poll::LongPoll;
