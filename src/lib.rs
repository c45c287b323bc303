//! Library crate for the gamebot community bot, exposing modules for the binary and integration tests.

pub mod config;
pub mod dao;
pub mod dto;
pub mod error;
pub mod logging;
pub mod services;
pub mod state;
pub mod transport;
