//! HTTP request handlers.

pub mod admin;
pub mod board;
pub mod health;
