//! Yahoo module - Client implementation for Yahoo Fantasy

pub mod auth;
pub mod client;
pub mod messages;
pub mod rest;

pub use client::YahooClient;
