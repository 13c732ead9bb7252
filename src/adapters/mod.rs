//! Adapters implementing the ports over concrete infrastructure.

pub mod ai;
pub mod http;
pub mod store;
