pub mod api;
pub mod config;
pub mod error;
pub mod session;
pub mod sync;

#[cfg(test)]
mod tests;

pub use error::{DnsError, Result};
