//! Utility functions shared across the crate.

mod secret;

pub use secret::SecretString;

use std::net::SocketAddr;

/// Parse a host and port into a bind address.
///
/// # Example
/// ```ignore
/// let addr = bind_addr("127.0.0.1", 20380)?;
/// ```
pub fn bind_addr(host: &str, port: u16) -> Result<SocketAddr, std::net::AddrParseError> {
    format!("{}:{}", host, port).parse()
}
