//! Bearer-token gate in front of every render entry point.
//!
//! Tokens are issued by the upstream session provider; this service only verifies them.

pub mod jwt;
pub mod middleware;
pub mod model;

#[cfg(test)]
mod tests;

pub use jwt::*;
pub use middleware::*;
pub use model::*;
