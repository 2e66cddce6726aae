//! Domain models for Atelier.
//!
//! These are the core types shared across all crates.

pub mod brand;
pub mod identity;
pub mod profile;
pub mod role;
pub mod session;
