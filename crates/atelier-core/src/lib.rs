//! Atelier Core — domain models, error types, and repository traits
//! shared by the storage, authentication, and server crates.

pub mod error;
pub mod models;
pub mod repository;
