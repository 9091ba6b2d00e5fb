//! Peer Oracle Cloud VCNs through Local Peering Gateways
//!
//! - [`oci`] - Signed client for the OCI network and identity APIs
//! - [`resource`] - Client trait, sessions, and rollback of created resources
//! - [`peering`] - The peering workflow, its policies and input resolution
//! - [`commands`] - The CLI commands as data, and their execution

pub mod commands;
pub mod config;
pub mod error;
pub mod oci;
pub mod peering;
pub mod resource;

pub use error::{Error, Result, ServiceFailure};
