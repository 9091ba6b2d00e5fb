//! OCI API interaction module
//!
//! This module provides the core functionality for interacting with the
//! Oracle Cloud Infrastructure control plane: request signing, the HTTP
//! client, resource models, and the client implementing
//! [`ResourceClient`](crate::resource::ResourceClient).
//!
//! # Module Structure
//!
//! - [`auth`] - HTTP Signature request signing with the profile's API key
//! - [`client`] - Main OCI client for the network and identity services
//! - [`http`] - Signed HTTP calls and service error decoding
//! - [`models`] - VCNs, groups, gateways, policies and route tables
//!
//! # Example
//!
//! ```ignore
//! use lpgctl::config::OciConfig;
//! use lpgctl::oci::client::OciClient;
//! use lpgctl::resource::ResourceClient;
//!
//! async fn example() -> lpgctl::error::Result<()> {
//!     let config = OciConfig::from_file(&OciConfig::default_path(), "DEFAULT")?;
//!     let client = OciClient::new(&config)?;
//!     let vcns = client.list_vcns().await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;
pub mod models;
