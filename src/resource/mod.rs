//! Resource abstraction layer
//!
//! The orchestration code only talks to the cloud through [`ResourceClient`],
//! and only creates resources through a [`Session`], which records each
//! creation in its [`ResourceLedger`] so a failed run can be rolled back.
//!
//! # Architecture
//!
//! - [`ledger`] - Records created gateways, policies and route rules, and undoes them
//! - [`session`] - One authenticated scope: a client plus its ledger
//! - [`fetcher`] - Auto-pagination over list endpoints

pub mod fetcher;
pub mod ledger;
pub mod session;

use crate::error::Result;
use crate::oci::models::{
    CreatePolicy, Group, LocalPeeringGateway, Policy, RouteTable, Vcn,
};
use async_trait::async_trait;

pub use ledger::ResourceLedger;
pub use session::{with_session, Session};

/// Remote operations against the network and identity control planes
///
/// Calls are scoped to [`ResourceClient::compartment_id`] unless they take an
/// explicit resource id. Implementations never retry.
#[async_trait]
pub trait ResourceClient: Send + Sync {
    /// Tenancy (root compartment) this client acts in
    fn compartment_id(&self) -> &str;

    async fn get_tenancy_name(&self) -> Result<String>;

    async fn get_vcn(&self, vcn_id: &str) -> Result<Vcn>;

    async fn list_vcns(&self) -> Result<Vec<Vcn>>;

    async fn list_groups(&self) -> Result<Vec<Group>>;

    async fn list_route_tables(&self, vcn_id: Option<&str>) -> Result<Vec<RouteTable>>;

    /// Read a route table, including its etag
    async fn get_route_table(&self, route_table_id: &str) -> Result<RouteTable>;

    /// Replace a route table's rules, guarded by its etag when present
    async fn update_route_table(&self, table: &RouteTable) -> Result<RouteTable>;

    async fn create_lpg(&self, vcn_id: &str, display_name: &str) -> Result<LocalPeeringGateway>;

    async fn get_lpg(&self, lpg_id: &str) -> Result<LocalPeeringGateway>;

    async fn delete_lpg(&self, lpg_id: &str) -> Result<()>;

    /// Peer `requestor_lpg_id` with `acceptor_lpg_id`
    async fn connect_lpgs(&self, requestor_lpg_id: &str, acceptor_lpg_id: &str) -> Result<()>;

    async fn create_policy(&self, policy: &CreatePolicy) -> Result<Policy>;

    async fn delete_policy(&self, policy_id: &str) -> Result<()>;
}
