//! Session
//!
//! One authenticated scope. Resources are created through the session so
//! each success lands in its ledger, and [`with_session`] rolls the ledger
//! back when the wrapped work fails.

use super::ledger::{CompensationReport, ResourceLedger};
use super::ResourceClient;
use crate::error::Result;
use crate::oci::models::{CreatePolicy, LocalPeeringGateway, Policy, RouteRule, RouteTable};
use std::future::Future;
use tokio::sync::Mutex;

/// Read-modify-write attempts on a route table before giving up on `if-match` conflicts
pub const DEFAULT_ROUTE_UPDATE_ATTEMPTS: u32 = 3;

pub struct Session<C> {
    name: String,
    client: C,
    ledger: Mutex<ResourceLedger>,
    route_update_attempts: u32,
}

impl<C: ResourceClient> Session<C> {
    pub fn new(name: impl Into<String>, client: C) -> Self {
        Self {
            name: name.into(),
            client,
            ledger: Mutex::new(ResourceLedger::new()),
            route_update_attempts: DEFAULT_ROUTE_UPDATE_ATTEMPTS,
        }
    }

    pub fn with_route_update_attempts(mut self, attempts: u32) -> Self {
        self.route_update_attempts = attempts.max(1);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn compartment_id(&self) -> &str {
        self.client.compartment_id()
    }

    /// Snapshot of what this session has created so far
    pub async fn ledger(&self) -> ResourceLedger {
        self.ledger.lock().await.clone()
    }

    pub async fn create_lpg(&self, vcn_id: &str, display_name: &str) -> Result<LocalPeeringGateway> {
        let lpg = self.client.create_lpg(vcn_id, display_name).await?;
        self.ledger.lock().await.record_gateway(&lpg.id);
        tracing::debug!(session = %self.name, "Recorded LPG {}", lpg.id);
        Ok(lpg)
    }

    pub async fn create_policy(&self, policy: &CreatePolicy) -> Result<Policy> {
        let created = self.client.create_policy(policy).await?;
        self.ledger.lock().await.record_policy(&created.id);
        tracing::debug!(session = %self.name, "Recorded Policy {}", created.id);
        Ok(created)
    }

    /// Append `rule` to a route table and record it for rollback
    pub async fn add_route_rule(&self, route_table_id: &str, rule: RouteRule) -> Result<()> {
        let appended = rule.clone();
        modify_route_table(
            &self.client,
            route_table_id,
            self.route_update_attempts,
            |table| {
                table.route_rules.push(appended.clone());
                true
            },
        )
        .await?;

        self.ledger
            .lock()
            .await
            .record_route_rule(route_table_id, rule);
        Ok(())
    }

    /// Undo everything recorded so far
    ///
    /// The ledger is detached while remote calls run; leftovers are put back.
    pub async fn compensate(&self) -> CompensationReport {
        let mut pending = std::mem::take(&mut *self.ledger.lock().await);
        if pending.is_empty() {
            return CompensationReport::default();
        }

        tracing::info!(session = %self.name, "Cleaning up created resources");
        let report = pending
            .compensate(&self.client, self.route_update_attempts)
            .await;
        self.ledger.lock().await.absorb(pending);

        if report.is_clean() {
            tracing::info!(session = %self.name, "Removed {} resources", report.removed);
        } else {
            tracing::warn!(
                session = %self.name,
                "Removed {} resources, {} left behind",
                report.removed,
                report.failed
            );
        }
        report
    }
}

/// Run `work`, compensating the session's ledger if it fails
///
/// The original error is returned after cleanup; cleanup failures are only
/// logged.
pub async fn with_session<C, T, F>(session: &Session<C>, work: F) -> Result<T>
where
    C: ResourceClient,
    F: Future<Output = Result<T>>,
{
    match work.await {
        Ok(value) => Ok(value),
        Err(err) => {
            tracing::debug!(session = %session.name(), "Work failed, compensating: {}", err);
            session.compensate().await;
            Err(err)
        }
    }
}

/// Read a route table, apply `edit`, write it back
///
/// The write carries the etag of the read, so a concurrent change makes it
/// fail with a precondition error; the whole cycle is then repeated up to
/// `attempts` times. Returns `false` without writing when `edit` reports no
/// change.
pub(crate) async fn modify_route_table<C, F>(
    client: &C,
    route_table_id: &str,
    attempts: u32,
    mut edit: F,
) -> Result<bool>
where
    C: ResourceClient + ?Sized,
    F: FnMut(&mut RouteTable) -> bool,
{
    let attempts = attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        let mut table = client.get_route_table(route_table_id).await?;
        if !edit(&mut table) {
            return Ok(false);
        }

        match client.update_route_table(&table).await {
            Ok(_) => return Ok(true),
            Err(e) if e.is_precondition_failed() && attempt < attempts => {
                tracing::warn!(
                    "Route table {} changed while updating, retrying ({}/{})",
                    route_table_id,
                    attempt,
                    attempts
                );
            }
            Err(e) => return Err(e),
        }
    }
}
