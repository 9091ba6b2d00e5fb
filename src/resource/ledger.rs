//! Resource Ledger
//!
//! In-memory record of everything a session created, and the best-effort
//! rollback that undoes it.

use super::session::modify_route_table;
use super::ResourceClient;
use crate::error::Result;
use crate::oci::models::RouteRule;
use std::collections::BTreeMap;

/// Outcome of one compensation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompensationReport {
    /// Resources removed, or found already absent
    pub removed: usize,
    /// Resources still recorded because their removal failed
    pub failed: usize,
}

impl CompensationReport {
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Gateways, policies and route rules created by one session
///
/// Only resources whose creation call succeeded are ever recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceLedger {
    gateways: Vec<String>,
    policies: Vec<String>,
    route_rules: BTreeMap<String, Vec<RouteRule>>,
}

impl ResourceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_gateway(&mut self, id: &str) {
        if !self.gateways.iter().any(|g| g == id) {
            self.gateways.push(id.to_string());
        }
    }

    pub fn record_policy(&mut self, id: &str) {
        if !self.policies.iter().any(|p| p == id) {
            self.policies.push(id.to_string());
        }
    }

    pub fn record_route_rule(&mut self, table_id: &str, rule: RouteRule) {
        self.route_rules
            .entry(table_id.to_string())
            .or_default()
            .push(rule);
    }

    pub fn gateways(&self) -> &[String] {
        &self.gateways
    }

    pub fn policies(&self) -> &[String] {
        &self.policies
    }

    pub fn route_rules(&self, table_id: &str) -> &[RouteRule] {
        self.route_rules
            .get(table_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.gateways.is_empty() && self.policies.is_empty() && self.route_rules.is_empty()
    }

    /// Take back entries left over from a compensation pass
    pub fn absorb(&mut self, other: ResourceLedger) {
        for id in &other.gateways {
            self.record_gateway(id);
        }
        for id in &other.policies {
            self.record_policy(id);
        }
        for (table_id, rules) in other.route_rules {
            self.route_rules.entry(table_id).or_default().extend(rules);
        }
    }

    /// Undo every recorded resource, newest kind first
    ///
    /// Route rules go before gateways since a gateway that is still a route
    /// target cannot be deleted. Each failure is logged and skipped; whatever
    /// could not be removed stays recorded. Resources already gone count as
    /// removed, so running this twice is harmless.
    pub async fn compensate<C>(&mut self, client: &C, route_update_attempts: u32) -> CompensationReport
    where
        C: ResourceClient + ?Sized,
    {
        let mut report = CompensationReport::default();

        for (table_id, rules) in std::mem::take(&mut self.route_rules) {
            match revert_route_rules(client, &table_id, &rules, route_update_attempts).await {
                Ok(()) => report.removed += rules.len(),
                Err(e) => {
                    tracing::warn!("Failed to remove route rules from {}. {}", table_id, e);
                    report.failed += rules.len();
                    self.route_rules.insert(table_id, rules);
                }
            }
        }

        for id in std::mem::take(&mut self.gateways) {
            match client.delete_lpg(&id).await {
                Ok(()) => {
                    tracing::info!("Deleted LPG {}", id);
                    report.removed += 1;
                }
                Err(e) if e.is_not_found() => {
                    tracing::debug!("LPG {} already absent", id);
                    report.removed += 1;
                }
                Err(e) => {
                    tracing::warn!("Failed to delete LPG {}. {}", id, e);
                    report.failed += 1;
                    self.gateways.push(id);
                }
            }
        }

        for id in std::mem::take(&mut self.policies) {
            match client.delete_policy(&id).await {
                Ok(()) => {
                    tracing::info!("Deleted Policy {}", id);
                    report.removed += 1;
                }
                Err(e) if e.is_not_found() => {
                    tracing::debug!("Policy {} already absent", id);
                    report.removed += 1;
                }
                Err(e) => {
                    tracing::warn!("Failed to delete Policy {}. {}", id, e);
                    report.failed += 1;
                    self.policies.push(id);
                }
            }
        }

        report
    }
}

/// Strip the recorded rules from one table in a single update
async fn revert_route_rules<C>(
    client: &C,
    table_id: &str,
    rules: &[RouteRule],
    attempts: u32,
) -> Result<()>
where
    C: ResourceClient + ?Sized,
{
    let edit = |table: &mut crate::oci::models::RouteTable| {
        let mut removed = 0;
        for rule in rules {
            if table.remove_rule(rule) {
                removed += 1;
            }
        }
        if removed < rules.len() {
            tracing::debug!(
                "{} of {} route rules already gone from {}",
                rules.len() - removed,
                rules.len(),
                table_id
            );
        }
        removed > 0
    };

    match modify_route_table(client, table_id, attempts, edit).await {
        Ok(changed) => {
            if changed {
                tracing::info!("Removed route rules from {}", table_id);
            }
            Ok(())
        }
        Err(e) if e.is_not_found() => {
            tracing::debug!("Route table {} already absent", table_id);
            Ok(())
        }
        Err(e) => Err(e),
    }
}
