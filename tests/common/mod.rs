//! In-memory cloud shared by the integration tests
//!
//! One [`FakeCloud`] state can be viewed from several tenancies, so a
//! gateway created by one tenant is visible when another polls for it.

#![allow(dead_code)]

use async_trait::async_trait;
use lpgctl::error::{Error, Result, ServiceFailure, NOT_AUTHORIZED_OR_NOT_FOUND, PRECONDITION_FAILED};
use lpgctl::oci::models::{
    CreatePolicy, Group, LocalPeeringGateway, Policy, RouteRule, RouteTable, Vcn,
};
use lpgctl::peering::{Orchestrator, PeeringObserver, PollPolicy, Step};
use lpgctl::resource::ResourceClient;
use serde_json::Map;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Operations that change remote state
pub const MUTATING_OPS: &[&str] = &[
    "create_lpg",
    "delete_lpg",
    "connect_lpgs",
    "create_policy",
    "delete_policy",
    "update_route_table",
];

struct StoredTable {
    compartment: String,
    table: RouteTable,
    version: u32,
}

#[derive(Default)]
struct CloudState {
    tenancies: HashMap<String, String>,
    vcns: Vec<Vcn>,
    groups: Vec<(String, Group)>,
    route_tables: BTreeMap<String, StoredTable>,
    lpgs: BTreeMap<String, LocalPeeringGateway>,
    policies: BTreeMap<String, Policy>,
    connections: Vec<(String, String)>,
    calls: Vec<String>,
    /// (operation, 1-based call number of that operation, failure)
    failures: Vec<(String, usize, ServiceFailure)>,
    hidden_lpg_polls: u32,
    route_table_races: u32,
    next_id: u32,
}

impl CloudState {
    fn next_id(&mut self, kind: &str) -> String {
        self.next_id += 1;
        format!("ocid1.{}.oc1..fake{}", kind, self.next_id)
    }

    fn calls_of(&self, op: &str) -> usize {
        self.calls.iter().filter(|c| c.as_str() == op).count()
    }
}

#[derive(Clone)]
pub struct FakeCloud {
    tenancy_id: String,
    state: Arc<Mutex<CloudState>>,
}

pub fn not_found(what: &str) -> ServiceFailure {
    ServiceFailure::new(
        404,
        NOT_AUTHORIZED_OR_NOT_FOUND,
        format!("Authorization failed or requested resource {} not found.", what),
    )
}

pub fn internal_error() -> ServiceFailure {
    ServiceFailure::new(500, "InternalServerError", "Something went wrong.")
}

impl FakeCloud {
    pub fn new(tenancy_id: &str, tenancy_name: &str) -> Self {
        let cloud = Self {
            tenancy_id: tenancy_id.to_string(),
            state: Arc::new(Mutex::new(CloudState::default())),
        };
        cloud.register_tenancy(tenancy_name);
        cloud
    }

    /// Another tenancy in the same cloud
    pub fn tenant(&self, tenancy_id: &str, tenancy_name: &str) -> Self {
        let other = Self {
            tenancy_id: tenancy_id.to_string(),
            state: Arc::clone(&self.state),
        };
        other.register_tenancy(tenancy_name);
        other
    }

    fn register_tenancy(&self, name: &str) {
        self.state
            .lock()
            .unwrap()
            .tenancies
            .insert(self.tenancy_id.clone(), name.to_string());
    }

    // ---------------------------------------------------------------------
    // Seeding
    // ---------------------------------------------------------------------

    pub fn add_vcn(&self, id: &str, name: &str, cidrs: &[&str]) {
        self.state.lock().unwrap().vcns.push(Vcn {
            id: id.to_string(),
            compartment_id: self.tenancy_id.clone(),
            display_name: name.to_string(),
            cidr_block: cidrs.first().map(|c| c.to_string()),
            cidr_blocks: cidrs.iter().map(|c| c.to_string()).collect(),
            lifecycle_state: Some("AVAILABLE".to_string()),
        });
    }

    pub fn add_group(&self, id: &str, name: &str) {
        self.state.lock().unwrap().groups.push((
            self.tenancy_id.clone(),
            Group {
                id: id.to_string(),
                name: name.to_string(),
                description: String::new(),
            },
        ));
    }

    pub fn add_route_table(&self, id: &str, vcn_id: &str, rules: Vec<RouteRule>) {
        self.state.lock().unwrap().route_tables.insert(
            id.to_string(),
            StoredTable {
                compartment: self.tenancy_id.clone(),
                table: RouteTable {
                    id: id.to_string(),
                    vcn_id: vcn_id.to_string(),
                    display_name: format!("{} routes", vcn_id),
                    route_rules: rules,
                    defined_tags: Map::new(),
                    freeform_tags: Map::new(),
                    etag: None,
                },
                version: 1,
            },
        );
    }

    /// Pretend an LPG already exists (for cleanup tests)
    pub fn add_lpg(&self, id: &str, vcn_id: &str) {
        self.state.lock().unwrap().lpgs.insert(
            id.to_string(),
            LocalPeeringGateway {
                id: id.to_string(),
                vcn_id: vcn_id.to_string(),
                display_name: id.to_string(),
                lifecycle_state: Some("AVAILABLE".to_string()),
                peering_status: Some("NEW".to_string()),
            },
        );
    }

    pub fn add_policy(&self, id: &str) {
        self.state.lock().unwrap().policies.insert(
            id.to_string(),
            Policy {
                id: id.to_string(),
                name: id.to_string(),
                description: String::new(),
                statements: vec![],
            },
        );
    }

    // ---------------------------------------------------------------------
    // Failure injection
    // ---------------------------------------------------------------------

    /// Fail the next call of `op`
    pub fn fail_next(&self, op: &str, failure: ServiceFailure) {
        let mut state = self.state.lock().unwrap();
        let nth = state.calls_of(op) + 1;
        state.failures.push((op.to_string(), nth, failure));
    }

    /// Fail the `nth` call of `op`, counting from the start
    pub fn fail_call(&self, op: &str, nth: usize, failure: ServiceFailure) {
        self.state
            .lock()
            .unwrap()
            .failures
            .push((op.to_string(), nth, failure));
    }

    /// Answer `NotAuthorizedOrNotFound` to the next `polls` LPG reads
    pub fn hide_lpgs_for(&self, polls: u32) {
        self.state.lock().unwrap().hidden_lpg_polls = polls;
    }

    /// Change the next `races` route tables right after they are read
    pub fn race_route_table_updates(&self, races: u32) {
        self.state.lock().unwrap().route_table_races = races;
    }

    // ---------------------------------------------------------------------
    // Inspection
    // ---------------------------------------------------------------------

    pub fn route_rules(&self, table_id: &str) -> Vec<RouteRule> {
        self.state
            .lock()
            .unwrap()
            .route_tables
            .get(table_id)
            .map(|stored| stored.table.route_rules.clone())
            .unwrap_or_default()
    }

    pub fn lpg_ids(&self) -> Vec<String> {
        self.state.lock().unwrap().lpgs.keys().cloned().collect()
    }

    pub fn policies(&self) -> Vec<Policy> {
        self.state.lock().unwrap().policies.values().cloned().collect()
    }

    pub fn connections(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().connections.clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self, op: &str) -> usize {
        self.state.lock().unwrap().calls_of(op)
    }

    pub fn mutations(&self) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| MUTATING_OPS.contains(&c.as_str()))
            .count()
    }

    /// Log the call and apply any failure scheduled for it
    fn enter(&self, op: &str) -> Result<std::sync::MutexGuard<'_, CloudState>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(op.to_string());
        let nth = state.calls_of(op);
        if let Some(index) = state
            .failures
            .iter()
            .position(|(name, n, _)| name == op && *n == nth)
        {
            let (_, _, failure) = state.failures.remove(index);
            return Err(Error::Service(failure));
        }
        Ok(state)
    }
}

#[async_trait]
impl ResourceClient for FakeCloud {
    fn compartment_id(&self) -> &str {
        &self.tenancy_id
    }

    async fn get_tenancy_name(&self) -> Result<String> {
        let state = self.enter("get_tenancy_name")?;
        state
            .tenancies
            .get(&self.tenancy_id)
            .cloned()
            .ok_or_else(|| Error::Service(not_found(&self.tenancy_id)))
    }

    async fn get_vcn(&self, vcn_id: &str) -> Result<Vcn> {
        let state = self.enter("get_vcn")?;
        state
            .vcns
            .iter()
            .find(|v| v.id == vcn_id)
            .cloned()
            .ok_or_else(|| Error::Service(not_found(vcn_id)))
    }

    async fn list_vcns(&self) -> Result<Vec<Vcn>> {
        let state = self.enter("list_vcns")?;
        Ok(state
            .vcns
            .iter()
            .filter(|v| v.compartment_id == self.tenancy_id)
            .cloned()
            .collect())
    }

    async fn list_groups(&self) -> Result<Vec<Group>> {
        let state = self.enter("list_groups")?;
        Ok(state
            .groups
            .iter()
            .filter(|(compartment, _)| *compartment == self.tenancy_id)
            .map(|(_, group)| group.clone())
            .collect())
    }

    async fn list_route_tables(&self, vcn_id: Option<&str>) -> Result<Vec<RouteTable>> {
        let state = self.enter("list_route_tables")?;
        Ok(state
            .route_tables
            .values()
            .filter(|stored| stored.compartment == self.tenancy_id)
            .filter(|stored| vcn_id.map_or(true, |vcn| stored.table.vcn_id == vcn))
            .map(|stored| stored.table.clone())
            .collect())
    }

    async fn get_route_table(&self, route_table_id: &str) -> Result<RouteTable> {
        let mut state = self.enter("get_route_table")?;
        let race = state.route_table_races > 0;
        if race {
            state.route_table_races -= 1;
        }
        let stored = state
            .route_tables
            .get_mut(route_table_id)
            .ok_or_else(|| Error::Service(not_found(route_table_id)))?;

        let mut table = stored.table.clone();
        table.etag = Some(format!("v{}", stored.version));
        if race {
            stored.version += 1;
        }
        Ok(table)
    }

    async fn update_route_table(&self, table: &RouteTable) -> Result<RouteTable> {
        let mut state = self.enter("update_route_table")?;
        let stored = state
            .route_tables
            .get_mut(&table.id)
            .ok_or_else(|| Error::Service(not_found(&table.id)))?;

        let current = format!("v{}", stored.version);
        if table.etag.as_deref().is_some_and(|etag| etag != current) {
            return Err(Error::Service(ServiceFailure::new(
                412,
                PRECONDITION_FAILED,
                "The resource has been modified.",
            )));
        }

        stored.table.route_rules = table.route_rules.clone();
        stored.version += 1;
        let mut updated = stored.table.clone();
        updated.etag = Some(format!("v{}", stored.version));
        Ok(updated)
    }

    async fn create_lpg(&self, vcn_id: &str, display_name: &str) -> Result<LocalPeeringGateway> {
        let mut state = self.enter("create_lpg")?;
        if !state.vcns.iter().any(|v| v.id == vcn_id) {
            return Err(Error::Service(not_found(vcn_id)));
        }
        let id = state.next_id("localpeeringgateway");
        let lpg = LocalPeeringGateway {
            id: id.clone(),
            vcn_id: vcn_id.to_string(),
            display_name: display_name.to_string(),
            lifecycle_state: Some("AVAILABLE".to_string()),
            peering_status: Some("NEW".to_string()),
        };
        state.lpgs.insert(id, lpg.clone());
        Ok(lpg)
    }

    async fn get_lpg(&self, lpg_id: &str) -> Result<LocalPeeringGateway> {
        let mut state = self.enter("get_lpg")?;
        if state.hidden_lpg_polls > 0 {
            state.hidden_lpg_polls -= 1;
            return Err(Error::Service(not_found(lpg_id)));
        }
        state
            .lpgs
            .get(lpg_id)
            .cloned()
            .ok_or_else(|| Error::Service(not_found(lpg_id)))
    }

    async fn delete_lpg(&self, lpg_id: &str) -> Result<()> {
        let mut state = self.enter("delete_lpg")?;
        let routed = state
            .route_tables
            .values()
            .any(|stored| stored.table.route_rules.iter().any(|r| r.network_entity_id == lpg_id));
        if routed {
            return Err(Error::Service(ServiceFailure::new(
                409,
                "Conflict",
                "The LPG is the target of a route rule.",
            )));
        }
        match state.lpgs.remove(lpg_id) {
            Some(_) => Ok(()),
            None => Err(Error::Service(not_found(lpg_id))),
        }
    }

    async fn connect_lpgs(&self, requestor_lpg_id: &str, acceptor_lpg_id: &str) -> Result<()> {
        let mut state = self.enter("connect_lpgs")?;
        for id in [requestor_lpg_id, acceptor_lpg_id] {
            if !state.lpgs.contains_key(id) {
                return Err(Error::Service(not_found(id)));
            }
        }
        for id in [requestor_lpg_id, acceptor_lpg_id] {
            if let Some(lpg) = state.lpgs.get_mut(id) {
                lpg.peering_status = Some("PEERED".to_string());
            }
        }
        state
            .connections
            .push((requestor_lpg_id.to_string(), acceptor_lpg_id.to_string()));
        Ok(())
    }

    async fn create_policy(&self, policy: &CreatePolicy) -> Result<Policy> {
        let mut state = self.enter("create_policy")?;
        let id = state.next_id("policy");
        let created = Policy {
            id: id.clone(),
            name: policy.name.clone(),
            description: policy.description.clone(),
            statements: policy.statements.clone(),
        };
        state.policies.insert(id, created.clone());
        Ok(created)
    }

    async fn delete_policy(&self, policy_id: &str) -> Result<()> {
        let mut state = self.enter("delete_policy")?;
        match state.policies.remove(policy_id) {
            Some(_) => Ok(()),
            None => Err(Error::Service(not_found(policy_id))),
        }
    }
}

/// Observer that remembers every step it saw
#[derive(Default)]
pub struct RecordingObserver {
    pub started: Mutex<Vec<Step>>,
    pub failed: Mutex<Vec<Step>>,
    pub waits: Mutex<u32>,
}

impl PeeringObserver for RecordingObserver {
    fn step_started(&self, step: Step, _target: &str) {
        self.started.lock().unwrap().push(step);
    }

    fn step_failed(&self, step: Step, _error: &Error) {
        self.failed.lock().unwrap().push(step);
    }

    fn waiting_for_peer(&self, _attempt: u32) {
        *self.waits.lock().unwrap() += 1;
    }
}

pub fn fast_poll(max_attempts: u32) -> PollPolicy {
    PollPolicy {
        interval: Duration::from_millis(1),
        max_attempts,
    }
}

pub fn orchestrator(poll: PollPolicy) -> Orchestrator {
    Orchestrator::new(poll, Arc::new(lpgctl::peering::NoOpObserver))
}
