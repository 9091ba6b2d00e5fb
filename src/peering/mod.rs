//! LPG peering workflow
//!
//! The orchestrator runs one fixed sequence:
//!
//! 1. read both VCNs (or both tenancies)
//! 2. create the requestor and acceptor policies
//! 3. create one LPG per VCN
//! 4. wait until the requestor can see the acceptor's LPG
//! 5. connect the LPGs
//! 6. add a route rule on each side pointing at its LPG
//!
//! Every creation goes through a [`Session`], and the whole sequence runs
//! inside [`with_session`], so a failure at any step rolls back what the
//! earlier steps created before the error is returned.

pub mod material;
pub mod observer;
pub mod policy;
pub mod resolver;

use crate::error::{Error, Result, NOT_AUTHORIZED_OR_NOT_FOUND};
use crate::oci::models::{CreatePolicy, LocalPeeringGateway, Policy, RouteRule};
use crate::resource::{with_session, ResourceClient, Session};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub use material::{LpgMaterial, PeeringInputs};
pub use observer::{NoOpObserver, PeeringObserver, Step, TracingObserver};
pub use resolver::InventoryResolver;

/// How long to wait for the acceptor's LPG to become visible
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_attempts: 120,
        }
    }
}

/// Resources created by a successful run
#[derive(Debug, Clone)]
pub struct PeeringOutcome {
    pub requestor_policy: Policy,
    pub acceptor_policy: Policy,
    pub requestor_lpg: LocalPeeringGateway,
    pub acceptor_lpg: LocalPeeringGateway,
}

/// Names and policies that differ between the two workflows
struct PeeringPlan {
    requestor_label: String,
    acceptor_label: String,
    requestor_policy: CreatePolicy,
    acceptor_policy: CreatePolicy,
    requestor_lpg_name: String,
    acceptor_lpg_name: String,
}

pub struct Orchestrator {
    poll: PollPolicy,
    observer: Arc<dyn PeeringObserver>,
}

impl Orchestrator {
    pub fn new(poll: PollPolicy, observer: Arc<dyn PeeringObserver>) -> Self {
        Self { poll, observer }
    }

    /// Peer two VCNs of one tenancy
    pub async fn peer_intra_tenant<C>(
        &self,
        session: &Session<C>,
        material: &LpgMaterial,
    ) -> Result<PeeringOutcome>
    where
        C: ResourceClient,
    {
        with_session(session, self.run_intra_tenant(session, material)).await
    }

    /// Peer VCNs of two tenancies, filling omitted inputs from inventory first
    ///
    /// Resolution only reads, so an ambiguity returns before anything exists
    /// to roll back. Afterwards each session rolls back its own resources,
    /// acceptor first.
    pub async fn peer_inter_tenant<C>(
        &self,
        requestor: &Session<C>,
        acceptor: &Session<C>,
        inputs: PeeringInputs,
    ) -> Result<PeeringOutcome>
    where
        C: ResourceClient,
    {
        let material = InventoryResolver::new(requestor.client(), acceptor.client())
            .resolve(inputs)
            .await?;

        let work = self.run_inter_tenant(requestor, acceptor, &material);
        with_session(requestor, with_session(acceptor, work)).await
    }

    async fn run_intra_tenant<C>(
        &self,
        session: &Session<C>,
        material: &LpgMaterial,
    ) -> Result<PeeringOutcome>
    where
        C: ResourceClient,
    {
        let (requestor_vcn, acceptor_vcn) = self
            .step(Step::FetchVcns, "", async {
                let requestor = session.client().get_vcn(material.requestor_vcn()).await?;
                let acceptor = session.client().get_vcn(material.acceptor_vcn()).await?;
                Ok::<_, Error>((requestor, acceptor))
            })
            .await?;

        let requestor_name = requestor_vcn.display_name;
        let acceptor_name = acceptor_vcn.display_name;
        let compartment = session.compartment_id();

        let plan = PeeringPlan {
            requestor_policy: policy::intra_requestor_policy(
                &acceptor_name,
                material.requestor_group(),
                compartment,
            ),
            acceptor_policy: policy::intra_acceptor_policy(
                &requestor_name,
                material.requestor_group(),
                compartment,
            ),
            requestor_lpg_name: format!("{}_to_{}", requestor_name, acceptor_name),
            acceptor_lpg_name: format!("{}_to_{}", acceptor_name, requestor_name),
            requestor_label: requestor_name,
            acceptor_label: acceptor_name,
        };

        self.establish(session, session, material, plan).await
    }

    async fn run_inter_tenant<C>(
        &self,
        requestor: &Session<C>,
        acceptor: &Session<C>,
        material: &LpgMaterial,
    ) -> Result<PeeringOutcome>
    where
        C: ResourceClient,
    {
        let (requestor_name, acceptor_name) = self
            .step(Step::FetchTenancies, "", async {
                let requestor_name = requestor.client().get_tenancy_name().await?;
                let acceptor_name = acceptor.client().get_tenancy_name().await?;
                Ok::<_, Error>((requestor_name, acceptor_name))
            })
            .await?;

        let plan = PeeringPlan {
            requestor_policy: policy::inter_requestor_policy(
                &acceptor_name,
                requestor.compartment_id(),
                acceptor.compartment_id(),
                material.requestor_group(),
            ),
            acceptor_policy: policy::inter_acceptor_policy(
                &requestor_name,
                requestor.compartment_id(),
                acceptor.compartment_id(),
                material.requestor_group(),
            ),
            requestor_lpg_name: format!("{}_to_{}", requestor_name, acceptor_name),
            acceptor_lpg_name: format!("{}_to_{}", acceptor_name, requestor_name),
            requestor_label: requestor_name,
            acceptor_label: acceptor_name,
        };

        self.establish(requestor, acceptor, material, plan).await
    }

    /// Policies, gateways, connection and routes, shared by both workflows
    async fn establish<C>(
        &self,
        requestor: &Session<C>,
        acceptor: &Session<C>,
        material: &LpgMaterial,
        plan: PeeringPlan,
    ) -> Result<PeeringOutcome>
    where
        C: ResourceClient,
    {
        let requestor_policy = self
            .step(
                Step::CreateRequestorPolicy,
                &plan.requestor_label,
                requestor.create_policy(&plan.requestor_policy),
            )
            .await?;

        let acceptor_policy = self
            .step(
                Step::CreateAcceptorPolicy,
                &plan.acceptor_label,
                acceptor.create_policy(&plan.acceptor_policy),
            )
            .await?;

        let requestor_lpg = self
            .step(
                Step::CreateRequestorLpg,
                &plan.requestor_label,
                requestor.create_lpg(material.requestor_vcn(), &plan.requestor_lpg_name),
            )
            .await?;

        let acceptor_lpg = self
            .step(
                Step::CreateAcceptorLpg,
                &plan.acceptor_label,
                acceptor.create_lpg(material.acceptor_vcn(), &plan.acceptor_lpg_name),
            )
            .await?;

        self.step(
            Step::WaitForAcceptorLpg,
            "",
            self.wait_for_peer(requestor, &acceptor_lpg.id),
        )
        .await?;

        self.step(
            Step::ConnectLpgs,
            "",
            requestor
                .client()
                .connect_lpgs(&requestor_lpg.id, &acceptor_lpg.id),
        )
        .await?;

        self.step(
            Step::AddRequestorRoute,
            &plan.requestor_label,
            requestor.add_route_rule(
                material.requestor_route_table(),
                RouteRule::to_gateway(material.acceptor_cidr(), &requestor_lpg.id),
            ),
        )
        .await?;

        self.step(
            Step::AddAcceptorRoute,
            &plan.acceptor_label,
            acceptor.add_route_rule(
                material.acceptor_route_table(),
                RouteRule::to_gateway(material.requestor_cidr(), &acceptor_lpg.id),
            ),
        )
        .await?;

        tracing::info!(
            "Peered {} and {} through {} and {}",
            plan.requestor_label,
            plan.acceptor_label,
            requestor_lpg.id,
            acceptor_lpg.id
        );

        Ok(PeeringOutcome {
            requestor_policy,
            acceptor_policy,
            requestor_lpg,
            acceptor_lpg,
        })
    }

    /// Poll the acceptor's LPG through the requestor until it is readable
    ///
    /// Only `NotAuthorizedOrNotFound` means "not yet"; any other failure
    /// ends the wait.
    async fn wait_for_peer<C>(&self, requestor: &Session<C>, lpg_id: &str) -> Result<()>
    where
        C: ResourceClient,
    {
        let attempts = self.poll.max_attempts.max(1);

        for attempt in 1..=attempts {
            match requestor.client().get_lpg(lpg_id).await {
                Ok(_) => return Ok(()),
                Err(Error::Service(failure)) if failure.code == NOT_AUTHORIZED_OR_NOT_FOUND => {
                    self.observer.waiting_for_peer(attempt);
                    if attempt < attempts {
                        tokio::time::sleep(self.poll.interval).await;
                    }
                }
                Err(e) => return Err(e),
            }
        }

        Err(Error::PollTimeout {
            what: format!("LPG {}", lpg_id),
            attempts,
        })
    }

    /// Run one step, reporting it to the observer
    async fn step<T, F>(&self, step: Step, target: &str, work: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.observer.step_started(step, target);
        match work.await {
            Ok(value) => {
                self.observer.step_finished(step);
                Ok(value)
            }
            Err(e) => {
                self.observer.step_failed(step, &e);
                Err(e)
            }
        }
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new(PollPolicy::default(), Arc::new(TracingObserver))
    }
}
