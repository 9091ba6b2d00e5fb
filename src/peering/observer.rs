//! Progress reporting for the peering workflow

use crate::error::Error;
use std::fmt;

/// One step of the peering workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    FetchVcns,
    FetchTenancies,
    CreateRequestorPolicy,
    CreateAcceptorPolicy,
    CreateRequestorLpg,
    CreateAcceptorLpg,
    WaitForAcceptorLpg,
    ConnectLpgs,
    AddRequestorRoute,
    AddAcceptorRoute,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Step::FetchVcns => "fetching VCNs",
            Step::FetchTenancies => "fetching tenancy names",
            Step::CreateRequestorPolicy => "creating Policy on requestor",
            Step::CreateAcceptorPolicy => "creating Policy on acceptor",
            Step::CreateRequestorLpg => "creating LPG on requestor",
            Step::CreateAcceptorLpg => "creating LPG on acceptor",
            Step::WaitForAcceptorLpg => "waiting for acceptor's LPG to be visible to requestor",
            Step::ConnectLpgs => "connecting two LPGs",
            Step::AddRequestorRoute => "adding LPG route rule to requestor's Route Table",
            Step::AddAcceptorRoute => "adding LPG route rule to acceptor's Route Table",
        };
        f.write_str(text)
    }
}

/// Receives workflow progress; every hook defaults to doing nothing
pub trait PeeringObserver: Send + Sync {
    /// `target` names what the step acts on (a VCN or tenancy name), may be empty
    fn step_started(&self, _step: Step, _target: &str) {}

    fn step_finished(&self, _step: Step) {}

    fn step_failed(&self, _step: Step, _error: &Error) {}

    /// The acceptor's gateway was not visible yet on poll `attempt`
    fn waiting_for_peer(&self, _attempt: u32) {}
}

/// Observer that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpObserver;

impl PeeringObserver for NoOpObserver {}

/// Observer that logs through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl PeeringObserver for TracingObserver {
    fn step_started(&self, step: Step, target: &str) {
        let text = capitalize(&step.to_string());
        if target.is_empty() {
            tracing::info!("{}", text);
        } else {
            tracing::info!("{} ({})", text, target);
        }
    }

    fn step_finished(&self, step: Step) {
        tracing::debug!("Done {}", step);
    }

    fn step_failed(&self, step: Step, error: &Error) {
        tracing::error!("Failed {}. {}", step, error);
    }

    fn waiting_for_peer(&self, attempt: u32) {
        tracing::debug!("Acceptor's LPG not visible yet (attempt {})", attempt);
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
