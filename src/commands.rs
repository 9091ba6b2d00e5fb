//! Commands
//!
//! What the CLI can do, as plain data, and the code that carries each one
//! out against the configured profiles.

use crate::config::OciConfig;
use crate::error::Result;
use crate::oci::client::OciClient;
use crate::peering::{LpgMaterial, Orchestrator, PeeringInputs, PeeringOutcome, PollPolicy, TracingObserver};
use crate::resource::{ResourceClient, Session};
use std::io::Write;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum Command {
    PeerIntraTenant {
        config: OciConfig,
        inputs: PeeringInputs,
        poll: PollPolicy,
    },
    PeerInterTenant {
        requestor: OciConfig,
        acceptor: OciConfig,
        inputs: PeeringInputs,
        poll: PollPolicy,
    },
    ListVcns {
        config: OciConfig,
    },
    ListGroups {
        config: OciConfig,
    },
    ListRouteTables {
        config: OciConfig,
        vcn_id: Option<String>,
    },
}

/// Run a command, writing listings to `out`
pub async fn execute(command: Command, out: &mut impl Write) -> Result<()> {
    match command {
        Command::PeerIntraTenant {
            config,
            inputs,
            poll,
        } => {
            let material = LpgMaterial::new(inputs)?;
            let session = Session::new(config.profile.clone(), OciClient::new(&config)?);
            let orchestrator = Orchestrator::new(poll, Arc::new(TracingObserver));
            let outcome = orchestrator.peer_intra_tenant(&session, &material).await?;
            report(&outcome, out)
        }
        Command::PeerInterTenant {
            requestor,
            acceptor,
            inputs,
            poll,
        } => {
            let requestor_session =
                Session::new(requestor.profile.clone(), OciClient::new(&requestor)?);
            let acceptor_session =
                Session::new(acceptor.profile.clone(), OciClient::new(&acceptor)?);
            let orchestrator = Orchestrator::new(poll, Arc::new(TracingObserver));
            let outcome = orchestrator
                .peer_inter_tenant(&requestor_session, &acceptor_session, inputs)
                .await?;
            report(&outcome, out)
        }
        Command::ListVcns { config } => {
            list_vcns(&OciClient::new(&config)?, out).await?;
            Ok(())
        }
        Command::ListGroups { config } => {
            list_groups(&OciClient::new(&config)?, out).await?;
            Ok(())
        }
        Command::ListRouteTables { config, vcn_id } => {
            list_route_tables(&OciClient::new(&config)?, vcn_id.as_deref(), out).await?;
            Ok(())
        }
    }
}

fn report(outcome: &PeeringOutcome, out: &mut impl Write) -> Result<()> {
    writeln!(
        out,
        "LPG {} - {}",
        outcome.requestor_lpg.display_name, outcome.requestor_lpg.id
    )?;
    writeln!(
        out,
        "LPG {} - {}",
        outcome.acceptor_lpg.display_name, outcome.acceptor_lpg.id
    )?;
    Ok(())
}

/// One line per VCN; returns how many were written
pub async fn list_vcns<C>(client: &C, out: &mut impl Write) -> Result<usize>
where
    C: ResourceClient + ?Sized,
{
    let vcns = client.list_vcns().await?;
    for vcn in &vcns {
        writeln!(
            out,
            "VCN {} - {} [{}]",
            vcn.display_name,
            vcn.id,
            vcn.cidrs().join(", ")
        )?;
    }
    Ok(vcns.len())
}

/// One line per group; returns how many were written
pub async fn list_groups<C>(client: &C, out: &mut impl Write) -> Result<usize>
where
    C: ResourceClient + ?Sized,
{
    let groups = client.list_groups().await?;
    for group in &groups {
        writeln!(out, "Group {} - {}", group.name, group.id)?;
    }
    Ok(groups.len())
}

/// One line per route table, optionally limited to one VCN
pub async fn list_route_tables<C>(
    client: &C,
    vcn_id: Option<&str>,
    out: &mut impl Write,
) -> Result<usize>
where
    C: ResourceClient + ?Sized,
{
    let tables = client.list_route_tables(vcn_id).await?;
    for table in &tables {
        writeln!(
            out,
            "Route Table {} - {} (VCN {}, {} rules)",
            table.display_name,
            table.id,
            table.vcn_id,
            table.route_rules.len()
        )?;
    }
    Ok(tables.len())
}
