//! IAM policy statements authorizing LPG peering
//!
//! Within one tenancy plain `Allow` statements suffice. Across tenancies the
//! requestor endorses its group for the acceptor tenancy and the acceptor
//! admits that group.

use crate::oci::models::CreatePolicy;

/// Requestor side, single tenancy
pub fn intra_requestor_policy(acceptor_vcn_name: &str, group: &str, compartment: &str) -> CreatePolicy {
    named(
        format!("request_lpg_to_vcn_{}", acceptor_vcn_name),
        vec![format!(
            "Allow group id {} to manage local-peering-from in compartment id {}",
            group, compartment
        )],
    )
}

/// Acceptor side, single tenancy
pub fn intra_acceptor_policy(requestor_vcn_name: &str, group: &str, compartment: &str) -> CreatePolicy {
    named(
        format!("accept_lpg_of_vcn_{}", requestor_vcn_name),
        vec![
            format!(
                "Allow group id {} to manage local-peering-to in compartment id {}",
                group, compartment
            ),
            format!(
                "Allow group id {} to inspect vcns in compartment id {}",
                group, compartment
            ),
            format!(
                "Allow group id {} to inspect local-peering-gateways in compartment id {}",
                group, compartment
            ),
        ],
    )
}

/// Requestor side, across tenancies
pub fn inter_requestor_policy(
    acceptor_tenancy_name: &str,
    requestor_compartment: &str,
    acceptor_compartment: &str,
    group: &str,
) -> CreatePolicy {
    named(
        format!("request_lpg_to_{}", acceptor_tenancy_name),
        vec![
            format!("Define tenancy Acceptor as {}", acceptor_compartment),
            format!(
                "Allow group id {} to manage local-peering-from in compartment id {}",
                group, requestor_compartment
            ),
            format!(
                "Endorse group id {} to manage local-peering-to in tenancy Acceptor",
                group
            ),
            format!(
                "Endorse group id {} to associate local-peering-gateways in compartment id {} \
                 with local-peering-gateways in tenancy Acceptor",
                group, requestor_compartment
            ),
        ],
    )
}

/// Acceptor side, across tenancies
pub fn inter_acceptor_policy(
    requestor_tenancy_name: &str,
    requestor_compartment: &str,
    acceptor_compartment: &str,
    group: &str,
) -> CreatePolicy {
    named(
        format!("accept_lpg_of_{}", requestor_tenancy_name),
        vec![
            format!("Define tenancy Requestor as {}", requestor_compartment),
            format!("Define group RequestorGrp as {}", group),
            format!(
                "Admit group RequestorGrp of tenancy Requestor to manage local-peering-to \
                 in compartment id {}",
                acceptor_compartment
            ),
            format!(
                "Admit group RequestorGrp of tenancy Requestor to associate local-peering-gateways \
                 in tenancy Requestor with local-peering-gateways in compartment id {}",
                acceptor_compartment
            ),
        ],
    )
}

fn named(name: String, statements: Vec<String>) -> CreatePolicy {
    CreatePolicy {
        description: name.clone(),
        name,
        statements,
    }
}
