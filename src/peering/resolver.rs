//! Inventory Resolver
//!
//! Fills in peering inputs the user left out by looking at what each
//! account holds. A value is picked only when it is the sole candidate.

use super::material::{LpgMaterial, PeeringInputs};
use crate::error::{Error, Result};
use crate::resource::ResourceClient;

pub struct InventoryResolver<'a, C: ?Sized> {
    requestor: &'a C,
    acceptor: &'a C,
}

impl<'a, C> InventoryResolver<'a, C>
where
    C: ResourceClient + ?Sized,
{
    pub fn new(requestor: &'a C, acceptor: &'a C) -> Self {
        Self { requestor, acceptor }
    }

    /// Complete `inputs` and validate the result
    ///
    /// Stops at the first value that cannot be picked unambiguously. Only
    /// read calls are made.
    pub async fn resolve(&self, inputs: PeeringInputs) -> Result<LpgMaterial> {
        let requestor_vcn = match inputs.requestor_vcn {
            Some(vcn) => vcn,
            None => self.sole_vcn(self.requestor, "--requestor-vcn-ocid").await?,
        };
        let acceptor_vcn = match inputs.acceptor_vcn {
            Some(vcn) => vcn,
            None => self.sole_vcn(self.acceptor, "--acceptor-vcn-ocid").await?,
        };
        let requestor_group = match inputs.requestor_group {
            Some(group) => group,
            None => self.sole_group(self.requestor, "--requestor-group-ocid").await?,
        };
        let requestor_route_table = match inputs.requestor_route_table {
            Some(table) => table,
            None => {
                self.sole_route_table(self.requestor, &requestor_vcn, "--requestor-route-table-ocid")
                    .await?
            }
        };
        let acceptor_route_table = match inputs.acceptor_route_table {
            Some(table) => table,
            None => {
                self.sole_route_table(self.acceptor, &acceptor_vcn, "--acceptor-route-table-ocid")
                    .await?
            }
        };
        let requestor_cidr = match inputs.requestor_cidr {
            Some(cidr) => cidr,
            None => self.sole_cidr(self.requestor, &requestor_vcn, "--requestor-cidr").await?,
        };
        let acceptor_cidr = match inputs.acceptor_cidr {
            Some(cidr) => cidr,
            None => self.sole_cidr(self.acceptor, &acceptor_vcn, "--acceptor-cidr").await?,
        };

        LpgMaterial::new(PeeringInputs {
            requestor_vcn: Some(requestor_vcn),
            acceptor_vcn: Some(acceptor_vcn),
            requestor_group: Some(requestor_group),
            requestor_route_table: Some(requestor_route_table),
            acceptor_route_table: Some(acceptor_route_table),
            requestor_cidr: Some(requestor_cidr),
            acceptor_cidr: Some(acceptor_cidr),
        })
    }

    async fn sole_vcn(&self, client: &C, flag: &'static str) -> Result<String> {
        let vcns = client.list_vcns().await?;
        let scope = format!("compartment {}", client.compartment_id());
        let vcn = sole("VCN", scope, flag, "list_vcn", vcns)?;
        tracing::info!("Using VCN {} ({})", vcn.display_name, vcn.id);
        Ok(vcn.id)
    }

    async fn sole_group(&self, client: &C, flag: &'static str) -> Result<String> {
        let groups = client.list_groups().await?;
        let scope = format!("compartment {}", client.compartment_id());
        let group = sole("Group", scope, flag, "list_group", groups)?;
        tracing::info!("Using Group {} ({})", group.name, group.id);
        Ok(group.id)
    }

    async fn sole_route_table(&self, client: &C, vcn_id: &str, flag: &'static str) -> Result<String> {
        let tables = client.list_route_tables(Some(vcn_id)).await?;
        let scope = format!("VCN {}", vcn_id);
        let table = sole("Route Table", scope, flag, "list_route_table", tables)?;
        tracing::info!("Using Route Table {} ({})", table.display_name, table.id);
        Ok(table.id)
    }

    async fn sole_cidr(&self, client: &C, vcn_id: &str, flag: &'static str) -> Result<String> {
        let vcn = client.get_vcn(vcn_id).await?;
        let scope = format!("VCN {}", vcn_id);
        let cidr = sole("CIDR", scope, flag, "list_vcn", vcn.cidrs())?;
        tracing::info!("Using CIDR {} of VCN {}", cidr, vcn.display_name);
        Ok(cidr)
    }
}

/// The only element of `candidates`, or an ambiguity naming `flag`
fn sole<T>(
    resource: &'static str,
    scope: String,
    flag: &'static str,
    listing: &'static str,
    candidates: Vec<T>,
) -> Result<T> {
    let count = candidates.len();
    let mut candidates = candidates.into_iter();
    match (candidates.next(), candidates.next()) {
        (Some(only), None) => Ok(only),
        _ => Err(Error::AmbiguousInput {
            resource,
            scope,
            flag,
            listing,
            count,
        }),
    }
}
