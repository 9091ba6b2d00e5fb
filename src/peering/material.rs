//! Peering material
//!
//! The fully resolved inputs of a peering run. [`LpgMaterial::new`] is the
//! only way to build one and refuses anything incomplete.

use crate::error::{Error, Result};
use std::net::IpAddr;

/// Peering inputs as given on the command line; any of them may be missing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeeringInputs {
    pub requestor_vcn: Option<String>,
    pub acceptor_vcn: Option<String>,
    pub requestor_group: Option<String>,
    pub requestor_route_table: Option<String>,
    pub acceptor_route_table: Option<String>,
    pub requestor_cidr: Option<String>,
    pub acceptor_cidr: Option<String>,
}

/// Validated, immutable peering inputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LpgMaterial {
    requestor_vcn: String,
    acceptor_vcn: String,
    requestor_group: String,
    requestor_route_table: String,
    acceptor_route_table: String,
    requestor_cidr: String,
    acceptor_cidr: String,
}

impl LpgMaterial {
    pub fn new(inputs: PeeringInputs) -> Result<Self> {
        let material = Self {
            requestor_vcn: require(inputs.requestor_vcn, "requestor VCN")?,
            acceptor_vcn: require(inputs.acceptor_vcn, "acceptor VCN")?,
            requestor_group: require(inputs.requestor_group, "requestor group")?,
            requestor_route_table: require(inputs.requestor_route_table, "requestor route table")?,
            acceptor_route_table: require(inputs.acceptor_route_table, "acceptor route table")?,
            requestor_cidr: require_cidr(inputs.requestor_cidr, "requestor CIDR")?,
            acceptor_cidr: require_cidr(inputs.acceptor_cidr, "acceptor CIDR")?,
        };

        if material.requestor_vcn == material.acceptor_vcn {
            return Err(Error::Validation(format!(
                "requestor and acceptor VCN are both {}",
                material.requestor_vcn
            )));
        }

        Ok(material)
    }

    pub fn requestor_vcn(&self) -> &str {
        &self.requestor_vcn
    }

    pub fn acceptor_vcn(&self) -> &str {
        &self.acceptor_vcn
    }

    pub fn requestor_group(&self) -> &str {
        &self.requestor_group
    }

    pub fn requestor_route_table(&self) -> &str {
        &self.requestor_route_table
    }

    pub fn acceptor_route_table(&self) -> &str {
        &self.acceptor_route_table
    }

    pub fn requestor_cidr(&self) -> &str {
        &self.requestor_cidr
    }

    pub fn acceptor_cidr(&self) -> &str {
        &self.acceptor_cidr
    }
}

fn require(value: Option<String>, field: &str) -> Result<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(Error::Validation(format!("missing {}", field))),
    }
}

fn require_cidr(value: Option<String>, field: &str) -> Result<String> {
    let cidr = require(value, field)?;
    if !is_cidr(&cidr) {
        return Err(Error::Validation(format!("{} {} is not a CIDR block", field, cidr)));
    }
    Ok(cidr)
}

/// `address/prefix` with a prefix that fits the address family
pub fn is_cidr(value: &str) -> bool {
    let Some((addr, prefix)) = value.split_once('/') else {
        return false;
    };
    let Ok(prefix) = prefix.parse::<u8>() else {
        return false;
    };
    match addr.parse::<IpAddr>() {
        Ok(IpAddr::V4(_)) => prefix <= 32,
        Ok(IpAddr::V6(_)) => prefix <= 128,
        Err(_) => false,
    }
}
