//! OCI resource models
//!
//! Only the fields this tool reads or writes are modelled; everything else
//! in the API payloads is ignored on decode.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Route rule destination type for CIDR destinations
pub const DESTINATION_TYPE_CIDR_BLOCK: &str = "CIDR_BLOCK";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenancy {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vcn {
    pub id: String,
    #[serde(default)]
    pub compartment_id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub cidr_block: Option<String>,
    #[serde(default)]
    pub cidr_blocks: Vec<String>,
    #[serde(default)]
    pub lifecycle_state: Option<String>,
}

impl Vcn {
    /// All CIDR blocks, including the legacy single `cidrBlock`
    pub fn cidrs(&self) -> Vec<String> {
        if !self.cidr_blocks.is_empty() {
            return self.cidr_blocks.clone();
        }
        self.cidr_block.iter().cloned().collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalPeeringGateway {
    pub id: String,
    #[serde(default)]
    pub vcn_id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub lifecycle_state: Option<String>,
    #[serde(default)]
    pub peering_status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub statements: Vec<String>,
}

/// Body of a policy creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePolicy {
    pub name: String,
    pub description: String,
    pub statements: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRule {
    pub destination: String,
    #[serde(default = "default_destination_type")]
    pub destination_type: String,
    pub network_entity_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Fields this tool does not model (`routeType`, `cidrBlock`, ...), written back as read
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_destination_type() -> String {
    DESTINATION_TYPE_CIDR_BLOCK.to_string()
}

impl RouteRule {
    /// Rule sending `destination` through a peering gateway
    pub fn to_gateway(destination: &str, gateway_id: &str) -> Self {
        Self {
            destination: destination.to_string(),
            destination_type: DESTINATION_TYPE_CIDR_BLOCK.to_string(),
            network_entity_id: gateway_id.to_string(),
            description: None,
            extra: Map::new(),
        }
    }

    /// Same destination and target as `other`, ignoring everything else
    pub fn same_route(&self, other: &RouteRule) -> bool {
        self.destination == other.destination
            && self.destination_type == other.destination_type
            && self.network_entity_id == other.network_entity_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteTable {
    pub id: String,
    #[serde(default)]
    pub vcn_id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub route_rules: Vec<RouteRule>,
    #[serde(default)]
    pub defined_tags: Map<String, Value>,
    #[serde(default)]
    pub freeform_tags: Map<String, Value>,
    /// Entity tag from the read, used as the `if-match` precondition
    #[serde(skip)]
    pub etag: Option<String>,
}

impl RouteTable {
    /// Body of an update carrying the current rules and tags
    pub fn update_details(&self) -> Value {
        serde_json::json!({
            "displayName": self.display_name,
            "definedTags": self.defined_tags,
            "freeformTags": self.freeform_tags,
            "routeRules": self.route_rules,
        })
    }

    /// Remove the first rule routing like `rule`; returns whether one was found
    pub fn remove_rule(&mut self, rule: &RouteRule) -> bool {
        match self.route_rules.iter().position(|r| r.same_route(rule)) {
            Some(index) => {
                self.route_rules.remove(index);
                true
            }
            None => false,
        }
    }
}
