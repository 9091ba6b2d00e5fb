//! OCI Client
//!
//! Main client for the Core Services (network) and Identity APIs, combining
//! request signing and HTTP functionality.

use super::auth::OciSigner;
use super::http::OciHttpClient;
use super::models::{CreatePolicy, Group, LocalPeeringGateway, Policy, RouteTable, Tenancy, Vcn};
use crate::config::OciConfig;
use crate::error::{Error, Result};
use crate::resource::{fetcher, ResourceClient};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

/// API version shared by the network and identity services
const API_VERSION: &str = "20160918";

/// Main OCI client for one profile
#[derive(Clone)]
pub struct OciClient {
    pub http: OciHttpClient,
    pub profile: String,
    pub tenancy_id: String,
    pub region: String,
    network_endpoint: Url,
    identity_endpoint: Url,
}

impl OciClient {
    /// Create a client for a config profile, using the region's public endpoints
    pub fn new(config: &OciConfig) -> Result<Self> {
        let signer = OciSigner::from_config(config)?;
        let network = format!("https://iaas.{}.oraclecloud.com", config.region);
        let identity = format!("https://identity.{}.oraclecloud.com", config.region);
        Self::with_endpoints(config, signer, &network, &identity)
    }

    /// Create a client against explicit service endpoints
    pub fn with_endpoints(
        config: &OciConfig,
        signer: OciSigner,
        network: &str,
        identity: &str,
    ) -> Result<Self> {
        Ok(Self {
            http: OciHttpClient::new(signer)?,
            profile: config.profile.clone(),
            tenancy_id: config.tenancy.clone(),
            region: config.region.clone(),
            network_endpoint: versioned_endpoint(network)?,
            identity_endpoint: versioned_endpoint(identity)?,
        })
    }

    // =========================================================================
    // URL helpers
    // =========================================================================

    /// Build Core Services (network) API URL
    pub fn network_url(&self, path: &str) -> Result<Url> {
        join(&self.network_endpoint, path)
    }

    /// Build Identity API URL
    pub fn identity_url(&self, path: &str) -> Result<Url> {
        join(&self.identity_endpoint, path)
    }

    /// Network collection URL scoped to the tenancy
    fn network_list_url(&self, collection: &str) -> Result<Url> {
        let mut url = self.network_url(collection)?;
        url.query_pairs_mut()
            .append_pair("compartmentId", &self.tenancy_id);
        Ok(url)
    }
}

fn versioned_endpoint(base: &str) -> Result<Url> {
    let base = base.trim_end_matches('/');
    Url::parse(&format!("{}/{}/", base, API_VERSION))
        .map_err(|e| Error::Config(format!("invalid endpoint {}: {}", base, e)))
}

fn join(endpoint: &Url, path: &str) -> Result<Url> {
    endpoint
        .join(path)
        .map_err(|e| Error::Config(format!("invalid path {}: {}", path, e)))
}

/// Just the id of a created resource
#[derive(Deserialize)]
struct CreatedId {
    id: String,
}

/// Decode a create response, falling back to `minimal` when only the id is readable
///
/// The resource exists once the POST succeeded, so its id must reach the
/// caller (and the session ledger) even if the rest of the body is unexpected.
fn decode_created<T, F>(body: Value, minimal: F) -> Result<T>
where
    T: DeserializeOwned,
    F: FnOnce(String) -> T,
{
    match serde_json::from_value::<T>(body.clone()) {
        Ok(created) => Ok(created),
        Err(err) => {
            let CreatedId { id } = serde_json::from_value(body).map_err(|_| Error::Decode(err))?;
            tracing::warn!("Could not fully decode created resource {}", id);
            Ok(minimal(id))
        }
    }
}

/// Resource path with an encoded id segment
fn item_path(collection: &str, id: &str) -> String {
    format!("{}/{}", collection, urlencoding::encode(id))
}

#[async_trait]
impl ResourceClient for OciClient {
    fn compartment_id(&self) -> &str {
        &self.tenancy_id
    }

    async fn get_tenancy_name(&self) -> Result<String> {
        let url = self.identity_url(&item_path("tenancies", &self.tenancy_id))?;
        let response = self.http.get(&url).await?;
        let tenancy: Tenancy = serde_json::from_value(response.body)?;
        Ok(tenancy.name)
    }

    async fn get_vcn(&self, vcn_id: &str) -> Result<Vcn> {
        let url = self.network_url(&item_path("vcns", vcn_id))?;
        let response = self.http.get(&url).await?;
        Ok(serde_json::from_value(response.body)?)
    }

    async fn list_vcns(&self) -> Result<Vec<Vcn>> {
        let url = self.network_list_url("vcns")?;
        fetcher::fetch_all(&self.http, &url).await
    }

    async fn list_groups(&self) -> Result<Vec<Group>> {
        let mut url = self.identity_url("groups")?;
        url.query_pairs_mut()
            .append_pair("compartmentId", &self.tenancy_id);
        fetcher::fetch_all(&self.http, &url).await
    }

    async fn list_route_tables(&self, vcn_id: Option<&str>) -> Result<Vec<RouteTable>> {
        let mut url = self.network_list_url("routeTables")?;
        if let Some(vcn_id) = vcn_id {
            url.query_pairs_mut().append_pair("vcnId", vcn_id);
        }
        fetcher::fetch_all(&self.http, &url).await
    }

    async fn get_route_table(&self, route_table_id: &str) -> Result<RouteTable> {
        let url = self.network_url(&item_path("routeTables", route_table_id))?;
        let response = self.http.get(&url).await?;
        let mut table: RouteTable = serde_json::from_value(response.body)?;
        table.etag = response.etag;
        Ok(table)
    }

    async fn update_route_table(&self, table: &RouteTable) -> Result<RouteTable> {
        let url = self.network_url(&item_path("routeTables", &table.id))?;
        let response = self
            .http
            .put(&url, &table.update_details(), table.etag.as_deref())
            .await?;
        let mut updated: RouteTable = serde_json::from_value(response.body)?;
        updated.etag = response.etag;
        Ok(updated)
    }

    async fn create_lpg(&self, vcn_id: &str, display_name: &str) -> Result<LocalPeeringGateway> {
        let url = self.network_url("localPeeringGateways")?;
        let body = json!({
            "compartmentId": self.tenancy_id,
            "displayName": display_name,
            "vcnId": vcn_id,
        });
        let retry_token = uuid::Uuid::new_v4().to_string();
        let response = self.http.post(&url, &body, Some(&retry_token)).await?;
        decode_created(response.body, |id| LocalPeeringGateway {
            id,
            vcn_id: vcn_id.to_string(),
            display_name: display_name.to_string(),
            lifecycle_state: None,
            peering_status: None,
        })
    }

    async fn get_lpg(&self, lpg_id: &str) -> Result<LocalPeeringGateway> {
        let url = self.network_url(&item_path("localPeeringGateways", lpg_id))?;
        let response = self.http.get(&url).await?;
        Ok(serde_json::from_value(response.body)?)
    }

    async fn delete_lpg(&self, lpg_id: &str) -> Result<()> {
        let url = self.network_url(&item_path("localPeeringGateways", lpg_id))?;
        self.http.delete(&url).await?;
        Ok(())
    }

    async fn connect_lpgs(&self, requestor_lpg_id: &str, acceptor_lpg_id: &str) -> Result<()> {
        let path = format!(
            "{}/actions/connect",
            item_path("localPeeringGateways", requestor_lpg_id)
        );
        let url = self.network_url(&path)?;
        let body = json!({ "peerId": acceptor_lpg_id });
        self.http.post(&url, &body, None).await?;
        Ok(())
    }

    async fn create_policy(&self, policy: &CreatePolicy) -> Result<Policy> {
        let url = self.identity_url("policies")?;
        let body = json!({
            "compartmentId": self.tenancy_id,
            "name": policy.name,
            "description": policy.description,
            "statements": policy.statements,
        });
        let retry_token = uuid::Uuid::new_v4().to_string();
        let response = self.http.post(&url, &body, Some(&retry_token)).await?;
        decode_created(response.body, |id| Policy {
            id,
            name: policy.name.clone(),
            description: policy.description.clone(),
            statements: policy.statements.clone(),
        })
    }

    async fn delete_policy(&self, policy_id: &str) -> Result<()> {
        let url = self.identity_url(&item_path("policies", policy_id))?;
        self.http.delete(&url).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versioned_endpoint_normalizes_trailing_slash() {
        let a = versioned_endpoint("https://iaas.us-ashburn-1.oraclecloud.com").unwrap();
        let b = versioned_endpoint("https://iaas.us-ashburn-1.oraclecloud.com/").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "https://iaas.us-ashburn-1.oraclecloud.com/20160918/");
    }

    #[test]
    fn test_item_path_encodes_id() {
        let endpoint = versioned_endpoint("http://127.0.0.1:9000").unwrap();
        let url = join(&endpoint, &item_path("vcns", "ocid1.vcn.oc1.iad.aaa")).unwrap();
        assert_eq!(url.path(), "/20160918/vcns/ocid1.vcn.oc1.iad.aaa");

        let odd = join(&endpoint, &item_path("policies", "a/b")).unwrap();
        assert_eq!(odd.path(), "/20160918/policies/a%2Fb");
    }

    #[test]
    fn test_decode_created_keeps_id_of_odd_response() {
        let policy: Policy = decode_created(json!({"id": "pol-1", "name": 42}), |id| Policy {
            id,
            name: "fallback".to_string(),
            description: String::new(),
            statements: vec![],
        })
        .unwrap();
        assert_eq!(policy.id, "pol-1");
        assert_eq!(policy.name, "fallback");
    }

    #[test]
    fn test_decode_created_without_id_is_an_error() {
        let result: Result<Policy> = decode_created(json!({"name": "p"}), |_| unreachable!());
        assert!(matches!(result, Err(Error::Decode(_))));
    }
}
