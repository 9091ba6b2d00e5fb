//! Resource Fetcher
//!
//! Walks `opc-next-page` tokens so list calls return every item.

use crate::error::Result;
use crate::oci::http::{OciHttpClient, OciResponse};
use serde::de::DeserializeOwned;
use url::Url;

/// Upper bound on pages fetched for one listing
const MAX_PAGES: usize = 1000;

/// Fetch all resources (auto-paginate)
pub async fn fetch_all<T: DeserializeOwned>(http: &OciHttpClient, url: &Url) -> Result<Vec<T>> {
    let mut all_items = Vec::new();
    let mut page_token: Option<String> = None;

    for _ in 0..MAX_PAGES {
        let page_url = with_page(url, page_token.as_deref());
        let response = http.get(&page_url).await?;
        let (items, next) = decode_page::<T>(response)?;
        all_items.extend(items);

        if next.is_none() {
            return Ok(all_items);
        }
        page_token = next;
    }

    tracing::warn!("Stopped listing {} after {} pages", url.path(), MAX_PAGES);
    Ok(all_items)
}

/// Copy of `url` carrying the `page` token, if any
fn with_page(url: &Url, page: Option<&str>) -> Url {
    let mut page_url = url.clone();
    if let Some(token) = page {
        page_url.query_pairs_mut().append_pair("page", token);
    }
    page_url
}

fn decode_page<T: DeserializeOwned>(response: OciResponse) -> Result<(Vec<T>, Option<String>)> {
    let items = if response.body.is_null() {
        Vec::new()
    } else {
        serde_json::from_value(response.body)?
    };
    Ok((items, response.next_page))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oci::models::Group;
    use serde_json::json;

    #[test]
    fn test_with_page_appends_token() {
        let url = Url::parse("https://identity.example.com/20160918/groups?compartmentId=c1").unwrap();
        assert_eq!(with_page(&url, None), url);
        assert_eq!(
            with_page(&url, Some("tok/2")).as_str(),
            "https://identity.example.com/20160918/groups?compartmentId=c1&page=tok%2F2"
        );
    }

    #[test]
    fn test_decode_page_reads_items_and_token() {
        let response = OciResponse {
            body: json!([{"id": "g1", "name": "Administrators"}]),
            etag: None,
            next_page: Some("next".to_string()),
        };
        let (items, next) = decode_page::<Group>(response).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Administrators");
        assert_eq!(next.as_deref(), Some("next"));
    }

    #[test]
    fn test_decode_page_treats_empty_body_as_no_items() {
        let response = OciResponse {
            body: serde_json::Value::Null,
            etag: None,
            next_page: None,
        };
        let (items, next) = decode_page::<Group>(response).unwrap();
        assert!(items.is_empty());
        assert!(next.is_none());
    }
}
