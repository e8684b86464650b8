use async_trait::async_trait;
use reqwest::{header, Response};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::auth::DynAuthenticator;

use super::{
    batch::{fault_message, BatchRequest, BatchResponse},
    BatchItemRequest, BatchItemResponse, ClientError, QuickbooksApi,
};

const MINOR_VERSION: &str = "75";
const PAGE_SIZE: usize = 100;

/// [`QuickbooksApi`] over HTTPS.
pub struct HttpClient {
    http: reqwest::Client,
    base_url: String,
    auth: DynAuthenticator,
}

impl HttpClient {
    /// Create a client for a company.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The company's API root, as returned by
    ///   [`crate::config::Config::api_base_url`].
    /// * `auth` - Source of access tokens. A token is requested before every
    ///   call so refreshes happen transparently.
    pub fn new(base_url: String, auth: DynAuthenticator) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            auth,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value, ClientError> {
        let token = self.auth.access_token().await?;

        let response = request
            .bearer_auth(token)
            .header(header::ACCEPT, "application/json")
            .query(&[("minorversion", MINOR_VERSION)])
            .send()
            .await?;

        read_body(response).await
    }

    async fn query_page(&self, query: &str) -> Result<Value, ClientError> {
        let request = self
            .http
            .get(format!("{}/query", self.base_url))
            .query(&[("query", query)]);

        self.send(request).await
    }
}

async fn read_body(response: Response) -> Result<Value, ClientError> {
    let status = response.status();
    let body = response.text().await?;

    if status.is_client_error() || status.is_server_error() {
        return Err(ClientError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let value: Value = serde_json::from_str(&body)?;

    if let Some(fault) = value.get("Fault") {
        return Err(ClientError::Fault(fault_message(fault)));
    }

    Ok(value)
}

fn page_entities(page: &Value, entity_type: &str) -> Vec<Value> {
    let response = page.get("QueryResponse");
    let entities = response
        .and_then(|response| response.get(entity_type))
        .or_else(|| response.and_then(|response| response.get(format!("Company{}", entity_type))));

    match entities {
        Some(Value::Array(entities)) => entities.clone(),
        Some(entity @ Value::Object(_)) => vec![entity.clone()],
        _ => Vec::new(),
    }
}

#[async_trait]
impl QuickbooksApi for HttpClient {
    #[instrument(skip(self))]
    async fn query(
        &self,
        entity_type: &str,
        where_filter: Option<&str>,
    ) -> Result<Vec<Value>, ClientError> {
        let mut entities = Vec::new();
        let mut start_position = 1;

        loop {
            let mut query = format!("select * from {}", entity_type);
            if let Some(filter) = where_filter {
                query.push_str(&format!(" where {}", filter));
            }
            query.push_str(&format!(
                " STARTPOSITION {} MAXRESULTS {}",
                start_position, PAGE_SIZE
            ));

            let page = page_entities(&self.query_page(&query).await?, entity_type);
            let count = page.len();
            entities.extend(page);

            debug!(start_position, count, "Fetched query page.");

            if count < PAGE_SIZE {
                break;
            }

            start_position += PAGE_SIZE;
        }

        Ok(entities)
    }

    #[instrument(skip_all, fields(items = items.len()))]
    async fn batch(
        &self,
        items: &[BatchItemRequest],
    ) -> Result<Vec<BatchItemResponse>, ClientError> {
        let request = self
            .http
            .post(format!("{}/batch", self.base_url))
            .json(&BatchRequest { items });

        let response: BatchResponse = serde_json::from_value(self.send(request).await?)?;

        debug!(responses = response.items.len(), "Batch processed.");

        Ok(response.items)
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    #[test]
    fn entities_from_query_response() {
        let page = json!({"QueryResponse": {"Customer": [{"Id": "1"}, {"Id": "2"}], "maxResults": 2}});

        assert_eq!(2, page_entities(&page, "Customer").len());
    }

    #[test]
    fn entities_from_company_prefixed_key() {
        let page = json!({"QueryResponse": {"CompanyCurrency": [{"Id": "1", "Code": "EUR"}]}});

        assert_eq!(
            vec![json!({"Id": "1", "Code": "EUR"})],
            page_entities(&page, "Currency")
        );
    }

    #[test]
    fn empty_query_response() {
        assert!(page_entities(&json!({"QueryResponse": {}}), "Vendor").is_empty());
    }
}
