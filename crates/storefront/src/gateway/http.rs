//! HTTP record gateway client.
//!
//! Sends the JSON bodies in [`super::wire`] with `reqwest` and unwraps the
//! `{success, data, results, message}` envelope every endpoint returns.

use std::sync::Arc;

use async_trait::async_trait;
use atelier_core::RecordId;
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::wire::{
    ConditionalData, DeleteBody, Envelope, FetchBody, GetByIdBody, RecordsBody, UniqueBody,
    UniqueData,
};
use super::{
    CreateResult, FetchQuery, Filter, GatewayError, Record, RecordGateway, UniqueCreate,
};
use crate::config::GatewayConfig;

/// Longest response excerpt included in logs and errors.
const BODY_EXCERPT_CHARS: usize = 500;

// =============================================================================
// HttpGateway
// =============================================================================

/// Client for a hosted record gateway.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct HttpGateway {
    inner: Arc<HttpGatewayInner>,
}

struct HttpGatewayInner {
    client: reqwest::Client,
    endpoint: String,
    project_id: String,
    api_key: SecretString,
}

impl HttpGateway {
    /// Create a new gateway client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        Self::with_builder(config, reqwest::Client::builder())
    }

    fn with_builder(
        config: &GatewayConfig,
        builder: reqwest::ClientBuilder,
    ) -> Result<Self, GatewayError> {
        let client = builder.timeout(config.request_timeout).build()?;

        let endpoint = config.base_url.as_str().trim_end_matches('/').to_string();

        Ok(Self {
            inner: Arc::new(HttpGatewayInner {
                client,
                endpoint,
                project_id: config.project_id.clone(),
                api_key: config.api_key.clone(),
            }),
        })
    }

    fn url(&self, table: &str, path: &str) -> String {
        format!("{}/tables/{table}/{path}", self.inner.endpoint)
    }

    /// Send a request and unwrap the response envelope.
    async fn send<B, T>(
        &self,
        method: Method,
        url: String,
        body: &B,
    ) -> Result<Envelope<T>, GatewayError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let response = self
            .inner
            .client
            .request(method, &url)
            .bearer_auth(self.inner.api_key.expose_secret())
            .header("X-Project-Id", &self.inner.project_id)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    GatewayError::Unavailable(e.to_string())
                } else {
                    GatewayError::Http(e)
                }
            })?;

        let status = response.status();

        // Check for rate limiting
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(GatewayError::RateLimited(retry_after));
        }

        if status == reqwest::StatusCode::SERVICE_UNAVAILABLE {
            return Err(GatewayError::Unavailable(format!("HTTP {status}")));
        }

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;
        let excerpt = || response_text.chars().take(BODY_EXCERPT_CHARS).collect::<String>();

        let envelope: Envelope<T> = match serde_json::from_str(&response_text) {
            Ok(envelope) => envelope,
            Err(e) if status.is_success() => {
                tracing::error!(
                    error = %e,
                    body = %excerpt(),
                    "Failed to parse gateway response"
                );
                return Err(GatewayError::Parse(e));
            }
            Err(_) => {
                tracing::error!(
                    status = %status,
                    body = %excerpt(),
                    "Gateway returned non-success status"
                );
                return Err(GatewayError::Rejected(Some(format!("HTTP {status}"))));
            }
        };

        if !envelope.success {
            debug!(status = %status, message = ?envelope.message, "Gateway reported failure");
            return Err(GatewayError::Rejected(envelope.message));
        }

        Ok(envelope)
    }
}

#[async_trait]
impl RecordGateway for HttpGateway {
    #[instrument(skip(self, query), fields(table = %table))]
    async fn fetch_records(
        &self,
        table: &str,
        query: &FetchQuery,
    ) -> Result<Vec<Record>, GatewayError> {
        let envelope: Envelope<Vec<Record>> = self
            .send(Method::POST, self.url(table, "fetch"), &FetchBody::from(query))
            .await?;
        let records = envelope.data.unwrap_or_default();
        debug!(count = records.len(), "Fetched records");
        Ok(records)
    }

    #[instrument(skip(self, fields), fields(table = %table, id = %id))]
    async fn get_record_by_id(
        &self,
        table: &str,
        id: RecordId,
        fields: &[String],
    ) -> Result<Option<Record>, GatewayError> {
        let envelope: Envelope<Record> = self
            .send(
                Method::POST,
                self.url(table, &format!("records/{id}")),
                &GetByIdBody::new(fields),
            )
            .await?;
        Ok(envelope.data)
    }

    #[instrument(skip(self, records), fields(table = %table, count = records.len()))]
    async fn create_records(
        &self,
        table: &str,
        records: Vec<Record>,
    ) -> Result<Vec<CreateResult>, GatewayError> {
        let body = RecordsBody {
            records,
            conditions: None,
        };
        let envelope: Envelope<serde_json::Value> =
            self.send(Method::POST, self.url(table, "records"), &body).await?;

        Ok(envelope
            .results
            .into_iter()
            .map(|entry| match (entry.success, entry.data) {
                (true, Some(record)) => CreateResult::Created(record),
                _ => CreateResult::Failed(entry.message),
            })
            .collect())
    }

    #[instrument(skip(self, record), fields(table = %table, key = ?key_fields))]
    async fn create_unique(
        &self,
        table: &str,
        record: Record,
        key_fields: &[&str],
    ) -> Result<UniqueCreate, GatewayError> {
        let body = UniqueBody {
            records: vec![record],
            key_fields,
        };
        let envelope: Envelope<UniqueData> = self
            .send(Method::POST, self.url(table, "records/unique"), &body)
            .await?;
        let data = envelope
            .data
            .ok_or_else(|| GatewayError::Malformed("unique create without data".to_string()))?;

        if data.created {
            let id = data
                .record
                .id()
                .ok_or_else(|| GatewayError::Malformed("created record without Id".to_string()))?;
            Ok(UniqueCreate::Created(id))
        } else {
            Ok(UniqueCreate::Existing(data.record))
        }
    }

    #[instrument(skip(self, records), fields(table = %table, count = records.len()))]
    async fn update_records(&self, table: &str, records: Vec<Record>) -> Result<(), GatewayError> {
        let body = RecordsBody {
            records,
            conditions: None,
        };
        let _: Envelope<serde_json::Value> =
            self.send(Method::PUT, self.url(table, "records"), &body).await?;
        Ok(())
    }

    #[instrument(skip(self, record, expected), fields(table = %table, id = ?record.id()))]
    async fn update_if(
        &self,
        table: &str,
        record: Record,
        expected: Record,
    ) -> Result<bool, GatewayError> {
        let conditions = expected
            .fields()
            .map(|(field, value)| Filter::equal_to(field, value.clone()))
            .collect();
        let body = RecordsBody {
            records: vec![record],
            conditions: Some(conditions),
        };
        let envelope: Envelope<ConditionalData> =
            self.send(Method::PUT, self.url(table, "records"), &body).await?;
        Ok(envelope.data.is_some_and(|d| d.applied))
    }

    #[instrument(skip(self, ids), fields(table = %table, count = ids.len()))]
    async fn delete_records(&self, table: &str, ids: &[RecordId]) -> Result<(), GatewayError> {
        let _: Envelope<serde_json::Value> = self
            .send(
                Method::DELETE,
                self.url(table, "records"),
                &DeleteBody { record_ids: ids },
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    fn config(base_url: &str) -> GatewayConfig {
        GatewayConfig {
            base_url: base_url.parse().unwrap(),
            project_id: "proj_01".to_string(),
            api_key: SecretString::from("k3y-9fQ2xLw7Rt"),
            request_timeout: Duration::from_secs(5),
        }
    }

    fn local_gateway(base_url: &str, timeout: Duration) -> HttpGateway {
        let config = GatewayConfig {
            request_timeout: timeout,
            ..config(base_url)
        };
        HttpGateway::with_builder(&config, reqwest::Client::builder().no_proxy()).unwrap()
    }

    /// Read one HTTP/1.1 request, headers plus `Content-Length` body.
    async fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0_u8; 4096];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf);
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Answer exactly one request with a canned response.
    ///
    /// Returns the base URL and a handle resolving to the raw request.
    async fn serve_once(status: &str, headers: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n{headers}\r\n{body}",
            body.len()
        );
        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let request = read_request(&mut stream).await;
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
            request
        });
        (base_url, handle)
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let gateway = HttpGateway::new(&config("https://records.example.com/v1/")).unwrap();
        assert_eq!(
            gateway.url("product_c", "fetch"),
            "https://records.example.com/v1/tables/product_c/fetch"
        );
    }

    #[test]
    fn test_url_for_record_by_id() {
        let gateway = HttpGateway::new(&config("https://records.example.com")).unwrap();
        assert_eq!(
            gateway.url("order_c", "records/12"),
            "https://records.example.com/tables/order_c/records/12"
        );
    }

    #[tokio::test]
    async fn test_fetch_sends_auth_headers_and_unwraps_data() {
        let (base_url, server) = serve_once(
            "200 OK",
            "",
            r#"{"success": true, "data": [{"Id": 4, "name_c": "Boxy Tee"}]}"#,
        )
        .await;
        let gateway = local_gateway(&base_url, Duration::from_secs(5));

        let records = gateway
            .fetch_records("product_c", &FetchQuery::new(&["name_c"]))
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id(), Some(RecordId::new(4)));

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /tables/product_c/fetch HTTP/1.1"));
        let lowered = request.to_lowercase();
        assert!(lowered.contains("authorization: bearer k3y-9fq2xlw7rt"));
        assert!(lowered.contains("x-project-id: proj_01"));
        assert!(request.contains(r#"{"field":{"Name":"name_c"}}"#));
    }

    #[tokio::test]
    async fn test_rate_limit_carries_retry_after() {
        let (base_url, _server) = serve_once("429 Too Many Requests", "Retry-After: 7\r\n", "").await;
        let gateway = local_gateway(&base_url, Duration::from_secs(5));
        let err = gateway
            .fetch_records("product_c", &FetchQuery::new(&[]))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::RateLimited(7)));
    }

    #[tokio::test]
    async fn test_service_unavailable_status() {
        let (base_url, _server) = serve_once("503 Service Unavailable", "", "").await;
        let gateway = local_gateway(&base_url, Duration::from_secs(5));
        let err = gateway.delete_records("cart_item_c", &[]).await.unwrap_err();
        assert!(matches!(err, GatewayError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_success_false_is_rejected_with_message() {
        let (base_url, _server) = serve_once(
            "200 OK",
            "",
            r#"{"success": false, "message": "Table wishlist_item_c not found"}"#,
        )
        .await;
        let gateway = local_gateway(&base_url, Duration::from_secs(5));
        let err = gateway
            .fetch_records("wishlist_item_c", &FetchQuery::new(&[]))
            .await
            .unwrap_err();
        assert_eq!(err.gateway_message(), Some("Table wishlist_item_c not found"));
    }

    #[tokio::test]
    async fn test_non_json_error_body_is_rejected_with_status() {
        let (base_url, _server) =
            serve_once("500 Internal Server Error", "", "<html>upstream error</html>").await;
        let gateway = local_gateway(&base_url, Duration::from_secs(5));
        let err = gateway
            .fetch_records("order_c", &FetchQuery::new(&[]))
            .await
            .unwrap_err();
        assert_eq!(err.gateway_message(), Some("HTTP 500 Internal Server Error"));
    }

    #[tokio::test]
    async fn test_non_json_success_body_is_a_parse_error() {
        let (base_url, _server) = serve_once("200 OK", "", "not json").await;
        let gateway = local_gateway(&base_url, Duration::from_secs(5));
        let err = gateway
            .fetch_records("order_c", &FetchQuery::new(&[]))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Parse(_)));
    }

    #[tokio::test]
    async fn test_update_if_reports_applied_flag() {
        for applied in [true, false] {
            let body = format!(r#"{{"success": true, "data": {{"applied": {applied}}}}}"#);
            let (base_url, server) = serve_once("200 OK", "", &body).await;
            let gateway = local_gateway(&base_url, Duration::from_secs(5));

            let mut update = Record::new().with("quantity_c", 3);
            update.set_id(RecordId::new(12));
            let expected = Record::new().with("quantity_c", 1);
            let result = gateway.update_if("cart_item_c", update, expected).await.unwrap();
            assert_eq!(result, applied);

            let request = server.await.unwrap();
            assert!(request.starts_with("PUT /tables/cart_item_c/records HTTP/1.1"));
            assert!(request.contains(r#""conditions":[{"#));
        }
    }

    #[tokio::test]
    async fn test_refused_connection_is_unavailable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let gateway = local_gateway(&base_url, Duration::from_secs(5));
        let err = gateway
            .fetch_records("product_c", &FetchQuery::new(&[]))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_timeout_is_unavailable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let _server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(stream);
        });

        let gateway = local_gateway(&base_url, Duration::from_millis(200));
        let err = gateway
            .fetch_records("product_c", &FetchQuery::new(&[]))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Unavailable(_)));
    }
}
