//! Upstream review listing
//!
//! [`ReviewSource`] is the capability boundary the ingestion loop depends on.
//! [`PlayStoreClient`] implements it against the store's batch-execute RPC.

use crate::errors::IngestionError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reviewforge_common::config::UpstreamConfig;
use serde_json::{json, Value};
use tracing::debug;

/// RPC id of the review listing call
const REVIEWS_RPC: &str = "UsvDTd";

/// Prefix the batch-execute endpoint puts in front of its JSON body
const XSSI_PREFIX: &str = ")]}'";

/// One page request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRequest {
    pub package: String,
    pub lang: String,
    pub country: String,
    pub count: usize,
    /// Opaque cursor from the previous page; `None` for the first page
    pub token: Option<String>,
}

/// A review as returned upstream; every field may be missing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawReview {
    pub review_id: Option<String>,
    pub user_name: Option<String>,
    pub content: Option<String>,
    pub score: Option<i64>,
    pub thumbs_up_count: Option<i64>,
    pub review_created_version: Option<String>,
    pub at: Option<DateTime<Utc>>,
    pub reply_content: Option<String>,
    pub replied_at: Option<DateTime<Utc>>,
}

/// One page of reviews plus the cursor for the next page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    pub items: Vec<RawReview>,
    pub next_token: Option<String>,
}

/// Trait for paginated review listing
#[async_trait]
pub trait ReviewSource: Send + Sync {
    /// Fetch one page; errors are treated as transient by the caller
    async fn fetch_batch(&self, request: &BatchRequest) -> Result<Batch, IngestionError>;
}

/// Google Play review client
pub struct PlayStoreClient {
    client: reqwest::Client,
    base_url: String,
    sort: u8,
}

impl PlayStoreClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, IngestionError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            sort: config.sort,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/_/PlayStoreUi/data/batchexecute", self.base_url)
    }
}

#[async_trait]
impl ReviewSource for PlayStoreClient {
    async fn fetch_batch(&self, request: &BatchRequest) -> Result<Batch, IngestionError> {
        let payload = build_request_payload(request, self.sort);

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("hl", request.lang.as_str()), ("gl", request.country.as_str())])
            .form(&[("f.req", payload)])
            .send()
            .await
            .map_err(|e| IngestionError::Fetch {
                package: request.package.clone(),
                message: format!("Request failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(IngestionError::Fetch {
                package: request.package.clone(),
                message: format!("API error {}: {}", status, body),
            });
        }

        let body = response.text().await?;
        let batch = parse_batch_response(&body)?;

        debug!(
            package = %request.package,
            items = batch.items.len(),
            has_next = batch.next_token.is_some(),
            "Fetched review page"
        );

        Ok(batch)
    }
}

/// Build the `f.req` form value for one page
pub fn build_request_payload(request: &BatchRequest, sort: u8) -> String {
    let inner = json!([
        null,
        null,
        [2, sort, [request.count, null, request.token], null, [null, null]],
        [request.package, 7]
    ]);

    json!([[[REVIEWS_RPC, inner.to_string(), null, "generic"]]]).to_string()
}

/// Decode a batch-execute response body into a [`Batch`]
pub fn parse_batch_response(body: &str) -> Result<Batch, IngestionError> {
    let body = body.trim_start();
    let body = body.strip_prefix(XSSI_PREFIX).unwrap_or(body);

    let envelope: Value = serde_json::Deserializer::from_str(body)
        .into_iter::<Value>()
        .next()
        .ok_or_else(|| IngestionError::Decode("empty response body".to_string()))??;

    let Some(raw_payload) = envelope.pointer("/0/2") else {
        return Err(IngestionError::Decode(
            "response envelope has no payload slot".to_string(),
        ));
    };

    // A null payload is how upstream reports that no reviews remain.
    let payload: Value = match raw_payload {
        Value::String(s) => serde_json::from_str(s)?,
        Value::Null => return Ok(Batch::default()),
        other => {
            return Err(IngestionError::Decode(format!(
                "unexpected payload type: {}",
                other
            )))
        }
    };

    let items = payload
        .get(0)
        .and_then(Value::as_array)
        .map(|items| items.iter().map(parse_review).collect())
        .unwrap_or_default();

    Ok(Batch {
        items,
        next_token: next_page_token(&payload),
    })
}

/// Cursor lives in the last element of the second-to-last payload slot
fn next_page_token(payload: &Value) -> Option<String> {
    let slots = payload.as_array()?;
    let cursor_slot = slots.len().checked_sub(2).and_then(|i| slots[i].as_array())?;
    cursor_slot.last()?.as_str().map(str::to_string)
}

fn parse_review(item: &Value) -> RawReview {
    let text = |path: &str| item.pointer(path).and_then(Value::as_str).map(str::to_string);
    let int = |path: &str| item.pointer(path).and_then(Value::as_i64);
    let time = |path: &str| int(path).and_then(|secs| DateTime::from_timestamp(secs, 0));

    RawReview {
        review_id: text("/0"),
        user_name: text("/1/0"),
        content: text("/4"),
        score: int("/2"),
        thumbs_up_count: int("/6"),
        review_created_version: text("/10"),
        at: time("/5/0"),
        reply_content: text("/7/1"),
        replied_at: time("/7/2/0"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review_item(id: &str, content: &str, secs: i64) -> Value {
        json!([
            id,
            ["Abebe", [null, 2, null, [null, null, "https://img"]]],
            4,
            null,
            content,
            [secs, 0],
            3,
            null,
            null,
            null,
            "5.2.1"
        ])
    }

    fn envelope(payload: Option<Value>) -> String {
        let slot = payload.map(|p| Value::String(p.to_string())).unwrap_or(Value::Null);
        let body = json!([["wrb.fr", REVIEWS_RPC, slot, null, null, null, "generic"]]);
        format!(")]}}'\n\n{}\n", body)
    }

    #[test]
    fn test_first_page_payload_has_null_token() {
        let request = BatchRequest {
            package: "com.dashen.dashensuperapp".into(),
            lang: "en".into(),
            country: "et".into(),
            count: 200,
            token: None,
        };
        let payload = build_request_payload(&request, 2);
        let outer: Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(outer.pointer("/0/0/0").unwrap(), REVIEWS_RPC);

        let inner: Value =
            serde_json::from_str(outer.pointer("/0/0/1").unwrap().as_str().unwrap()).unwrap();
        assert_eq!(inner.pointer("/2/2").unwrap(), &json!([200, null, null]));
        assert_eq!(inner.pointer("/3/0").unwrap(), "com.dashen.dashensuperapp");
    }

    #[test]
    fn test_paginated_payload_carries_token() {
        let request = BatchRequest {
            package: "com.boa.boaMobileBanking".into(),
            lang: "en".into(),
            country: "et".into(),
            count: 50,
            token: Some("CsABCgoI\"x".into()),
        };
        let outer: Value = serde_json::from_str(&build_request_payload(&request, 2)).unwrap();
        let inner: Value =
            serde_json::from_str(outer.pointer("/0/0/1").unwrap().as_str().unwrap()).unwrap();
        assert_eq!(inner.pointer("/2/2/2").unwrap(), "CsABCgoI\"x");
    }

    #[test]
    fn test_parse_page_with_token() {
        let payload = json!([
            [
                review_item("gp:1", "Great  app", 1_714_560_000),
                review_item("gp:2", "Slow", 1_714_646_400)
            ],
            null,
            [null, "next-cursor"],
            null
        ]);

        let batch = parse_batch_response(&envelope(Some(payload))).unwrap();
        assert_eq!(batch.items.len(), 2);
        assert_eq!(batch.next_token.as_deref(), Some("next-cursor"));

        let first = &batch.items[0];
        assert_eq!(first.review_id.as_deref(), Some("gp:1"));
        assert_eq!(first.user_name.as_deref(), Some("Abebe"));
        assert_eq!(first.score, Some(4));
        assert_eq!(first.thumbs_up_count, Some(3));
        assert_eq!(first.review_created_version.as_deref(), Some("5.2.1"));
        assert_eq!(
            first.at.unwrap().to_rfc3339(),
            "2024-05-01T10:40:00+00:00"
        );
        assert!(first.reply_content.is_none());
        assert!(first.replied_at.is_none());
    }

    #[test]
    fn test_parse_reply_fields() {
        let mut item = review_item("gp:9", "Login fails", 1_714_560_000);
        item[7] = json!([null, "Please update the app", [1_714_600_000, 0]]);
        let payload = json!([[item], null, null, null]);

        let batch = parse_batch_response(&envelope(Some(payload))).unwrap();
        let review = &batch.items[0];
        assert_eq!(review.reply_content.as_deref(), Some("Please update the app"));
        assert!(review.replied_at.is_some());
        assert!(batch.next_token.is_none());
    }

    #[test]
    fn test_null_payload_is_empty_batch() {
        let batch = parse_batch_response(&envelope(None)).unwrap();
        assert!(batch.items.is_empty());
        assert!(batch.next_token.is_none());
    }

    #[test]
    fn test_garbage_is_decode_error() {
        assert!(parse_batch_response("<html>rate limited</html>").is_err());
        assert!(matches!(
            parse_batch_response(")]}'\n\n[]"),
            Err(IngestionError::Decode(_))
        ));
    }

    /// Accept one connection, answer it, and hand back the raw request text
    async fn serve_once(
        status: &'static str,
        body: String,
    ) -> (String, tokio::task::JoinHandle<String>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 4096];
            while !request_complete(&request) {
                let n = stream.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            let _ = stream.shutdown().await;
            String::from_utf8_lossy(&request).into_owned()
        });

        (format!("http://{}", addr), handle)
    }

    fn request_complete(request: &[u8]) -> bool {
        let text = String::from_utf8_lossy(request);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..header_end]
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        request.len() >= header_end + 4 + content_length
    }

    fn client_for(base_url: String) -> PlayStoreClient {
        PlayStoreClient::new(&UpstreamConfig {
            base_url,
            timeout_secs: 5,
            ..Default::default()
        })
        .unwrap()
    }

    fn dashen_request(token: Option<&str>) -> BatchRequest {
        BatchRequest {
            package: "com.dashen.dashensuperapp".into(),
            lang: "en".into(),
            country: "et".into(),
            count: 2,
            token: token.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_fetch_batch_posts_rpc_form() {
        let payload = json!([
            [review_item("gp:7", "Fast transfers", 1_714_560_000)],
            null,
            [null, "cursor-2"],
            null
        ]);
        let (base_url, server) = serve_once("200 OK", envelope(Some(payload))).await;

        let batch = client_for(base_url)
            .fetch_batch(&dashen_request(Some("cursor-1")))
            .await
            .unwrap();
        assert_eq!(batch.items.len(), 1);
        assert_eq!(batch.items[0].review_id.as_deref(), Some("gp:7"));
        assert_eq!(batch.next_token.as_deref(), Some("cursor-2"));

        let request = server.await.unwrap();
        let request_line = request.lines().next().unwrap();
        assert!(request_line.starts_with("POST /_/PlayStoreUi/data/batchexecute?"));
        assert!(request_line.contains("hl=en"));
        assert!(request_line.contains("gl=et"));
        assert!(request
            .to_ascii_lowercase()
            .contains("content-type: application/x-www-form-urlencoded"));

        let form = request.split("\r\n\r\n").nth(1).unwrap();
        assert!(form.starts_with("f.req="));
        assert!(form.contains(REVIEWS_RPC));
        assert!(form.contains("com.dashen.dashensuperapp"));
        assert!(form.contains("cursor-1"));
    }

    #[tokio::test]
    async fn test_fetch_batch_error_status_is_fetch_error() {
        let (base_url, server) =
            serve_once("503 Service Unavailable", "try again later".to_string()).await;

        let err = client_for(base_url)
            .fetch_batch(&dashen_request(None))
            .await
            .unwrap_err();
        server.await.unwrap();

        match err {
            IngestionError::Fetch { package, message } => {
                assert_eq!(package, "com.dashen.dashensuperapp");
                assert!(message.contains("503"));
                assert!(message.contains("try again later"));
            }
            other => panic!("expected fetch error, got {other:?}"),
        }
    }

    #[test]
    fn test_short_item_yields_nulls() {
        let payload = json!([[["gp:3"]], null, null, null]);
        let batch = parse_batch_response(&envelope(Some(payload))).unwrap();
        let review = &batch.items[0];
        assert_eq!(review.review_id.as_deref(), Some("gp:3"));
        assert!(review.content.is_none());
        assert!(review.score.is_none());
        assert!(review.at.is_none());
    }
}
