//! HTTP transport over `reqwest`.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use super::{Transport, record_path};
use crate::error::TransportError;
use crate::record::{Payload, Record, RecordId};

/// [`Transport`] talking JSON to a REST server.
#[derive(Debug, Clone)]
pub struct HttpTransport {
	base_url: Url,
	client: Client,
}

impl HttpTransport {
	/// Builds a transport for `base_url` with a per-request timeout.
	pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
		let client = Client::builder()
			.timeout(timeout)
			.pool_idle_timeout(Duration::from_secs(90))
			.build()
			.map_err(|e| TransportError::Config(e.to_string()))?;
		Self::with_client(base_url, client)
	}

	/// Uses a preconfigured client.
	pub fn with_client(base_url: &str, client: Client) -> Result<Self, TransportError> {
		let base_url = Url::parse(base_url).map_err(|e| TransportError::Config(format!("invalid base url {base_url:?}: {e}")))?;
		if base_url.cannot_be_a_base() {
			return Err(TransportError::Config(format!("{base_url} cannot be a base url")));
		}
		Ok(Self { base_url, client })
	}

	/// Returns the server base URL.
	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	/// Resolves an endpoint path below the base URL, keeping any base path prefix.
	fn url(&self, path: &str) -> Result<Url, TransportError> {
		let base = self.base_url.as_str().trim_end_matches('/');
		let path = path.trim_start_matches('/');
		Url::parse(&format!("{base}/{path}")).map_err(|e| TransportError::Config(format!("invalid endpoint {path:?}: {e}")))
	}

	async fn send(&self, method: &'static str, url: Url, request: RequestBuilder) -> Result<Response, TransportError> {
		let started = Instant::now();
		debug!(%method, %url, "http.request");

		let response = request.send().await.map_err(|e| {
			warn!(%method, %url, error = %e, "http.request.failed");
			TransportError::Network(e.to_string())
		})?;

		let status = response.status();
		debug!(%method, %url, status = status.as_u16(), elapsed_ms = started.elapsed().as_millis() as u64, "http.response");
		if status.is_success() {
			return Ok(response);
		}
		if status == StatusCode::NOT_FOUND {
			return Err(TransportError::NotFound);
		}

		let body = response.text().await.unwrap_or_default();
		let message = error_message(&body);
		warn!(%method, %url, status = status.as_u16(), message = message.as_deref().unwrap_or(""), "http.response.error");
		Err(TransportError::Status {
			status: status.as_u16(),
			message,
		})
	}

	async fn decode(response: Response) -> Result<Value, TransportError> {
		response.json::<Value>().await.map_err(|e| TransportError::Decode(e.to_string()))
	}
}

/// Extracts a human-readable message from an error body.
///
/// JSON bodies with a `message` or `error` string win; otherwise the trimmed
/// body is used if non-empty.
fn error_message(body: &str) -> Option<String> {
	if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
		for key in ["message", "error"] {
			if let Some(Value::String(message)) = map.get(key) {
				return Some(message.clone());
			}
		}
	}
	let trimmed = body.trim();
	(!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[async_trait]
impl Transport for HttpTransport {
	async fn list(&self, endpoint: &str) -> Result<Vec<Record>, TransportError> {
		let url = self.url(endpoint)?;
		let response = self.send("GET", url.clone(), self.client.get(url)).await?;
		Record::list_from_value(Self::decode(response).await?)
	}

	async fn create(&self, endpoint: &str, payload: &Payload) -> Result<Record, TransportError> {
		let url = self.url(endpoint)?;
		let response = self.send("POST", url.clone(), self.client.post(url).json(payload)).await?;
		Record::from_value(Self::decode(response).await?)
	}

	async fn update(&self, endpoint: &str, id: &RecordId, payload: &Payload) -> Result<Record, TransportError> {
		let url = self.url(&record_path(endpoint, id))?;
		let response = self.send("PUT", url.clone(), self.client.put(url).json(payload)).await?;
		Record::from_value(Self::decode(response).await?)
	}

	async fn delete(&self, endpoint: &str, id: &RecordId) -> Result<(), TransportError> {
		let url = self.url(&record_path(endpoint, id))?;
		self.send("DELETE", url.clone(), self.client.delete(url)).await?;
		Ok(())
	}
}
