// ThingSpeak implementation of the telemetry client
use crate::application::channel_registry::ChannelConfig;
use crate::application::errors::TelemetryError;
use crate::application::telemetry_client::TelemetryClient;
use crate::domain::crop::CropId;
use crate::domain::sample::Sample;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ThingSpeakClient {
    http: reqwest::Client,
    base_url: String,
    selection: ChannelConfig,
}

/// One feed entry as ThingSpeak returns it:
/// field1 = threshold, field2 = soil moisture, field3 = pump, field4 = water level.
/// Field values usually arrive as strings and may be null or absent.
#[derive(Debug, Deserialize)]
struct FeedEntry {
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    field1: Option<Value>,
    #[serde(default)]
    field2: Option<Value>,
    #[serde(default)]
    field3: Option<Value>,
    #[serde(default)]
    field4: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct FeedsResponse {
    feeds: Vec<Value>,
}

impl ThingSpeakClient {
    pub fn new(
        base_url: impl Into<String>,
        selection: ChannelConfig,
        timeout: Option<Duration>,
    ) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            selection,
        })
    }

    fn update_url(&self, crop: CropId) -> String {
        format!(
            "{}/update?api_key={}&field1={}",
            self.base_url,
            urlencoding::encode(&self.selection.write_api_key),
            crop
        )
    }

    fn latest_url(&self, channel: &ChannelConfig) -> String {
        format!(
            "{}/channels/{}/feeds/last.json?api_key={}",
            self.base_url,
            urlencoding::encode(&channel.channel_id),
            urlencoding::encode(&channel.read_api_key)
        )
    }

    fn history_url(&self, channel: &ChannelConfig, count: usize) -> String {
        format!(
            "{}/channels/{}/feeds.json?api_key={}&results={}",
            self.base_url,
            urlencoding::encode(&channel.channel_id),
            urlencoding::encode(&channel.read_api_key),
            count
        )
    }

    async fn get(&self, url: &str) -> Result<bytes::Bytes, TelemetryError> {
        let response = self
            .http
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| TelemetryError::Transport(Box::new(e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TelemetryError::Status(status.as_u16()));
        }

        response
            .bytes()
            .await
            .map_err(|e| TelemetryError::Transport(Box::new(e)))
    }
}

#[async_trait]
impl TelemetryClient for ThingSpeakClient {
    async fn publish_selection(&self, crop: CropId) -> Result<(), TelemetryError> {
        let body = self.get(&self.update_url(crop)).await?;

        // ThingSpeak answers with the new entry id, or "0" when it refuses the write
        let body = String::from_utf8_lossy(&body);
        let body = body.trim();
        if body.is_empty() || body == "0" {
            return Err(TelemetryError::Rejected);
        }

        tracing::debug!(crop_id = %crop, entry = body, "crop selection published");
        Ok(())
    }

    async fn read_latest(&self, channel: &ChannelConfig) -> Result<Sample, TelemetryError> {
        let body = self.get(&self.latest_url(channel)).await?;
        let entry: FeedEntry = serde_json::from_slice(&body)
            .map_err(|e| TelemetryError::Malformed(e.to_string()))?;

        normalize(&entry).ok_or_else(|| {
            TelemetryError::Malformed("latest entry has no valid created_at".to_string())
        })
    }

    async fn read_history(
        &self,
        channel: &ChannelConfig,
        count: usize,
    ) -> Result<Vec<Sample>, TelemetryError> {
        let body = self.get(&self.history_url(channel, count)).await?;
        let response: FeedsResponse = serde_json::from_slice(&body)
            .map_err(|e| TelemetryError::Malformed(e.to_string()))?;

        let total = response.feeds.len();
        let mut samples: Vec<Sample> = response
            .feeds
            .into_iter()
            .filter_map(|raw| serde_json::from_value::<FeedEntry>(raw).ok())
            .filter_map(|entry| normalize(&entry))
            .collect();

        if samples.len() < total {
            tracing::debug!(
                channel_id = %channel.channel_id,
                dropped = total - samples.len(),
                "skipped unusable history entries"
            );
        }

        samples.sort_by_key(|s| s.timestamp);
        let excess = samples.len().saturating_sub(count);
        samples.drain(..excess);
        Ok(samples)
    }
}

/// Map a raw entry onto a `Sample`. Only an unusable timestamp rejects the
/// entry; bad metric fields become 0 / pump off.
fn normalize(entry: &FeedEntry) -> Option<Sample> {
    let timestamp = entry.created_at.as_deref().and_then(parse_timestamp)?;

    Some(Sample::new(
        timestamp,
        parse_number(entry.field1.as_ref()),
        parse_number(entry.field2.as_ref()),
        parse_number(entry.field4.as_ref()),
        parse_pump(entry.field3.as_ref()),
    ))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

fn parse_number(raw: Option<&Value>) -> f64 {
    let parsed = match raw {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}

fn parse_pump(raw: Option<&Value>) -> bool {
    match raw {
        Some(Value::String(s)) => s == "1",
        Some(Value::Number(n)) => n.as_i64() == Some(1),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, http::StatusCode, routing::get, Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    fn channel(id: &str) -> ChannelConfig {
        ChannelConfig::new(id, "W", "R")
    }

    /// Stand-in for api.thingspeak.com bound to an ephemeral port
    async fn spawn_fake_thingspeak() -> String {
        let router = Router::new()
            .route(
                "/update",
                get(|Query(q): Query<HashMap<String, String>>| async move {
                    match (q.get("api_key").map(String::as_str), q.get("field1").map(String::as_str)) {
                        (Some("SELW"), Some("9")) => "0".to_string(),
                        (Some("SELW"), Some(_)) => "4711".to_string(),
                        _ => "0".to_string(),
                    }
                }),
            )
            .route(
                "/channels/good/feeds/last.json",
                get(|| async {
                    Json(json!({
                        "created_at": "2026-10-16T08:33:04Z",
                        "entry_id": 12,
                        "field1": "60",
                        "field2": "41.5",
                        "field3": "1"
                    }))
                }),
            )
            .route(
                "/channels/good/feeds.json",
                get(|| async {
                    Json(json!({
                        "channel": { "id": 1 },
                        "feeds": [
                            { "created_at": "2026-10-16T08:00:30Z", "field1": "60", "field2": "30", "field3": "0", "field4": "9" },
                            { "created_at": "2026-10-16T08:00:00Z", "field1": "60", "field2": null, "field3": "1", "field4": "8.5" },
                            { "field2": "55" },
                            { "created_at": "2026-10-16T08:01:00Z", "field1": "sixty", "field2": "31", "field3": 1 }
                        ]
                    }))
                }),
            )
            .route(
                "/channels/down/feeds/last.json",
                get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
            )
            .route(
                "/channels/down/feeds.json",
                get(|| async { StatusCode::NOT_FOUND }),
            )
            .route(
                "/channels/garbled/feeds/last.json",
                get(|| async { "<html>maintenance</html>" }),
            )
            .route(
                "/channels/garbled/feeds.json",
                get(|| async { Json(json!({ "channel": { "id": 3 } })) }),
            )
            .route("/channels/empty/feeds/last.json", get(|| async { "-1" }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn client() -> ThingSpeakClient {
        let base = spawn_fake_thingspeak().await;
        ThingSpeakClient::new(format!("{}/", base), ChannelConfig::new("sel", "SELW", "SELR"), None)
            .unwrap()
    }

    #[tokio::test]
    async fn test_publish_selection_success_and_rejection() {
        let client = client().await;
        assert!(client.publish_selection(CropId(2)).await.is_ok());
        assert!(matches!(
            client.publish_selection(CropId(9)).await,
            Err(TelemetryError::Rejected)
        ));
    }

    #[tokio::test]
    async fn test_publish_selection_unreachable() {
        // Port 9 (discard) on localhost is closed in test environments
        let client =
            ThingSpeakClient::new("http://127.0.0.1:9", channel("sel"), Some(Duration::from_secs(2))).unwrap();
        assert!(matches!(
            client.publish_selection(CropId(1)).await,
            Err(TelemetryError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_read_latest_normalizes_missing_fields() {
        let client = client().await;
        let sample = client.read_latest(&channel("good")).await.unwrap();

        assert_eq!(sample.timestamp.to_rfc3339(), "2026-10-16T08:33:04+00:00");
        assert_eq!(sample.threshold, 60.0);
        assert_eq!(sample.soil_moisture, 41.5);
        assert!(sample.pump_on);
        // field4 absent
        assert_eq!(sample.water_level, 0.0);
    }

    #[tokio::test]
    async fn test_read_latest_failures() {
        let client = client().await;
        assert!(matches!(
            client.read_latest(&channel("down")).await,
            Err(TelemetryError::Status(503))
        ));
        assert!(matches!(
            client.read_latest(&channel("garbled")).await,
            Err(TelemetryError::Malformed(_))
        ));
        assert!(matches!(
            client.read_latest(&channel("empty")).await,
            Err(TelemetryError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn test_read_history_orders_and_normalizes() {
        let client = client().await;
        let samples = client.read_history(&channel("good"), 20).await.unwrap();

        assert_eq!(samples.len(), 3);
        assert!(samples.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert_eq!(samples[0].soil_moisture, 0.0);
        assert_eq!(samples[0].water_level, 8.5);
        assert!(samples[0].pump_on);
        assert_eq!(samples[2].threshold, 0.0);
        assert!(samples[2].pump_on);
        assert_eq!(samples[2].water_level, 0.0);
    }

    #[tokio::test]
    async fn test_read_history_keeps_most_recent() {
        let client = client().await;
        let samples = client.read_history(&channel("good"), 2).await.unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].soil_moisture, 30.0);
        assert_eq!(samples[1].soil_moisture, 31.0);
    }

    #[tokio::test]
    async fn test_read_history_failures() {
        let client = client().await;
        assert!(matches!(
            client.read_history(&channel("down"), 20).await,
            Err(TelemetryError::Status(404))
        ));
        assert!(matches!(
            client.read_history(&channel("garbled"), 20).await,
            Err(TelemetryError::Malformed(_))
        ));
    }

    #[test]
    fn test_pump_is_on_only_for_literal_one() {
        assert!(parse_pump(Some(&json!("1"))));
        assert!(!parse_pump(Some(&json!("1.0"))));
        assert!(!parse_pump(Some(&json!(" 1"))));
        assert!(!parse_pump(Some(&json!("0"))));
        assert!(!parse_pump(None));
    }

    #[test]
    fn test_parse_number_defaults_to_zero() {
        assert_eq!(parse_number(Some(&json!(" 12.5 "))), 12.5);
        assert_eq!(parse_number(Some(&json!(7))), 7.0);
        assert_eq!(parse_number(Some(&json!("n/a"))), 0.0);
        assert_eq!(parse_number(Some(&json!("NaN"))), 0.0);
        assert_eq!(parse_number(Some(&Value::Null)), 0.0);
        assert_eq!(parse_number(None), 0.0);
    }
}
