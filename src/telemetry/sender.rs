use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("failed to send metrics to {address}: {source}")]
    Send {
        address: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("proxy at {address} rejected metrics with status {status}")]
    Rejected { address: String, status: u16 },
}

/// One point in Wavefront line format
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub metric: String,
    pub value: f64,
    pub source: String,
    pub tags: BTreeMap<String, String>,
}

impl Point {
    /// `<metric> <value> source=<source> key="value" ...`
    pub fn to_line(&self) -> String {
        let mut line = format!(
            "{} {} source={}",
            self.metric,
            self.value,
            quote(&self.source)
        );
        for (key, value) in &self.tags {
            if value.is_empty() {
                continue;
            }
            line.push(' ');
            line.push_str(key);
            line.push('=');
            line.push_str(&quote(value));
        }
        line
    }
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', " "))
}

/// Transport for operator telemetry
#[async_trait]
pub trait MetricSender: Send + Sync + std::fmt::Debug {
    async fn send(&self, points: &[Point]) -> Result<(), TelemetryError>;
}

/// Sends points to a Wavefront proxy's HTTP listener
#[derive(Debug, Clone)]
pub struct HttpMetricSender {
    client: reqwest::Client,
    address: String,
}

impl HttpMetricSender {
    pub fn new(address: &str) -> Result<Self, TelemetryError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(TelemetryError::Client)?;
        Ok(Self {
            client,
            address: address.to_string(),
        })
    }

    fn endpoint(&self) -> String {
        if self.address.starts_with("http://") || self.address.starts_with("https://") {
            self.address.clone()
        } else {
            format!("http://{}", self.address)
        }
    }
}

#[async_trait]
impl MetricSender for HttpMetricSender {
    async fn send(&self, points: &[Point]) -> Result<(), TelemetryError> {
        let body = points
            .iter()
            .map(Point::to_line)
            .collect::<Vec<_>>()
            .join("\n");
        let response = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "text/plain")
            .body(body)
            .send()
            .await
            .map_err(|source| TelemetryError::Send {
                address: self.address.clone(),
                source,
            })?;
        if !response.status().is_success() {
            return Err(TelemetryError::Rejected {
                address: self.address.clone(),
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_format() {
        let point = Point {
            metric: "kubernetes.observability.status".to_string(),
            value: 1.0,
            source: "prod".to_string(),
            tags: BTreeMap::from([
                ("message".to_string(), "say \"hi\"".to_string()),
                ("status".to_string(), "Healthy".to_string()),
                ("empty".to_string(), String::new()),
            ]),
        };
        assert_eq!(
            point.to_line(),
            r#"kubernetes.observability.status 1 source="prod" message="say \"hi\"" status="Healthy""#
        );
    }

    #[test]
    fn test_endpoint_defaults_to_http() {
        let sender = HttpMetricSender::new("wavefront-proxy:2878").unwrap();
        assert_eq!(sender.endpoint(), "http://wavefront-proxy:2878");
        let sender = HttpMetricSender::new("https://proxy.example.com").unwrap();
        assert_eq!(sender.endpoint(), "https://proxy.example.com");
    }
}
