//! # Telemetry
//!
//! Reports the operator's own status through the proxy it manages, so the
//! health of the integration is visible next to the data it ships.
//!
//! The connection follows the proxy address across passes: it connects once an
//! address is known, reconnects when the address changes, and closes when the
//! desired-state resource is deleted.

mod sender;

pub use sender::{HttpMetricSender, MetricSender, Point, TelemetryError};

use crate::crd::{HealthStatus, WavefrontStatus};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

pub const STATUS_METRIC: &str = "kubernetes.observability.status";
pub const COMPONENT_STATUS_METRIC: &str = "kubernetes.observability.component.status";

/// Creates a sender for a proxy address
pub type SenderFactory =
    Arc<dyn Fn(&str) -> Result<Box<dyn MetricSender>, TelemetryError> + Send + Sync>;

/// Identity attached to every reported point
#[derive(Debug, Clone, Default)]
pub struct ClusterIdentity {
    pub cluster_name: String,
    pub cluster_uuid: String,
    pub operator_version: String,
}

pub struct TelemetryConnection {
    factory: SenderFactory,
    address: String,
    sender: Option<Box<dyn MetricSender>>,
}

impl std::fmt::Debug for TelemetryConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryConnection")
            .field("address", &self.address)
            .field("connected", &self.sender.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for TelemetryConnection {
    fn default() -> Self {
        Self::http()
    }
}

impl TelemetryConnection {
    /// Connection sending over HTTP with [`HttpMetricSender`]
    pub fn http() -> Self {
        Self::with_factory(Arc::new(|address: &str| {
            Ok(Box::new(HttpMetricSender::new(address)?) as Box<dyn MetricSender>)
        }))
    }

    pub fn with_factory(factory: SenderFactory) -> Self {
        Self {
            factory,
            address: String::new(),
            sender: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.sender.is_some()
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Ensure a sender for `address`, replacing one for a different address
    pub fn connect(&mut self, address: &str) -> Result<(), TelemetryError> {
        if self.sender.is_some() && self.address == address {
            return Ok(());
        }
        if self.sender.is_some() {
            info!(old = %self.address, new = %address, "proxy address changed, reconnecting telemetry");
        }
        self.close();
        self.sender = Some((self.factory)(address)?);
        self.address = address.to_string();
        debug!(address = %address, "telemetry connected");
        Ok(())
    }

    pub fn close(&mut self) {
        if self.sender.take().is_some() {
            debug!(address = %self.address, "telemetry closed");
        }
        self.address.clear();
    }

    /// Send the aggregate and per-workload status; no-op when not connected
    pub async fn report(
        &self,
        identity: &ClusterIdentity,
        status: &WavefrontStatus,
    ) -> Result<(), TelemetryError> {
        let Some(sender) = &self.sender else {
            return Ok(());
        };
        sender.send(&status_points(identity, status)).await
    }
}

/// Points describing one status snapshot
pub fn status_points(identity: &ClusterIdentity, status: &WavefrontStatus) -> Vec<Point> {
    let base_tags = BTreeMap::from([
        ("cluster".to_string(), identity.cluster_name.clone()),
        ("cluster_uuid".to_string(), identity.cluster_uuid.clone()),
        ("operator_version".to_string(), identity.operator_version.clone()),
    ]);

    let mut aggregate_tags = base_tags.clone();
    aggregate_tags.insert("status".to_string(), status.status.to_string());
    aggregate_tags.insert("message".to_string(), status.message.clone());

    let mut points = vec![Point {
        metric: STATUS_METRIC.to_string(),
        value: if status.status == HealthStatus::Healthy { 1.0 } else { 0.0 },
        source: identity.cluster_name.clone(),
        tags: aggregate_tags,
    }];

    for resource in &status.resource_statuses {
        let mut tags = base_tags.clone();
        tags.insert("name".to_string(), resource.name.clone());
        tags.insert("status".to_string(), resource.status.clone());
        tags.insert("message".to_string(), resource.message.clone());
        points.push(Point {
            metric: COMPONENT_STATUS_METRIC.to_string(),
            value: if resource.healthy { 1.0 } else { 0.0 },
            source: identity.cluster_name.clone(),
            tags,
        });
    }
    points
}
