//! Health aggregation operation.
//!
//! Probes the primary and replica stores through the dispatcher, catching
//! each probe failure independently so one downed store never hides the
//! other's status. `service_up` is false whenever `data_up` is false.

use keel_core::pipeline::{BoxFuture, CachePayload, Mediator, Request, RequestHandler};
use keel_core::Fault;
use keel_data::{PrimaryStorePing, ReplicaStorePing};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Health aggregation request.
///
/// Carrier attributes are captured at the boundary and carried on the
/// request value, keeping the handler free of transport types.
pub struct HealthRequest {
    /// Client network origin as the context extractor resolved it.
    pub origin: String,
    /// Carrier headers rendered for the report.
    pub headers: Vec<String>,
}

impl Request for HealthRequest {
    type Response = HealthReport;
    const NAME: &'static str = "HealthRequest";
}

/// Aggregated health report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    /// Overall service verdict; false whenever `data_up` is false.
    pub service_up: bool,
    /// Verdict over all data probes together.
    pub data_up: bool,
    /// Individual probe results by probe name.
    pub data_nodes: BTreeMap<String, bool>,
    /// Client network origin.
    pub ip: String,
    /// Carrier headers, one rendered line per header.
    pub headers: Vec<String>,
    /// Elapsed whole milliseconds since handler entry.
    pub duration: u64,
}

impl CachePayload for HealthReport {}

/// Terminal handler aggregating the store probes.
pub struct HealthHandler {
    mediator: Arc<Mediator>,
}

impl HealthHandler {
    /// Builds the handler over the dispatcher the probes are registered on.
    #[must_use]
    pub fn new(mediator: Arc<Mediator>) -> Self {
        Self { mediator }
    }
}

impl RequestHandler<HealthRequest> for HealthHandler {
    fn handle<'a>(
        &'a self,
        request: HealthRequest,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<HealthReport, Fault>> {
        Box::pin(async move {
            let started = Instant::now();

            let mut report = HealthReport {
                service_up: true,
                data_up: true,
                data_nodes: BTreeMap::new(),
                ip: request.origin,
                headers: request.headers,
                duration: 0,
            };

            // Each probe failure is caught here and recorded as false;
            // probes are the one place faults are deliberately absorbed.
            let primary = self
                .mediator
                .send(PrimaryStorePing, cancel)
                .await
                .unwrap_or(false);
            report
                .data_nodes
                .insert(PrimaryStorePing::NAME.to_string(), primary);
            if !primary {
                report.data_up = false;
            }

            let replica = self
                .mediator
                .send(ReplicaStorePing, cancel)
                .await
                .unwrap_or(false);
            report
                .data_nodes
                .insert(ReplicaStorePing::NAME.to_string(), replica);
            if !replica {
                report.data_up = false;
            }

            if !report.data_up {
                report.service_up = false;
            }

            report.duration = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

            Ok(report)
        })
    }
}

/// Renders one carrier header for the report.
#[must_use]
pub fn render_header(name: &str, value: &str) -> String {
    format!("ClientKey: {name} | Value: {value}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_core::cache::{LocalCache, MemorySharedCache};
    use keel_core::pipeline::CacheStage;
    use keel_data::{
        MemoryStore, PrimaryStorePingHandler, ReplicaStorePingHandler, StorePing,
    };

    fn mediator_with_stores(
        primary: Arc<MemoryStore>,
        replica: Arc<MemoryStore>,
    ) -> Arc<Mediator> {
        let caching = CacheStage::new(
            Arc::new(LocalCache::new()),
            Arc::new(MemorySharedCache::new()),
            true,
        );
        let mediator = Mediator::new(caching);
        mediator.register(PrimaryStorePingHandler::new(primary as Arc<dyn StorePing>));
        mediator.register(ReplicaStorePingHandler::new(replica as Arc<dyn StorePing>));
        mediator
    }

    fn request() -> HealthRequest {
        HealthRequest {
            origin: "10.0.0.9".to_string(),
            headers: vec![render_header("host", "svc.local")],
        }
    }

    #[tokio::test]
    async fn all_probes_up_yields_healthy_report() {
        let mediator =
            mediator_with_stores(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()));
        let handler = HealthHandler::new(mediator);
        let cancel = CancellationToken::new();

        let report = handler.handle(request(), &cancel).await.unwrap();

        assert!(report.service_up);
        assert!(report.data_up);
        assert_eq!(report.data_nodes.len(), 2);
        assert!(report.data_nodes.values().all(|&up| up));
        assert_eq!(report.ip, "10.0.0.9");
    }

    #[tokio::test]
    async fn one_failed_probe_downs_data_and_service() {
        let replica = Arc::new(MemoryStore::new());
        replica.set_down(true);
        let mediator = mediator_with_stores(Arc::new(MemoryStore::new()), replica);
        let handler = HealthHandler::new(mediator);
        let cancel = CancellationToken::new();

        let report = handler.handle(request(), &cancel).await.unwrap();

        assert!(!report.service_up);
        assert!(!report.data_up);
        assert_eq!(report.data_nodes.get("PrimaryStorePing"), Some(&true));
        assert_eq!(report.data_nodes.get("ReplicaStorePing"), Some(&false));
    }

    #[tokio::test]
    async fn probe_failures_do_not_abort_each_other() {
        let primary = Arc::new(MemoryStore::new());
        primary.set_down(true);
        let mediator = mediator_with_stores(primary, Arc::new(MemoryStore::new()));
        let handler = HealthHandler::new(mediator);
        let cancel = CancellationToken::new();

        let report = handler.handle(request(), &cancel).await.unwrap();

        // The replica probe still ran and reported despite the primary fault.
        assert_eq!(report.data_nodes.get("PrimaryStorePing"), Some(&false));
        assert_eq!(report.data_nodes.get("ReplicaStorePing"), Some(&true));
    }

    #[tokio::test]
    async fn report_serializes_with_wire_field_names() {
        let mediator =
            mediator_with_stores(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()));
        let handler = HealthHandler::new(mediator);
        let cancel = CancellationToken::new();

        let report = handler.handle(request(), &cancel).await.unwrap();
        let json = serde_json::to_value(&report).unwrap();

        assert!(json.get("serviceUp").is_some());
        assert!(json.get("dataUp").is_some());
        assert!(json.get("dataNodes").is_some());
        assert!(json.get("duration").is_some());
    }

    #[test]
    fn header_lines_render_key_and_value() {
        assert_eq!(
            render_header("accept", "application/json"),
            "ClientKey: accept | Value: application/json"
        );
    }
}
