//! # Metrics
//!
//! Prometheus counters for the HTTP surface, rendered as text exposition
//! at `GET /admin/metrics`.

use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::{EncodeLabelSet, EncodeLabelValue, LabelValueEncoder};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::registry::Registry;

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct RequestLabels {
    pub method: String,
    pub status: String,
}

/// Why a request was turned away.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum DenialReason {
    /// Missing, malformed or rejected bearer token.
    Credential,
    /// Role outside the route's allow-list.
    Role,
    /// Record-level check failed.
    Ownership,
}

impl DenialReason {
    pub fn as_str(self) -> &'static str {
        match self {
            DenialReason::Credential => "credential",
            DenialReason::Role => "role",
            DenialReason::Ownership => "ownership",
        }
    }
}

impl EncodeLabelValue for DenialReason {
    fn encode(&self, encoder: &mut LabelValueEncoder) -> Result<(), std::fmt::Error> {
        EncodeLabelValue::encode(&self.as_str(), encoder)
    }
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct DenialLabels {
    reason: DenialReason,
}

#[derive(Debug)]
pub struct Metrics {
    registry: Registry,
    requests: Family<RequestLabels, Counter>,
    denials: Family<DenialLabels, Counter>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::default();
        let requests = Family::<RequestLabels, Counter>::default();
        let denials = Family::<DenialLabels, Counter>::default();
        registry.register(
            "helpdesk_http_requests",
            "HTTP requests by method and status",
            requests.clone(),
        );
        registry.register(
            "helpdesk_access_denials",
            "Requests refused by the access guard or the record mediator",
            denials.clone(),
        );
        Self {
            registry,
            requests,
            denials,
        }
    }

    pub fn record_request(&self, method: &str, status: u16) {
        self.requests
            .get_or_create(&RequestLabels {
                method: method.to_string(),
                status: status.to_string(),
            })
            .inc();
    }

    pub fn record_denial(&self, reason: DenialReason) {
        self.denials.get_or_create(&DenialLabels { reason }).inc();
    }

    /// OpenMetrics text; falls back to an empty body if encoding fails.
    pub fn render(&self) -> String {
        let mut body = String::new();
        if let Err(err) = encode(&mut body, &self.registry) {
            tracing::error!(%err, "failed to encode metrics");
            body.clear();
        }
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_in_exposition() {
        let metrics = Metrics::new();
        metrics.record_request("GET", 200);
        metrics.record_request("GET", 200);
        metrics.record_denial(DenialReason::Ownership);

        let text = metrics.render();
        assert!(text.contains(r#"helpdesk_http_requests_total{method="GET",status="200"} 2"#));
        assert!(text.contains(r#"helpdesk_access_denials_total{reason="ownership"} 1"#));
    }
}
