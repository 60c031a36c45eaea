//! Metrics definitions for the relay.

use shared::metrics_defs::{MetricDef, MetricType};

pub const REQUESTS: MetricDef = MetricDef {
    name: "relay.requests",
    metric_type: MetricType::Counter,
    description: "Requests served by the relay, tagged by response status",
};

pub const RATE_LIMITED: MetricDef = MetricDef {
    name: "relay.rate_limited",
    metric_type: MetricType::Counter,
    description: "Requests rejected by the per-client rate ceiling",
};

pub const CORS_REJECTED: MetricDef = MetricDef {
    name: "relay.cors_rejected",
    metric_type: MetricType::Counter,
    description: "Requests rejected because their origin is not allowed",
};

pub const UPSTREAM_UPDATES: MetricDef = MetricDef {
    name: "relay.upstream.updates",
    metric_type: MetricType::Counter,
    description: "Per-repository visibility updates, tagged by outcome",
};

pub const UPSTREAM_UPDATE_DURATION: MetricDef = MetricDef {
    name: "relay.upstream.update.duration",
    metric_type: MetricType::Histogram,
    description: "Time for one upstream visibility update in seconds",
};

pub const ALL_METRICS: &[MetricDef] = &[
    REQUESTS,
    RATE_LIMITED,
    CORS_REJECTED,
    UPSTREAM_UPDATES,
    UPSTREAM_UPDATE_DURATION,
];
