//! Core data models and fetch infrastructure.

pub mod fetch_plan;
pub mod http;
pub mod logging;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod source;

pub use fetch_plan::{Endpoint, EndpointChain, EndpointTemplates, FetchAttempt, FetchOutcome};
pub use http::HttpClient;
pub use models::{
    ActivityRecord, ActivitySummary, AnyRecord, Badge, DayTotal, FillAbsent, Origin,
    ProfileRecord, Resolved, RobotOutput, SourcePayload, Submission,
};
pub use pipeline::{
    Controller, FetchContext, NoopSink, StateSink, TracingSink, WidgetState, fetch_source,
    fetch_sources,
};
pub use source::{Source, SourceSelection};
