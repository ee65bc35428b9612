//! Source implementations.
//!
//! Each source declares its endpoint chains, an alias table for its payloads
//! and its built-in overrides. The controller in [`crate::core::pipeline`]
//! drives them through the [`StatSource`] trait.

pub mod codechef;
pub mod leetcode;
pub mod wakatime;

use std::collections::BTreeMap;
use std::fmt::Debug;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::core::fetch_plan::{EndpointChain, EndpointTemplates};
use crate::core::models::FillAbsent;
use crate::core::source::Source;
use crate::error::{Result, StatError};

pub use codechef::CodeChef;
pub use leetcode::LeetCode;
pub use wakatime::WakaTime;

/// A configured source the controller can fetch.
pub trait StatSource: Send + Sync {
    /// Normalized record type.
    type Record: Clone + Debug + Serialize + DeserializeOwned + FillAbsent + Send + Sync + 'static;

    /// Which source this is.
    fn kind(&self) -> Source;

    /// Account selector substituted into URLs and cache keys.
    fn identity(&self) -> &str;

    /// Chain for the primary resource.
    fn primary(&self) -> EndpointChain;

    /// Optional resources fetched after the primary succeeded.
    fn sub_resources(&self) -> Vec<EndpointChain> {
        Vec::new()
    }

    /// Map a primary payload to a record.
    ///
    /// # Errors
    ///
    /// `UnsupportedShape` when the payload carries none of the structural
    /// markers for this source.
    fn normalize(&self, payload: &Value) -> Result<Self::Record>;

    /// Fold a sub-resource payload into `record`.
    ///
    /// Returns `Ok(true)` when a non-empty result replaced part of the
    /// record, `Ok(false)` when the payload held nothing usable.
    ///
    /// # Errors
    ///
    /// `UnsupportedShape` for payloads that are not this resource at all.
    fn apply_sub_resource(
        &self,
        _record: &mut Self::Record,
        resource: &str,
        _payload: &Value,
    ) -> Result<bool> {
        tracing::debug!(source = %self.kind(), resource, "No handler for sub-resource");
        Ok(false)
    }

    /// Built-in values for absent fields.
    fn default_overrides(&self) -> Self::Record;

    /// Stable cache key.
    fn cache_key(&self) -> String {
        self.kind().cache_key(self.identity())
    }
}

/// Identity and endpoint overrides shared by every source constructor.
#[derive(Debug, Clone, Default)]
pub struct SourceContext {
    pub identity: String,
    pub endpoints: BTreeMap<String, EndpointTemplates>,
}

impl SourceContext {
    #[must_use]
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            endpoints: BTreeMap::new(),
        }
    }

    /// Builder: override one resource's templates.
    #[must_use]
    pub fn with_endpoints(mut self, resource: &str, templates: EndpointTemplates) -> Self {
        self.endpoints.insert(resource.to_string(), templates);
        self
    }

    /// Resolve a chain against built-in defaults.
    #[must_use]
    pub fn chain(
        &self,
        resource: &'static str,
        default_primary: &str,
        default_fallback: Option<&str>,
    ) -> EndpointChain {
        EndpointChain::resolve(
            resource,
            &self.identity,
            default_primary,
            default_fallback,
            self.endpoints.get(resource),
        )
    }
}

/// Decode configured overrides and layer them over the source defaults.
///
/// Configured values win; defaults only fill what the config leaves out.
///
/// # Errors
///
/// Returns `Config` if the table does not fit the record schema.
pub fn resolve_overrides<R>(source: Source, raw: Option<&Value>, defaults: R) -> Result<R>
where
    R: DeserializeOwned + FillAbsent,
{
    let Some(raw) = raw else {
        return Ok(defaults);
    };
    let mut overrides: R = serde_json::from_value(raw.clone()).map_err(|e| {
        StatError::Config(format!("sources.{source}.overrides: {e}"))
    })?;
    overrides.fill_absent(&defaults);
    Ok(overrides)
}

/// Reject blank identities before they reach a URL.
pub(crate) fn require_identity(source: Source, identity: &str) -> Result<String> {
    let trimmed = identity.trim();
    if trimmed.is_empty() {
        return Err(StatError::MissingIdentity(source.cli_name().to_string()));
    }
    Ok(trimmed.to_string())
}
