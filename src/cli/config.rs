//! Config command implementation.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Serialize;

use crate::cli::args::{Cli, ConfigCommand, OutputFormat};
use crate::core::fetch_plan::EndpointTemplates;
use crate::core::source::Source;
use crate::error::Result;
use crate::render::robot;
use crate::storage::config::{ConfigSource, ResolvedConfig};

/// Effective configuration with the origin of each value.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigView {
    pub config_path: String,
    pub format: Valued<&'static str>,
    pub timeout_seconds: Valued<u64>,
    pub no_color: Valued<bool>,
    pub pretty: Valued<bool>,
    pub cache_dir: Valued<String>,
    pub sources: BTreeMap<Source, SourceView>,
}

#[derive(Debug, Serialize)]
pub struct Valued<T> {
    pub value: T,
    pub from: ConfigSource,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceView {
    pub identity: Option<String>,
    pub identity_from: ConfigSource,
    pub ttl_seconds: u64,
    pub endpoints: BTreeMap<String, EndpointTemplates>,
    pub has_overrides: bool,
}

impl ConfigView {
    #[must_use]
    pub fn from_resolved(cfg: &ResolvedConfig) -> Self {
        let sources = cfg
            .sources
            .iter()
            .map(|(source, settings)| {
                (
                    *source,
                    SourceView {
                        identity: settings.identity.clone(),
                        identity_from: settings.identity_origin,
                        ttl_seconds: settings.ttl.as_secs(),
                        endpoints: settings.endpoints.clone(),
                        has_overrides: settings.overrides.is_some(),
                    },
                )
            })
            .collect();

        Self {
            config_path: cfg.config_path.display().to_string(),
            format: Valued {
                value: cfg.format.as_str(),
                from: cfg.origins.format,
            },
            timeout_seconds: Valued {
                value: cfg.timeout.as_secs(),
                from: cfg.origins.timeout,
            },
            no_color: Valued {
                value: cfg.no_color,
                from: cfg.origins.no_color,
            },
            pretty: Valued {
                value: cfg.pretty,
                from: cfg.origins.pretty,
            },
            cache_dir: Valued {
                value: cfg.cache_dir.display().to_string(),
                from: cfg.origins.cache_dir,
            },
            sources,
        }
    }

    /// Plain listing for terminals.
    #[must_use]
    pub fn render_human(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Config file: {}", self.config_path);
        let _ = writeln!(out, "format       {:<24} ({})", self.format.value, self.format.from);
        let _ = writeln!(
            out,
            "timeout      {:<24} ({})",
            format!("{}s", self.timeout_seconds.value),
            self.timeout_seconds.from
        );
        let _ = writeln!(out, "no_color     {:<24} ({})", self.no_color.value, self.no_color.from);
        let _ = writeln!(out, "pretty       {:<24} ({})", self.pretty.value, self.pretty.from);
        let _ = writeln!(out, "cache_dir    {} ({})", self.cache_dir.value, self.cache_dir.from);

        for (source, view) in &self.sources {
            let _ = writeln!(out, "\n[{source}]");
            let identity = view.identity.as_deref().unwrap_or("(none)");
            let _ = writeln!(out, "  identity   {identity} ({})", view.identity_from);
            let _ = writeln!(out, "  ttl        {}s", view.ttl_seconds);
            for (resource, templates) in &view.endpoints {
                if let Some(primary) = &templates.primary {
                    let _ = writeln!(out, "  {resource}.primary   {primary}");
                }
                if let Some(fallback) = &templates.fallback {
                    let _ = writeln!(out, "  {resource}.fallback  {fallback}");
                }
            }
            if view.has_overrides {
                out.push_str("  overrides  configured\n");
            }
        }
        out
    }
}

/// Execute a config subcommand.
///
/// # Errors
///
/// Returns an error if the configuration cannot be resolved.
pub fn execute(cli: &Cli, cmd: &ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Path => {
            let path = ResolvedConfig::config_path_with(&crate::storage::config::process_env);
            println!("{}", path.display());
        }
        ConfigCommand::Show => {
            let cfg = ResolvedConfig::resolve(cli, None)?;
            let view = ConfigView::from_resolved(&cfg);
            match cfg.format {
                OutputFormat::Human | OutputFormat::Md => print!("{}", view.render_human()),
                OutputFormat::Json => {
                    println!("{}", robot::render_envelope("config", &view, Vec::new(), cfg.pretty)?);
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::config::Config;
    use clap::Parser;
    use std::path::PathBuf;

    fn resolved(env: &[(&str, &str)]) -> ResolvedConfig {
        let pairs: Vec<(String, String)> = env
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        let lookup = move |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        };
        let cli = Cli::try_parse_from(["statcard", "config", "show"]).unwrap();
        ResolvedConfig::resolve_with(
            &cli,
            None,
            &Config::default(),
            PathBuf::from("/etc/statcard.toml"),
            &lookup,
        )
        .unwrap()
    }

    #[test]
    fn view_reports_origins() {
        let view = ConfigView::from_resolved(&resolved(&[
            ("STATCARD_CODECHEF_IDENTITY", "chef"),
            ("STATCARD_CACHE_DIR", "/tmp/statcard"),
        ]));
        assert_eq!(view.cache_dir.value, "/tmp/statcard");
        assert_eq!(view.cache_dir.from, ConfigSource::Env);
        let codechef = &view.sources[&Source::CodeChef];
        assert_eq!(codechef.identity.as_deref(), Some("chef"));
        assert_eq!(codechef.identity_from, ConfigSource::Env);
        assert_eq!(codechef.ttl_seconds, 21_600);
    }

    #[test]
    fn human_listing_names_every_source() {
        let text = ConfigView::from_resolved(&resolved(&[])).render_human();
        assert!(text.starts_with("Config file: /etc/statcard.toml\n"));
        for source in Source::ALL {
            assert!(text.contains(&format!("[{source}]")));
        }
        assert!(text.contains("identity   (none) (default)"));
    }

    #[test]
    fn json_view_uses_kebab_origins() {
        let view = ConfigView::from_resolved(&resolved(&[]));
        let v = serde_json::to_value(&view).unwrap();
        assert_eq!(v["timeoutSeconds"]["value"], 30);
        assert_eq!(v["timeoutSeconds"]["from"], "default");
        assert_eq!(v["sources"]["leetcode"]["identityFrom"], "default");
    }
}
