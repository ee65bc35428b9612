//! Output rendering for human and robot modes.

pub mod error;
pub mod human;
pub mod robot;

use crate::cli::args::OutputFormat;
use crate::core::models::SourcePayload;
use crate::error::Result;

/// Render fetch results in the requested format.
///
/// Human output lists errors separately on stderr; machine formats embed
/// them.
pub fn render_fetch(
    payloads: &[SourcePayload],
    errors: &[String],
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<String> {
    match format {
        OutputFormat::Human => Ok(human::render_fetch(payloads, no_color)),
        OutputFormat::Json => robot::render_envelope("fetch", payloads, errors.to_vec(), pretty),
        OutputFormat::Md => Ok(robot::render_fetch_md(payloads, errors)),
    }
}
