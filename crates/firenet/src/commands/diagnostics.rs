//! `diagnostics`: redacted dump for bug reports.

use firenet_core::Coordinator;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

pub async fn handle(coordinator: &Coordinator, global: &GlobalOpts) -> Result<(), CliError> {
    // A failed tick is part of the report, not a reason to abort it.
    if let Err(e) = coordinator.refresh().await {
        tracing::debug!(error = %e, "refresh failed before diagnostics");
    }

    let report = coordinator.diagnostics();
    // No table layout for a nested report.
    let format = match global.output {
        OutputFormat::Table | OutputFormat::Plain => OutputFormat::Json,
        ref other => other.clone(),
    };
    let out = output::render_single(&format, &report, |_| String::new(), |_| String::new());
    output::print_output(&out, global.quiet);
    Ok(())
}
