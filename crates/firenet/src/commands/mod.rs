//! Command dispatch.

pub mod config_cmd;
pub mod control;
pub mod diagnostics;
pub mod status;
pub mod stoves;
pub mod util;
pub mod watch;

use firenet_core::{Coordinator, CoordinatorConfig};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Run a stove command against a freshly set-up coordinator.
///
/// One-shot commands share a single login; `watch` owns its own
/// long-lived coordinator.
pub async fn dispatch(
    cmd: Command,
    config: CoordinatorConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if let Command::Watch(args) = cmd {
        return watch::handle(config, args, global).await;
    }

    let result = Coordinator::oneshot(config, |coordinator| async move {
        let outcome = match cmd {
            Command::Stoves => stoves::handle(&coordinator, global).await,
            Command::Status(args) => status::handle(&coordinator, args, global).await,
            Command::Set(args) => control::handle(&coordinator, args, global).await,
            Command::Diagnostics => diagnostics::handle(&coordinator, global).await,
            Command::Watch(_) | Command::Config(_) | Command::Completions(_) => Ok(()),
        };
        Ok(outcome)
    })
    .await?;

    result
}
