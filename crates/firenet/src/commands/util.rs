//! Shared helpers for command handlers.

use std::sync::Arc;

use serde_json::Value;

use firenet_core::{Coordinator, Stove};

use crate::error::CliError;

/// Resolve a stove by exact id, then by case-insensitive name.
pub fn find_stove(coordinator: &Coordinator, identifier: &str) -> Result<Arc<Stove>, CliError> {
    if let Some(stove) = coordinator.get_stove(identifier) {
        return Ok(stove);
    }
    let wanted = identifier.to_lowercase();
    coordinator
        .get_stoves()
        .into_iter()
        .find(|s| s.get_name().to_lowercase() == wanted)
        .ok_or_else(|| CliError::StoveNotFound {
            identifier: identifier.into(),
        })
}

/// Command-line value: JSON when it parses (`true`, `22`, `"22"`),
/// otherwise the raw string (`on`).
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()))
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn values_parse_as_json_first() {
        assert_eq!(parse_value("22"), json!(22));
        assert_eq!(parse_value("true"), json!(true));
        assert_eq!(parse_value("\"22\""), json!("22"));
        assert_eq!(parse_value("21.5"), json!(21.5));
    }

    #[test]
    fn bare_words_stay_strings() {
        assert_eq!(parse_value("on"), json!("on"));
        assert_eq!(parse_value("Living room"), json!("Living room"));
    }
}
