use super::CliError;
use anyhow::Context;
use cellfit_core::decor::{SWC_REGION_LABELS, StimulusProtocol};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const DEFAULT_LOG_FILTER: &str = "warn";

/// Logs go to stderr so stdout stays parseable with `--json`.
pub(super) fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .try_init();
}

pub(super) fn resolve_labels(labels: Option<Vec<String>>, any_label: bool) -> Option<Vec<String>> {
    if any_label {
        return None;
    }
    let labels = labels.unwrap_or_else(|| {
        SWC_REGION_LABELS
            .iter()
            .map(|label| label.to_string())
            .collect()
    });
    Some(
        labels
            .into_iter()
            .map(|label| label.trim().to_string())
            .filter(|label| !label.is_empty())
            .collect(),
    )
}

pub(super) fn load_stimulus_protocol(path: &Path) -> Result<StimulusProtocol, CliError> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read stimulus protocol '{}'", path.display()))?;
    let protocol = serde_json::from_str(&source)
        .with_context(|| format!("failed to parse stimulus protocol '{}'", path.display()))?;
    Ok(protocol)
}

pub(super) fn render_json<T: Serialize>(value: &T) -> Result<String, CliError> {
    let json = serde_json::to_string_pretty(value).context("failed to render JSON output")?;
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::{load_stimulus_protocol, resolve_labels};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn labels_default_to_swc_regions() {
        assert_eq!(
            resolve_labels(None, false),
            Some(vec![
                "soma".to_string(),
                "axon".to_string(),
                "dend".to_string(),
                "apic".to_string(),
            ])
        );
        assert_eq!(resolve_labels(None, true), None);
        assert_eq!(
            resolve_labels(Some(vec![" soma".to_string(), String::new()]), false),
            Some(vec!["soma".to_string()])
        );
    }

    #[test]
    fn stimulus_protocol_fills_missing_fields_from_defaults() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("stimulus.json");
        fs::write(&path, r#"{"clamp_amplitude_na": 0.35}"#).expect("file should be written");

        let protocol = load_stimulus_protocol(&path).expect("protocol should load");
        assert_eq!(protocol.clamp_amplitude_na, 0.35);
        assert_eq!(protocol.clamp_delay_ms, 100.0);
        assert_eq!(protocol.detector_label, "det");
    }

    #[test]
    fn unreadable_stimulus_protocol_is_internal_cli_error() {
        let temp = TempDir::new().expect("tempdir should be created");
        let error = load_stimulus_protocol(&temp.path().join("absent.json"))
            .expect_err("missing file should fail");
        let message = error.to_string();
        assert!(message.contains("failed to read stimulus protocol"));
    }
}
