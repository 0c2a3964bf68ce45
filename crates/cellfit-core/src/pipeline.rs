use crate::decor::{
    DecorCall, MechanismCatalogue, RecordedDecor, ResolvedDecor, StimulusProtocol,
    apply_decoration, place_protocol,
};
use crate::domain::{CellfitError, CellfitResult};
use crate::genome::{DecodedFit, decode_fit, load_fit_parameters};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub fit_path: PathBuf,
    pub catalogue_path: Option<PathBuf>,
    /// Region labels the morphology provides; `None` accepts any label.
    pub labels: Option<Vec<String>>,
    pub stimulus: Option<StimulusProtocol>,
    pub report_path: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fit_path: PathBuf::from("fit_parameters.json"),
            catalogue_path: None,
            labels: None,
            stimulus: None,
            report_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub fit_path: String,
    pub decoded: DecodedFit,
    pub calls: Vec<DecorCall>,
    pub resolved: ResolvedDecor,
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to create report directory '{}': {source}", path.display())]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to serialize report '{}': {source}", path.display())]
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to write report '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl From<ReportError> for CellfitError {
    fn from(error: ReportError) -> Self {
        let message = error.to_string();
        match error {
            ReportError::CreateDirectory { .. } | ReportError::Write { .. } => {
                CellfitError::io_system("IO.REPORT_WRITE", message)
            }
            ReportError::Serialize { .. } => CellfitError::internal("SYS.REPORT_SERIALIZE", message),
        }
    }
}

pub fn decode_fit_file(path: &Path) -> CellfitResult<DecodedFit> {
    let fit = load_fit_parameters(path)?;
    let decoded = decode_fit(&fit)?;
    info!(
        path = %path.display(),
        blocks = fit.genome.len(),
        regions = decoded.genome.regions.len(),
        mechanisms = decoded.genome.mechanisms.len(),
        ions = decoded.genome.ions.len(),
        "decoded fit parameters"
    );
    Ok(decoded)
}

/// Decodes the fit file, applies it to a [`RecordedDecor`] and resolves the result.
pub fn run_pipeline(config: &PipelineConfig) -> CellfitResult<PipelineReport> {
    let decoded = decode_fit_file(&config.fit_path)?;

    let mut decor = RecordedDecor::new();
    if let Some(labels) = &config.labels {
        decor = decor.with_labels(labels.iter().cloned());
    }
    if let Some(path) = &config.catalogue_path {
        decor = decor.with_catalogue(MechanismCatalogue::from_path(path)?);
    }

    apply_decoration(&decoded.defaults, &decoded.genome, &mut decor)?;
    if let Some(protocol) = &config.stimulus {
        place_protocol(protocol, &mut decor)?;
    }

    let resolved = decor.resolve();
    let calls = decor.into_calls();
    info!(calls = calls.len(), "decoration complete");

    let report = PipelineReport {
        fit_path: config.fit_path.display().to_string(),
        decoded,
        calls,
        resolved,
    };
    if let Some(path) = &config.report_path {
        write_json_report(path, &report)?;
    }
    Ok(report)
}

pub fn write_json_report<T: Serialize>(path: &Path, report: &T) -> Result<(), ReportError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ReportError::CreateDirectory {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let json = serde_json::to_string_pretty(report).map_err(|source| ReportError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(|source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    })
}

pub fn render_decode_summary(decoded: &DecodedFit) -> String {
    let genome = &decoded.genome;
    let defaults = &decoded.defaults;
    let mut lines = vec![
        format!(
            "Global defaults: T={:.2} K, Vm={} mV, cm={}, Ra={} ohm*cm",
            defaults.temperature_k,
            defaults.init_potential_mv,
            defaults
                .capacitance
                .map_or_else(|| "default".to_string(), |cm| format!("{cm} F/m^2")),
            defaults.axial_resistivity
        ),
        format!("Regions: {}", genome.regions.len()),
        format!(
            "Mechanisms: {} ({} parameters)",
            genome.mechanisms.len(),
            genome.mechanisms.parameter_count()
        ),
        format!("Reversal potentials: {}", genome.ions.len()),
    ];

    for entry in genome.regions.iter() {
        let mechanisms: Vec<&str> = genome
            .mechanisms
            .iter()
            .filter(|mechanism| mechanism.region == entry.region)
            .map(|mechanism| mechanism.mechanism.as_str())
            .collect();
        lines.push(format!(
            "  {}: {}",
            entry.region,
            if mechanisms.is_empty() {
                "passive only".to_string()
            } else {
                mechanisms.join(", ")
            }
        ));
    }

    lines.join("\n")
}

pub fn render_human_summary(report: &PipelineReport) -> String {
    let paint_count = report
        .calls
        .iter()
        .filter(|call| matches!(call, DecorCall::Paint { .. }))
        .count();
    let place_count = report
        .calls
        .iter()
        .filter(|call| matches!(call, DecorCall::Place { .. }))
        .count();

    let mut lines = vec![
        format!("Fit parameters: {}", report.fit_path),
        render_decode_summary(&report.decoded),
        format!(
            "Decoration calls: {} ({} paint, {} place)",
            report.calls.len(),
            paint_count,
            place_count
        ),
    ];
    for region in &report.resolved.regions {
        lines.push(format!(
            "  {}: {} ions, {} densities",
            region.selector,
            region.reversal_potentials.len(),
            region.densities.len()
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::{PipelineConfig, render_human_summary, run_pipeline, write_json_report};
    use crate::decor::StimulusProtocol;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const FIT: &str = r#"{
        "genome": [
            {"section": "soma", "name": "cm", "value": "1.0", "mechanism": ""},
            {"section": "soma", "name": "gbar_NaTs", "value": "0.9", "mechanism": "NaTs"},
            {"section": "axon", "name": "gbar_NaTs", "value": "2.1", "mechanism": "NaTs"}
        ],
        "conditions": [{
            "celsius": "34",
            "v_init": "-90",
            "erev": [{"section": "soma", "ena": "53.0", "ek": "-107.0"}]
        }],
        "passive": [{"ra": "100.0"}]
    }"#;

    fn write_file(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("parent dir should be created");
        }
        fs::write(path, content).expect("file should be written");
    }

    #[test]
    fn pipeline_records_calls_and_writes_report() {
        let temp = TempDir::new().expect("tempdir should be created");
        let fit_path = temp.path().join("fit_parameters.json");
        let report_path = temp.path().join("out/nested/report.json");
        write_file(&fit_path, FIT);

        let config = PipelineConfig {
            fit_path,
            stimulus: Some(StimulusProtocol::default()),
            report_path: Some(report_path.clone()),
            ..PipelineConfig::default()
        };
        let report = run_pipeline(&config).expect("pipeline should succeed");

        // global, one passive region, two ions, two densities, two placements
        assert_eq!(report.calls.len(), 8);
        assert_eq!(report.resolved.regions.len(), 2);

        let summary = render_human_summary(&report);
        assert!(summary.contains("Decoration calls: 8 (5 paint, 2 place)"));
        assert!(summary.contains("Mechanisms: 2 (2 parameters)"));

        let written: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(&report_path).expect("report should be readable"),
        )
        .expect("report should parse");
        assert_eq!(written["calls"].as_array().map(Vec::len), Some(8));
        assert_eq!(written["decoded"]["defaults"]["axial_resistivity"], 100.0);
    }

    #[test]
    fn missing_fit_file_is_io_error() {
        let temp = TempDir::new().expect("tempdir should be created");
        let config = PipelineConfig {
            fit_path: temp.path().join("absent.json"),
            ..PipelineConfig::default()
        };
        let error = run_pipeline(&config).expect_err("missing file should fail");
        assert_eq!(error.placeholder(), "IO.FIT_READ");
        assert_eq!(error.exit_code(), 3);
    }

    #[test]
    fn label_restriction_surfaces_decoration_error() {
        let temp = TempDir::new().expect("tempdir should be created");
        let fit_path = temp.path().join("fit_parameters.json");
        write_file(&fit_path, FIT);

        let config = PipelineConfig {
            fit_path,
            labels: Some(vec!["soma".to_string()]),
            ..PipelineConfig::default()
        };
        let error = run_pipeline(&config).expect_err("axon label should be rejected");
        assert_eq!(error.placeholder(), "DECOR.UNKNOWN_REGION");
    }

    #[test]
    fn report_into_existing_file_position_fails_as_io() {
        let temp = TempDir::new().expect("tempdir should be created");
        let blocker = temp.path().join("blocker");
        write_file(&blocker, "not a directory");

        let error = write_json_report(&blocker.join("report.json"), &vec![1, 2, 3])
            .expect_err("parent is a file");
        let error = crate::domain::CellfitError::from(error);
        assert_eq!(error.placeholder(), "IO.REPORT_WRITE");
    }
}
