use super::CliError;
use super::helpers::*;
use cellfit_core::decor::StimulusProtocol;
use cellfit_core::domain::CellfitError;
use cellfit_core::pipeline::{
    PipelineConfig, decode_fit_file, render_decode_summary, render_human_summary, run_pipeline,
    write_json_report,
};
use std::path::PathBuf;
use tracing::debug;

#[derive(clap::Args)]
pub(super) struct DecodeArgs {
    /// Fit parameter JSON file
    #[arg(default_value = "fit_parameters.json")]
    fit: PathBuf,

    /// JSON report output path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Print the decoded fit as JSON instead of the summary
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args)]
pub(super) struct DecorateArgs {
    /// Fit parameter JSON file
    #[arg(default_value = "fit_parameters.json")]
    fit: PathBuf,

    /// Mechanism catalogue JSON mapping mechanism names to parameter names
    #[arg(long)]
    catalogue: Option<PathBuf>,

    /// Comma-separated region labels the morphology provides (default: soma,axon,dend,apic)
    #[arg(long, value_delimiter = ',', conflicts_with = "any_label")]
    labels: Option<Vec<String>>,

    /// Accept every region label
    #[arg(long)]
    any_label: bool,

    /// Place the default current clamp and spike detector after the parameters
    #[arg(long)]
    stimulus: bool,

    /// Place a stimulus protocol read from a JSON file
    #[arg(long, conflicts_with = "stimulus")]
    stimulus_file: Option<PathBuf>,

    /// JSON report output path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Print the full report as JSON instead of the summary
    #[arg(long)]
    json: bool,
}

impl DecorateArgs {
    fn into_config(self) -> Result<PipelineConfig, CliError> {
        let stimulus = match &self.stimulus_file {
            Some(path) => Some(load_stimulus_protocol(path)?),
            None if self.stimulus => Some(StimulusProtocol::default()),
            None => None,
        };

        Ok(PipelineConfig {
            fit_path: self.fit,
            catalogue_path: self.catalogue,
            labels: resolve_labels(self.labels, self.any_label),
            stimulus,
            report_path: self.report,
        })
    }
}

pub(super) fn run_decode_command(args: DecodeArgs) -> Result<i32, CliError> {
    let decoded = decode_fit_file(&args.fit).map_err(CliError::Run)?;

    if args.json {
        println!("{}", render_json(&decoded)?);
    } else {
        println!("Fit parameters: {}", args.fit.display());
        println!("{}", render_decode_summary(&decoded));
    }

    if let Some(path) = &args.report {
        write_json_report(path, &decoded)
            .map_err(|error| CliError::Run(CellfitError::from(error)))?;
        if !args.json {
            println!("JSON report: {}", path.display());
        }
    }
    Ok(0)
}

pub(super) fn run_decorate_command(args: DecorateArgs) -> Result<i32, CliError> {
    let json = args.json;
    let config = args.into_config()?;
    debug!(
        labels = ?config.labels,
        catalogue = ?config.catalogue_path,
        stimulus = config.stimulus.is_some(),
        "resolved decorate configuration"
    );
    let report = run_pipeline(&config).map_err(CliError::Run)?;

    if json {
        println!("{}", render_json(&report)?);
        return Ok(0);
    }

    println!("{}", render_human_summary(&report));
    if let Some(path) = &config.report_path {
        println!("JSON report: {}", path.display());
    }
    Ok(0)
}
