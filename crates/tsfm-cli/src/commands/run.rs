use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::Args;
use tsfm_inference::{
    ForecastingInput, ForecastingParameters, HandlerFunction, HandlerLoader, MetadataInput,
    TimeSeriesFrame,
};

use crate::{print_info, print_success};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Local model directory or `owner/name[@revision]` reference.
    pub model_path: String,

    /// Identifier reported in the output. Defaults to the model path.
    #[arg(long)]
    pub model_id: Option<String>,

    /// Historical data as a column-oriented JSON object.
    #[arg(long)]
    pub data: PathBuf,

    /// Future covariates over the forecast horizon, same layout as `--data`.
    #[arg(long)]
    pub future_data: Option<PathBuf>,

    /// Column roles as a JSON object. Takes precedence over the individual column flags.
    #[arg(long)]
    pub schema: Option<PathBuf>,

    #[arg(long)]
    pub timestamp_column: Option<String>,

    #[arg(long = "id")]
    pub id: Vec<String>,

    #[arg(long = "target")]
    pub target: Vec<String>,

    #[arg(long = "control")]
    pub control: Vec<String>,

    /// Forecasting parameters as a JSON object, passed to the model family unchanged.
    #[arg(long)]
    pub parameters: Option<PathBuf>,

    /// Overrides `prediction_length` from `--parameters`.
    #[arg(long)]
    pub prediction_length: Option<usize>,

    /// Write the response here instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[arg(long)]
    pub pretty: bool,
}

impl RunArgs {
    fn schema(&self) -> anyhow::Result<MetadataInput> {
        if let Some(path) = &self.schema {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("Failed to read schema {}", path.display()))?;
            return serde_json::from_str(&raw)
                .with_context(|| format!("Malformed schema {}", path.display()));
        }

        Ok(MetadataInput {
            timestamp_column: self.timestamp_column.clone(),
            id_columns: self.id.clone(),
            target_columns: self.target.clone(),
            control_columns: self.control.clone(),
            ..Default::default()
        })
    }

    fn parameters(&self) -> anyhow::Result<ForecastingParameters> {
        let mut parameters: ForecastingParameters = match &self.parameters {
            Some(path) => {
                let raw = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read parameters {}", path.display()))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("Malformed parameters {}", path.display()))?
            }
            None => ForecastingParameters::default(),
        };
        if self.prediction_length.is_some() {
            parameters.prediction_length = self.prediction_length;
        }
        Ok(parameters)
    }
}

fn read_frame(path: &Path, timestamp_column: Option<&str>) -> anyhow::Result<TimeSeriesFrame> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("Malformed JSON in {}", path.display()))?;
    let datetime_columns: Vec<&str> = timestamp_column.into_iter().collect();

    TimeSeriesFrame::from_json_columns(&value, &datetime_columns)
        .with_context(|| format!("Invalid frame in {}", path.display()))
}

pub fn handle_command(
    args: RunArgs,
    loader: &HandlerLoader<ForecastingInput>,
) -> anyhow::Result<()> {
    let schema = args.schema()?;
    let timestamp_column = schema.timestamp_column.as_deref();
    let data = read_frame(&args.data, timestamp_column)?;
    let future_data = args
        .future_data
        .as_deref()
        .map(|path| read_frame(path, timestamp_column))
        .transpose()?;
    let parameters = args.parameters()?;

    let model_id = args.model_id.as_deref().unwrap_or(&args.model_path);
    let mut handler = loader.load(model_id, &args.model_path, HandlerFunction::Inference)?;
    handler.prepare()?;

    print_info!(
        "Running '{}' model '{}' on {} rows",
        handler.family(),
        handler.model_id(),
        data.num_rows()
    );
    let output = handler.run(data, future_data, Some(schema), Some(parameters))?;

    let body = if args.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };

    match &args.output {
        Some(path) => {
            fs::write(path, body)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            print_success!(
                "Wrote {} output data points to {}",
                output.counts.output_data_points,
                path.display()
            );
        }
        None => println!("{body}"),
    }
    Ok(())
}
