use clap::Args;
use tsfm_inference::{ForecastingInput, HandlerFunction, HandlerLoader, resolve_family};

use crate::print_warn;

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Local model directory or `owner/name[@revision]` reference.
    pub model_path: String,
}

pub fn handle_command(
    args: InspectArgs,
    loader: &HandlerLoader<ForecastingInput>,
) -> anyhow::Result<()> {
    let location = loader.locate(&args.model_path);
    let (model_dir, config) = loader.read_config(&location)?;
    let family = resolve_family(&config)?;

    println!("location:     {location}");
    println!("model dir:    {}", model_dir.display());
    println!("family:       {family}");

    let capabilities = [HandlerFunction::Inference]
        .into_iter()
        .filter(|function| config.supports(*function))
        .map(|function| {
            let status = if loader.registry().contains(&family, function) {
                "registered"
            } else {
                "no handler"
            };
            format!("{function} ({status})")
        })
        .collect::<Vec<_>>();
    println!("capabilities: {}", capabilities.join(", "));

    if let Some(length) = config.maximum_prediction_length {
        println!("max horizon:  {length}");
    }
    if let Some(length) = config.minimum_context_length {
        println!("min context:  {length}");
    }
    println!("multivariate: {}", config.multivariate_support);

    if !loader.registry().contains(&family, HandlerFunction::Inference) {
        print_warn!("No inference handler is registered for model family '{family}'");
    }
    Ok(())
}
