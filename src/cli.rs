use anyhow::Result;
use clap::{Parser, ValueEnum};
use log::{debug, info};
use std::path::PathBuf;

/// REST Model Extractor - Generate a REST endpoint model from application class metadata
#[derive(Parser, Debug)]
#[command(name = "restmodel-from-metadata")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to a metadata directory or a single metadata JSON file
    #[arg(value_name = "METADATA_PATH")]
    pub metadata_path: PathBuf,

    /// Seed class name: a REST controller or an application entry point (repeatable)
    #[arg(short = 's', long = "seed", value_name = "CLASS", required = true)]
    pub seeds: Vec<String>,

    /// Boot application entry-point seeds and scan their component registries
    #[arg(long = "scan-applications")]
    pub scan_applications: bool,

    /// Exclude discovered classes whose name contains this substring (repeatable)
    #[arg(long = "exclude", value_name = "SUBSTRING")]
    pub exclude: Vec<String>,

    /// Output format (yaml or json)
    #[arg(short = 'f', long = "format", value_enum, default_value = "yaml")]
    pub output_format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// YAML format
    Yaml,
    /// JSON format
    Json,
}

/// Parse command line arguments
pub fn parse_args() -> Result<CliArgs> {
    let args = CliArgs::parse();
    parse_args_from_parsed(args)
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.metadata_path.exists() {
        anyhow::bail!(
            "Metadata path does not exist: {}",
            args.metadata_path.display()
        );
    }

    info!("Metadata path: {}", args.metadata_path.display());
    info!("Seed classes: {:?}", args.seeds);
    info!("Application scanning: {}", args.scan_applications);
    if !args.exclude.is_empty() {
        info!("Exclusion patterns: {:?}", args.exclude);
    }
    info!("Output format: {:?}", args.output_format);
    if let Some(ref output) = args.output_path {
        info!("Output file: {}", output.display());
    } else {
        info!("Output: stdout");
    }

    Ok(args)
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    use crate::discovery::RegistryRuntime;
    use crate::extractor::{ExtractorSettings, ModelExtractor};
    use crate::loader::RegistryLoader;
    use crate::serializer::{serialize_json, serialize_yaml, write_to_file, GenerationOutput};

    info!("Starting endpoint model extraction...");

    // Step 1: Load the metadata registry
    info!("Loading metadata registry...");
    let loader = RegistryLoader::new(args.metadata_path.clone());
    let registry = loader.load()?;

    if registry.is_empty() {
        anyhow::bail!("No class metadata found under the metadata path");
    }
    info!("Loaded {} classes", registry.len());

    // Step 2: Extract the endpoint model from every seed
    let settings = ExtractorSettings {
        scan_applications: args.scan_applications,
        exclude: exclusion_predicate(&args.exclude),
        ..Default::default()
    };
    let runtime = RegistryRuntime::new(&registry);
    let mut extractor = ModelExtractor::new(&registry, settings);

    for seed in &args.seeds {
        debug!("Processing seed class: {}", seed);
        extractor.process_seed(&runtime, seed)?;
    }

    let (model, found_types) = extractor.into_output();
    info!("Extracted {} endpoints", model.len());
    if model.is_empty() {
        log::warn!("No endpoints found for the given seeds");
    }

    // Step 3: Serialize to the requested format
    info!("Serializing to {:?} format...", args.output_format);
    let output = GenerationOutput::new(model, &found_types);
    let content = match args.output_format {
        OutputFormat::Yaml => serialize_yaml(&output)?,
        OutputFormat::Json => serialize_json(&output)?,
    };

    // Step 4: Output to file or stdout
    if let Some(output_path) = &args.output_path {
        info!("Writing output to: {}", output_path.display());
        write_to_file(&content, output_path)?;
        info!(
            "Successfully wrote endpoint model to {}",
            output_path.display()
        );
    } else {
        println!("{}", content);
    }

    info!("Extraction complete!");
    info!("Summary:");
    info!("  - Classes loaded: {}", registry.len());
    info!("  - Seeds processed: {}", args.seeds.len());
    info!("  - Endpoints extracted: {}", output.model.len());
    info!("  - Types found: {}", output.found_types.len());

    Ok(())
}

/// A class is excluded when its name contains any of the given substrings.
fn exclusion_predicate(patterns: &[String]) -> Option<Box<dyn Fn(&str) -> bool>> {
    if patterns.is_empty() {
        return None;
    }
    let patterns = patterns.to_vec();
    Some(Box::new(move |name: &str| {
        patterns.iter().any(|p| name.contains(p.as_str()))
    }))
}
