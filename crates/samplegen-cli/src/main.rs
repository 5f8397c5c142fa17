//! samplegen CLI
//!
//! Generates fake, schema-valid resources from a model registry:
//! - `generate`: run a config (`types` or `users`) and write a JSON array
//! - `products`: list the financial products users would apply for
//! - `check-models`: normalize the registry and report problems

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use samplegen_core::{FakerRegistry, RoundRobinPool, Samples, SamplesConfig, SynthesisOptions};
use samplegen_models::{ids, Directive, ModelRegistry};

mod config;

use config::{Config, Plan};

#[derive(Parser)]
#[command(name = "samplegen")]
#[command(
    author,
    version,
    about = "samplegen: schema-driven fake resources and application workflows"
)]
struct Cli {
    /// Debug-level logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate resources as described by a config file.
    Generate(GenerateArgs),

    /// List eligible financial products, selfie-requiring first.
    Products {
        /// Config file (only `models` and `seed` are used)
        config: PathBuf,
    },

    /// Load, merge and normalize the registry; report counts and unknown
    /// faker directives.
    CheckModels {
        /// Config file (only `models` and `extension` are used)
        config: PathBuf,
    },
}

#[derive(Args)]
struct GenerateArgs {
    /// Config file
    config: PathBuf,
    /// Seed for the random source (overrides `seed`)
    #[arg(long)]
    seed: Option<u64>,
    /// Output file (overrides `output`)
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Number of simulated users (overrides `users` and `types`)
    #[arg(long)]
    users: Option<usize>,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Generate(args) => cmd_generate(args),
        Commands::Products { config } => cmd_products(&config),
        Commands::CheckModels { config } => cmd_check_models(&config),
    }
}

fn time_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}

fn build_samples(config: &Config, registry: &ModelRegistry) -> Result<Samples> {
    let seed = config.seed.unwrap_or_else(time_seed);
    tracing::info!(seed, "random source seeded");

    let mut synthesis = SynthesisOptions::default();
    if let Some(max) = config.max_array_items {
        synthesis.max_array_items = max;
    }
    if let Some(now) = config.now {
        synthesis.now = now;
    }

    let mut fakers = FakerRegistry::builtin();
    if let Some(extension) = config.extension()? {
        fakers
            .extend_from_value(&extension)
            .map_err(|e| anyhow!("invalid faker extension: {e}"))?;
    }

    let samples = Samples::new(
        registry,
        SamplesConfig {
            seed,
            organization: config.organization.clone(),
            products: config.products.clone(),
            form_requests: config.form_requests,
            synthesis,
        },
    )?
    .with_fakers(fakers);

    Ok(match &config.faces {
        Some(dir) => {
            let pool = RoundRobinPool::from_dir(dir)
                .with_context(|| format!("failed to load faces from {}", dir.display()))?;
            samples.with_assets(Arc::new(pool))
        }
        None => samples,
    })
}

fn cmd_generate(args: GenerateArgs) -> Result<()> {
    let mut config = Config::load(&args.config)?;
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if args.output.is_some() {
        config.output = args.output;
    }
    if args.users.is_some() {
        config.users = args.users;
        config.types = None;
    }

    let output = config.output()?.to_path_buf();
    let plan = config.plan()?;
    let registry = config.registry()?;
    let mut samples = build_samples(&config, &registry)?;

    let resources = match plan {
        Plan::Users(count) => samples.users(count)?,
        Plan::Types(counts) => samples.by_type(&counts)?,
    };

    // Nothing is written unless the whole run succeeded.
    let json = serde_json::to_string_pretty(&resources)?;
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(&output, json).with_context(|| format!("failed to write {}", output.display()))?;

    eprintln!(
        "{} {} resources to {}",
        "wrote".green().bold(),
        resources.len(),
        output.display().to_string().bold()
    );
    Ok(())
}

fn cmd_products(config_path: &Path) -> Result<()> {
    let config = Config::load(config_path)?;
    let registry = config.registry()?;
    let samples = Samples::new(
        &registry,
        SamplesConfig {
            seed: config.seed.unwrap_or_else(time_seed),
            products: config.products.clone(),
            ..SamplesConfig::default()
        },
    )?;

    if samples.products().is_empty() {
        println!("{}", "no eligible products".yellow());
        return Ok(());
    }
    let models = samples.models();
    for id in samples.products() {
        let forms = models
            .get(id)
            .map(|m| m.all_forms().collect::<Vec<_>>().join(", "))
            .unwrap_or_default();
        println!("{} {}", id.bold(), format!("[{forms}]").dimmed());
    }
    Ok(())
}

fn cmd_check_models(config_path: &Path) -> Result<()> {
    let config = Config::load(config_path)?;
    let registry = config.registry()?;
    let normalized = registry.normalize().context("model normalization failed")?;

    let mut fakers = FakerRegistry::builtin();
    if let Some(extension) = config.extension()? {
        fakers
            .extend_from_value(&extension)
            .map_err(|e| anyhow!("invalid faker extension: {e}"))?;
    }

    let mut unknown = BTreeSet::new();
    for model in normalized.iter() {
        for (name, property) in &model.properties {
            match &property.faker {
                Some(directive @ (Directive::Named(_) | Directive::Call { .. }))
                    if !fakers.contains(directive.name()) =>
                {
                    unknown.insert(format!("{}.{name}: {}", model.id, directive.name()));
                }
                _ => {}
            }
        }
    }

    let inlined = normalized.iter().filter(|m| m.inlined).count();
    let enums = normalized.iter().filter(|m| m.is_enum()).count();
    let products = normalized
        .iter()
        .filter(|m| m.is_subclass_of(ids::FINANCIAL_PRODUCT))
        .count();
    println!("{:>10} {}", normalized.len(), "models".bold());
    println!("{inlined:>10} inlined");
    println!("{enums:>10} enums");
    println!("{products:>10} financial products");

    if !unknown.is_empty() {
        for entry in &unknown {
            eprintln!("{} unknown faker directive {entry}", "error:".red().bold());
        }
        bail!("{} properties use unknown faker directives", unknown.len());
    }
    println!("{}", "ok".green().bold());
    Ok(())
}
