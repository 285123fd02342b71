//! CLI for retext.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use retext::prelude::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "retext")]
#[command(author, version, about = "Batch text rewriting over a project tree", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print the report as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a built-in job
    Run {
        /// Job name (see `retext presets`)
        preset: String,

        /// Project root
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Run a job loaded from a JSON or YAML file
    Apply {
        /// Job definition (.json, .yaml or .yml)
        #[arg(short, long)]
        config: PathBuf,

        /// Project root
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// List built-in jobs
    Presets,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "retext=debug" } else { "retext=info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run { preset, path } => {
            let Some(job) = presets::find(&preset) else {
                bail!("unknown preset '{preset}' (see `retext presets`)");
            };
            cmd_run(job, path, cli.json)
        }
        Commands::Apply { config, path } => {
            let job = JobConfig::from_path(&config)
                .with_context(|| format!("Failed to load {}", config.display()))?;
            cmd_run(job, path, cli.json)
        }
        Commands::Presets => cmd_presets(),
    }
}

fn cmd_run(job: JobConfig, path: PathBuf, json: bool) -> Result<()> {
    let rewrite = job
        .to_rewrite(&path)
        .with_context(|| format!("Invalid rules in job '{}'", job.name))?;
    let report = rewrite
        .run()
        .with_context(|| format!("Job '{}' could not start", job.name))?;

    if json {
        println!("{}", report.to_json()?);
    } else {
        println!("{} ({})\n", job.name, job.description);
        println!("{report}");
    }

    Ok(())
}

fn cmd_presets() -> Result<()> {
    println!("Built-in jobs:");
    for job in presets::all() {
        println!("\n  {}: {}", job.name, job.description);
        for scope in &job.scopes {
            let filter = match (&scope.glob, scope.extensions.is_empty()) {
                (Some(glob), _) => glob.clone(),
                (None, false) => scope.extensions.join(", "),
                (None, true) => "*".to_string(),
            };
            println!(
                "    scope {} [{}]{}",
                scope.root.display(),
                filter,
                if scope.recursive { " recursive" } else { "" }
            );
        }
        for rule in job.rule_set()?.rules() {
            let kind = if rule.is_literal() { "literal" } else { "pattern" };
            println!(
                "    - {kind} {} -> {}",
                rule.pattern_str(),
                rule.replacement_str()
            );
        }
    }
    Ok(())
}
