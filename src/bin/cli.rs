use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use torkguard::badge::Badge;
use torkguard::error::GuardError;
use torkguard::net::NetworkPolicyConfig;
use torkguard::output::{self, OutputFormat};
use torkguard::rules;
use torkguard::scanner::Verdict;

#[derive(Parser)]
#[command(
    name = "torkguard",
    about = "Skill-sandboxing guardian for the Tork agent platform",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a skill directory and report its risk score
    Scan {
        /// Path to the skill directory
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Skill name (defaults to the directory name)
        #[arg(long, short = 'n')]
        name: Option<String>,

        /// Output format (console, json, badge, badge-json)
        #[arg(long, short = 'f', default_value = "console")]
        format: String,

        /// Write output to file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Generate the trust badge for a skill directory
    Badge {
        /// Path to the skill directory
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Skill name (defaults to the directory name)
        #[arg(long, short = 'n')]
        name: Option<String>,

        /// Badge format (markdown, json)
        #[arg(long, short = 'f', default_value = "markdown")]
        format: String,
    },

    /// List all detection rules
    ListRules {
        /// Output format (table, json)
        #[arg(long, short = 'f', default_value = "table")]
        format: String,
    },

    /// Generate a starter network policy config file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Scan {
            path,
            name,
            format,
            output,
        } => cmd_scan(path, name, format, output),
        Commands::Badge { path, name, format } => cmd_badge(path, name, format),
        Commands::ListRules { format } => cmd_list_rules(format),
        Commands::Init { force } => cmd_init(force),
    };

    match result {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(e.exit_code());
        }
    }
}

fn cmd_scan(
    path: PathBuf,
    name: Option<String>,
    format_str: String,
    output_path: Option<PathBuf>,
) -> Result<i32, GuardError> {
    let format = OutputFormat::from_str_lenient(&format_str)
        .ok_or_else(|| GuardError::UnknownFormat(format_str.clone()))?;

    let report = torkguard::scan_directory(&path, name.as_deref());
    let rendered = output::render(&report, format)?;

    match output_path {
        Some(out) => std::fs::write(&out, &rendered)?,
        None => print!("{}", rendered),
    }

    // Exit code: 0 unless the skill is flagged.
    Ok(if report.verdict == Verdict::Flagged { 1 } else { 0 })
}

fn cmd_badge(path: PathBuf, name: Option<String>, format_str: String) -> Result<i32, GuardError> {
    let report = torkguard::scan_directory(&path, name.as_deref());
    let badge = Badge::from_report(&report);

    match format_str.as_str() {
        "json" => println!("{}", badge.to_json()?),
        "markdown" | "md" => println!("{}", badge.to_markdown()),
        other => return Err(GuardError::UnknownFormat(other.to_string())),
    }

    Ok(0)
}

fn cmd_list_rules(format_str: String) -> Result<i32, GuardError> {
    let rules = rules::list_rules();

    match format_str.as_str() {
        "json" => {
            let json = serde_json::to_string_pretty(&rules)?;
            println!("{}", json);
        }
        _ => {
            println!("{:<10} {:<32} {:<10} DESCRIPTION", "ID", "NAME", "SEVERITY");
            println!("{}", "-".repeat(96));
            for rule in &rules {
                println!(
                    "{:<10} {:<32} {:<10} {}",
                    rule.id,
                    rule.name,
                    rule.severity.to_string(),
                    rule.description
                );
            }
        }
    }

    Ok(0)
}

fn cmd_init(force: bool) -> Result<i32, GuardError> {
    let path = PathBuf::from(".torkguard.toml");

    if path.exists() && !force {
        eprintln!(".torkguard.toml already exists. Use --force to overwrite.");
        return Ok(1);
    }

    std::fs::write(&path, NetworkPolicyConfig::starter_toml())?;
    println!("Created .torkguard.toml");

    Ok(0)
}
