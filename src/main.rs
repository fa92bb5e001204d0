use clap::{Parser, Subcommand};
use image_sanitizer::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sanitize")]
#[command(about = "Recursive image folder sanitizer: drops corrupt files, normalizes lying extensions to JPEG")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Sanitize an image tree in place
    Run {
        /// Root directory to sanitize (overrides config)
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Path to a TOML or JSON config file
        #[arg(short, long)]
        config: Option<String>,

        /// JPEG quality for re-encoded files (1-100)
        #[arg(short, long)]
        quality: Option<u8>,

        /// Output file for the JSON run report
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Classify every file without touching the tree
    Check {
        /// Root directory to check (overrides config)
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Path to a TOML or JSON config file
        #[arg(short, long)]
        config: Option<String>,

        /// Output file for the JSON check report
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { root, config, quality, output } => {
            handle_run(root, config, quality, output, cli.verbose, false)?;
        }
        Commands::Check { root, config, output } => {
            handle_run(root, config, None, output, cli.verbose, true)?;
        }
    }

    Ok(())
}

fn handle_run(
    root: Option<PathBuf>,
    config_path: Option<String>,
    quality: Option<u8>,
    output: Option<PathBuf>,
    verbose: u8,
    dry_run: bool,
) -> anyhow::Result<()> {
    let mut config = load_config_or_default(config_path.as_deref());
    if let Some(root) = root {
        config.root = root;
    }
    if let Some(quality) = quality {
        config.jpeg_quality = quality;
    }
    if verbose > 0 {
        config.logging.global_level = match verbose {
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
        .to_string();
    }

    if let Err(errors) = config.validate() {
        return Err(anyhow::anyhow!("Invalid configuration: {}", errors.join("; ")));
    }

    let _guard = init_logging(&config.logging)?;

    if dry_run {
        println!("Checking {}...", config.root.display());
    } else {
        println!("Sanitizing {}...", config.root.display());
    }

    let report = if dry_run {
        check_tree(&config.root, &config)?
    } else {
        sanitize_tree(&config.root, &config)?
    };

    print_summary(&report, dry_run);

    if let Some(output_path) = output {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(output_path, json)?;
        println!("Report saved to file.");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    // No unit tests in main.rs - all tests are in tests/ directory
}
