use anyhow::Context;
use clap::{Parser, Subcommand};
use most_config::{diagnostics, render};
use std::path::{Path, PathBuf};

pub type Result<T> = anyhow::Result<T>;

#[derive(Parser)]
#[command(name = "most-config")]
#[command(about = "MOST network configuration compiler", long_about = None)]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a configuration document and dump the graph as JSON.
    Compile {
        #[arg(long)]
        config: PathBuf,

        #[arg(short = 'o', long)]
        out: Option<PathBuf>,
    },
    /// Compile a configuration document and print it back as XML.
    Print {
        #[arg(long)]
        config: PathBuf,

        #[arg(short = 'o', long)]
        out: Option<PathBuf>,
    },
    /// Compile a document holding a single <Script>.
    Script {
        #[arg(long)]
        script: PathBuf,

        #[arg(short = 'o', long)]
        out: Option<PathBuf>,
    },
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn emit(text: &str, out: Option<&Path>) -> Result<()> {
    match out {
        Some(path) => {
            std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        None => println!("{}", text),
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    diagnostics::init_logging(cli.verbose);

    match cli.cmd {
        Commands::Compile { config, out } => {
            let compiled = most_config::compile(&read(&config)?)
                .with_context(|| format!("compiling {}", config.display()))?;
            emit(&render::render_json(&compiled)?, out.as_deref())?;
        }
        Commands::Print { config, out } => {
            let compiled = most_config::compile(&read(&config)?)
                .with_context(|| format!("compiling {}", config.display()))?;
            emit(&render::render_xml(&compiled)?, out.as_deref())?;
        }
        Commands::Script { script, out } => {
            let compiled = most_config::compile_script(&read(&script)?)
                .with_context(|| format!("compiling {}", script.display()))?;
            emit(&render::render_script_json(&compiled)?, out.as_deref())?;
        }
    }

    Ok(())
}
