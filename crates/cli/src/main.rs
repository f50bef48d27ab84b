mod commands;

use clap::{CommandFactory, Parser};
use clap_complete::{Shell, generate};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use commands::Context;

#[derive(Parser)]
#[command(name = "muv-seo")]
#[command(version, about = "SEO artifact generator for the MUV Fitness website", long_about = None)]
struct Cli {
    /// Path to muv-seo.toml
    #[arg(short, long, global = true, default_value = "muv-seo.toml")]
    config: PathBuf,

    /// Pin "now" (RFC 3339 or YYYY-MM-DD) for reproducible output
    #[arg(long, global = true)]
    now: Option<String>,

    /// Log library progress (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Write a starter muv-seo.toml and routes.json
    Init {
        /// Directory to initialize
        path: PathBuf,
    },

    /// Generate sitemaps and robots.txt
    Generate {
        /// Output directory (defaults to paths.output)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write one HTML file per route with route-specific <head> tags
    Prerender {
        /// Built index.html (defaults to paths.template)
        #[arg(short, long)]
        template: Option<PathBuf>,

        /// Output directory (defaults to paths.output)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check generated files on disk
    Verify {
        /// Directory to verify (defaults to paths.output)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// HEAD the deployed sitemaps and robots.txt
    Health {
        /// Site to check (defaults to site.base_url)
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Notify search engines about the sitemaps and recent posts
    Submit {
        /// Extra URLs to send to IndexNow
        #[arg(long = "url")]
        urls: Vec<String>,

        /// Resubmit even if the same job ran in the last 24 hours
        #[arg(long)]
        force: bool,
    },

    /// Generate, prerender, verify and optionally submit in one go
    Run {
        /// Submit to search engines after a successful verify
        #[arg(long)]
        submit: bool,

        /// Ignore the submission ledger
        #[arg(long)]
        force: bool,
    },

    /// Serve live sitemaps and robots.txt over HTTP
    Serve {
        /// Port to serve on
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "muv_seo=info,muv_seo_generator=info,muv_seo_validator=info,muv_seo_submitter=info,tower_http=info"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let load = || Context::load(&cli.config, cli.now.as_deref());

    match cli.command {
        Command::Init { path } => commands::init::run(path).await,
        Command::Generate { output } => commands::generate::run(&load()?, output).await,
        Command::Prerender { template, output } => {
            commands::prerender::run(&load()?, template, output).await
        }
        Command::Verify { output } => commands::verify::run(&load()?, output).await,
        Command::Health { base_url } => commands::health::run(&load()?, base_url).await,
        Command::Submit { urls, force } => commands::submit::run(&load()?, urls, force).await,
        Command::Run { submit, force } => commands::pipeline::run(&load()?, submit, force).await,
        Command::Serve { port } => commands::serve::run(load()?, port).await,
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "muv-seo", &mut io::stdout());
            Ok(())
        }
    }
}
