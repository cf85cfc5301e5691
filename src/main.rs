//! CLI entry point for headless-blog

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use headless_blog::source::{ContentSource, MemorySource};
use headless_blog::Blog;

#[derive(Parser)]
#[command(name = "headless-blog")]
#[command(author = "Yukang Chen")]
#[command(version)]
#[command(about = "A static blog generator for posts kept in a headless CMS", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    /// CMS access token, overrides `access_token` from _config.yml
    #[arg(long, global = true, env = "PRISMIC_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// Read posts from a JSON file of pages instead of the CMS
    #[arg(long, global = true)]
    fixture: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate static files
    #[command(alias = "g")]
    Generate,

    /// Start a local server
    #[command(alias = "s")]
    Server {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,

        /// Open browser automatically
        #[arg(short, long)]
        open: bool,

        /// Serve the existing public folder without generating first
        #[arg(long)]
        no_generate: bool,
    },

    /// List every post of the content source
    List,

    /// Clean the public folder
    Clean,

    /// Display version information
    Version,
}

impl Cli {
    /// Content source for this run; created once and shared by every command
    fn source(&self, blog: &Blog) -> Result<Arc<dyn ContentSource>> {
        match &self.fixture {
            Some(path) => Ok(Arc::new(MemorySource::load(path)?)),
            None => Ok(blog.connect()?),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "headless_blog=debug,info"
    } else {
        "headless_blog=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match &cli.cwd {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("Cannot determine current directory")?,
    };

    let load = || -> Result<Blog> {
        let mut blog = Blog::new(&base_dir)?;
        if let Some(token) = &cli.access_token {
            blog.config.access_token = Some(token.clone());
        }
        Ok(blog)
    };

    match &cli.command {
        Commands::Generate => {
            let blog = load()?;
            tracing::info!("Generating static files...");
            blog.generate(cli.source(&blog)?).await?;
            println!("Generated successfully!");
        }

        Commands::Server {
            port,
            ip,
            open,
            no_generate,
        } => {
            let blog = load()?;
            let source = cli.source(&blog)?;
            tracing::info!("Starting server at http://{}:{}", ip, port);
            headless_blog::server::start(&blog, source, ip, *port, !no_generate, *open).await?;
        }

        Commands::List => {
            let blog = load()?;
            headless_blog::commands::list::run(&blog, cli.source(&blog)?).await?;
        }

        Commands::Clean => {
            let blog = load()?;
            tracing::info!("Cleaning public folder...");
            blog.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::Version => {
            println!("headless-blog version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
