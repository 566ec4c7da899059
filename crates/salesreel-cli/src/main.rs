//! SalesReel CLI — entry point.
//!
//! # Commands
//!
//! - `salesreel onboard` — write a default config
//! - `salesreel status` — config, credential pools, gate limits
//! - `salesreel keys [--provider P] [--count N]` — preview credential rotation
//! - `salesreel text -s SYSTEM -u USER [--json]` — one script-generation call
//! - `salesreel images --prompts FILE` — render a scene batch with fallback
//! - `salesreel speak --voice ID --text T --out FILE` — text-to-speech

mod helpers;
mod images_cmd;
mod keys_cmd;
mod onboard;
mod speak_cmd;
mod status;
mod text_cmd;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// SalesReel — resilient AI dispatch for sales-video generation
#[derive(Parser)]
#[command(name = "salesreel", version, about, long_about = None)]
struct Cli {
    /// Config file (default: ~/.salesreel/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true, default_value_t = false)]
    logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration
    Onboard,

    /// Show configuration and credential status
    Status,

    /// Preview which credential each upcoming dispatch starts with
    Keys {
        /// Only this provider (google, openai, elevenlabs, labs)
        #[arg(short, long)]
        provider: Option<String>,

        /// Number of rotations to show
        #[arg(short = 'n', long, default_value_t = 3)]
        count: usize,
    },

    /// Generate text with Gemini
    Text {
        /// System instruction
        #[arg(short, long, default_value = "")]
        system: String,

        /// User prompt
        #[arg(short, long)]
        user: String,

        /// Extract and pretty-print the JSON object in the reply
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Render one image per prompt line, with provider fallback
    Images {
        /// File with one scene prompt per line
        #[arg(short, long)]
        prompts: PathBuf,

        /// Output directory (default: ~/.salesreel/output/<timestamp>)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Reference image of the model/person
        #[arg(long)]
        model_image: Option<PathBuf>,

        /// Reference image of the product
        #[arg(long)]
        product_image: Option<PathBuf>,
    },

    /// Synthesize speech with ElevenLabs
    Speak {
        /// Voice id
        #[arg(long)]
        voice: String,

        /// Text to speak
        #[arg(short, long)]
        text: String,

        /// Output audio file
        #[arg(short, long)]
        out: PathBuf,
    },
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.logs);
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Onboard => onboard::run(config_path),
        Commands::Status => status::run(config_path),
        Commands::Keys { provider, count } => keys_cmd::run(config_path, provider.as_deref(), count),
        Commands::Text { system, user, json } => text_cmd::run(config_path, &system, &user, json).await,
        Commands::Images {
            prompts,
            out,
            model_image,
            product_image,
        } => {
            images_cmd::run(images_cmd::ImagesArgs {
                config_path,
                prompts,
                out,
                model_image,
                product_image,
            })
            .await
        }
        Commands::Speak { voice, text, out } => speak_cmd::run(config_path, &voice, &text, &out).await,
    }
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("salesreel=debug,salesreel_core=debug,salesreel_providers=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
