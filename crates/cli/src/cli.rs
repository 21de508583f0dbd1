use std::path::PathBuf;

#[derive(clap::Parser, Debug)]
#[clap(name = "retold", version, about = "Rewrite EPUB ebooks into modern English")]
pub struct Cli {
    /// Enable debug logging
    #[clap(long, global = true)]
    pub verbose: bool,
    /// Only log errors
    #[clap(long, global = true)]
    pub quiet: bool,
    /// Show what would be done without calling any API or writing files
    #[clap(long, global = true)]
    pub dry_run: bool,
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Rewrite an EPUB's text into modern English
    Rewrite {
        /// Input EPUB file path
        #[clap(short, long)]
        input: PathBuf,
        /// Output EPUB file path (defaults to `<input>_modern.epub`)
        #[clap(short, long)]
        output: Option<PathBuf>,
        /// LLM provider id, or an OpenAI-compatible endpoint URL
        #[clap(short, long)]
        provider: Option<String>,
        /// Model name
        #[clap(short, long)]
        model: Option<String>,
        /// Provider tried when the primary fails on a batch
        #[clap(long)]
        fallback_provider: Option<String>,
        /// Model used with the fallback provider
        #[clap(long)]
        fallback_model: Option<String>,
        /// Fail the whole run if any batch cannot be rewritten
        #[clap(long)]
        strict: bool,
        /// Skip the is-this-prose classification pass
        #[clap(long)]
        no_classify: bool,
        /// Also rewrite the navigation document
        #[clap(long)]
        include_nav: bool,
    },
    /// Show an EPUB's structure without calling any API
    Inspect {
        /// EPUB file path
        input: PathBuf,
    },
    /// List known providers and whether their API keys are set
    Providers,
    /// Manage configuration
    Config {
        #[clap(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show all configuration values
    Show,
    /// Get a configuration value
    Get {
        /// Configuration key (e.g. "rewrite.model")
        key: String,
    },
    /// Set a configuration value
    Set {
        /// Configuration key (e.g. "rewrite.model")
        key: String,
        /// New value
        value: String,
    },
    /// Reset configuration to defaults
    Reset {
        /// Skip confirmation prompt
        #[clap(long)]
        force: bool,
    },
}
