use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand};

/// Terminal client for the ragreader document chat service.
///
/// Submits documents for ingestion, follows the ingestion job until the
/// index is ready, and asks questions against it.
#[derive(Parser, Debug)]
#[command(name = "ragreader-cli", about = "Terminal client for ragreader")]
pub struct CliArgs {
    /// Path to config file (default: ~/.config/ragreader-cli/config.toml)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// API server URL (overrides API_URL and the config file)
    #[arg(long, global = true)]
    pub server: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Register as a guest user and store the identity locally
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
    },

    /// Forget the stored identity
    Logout,

    /// Submit a document, URL or text, then wait for it to be indexed
    Submit(SubmitArgs),

    /// Follow the ingestion job for the stored identity until it is ready
    Wait,

    /// Ask a question against the indexed documents
    Ask {
        /// The question
        query: String,
    },

    /// Remove everything the server has indexed
    Clean,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("source").required(true).args(["file", "url", "text"])))]
pub struct SubmitArgs {
    /// Document to upload (pdf, txt, ...)
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Web page to ingest
    #[arg(long)]
    pub url: Option<String>,

    /// Raw text to ingest
    #[arg(long)]
    pub text: Option<String>,

    /// Return right after the upload instead of following the job
    #[arg(long)]
    pub no_wait: bool,
}
