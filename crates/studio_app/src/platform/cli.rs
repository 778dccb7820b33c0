use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "studio",
    about = "Stream generated UI code from the chat backend into a local preview."
)]
pub struct Cli {
    /// Path to a RON config file. Defaults to ./studio.ron when present.
    #[arg(long, global = true, env = "STUDIO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Backend base URL.
    #[arg(long, global = true, env = "STUDIO_BASE_URL")]
    pub base_url: Option<String>,

    /// Directory the preview bundle is written to.
    #[arg(long, global = true)]
    pub out: Option<PathBuf>,

    /// Dataset id attached to new conversations.
    #[arg(long, global = true)]
    pub dataset: Option<String>,

    /// Ignore the saved session and start a new conversation.
    #[arg(long, global = true)]
    pub new: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Send one prompt and stream the reply.
    Chat {
        #[arg(required = true, trailing_var_arg = true)]
        prompt: Vec<String>,
    },
    /// Load a session transcript and its latest artifact.
    Open { session_id: String },
    /// Fetch a single artifact and present it.
    Artifact { artifact_id: String },
}
