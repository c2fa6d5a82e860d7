//! CLI argument definitions using clap

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::llm::ModelPreset;
use crate::notice::MeetingRequest;
use crate::pdf::FILE_NAME;

/// noticegen - Generate notice-of-meeting PDFs with a hosted Llama 2 model
#[derive(Parser, Debug)]
#[command(name = "noticegen")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the notice form over HTTP
    Serve {
        /// Address to bind (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Generate a notice with the model and write it as PDF
    Generate(GenerateArgs),

    /// Format a saved model reply into a notice PDF without calling the model
    Format(FormatArgs),

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// The four meeting fields.
#[derive(Args, Debug, Clone)]
pub struct MeetingArgs {
    /// What is the purpose of the meeting?
    #[arg(long)]
    pub purpose: String,

    /// Who are invited to the meeting?
    #[arg(long)]
    pub invitees: String,

    /// Which office is calling the meeting?
    #[arg(long)]
    pub office: String,

    /// Date of the meeting (YYYY-MM-DD)
    #[arg(long)]
    pub date: NaiveDate,
}

impl MeetingArgs {
    pub fn to_request(&self) -> MeetingRequest {
        MeetingRequest::new(
            self.purpose.as_str(),
            self.invitees.as_str(),
            self.office.as_str(),
            self.date,
        )
    }
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub meeting: MeetingArgs,

    /// Model preset (Llama2-7B, Llama2-13B)
    #[arg(short, long)]
    pub model: Option<ModelPreset>,

    /// Sampling temperature (0.01 - 1.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Nucleus sampling threshold (0.01 - 1.0)
    #[arg(long)]
    pub top_p: Option<f32>,

    /// Maximum output length (32 - 128, step 8)
    #[arg(long)]
    pub max_length: Option<u32>,

    /// Output PDF path
    #[arg(short, long, default_value = FILE_NAME)]
    pub output: PathBuf,
}

#[derive(Args, Debug)]
pub struct FormatArgs {
    /// File holding the model reply ("-" reads stdin)
    #[arg(short, long)]
    pub reply: PathBuf,

    #[command(flatten)]
    pub meeting: MeetingArgs,

    /// Output PDF path
    #[arg(short, long, default_value = FILE_NAME)]
    pub output: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}
