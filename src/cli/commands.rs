//! CLI command implementations

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use crate::cli::args::{ConfigCommand, FormatArgs, GenerateArgs};
use crate::config::Settings;
use crate::credentials::check_token;
use crate::llm::{build_provider, compose_and_generate, SamplingParams};
use crate::notice::format_notice;
use crate::pdf::RenderedArtifact;

/// Run the web form
pub async fn serve(settings: &Settings, host: Option<String>, port: Option<u16>) -> Result<()> {
    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    crate::server::serve(settings, &host, port).await
}

/// Generate a notice with the model and write the PDF
pub async fn generate_notice(settings: &Settings, args: GenerateArgs) -> Result<()> {
    let status = check_token(settings.api_token());
    if !status.is_valid() {
        tracing::warn!("{}", status.message());
    }

    let request = args.meeting.to_request();
    let defaults = settings.generation.sampling();
    let params = SamplingParams {
        temperature: args.temperature.unwrap_or(defaults.temperature),
        top_p: args.top_p.unwrap_or(defaults.top_p),
        max_length: args.max_length.unwrap_or(defaults.max_length),
    }
    .clamped();
    let model = args.model.unwrap_or(settings.llm.model);

    let provider = build_provider(settings, None)?;

    println!("Generating meeting notice with {}...", model);
    let reply = compose_and_generate(provider.as_ref(), &request, params, model).await?;

    let artifact = format_notice(&reply, &request).context("Failed to format the notice")?;
    write_artifact(&artifact, &args.output)?;

    println!("Notice of Meeting written to: {}", args.output.display());
    Ok(())
}

/// Format a saved model reply into a notice PDF
pub fn format_reply(args: FormatArgs) -> Result<()> {
    let reply = read_reply(&args.reply)?;
    let request = args.meeting.to_request();

    let artifact = format_notice(&reply, &request).context("Failed to format the notice")?;
    write_artifact(&artifact, &args.output)?;

    println!("Notice of Meeting written to: {}", args.output.display());
    Ok(())
}

fn read_reply(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut reply = String::new();
        io::stdin()
            .read_to_string(&mut reply)
            .context("Failed to read reply from stdin")?;
        return Ok(reply);
    }

    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read reply file: {}", path.display()))
}

fn write_artifact(artifact: &RenderedArtifact, path: &PathBuf) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    io::copy(&mut artifact.reader(), &mut file)
        .with_context(|| format!("Failed to write PDF: {}", path.display()))?;
    Ok(())
}

/// Handle config subcommands
pub fn config_command(settings: &Settings, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show => {
            let mut shown = settings.clone();
            if !shown.llm.api_token.is_empty() {
                shown.llm.api_token = "<redacted>".to_string();
            }
            let toml = toml::to_string_pretty(&shown)?;
            println!("{}", toml);
        }
        ConfigCommand::Path => {
            let path = Settings::config_path()?;
            println!("{}", path.display());
        }
        ConfigCommand::Init { force } => {
            let path = Settings::config_path()?;
            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at {}. Use --force to overwrite.",
                    path.display()
                );
            }
            Settings::write_default(&path)?;
            println!("Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::render_document;

    #[test]
    fn artifact_is_written_in_full() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("notice.pdf");
        let artifact = render_document("Notice of Meeting\nBody").unwrap();

        write_artifact(&artifact, &path).unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), artifact.as_bytes());
    }

    #[test]
    fn missing_reply_file_is_reported() {
        let err = read_reply(Path::new("/nonexistent/reply.txt")).unwrap_err();
        assert!(err.to_string().contains("Failed to read reply file"));
    }
}
