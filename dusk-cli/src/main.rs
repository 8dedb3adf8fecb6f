//! Dusk CLI
//!
//! Reads a stylesheet, merges the selector lists of its style rules and
//! writes the result as minified CSS.
//!
//! - `dusk style.css`                  # merge a file, print to stdout
//! - `dusk - < style.css -o out.css`   # read stdin, write a file
//! - `dusk https://example.com/a.css`  # fetch over HTTP

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use dusk_common::net::{fetch_text, is_remote_url};
use dusk_common::warning::warn_once;
use dusk_css::{MergeMode, MergeOptions, MergePseudo, SelectorMerger, parse_stylesheet};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Dusk: shrink stylesheets by merging selector lists with `:is()`/`:where()`
#[derive(Parser, Debug)]
#[command(name = "dusk")]
#[command(author, version, about, long_about = None)]
#[command(after_help = r#"EXAMPLES:
    # Merge a stylesheet and print minified CSS
    dusk style.css

    # Only merges that keep matches (and specificity, with :is)
    dusk --merge-mode safe style.css -o style.min.css

    # Zero-specificity wrappers
    dusk --pseudo where style.css

    # Options from a JSON file ({"pseudo": "is", "mergeMode": "greedy"})
    dusk --config dusk.json style.css
"#)]
struct Cli {
    /// Stylesheet path, `-` for stdin, or an http(s)/data URL
    #[arg(value_name = "FILE|URL")]
    input: Option<String>,

    /// Write the result here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Wrapper pseudo-class for merged alternatives
    #[arg(long, value_name = "is|where")]
    pseudo: Option<MergePseudo>,

    /// How far merging may go
    #[arg(long, value_name = "safe|greedy|unsafe")]
    merge_mode: Option<MergeMode>,

    /// JSON options file; `--pseudo` and `--merge-mode` override it
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write readable CSS instead of minified CSS
    #[arg(long)]
    pretty: bool,

    /// Log more (-v info, -vv debug, -vvv trace); RUST_LOG wins when set
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let options = resolve_options(&cli)?;
    let css = read_input(cli.input.as_deref())?;

    let mut sheet = parse_stylesheet(&css);
    let report = SelectorMerger::new(options).run(&mut sheet);
    for skipped in &report.skipped {
        let _ = warn_once(
            "merge",
            &format!("left `{}` unchanged: {}", skipped.selector, skipped.error),
        );
    }
    info!(
        examined = report.examined,
        rewritten = report.rewritten,
        removed = report.removed,
        skipped = report.skipped.len(),
        "merge finished"
    );

    let mut out = sheet.to_css(!cli.pretty);
    if !cli.pretty {
        out.push('\n');
    }
    write_output(cli.output.as_deref(), &out)
}

fn init_tracing(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))
}

/// Options from `--config` (or the defaults), then the command-line overrides.
fn resolve_options(cli: &Cli) -> Result<MergeOptions> {
    let mut options = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("invalid merge options in {}", path.display()))?
        }
        None => MergeOptions::default(),
    };
    if let Some(pseudo) = cli.pseudo {
        options.pseudo = pseudo;
    }
    if let Some(merge_mode) = cli.merge_mode {
        options.merge_mode = merge_mode;
    }
    Ok(options)
}

fn read_input(input: Option<&str>) -> Result<String> {
    match input {
        None | Some("-") => io::read_to_string(io::stdin()).context("failed to read stdin"),
        Some(url) if is_remote_url(url) || url.starts_with("data:") => {
            fetch_text(url).with_context(|| format!("failed to fetch {url}"))
        }
        Some(path) => fs::read_to_string(path).with_context(|| format!("failed to read {path}")),
    }
}

fn write_output(output: Option<&Path>, css: &str) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, css).with_context(|| format!("failed to write {}", path.display()))
        }
        None => io::stdout()
            .lock()
            .write_all(css.as_bytes())
            .context("failed to write stdout"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_parse_into_options() {
        let cli = Cli::try_parse_from(["dusk", "--pseudo", "where", "--merge-mode", "safe", "a.css"])
            .unwrap();
        assert_eq!(cli.input.as_deref(), Some("a.css"));
        let options = resolve_options(&cli).unwrap();
        assert_eq!(options.pseudo, MergePseudo::Where);
        assert_eq!(options.merge_mode, MergeMode::Safe);
    }

    #[test]
    fn test_defaults_without_flags() {
        let cli = Cli::try_parse_from(["dusk"]).unwrap();
        assert_eq!(resolve_options(&cli).unwrap(), MergeOptions::default());
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_internal_mode_is_rejected() {
        assert!(Cli::try_parse_from(["dusk", "--merge-mode", "unsafe-linear"]).is_err());
        assert!(Cli::try_parse_from(["dusk", "--pseudo", "has"]).is_err());
    }

    #[test]
    fn test_config_file_with_override() {
        let path = std::env::temp_dir().join(format!("dusk-cli-test-{}.json", std::process::id()));
        fs::write(&path, r#"{"pseudo":"where","mergeMode":"greedy"}"#).unwrap();
        let config = path.to_str().unwrap();
        let cli =
            Cli::try_parse_from(["dusk", "--config", config, "--merge-mode", "safe"]).unwrap();
        let options = resolve_options(&cli).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(options.pseudo, MergePseudo::Where);
        assert_eq!(options.merge_mode, MergeMode::Safe);
    }

    #[test]
    fn test_data_url_input() {
        let css = read_input(Some("data:text/css,a%2Cb%7Bcolor:red%7D")).unwrap();
        assert_eq!(css, "a,b{color:red}");
    }
}
