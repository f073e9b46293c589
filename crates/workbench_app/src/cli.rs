//! Command-line surface of the `workbench` binary.
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use workbench_core::{DeclaredKind, Operation};

#[derive(Debug, Parser)]
#[command(name = "workbench")]
#[command(about = "Upload media, run a processing operation and follow it to completion")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Overrides for individual fields of the config file.
#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// RON config file (defaults to ./workbench.ron when present)
    #[arg(long, global = true, value_name = "PATH", env = "WORKBENCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Base URL of the processing server
    #[arg(long, global = true, value_name = "URL", env = "WORKBENCH_SERVER")]
    pub server: Option<String>,

    /// Milliseconds between status checks
    #[arg(long, global = true, value_name = "MS")]
    pub poll_interval_ms: Option<u64>,

    /// Failed status checks in a row before a job is given up
    #[arg(long, global = true, value_name = "N")]
    pub max_poll_failures: Option<u32>,

    /// off, error, warn, info, debug or trace
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List operations with their input slots and options
    Operations,
    /// Upload inputs, submit one job and wait for its result
    Run(RunArgs),
    /// Ask the server to delete stored uploads and outputs
    Cleanup,
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Operation to run, e.g. merge_audio_video
    #[arg(short, long)]
    pub operation: Operation,

    /// Local input for a slot, repeatable
    #[arg(long = "file", value_name = "SLOT=PATH", value_parser = parse_file_arg)]
    pub files: Vec<FileArg>,

    /// Remote input imported by URL, optionally with its kind
    #[arg(long = "url", value_name = "URL[=KIND]", value_parser = parse_url_arg)]
    pub urls: Vec<UrlArg>,

    /// Option value, repeatable
    #[arg(long = "option", value_name = "NAME=VALUE", value_parser = parse_option_arg)]
    pub options: Vec<OptionArg>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileArg {
    pub slot: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlArg {
    pub url: String,
    pub declared: DeclaredKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionArg {
    pub name: String,
    pub value: String,
}

fn split_pair(raw: &str) -> Result<(&str, &str), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing name before `=` in `{raw}`"));
    }
    Ok((key, value))
}

fn parse_file_arg(raw: &str) -> Result<FileArg, String> {
    let (slot, path) = split_pair(raw)?;
    if path.trim().is_empty() {
        return Err(format!("missing path after `=` in `{raw}`"));
    }
    Ok(FileArg {
        slot: slot.to_string(),
        path: PathBuf::from(path),
    })
}

/// URLs may carry `=` in their query, so only a recognised kind after the last `=` is split off.
fn parse_url_arg(raw: &str) -> Result<UrlArg, String> {
    if let Some((url, kind)) = raw.rsplit_once('=') {
        if !kind.trim().is_empty() {
            if let Ok(declared) = kind.parse::<DeclaredKind>() {
                return Ok(UrlArg {
                    url: url.to_string(),
                    declared,
                });
            }
        }
    }
    Ok(UrlArg {
        url: raw.to_string(),
        declared: DeclaredKind::Auto,
    })
}

fn parse_option_arg(raw: &str) -> Result<OptionArg, String> {
    let (name, value) = split_pair(raw)?;
    Ok(OptionArg {
        name: name.to_string(),
        value: value.to_string(),
    })
}
