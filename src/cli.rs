use crate::models::EntityKind;
use clap::{Parser, Subcommand};

/// Browse and manage the student-management backend from the terminal
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Log formatter to use
    #[arg(long, value_enum, default_value_t = default_tracing_format())]
    pub tracing: TracingFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print one page of a collection with its references resolved
    List(ListArgs),
    /// Print a single entity
    Show {
        #[arg(value_enum)]
        kind: EntityKind,
        id: i64,
    },
    /// Delete an entity, then print the refreshed first page
    Delete {
        #[arg(value_enum)]
        kind: EntityKind,
        id: i64,
    },
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    #[arg(value_enum)]
    pub kind: EntityKind,

    /// Zero-based page index
    #[arg(long, default_value_t = 0)]
    pub page: i64,

    /// Rows per page (defaults to the configured page size)
    #[arg(long)]
    pub size: Option<u32>,

    /// Field to sort by
    #[arg(long)]
    pub sort: Option<String>,

    /// Sort descending
    #[arg(long)]
    pub desc: bool,

    /// Exact-match filter, repeatable: `--filter majorId=10`
    #[arg(long = "filter", value_parser = parse_filter)]
    pub filters: Vec<(String, String)>,

    /// Keyword search (results are paged locally)
    #[arg(long)]
    pub keyword: Option<String>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TracingFormat {
    /// Human-readable output
    Pretty,
    /// One JSON object per line
    Json,
}

fn default_tracing_format() -> TracingFormat {
    if cfg!(debug_assertions) {
        TracingFormat::Pretty
    } else {
        TracingFormat::Json
    }
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {raw:?}"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("filter key is empty in {raw:?}"));
    }
    Ok((key.to_owned(), value.trim().to_owned()))
}
