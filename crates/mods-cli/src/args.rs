use crate::types::{LogLevel, OutputFormat, parse_sort};
use clap::{Parser, Subcommand};
use mods_sdk::SortBy;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mods")]
#[command(about = "Query logged calls, ops, and objects from a local trace store", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Data directory (defaults to $MODS_PATH, then the XDG data dir)
    #[arg(long, global = true)]
    pub data_dir: Option<String>,

    /// Project as `entity/project`
    #[arg(long, default_value = "local/default", global = true)]
    pub project: String,

    #[arg(long, default_value = "plain", global = true)]
    pub format: OutputFormat,

    #[arg(long, default_value = "warn", global = true)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load a JSON dump of calls and object versions into the store
    Import { file: PathBuf },

    /// Fetch calls as a flat table
    Calls {
        /// Op name (all versions) or op reference URI; repeatable
        #[arg(long)]
        op: Vec<String>,

        /// Only calls whose inputs reference this URI; repeatable
        #[arg(long = "input-ref")]
        input_refs: Vec<String>,

        /// Only calls without a parent
        #[arg(long)]
        roots_only: bool,

        #[arg(long)]
        limit: Option<usize>,

        /// Sort field; prefix with `-` for descending
        #[arg(long, value_parser = parse_sort, allow_hyphen_values = true)]
        sort: Vec<SortBy>,

        /// Restrict returned fields
        #[arg(long)]
        column: Vec<String>,

        /// Print column names and types instead of rows
        #[arg(long)]
        describe: bool,

        /// Bypass the configured result cache
        #[arg(long)]
        no_cache: bool,
    },

    /// List ops
    Ops {
        #[arg(long)]
        all_versions: bool,
    },

    /// List every version of one op
    OpVersions {
        name: String,

        /// Count calls logged against each version
        #[arg(long)]
        counts: bool,
    },

    /// List data objects, newest first
    Objs {
        /// Base object class; repeatable
        #[arg(long = "type")]
        types: Vec<String>,

        #[arg(long)]
        all_versions: bool,
    },

    /// Resolve reference URIs into a table
    Resolve {
        #[arg(required = true)]
        refs: Vec<String>,
    },
}
