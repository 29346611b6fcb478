use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human readable summaries and indented trees
    #[default]
    Text,
    Json,
}

/// Inspect the group/dataset tree of an HDF5 file
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// HDF5 file to inspect, e.g. a MATLAB v7.3 `.mat` file
    pub file_path: PathBuf,
    /// Slash-delimited path of an entry to print instead of the file summary
    #[arg(short, long)]
    pub entry: Option<String>,
    /// Print a summary of the entry without reading its data
    #[arg(short, long, requires = "entry")]
    pub lazy: bool,
    #[arg(short, long, value_enum, default_value_t)]
    pub format: OutputFormat,
    /// View only the groups below this sub-path
    #[arg(short, long)]
    pub sub_path: Option<String>,
    /// Dataset of the sub-path to read when opening it, e.g. `name` of `noisyParameters`
    #[arg(long, requires = "sub_path")]
    pub field: Option<String>,
}

impl Config {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
            entry: None,
            lazy: false,
            format: OutputFormat::default(),
            sub_path: None,
            field: None,
        }
    }
}
