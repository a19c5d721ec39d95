//! CLI argument definitions

use std::path::PathBuf;

use clap::Parser;
use profscope_core::ImplementationFilter;

#[derive(Parser, Debug)]
#[command(
    name = "profscope",
    about = "Print the call tree or GC statistics of a processed profile",
    after_help = "\
EXAMPLES:
    profscope profile.json                          Call tree of the first thread
    profscope profile.json --thread 2 --invert      Inverted tree of thread 2
    profscope profile.json --start 100 --end 250    Restrict to a time window
    profscope profile.json --gc                     GC pause statistics"
)]
pub struct Args {
    /// Processed profile JSON file
    #[arg(value_name = "PROFILE")]
    pub profile: PathBuf,

    /// Thread index
    #[arg(short, long, default_value = "0")]
    pub thread: usize,

    /// Selection start in milliseconds
    #[arg(long)]
    pub start: Option<f64>,

    /// Selection end in milliseconds (exclusive)
    #[arg(long)]
    pub end: Option<f64>,

    /// Comma-separated search terms; samples must match all of them
    #[arg(short, long, default_value = "")]
    pub search: String,

    /// Which frames to keep: combined, js or cpp
    #[arg(long, default_value = "combined")]
    pub implementation: ImplementationFilter,

    /// Invert the call tree (leaf functions first)
    #[arg(long)]
    pub invert: bool,

    /// Merge a function into its callers (repeatable)
    #[arg(long, value_name = "FUNCTION")]
    pub merge: Vec<String>,

    /// Focus on a function, dropping samples that don't contain it
    #[arg(long, value_name = "FUNCTION")]
    pub focus: Option<String>,

    /// Drop samples containing a function (repeatable)
    #[arg(long, value_name = "FUNCTION")]
    pub drop: Vec<String>,

    /// Deepest call tree level to print
    #[arg(long)]
    pub max_depth: Option<u32>,

    /// Print GC statistics instead of the call tree
    #[arg(long)]
    pub gc: bool,
}
