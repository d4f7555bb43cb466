//! 🎛️ CLI arguments for `ccx`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Object-store commit checks.
///
/// Verify `_SUCCESS` markers, poke at object stores, and probe that every
/// storage backend can be built.
///
/// ## Examples
///
///   ccx --config ccx.toml verify out/ --committer magic --files 4
///   ccx ls datasets/people --recursive
///   ccx probe --roundtrip scratch/
#[derive(Parser, Debug)]
#[command(name = "ccx")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// TOML config file. Env vars (CCX_*) apply either way.
    #[arg(short, long, env = "CCX_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Print the storage statistics table when done.
    #[arg(long, global = true)]
    pub stats: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Verify the success marker under a job's destination directory.
    Verify {
        /// Destination directory the job committed to.
        destination: String,

        /// Expected committer name.
        #[arg(long)]
        committer: Option<String>,

        /// Expected number of files in the marker's file list.
        #[arg(long)]
        files: Option<usize>,

        /// A file that must appear in the marker's file list. Repeatable.
        #[arg(long = "expect-file")]
        expect_files: Vec<String>,

        /// Accept a zero-length marker (jobs that used a committer that writes none).
        #[arg(long)]
        allow_empty: bool,

        /// Look once and give up, instead of waiting out the configured retry policy.
        #[arg(long)]
        no_wait: bool,
    },

    /// List files under a path.
    Ls {
        path: String,

        /// Walk sub-directories too.
        #[arg(short, long)]
        recursive: bool,
    },

    /// Print an object as text.
    Cat { path: String },

    /// Write a string to a path.
    Put { path: String, text: String },

    /// Build every storage backend, and optionally round-trip the configured one.
    Probe {
        /// Scratch directory on the configured store for a write/read/list/delete round trip.
        #[arg(long)]
        roundtrip: Option<String>,
    },
}
