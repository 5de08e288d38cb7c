// vfat/src/main.rs

mod commands;
mod env;
mod utils;

use std::{fs::File, path::PathBuf, process::ExitCode};

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use vfatfs::prelude::*;

use crate::utils::{LogLevel, init_logger};

#[derive(Parser, Debug)]
#[command(name = "vfat", version, about = "Read-only FAT32 explorer", long_about = None)]
struct Cli {
    /// Disk image or block device holding the volume
    device: PathBuf,

    /// Byte offset of the partition inside the device
    #[arg(long, default_value_t = 0)]
    offset: u64,

    /// Owner reported for every node (defaults to the current user)
    #[arg(long)]
    uid: Option<u32>,

    /// Group reported for every node (defaults to the current group)
    #[arg(long)]
    gid: Option<u32>,

    /// More output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Errors only
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Print the directory tree
    Tree {
        #[arg(default_value = "/")]
        path: String,
        /// Stop descending below this depth
        #[arg(short, long)]
        depth: Option<usize>,
    },
    /// List a directory
    Ls {
        #[arg(default_value = "/")]
        path: String,
        /// Show mode, size and modification date
        #[arg(short, long)]
        long: bool,
    },
    /// Show the attributes of a node
    Stat { path: String },
    /// Write a file to stdout
    Cat { path: String },
    /// Show volume geometry
    Info,
}

impl Default for Commands {
    fn default() -> Self {
        Commands::Tree {
            path: "/".into(),
            depth: None,
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logger(LogLevel::from_flags(cli.quiet, cli.verbose))
        .context("failed to install logger")?;

    let file = File::open(&cli.device)
        .with_context(|| format!("cannot open {}", cli.device.display()))?;
    let io = IOCounter::new(FileBlockIO::new_with_offset(file, cli.offset));
    let fs = Vfat::mount(io, env::mount_options(cli.uid, cli.gid))
        .with_context(|| format!("cannot mount {}", cli.device.display()))?;

    log::info!(
        "Mounted {} ({}, {} clusters of {} bytes)",
        cli.device.display(),
        fs.params().width,
        fs.params().cluster_count,
        fs.params().cluster_size
    );

    let result = match cli.command.unwrap_or_default() {
        Commands::Tree { path, depth } => {
            commands::tree(&fs, &path, depth, &mut std::io::stdout().lock())
        }
        Commands::Ls { path, long } => commands::ls(&fs, &path, long),
        Commands::Stat { path } => commands::stat(&fs, &path),
        Commands::Cat { path } => commands::cat(&fs, &path),
        Commands::Info => commands::info(&fs),
    };

    log::debug!("IO: {:?}", fs.io().snapshot());

    match result {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            log::error!("{e:#}");
            Ok(ExitCode::FAILURE)
        }
    }
}
