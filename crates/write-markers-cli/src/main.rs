//! CLI tool for inspecting and cleaning up write marker directories.

mod error;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::debug;
use snafu::ResultExt;
use write_markers_core::{
    IoType, LocalStorage, MarkerFiles, StorageBackend,
    layout::{MARKER_SUFFIX, MarkerLayout, TEMP_DIR_NAME},
    table::TableContext,
};

use crate::error::{
    CliResult, CreateMarkerSnafu, InvalidLayoutSnafu, ListMarkersSnafu, MarkerDirSnafu,
};

#[derive(Debug, Args)]
struct InstantArgs {
    /// Table base path
    #[arg(long)]
    table: PathBuf,

    /// Write instant whose markers to operate on
    #[arg(long)]
    instant: String,

    /// Temporary directory relative to the table base path
    #[arg(long = "temp-root", default_value = TEMP_DIR_NAME)]
    temp_root: String,

    /// Token between data file name and I/O type in marker names
    #[arg(long = "marker-suffix", default_value = MARKER_SUFFIX)]
    marker_suffix: String,
}

impl InstantArgs {
    fn markers(&self) -> CliResult<MarkerFiles> {
        let layout =
            MarkerLayout::new(&self.temp_root, &self.marker_suffix).context(InvalidLayoutSnafu)?;
        let table = TableContext::with_layout(self.table.to_string_lossy(), layout);
        let storage: Arc<dyn StorageBackend> = Arc::new(LocalStorage::new());
        let markers = MarkerFiles::for_table(storage, &table, &self.instant);
        debug!("Using marker directory {}", markers.marker_dir_path());
        Ok(markers)
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum IoTypeArg {
    /// A brand-new data file
    Create,
    /// A rewrite of an existing file group
    Merge,
    /// An append to an existing file (kept on rollback)
    Append,
}

impl From<IoTypeArg> for IoType {
    fn from(arg: IoTypeArg) -> Self {
        match arg {
            IoTypeArg::Create => IoType::Create,
            IoTypeArg::Merge => IoType::Merge,
            IoTypeArg::Append => IoType::Append,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ListMode {
    /// Marker paths relative to the marker directory
    Markers,
    /// Data paths a rollback would delete (APPEND markers excluded)
    Rollback,
    /// Partition, file name and I/O type per marker
    Entries,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Record a marker for a data file about to be written
    Create {
        #[command(flatten)]
        instant: InstantArgs,

        /// Partition path relative to the table (empty for unpartitioned tables)
        #[arg(long, default_value = "")]
        partition: String,

        /// Data file name
        #[arg(long)]
        file: String,

        /// Why the file is written (case-insensitive)
        #[arg(
            long = "io-type",
            value_enum,
            ignore_case = true,
            default_value_t = IoTypeArg::Create
        )]
        io_type: IoTypeArg,
    },

    /// List the markers of an instant
    List {
        #[command(flatten)]
        instant: InstantArgs,

        #[arg(long, value_enum, default_value_t = ListMode::Markers)]
        mode: ListMode,
    },

    /// Print whether the marker directory of an instant exists
    Exists {
        #[command(flatten)]
        instant: InstantArgs,
    },

    /// Delete the marker directory of an instant
    Delete {
        #[command(flatten)]
        instant: InstantArgs,

        /// Log and ignore storage failures instead of exiting non-zero
        #[arg(long, default_value_t = false)]
        quiet: bool,
    },
}

#[derive(Debug, Parser)]
#[command(name = "tmarkers")]
struct Cli {
    /// Log marker operations to stderr (overridden by RUST_LOG)
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

async fn cmd_create(
    args: &InstantArgs,
    partition: &str,
    file: &str,
    io_type: IoType,
) -> CliResult<()> {
    let markers = args.markers()?;

    let marker = markers
        .create(partition, file, io_type)
        .await
        .context(CreateMarkerSnafu {
            instant: &args.instant,
            partition,
            file,
        })?;

    println!("{marker}");
    Ok(())
}

async fn cmd_list(args: &InstantArgs, mode: ListMode) -> CliResult<()> {
    let markers = args.markers()?;
    let ctx = || ListMarkersSnafu {
        instant: args.instant.clone(),
    };

    match mode {
        ListMode::Markers => {
            let mut paths = markers.all_marker_file_paths().await.context(ctx())?;
            paths.sort();
            for path in paths {
                println!("{path}");
            }
        }
        ListMode::Rollback => {
            let mut paths = markers
                .created_and_merged_data_paths()
                .await
                .context(ctx())?;
            paths.sort();
            for path in paths {
                println!("{path}");
            }
        }
        ListMode::Entries => {
            let mut entries = markers.marker_entries().await.context(ctx())?;
            entries.sort_by_key(|e| e.data_path());
            for e in entries {
                println!("{}\t{}\t{}", e.partition_path, e.data_file_name, e.io_type);
            }
        }
    }
    Ok(())
}

async fn cmd_exists(args: &InstantArgs) -> CliResult<()> {
    let markers = args.markers()?;
    let exists = markers
        .does_marker_dir_exist()
        .await
        .context(MarkerDirSnafu {
            instant: &args.instant,
        })?;
    println!("{exists}");
    Ok(())
}

async fn cmd_delete(args: &InstantArgs, quiet: bool) -> CliResult<()> {
    let markers = args.markers()?;
    if quiet {
        markers.quiet_delete_marker_dir().await;
        return Ok(());
    }

    let removed = markers.delete_marker_dir().await.context(MarkerDirSnafu {
        instant: &args.instant,
    })?;
    if removed {
        println!("Deleted {}", markers.marker_dir_path());
    } else {
        println!("No marker directory at {}", markers.marker_dir_path());
    }
    Ok(())
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.cmd {
        Command::Create {
            instant,
            partition,
            file,
            io_type,
        } => cmd_create(&instant, &partition, &file, io_type.into()).await,

        Command::List { instant, mode } => cmd_list(&instant, mode).await,

        Command::Exists { instant } => cmd_exists(&instant).await,

        Command::Delete { instant, quiet } => cmd_delete(&instant, quiet).await,
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
