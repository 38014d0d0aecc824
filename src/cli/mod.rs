use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::Compression;

/// Environment variable holding the log filter for the binary (e.g. `debug`, `tarwalk=trace`).
pub const LOG_ENV: &str = "TARWALK_LOG";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// List the members of a TAR archive with their normalized metadata.
    #[command(alias = "l")]
    List {
        /// The archive to walk (plain, .gz, .bz2, .xz or .zst).
        #[arg(required = true)]
        archive: PathBuf,

        /// Digest algorithms to compute for regular files, comma separated (e.g. md5,sha1).
        #[arg(long = "hash", value_delimiter = ',', env = "TARWALK_HASH")]
        hash: Vec<String>,

        /// Compression of the archive. `auto` detects it from the leading bytes.
        #[arg(long, value_enum, default_value_t = CompressionMode::Auto)]
        compression: CompressionMode,

        /// Print one JSON object per entry instead of the text listing.
        #[arg(long)]
        json: bool,
    },
}

/// Compression choice on the command line.
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum CompressionMode {
    /// Detect from magic bytes.
    Auto,
    /// Uncompressed TAR.
    None,
    Gzip,
    Bzip2,
    Xz,
    Zstd,
}

impl CompressionMode {
    /// `None` means "detect".
    pub fn forced(self) -> Option<Compression> {
        match self {
            CompressionMode::Auto => None,
            CompressionMode::None => Some(Compression::None),
            CompressionMode::Gzip => Some(Compression::Gzip),
            CompressionMode::Bzip2 => Some(Compression::Bzip2),
            CompressionMode::Xz => Some(Compression::Xz),
            CompressionMode::Zstd => Some(Compression::Zstd),
        }
    }
}

/// Parses command-line arguments using `clap` and returns the command to execute.
pub fn run() -> Result<Commands, clap::Error> {
    let args = Args::try_parse()?;
    Ok(args.command)
}
