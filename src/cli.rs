use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "rpak")]
#[command(version)]
#[command(about = "A toolkit for PACK game-asset archives", long_about = None)]
#[command(after_help = "Examples:\n  \
  rpak pack info -i pak0.pak            show a summary of pak0.pak\n  \
  rpak pack list -i pak0.pak            list every entry\n  \
  rpak pack extract -i pak0.pak -o out  extract into the new directory out\n  \
  rpak pack create -i assets -o my.pak  pack the assets directory")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Work with PACK container archives
    Pack {
        #[command(subcommand)]
        command: PackCommand,
    },

    /// Work with WAD texture archives (not implemented yet)
    Wad,

    /// Work with LMP lump files (not implemented yet)
    Lmp,
}

#[derive(Subcommand, Debug)]
pub enum PackCommand {
    /// Print a summary of an archive
    Info {
        /// Archive file to inspect
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,
    },

    /// List every entry in an archive, in on-disk order
    List {
        /// Archive file to inspect
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,
    },

    /// Extract every entry into a new directory
    Extract {
        /// Archive file to extract
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Output directory; must not already exist
        #[arg(short, long, value_name = "DIR")]
        output: PathBuf,
    },

    /// Build an archive from a directory of files
    Create {
        /// Directory to pack
        #[arg(short, long, value_name = "DIR")]
        input: PathBuf,

        /// Archive file to write; must not already exist
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },
}
