mod cli_utils;
mod commands;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

use commands::{cmd_glob, cmd_guess, cmd_inspect, GuessOptions};

#[derive(Parser)]
#[command(name = "mimetype")]
#[command(
    about = "Resolve media types of files and streams",
    long_about = "mimetype - Media type resolution from content signatures and file names\n\n\
    Sniffs a bounded prefix of each input against a signature table, then falls back to\n\
    filename glob databases (Apache mime.types or freedesktop.org globs2).\n\n\
    Examples:\n\
      mimetype guess photo.jpg clip.ogv\n\
      cat clip.ogv | mimetype guess -\n\
      mimetype guess --glob-file /etc/mime.types notes.css\n\
      mimetype guess --magic freedesktop --magic-file /usr/share/mime/magic *.bin\n\
      mimetype glob /usr/share/mime/globs2 archive.tar.gz\n\
      mimetype inspect /etc/mime.types --json"
)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the media type of files, or "-" for stdin
    Guess {
        /// Files to resolve, or "-" to read stdin
        #[arg(value_name = "INPUT", required = true)]
        inputs: Vec<PathBuf>,

        /// Magic adapter: builtin (default), freedesktop, or infer
        #[arg(long, value_name = "ADAPTER")]
        magic: Option<String>,

        /// Signature database for the freedesktop magic adapter
        #[arg(long, value_name = "FILE")]
        magic_file: Option<PathBuf>,

        /// Glob database layout: apache or freedesktop (default: from file name)
        #[arg(long, value_name = "DIALECT")]
        glob_dialect: Option<String>,

        /// Glob database used when content does not decide
        #[arg(long, value_name = "FILE")]
        glob_file: Option<PathBuf>,

        /// JSON configuration file (command-line flags take precedence)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Print the coarse category (image, video, ...) instead of the type
        #[arg(short, long)]
        name: bool,

        /// Output one JSON object per input
        #[arg(short, long)]
        json: bool,
    },

    /// List every glob candidate for file names
    Glob {
        /// Glob database (mime.types or globs2)
        #[arg(value_name = "DATABASE")]
        database: PathBuf,

        /// File names to look up
        #[arg(value_name = "FILENAME", required = true)]
        filenames: Vec<String>,

        /// Database layout: apache or freedesktop (default: from file name)
        #[arg(short, long, value_name = "DIALECT")]
        dialect: Option<String>,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show statistics for a glob or magic database
    Inspect {
        /// Database file
        #[arg(value_name = "DATABASE")]
        database: PathBuf,

        /// Database layout: apache, freedesktop or magic (default: from file name)
        #[arg(short, long, value_name = "DIALECT")]
        dialect: Option<String>,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,

        /// List every entry
        #[arg(long)]
        entries: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli_utils::init_logging(cli.verbose);

    match cli.command {
        Commands::Guess {
            inputs,
            magic,
            magic_file,
            glob_dialect,
            glob_file,
            config,
            name,
            json,
        } => cmd_guess(
            inputs,
            GuessOptions {
                magic,
                magic_file,
                glob_dialect,
                glob_file,
                config,
            },
            name,
            json,
        ),
        Commands::Glob {
            database,
            filenames,
            dialect,
            json,
        } => cmd_glob(database, filenames, dialect, json),
        Commands::Inspect {
            database,
            dialect,
            json,
            entries,
        } => cmd_inspect(database, dialect, json, entries),
    }
}
