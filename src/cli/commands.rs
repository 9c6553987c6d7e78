use std::path::PathBuf;

use clap::Parser;

use crate::duplicate::CopyStrategy;
use crate::resolve::ResolveStrategy;

pub const USAGE: &str = "Usage: notedup \"/ParentFolder/FolderName\"";

#[derive(Parser, Debug)]
#[command(name = "notedup")]
#[command(
    version,
    about = "Duplicate an Apple Notes folder into a sibling folder named with a suffix"
)]
pub struct Cli {
    /// Slash-delimited folder path, e.g. "/Personal/Test"
    pub path: Option<String>,

    /// How the path is matched against the folder hierarchy
    #[arg(long, value_enum)]
    pub strategy: Option<ResolveStrategy>,

    /// How each note is copied
    #[arg(long, value_enum)]
    pub copy: Option<CopyStrategy>,

    /// Also duplicate nested subfolders and their notes
    #[arg(long, short = 'r', overrides_with = "no_recursive")]
    pub recursive: bool,

    /// Only duplicate the folder's own notes, even if the config says otherwise
    #[arg(long, overrides_with = "recursive")]
    pub no_recursive: bool,

    /// Text appended to the folder name (default "*")
    #[arg(long)]
    pub suffix: Option<String>,

    /// Check everything and print the plan without creating anything
    #[arg(long)]
    pub dry_run: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Work on a JSON snapshot file instead of Apple Notes
    #[arg(long, value_name = "FILE")]
    pub snapshot: Option<PathBuf>,

    /// YAML config file with defaults for the options above
    #[arg(long, value_name = "FILE", env = "NOTEDUP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (repeatable)
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// `Some` only when a recursion flag was given; the last one wins.
    pub fn recursive_override(&self) -> Option<bool> {
        if self.recursive {
            Some(true)
        } else if self.no_recursive {
            Some(false)
        } else {
            None
        }
    }
}
