use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Search posts with tags and show which ones the blacklist hides
    Search(TagSearch),
    /// Fetch specific posts by id and show which ones the blacklist hides
    Posts(PostIds),
    /// Run the blacklist over a saved API response without touching the network
    Check(CheckFile),
    /// Manage blacklist lines
    #[clap(subcommand)]
    Blacklist(BlacklistCommand),
    /// Manage the local favorites cache
    #[clap(subcommand)]
    Favorites(FavoritesCommand),
}

#[derive(Parser, Debug)]
#[clap(name = "e6filter", author, version, about, long_about = None)]
pub struct Cli {
    #[clap(subcommand)]
    pub mode: Commands,

    /// Directory holding config.toml and state.json
    ///
    /// Overrides the E6F_CONFIG_DIR environment variable.
    #[clap(long, value_name = "PATH", global = true, help_heading = "GENERAL")]
    pub config_dir: Option<PathBuf>,

    /// Only print posts the blacklist lets through
    #[clap(long, action, global = true, help_heading = "OUTPUT")]
    pub visible_only: bool,

    /// Don't draw progress bars
    #[clap(short, long, action, global = true, help_heading = "OUTPUT")]
    pub quiet: bool,
}

#[derive(Debug, Args)]
pub struct TagSearch {
    /// Tags to search. Put them after `--` if the first one starts with `-`
    #[clap(value_parser, required = true, allow_hyphen_values = true)]
    pub tags: Vec<String>,

    /// Page to start from
    #[clap(short, long, value_parser(clap::value_parser!(u16).range(1..=750)), default_value_t = 1, help_heading = "SEARCH")]
    pub page: u16,

    /// How many consecutive pages to fetch
    #[clap(long, value_parser(clap::value_parser!(u16).range(1..=50)), default_value_t = 1, help_heading = "SEARCH")]
    pub pages: u16,

    /// Posts per page
    ///
    /// [max: 320]
    #[clap(short, long, value_parser(clap::value_parser!(u16).range(1..=320)), default_value_t = 75, help_heading = "SEARCH")]
    pub limit: u16,
}

#[derive(Debug, Args)]
pub struct PostIds {
    /// Post ids to fetch
    #[clap(value_parser, required = true)]
    pub ids: Vec<u64>,
}

#[derive(Debug, Args)]
pub struct CheckFile {
    /// JSON file with a post list, a single post, or either wrapped in a `posts`/`post` node
    #[clap(value_name = "FILE")]
    pub file: PathBuf,
}

#[derive(Debug, Subcommand)]
pub enum BlacklistCommand {
    /// Print every line with its state and match count
    List,
    /// Add a line
    Add {
        /// Line to add, e.g. "-solo score:>50"
        #[clap(required = true, allow_hyphen_values = true)]
        line: Vec<String>,
    },
    /// Remove a line
    Remove {
        #[clap(required = true, allow_hyphen_values = true)]
        line: Vec<String>,
    },
    /// Enable or disable a line
    Toggle {
        #[clap(required = true, allow_hyphen_values = true)]
        line: Vec<String>,
    },
    /// Enable every line
    EnableAll,
    /// Disable every line
    DisableAll,
}

#[derive(Debug, Subcommand)]
pub enum FavoritesCommand {
    /// Replace the cache with the logged-in account's favorites
    Sync,
    /// Print how many favorites are cached
    Count,
}

/// Joins a line given as separate shell words back into one blacklist line.
#[inline]
pub fn join_line(words: &[String]) -> String {
    words.join(" ")
}

#[cfg(test)]
mod test {
    use super::{BlacklistCommand, Cli, Commands};
    use clap::{CommandFactory, Parser};

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn blacklist_line_from_words() {
        let cli = Cli::parse_from(["e6f", "blacklist", "add", "--", "-solo", "score:>50"]);
        match cli.mode {
            Commands::Blacklist(BlacklistCommand::Add { line }) => {
                assert_eq!(super::join_line(&line), "-solo score:>50");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
