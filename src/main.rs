#![deny(clippy::all)]
use std::env;

use anyhow::Result;
use clap::Parser;
use e6f_api::E621Client;
use e6f_common::{
    config_dir,
    settings::{JsonFileStore, STATE_FILE},
    CONFIG_DIR_ENV,
};
use e6f_filter::filter::MatchState;
use e6filter::{
    cli::{join_line, BlacklistCommand, Cli, Commands, FavoritesCommand},
    progress_bars::FetchProgress,
    App, AppConfig, PostReport,
};
use owo_colors::OwoColorize;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    env_logger::builder().format_timestamp(None).init();

    if let Some(dir) = &args.config_dir {
        env::set_var(CONFIG_DIR_ENV, dir);
    }

    let dir = config_dir()?;
    let config = AppConfig::load_from(&dir).await?;
    let store = JsonFileStore::open(&dir.join(STATE_FILE))?;
    let client = E621Client::new(config.api.clone());

    match &args.mode {
        Commands::Search(search) => {
            let mut app = App::connect(&config, store, client).await?;
            let progress = if args.quiet {
                FetchProgress::hidden(u64::from(search.pages))
            } else {
                FetchProgress::new(u64::from(search.pages))
            };

            let reports = app
                .search(
                    &search.tags,
                    search.page,
                    search.pages,
                    search.limit,
                    Some(&progress),
                )
                .await?;
            progress.finish();
            print_reports(&reports, args.visible_only);
        }
        Commands::Posts(posts) => {
            let mut app = App::connect(&config, store, client).await?;
            let reports = app.fetch_ids(&posts.ids).await?;
            print_reports(&reports, args.visible_only);
        }
        Commands::Check(check) => {
            let mut app = App::new(&config, store, client)?;
            let reports = app.check_file(&check.file).await?;
            print_reports(&reports, args.visible_only);
        }
        Commands::Blacklist(command) => {
            let mut app = App::new(&config, store, client)?;
            run_blacklist(&mut app, command)?;
        }
        Commands::Favorites(FavoritesCommand::Sync) => {
            let mut app = App::connect(&config, store, client).await?;
            let count = app.sync_favorites().await?;
            println!(
                "{} {}",
                count.to_string().bold().blue(),
                "favorites cached".bold()
            );
        }
        Commands::Favorites(FavoritesCommand::Count) => {
            let app = App::new(&config, store, client)?;
            println!(
                "{} {}",
                app.favorites().len().to_string().bold().blue(),
                "favorites cached".bold()
            );
        }
    }

    Ok(())
}

fn run_blacklist(app: &mut App<JsonFileStore>, command: &BlacklistCommand) -> Result<()> {
    match command {
        BlacklistCommand::List => {
            let lines = app.lines();
            if lines.is_empty() {
                println!("{}", "The blacklist is empty".bold().blue());
            }
            for line in lines {
                if line.enabled {
                    println!("{} {}", "[on] ".bold().green(), line.text);
                } else {
                    println!("{} {}", "[off]".bold().red(), line.text.dimmed());
                }
            }
        }
        BlacklistCommand::Add { line } => {
            let line = join_line(line);
            if app.add_line(&line)? {
                println!("{} {}", "Added".bold().green(), line.bold());
            } else {
                println!("{} {}", line.bold(), "is already blacklisted".bold().blue());
            }
        }
        BlacklistCommand::Remove { line } => {
            let line = join_line(line);
            if app.remove_line(&line)? {
                println!("{} {}", "Removed".bold().green(), line.bold());
            } else {
                println!("{} {}", line.bold(), "is not blacklisted".bold().red());
            }
        }
        BlacklistCommand::Toggle { line } => {
            let line = join_line(line);
            match app.toggle_line(&line)? {
                Some(true) => println!("{} {}", "Enabled".bold().green(), line.bold()),
                Some(false) => println!("{} {}", "Disabled".bold().red(), line.bold()),
                None => println!("{} {}", line.bold(), "is not blacklisted".bold().red()),
            }
        }
        BlacklistCommand::EnableAll => {
            app.enable_all()?;
            println!("{}", "All lines enabled".bold().green());
        }
        BlacklistCommand::DisableAll => {
            app.disable_all()?;
            println!("{}", "All lines disabled".bold().red());
        }
    }
    Ok(())
}

fn print_reports(reports: &[PostReport], visible_only: bool) {
    let mut hidden = 0_usize;

    for report in reports {
        let id = format!("#{}", report.post.id);
        match report.state {
            MatchState::Enabled => {
                hidden += 1;
                if !visible_only {
                    println!(
                        "{:>10} {} {}",
                        id.red(),
                        "hidden".bold().red(),
                        report.filters.join(" | ").dimmed()
                    );
                }
            }
            MatchState::Disabled => println!(
                "{:>10} {} {}",
                id.yellow(),
                "visible".bold().yellow(),
                format!("(disabled: {})", report.filters.join(" | ")).dimmed()
            ),
            MatchState::NoMatch => println!(
                "{:>10} {} {}",
                id.green(),
                "visible".bold().green(),
                report.post.tags.joined().dimmed()
            ),
        }
    }

    println!(
        "{} {} {}",
        reports.len().to_string().bold().blue(),
        "posts checked,".bold(),
        format!("{hidden} hidden by the blacklist").bold().red()
    );
}
