// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;

use crate::app::App;
use crate::cmd::chats::list_chats;
use crate::cmd::check::check_connection;
use crate::cmd::migrate::migrate_history;
use crate::cmd::reset::cleanup;
use crate::cmd::reset::reset_all;
use crate::cmd::reset::reset_year;
use crate::cmd::run::run;
use crate::cmd::run::serve;
use crate::cmd::send::send_now;
use crate::cmd::stats::StatsFormat;
use crate::cmd::stats::print_all_years;
use crate::cmd::stats::print_year_stats;
use crate::config::Settings;
use crate::error::Fallible;
use crate::history::Year;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. Defaults to ./dailyverse.toml if
    /// it exists.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Send the daily verse at the scheduled times until interrupted.
    Run,
    /// Send a verse now.
    Send {
        /// Send this reference instead of the next daily verse. History is
        /// not updated.
        #[arg(long)]
        reference: Option<String>,
        /// Send to this chat only.
        #[arg(long)]
        chat: Option<String>,
    },
    /// Serve an HTTP endpoint that sends the daily verse when requested.
    Serve {
        /// Address to listen on, e.g. 0.0.0.0:8000.
        #[arg(long)]
        bind: Option<String>,
    },
    /// Print statistics for the current year, or the given one.
    Stats {
        year: Option<Year>,
        #[arg(long, default_value_t = StatsFormat::Text)]
        format: StatsFormat,
    },
    /// Print statistics for every year with history, newest first.
    AllYears {
        #[arg(long, default_value_t = StatsFormat::Text)]
        format: StatsFormat,
    },
    /// Forget which verses were sent in the current year, or the given one.
    Reset { year: Option<Year> },
    /// Forget all verse history.
    ResetAll,
    /// Remove history older than the given number of years.
    Cleanup {
        #[arg(long, default_value_t = 2)]
        keep_years: u32,
    },
    /// Convert a legacy flat history file to the per-year format.
    Migrate,
    /// Test the bot token and the configured chats.
    Check {
        /// Post an "online" message to each chat instead of only looking it
        /// up.
        #[arg(long)]
        announce: bool,
    },
    /// List chats the bot has seen recently, with their ids.
    Chats,
}

pub async fn entrypoint() -> Fallible<()> {
    let cli: Cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;
    init_logging(&settings)?;
    let app = App::new(settings)?;
    match cli.command {
        Command::Run => run(app).await,
        Command::Send { reference, chat } => send_now(app, reference, chat).await,
        Command::Serve { bind } => serve(app, bind).await,
        Command::Stats { year, format } => print_year_stats(&app, year, format),
        Command::AllYears { format } => print_all_years(&app, format),
        Command::Reset { year } => reset_year(&app, year),
        Command::ResetAll => reset_all(&app),
        Command::Cleanup { keep_years } => cleanup(&app, keep_years),
        Command::Migrate => migrate_history(
            &app.settings.storage.history_file,
            app.zone.current_year(),
        ),
        Command::Check { announce } => check_connection(app, announce).await,
        Command::Chats => list_chats(app).await,
    }
}

/// The configured level applies unless `RUST_LOG` is set.
fn init_logging(settings: &Settings) -> Fallible<()> {
    let level = settings.log_level_filter()?;
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::try_parse_from([
            "dailyverse",
            "--config",
            "bot.toml",
            "stats",
            "2024",
            "--format",
            "json",
        ]);
        let Ok(cli) = cli else {
            panic!("failed to parse");
        };
        assert_eq!(cli.config, Some(PathBuf::from("bot.toml")));
        match cli.command {
            Command::Stats { year, format } => {
                assert_eq!(year, Some(2024));
                assert_eq!(format, StatsFormat::Json);
            }
            _ => panic!("expected stats"),
        }
        assert!(Cli::try_parse_from(["dailyverse", "reset-all"]).is_ok());
        assert!(Cli::try_parse_from(["dailyverse", "all-years"]).is_ok());
        assert!(Cli::try_parse_from(["dailyverse", "cleanup", "--keep-years", "3"]).is_ok());
        assert!(Cli::try_parse_from(["dailyverse", "frobnicate"]).is_err());
    }
}
