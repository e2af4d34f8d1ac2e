// ctl_app_helper
// Copyright (C) 2021  Univ. Artois & CNRS
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Helpers used to build command line applications made of subcommands.
//!
//! An application registers its [`Command`]s into an [`AppHelper`], which handles
//! argument parsing, logger initialization and error reporting.

pub use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
pub use log::{debug, error, info, trace, warn, Level, LevelFilter};

use anyhow::{anyhow, Result};
use fern::colors::{Color, ColoredLevelConfig};
use std::str::FromStr;

const ARG_LOGGING_LEVEL: &str = "LOGGING_LEVEL";

const LOGGING_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// A trait for the subcommands of an application.
pub trait Command<'a> {
    /// The name of the subcommand, as typed on the command line.
    fn name(&self) -> &str;

    /// Builds the clap description of the subcommand.
    fn clap_subcommand(&self) -> App<'a, 'a>;

    /// Executes the subcommand given the arguments it matched.
    fn execute(&self, arg_matches: &ArgMatches<'_>) -> Result<()>;
}

/// The entry point of an application made of subcommands.
pub struct AppHelper<'a> {
    app_name: &'a str,
    version: &'a str,
    author: &'a str,
    about: &'a str,
    commands: Vec<Box<dyn Command<'a>>>,
}

impl<'a> AppHelper<'a> {
    /// Builds a new application helper.
    ///
    /// # Arguments
    /// * `app_name` - the name of the application
    /// * `version` - its version
    /// * `author` - its authors
    /// * `about` - a short description
    pub fn new(app_name: &'a str, version: &'a str, author: &'a str, about: &'a str) -> Self {
        AppHelper {
            app_name,
            version,
            author,
            about,
            commands: vec![],
        }
    }

    /// Registers a subcommand.
    pub fn add_command(&mut self, command: Box<dyn Command<'a>>) {
        self.commands.push(command);
    }

    /// Parses the command line, initializes the logger and executes the selected subcommand.
    ///
    /// In case the subcommand fails, the error chain is logged and the process exits with status 1.
    pub fn launch_app(&self) {
        let app = self.commands.iter().fold(
            App::new(self.app_name)
                .version(self.version)
                .author(self.author)
                .about(self.about)
                .setting(AppSettings::SubcommandRequiredElseHelp)
                .arg(
                    Arg::with_name(ARG_LOGGING_LEVEL)
                        .long("logging-level")
                        .takes_value(true)
                        .possible_values(LOGGING_LEVELS)
                        .default_value("info")
                        .global(true)
                        .help("sets the minimal logging level"),
                ),
            |app, command| app.subcommand(command.clap_subcommand()),
        );
        let matches = app.get_matches();
        let (command_name, command_matches) = matches.subcommand();
        let logging_level = command_matches
            .and_then(|m| m.value_of(ARG_LOGGING_LEVEL))
            .or_else(|| matches.value_of(ARG_LOGGING_LEVEL))
            .unwrap_or("info");
        if let Err(e) = init_logger(logging_level) {
            eprintln!("cannot initialize the logger: {}", e);
            std::process::exit(1);
        }
        let result = match (self.find_command(command_name), command_matches) {
            (Some(command), Some(m)) => command.execute(m),
            _ => Err(anyhow!("no such command: {}", command_name)),
        };
        if let Err(e) = result {
            for (i, cause) in e.chain().enumerate() {
                if i == 0 {
                    error!("{}", cause);
                } else {
                    error!("  caused by: {}", cause);
                }
            }
            std::process::exit(1);
        }
        info!("exiting successfully");
    }

    fn find_command(&self, name: &str) -> Option<&dyn Command<'a>> {
        self.commands
            .iter()
            .find(|c| c.name() == name)
            .map(|c| c.as_ref())
    }
}

fn init_logger(level: &str) -> Result<()> {
    let level_filter = LevelFilter::from_str(level)
        .map_err(|_| anyhow!(r#"invalid logging level "{}""#, level))?;
    let colors = ColoredLevelConfig::new()
        .trace(Color::BrightBlack)
        .debug(Color::Cyan)
        .info(Color::Green)
        .warn(Color::Yellow)
        .error(Color::Red);
    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{}][{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                colors.color(record.level()),
                message
            ))
        })
        .level(level_filter)
        .chain(std::io::stderr())
        .apply()
        .map_err(|e| anyhow!("while setting the logger: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DummyCommand;

    impl<'a> Command<'a> for DummyCommand {
        fn name(&self) -> &str {
            "dummy"
        }

        fn clap_subcommand(&self) -> App<'a, 'a> {
            SubCommand::with_name("dummy")
        }

        fn execute(&self, _arg_matches: &ArgMatches<'_>) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_find_command() {
        let mut helper = AppHelper::new("app", "0.1.0", "author", "about");
        helper.add_command(Box::new(DummyCommand));
        assert_eq!("dummy", helper.find_command("dummy").unwrap().name());
        assert!(helper.find_command("other").is_none());
    }

    #[test]
    fn test_logging_levels_are_valid() {
        for level in LOGGING_LEVELS {
            assert!(LevelFilter::from_str(level).is_ok());
        }
    }
}
