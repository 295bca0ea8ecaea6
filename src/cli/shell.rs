//! Interactive shell: one command per line against a long-lived session.
//!
//! Every line is one interaction. Errors are printed inline and the loop
//! keeps going; only `quit`, end of input or Ctrl-C leave it.

use std::io::Write as _;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use super::output::{print_error, print_info, print_rows, print_success, print_warning};
use super::views;
use super::{App, ViewCommand};
use crate::usecases::LegDraft;

/// A shell line, parsed with the one-shot grammar plus session commands.
#[derive(Debug, Parser)]
#[command(name = "voluguard")]
#[command(no_binary_name = true, disable_help_subcommand = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Debug, Subcommand)]
enum ShellCommand {
    /// Authenticate with an access token
    Login {
        token: String,
    },

    /// Drop the token and every cached view
    Logout,

    /// Show the connection header
    Status,

    /// Clear cached views so the next view fetches again
    Refresh,

    /// Edit the multi-leg order book
    Leg {
        #[command(subcommand)]
        action: LegAction,
    },

    /// Control the live feed listener
    Feed {
        #[command(subcommand)]
        action: FeedAction,
    },

    /// List commands
    Help,

    /// Leave the shell
    #[command(alias = "exit")]
    Quit,

    #[command(flatten)]
    View(ViewCommand),
}

#[derive(Debug, Subcommand)]
enum LegAction {
    /// Append a leg (blank when no spec is given)
    Add {
        /// TOKEN:SIDE:QTY[:PRICE_TYPE[:PRICE]]
        spec: Option<String>,
    },
    /// Replace leg N (1-based)
    Set { position: usize, spec: String },
    /// Remove leg N (1-based)
    Remove { position: usize },
    /// Show the leg book
    List,
    /// Back to one blank leg
    Reset,
}

#[derive(Debug, Subcommand)]
enum FeedAction {
    /// Connect in the background
    Start,
    /// Show the most recent buffered messages
    Show {
        #[arg(default_value_t = 10)]
        limit: usize,
    },
    /// Disconnect
    Stop,
    /// Listener status
    Status,
}

enum Flow {
    Continue,
    Quit,
}

/// Run the shell until `quit`, end of input or Ctrl-C.
pub async fn run(app: &mut App) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    print_info("VoluGuard shell. Type `help` for commands, `quit` to leave.");
    app.print_header();

    loop {
        print!("{} ", "voluguard>".cyan().bold());
        std::io::stdout().flush().context("Failed to flush stdout")?;

        let line = tokio::select! {
            biased;
            _ = tokio::signal::ctrl_c() => {
                println!();
                info!("Interrupted, leaving shell");
                break;
            }
            line = lines.next_line() => line.context("Failed to read from stdin")?,
        };
        let Some(line) = line else {
            println!();
            break;
        };

        match dispatch(app, &line).await {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err(e) => print_error(&format!("{e:#}")),
        }
    }

    app.shutdown().await;
    Ok(())
}

async fn dispatch(app: &mut App, line: &str) -> Result<Flow> {
    let words = match split_words(line) {
        Ok(words) if words.is_empty() => return Ok(Flow::Continue),
        Ok(words) => words,
        Err(reason) => {
            print_error(&reason);
            return Ok(Flow::Continue);
        }
    };

    let command = match ShellLine::try_parse_from(&words) {
        Ok(parsed) => parsed.command,
        Err(e) => {
            // Help and usage errors render themselves.
            let _ = e.print();
            return Ok(Flow::Continue);
        }
    };
    debug!(command = %words[0], "Shell command");

    match command {
        ShellCommand::Login { token } => app.login(&token).await?,
        ShellCommand::Logout => app.logout().await,
        ShellCommand::Status => {
            app.print_header();
            print_info(&format!("Live feed: {}", app.feed().status()));
        }
        ShellCommand::Refresh => app.refresh(),
        ShellCommand::Leg { action } => edit_legs(app, action)?,
        ShellCommand::Feed { action } => match action {
            FeedAction::Start => app.feed_start().await?,
            FeedAction::Show { limit } => app.feed_show(limit).await?,
            FeedAction::Stop => app.feed_stop().await,
            FeedAction::Status => print_info(&format!(
                "Live feed: {} | received {}",
                app.feed().status(),
                app.feed().total_received().await
            )),
        },
        ShellCommand::Help => {
            println!("{}", ShellLine::command().render_help());
        }
        ShellCommand::Quit => return Ok(Flow::Quit),
        ShellCommand::View(view) => {
            if view.requires_login() && !app.session().is_authenticated() {
                print_warning("Please enter a valid access token. Use `login <token>`.");
                return Ok(Flow::Continue);
            }
            app.run(view).await?;
        }
    }
    Ok(Flow::Continue)
}

fn edit_legs(app: &mut App, action: LegAction) -> Result<()> {
    let legs = app.session_mut().legs_mut();
    match action {
        LegAction::Add { spec: Some(spec) } => {
            legs.add(LegDraft::parse(&spec)?);
            print_success(&format!("Added leg {}", legs.len()));
        }
        LegAction::Add { spec: None } => {
            legs.add_blank();
            print_success(&format!("Added blank leg {}", legs.len()));
        }
        LegAction::Set { position, spec } => {
            if legs.set(position, LegDraft::parse(&spec)?) {
                print_success(&format!("Updated leg {position}"));
            } else {
                print_error(&format!("There is no leg {position}"));
            }
        }
        LegAction::Remove { position } => match legs.remove(position) {
            Some(_) => print_success(&format!("Removed leg {position}")),
            None => print_error(&format!("There is no leg {position}")),
        },
        LegAction::List => {}
        LegAction::Reset => {
            legs.reset();
            print_success("Leg book reset");
        }
    }

    print_rows(
        views::leg_rows(app.session().legs().legs()),
        "Leg book is empty. Use `leg add`.",
    );
    Ok(())
}

/// Split a line into words. Single and double quotes group words; a
/// backslash escapes the next character outside single quotes.
pub fn split_words(line: &str) -> Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some('\''), '\'') | (Some('"'), '"') => quote = None,
            (Some('\''), c) => current.push(c),
            (_, '\\') => match chars.next() {
                Some(next) => {
                    current.push(next);
                    in_word = true;
                }
                None => return Err("Trailing backslash".to_string()),
            },
            (Some(_), c) => current.push(c),
            (None, '\'' | '"') => {
                quote = Some(c);
                in_word = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if quote.is_some() {
        return Err("Unterminated quote".to_string());
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}
