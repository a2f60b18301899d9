//! `todo`: a terminal front end for the todo service.
//!
//! Every command loads the list, applies one gesture through a [`Board`]
//! and prints the resulting cards.

mod transport;

use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use todo_core::{Board, Reconcile, TodoClient, TodoList};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::transport::UreqTransport;

#[derive(Parser)]
#[command(name = "todo", about = "Manage an ordered todo list")]
struct Cli {
    /// Base URL of the todo server.
    #[arg(long, env = "TODO_URL", default_value = "http://127.0.0.1:8000")]
    url: String,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Show every todo in order (default).
    List,
    /// Append a new todo.
    Add { title: String },
    /// Rename a todo.
    Edit { id: i64, title: String },
    /// Flip a todo between open and done.
    Toggle { id: i64 },
    /// Delete a todo, asking first unless --yes is given.
    Rm {
        id: i64,
        #[arg(short, long)]
        yes: bool,
    },
    /// Move the card at position FROM to position TO (1-based).
    Mv { from: usize, to: usize },
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    match run(Cli::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Returns whether the requested action succeeded.
fn run(cli: Cli) -> anyhow::Result<bool> {
    let transport = UreqTransport::new(Duration::from_secs(cli.timeout));
    let mut board = Board::new(TodoList::new(TodoClient::new(&cli.url), transport));

    if !board.load() {
        bail!(
            "could not load todos from {}: {}",
            cli.url,
            board.list().error().unwrap_or("unknown error")
        );
    }

    let ok = match cli.command.unwrap_or(Command::List) {
        Command::List => true,
        Command::Add { title } => board.add(&title),
        Command::Edit { id, title } => {
            if !board.begin_edit(id) {
                bail!("no todo with id {id}");
            }
            board.set_draft(&title);
            board.save_edit()
        }
        Command::Toggle { id } => board.click(id),
        Command::Rm { id, yes } => {
            if !board.request_delete(id) {
                bail!("no todo with id {id}");
            }
            if yes || confirm(&board.render())? {
                board.confirm_delete()
            } else {
                board.cancel_delete();
                true
            }
        }
        Command::Mv { from, to } => {
            let (Some(from), Some(to)) = (from.checked_sub(1), to.checked_sub(1)) else {
                bail!("positions start at 1");
            };
            let len = board.list().items().len();
            if from >= len || to >= len {
                bail!("position out of range (1..={len})");
            }
            !matches!(board.drag(from, to), Some(Reconcile::RolledBack))
        }
    };

    print!("{}", board.render());
    Ok(ok)
}

/// Show the board with its delete prompt and read a y/N answer.
fn confirm(prompt: &str) -> anyhow::Result<bool> {
    print!("{prompt}> ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("reading confirmation")?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
