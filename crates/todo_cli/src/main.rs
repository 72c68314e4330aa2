//! Terminal front-end for the to-do screen.
//!
//! # Responsibility
//! - Render the single to-do screen as text.
//! - Map one input line to one gesture on `TodoScreen`.
//!
//! Input lines:
//! - `<text>` adds a task, `:t N` toggles row N, `:d N` deletes row N,
//! - `:r` re-renders, `:q` quits.
//! - Any other `:`-prefixed line is added as text; `::` escapes a command.

use log::error;
use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use todo_core::{
    init_logging, AppConfig, SqliteTaskStore, StoreResult, Task, TaskStore, TodoScreen,
};

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Add(String),
    Toggle(usize),
    Delete(usize),
    Refresh,
    Quit,
    Invalid(String),
}

fn parse_command(line: &str) -> Command {
    let trimmed = line.trim();
    let Some(rest) = trimmed.strip_prefix(':') else {
        return Command::Add(line.to_string());
    };
    // `::text` adds `:text` verbatim.
    if rest.starts_with(':') {
        return Command::Add(rest.to_string());
    }

    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or_default();
    if !matches!(name, "q" | "r" | "t" | "d") {
        return Command::Add(line.to_string());
    }
    let argument = parts.next();
    if parts.next().is_some() {
        return Command::Invalid(trimmed.to_string());
    }
    let position = argument.and_then(|value| value.parse::<usize>().ok());
    match (name, argument, position) {
        ("q", None, _) => Command::Quit,
        ("r", None, _) => Command::Refresh,
        ("t", Some(_), Some(position)) if position > 0 => Command::Toggle(position),
        ("d", Some(_), Some(position)) if position > 0 => Command::Delete(position),
        _ => Command::Invalid(trimmed.to_string()),
    }
}

fn main() -> ExitCode {
    let config = AppConfig::from_env();
    if let Some(log_dir) = config.log_dir.as_deref() {
        if let Err(err) = init_logging(&config.log_level, &log_dir.to_string_lossy()) {
            eprintln!("logging disabled: {err}");
        }
    }

    let store = match SqliteTaskStore::open(&config.store) {
        Ok(store) => store,
        Err(err) => {
            eprintln!("failed to open task store: {err}");
            return ExitCode::FAILURE;
        }
    };
    let mut screen = match TodoScreen::new(&store) {
        Ok(screen) => screen,
        Err(err) => {
            eprintln!("failed to load tasks: {err}");
            return ExitCode::FAILURE;
        }
    };

    match run(&mut screen, io::stdin().lock(), io::stdout().lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("terminal I/O failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run<S: TaskStore>(
    screen: &mut TodoScreen<'_, S>,
    input: impl BufRead,
    mut output: impl Write,
) -> io::Result<()> {
    writeln!(output, "{}", screen.render_text())?;
    for line in input.lines() {
        let command = parse_command(&line?);
        if command == Command::Quit {
            break;
        }
        match apply(screen, command) {
            Ok(Some(notice)) => writeln!(output, "{notice}")?,
            Ok(None) => {}
            Err(err) => {
                error!("event=cli_command module=cli status=error error={err}");
                writeln!(output, "error: {err}")?;
            }
        }
        writeln!(output, "\n{}", screen.render_text())?;
    }
    Ok(())
}

/// Applies one command; returns a notice for commands that could not act.
fn apply<S: TaskStore>(
    screen: &mut TodoScreen<'_, S>,
    command: Command,
) -> StoreResult<Option<String>> {
    match command {
        Command::Add(text) => {
            screen.set_input_text(text);
            screen.submit()?;
        }
        Command::Toggle(position) => match row_task(screen, position) {
            Some(task) => {
                screen.toggle(&task)?;
            }
            None => return Ok(Some(format!("no row {position}"))),
        },
        Command::Delete(position) => match row_task(screen, position) {
            Some(task) => {
                screen.delete(&task)?;
            }
            None => return Ok(Some(format!("no row {position}"))),
        },
        Command::Refresh => {
            screen.refresh();
        }
        Command::Invalid(line) => return Ok(Some(format!("unknown command `{line}`"))),
        Command::Quit => {}
    }
    Ok(None)
}

fn row_task<S: TaskStore>(screen: &TodoScreen<'_, S>, position: usize) -> Option<Task> {
    screen
        .rows()
        .get(position.checked_sub(1)?)
        .map(|row| row.task.clone())
}
