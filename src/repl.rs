//! A simple line-buffered read-eval-print loop: one command per line of
//! stdin, no raw-mode editing. Mirrors the shell contract of the original
//! `insert`/`select`/`.exit` tool this engine grew out of.
use crate::errors::Error;
use crate::storage::row::Row;
use crate::storage::Table;
use crossterm::execute;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use std::io::{self, BufRead, Write};

const PROMPT: &str = "db > ";

pub fn run(table: &mut Table) -> i32 {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print_prompt();

        let line = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                print_error(&format!("unexpected error reading input: {}", e));
                return 1;
            }
            None => return 0,
        };

        if line.starts_with('.') {
            match run_meta_command(&line, table) {
                MetaOutcome::Exit(code) => return code,
                MetaOutcome::Unrecognized => {
                    print_warn(&format!("unrecognized command '{}'", line))
                }
            }
            continue;
        }

        match dispatch(&line, table) {
            Ok(()) => print_success("Executed."),
            Err(e) => print_error(&e.to_string()),
        }
    }
}

enum MetaOutcome {
    Exit(i32),
    Unrecognized,
}

fn run_meta_command(input: &str, table: &mut Table) -> MetaOutcome {
    if input == ".exit" {
        if let Err(e) = table.close() {
            print_error(&format!("failed to close database: {}", e));
            return MetaOutcome::Exit(1);
        }
        MetaOutcome::Exit(0)
    } else {
        MetaOutcome::Unrecognized
    }
}

fn dispatch(input: &str, table: &mut Table) -> Result<(), Error> {
    if let Some(rest) = input.strip_prefix("insert") {
        return execute_insert(rest, table);
    }

    if input.trim() == "select" {
        return execute_select(table);
    }

    print_warn(&format!("unrecognized command '{}'", input));
    Ok(())
}

fn execute_insert(rest: &str, table: &mut Table) -> Result<(), Error> {
    let tokens: Vec<&str> = rest.split_whitespace().collect();
    if tokens.len() != 3 {
        print_warn(&format!("syntax error in insert command '{}'", rest.trim()));
        return Ok(());
    }

    let id: u32 = match tokens[0].parse() {
        Ok(id) => id,
        Err(_) => {
            print_warn(&format!("invalid id: '{}'", tokens[0]));
            return Ok(());
        }
    };

    let row = match Row::new(id, tokens[1], tokens[2]) {
        Ok(row) => row,
        Err(e) => {
            print_warn(&e.to_string());
            return Ok(());
        }
    };

    table.insert(&row)
}

fn execute_select(table: &mut Table) -> Result<(), Error> {
    let mut out = io::stdout();
    table.select(&mut out)
}

fn print_prompt() {
    let _ = execute!(io::stdout(), Print(PROMPT));
    let _ = io::stdout().flush();
}

pub fn print_success(message: &str) {
    let _ = execute!(
        io::stdout(),
        SetForegroundColor(Color::Green),
        Print(message),
        Print("\n"),
        ResetColor
    );
    let _ = io::stdout().flush();
}

pub fn print_warn(message: &str) {
    let _ = execute!(
        io::stdout(),
        SetForegroundColor(Color::Yellow),
        Print(message),
        Print("\n"),
        ResetColor
    );
    let _ = io::stdout().flush();
}

pub fn print_error(message: &str) {
    let _ = execute!(
        io::stdout(),
        SetForegroundColor(Color::Red),
        Print(message),
        Print("\n"),
        ResetColor
    );
    let _ = io::stdout().flush();
}
