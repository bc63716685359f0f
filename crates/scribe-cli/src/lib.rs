use std::fs;
use std::io::{self, BufRead, Write};

use clap::Parser as _;
use scribe_engine::{Catalog, Outcome};

use crate::commands::Cli;

pub mod commands;
mod logger;

/// Reads one SQL statement per line from `input`, executing each
/// against `catalog` and writing the result to `output`. Shared by the
/// REPL, `-e` one-shot mode, and script-file execution.
fn run_line(catalog: &mut Catalog, line: &str, output: &mut impl Write) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return true;
    }
    if trimmed.trim_end_matches(';').eq_ignore_ascii_case("exit") {
        return false;
    }

    match scribe_core::parse(trimmed) {
        Err(e) => {
            let _ = writeln!(output, "Error: {e}");
        }
        Ok(statement) => match scribe_engine::execute(catalog, &statement) {
            Err(e) => {
                let _ = writeln!(output, "Error: {e}");
            }
            Ok(Outcome::Status(message)) => {
                let _ = writeln!(output, "{message}");
            }
            Ok(Outcome::Rows(rows)) => {
                print_rows(&rows, output);
            }
        },
    }
    true
}

fn print_rows(rows: &[scribe_engine::Row], output: &mut impl Write) {
    let Some(first) = rows.first() else {
        let _ = writeln!(output, "(0 rows)");
        return;
    };
    let columns: Vec<&str> = first.keys().map(String::as_str).collect();
    let _ = writeln!(output, "{}", columns.join(" | "));
    for row in rows {
        let values: Vec<String> = columns
            .iter()
            .map(|c| row.get(*c).map(ToString::to_string).unwrap_or_default())
            .collect();
        let _ = writeln!(output, "{}", values.join(" | "));
    }
}

pub fn run_with_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    if std::env::var("SCRIBE_LOG").is_err() {
        // Safe: single-threaded CLI start-up, before any logging occurs.
        unsafe { std::env::set_var("SCRIBE_LOG", &cli.log_level) };
    }
    let _ = logger::init();

    let mut catalog = Catalog::new();
    let stdout = io::stdout();
    let mut output = stdout.lock();

    if let Some(statement) = &cli.execute {
        run_line(&mut catalog, statement, &mut output);
        return 0;
    }

    if let Some(path) = &cli.script {
        let contents = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("could not read '{}': {e}", path.display());
                return 1;
            }
        };
        for line in contents.lines() {
            if !run_line(&mut catalog, line, &mut output) {
                break;
            }
        }
        return 0;
    }

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        if !run_line(&mut catalog, &line, &mut output) {
            break;
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_line_continues_and_exit_stops() {
        let mut catalog = Catalog::new();
        let mut buf = Vec::new();
        assert!(run_line(&mut catalog, "", &mut buf));
        assert!(!run_line(&mut catalog, "exit;", &mut buf));
    }

    #[test]
    fn status_line_is_printed() {
        let mut catalog = Catalog::new();
        let mut buf = Vec::new();
        run_line(&mut catalog, "CREATE TABLE t (a INT);", &mut buf);
        let printed = String::from_utf8(buf).unwrap();
        assert!(printed.contains("Table 't' created successfully."));
    }

    #[test]
    fn parse_error_is_reported_without_aborting() {
        let mut catalog = Catalog::new();
        let mut buf = Vec::new();
        assert!(run_line(&mut catalog, "NOT SQL AT ALL", &mut buf));
        let printed = String::from_utf8(buf).unwrap();
        assert!(printed.starts_with("Error: "));
    }
}
