// Forbid unwrap() in production code to prevent panics from corrupt data.
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use rowstore::statement::{self, MetaCommand, Statement};
use rowstore::{render_constants, ExecuteResult, Table};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

enum Flow {
    Continue,
    Exit,
}

fn main() -> ExitCode {
    // Logs go to stderr so query output on stdout stays clean.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rowstore=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let Some(filename) = std::env::args().nth(1) else {
        println!("Must supply a database filename.");
        return ExitCode::FAILURE;
    };

    let mut table = match Table::open(&filename) {
        Ok(table) => table,
        Err(e) => {
            tracing::error!("Failed to open {filename}: {e}");
            return ExitCode::FAILURE;
        }
    };

    match repl(&mut table) {
        Ok(Flow::Exit) => match table.close() {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                tracing::error!("Failed to close {filename}: {e}");
                ExitCode::FAILURE
            }
        },
        Ok(Flow::Continue) => {
            println!("Error reading input");
            if let Err(e) = table.close() {
                tracing::error!("Failed to close {filename}: {e}");
            }
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Read and run lines until `.exit` or end of input.
///
/// Returns `Flow::Continue` when input ran out before `.exit`.
fn repl(table: &mut Table) -> rowstore::Result<Flow> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut stdout = io::stdout();

    loop {
        print!("db > ");
        stdout.flush()?;

        let Some(line) = lines.next() else {
            return Ok(Flow::Continue);
        };
        let line = line?;
        let input = line.trim_end();

        if statement::is_meta_command(input) {
            match statement::parse_meta_command(input) {
                MetaCommand::Exit => return Ok(Flow::Exit),
                MetaCommand::BTree => {
                    println!("Tree:");
                    print!("{}", table.render_tree()?);
                }
                MetaCommand::Constants => {
                    println!("Constants:");
                    print!("{}", render_constants());
                }
                MetaCommand::Unrecognized(command) => {
                    println!("Unrecognized command '{command}'");
                }
            }
            continue;
        }

        match statement::prepare_statement(input) {
            Ok(Statement::Insert(row)) => match table.execute_insert(&row)? {
                ExecuteResult::Success => println!("Executed."),
                ExecuteResult::DuplicateKey => println!("Error: Duplicate key."),
                ExecuteResult::TableFull => println!("Error: Table full."),
            },
            Ok(Statement::Select) => {
                for row in table.execute_select()? {
                    println!("{row}");
                }
                println!("Executed.");
            }
            Err(e) => println!("{e}"),
        }
    }
}
