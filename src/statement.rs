//! Statement - parsing of REPL input lines.
//!
//! Lines starting with `.` are meta commands. Everything else is a statement:
//!
//! ```text
//! insert <id> <username> <email>
//! select
//! ```

use thiserror::Error;

use crate::error;
use crate::row::Row;

/// A parsed statement, ready to run against a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Insert(Row),
    Select,
}

/// A parsed meta command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaCommand {
    Exit,
    /// Print the tree structure.
    BTree,
    /// Print the node layout constants.
    Constants,
    Unrecognized(String),
}

/// Reasons a line could not be turned into a [`Statement`].
///
/// The messages are printed to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrepareError {
    #[error("ID must be positive.")]
    NegativeId,

    #[error("String is too long.")]
    StringTooLong,

    #[error("Syntax error. Could not parse statement.")]
    SyntaxError,

    #[error("Unrecognized keyword at start of '{0}'.")]
    Unrecognized(String),
}

/// Whether `input` should be handled by [`parse_meta_command`].
pub fn is_meta_command(input: &str) -> bool {
    input.starts_with('.')
}

pub fn parse_meta_command(input: &str) -> MetaCommand {
    match input {
        ".exit" => MetaCommand::Exit,
        ".btree" => MetaCommand::BTree,
        ".constants" => MetaCommand::Constants,
        other => MetaCommand::Unrecognized(other.to_string()),
    }
}

/// Parse one input line.
///
/// # Example
/// ```
/// use rowstore::statement::{prepare_statement, PrepareError, Statement};
///
/// assert_eq!(prepare_statement("select"), Ok(Statement::Select));
/// assert_eq!(prepare_statement("insert -1 a b"), Err(PrepareError::NegativeId));
/// ```
pub fn prepare_statement(input: &str) -> Result<Statement, PrepareError> {
    if input.starts_with("insert") {
        return prepare_insert(input);
    }
    if input == "select" {
        return Ok(Statement::Select);
    }
    Err(PrepareError::Unrecognized(input.to_string()))
}

fn prepare_insert(input: &str) -> Result<Statement, PrepareError> {
    let mut tokens = input.split_whitespace().skip(1);
    let (Some(id), Some(username), Some(email)) = (tokens.next(), tokens.next(), tokens.next())
    else {
        return Err(PrepareError::SyntaxError);
    };

    let id: i64 = id.parse().map_err(|_| PrepareError::SyntaxError)?;
    if id < 0 {
        return Err(PrepareError::NegativeId);
    }
    let id = u32::try_from(id).map_err(|_| PrepareError::SyntaxError)?;

    match Row::new(id, username, email) {
        Ok(row) => Ok(Statement::Insert(row)),
        Err(error::Error::StringTooLong { .. }) => Err(PrepareError::StringTooLong),
        Err(_) => Err(PrepareError::SyntaxError),
    }
}
