use std::sync::LazyLock;

use regex::Regex;
use sqlparser::ast::Statement;
use sqlparser::dialect::MySqlDialect;
use sqlparser::parser::Parser;
use sqlparser::tokenizer::{Token, Tokenizer};

use crate::error::OperationError;

static STATEMENT_TIME_OVERRIDE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)SET.*?max_statement_time\s*=").unwrap());

static USE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^use\s+(\w+)\s*\n?;").unwrap());

/// Reject statements the capture protocol cannot run safely.
///
/// A user-supplied `max_statement_time` would override the limit armed on the
/// primary connection. Statements that parse as something other than a query
/// are refused because the rewritten statement really executes, and so is
/// anything with more than one statement. Single statements the parser does not
/// understand are passed through; the server has the final word on syntax.
pub fn validate(sql: &str) -> Result<(), OperationError> {
    if sql.trim().is_empty() {
        return Err(OperationError::Validation("no SQL statement was given.".to_string()));
    }

    if STATEMENT_TIME_OVERRIDE.is_match(sql) {
        return Err(OperationError::Validation(
            "max_statement_time cannot be set when using this tool.".to_string(),
        ));
    }

    check_single_statement(sql)?;

    match Parser::parse_sql(&MySqlDialect {}, sql) {
        Ok(statements) => {
            if statements.len() > 1 {
                return Err(multiple_statements());
            }
            if let Some(other) = statements.iter().find(|s| !matches!(s, Statement::Query(_))) {
                let keyword = other
                    .to_string()
                    .split_whitespace()
                    .next()
                    .unwrap_or_default()
                    .to_uppercase();
                return Err(OperationError::Validation(format!(
                    "only SELECT statements can be explained (got {}).",
                    keyword
                )));
            }
        }
        Err(e) => {
            tracing::debug!(error = %e, "SQL not understood by parser, leaving it to the server");
        }
    }

    Ok(())
}

/// The text protocol runs every statement it is sent, so a second statement
/// after a `;` must be caught even when the parser gives up on the first one.
fn check_single_statement(sql: &str) -> Result<(), OperationError> {
    let tokens = Tokenizer::new(&MySqlDialect {}, sql).tokenize().map_err(|e| {
        OperationError::Validation(format!("the SQL could not be tokenized: {}.", e))
    })?;
    let mut tokens = tokens
        .into_iter()
        .skip_while(|t| !matches!(t, Token::SemiColon));
    // Past the first `;` only more semicolons, whitespace and comments may follow
    if tokens.any(|t| !matches!(t, Token::SemiColon | Token::Whitespace(_))) {
        return Err(multiple_statements());
    }
    Ok(())
}

fn multiple_statements() -> OperationError {
    OperationError::Validation(
        "only one SELECT statement can be explained at a time.".to_string(),
    )
}

/// Strip a leading `USE <schema>;` and return the remaining SQL with the schema it named.
pub fn extract_use(sql: &str) -> (String, Option<String>) {
    match USE_PREFIX.captures(sql) {
        Some(caps) => {
            let whole = caps.get(0).map_or(0, |m| m.end());
            let schema = caps.get(1).map(|m| m.as_str().to_string());
            (sql[whole..].trim_start().to_string(), schema)
        }
        None => (sql.to_string(), None),
    }
}
