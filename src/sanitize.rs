//! Escaping of user text embedded in SQL string literals.
//!
//! # Responsibilities
//! - Double every single quote so the literal cannot be closed early
//! - Wrap escaped text into a complete quoted literal
//!
//! # Design Decisions
//! - A SQLite string literal has no escape besides the doubled quote, so one
//!   global replacement is complete for this dialect
//! - NUL characters are rejected by request validation, never reach here
//! - Applied exactly once, immediately before the literal is templated

/// The character that opens and closes a string literal.
pub const LITERAL_DELIMITER: char = '\'';

const ESCAPED_DELIMITER: &str = "''";

/// Escape `input` for embedding between two literal delimiters.
pub fn escape_literal(input: &str) -> String {
    input.replace(LITERAL_DELIMITER, ESCAPED_DELIMITER)
}

/// Escape `input` and wrap it in delimiters, producing a complete literal.
pub fn quote_literal(input: &str) -> String {
    let escaped = escape_literal(input);
    let mut literal = String::with_capacity(escaped.len() + 2);
    literal.push(LITERAL_DELIMITER);
    literal.push_str(&escaped);
    literal.push(LITERAL_DELIMITER);
    literal
}
