use std::io;

use thiserror::Error;

use crate::lexer::Location;

#[derive(Debug, Error)]
pub enum LexError {
    #[error("unterminated string at {location}")]
    UnterminatedString { quote: char, location: Location },

    #[error("unexpected end of string at {location}")]
    UnterminatedLongString { level: usize, location: Location },

    #[error("malformed long bracket at {location}: expected '[', found {}", describe(.found))]
    MalformedLongBracket {
        found: Option<char>,
        location: Location,
    },

    #[error("unterminated long comment at {location}")]
    UnterminatedComment { location: Location },

}

fn describe(found: &Option<char>) -> String {
    match found {
        Some(ch) => format!("{ch:?}"),
        None => "end of input".to_string(),
    }
}

impl LexError {
    /// Explain why scanning could not continue at `offset`. Only quotes,
    /// long-bracket openers and `--` can stop the scanner.
    pub(crate) fn at(source: &str, offset: usize) -> Self {
        let location = Location::at(source, offset);
        let mut chars = source[offset..].chars();

        match chars.next() {
            Some(quote @ ('\'' | '"')) => LexError::UnterminatedString { quote, location },
            Some('[') => {
                let level = chars.clone().take_while(|&c| c == '=').count();
                match chars.nth(level) {
                    Some('[') => LexError::UnterminatedLongString { level, location },
                    found => LexError::MalformedLongBracket {
                        found,
                        location: Location::at(source, offset + 1 + level),
                    },
                }
            }
            _ => LexError::UnterminatedComment { location },
        }
    }

    pub fn location(&self) -> Location {
        match self {
            LexError::UnterminatedString { location, .. }
            | LexError::UnterminatedLongString { location, .. }
            | LexError::MalformedLongBracket { location, .. }
            | LexError::UnterminatedComment { location } => *location,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("expected {expected}, found {found} at {location}")]
    UnexpectedToken {
        expected: String,
        found: String,
        location: Location,
    },

    #[error("keyword `{keyword}` is reserved but not supported at {location}")]
    UnsupportedKeyword { keyword: String, location: Location },

    #[error("unexpected keyword `{keyword}` at {location}")]
    UnexpectedKeyword { keyword: String, location: Location },

    #[error("`do` block opened at {opened_at} is never closed with `end`")]
    UnclosedBlock { opened_at: Location },

    #[error("blocks nested deeper than {limit} levels at {location}")]
    NestingTooDeep { limit: usize, location: Location },
}

impl ParseError {
    pub fn location(&self) -> Location {
        match self {
            ParseError::UnexpectedToken { location, .. }
            | ParseError::UnsupportedKeyword { location, .. }
            | ParseError::UnexpectedKeyword { location, .. }
            | ParseError::NestingTooDeep { location, .. } => *location,
            ParseError::UnclosedBlock { opened_at } => *opened_at,
        }
    }
}

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("unsupported node type: {0}")]
    UnsupportedNode(&'static str),

    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

/// Any failure of the source-to-side-effects pipeline.
#[derive(Debug, Error)]
pub enum Error {
    #[error("lex error: {0}")]
    Lex(#[from] LexError),

    #[error("syntax error: {0}")]
    Parse(#[from] ParseError),

    #[error("runtime error: {0}")]
    Exec(#[from] ExecError),
}

impl Error {
    /// True when the program was rejected before anything ran.
    pub fn is_malformed_program(&self) -> bool {
        matches!(self, Error::Lex(_) | Error::Parse(_))
    }
}
