use std::fmt;
use std::ops::Range;

use pest::Parser;
use pest::error::InputLocation;
use pest::iterators::Pair;
use pest_derive::Parser;

use crate::error::LexError;

/// Reserved words. An identifier spelled exactly like one of these is lexed
/// as a keyword.
pub const KEYWORDS: [&str; 3] = ["do", "end", "while"];

#[derive(Parser)]
#[grammar = "src/moonlet.pest"]
pub struct MoonletLexer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    EndOfStream,
    Identifier,
    Keyword,
    Number,
    String,
    Punctuation,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TokenKind::EndOfStream => "end of input",
            TokenKind::Identifier => "identifier",
            TokenKind::Keyword => "keyword",
            TokenKind::Number => "number",
            TokenKind::String => "string",
            TokenKind::Punctuation => "punctuation",
        })
    }
}

/// 1-based line and column in the source. Byte positions live in
/// [`Token::span`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    /// Location of a byte offset, scanning from the start of `source`.
    pub fn at(source: &str, offset: usize) -> Self {
        LineTracker::new(source).advance_to(offset)
    }
}

/// Walks the source forward once, so locating tokens in order stays linear.
struct LineTracker<'a> {
    source: &'a str,
    offset: usize,
    line: usize,
    column: usize,
}

impl<'a> LineTracker<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    /// `offset` must not be behind the previous one.
    fn advance_to(&mut self, offset: usize) -> Location {
        for ch in self.source[self.offset..offset].chars() {
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.offset = offset;
        Location {
            line: self.line,
            column: self.column,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// Literal text. For strings this is the content between the delimiters.
    pub text: &'a str,
    /// Byte range of the whole lexeme, delimiters included.
    pub span: Range<usize>,
    pub location: Location,
}

impl Token<'_> {
    pub fn is_punctuation(&self, ch: char) -> bool {
        self.kind == TokenKind::Punctuation && self.text.starts_with(ch)
    }

    pub fn is_keyword(&self, word: &str) -> bool {
        self.kind == TokenKind::Keyword && self.text == word
    }
}

/// Lexed tokens plus the end-of-stream sentinel.
#[derive(Debug, Clone)]
pub struct TokenStream<'a> {
    tokens: Vec<Token<'a>>,
    eof: Token<'a>,
}

impl<'a> TokenStream<'a> {
    /// Token at `index`, or the end-of-stream sentinel past the last one.
    pub fn get(&self, index: usize) -> &Token<'a> {
        self.tokens.get(index).unwrap_or(&self.eof)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token<'a>> {
        self.tokens.iter()
    }

    pub fn end_of_stream(&self) -> &Token<'a> {
        &self.eof
    }
}

impl<'a> IntoIterator for TokenStream<'a> {
    type Item = Token<'a>;
    type IntoIter = std::vec::IntoIter<Token<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.into_iter()
    }
}

impl MoonletLexer {
    /// Split source text into tokens, left to right.
    pub fn tokenize(source: &str) -> Result<TokenStream<'_>, LexError> {
        let pairs = MoonletLexer::parse(Rule::program, source).map_err(|e| {
            let offset = match e.location {
                InputLocation::Pos(pos) | InputLocation::Span((pos, _)) => pos,
            };
            LexError::at(source, offset)
        })?;

        let stalled_at = pairs.peek().map_or(0, |program| program.as_span().end());
        if stalled_at < source.len() {
            return Err(LexError::at(source, stalled_at));
        }

        let mut lines = LineTracker::new(source);
        let tokens = pairs
            .flat_map(Pair::into_inner)
            .filter_map(|pair| Self::token(pair, &mut lines))
            .collect();

        Ok(TokenStream {
            tokens,
            eof: Token {
                kind: TokenKind::EndOfStream,
                text: "",
                span: source.len()..source.len(),
                location: lines.advance_to(source.len()),
            },
        })
    }

    fn token<'a>(pair: Pair<'a, Rule>, lines: &mut LineTracker<'a>) -> Option<Token<'a>> {
        let span = pair.as_span();
        let range = span.start()..span.end();

        let (kind, text) = match pair.as_rule() {
            Rule::identifier if KEYWORDS.contains(&pair.as_str()) => {
                (TokenKind::Keyword, pair.as_str())
            }
            Rule::identifier => (TokenKind::Identifier, pair.as_str()),
            Rule::number => (TokenKind::Number, pair.as_str()),
            Rule::simple_string | Rule::long_string => {
                let body = pair.into_inner().next().map(|p| p.as_str()).unwrap_or("");
                (TokenKind::String, body)
            }
            Rule::punctuation => (TokenKind::Punctuation, pair.as_str()),
            _ => return None,
        };

        Some(Token {
            kind,
            text,
            location: lines.advance_to(range.start),
            span: range,
        })
    }
}

/// Shorthand for [`MoonletLexer::tokenize`].
pub fn tokenize(source: &str) -> Result<TokenStream<'_>, LexError> {
    MoonletLexer::tokenize(source)
}
