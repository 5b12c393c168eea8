use crate::ast::{DoBlock, FunctionCall, Node};
use crate::error::{Error, ParseError};
use crate::lexer::{Token, TokenKind, TokenStream, tokenize};

const DEFAULT_MAX_DEPTH: usize = 100;

/// Recursive-descent parser over a lexed token stream
pub struct Parser<'a> {
    tokens: TokenStream<'a>,
    cursor: usize,
    max_depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: TokenStream<'a>) -> Self {
        Self {
            tokens,
            cursor: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Limit how deeply `do` blocks may nest
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Lex and parse source text into a forest (main entry point)
    pub fn parse_source(source: &str) -> Result<Vec<Node>, Error> {
        let tokens = tokenize(source)?;
        Ok(Parser::new(tokens).parse_program()?)
    }

    /// Parse the whole token stream as a program
    pub fn parse_program(&mut self) -> Result<Vec<Node>, ParseError> {
        self.parse_block(&[], 0)
    }

    /// Parse nodes until end of input or one of `stop_keywords`, which is
    /// left unconsumed for the caller.
    fn parse_block(&mut self, stop_keywords: &[&str], depth: usize) -> Result<Vec<Node>, ParseError> {
        let mut nodes = Vec::new();
        while let Some(node) = self.parse_node(stop_keywords, depth)? {
            nodes.push(node);
        }
        Ok(nodes)
    }

    /// Parse one node, or return `None` when the current block is complete
    fn parse_node(&mut self, stop_keywords: &[&str], depth: usize) -> Result<Option<Node>, ParseError> {
        let (kind, text, location) = {
            let token = self.current();
            (token.kind, token.text, token.location)
        };

        match kind {
            TokenKind::Identifier => self.parse_call().map(Some),
            TokenKind::Keyword if stop_keywords.contains(&text) => Ok(None),
            TokenKind::Keyword if text == "do" => self.parse_do_block(depth).map(Some),
            TokenKind::Keyword if text == "while" => Err(ParseError::UnsupportedKeyword {
                keyword: text.to_string(),
                location,
            }),
            TokenKind::Keyword => Err(ParseError::UnexpectedKeyword {
                keyword: text.to_string(),
                location,
            }),
            TokenKind::EndOfStream => Ok(None),
            _ => Err(Self::unexpected("a statement", self.current())),
        }
    }

    /// name '(' [string {',' string}] ')'
    fn parse_call(&mut self) -> Result<Node, ParseError> {
        let name = self.advance().text.to_string();
        self.expect_punctuation('(')?;

        let mut arguments = Vec::new();
        if self.current().is_punctuation(')') {
            self.advance();
            return Ok(Node::FunctionCall(FunctionCall { name, arguments }));
        }

        loop {
            arguments.push(self.expect_string()?);

            let next = self.current();
            if next.is_punctuation(',') {
                self.advance();
            } else if next.is_punctuation(')') {
                self.advance();
                break;
            } else {
                return Err(Self::unexpected("`,` or `)`", next));
            }
        }

        Ok(Node::FunctionCall(FunctionCall { name, arguments }))
    }

    /// 'do' block 'end'
    fn parse_do_block(&mut self, depth: usize) -> Result<Node, ParseError> {
        let opened_at = self.advance().location;
        if depth >= self.max_depth {
            return Err(ParseError::NestingTooDeep {
                limit: self.max_depth,
                location: opened_at,
            });
        }

        let body = self.parse_block(&["end"], depth + 1)?;

        let closing = self.current();
        if !closing.is_keyword("end") {
            return Err(ParseError::UnclosedBlock { opened_at });
        }
        self.advance();

        Ok(Node::DoBlock(DoBlock { body }))
    }

    fn current(&self) -> &Token<'a> {
        self.tokens.get(self.cursor)
    }

    /// Consume the current token and return it
    fn advance(&mut self) -> Token<'a> {
        let token = self.tokens.get(self.cursor).clone();
        if token.kind != TokenKind::EndOfStream {
            self.cursor += 1;
        }
        token
    }

    fn expect_punctuation(&mut self, ch: char) -> Result<(), ParseError> {
        if self.current().is_punctuation(ch) {
            self.advance();
            Ok(())
        } else {
            Err(Self::unexpected(&format!("`{ch}`"), self.current()))
        }
    }

    fn expect_string(&mut self) -> Result<String, ParseError> {
        if self.current().kind == TokenKind::String {
            Ok(self.advance().text.to_string())
        } else {
            Err(Self::unexpected("string", self.current()))
        }
    }

    fn unexpected(expected: &str, token: &Token) -> ParseError {
        let found = match token.kind {
            TokenKind::EndOfStream => token.kind.to_string(),
            kind => format!("{kind} `{}`", token.text),
        };
        ParseError::UnexpectedToken {
            expected: expected.to_string(),
            found,
            location: token.location,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parse(source: &str) -> Result<Vec<Node>, ParseError> {
        Parser::new(tokenize(source).unwrap()).parse_program()
    }

    #[test]
    fn test_parse_warn_call() {
        let nodes = parse("warn('Hello!', 'World!')").unwrap();
        assert_eq!(nodes, vec![Node::call("warn", ["Hello!", "World!"])]);
    }

    #[test]
    fn test_parse_mixed_string_forms() {
        let nodes = parse(r#"print("a", 'b', [[c]], [=[d]=])"#).unwrap();
        assert_eq!(nodes, vec![Node::call("print", ["a", "b", "c", "d"])]);
    }

    #[test]
    fn test_parse_duplicate_arguments_kept_in_order() {
        let nodes = parse("print('x', 'y', 'x')").unwrap();
        assert_eq!(nodes, vec![Node::call("print", ["x", "y", "x"])]);
    }

    #[test]
    fn test_parse_empty_argument_list() {
        let nodes = parse("print()").unwrap();
        assert_eq!(nodes, vec![Node::call("print", Vec::<String>::new())]);
    }

    #[test]
    fn test_parse_sequence_of_calls() {
        let nodes = parse("print('a')\nwarn('b') print('c')").unwrap();
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[1], Node::call("warn", ["b"]));
    }

    #[test]
    fn test_parse_do_block() {
        let nodes = parse("do print('a') end").unwrap();
        assert_eq!(nodes, vec![Node::block(vec![Node::call("print", ["a"])])]);
    }

    #[test]
    fn test_parse_nested_do_blocks() {
        let nodes = parse("do do end print('a') do print('b') end end print('c')").unwrap();
        assert_eq!(
            nodes,
            vec![
                Node::block(vec![
                    Node::block(vec![]),
                    Node::call("print", ["a"]),
                    Node::block(vec![Node::call("print", ["b"])]),
                ]),
                Node::call("print", ["c"]),
            ]
        );
    }

    #[test]
    fn test_empty_program() {
        assert_eq!(parse("  -- nothing here\n").unwrap(), vec![]);
    }

    #[test]
    fn test_missing_closing_paren() {
        let err = parse("print('a'").unwrap_err();
        assert_eq!(
            err.to_string(),
            "expected `,` or `)`, found end of input at 1:10"
        );
    }

    #[test]
    fn test_missing_opening_paren() {
        let err = parse("print 'a'").unwrap_err();
        assert!(matches!(
            err,
            ParseError::UnexpectedToken { ref expected, ref found, .. }
                if expected == "`(`" && found == "string `a`"
        ));
    }

    #[test]
    fn test_trailing_comma() {
        let err = parse("print('a',)").unwrap_err();
        assert_eq!(
            err.to_string(),
            "expected string, found punctuation `)` at 1:11"
        );
    }

    #[rstest]
    #[case("print(42)", "number `42`")]
    #[case("print(x)", "identifier `x`")]
    #[case("print(do)", "keyword `do`")]
    fn test_non_string_argument(#[case] source: &str, #[case] found_text: &str) {
        match parse(source).unwrap_err() {
            ParseError::UnexpectedToken {
                expected, found, ..
            } => {
                assert_eq!(expected, "string");
                assert_eq!(found, found_text);
            }
            other => panic!("Expected UnexpectedToken, got {other:?}"),
        }
    }

    #[test]
    fn test_statement_cannot_start_with_punctuation() {
        let err = parse("print('a') )").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { ref expected, .. } if expected == "a statement"));
        assert_eq!(err.location().column, 12);
    }

    #[test]
    fn test_unclosed_do_block() {
        let err = parse("print('a')\ndo print('b')").unwrap_err();
        match err {
            ParseError::UnclosedBlock { opened_at } => {
                assert_eq!(opened_at.line, 2);
                assert_eq!(opened_at.column, 1);
            }
            other => panic!("Expected UnclosedBlock, got {other:?}"),
        }
    }

    #[test]
    fn test_stray_end() {
        let err = parse("print('a') end").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedKeyword { ref keyword, .. } if keyword == "end"));
    }

    #[test]
    fn test_while_is_reserved() {
        let err = parse("while print('a') end").unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedKeyword { ref keyword, .. } if keyword == "while"));
    }

    #[test]
    fn test_nesting_limit() {
        let tokens = tokenize("do do do end end end").unwrap();
        let err = Parser::new(tokens).with_max_depth(2).parse_program().unwrap_err();
        assert!(matches!(err, ParseError::NestingTooDeep { limit: 2, location } if location.column == 7));

        let tokens = tokenize("do do end end").unwrap();
        assert!(Parser::new(tokens).with_max_depth(2).parse_program().is_ok());
    }

    #[test]
    fn test_parse_source_reports_lex_errors() {
        let err = Parser::parse_source("print('a)").unwrap_err();
        assert!(matches!(err, Error::Lex(_)));
    }
}
