//! Lexer for command-language scripts
//!
//! Splits a script into line-oriented tokens for the parser. It handles:
//! - Bare words, `$variables` and `@helper(...)` calls
//! - Quoted strings and `[...]` arrays (kept as single tokens)
//! - Block delimiters `(` and `)`
//! - `#` comments (dropped)
//!
//! Lexing never fails: malformed input produces a token anyway and a
//! `ParseError` is recorded next to it.

use crate::parser::types::ParseError;

/// Token types for the command-language lexer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    Eof,
    Newline,
    LParen,
    RParen,
    /// Bare word, possibly `module:name`
    Word,
    /// `$name`
    Variable,
    /// `@name` or `@name(...)`
    Helper,
    /// `"..."` or `'...'`
    String,
    /// `[...]`
    Array,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eof => "EOF",
            Self::Newline => "NEWLINE",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::Word => "WORD",
            Self::Variable => "VARIABLE",
            Self::Helper => "HELPER",
            Self::String => "STRING",
            Self::Array => "ARRAY",
        }
    }

    /// Tokens that can appear as a command argument.
    pub fn is_argument(&self) -> bool {
        matches!(
            self,
            Self::Word | Self::Variable | Self::Helper | Self::String | Self::Array
        )
    }
}

/// A token never spans lines, so `column..end_column` on `line` covers it.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    pub value: String,
    pub line: usize,
    pub column: usize,
    pub end_column: usize,
}

impl Token {
    pub fn new(
        token_type: TokenType,
        value: impl Into<String>,
        line: usize,
        column: usize,
        end_column: usize,
    ) -> Self {
        Self {
            token_type,
            value: value.into(),
            line,
            column,
            end_column,
        }
    }
}

/// Characters that end a bare word
fn is_word_boundary(c: char) -> bool {
    c.is_whitespace() || matches!(c, '(' | ')' | '"' | '\'')
}

pub struct Lexer {
    input: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    tokens: Vec<Token>,
    errors: Vec<ParseError>,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            pos: 0,
            line: 0,
            column: 0,
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Tokenize the entire input. The last token is always `Eof`.
    pub fn tokenize(mut self) -> (Vec<Token>, Vec<ParseError>) {
        while self.pos < self.input.len() {
            self.skip_whitespace();

            let Some(c) = self.current() else {
                break;
            };
            let (line, column) = (self.line, self.column);

            let token = match c {
                '\n' => {
                    self.advance();
                    Some(Token::new(TokenType::Newline, "\n", line, column, column + 1))
                }
                '#' => {
                    self.skip_comment();
                    None
                }
                '(' => {
                    self.advance();
                    Some(Token::new(TokenType::LParen, "(", line, column, column + 1))
                }
                ')' => {
                    self.advance();
                    Some(Token::new(TokenType::RParen, ")", line, column, column + 1))
                }
                '"' | '\'' => Some(self.read_string(c)),
                '[' => Some(self.read_array()),
                _ => Some(self.read_word()),
            };

            if let Some(token) = token {
                self.tokens.push(token);
            }
        }

        self.tokens
            .push(Token::new(TokenType::Eof, "", self.line, self.column, self.column));
        (self.tokens, self.errors)
    }

    fn current(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.current()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.current() {
            if c == '\n' || !c.is_whitespace() {
                break;
            }
            self.advance();
        }
    }

    fn skip_comment(&mut self) {
        while let Some(c) = self.current() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn error(&mut self, message: impl Into<String>, line: usize, column: usize) {
        self.errors.push(ParseError::new(message, line, column));
    }

    fn slice(&self, start: usize) -> String {
        self.input[start..self.pos].iter().collect()
    }

    /// Consume a quoted run up to and including the matching quote. Returns
    /// false if the line ended first.
    fn consume_quoted(&mut self, quote: char) -> bool {
        self.advance();
        while let Some(c) = self.current() {
            match c {
                '\n' => return false,
                '\\' => {
                    self.advance();
                    if self.current().map_or(false, |next| next != '\n') {
                        self.advance();
                    }
                }
                c if c == quote => {
                    self.advance();
                    return true;
                }
                _ => {
                    self.advance();
                }
            }
        }
        false
    }

    fn read_string(&mut self, quote: char) -> Token {
        let (start, line, column) = (self.pos, self.line, self.column);
        if !self.consume_quoted(quote) {
            self.error(format!("unterminated string, missing {}", quote), line, column);
        }
        Token::new(TokenType::String, self.slice(start), line, column, self.column)
    }

    fn read_array(&mut self) -> Token {
        let (start, line, column) = (self.pos, self.line, self.column);
        let mut depth = 0usize;
        let mut closed = false;

        while let Some(c) = self.current() {
            match c {
                '\n' => break,
                '"' | '\'' => {
                    self.consume_quoted(c);
                    continue;
                }
                '[' => depth += 1,
                ']' => {
                    depth -= 1;
                    if depth == 0 {
                        self.advance();
                        closed = true;
                        break;
                    }
                }
                _ => {}
            }
            self.advance();
        }

        if !closed {
            self.error("unclosed '['", line, column);
        }
        Token::new(TokenType::Array, self.slice(start), line, column, self.column)
    }

    /// Bare words end at whitespace or a delimiter. Helpers additionally
    /// swallow a balanced `(...)` argument list, so `@token(DAI)` and
    /// `@get(0x1, "f()")` stay one token.
    fn read_word(&mut self) -> Token {
        let (start, line, column) = (self.pos, self.line, self.column);
        let first = self.current();
        let is_helper = first == Some('@');
        let mut depth = 0usize;

        while let Some(c) = self.current() {
            if depth == 0 {
                if c == '(' && is_helper {
                    depth += 1;
                } else if is_word_boundary(c) {
                    break;
                }
            } else {
                match c {
                    '\n' => break,
                    '"' | '\'' => {
                        self.consume_quoted(c);
                        continue;
                    }
                    '(' => depth += 1,
                    ')' => depth -= 1,
                    _ => {}
                }
            }
            self.advance();
        }

        if depth > 0 {
            self.error("unclosed '(' in helper call", line, column);
        }

        let token_type = match first {
            Some('@') => TokenType::Helper,
            Some('$') => TokenType::Variable,
            _ => TokenType::Word,
        };
        Token::new(token_type, self.slice(start), line, column, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types(input: &str) -> Vec<TokenType> {
        let (tokens, _) = Lexer::new(input).tokenize();
        tokens.into_iter().map(|t| t.token_type).collect()
    }

    #[test]
    fn test_simple_command() {
        let (tokens, errors) = Lexer::new("load aragonos as ar").tokenize();
        assert!(errors.is_empty());
        assert_eq!(tokens.len(), 5); // 4 words + EOF
        assert_eq!(tokens[1].value, "aragonos");
        assert_eq!((tokens[1].column, tokens[1].end_column), (5, 13));
        assert_eq!(tokens[4].token_type, TokenType::Eof);
    }

    #[test]
    fn test_block_delimiters() {
        assert_eq!(
            types("ar:connect dao (\n  install voting\n)"),
            vec![
                TokenType::Word,
                TokenType::Word,
                TokenType::LParen,
                TokenType::Newline,
                TokenType::Word,
                TokenType::Word,
                TokenType::Newline,
                TokenType::RParen,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn test_helper_call_is_one_token() {
        let (tokens, errors) = Lexer::new("set $x @get(0xab, \"f(uint)\") 1").tokenize();
        assert!(errors.is_empty());
        assert_eq!(tokens[1].token_type, TokenType::Variable);
        assert_eq!(tokens[2].token_type, TokenType::Helper);
        assert_eq!(tokens[2].value, "@get(0xab, \"f(uint)\")");
        assert_eq!(tokens[3].value, "1");
    }

    #[test]
    fn test_strings_and_arrays() {
        let (tokens, errors) = Lexer::new("exec 'a b' [1, [2, \"]\"]]").tokenize();
        assert!(errors.is_empty());
        assert_eq!(tokens[1].token_type, TokenType::String);
        assert_eq!(tokens[1].value, "'a b'");
        assert_eq!(tokens[2].token_type, TokenType::Array);
        assert_eq!(tokens[2].value, "[1, [2, \"]\"]]");
    }

    #[test]
    fn test_comment_is_dropped() {
        assert_eq!(
            types("set $a 1 # trailing\n# full line"),
            vec![
                TokenType::Word,
                TokenType::Variable,
                TokenType::Word,
                TokenType::Newline,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn test_unterminated_string_recovers() {
        let (tokens, errors) = Lexer::new("set $a \"oops\nset $b 2").tokenize();
        assert_eq!(errors.len(), 1);
        assert_eq!((errors[0].line, errors[0].column), (0, 7));
        assert_eq!(tokens[2].value, "\"oops");
        // the next line still lexes normally
        assert_eq!(tokens[4].value, "set");
        assert_eq!(tokens[4].line, 1);
    }

    #[test]
    fn test_columns_count_characters() {
        let (tokens, _) = Lexer::new("set $é 'ü' x").tokenize();
        assert_eq!((tokens[1].column, tokens[1].end_column), (4, 6));
        assert_eq!((tokens[2].column, tokens[2].end_column), (7, 10));
        assert_eq!(tokens[3].column, 11);
    }
}
