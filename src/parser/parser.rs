//! Recursive Descent Parser for command-language scripts
//!
//! Consumes tokens from the lexer and produces a `ScriptNode`. The parser
//! is tolerant: it is run on every keystroke against half-typed scripts,
//! so it records errors and keeps going instead of bailing out.
//!
//! Grammar (simplified):
//!   script   ::= (command | NEWLINE)*
//!   command  ::= [module ':'] name arg* ['(' NEWLINE script ')']
//!   arg      ::= WORD | VARIABLE | HELPER | STRING | ARRAY

use crate::ast::types::{ArgumentKind, ArgumentNode, BlockNode, CommandNode, Position, ScriptNode, Span};
use crate::parser::lexer::{Lexer, Token, TokenType};
use crate::parser::types::{ParseError, ParseOutput, MAX_BLOCK_DEPTH, MAX_INPUT_SIZE};

/// Parse a script. Always returns a tree, possibly partial.
pub fn parse(input: &str) -> ParseOutput {
    if input.len() > MAX_INPUT_SIZE {
        return ParseOutput {
            script: ScriptNode::default(),
            errors: vec![ParseError::new(
                format!("Input too large: {} bytes (max {})", input.len(), MAX_INPUT_SIZE),
                0,
                0,
            )],
        };
    }

    let (tokens, lex_errors) = Lexer::new(input).tokenize();
    let mut parser = Parser::new(tokens);
    parser.errors = lex_errors;
    let script = parser.parse_script();
    parser.errors.sort_by_key(ParseError::position);

    ParseOutput {
        script,
        errors: parser.errors,
    }
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    errors: Vec<ParseError>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
            errors: Vec::new(),
        }
    }

    pub fn parse_script(&mut self) -> ScriptNode {
        let (commands, _) = self.parse_commands();
        ScriptNode::new(commands)
    }

    // =========================================================================
    // TOKEN HELPERS
    // =========================================================================

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn current_type(&self) -> TokenType {
        self.current().map_or(TokenType::Eof, |t| t.token_type)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn eof_position(&self) -> Position {
        self.tokens
            .last()
            .map_or_else(Position::default, |t| Position::new(t.line, t.column))
    }

    fn error_at(&mut self, message: impl Into<String>, token: &Token) {
        self.errors
            .push(ParseError::new(message, token.line, token.column));
    }

    fn skip_to_line_end(&mut self) {
        while !matches!(self.current_type(), TokenType::Newline | TokenType::Eof) {
            self.advance();
        }
    }

    // =========================================================================
    // COMMANDS
    // =========================================================================

    /// Parse commands until EOF, or until a `)` when inside a block. The
    /// closing `)` token is consumed and returned.
    fn parse_commands(&mut self) -> (Vec<CommandNode>, Option<Token>) {
        let mut commands = Vec::new();

        loop {
            match self.current_type() {
                TokenType::Eof => return (commands, None),
                TokenType::Newline => {
                    self.advance();
                }
                TokenType::RParen => {
                    let Some(token) = self.advance() else {
                        return (commands, None);
                    };
                    if self.depth > 0 {
                        return (commands, Some(token));
                    }
                    self.error_at("unexpected ')'", &token);
                }
                TokenType::Word => commands.push(self.parse_command()),
                _ => {
                    if let Some(token) = self.advance() {
                        self.error_at(format!("expected command name, found '{}'", token.value), &token);
                    }
                    self.skip_to_line_end();
                }
            }
        }
    }

    fn parse_command(&mut self) -> CommandNode {
        let Some(name_token) = self.advance() else {
            return CommandNode {
                module: None,
                name: String::new(),
                args: Vec::new(),
                range: None,
                name_range: None,
                block: None,
            };
        };

        let (module, name) = split_qualified_name(&name_token.value);
        let name_range = Span::on_line(name_token.line, name_token.column, name_token.end_column);
        let mut header_end = name_range.end;
        let mut args = Vec::new();
        let mut block = None;

        loop {
            match self.current_type() {
                t if t.is_argument() => {
                    if let Some(token) = self.advance() {
                        header_end = Position::new(token.line, token.end_column);
                        args.push(argument_from_token(token));
                    }
                }
                TokenType::LParen => {
                    let Some(lparen) = self.advance() else {
                        break;
                    };
                    header_end = Position::new(lparen.line, lparen.end_column);
                    if matches!(self.current_type(), TokenType::Newline | TokenType::Eof) {
                        block = self.parse_block(&lparen);
                        break;
                    }
                    self.error_at("'(' must end the line to open a block", &lparen);
                }
                // NEWLINE, EOF, or a `)` the enclosing block will consume
                _ => break,
            }
        }

        let end = block
            .as_ref()
            .and_then(|b: &BlockNode| b.range)
            .map_or(header_end, |r| r.end);

        CommandNode {
            module,
            name,
            args,
            range: Some(Span::new(name_range.start, end)),
            name_range: Some(name_range),
            block,
        }
    }

    fn parse_block(&mut self, lparen: &Token) -> Option<BlockNode> {
        if self.depth >= MAX_BLOCK_DEPTH {
            self.error_at(format!("blocks nested deeper than {}", MAX_BLOCK_DEPTH), lparen);
            return None;
        }

        self.depth += 1;
        let (commands, closing) = self.parse_commands();
        self.depth -= 1;

        let start = Position::new(lparen.line, lparen.column);
        let (end, closed) = match &closing {
            Some(rparen) => (Position::new(rparen.line, rparen.end_column), true),
            None => {
                self.error_at("unclosed block, missing ')'", lparen);
                (self.eof_position(), false)
            }
        };

        Some(BlockNode {
            commands,
            range: Some(Span::new(start, end)),
            closed,
        })
    }
}

/// `ar:connect` -> (Some("ar"), "connect"). A leading `:` is not a prefix.
fn split_qualified_name(raw: &str) -> (Option<String>, String) {
    match raw.find(':') {
        Some(idx) if idx > 0 => (Some(raw[..idx].to_string()), raw[idx + 1..].to_string()),
        _ => (None, raw.to_string()),
    }
}

fn argument_from_token(token: Token) -> ArgumentNode {
    let kind = match token.token_type {
        TokenType::Variable => ArgumentKind::Variable,
        TokenType::Helper => ArgumentKind::Helper,
        TokenType::String => ArgumentKind::String,
        TokenType::Array => ArgumentKind::Array,
        _ => ArgumentKind::Literal,
    };
    ArgumentNode {
        kind,
        range: Some(Span::on_line(token.line, token.column, token.end_column)),
        raw: token.value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_commands() {
        let out = parse("load aragonos as ar\nset $x 1");
        assert!(out.is_clean());
        assert_eq!(out.script.commands.len(), 2);

        let load = &out.script.commands[0];
        assert_eq!(load.name, "load");
        assert_eq!(load.module, None);
        assert_eq!(load.args.len(), 3);
        assert_eq!(load.name_range, Some(Span::on_line(0, 0, 4)));
        assert_eq!(load.range, Some(Span::on_line(0, 0, 19)));

        let set = &out.script.commands[1];
        assert_eq!(set.args[0].kind, ArgumentKind::Variable);
        assert_eq!(set.args[1].range, Some(Span::on_line(1, 7, 8)));
    }

    #[test]
    fn test_parse_module_prefix() {
        let out = parse("ar:connect mydao (\n)");
        let cmd = &out.script.commands[0];
        assert_eq!(cmd.module.as_deref(), Some("ar"));
        assert_eq!(cmd.name, "connect");
        assert_eq!(cmd.name_range, Some(Span::on_line(0, 0, 10)));

        let out = parse("ar:");
        assert_eq!(out.script.commands[0].module.as_deref(), Some("ar"));
        assert_eq!(out.script.commands[0].name, "");
    }

    #[test]
    fn test_parse_block() {
        let src = "ar:connect dao (\n  install voting\n  grant a b c\n)\nset $y 2";
        let out = parse(src);
        assert!(out.is_clean(), "{:?}", out.errors);
        assert_eq!(out.script.commands.len(), 2);

        let connect = &out.script.commands[0];
        let block = connect.block.as_ref().unwrap();
        assert!(block.closed);
        assert_eq!(block.commands.len(), 2);
        assert_eq!(block.commands[1].name, "grant");
        assert_eq!(block.range, Some(Span::new(Position::new(0, 15), Position::new(3, 1))));
        assert_eq!(connect.range.unwrap().end, Position::new(3, 1));
        assert_eq!(out.script.commands[1].start_line(), Some(4));
    }

    #[test]
    fn test_unclosed_block_extends_to_eof() {
        let out = parse("ar:connect dao (\n  install v");
        assert_eq!(out.errors.len(), 1);
        assert!(out.errors[0].message.contains("unclosed block"));

        let block = out.script.commands[0].block.as_ref().unwrap();
        assert!(!block.closed);
        assert_eq!(block.commands[0].name, "install");
        assert_eq!(block.range.unwrap().end, Position::new(1, 11));
    }

    #[test]
    fn test_nested_blocks() {
        let src = "a:x (\n  b:y (\n    z 1\n  )\n  w\n)";
        let out = parse(src);
        assert!(out.is_clean(), "{:?}", out.errors);
        let outer = out.script.commands[0].block.as_ref().unwrap();
        assert_eq!(outer.commands.len(), 2);
        let inner = outer.commands[0].block.as_ref().unwrap();
        assert_eq!(inner.commands[0].name, "z");
        assert_eq!(outer.commands[1].name, "w");
    }

    #[test]
    fn test_stray_tokens_recover() {
        let out = parse(")\n\"oops\" x\nset $a 1");
        assert_eq!(out.errors.len(), 2);
        assert_eq!(out.errors[0].line, 0);
        assert_eq!(out.errors[1].line, 1);
        assert_eq!(out.script.commands.len(), 1);
        assert_eq!(out.script.commands[0].name, "set");
    }

    #[test]
    fn test_inline_paren_is_error_but_keeps_args() {
        let out = parse("exec ( foo");
        assert_eq!(out.errors.len(), 1);
        let cmd = &out.script.commands[0];
        assert!(cmd.block.is_none());
        assert_eq!(cmd.args.len(), 1);
        assert_eq!(cmd.args[0].raw, "foo");
    }

    #[test]
    fn test_comments_and_blank_lines() {
        let out = parse("# header\n\n   \nload std # trailing\n");
        assert!(out.is_clean());
        assert_eq!(out.script.commands.len(), 1);
        assert_eq!(out.script.commands[0].start_line(), Some(3));
    }

    #[test]
    fn test_empty_input() {
        let out = parse("");
        assert!(out.is_clean());
        assert!(out.script.commands.is_empty());
    }
}
