//! Lexical analysis for Zerg source files.
//!
//! The lexer is pull-based: [`Lexer::next_token`] returns one [`Token`] at a
//! time, tracking line/column as it goes. String interpolation is the one
//! piece of real state: while scanning the literal text of a `"..."` with a
//! `{` inside it, the lexer must interleave literal-text tokens
//! (`INTERP_START`/`INTERP_MID`/`INTERP_END`) with a normal token stream for
//! the embedded expression, including recursively for strings nested inside
//! that expression.

mod token;

pub use token::{Token, TokenKind};

/// One open string-interpolation context: `brace_depth` counts unmatched
/// `{` tokens seen since the last `INTERP_START`/`INTERP_MID`, so the lexer
/// can tell an expression-internal `{map literal}` apart from the `}` that
/// closes the interpolated segment.
struct InterpFrame {
    brace_depth: i32,
}

#[derive(PartialEq, Eq)]
enum Mode {
    /// Producing ordinary tokens (this is also the mode while inside an
    /// interpolated expression's `{ ... }`).
    Token,
    /// Resuming literal-text scanning for the topmost open interpolation.
    StringBody,
}

pub struct Lexer<'a> {
    input: &'a [u8],
    position: usize,
    line: usize,
    column: usize,
    mode: Mode,
    interp_stack: Vec<InterpFrame>,
    done: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            position: 0,
            line: 1,
            column: 1,
            mode: Mode::Token,
            interp_stack: Vec::new(),
            done: false,
        }
    }

    /// Lex the whole input eagerly, for callers (the parser) that want a
    /// materialized token vector rather than pulling one at a time.
    pub fn lex_all(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token();
            log::trace!("token: {tok:?}");
            let is_eof = tok.is_eof();
            tokens.push(tok);
            if is_eof {
                return tokens;
            }
        }
    }

    fn peek_byte(&self) -> Option<u8> {
        self.input.get(self.position).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let b = self.peek_byte()?;
        self.position += 1;
        if b == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(b)
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek_byte() {
                Some(b' ') | Some(b'\t') | Some(b'\r') | Some(b'\n') => {
                    self.advance();
                }
                Some(b'#') => {
                    while let Some(b) = self.peek_byte() {
                        if b == b'\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => return,
            }
        }
    }

    /// Produce the next token. Once EOF has been returned, further calls
    /// keep returning EOF tokens.
    pub fn next_token(&mut self) -> Token {
        if self.done {
            return self.make(TokenKind::Eof, "", self.line, self.column);
        }

        if self.mode == Mode::StringBody {
            return self.continue_string_body();
        }

        self.skip_whitespace_and_comments();

        let (line, column) = (self.line, self.column);

        let Some(byte) = self.peek_byte() else {
            self.done = true;
            return self.make(TokenKind::Eof, "", line, column);
        };

        match byte {
            b'"' => self.lex_string_start(),
            b'0'..=b'9' => self.lex_number(),
            b'A'..=b'Z' | b'a'..=b'z' | b'_' => self.lex_ident(),
            _ => self.lex_operator(),
        }
    }

    fn make(&self, kind: TokenKind, literal: impl Into<String>, line: usize, column: usize) -> Token {
        Token::new(kind, literal, line, column)
    }

    // ---- identifiers & keywords -----------------------------------------

    fn lex_ident(&mut self) -> Token {
        let (line, column) = (self.line, self.column);
        let start = self.position;
        while let Some(b) = self.peek_byte() {
            if b.is_ascii_alphanumeric() || b == b'_' {
                self.advance();
            } else {
                break;
            }
        }
        let text = std::str::from_utf8(&self.input[start..self.position])
            .expect("source is valid utf8")
            .to_string();

        if text == "_" {
            return self.make(TokenKind::Underscore, text, line, column);
        }

        match TokenKind::keyword_for(&text) {
            Some(kind) => self.make(kind, text, line, column),
            None => self.make(TokenKind::Ident, text, line, column),
        }
    }

    // ---- numbers -----------------------------------------------------------

    fn lex_number(&mut self) -> Token {
        let (line, column) = (self.line, self.column);
        let start = self.position;
        self.consume_digit_run();

        let mut is_float = false;
        // A `.` is only part of the number when immediately followed by a digit;
        // this keeps `x..y` tokenizing as `x`, `..`, `y`.
        if self.peek_byte() == Some(b'.') && matches!(self.peek_at(1), Some(b'0'..=b'9')) {
            is_float = true;
            self.advance(); // consume '.'
            self.consume_digit_run();
        }

        let raw = std::str::from_utf8(&self.input[start..self.position])
            .expect("source is valid utf8")
            .to_string();

        if is_float {
            self.make(TokenKind::Float, raw, line, column)
        } else {
            self.make(TokenKind::Int, raw, line, column)
        }
    }

    fn consume_digit_run(&mut self) {
        while let Some(b) = self.peek_byte() {
            if b.is_ascii_digit() || b == b'_' {
                self.advance();
            } else {
                break;
            }
        }
    }

    // ---- operators & delimiters ---------------------------------------------

    fn lex_operator(&mut self) -> Token {
        let (line, column) = (self.line, self.column);
        let two = (self.peek_byte(), self.peek_at(1));
        let three = self.peek_at(2);

        // Maximal munch, longest sequences first. `..=` must win over `..`.
        if two == (Some(b'.'), Some(b'.')) && three == Some(b'=') {
            self.advance();
            self.advance();
            self.advance();
            return self.make(TokenKind::DotDotEq, "..=", line, column);
        }

        macro_rules! two_char {
            ($a:expr, $b:expr, $kind:expr, $lit:expr) => {
                if two == (Some($a), Some($b)) {
                    self.advance();
                    self.advance();
                    return self.make($kind, $lit, line, column);
                }
            };
        }

        two_char!(b':', b'=', TokenKind::Declare, ":=");
        two_char!(b'=', b'=', TokenKind::EqEq, "==");
        two_char!(b'!', b'=', TokenKind::NotEq, "!=");
        two_char!(b'<', b'=', TokenKind::LtEq, "<=");
        two_char!(b'>', b'=', TokenKind::GtEq, ">=");
        two_char!(b'-', b'>', TokenKind::Arrow, "->");
        two_char!(b'=', b'>', TokenKind::FatArrow, "=>");
        two_char!(b'*', b'*', TokenKind::StarStar, "**");
        two_char!(b'+', b'=', TokenKind::PlusEq, "+=");
        two_char!(b'-', b'=', TokenKind::MinusEq, "-=");
        two_char!(b'*', b'=', TokenKind::StarEq, "*=");
        two_char!(b'/', b'=', TokenKind::SlashEq, "/=");
        two_char!(b'%', b'=', TokenKind::PercentEq, "%=");
        two_char!(b'.', b'.', TokenKind::DotDot, "..");

        let Some(b) = self.advance() else {
            return self.make(TokenKind::Eof, "", line, column);
        };

        let (kind, lit): (TokenKind, &str) = match b {
            b'(' => (TokenKind::LParen, "("),
            b')' => (TokenKind::RParen, ")"),
            b'{' => {
                if let Some(frame) = self.interp_stack.last_mut() {
                    frame.brace_depth += 1;
                }
                (TokenKind::LBrace, "{")
            }
            b'}' => {
                if let Some(frame) = self.interp_stack.last_mut() {
                    if frame.brace_depth == 0 {
                        // This closes the interpolated expression, not a
                        // nested block/map literal: resume the string body.
                        self.interp_stack.pop();
                        self.mode = Mode::StringBody;
                        return self.continue_string_body_from(line, column);
                    }
                    frame.brace_depth -= 1;
                }
                (TokenKind::RBrace, "}")
            }
            b'[' => (TokenKind::LBracket, "["),
            b']' => (TokenKind::RBracket, "]"),
            b',' => (TokenKind::Comma, ","),
            b':' => (TokenKind::Colon, ":"),
            b'.' => (TokenKind::Dot, "."),
            b'&' => (TokenKind::Amp, "&"),
            b'|' => (TokenKind::Pipe, "|"),
            b'+' => (TokenKind::Plus, "+"),
            b'-' => (TokenKind::Minus, "-"),
            b'*' => (TokenKind::Star, "*"),
            b'/' => (TokenKind::Slash, "/"),
            b'%' => (TokenKind::Percent, "%"),
            b'=' => (TokenKind::Assign, "="),
            b'<' => (TokenKind::Lt, "<"),
            b'>' => (TokenKind::Gt, ">"),
            other => {
                let lit = (other as char).to_string();
                return self.make(TokenKind::Illegal, lit, line, column);
            }
        };
        self.make(kind, lit, line, column)
    }

    // ---- strings & interpolation ------------------------------------------

    /// Begin lexing a `"`-delimited string. Scans literal text (decoding
    /// escapes) until it hits an unescaped `{`, an unescaped closing `"`, or
    /// EOF.
    fn lex_string_start(&mut self) -> Token {
        let (line, column) = (self.line, self.column);
        self.advance(); // consume opening quote
        self.scan_string_segment(line, column, true)
    }

    fn continue_string_body(&mut self) -> Token {
        let (line, column) = (self.line, self.column);
        self.continue_string_body_from(line, column)
    }

    fn continue_string_body_from(&mut self, line: usize, column: usize) -> Token {
        self.scan_string_segment(line, column, false)
    }

    /// Shared scanning loop for both the first segment of a string
    /// (`is_first`, producing `STRING` or `INTERP_START`) and any segment
    /// that resumes after a `}` (producing `STRING`-as-mid via `INTERP_MID`
    /// or `INTERP_END`).
    fn scan_string_segment(&mut self, line: usize, column: usize, is_first: bool) -> Token {
        let mut content = String::new();
        loop {
            match self.peek_byte() {
                None => {
                    // Unterminated string: surface what we managed to read.
                    self.done = true;
                    return self.make(TokenKind::Illegal, content, line, column);
                }
                Some(b'"') => {
                    self.advance();
                    self.mode = Mode::Token;
                    let kind = if is_first {
                        TokenKind::Str
                    } else {
                        TokenKind::InterpEnd
                    };
                    return self.make(kind, content, line, column);
                }
                Some(b'{') => {
                    self.advance();
                    self.interp_stack.push(InterpFrame { brace_depth: 0 });
                    self.mode = Mode::Token;
                    let kind = if is_first {
                        TokenKind::InterpStart
                    } else {
                        TokenKind::InterpMid
                    };
                    return self.make(kind, content, line, column);
                }
                Some(b'\\') => {
                    self.advance();
                    match self.advance() {
                        Some(b'n') => content.push('\n'),
                        Some(b't') => content.push('\t'),
                        Some(b'r') => content.push('\r'),
                        Some(b'\\') => content.push('\\'),
                        Some(b'"') => content.push('"'),
                        Some(b'{') => content.push('{'),
                        Some(b'}') => content.push('}'),
                        Some(other) => {
                            content.push('\\');
                            content.push(other as char);
                        }
                        None => {
                            self.done = true;
                            return self.make(TokenKind::Illegal, content, line, column);
                        }
                    }
                }
                Some(_) => {
                    // Decode one UTF-8 scalar value at a time so multi-byte
                    // characters survive in the literal content.
                    let start = self.position;
                    let first = self.advance().expect("checked above");
                    let extra = utf8_extra_bytes(first);
                    for _ in 0..extra {
                        self.advance();
                    }
                    let ch = std::str::from_utf8(&self.input[start..self.position])
                        .unwrap_or("\u{FFFD}");
                    content.push_str(ch);
                }
            }
        }
    }
}

fn utf8_extra_bytes(first: u8) -> usize {
    if first & 0b1110_0000 == 0b1100_0000 {
        1
    } else if first & 0b1111_0000 == 0b1110_0000 {
        2
    } else if first & 0b1111_1000 == 0b1111_0000 {
        3
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src).lex_all().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_identifier_literal_verbatim() {
        let tokens = Lexer::new("my_var").lex_all();
        assert_eq!(tokens[0].literal, "my_var");
        assert_eq!(tokens[0].kind, TokenKind::Ident);
    }

    #[test]
    fn preserves_digit_separators_in_literal() {
        let tokens = Lexer::new("1_000_000").lex_all();
        assert_eq!(tokens[0].kind, TokenKind::Int);
        assert_eq!(tokens[0].literal, "1_000_000");
    }

    #[test]
    fn dot_dot_does_not_swallow_into_float() {
        assert_eq!(
            kinds("x..y"),
            vec![TokenKind::Ident, TokenKind::DotDot, TokenKind::Ident, TokenKind::Eof]
        );
    }

    #[test]
    fn dot_dot_eq_wins_over_dot_dot_then_eq() {
        assert_eq!(
            kinds("1..=5"),
            vec![TokenKind::Int, TokenKind::DotDotEq, TokenKind::Int, TokenKind::Eof]
        );
    }

    #[test]
    fn float_requires_digit_after_dot() {
        assert_eq!(
            kinds("3.14"),
            vec![TokenKind::Float, TokenKind::Eof]
        );
    }

    #[test]
    fn simple_string_has_no_interpolation() {
        let tokens = Lexer::new("\"hello\"").lex_all();
        assert_eq!(tokens[0].kind, TokenKind::Str);
        assert_eq!(tokens[0].literal, "hello");
    }

    #[test]
    fn string_escapes_are_decoded() {
        let tokens = Lexer::new("\"a\\nb\\{c\\}\"").lex_all();
        assert_eq!(tokens[0].literal, "a\nb{c}");
    }

    #[test]
    fn interpolated_string_segments() {
        let tokens = Lexer::new("\"Hello, {name}!\"").lex_all();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::InterpStart,
                TokenKind::Ident,
                TokenKind::InterpEnd,
                TokenKind::Eof,
            ]
        );
        assert_eq!(tokens[0].literal, "Hello, ");
        assert_eq!(tokens[1].literal, "name");
        assert_eq!(tokens[2].literal, "!");
    }

    #[test]
    fn interpolation_with_nested_map_literal_braces() {
        // the `{ "k": 1 }` inside the interpolated expression must not be
        // mistaken for the closing brace of the interpolation.
        let tokens = Lexer::new("\"v={ {\"k\": 1} }\"").lex_all();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::InterpStart,
                TokenKind::LBrace,
                TokenKind::Str,
                TokenKind::Colon,
                TokenKind::Int,
                TokenKind::RBrace,
                TokenKind::InterpEnd,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn interpolation_with_multiple_segments() {
        let tokens = Lexer::new("\"{a} and {b}\"").lex_all();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::InterpStart,
                TokenKind::Ident,
                TokenKind::InterpMid,
                TokenKind::Ident,
                TokenKind::InterpEnd,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn unterminated_string_is_illegal() {
        let tokens = Lexer::new("\"abc").lex_all();
        assert_eq!(tokens[0].kind, TokenKind::Illegal);
    }

    #[test]
    fn unknown_character_is_illegal() {
        let tokens = Lexer::new("@").lex_all();
        assert_eq!(tokens[0].kind, TokenKind::Illegal);
    }

    #[test]
    fn keyword_wildcard_underscore() {
        assert_eq!(kinds("_"), vec![TokenKind::Underscore, TokenKind::Eof]);
    }

    #[test]
    fn line_comment_extends_to_newline() {
        assert_eq!(
            kinds("x # comment\ny"),
            vec![TokenKind::Ident, TokenKind::Ident, TokenKind::Eof]
        );
    }
}
