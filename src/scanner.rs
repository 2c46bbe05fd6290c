use crate::{
    error::{Error, Result},
    token::{Token, TokenKind},
};
use peekmore::{PeekMore, PeekMoreIterator};
use phf::phf_map;
use std::str::Chars;

static KEYWORDS: phf::Map<&'static str, TokenKind> = phf_map! {
    "and" => TokenKind::And,
    "class" => TokenKind::Class,
    "else" => TokenKind::Else,
    "false" => TokenKind::False,
    "for" => TokenKind::For,
    "fun" => TokenKind::Fun,
    "if" => TokenKind::If,
    "nil" => TokenKind::Nil,
    "or" => TokenKind::Or,
    "print" => TokenKind::Print,
    "return" => TokenKind::Return,
    "super" => TokenKind::Super,
    "this" => TokenKind::This,
    "true" => TokenKind::True,
    "var" => TokenKind::Var,
    "while" => TokenKind::While,
};

/// Turns source text into tokens. Yields exactly one `EndOfFile` token
/// after the last real one.
pub struct Scanner<'a> {
    src: PeekMoreIterator<Chars<'a>>,
    lexeme_buffer: String,
    line: usize,
    done: bool,
}

impl <'a> Iterator for Scanner<'a> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Result<Token>> {
        loop {
            if self.src.peek().is_none() {
                if self.done { return None }
                self.done = true;
                return Some(Ok(Token::end_of_file(self.line)));
            }

            // The line a token is reported on is the line it starts on.
            let line = self.line;
            let kind = self.next_token_kind();

            let lexeme = self.lexeme_buffer.clone();
            self.lexeme_buffer.clear();

            if let Some(kind) = kind {
                return Some(kind.map(|kind| Token { kind, lexeme, line }));
            }
        }
    }
}

impl <'a> Scanner<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src: src.chars().peekmore(),
            lexeme_buffer: String::new(),
            line: 1,
            done: false,
        }
    }

    /// Scans the whole source, stopping at the first lexical error.
    pub fn scan_tokens(self) -> Result<Vec<Token>> {
        let tokens = self.collect::<Result<Vec<Token>>>()?;
        log::debug!("scanned {} tokens", tokens.len());
        Ok(tokens)
    }

    fn next_token_kind(&mut self) -> Option<Result<TokenKind>> {
        let next_char = self.src.next()?;
        self.lexeme_buffer.push(next_char);

        use TokenKind::*;
        match next_char {
            '(' => Some(Ok(LeftParen)),
            ')' => Some(Ok(RightParen)),
            '{' => Some(Ok(LeftBrace)),
            '}' => Some(Ok(RightBrace)),
            ',' => Some(Ok(Comma)),
            '.' => Some(Ok(Dot)),
            '-' => Some(Ok(Minus)),
            '+' => Some(Ok(Plus)),
            ';' => Some(Ok(Semicolon)),
            '*' => Some(Ok(Star)),
            '!' => Some(Ok(if self.does_next_match('=') { BangEqual } else { Bang })),
            '=' => Some(Ok(if self.does_next_match('=') { EqualEqual } else { Equal })),
            '<' => Some(Ok(if self.does_next_match('=') { LessEqual } else { Less })),
            '>' => Some(Ok(if self.does_next_match('=') { GreaterEqual } else { Greater })),
            '/' => {
                if self.does_next_match('/') {
                    self.advance_until_match('\n');
                    None
                } else {
                    Some(Ok(Slash))
                }
            },
            ' ' | '\r' | '\t' => None,
            '\n' => {
                self.line += 1;
                None
            },
            '"' => Some(self.extract_string()),
            c if c.is_ascii_digit() => Some(self.extract_number()),
            c if can_start_identifier(c) => Some(self.extract_identifier()),
            c => Some(Err(Error::lexical(self.line, format!("Unexpected character '{}'.", c)))),
        }
    }

    fn does_next_match(&mut self, c: char) -> bool {
        match self.src.peek() {
            Some(next) if c == *next => {
                self.src.next();
                self.lexeme_buffer.push(c);
                true
            }
            _ => false,
        }
    }

    fn extract_string(&mut self) -> Result<TokenKind> {
        let mut newline_count = 0;
        self.advance_until_match_for_each('"', |c| if c == '\n' { newline_count += 1 });
        self.line += newline_count;
        match self.src.next() {
            None => Err(Error::lexical(self.line, "Unterminated string literal.")),
            Some(q) => {
                self.lexeme_buffer.push(q);
                let contents = &self.lexeme_buffer[1..self.lexeme_buffer.len() - 1];
                Ok(TokenKind::String(contents.to_string()))
            },
        }
    }

    fn extract_number(&mut self) -> Result<TokenKind> {
        self.advance_until(|n| !n.is_ascii_digit());

        // A trailing '.' is only part of the number when a digit follows it.
        if let Some(&'.') = self.src.peek() {
            if let Some(maybe_digit) = self.src.peek_nth(1) {
                if maybe_digit.is_ascii_digit() {
                    self.src.next();
                    self.lexeme_buffer.push('.');
                    self.advance_until(|n| !n.is_ascii_digit());
                }
            }
        }

        match self.lexeme_buffer.parse() {
            Err(_) => Err(Error::lexical(
                self.line,
                format!("Could not convert {} into a number.", self.lexeme_buffer)
            )),
            Ok(number) => Ok(TokenKind::Number(number)),
        }
    }

    fn extract_identifier(&mut self) -> Result<TokenKind> {
        self.advance_until(|n| !is_part_of_valid_identifier(*n));

        let text = self.lexeme_buffer.as_str();
        match KEYWORDS.get(text) {
            Some(token) => Ok(token.clone()),
            None => Ok(TokenKind::Identifier)
        }
    }

    fn advance_until_match(&mut self, c: char) {
        self.advance_until(|n| n == &c)
    }

    fn advance_until(&mut self, should_stop: impl Fn(&char) -> bool) {
        self.advance_until_for_each(should_stop, |_| {})
    }

    fn advance_until_match_for_each(
        &mut self,
        c: char,
        f: impl FnMut(char)
    ) {
        self.advance_until_for_each(|n| n == &c, f);
    }

    fn advance_until_for_each(
        &mut self,
        should_stop: impl Fn(&char) -> bool,
        mut f: impl FnMut(char)
    ) {
        while let Some(&next) = self.src.peek() {
            if should_stop(&next) { break }
            self.src.next();
            self.lexeme_buffer.push(next);
            f(next);
        }
    }
}

fn can_start_identifier(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_part_of_valid_identifier(c: char) -> bool {
    can_start_identifier(c) || c.is_ascii_digit()
}
