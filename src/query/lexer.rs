use std::fmt;

use serde::Serialize;

use crate::error::{DbError, DbResult};

/// Location of a token or value in the query text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    /// Zero-based character offset
    pub offset: usize,
    /// One-based line number
    pub line: usize,
    /// One-based column number
    pub column: usize,
}

impl Position {
    pub fn start() -> Self {
        Self {
            offset: 0,
            line: 1,
            column: 1,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Keywords
    As,

    // Identifiers
    Identifier(String),

    // Delimiters
    Comma,        // ,
    Colon,        // :
    LeftBrace,    // {
    RightBrace,   // }
    LeftBracket,  // [
    RightBracket, // ]
    LeftParen,    // (
    RightParen,   // )

    // Special
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::As => write!(f, "'as'"),
            Token::Identifier(name) => write!(f, "identifier \"{}\"", name),
            Token::Comma => write!(f, "','"),
            Token::Colon => write!(f, "':'"),
            Token::LeftBrace => write!(f, "'{{'"),
            Token::RightBrace => write!(f, "'}}'"),
            Token::LeftBracket => write!(f, "'['"),
            Token::RightBracket => write!(f, "']'"),
            Token::LeftParen => write!(f, "'('"),
            Token::RightParen => write!(f, "')'"),
            Token::Eof => write!(f, "end of input"),
        }
    }
}

/// A token together with the position it starts at
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub position: Position,
}

/// Characters that end a parameter value unless escaped.
pub fn is_structural(ch: char) -> bool {
    matches!(ch, '{' | '}' | '(' | ')' | '[' | ']' | ',')
}

/// Tokenizer with two modes: structural tokens via [`Lexer::next_token`] and
/// raw parameter values via [`Lexer::read_value`]. The parser picks the mode.
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    current_char: Option<char>,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        let chars: Vec<char> = input.chars().collect();
        let current_char = chars.first().copied();

        Self {
            input: chars,
            position: 0,
            current_char,
            line: 1,
            column: 1,
        }
    }

    fn advance(&mut self) {
        if self.current_char == Some('\n') {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        self.position += 1;
        self.current_char = self.input.get(self.position).copied();
    }

    /// Current location of the lexer
    pub fn location(&self) -> Position {
        Position {
            offset: self.position,
            line: self.line,
            column: self.column,
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_identifier(&mut self) -> Token {
        let mut ident = String::new();

        while let Some(ch) = self.current_char {
            if ch.is_alphanumeric() || ch == '_' {
                ident.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        match ident.as_str() {
            "as" => Token::As,
            _ => Token::Identifier(ident),
        }
    }

    pub fn next_token(&mut self) -> DbResult<Spanned> {
        self.skip_whitespace();
        let position = self.location();

        let token = match self.current_char {
            None => Token::Eof,

            Some(ch) if ch.is_alphabetic() || ch == '_' => {
                return Ok(Spanned {
                    token: self.read_identifier(),
                    position,
                });
            }

            Some(',') => {
                self.advance();
                Token::Comma
            }
            Some(':') => {
                self.advance();
                Token::Colon
            }
            Some('{') => {
                self.advance();
                Token::LeftBrace
            }
            Some('}') => {
                self.advance();
                Token::RightBrace
            }
            Some('[') => {
                self.advance();
                Token::LeftBracket
            }
            Some(']') => {
                self.advance();
                Token::RightBracket
            }
            Some('(') => {
                self.advance();
                Token::LeftParen
            }
            Some(')') => {
                self.advance();
                Token::RightParen
            }

            Some(ch) => {
                return Err(DbError::syntax(
                    format!("Unexpected character '{}'", ch),
                    position,
                ));
            }
        };

        Ok(Spanned { token, position })
    }

    /// Read a parameter value starting at the current position.
    ///
    /// A backslash makes the next character literal. Any unescaped structural
    /// character ends the value and is left for [`Lexer::next_token`].
    /// Unescaped whitespace around the value is dropped.
    pub fn read_value(&mut self) -> DbResult<String> {
        self.skip_whitespace();

        let mut value = String::new();
        let mut significant_len = 0;

        while let Some(ch) = self.current_char {
            if ch == '\\' {
                let escape_position = self.location();
                self.advance();
                match self.current_char {
                    Some(escaped) => {
                        value.push(escaped);
                        significant_len = value.len();
                        self.advance();
                    }
                    None => {
                        return Err(DbError::syntax(
                            "Unterminated escape at end of input",
                            escape_position,
                        ));
                    }
                }
            } else if is_structural(ch) {
                break;
            } else {
                value.push(ch);
                if !ch.is_whitespace() {
                    significant_len = value.len();
                }
                self.advance();
            }
        }

        value.truncate(significant_len);
        Ok(value)
    }

    /// Tokenize the whole input in structural mode
    pub fn tokenize(&mut self) -> DbResult<Vec<Spanned>> {
        let mut tokens = Vec::new();

        loop {
            let spanned = self.next_token()?;
            let done = spanned.token == Token::Eof;
            tokens.push(spanned);
            if done {
                break;
            }
        }

        Ok(tokens)
    }
}
