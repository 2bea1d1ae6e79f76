//! Parser for the query language.
//!
//! Recursive descent over a [`Lexer`] that is driven token by token, so the
//! parser can switch the lexer into value mode right after a parameter's `:`.
//!
//! ```text
//! Query     := Call
//! Call      := Ident '(' ParamList? ')' Alias? '{' Body '}'
//! ParamList := Param (',' Param)* ','?
//! Param     := Ident ':' Value
//! Alias     := 'as' Ident
//! Body      := Item (',' Item)* ','?
//! Item      := Ident ('(' ParamList? ')')? Alias? ('{' Body '}')?
//! ```


use super::ast::{AstNode, NodeKind, Parameters};
use super::lexer::{Lexer, Spanned, Token};
use crate::error::{DbError, DbResult};

/// Deepest selection nesting accepted before the parser gives up
pub const MAX_DEPTH: usize = 128;

/// Parser for queries
pub struct Parser {
    lexer: Lexer,
    current: Spanned,
    depth: usize,
}

impl Parser {
    /// Create a new parser from an input string
    pub fn new(input: &str) -> DbResult<Self> {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token()?;

        Ok(Self {
            lexer,
            current,
            depth: 0,
        })
    }

    fn current_token(&self) -> &Token {
        &self.current.token
    }

    /// Lex the next structural token
    fn advance(&mut self) -> DbResult<()> {
        self.current = self.lexer.next_token()?;
        Ok(())
    }

    fn unexpected(&self, expected: &str) -> DbError {
        DbError::syntax(
            format!("Expected {}, got {}", expected, self.current_token()),
            self.current.position,
        )
    }

    /// Expect a specific token and advance, or return an error
    fn expect(&mut self, expected: Token) -> DbResult<()> {
        if self.current_token() == &expected {
            self.advance()
        } else {
            Err(self.unexpected(&expected.to_string()))
        }
    }

    fn expect_identifier(&mut self, what: &str) -> DbResult<String> {
        match self.current_token() {
            Token::Identifier(name) => {
                let name = name.clone();
                self.advance()?;
                Ok(name)
            }
            _ => Err(self.unexpected(what)),
        }
    }

    /// Parse a complete query into its Root node
    pub fn parse(&mut self) -> DbResult<AstNode> {
        let name = self.expect_identifier("root call name")?;
        if self.current_token() != &Token::LeftParen {
            return Err(self.unexpected("'(' after root call name"));
        }
        let parameters = self.parse_parameters()?;
        let alias = self.parse_alias()?;
        let children = self.parse_body()?;

        if self.current_token() != &Token::Eof {
            return Err(self.unexpected("end of input after query"));
        }

        let mut root = AstNode::root(name, parameters, children);
        root.alias = alias;
        Ok(root)
    }

    /// Parse `'(' ParamList? ')'`; the current token must be `(`
    fn parse_parameters(&mut self) -> DbResult<Parameters> {
        self.expect(Token::LeftParen)?;
        let mut parameters = Parameters::new();

        loop {
            match self.current_token() {
                Token::RightParen => {
                    self.advance()?;
                    break;
                }
                Token::Identifier(name) => {
                    let name = name.clone();
                    let name_position = self.current.position;
                    self.advance()?;
                    if self.current_token() != &Token::Colon {
                        return Err(self.unexpected("':' after parameter name"));
                    }

                    // The lexer sits right after ':', read the raw value from there.
                    let value = self.lexer.read_value()?;
                    if parameters.contains_key(&name) {
                        return Err(DbError::syntax(
                            format!("Duplicate parameter \"{}\"", name),
                            name_position,
                        ));
                    }
                    parameters.insert(name.clone(), value);

                    self.advance()?;
                    match self.current_token() {
                        Token::Comma => self.advance()?,
                        Token::RightParen => {
                            self.advance()?;
                            break;
                        }
                        _ => {
                            return Err(self.unexpected(&format!(
                                "',' or ')' after value of parameter \"{}\"",
                                name
                            )))
                        }
                    }
                }
                _ => return Err(self.unexpected("parameter name or ')'")),
            }
        }

        Ok(parameters)
    }

    fn parse_alias(&mut self) -> DbResult<Option<String>> {
        if self.current_token() == &Token::As {
            self.advance()?;
            Ok(Some(self.expect_identifier("alias after 'as'")?))
        } else {
            Ok(None)
        }
    }

    /// Parse `'{' Body '}'`; at least one item is required
    fn parse_body(&mut self) -> DbResult<Vec<AstNode>> {
        if self.current_token() != &Token::LeftBrace {
            return Err(self.unexpected("'{'"));
        }

        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(DbError::syntax(
                format!("Selections nested deeper than {} levels", MAX_DEPTH),
                self.current.position,
            ));
        }
        self.advance()?;

        let mut children = Vec::new();
        loop {
            match self.current_token() {
                Token::RightBrace => {
                    if children.is_empty() {
                        return Err(DbError::syntax(
                            "Selection body must contain at least one field",
                            self.current.position,
                        ));
                    }
                    self.advance()?;
                    break;
                }
                Token::Identifier(_) => {
                    children.push(self.parse_item()?);
                    match self.current_token() {
                        Token::Comma => self.advance()?,
                        Token::RightBrace => {}
                        _ => return Err(self.unexpected("',' or '}' after field")),
                    }
                }
                _ => return Err(self.unexpected("field name or '}'")),
            }
        }

        self.depth -= 1;
        Ok(children)
    }

    /// Parse a body item: a nested call if it has parameters or a body, else a leaf
    fn parse_item(&mut self) -> DbResult<AstNode> {
        let name = self.expect_identifier("field name")?;

        let has_parameters = self.current_token() == &Token::LeftParen;
        let parameters = if has_parameters {
            self.parse_parameters()?
        } else {
            Parameters::new()
        };
        let alias = self.parse_alias()?;

        if self.current_token() == &Token::LeftBrace {
            let children = self.parse_body()?;
            return Ok(AstNode {
                kind: NodeKind::Node,
                name,
                alias,
                parameters,
                children,
            });
        }

        if has_parameters {
            return Err(self.unexpected(&format!("'{{' after parameters of \"{}\"", name)));
        }

        Ok(AstNode {
            kind: NodeKind::Leaf,
            name,
            alias,
            parameters,
            children: Vec::new(),
        })
    }
}

/// Parse a query string into its Root node
pub fn parse(input: &str) -> DbResult<AstNode> {
    let mut parser = Parser::new(input)?;
    parser.parse()
}
