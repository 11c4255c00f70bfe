//! Tokenizer and recursive-descent parser shared by the calculator and the
//! equation solver.
//!
//! Grammar (lowest to highest precedence):
//!
//! ```text
//! expression := term (('+' | '-') term)*
//! term       := unary (('*' | '/') unary | <implicit> power)*
//! unary      := ('-' | '+') unary | power
//! power      := primary ('^' unary)?
//! primary    := NUMBER | IDENT | '(' expression ')'
//! ```
//!
//! `^` is right-associative and binds tighter than unary minus, so `-2^2`
//! is `-4`. Implicit multiplication (`2x`, `3(x + 1)`) is only enabled for
//! algebras that ask for it.

use super::ToolExecutionError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Token {
    Number(f64),
    Ident(char),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
}

impl Token {
    fn starts_primary(&self) -> bool {
        matches!(self, Token::Number(_) | Token::Ident(_) | Token::LParen)
    }

    fn describe(&self) -> String {
        match self {
            Token::Number(n) => format!("number {}", n),
            Token::Ident(c) => format!("'{}'", c),
            Token::Plus => "'+'".to_string(),
            Token::Minus => "'-'".to_string(),
            Token::Star => "'*'".to_string(),
            Token::Slash => "'/'".to_string(),
            Token::Caret => "'^'".to_string(),
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
        }
    }
}

/// Failure while parsing or evaluating an expression
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ExprError {
    /// The text does not match the grammar
    Syntax(String),
    /// The algebra rejected an operation
    Tool(ToolExecutionError),
}

impl From<ToolExecutionError> for ExprError {
    fn from(err: ToolExecutionError) -> Self {
        ExprError::Tool(err)
    }
}

/// Values an expression can evaluate to
pub(crate) trait Algebra: Sized {
    const IMPLICIT_MULTIPLICATION: bool;

    fn number(value: f64) -> Result<Self, ExprError>;
    fn variable(name: char) -> Result<Self, ExprError>;
    fn add(self, rhs: Self) -> Result<Self, ExprError>;
    fn sub(self, rhs: Self) -> Result<Self, ExprError>;
    fn mul(self, rhs: Self) -> Result<Self, ExprError>;
    fn div(self, rhs: Self) -> Result<Self, ExprError>;
    fn pow(self, rhs: Self) -> Result<Self, ExprError>;
    fn neg(self) -> Self;
}

/// Split input into tokens
pub(crate) fn tokenize(input: &str) -> Result<Vec<Token>, ExprError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => {
                i += 1;
            }
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().collect();
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| ExprError::Syntax(format!("invalid number '{}'", literal)))?;
                tokens.push(Token::Number(value));
            }
            c if c.is_alphabetic() => {
                tokens.push(Token::Ident(c));
                i += 1;
            }
            _ => {
                let token = match c {
                    '+' => Token::Plus,
                    '-' | '\u{2212}' => Token::Minus,
                    '*' | '\u{00d7}' => Token::Star,
                    '/' | '\u{00f7}' => Token::Slash,
                    '^' => Token::Caret,
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    other => {
                        return Err(ExprError::Syntax(format!(
                            "unexpected character '{}' at position {}",
                            other,
                            i + 1
                        )));
                    }
                };
                tokens.push(token);
                i += 1;
            }
        }
    }

    Ok(tokens)
}

/// Parse and evaluate `input` in algebra `A`
pub(crate) fn parse<A: Algebra>(input: &str) -> Result<A, ExprError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(ExprError::Syntax("empty expression".to_string()));
    }

    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expression::<A>()?;

    match parser.peek() {
        None => Ok(value),
        Some(token) => Err(ExprError::Syntax(format!("unexpected {}", token.describe()))),
    }
}

/// Nesting limit for parentheses, signs and exponents
const MAX_DEPTH: usize = 256;

struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn descend(&mut self) -> Result<(), ExprError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ExprError::Syntax("expression nested too deeply".to_string()));
        }
        Ok(())
    }

    fn ascend(&mut self) {
        self.depth -= 1;
    }

    fn expression<A: Algebra>(&mut self) -> Result<A, ExprError> {
        let mut acc = self.term::<A>()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.advance();
                    acc = acc.add(self.term::<A>()?)?;
                }
                Some(Token::Minus) => {
                    self.advance();
                    acc = acc.sub(self.term::<A>()?)?;
                }
                _ => return Ok(acc),
            }
        }
    }

    fn term<A: Algebra>(&mut self) -> Result<A, ExprError> {
        let mut acc = self.unary::<A>()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.advance();
                    acc = acc.mul(self.unary::<A>()?)?;
                }
                Some(Token::Slash) => {
                    self.advance();
                    acc = acc.div(self.unary::<A>()?)?;
                }
                Some(token) if A::IMPLICIT_MULTIPLICATION && token.starts_primary() => {
                    acc = acc.mul(self.power::<A>()?)?;
                }
                _ => return Ok(acc),
            }
        }
    }

    fn unary<A: Algebra>(&mut self) -> Result<A, ExprError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.advance();
                self.descend()?;
                let operand = self.unary::<A>()?;
                self.ascend();
                Ok(operand.neg())
            }
            Some(Token::Plus) => {
                self.advance();
                self.descend()?;
                let operand = self.unary::<A>()?;
                self.ascend();
                Ok(operand)
            }
            _ => self.power::<A>(),
        }
    }

    fn power<A: Algebra>(&mut self) -> Result<A, ExprError> {
        let base = self.primary::<A>()?;
        if self.peek() == Some(Token::Caret) {
            self.advance();
            self.descend()?;
            let exponent = self.unary::<A>()?;
            self.ascend();
            return base.pow(exponent);
        }
        Ok(base)
    }

    fn primary<A: Algebra>(&mut self) -> Result<A, ExprError> {
        match self.advance() {
            Some(Token::Number(n)) => A::number(n),
            Some(Token::Ident(name)) => A::variable(name),
            Some(Token::LParen) => {
                self.descend()?;
                let inner = self.expression::<A>()?;
                self.ascend();
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    Some(token) => Err(ExprError::Syntax(format!("expected ')', found {}", token.describe()))),
                    None => Err(ExprError::Syntax("unbalanced parentheses".to_string())),
                }
            }
            Some(token) => Err(ExprError::Syntax(format!("unexpected {}", token.describe()))),
            None => Err(ExprError::Syntax("unexpected end of input".to_string())),
        }
    }
}
