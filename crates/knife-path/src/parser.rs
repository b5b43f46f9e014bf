//! Recursive-descent parser for paths and their index expressions

use tracing::trace;

use crate::error::PathError;
use crate::fold::{self, Constant};
use crate::lexer::{Lexer, Token, TokenKind};

/// Go keywords; none of them can name a member
const KEYWORDS: &[&str] = &[
    "break", "case", "chan", "const", "continue", "default", "defer", "else",
    "fallthrough", "for", "func", "go", "goto", "if", "import", "interface", "map",
    "package", "range", "return", "select", "struct", "switch", "type", "var",
];

/// One navigation step of a parsed path
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// `.Name`
    Select(String),
    /// `[expr]`, folded to a constant
    Index(Constant),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnaryOp {
    Plus,
    Neg,
    Not,
    Complement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    And,
    AndNot,
    Add,
    Sub,
    Or,
    Xor,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    LogicalAnd,
    LogicalOr,
}

impl BinaryOp {
    fn from_token(kind: &TokenKind) -> Option<(Self, u8)> {
        let op = match kind {
            TokenKind::Star => (BinaryOp::Mul, 5),
            TokenKind::Slash => (BinaryOp::Div, 5),
            TokenKind::Percent => (BinaryOp::Rem, 5),
            TokenKind::Shl => (BinaryOp::Shl, 5),
            TokenKind::Shr => (BinaryOp::Shr, 5),
            TokenKind::Amp => (BinaryOp::And, 5),
            TokenKind::AndNot => (BinaryOp::AndNot, 5),
            TokenKind::Plus => (BinaryOp::Add, 4),
            TokenKind::Minus => (BinaryOp::Sub, 4),
            TokenKind::Pipe => (BinaryOp::Or, 4),
            TokenKind::Caret => (BinaryOp::Xor, 4),
            TokenKind::EqEq => (BinaryOp::Eq, 3),
            TokenKind::NotEq => (BinaryOp::Ne, 3),
            TokenKind::Lt => (BinaryOp::Lt, 3),
            TokenKind::LtEq => (BinaryOp::Le, 3),
            TokenKind::Gt => (BinaryOp::Gt, 3),
            TokenKind::GtEq => (BinaryOp::Ge, 3),
            TokenKind::AndAnd => (BinaryOp::LogicalAnd, 2),
            TokenKind::OrOr => (BinaryOp::LogicalOr, 1),
            _ => return None,
        };
        Some(op)
    }

    pub(crate) fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::And => "&",
            BinaryOp::AndNot => "&^",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Or => "|",
            BinaryOp::Xor => "^",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::LogicalAnd => "&&",
            BinaryOp::LogicalOr => "||",
        }
    }
}

/// Constant expression inside brackets
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Int(String),
    Float(String),
    Rune(char),
    String(String),
    Bool(bool),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

pub(crate) struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    pub(crate) fn new(source: &str) -> Result<Self, PathError> {
        let tokens = Lexer::new(source).tokenize()?;
        Ok(Self { tokens, current: 0 })
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.current += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, PathError> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            let token = self.peek();
            Err(PathError::parse(
                token.offset,
                format!("expected {}, found {}", what, describe(&token.kind)),
            ))
        }
    }

    /// `IDENT ( "." IDENT | "[" expr "]" )*`
    pub(crate) fn parse_path(mut self) -> Result<Vec<Step>, PathError> {
        let mut steps = vec![Step::Select(self.member()?)];
        loop {
            let token = self.advance();
            match token.kind {
                TokenKind::Dot => steps.push(Step::Select(self.member()?)),
                TokenKind::LBracket => {
                    let expr = self.expression(1)?;
                    self.expect(TokenKind::RBracket, "']'")?;
                    steps.push(Step::Index(fold::fold_expr(&expr)?));
                }
                TokenKind::LParen => {
                    return Err(PathError::unsupported("function calls are not allowed"))
                }
                TokenKind::Eof => break,
                other => {
                    return Err(PathError::parse(
                        token.offset,
                        format!("unexpected {}", describe(&other)),
                    ))
                }
            }
        }
        trace!(steps = steps.len(), "parsed path");
        Ok(steps)
    }

    /// A standalone constant expression
    pub(crate) fn parse_constant(mut self) -> Result<Expr, PathError> {
        let expr = self.expression(1)?;
        self.expect(TokenKind::Eof, "end of expression")?;
        Ok(expr)
    }

    fn member(&mut self) -> Result<String, PathError> {
        let token = self.advance();
        match token.kind {
            TokenKind::Ident(name) if KEYWORDS.contains(&name.as_str()) => Err(PathError::parse(
                token.offset,
                format!("unexpected keyword {}", name),
            )),
            TokenKind::Ident(name) => Ok(name),
            other => Err(PathError::parse(
                token.offset,
                format!("expected identifier, found {}", describe(&other)),
            )),
        }
    }

    /// Precedence climbing over Go's five binary levels
    fn expression(&mut self, min_prec: u8) -> Result<Expr, PathError> {
        let mut left = self.unary()?;
        while let Some((op, prec)) = BinaryOp::from_token(&self.peek().kind) {
            if prec < min_prec {
                break;
            }
            self.advance();
            let right = self.expression(prec + 1)?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr, PathError> {
        let op = match self.peek().kind {
            TokenKind::Plus => UnaryOp::Plus,
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Caret => UnaryOp::Complement,
            _ => return self.primary(),
        };
        self.advance();
        Ok(Expr::Unary(op, Box::new(self.unary()?)))
    }

    fn primary(&mut self) -> Result<Expr, PathError> {
        let token = self.advance();
        let expr = match token.kind {
            TokenKind::Int(text) => Expr::Int(text),
            TokenKind::Float(text) => Expr::Float(text),
            TokenKind::Imag(text) => {
                return Err(PathError::unsupported(format!(
                    "imaginary constant {}i",
                    text
                )))
            }
            TokenKind::Rune(c) => Expr::Rune(c),
            TokenKind::String(s) => Expr::String(s),
            TokenKind::Ident(name) => match name.as_str() {
                "true" => Expr::Bool(true),
                "false" => Expr::Bool(false),
                _ => {
                    return Err(PathError::unsupported(format!(
                        "identifier {} in index expression",
                        name
                    )))
                }
            },
            TokenKind::LParen => {
                let inner = self.expression(1)?;
                self.expect(TokenKind::RParen, "')'")?;
                inner
            }
            other => {
                return Err(PathError::parse(
                    token.offset,
                    format!("expected operand, found {}", describe(&other)),
                ))
            }
        };

        match self.peek().kind {
            TokenKind::LParen => Err(PathError::unsupported(
                "function calls are not allowed in index expressions",
            )),
            TokenKind::Dot | TokenKind::LBracket => Err(PathError::unsupported(
                "index expressions must be constant",
            )),
            _ => Ok(expr),
        }
    }
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Ident(name) => format!("identifier {}", name),
        TokenKind::Int(text) | TokenKind::Float(text) => format!("literal {}", text),
        TokenKind::Imag(text) => format!("literal {}i", text),
        TokenKind::Rune(c) => format!("literal {:?}", c),
        TokenKind::String(s) => format!("literal {:?}", s),
        TokenKind::Eof => "end of path".to_string(),
        other => format!("{:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steps(src: &str) -> Vec<Step> {
        Parser::new(src).unwrap().parse_path().unwrap()
    }

    #[test]
    fn test_chained_steps() {
        assert_eq!(
            steps(r#"A.B[0].C["k"][1]"#),
            vec![
                Step::Select("A".into()),
                Step::Select("B".into()),
                Step::Index(Constant::Int(0)),
                Step::Select("C".into()),
                Step::Index(Constant::String("k".into())),
                Step::Index(Constant::Int(1)),
            ]
        );
    }

    #[test]
    fn test_index_is_folded() {
        assert_eq!(steps("N[1-1]"), steps("N[0]"));
        assert_eq!(steps("N[(0)]"), steps("N[0]"));
        assert_eq!(steps("N[100 > 0]"), steps("N[true]"));
        assert_eq!(steps("N[1 + 2 * 3]")[1], Step::Index(Constant::Int(7)));
    }

    #[test]
    fn test_rejects_non_paths() {
        let parse = |src: &str| Parser::new(src).and_then(|p| p.parse_path());
        assert!(matches!(parse(r#"import "fmt""#), Err(PathError::Parse { .. })));
        assert!(matches!(parse("Call()"), Err(PathError::UnsupportedExpr(_))));
        assert!(matches!(parse("N[1 + f()]"), Err(PathError::UnsupportedExpr(_))));
        assert!(matches!(parse("N[T]"), Err(PathError::UnsupportedExpr(_))));
        assert!(matches!(parse("N[-T]"), Err(PathError::UnsupportedExpr(_))));
        assert!(matches!(parse("N[0"), Err(PathError::Parse { .. })));
        assert!(matches!(parse("A..B"), Err(PathError::Parse { .. })));
        assert!(matches!(parse(""), Err(PathError::Parse { .. })));
        assert!(matches!(parse("N[2i]"), Err(PathError::UnsupportedExpr(_))));
    }
}
