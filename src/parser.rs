use crate::ast::*;
use crate::lexer::{tokenize, LexError, Lexeme, Token};
use crate::stack::ensure_sufficient_stack;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error("{line}: Expected {expected}, found '{found}'")]
    Expected {
        line: usize,
        expected: &'static str,
        found: String,
    },
    #[error("{line}: Unexpected end of input, expected {expected}")]
    UnexpectedEof { line: usize, expected: &'static str },
    #[error("{line}: Expression too deeply nested")]
    TooDeep { line: usize },
    #[error("Missing program")]
    MissingProgram,
}

impl ParseError {
    pub fn line(&self) -> usize {
        match self {
            ParseError::Lex(LexError::Unrecognized { line, .. })
            | ParseError::Lex(LexError::IntegerRange { line, .. })
            | ParseError::Expected { line, .. }
            | ParseError::UnexpectedEof { line, .. }
            | ParseError::TooDeep { line } => *line,
            ParseError::MissingProgram => 0,
        }
    }
}

/// Recursive-descent parser.
///
/// ```text
/// Prog        := Stmt ';' { Stmt ';' }
/// Stmt        := 'if' Expr 'then' Stmt | 'print' Expr | Expr
/// Expr        := LogicExpr [ '=' Expr ]
/// LogicExpr   := CompareExpr { ('&&' | '||') CompareExpr }
/// CompareExpr := AddExpr { ('==' | '!=' | '<' | '<=' | '>' | '>=') AddExpr }
/// AddExpr     := MulExpr { ('+' | '-') MulExpr }
/// MulExpr     := Factor { ('*' | '/') Factor }
/// Factor      := '-' Primary | Primary
/// Primary     := IDENT | ICONST | SCONST | 'true' | 'false' | '(' Expr ')'
/// ```
///
/// `if`-chains, assignment chains and parentheses recurse; more than
/// `MAX_NESTING` open levels is a `TooDeep` error.
pub struct Parser {
    lexemes: Vec<Lexeme>,
    pos: usize,
    depth: usize,
}

/// Deepest nesting of statements and parenthesized expressions accepted.
pub const MAX_NESTING: usize = 1000;

impl Parser {
    pub fn new(source: &str) -> Result<Self, ParseError> {
        Ok(Parser {
            lexemes: tokenize(source)?,
            pos: 0,
            depth: 0,
        })
    }

    fn peek(&self) -> Option<&Token> {
        self.lexemes.get(self.pos).map(|l| &l.token)
    }

    fn advance(&mut self) -> Option<Lexeme> {
        let lexeme = self.lexemes.get(self.pos).cloned();
        self.pos += 1;
        lexeme
    }

    fn check(&self, expected: &Token) -> bool {
        matches!(
            self.peek(),
            Some(t) if std::mem::discriminant(t) == std::mem::discriminant(expected)
        )
    }

    /// Line of the next lexeme, or of the last one at end of input.
    fn line(&self) -> usize {
        self.lexemes
            .get(self.pos)
            .or_else(|| self.lexemes.last())
            .map_or(1, |l| l.line)
    }

    fn error(&self, expected: &'static str) -> ParseError {
        match self.lexemes.get(self.pos) {
            Some(l) => ParseError::Expected {
                line: l.line,
                expected,
                found: l.token.to_string(),
            },
            None => ParseError::UnexpectedEof {
                line: self.line(),
                expected,
            },
        }
    }

    fn expect(&mut self, expected: Token, what: &'static str) -> Result<Lexeme, ParseError> {
        if self.check(&expected) {
            self.advance().ok_or_else(|| self.error(what))
        } else {
            Err(self.error(what))
        }
    }

    /// Run one nested production, one level deeper.
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.depth >= MAX_NESTING {
            return Err(ParseError::TooDeep { line: self.line() });
        }
        self.depth += 1;
        let result = ensure_sufficient_stack(|| parse(self));
        self.depth -= 1;
        result
    }

    /// Parse a whole program into a right-nested chain of `StmtList` nodes.
    pub fn parse_program(&mut self) -> Result<Node, ParseError> {
        let mut stmts = Vec::new();
        while self.peek().is_some() {
            stmts.push(self.parse_stmt()?);
            self.expect(Token::Semicolon, "';'")?;
        }
        tracing::debug!(statements = stmts.len(), "parsed program");

        stmts
            .into_iter()
            .rev()
            .fold(None, |next, stmt| Some(Node::stmt_list(stmt, next)))
            .ok_or(ParseError::MissingProgram)
    }

    fn parse_stmt(&mut self) -> Result<Node, ParseError> {
        self.nested(Parser::parse_stmt_inner)
    }

    fn parse_stmt_inner(&mut self) -> Result<Node, ParseError> {
        if self.check(&Token::If) {
            let line = self.line();
            self.advance();
            let cond = self.parse_expr()?;
            self.expect(Token::Then, "'then'")?;
            let then = self.parse_stmt()?;
            return Ok(Node::if_statement(line, cond, then));
        }

        if self.check(&Token::Print) {
            let line = self.line();
            self.advance();
            let expr = self.parse_expr()?;
            return Ok(Node::print(line, expr));
        }

        self.parse_expr()
    }

    pub fn parse_expr(&mut self) -> Result<Node, ParseError> {
        self.nested(Parser::parse_assign)
    }

    fn parse_assign(&mut self) -> Result<Node, ParseError> {
        let lhs = self.parse_logic()?;
        if self.check(&Token::Assign) {
            let line = self.line();
            self.advance();
            let rhs = self.parse_expr()?;
            return Ok(Node::assignment(line, lhs, rhs));
        }
        Ok(lhs)
    }

    fn parse_logic(&mut self) -> Result<Node, ParseError> {
        let mut lhs = self.parse_compare()?;
        loop {
            let kind = match self.peek() {
                Some(Token::And) => NodeKind::LogicAndExpr,
                Some(Token::Or) => NodeKind::LogicOrExpr,
                _ => return Ok(lhs),
            };
            let line = self.line();
            self.advance();
            let rhs = self.parse_compare()?;
            lhs = Node::binary(kind, line, lhs, rhs);
        }
    }

    fn parse_compare(&mut self) -> Result<Node, ParseError> {
        let mut lhs = self.parse_add()?;
        loop {
            let kind = match self.peek() {
                Some(Token::Eq) => NodeKind::EqExpr,
                Some(Token::NEq) => NodeKind::NEqExpr,
                Some(Token::Lt) => NodeKind::LtExpr,
                Some(Token::LEq) => NodeKind::LEqExpr,
                Some(Token::Gt) => NodeKind::GtExpr,
                Some(Token::GEq) => NodeKind::GEqExpr,
                _ => return Ok(lhs),
            };
            let line = self.line();
            self.advance();
            let rhs = self.parse_add()?;
            lhs = Node::binary(kind, line, lhs, rhs);
        }
    }

    fn parse_add(&mut self) -> Result<Node, ParseError> {
        let mut lhs = self.parse_mul()?;
        loop {
            let kind = match self.peek() {
                Some(Token::Plus) => NodeKind::PlusExpr,
                Some(Token::Minus) => NodeKind::MinusExpr,
                _ => return Ok(lhs),
            };
            let line = self.line();
            self.advance();
            let rhs = self.parse_mul()?;
            lhs = Node::binary(kind, line, lhs, rhs);
        }
    }

    fn parse_mul(&mut self) -> Result<Node, ParseError> {
        let mut lhs = self.parse_factor()?;
        loop {
            let kind = match self.peek() {
                Some(Token::Star) => NodeKind::TimesExpr,
                Some(Token::Slash) => NodeKind::DivideExpr,
                _ => return Ok(lhs),
            };
            let line = self.line();
            self.advance();
            let rhs = self.parse_factor()?;
            lhs = Node::binary(kind, line, lhs, rhs);
        }
    }

    fn parse_factor(&mut self) -> Result<Node, ParseError> {
        if self.check(&Token::Minus) {
            // -P is (-1) * P
            let line = self.line();
            self.advance();
            let operand = self.parse_primary()?;
            return Ok(Node::binary(
                NodeKind::TimesExpr,
                line,
                Node::iconst(line, -1),
                operand,
            ));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Node, ParseError> {
        let lexeme = match self.lexemes.get(self.pos) {
            Some(l) => l.clone(),
            None => return Err(self.error("primary expression")),
        };

        let node = match &lexeme.token {
            Token::Ident(_) => Node::ident(&lexeme),
            Token::IConst(n) => Node::iconst(lexeme.line, *n),
            Token::SConst(_) => Node::sconst(&lexeme),
            Token::True => Node::bool_const(lexeme.line, true),
            Token::False => Node::bool_const(lexeme.line, false),
            Token::LParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(Token::RParen, "')'")?;
                return Ok(expr);
            }
            _ => return Err(self.error("primary expression")),
        };
        self.advance();
        Ok(node)
    }
}

/// Parse `source` into the root of its syntax tree.
pub fn parse(source: &str) -> Result<Node, ParseError> {
    Parser::new(source)?.parse_program()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_stmt(source: &str) -> Node {
        let mut root = parse(source).expect("parse failed");
        assert_eq!(root.kind, NodeKind::StmtList);
        *root.left.take().expect("empty statement list")
    }

    #[test]
    fn statements_chain_right() {
        let root = parse("a = 1; b = 2; print a;").unwrap();
        assert_eq!(root.kind, NodeKind::StmtList);
        let second = root.right().unwrap();
        assert_eq!(second.kind, NodeKind::StmtList);
        let third = second.right().unwrap();
        assert_eq!(third.left().unwrap().kind, NodeKind::PrintStatement);
        assert!(third.right().is_none());
    }

    #[test]
    fn precedence_of_times_over_plus() {
        let stmt = first_stmt("print 1 + 2 * 3;");
        let expr = stmt.left().unwrap();
        assert_eq!(expr.kind, NodeKind::PlusExpr);
        assert_eq!(expr.right().unwrap().kind, NodeKind::TimesExpr);
    }

    #[test]
    fn binary_operators_are_left_associative() {
        let stmt = first_stmt("print 10 - 4 - 3;");
        let expr = stmt.left().unwrap();
        assert_eq!(expr.kind, NodeKind::MinusExpr);
        assert_eq!(expr.left().unwrap().kind, NodeKind::MinusExpr);
        assert_eq!(expr.right().unwrap().kind, NodeKind::IConst(3));
    }

    #[test]
    fn assignment_is_right_associative() {
        let stmt = first_stmt("a = b = 3;");
        assert_eq!(stmt.kind, NodeKind::Assignment);
        assert!(stmt.left().unwrap().is_ident());
        assert_eq!(stmt.right().unwrap().kind, NodeKind::Assignment);
    }

    #[test]
    fn non_identifier_assignment_target_parses() {
        let stmt = first_stmt("1 = 2;");
        assert_eq!(stmt.kind, NodeKind::Assignment);
        assert_eq!(stmt.left().unwrap().kind, NodeKind::IConst(1));
    }

    #[test]
    fn if_then_carries_if_line() {
        let stmt = first_stmt("\n\nif x < 2 then\n print x;");
        assert_eq!(stmt.kind, NodeKind::IfStatement);
        assert_eq!(stmt.line(), 3);
        assert_eq!(stmt.left().unwrap().kind, NodeKind::LtExpr);
        assert_eq!(stmt.right().unwrap().kind, NodeKind::PrintStatement);
        assert_eq!(stmt.right().unwrap().line(), 4);
    }

    #[test]
    fn unary_minus_is_times_negative_one() {
        let stmt = first_stmt("print -x;");
        let expr = stmt.left().unwrap();
        assert_eq!(expr.kind, NodeKind::TimesExpr);
        assert_eq!(expr.left().unwrap().kind, NodeKind::IConst(-1));
        assert_eq!(expr.right().unwrap().id(), Some("x"));
    }

    #[test]
    fn parentheses_group() {
        let stmt = first_stmt("print (1 + 2) * 3;");
        let expr = stmt.left().unwrap();
        assert_eq!(expr.kind, NodeKind::TimesExpr);
        assert_eq!(expr.left().unwrap().kind, NodeKind::PlusExpr);
    }

    #[test]
    fn logic_binds_looser_than_comparison() {
        let stmt = first_stmt("print 1 < 2 && 3 > 4 || true;");
        let expr = stmt.left().unwrap();
        assert_eq!(expr.kind, NodeKind::LogicOrExpr);
        assert_eq!(expr.left().unwrap().kind, NodeKind::LogicAndExpr);
    }

    #[test]
    fn missing_semicolon() {
        let err = parse("print 1\nprint 2;").unwrap_err();
        assert_eq!(
            err,
            ParseError::Expected {
                line: 2,
                expected: "';'",
                found: "print".to_string(),
            }
        );
        assert_eq!(err.to_string(), "2: Expected ';', found 'print'");
    }

    #[test]
    fn missing_then() {
        let err = parse("if true print 1;").unwrap_err();
        assert!(matches!(err, ParseError::Expected { expected: "'then'", .. }));
    }

    #[test]
    fn unexpected_end_of_input() {
        let err = parse("x = ").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnexpectedEof {
                line: 1,
                expected: "primary expression",
            }
        );
    }

    #[test]
    fn unclosed_paren() {
        let err = parse("print (1 + 2;").unwrap_err();
        assert!(matches!(err, ParseError::Expected { expected: "')'", .. }));
    }

    #[test]
    fn empty_program() {
        assert_eq!(parse("  # nothing here\n").unwrap_err(), ParseError::MissingProgram);
    }

    #[test]
    fn nesting_within_limit_parses() {
        let depth = MAX_NESTING / 2;
        let source = format!("print {}1{};", "(".repeat(depth), ")".repeat(depth));
        let stmt = first_stmt(&source);
        assert_eq!(stmt.left().unwrap().kind, NodeKind::IConst(1));
    }

    #[test]
    fn deep_parentheses_are_rejected() {
        let source = format!("print {}1{};", "(".repeat(100_000), ")".repeat(100_000));
        let err = parse(&source).unwrap_err();
        assert_eq!(err, ParseError::TooDeep { line: 1 });
        assert_eq!(err.to_string(), "1: Expression too deeply nested");
    }

    #[test]
    fn deep_if_chain_is_rejected() {
        let source = format!("x = 1;\n{}print x;", "if true then ".repeat(50_000));
        let err = parse(&source).unwrap_err();
        assert!(matches!(err, ParseError::TooDeep { .. }));
        assert_eq!(err.line(), 2);
    }

    #[test]
    fn long_flat_expression_is_not_nesting() {
        let source = format!("print 1{};", " + 1".repeat(200_000));
        let stmt = first_stmt(&source);
        assert_eq!(stmt.left().unwrap().kind, NodeKind::PlusExpr);
    }

    #[test]
    fn lex_errors_pass_through() {
        let err = parse("x = 1;\ny = @;").unwrap_err();
        assert!(matches!(err, ParseError::Lex(LexError::Unrecognized { line: 2, .. })));
        assert_eq!(err.line(), 2);
    }
}
