// ABOUTME: Pratt-style statement/expression parser turning a token stream into an AST

use crate::ast::{BinaryOp, Block, Expr, Span, Stmt};
use crate::error::HplError;
use crate::lexer::{Lexer, Token, TokenKind};

/// Tokenizes `src` (one arrow-function body) and parses it into a block of
/// statements, the entry point §4.3 describes for every class method and
/// top-level function.
pub fn parse_body(src: &str) -> Result<Block, HplError> {
    let tokens = Lexer::new(src).tokenize()?;
    Parser::new(tokens).parse_program()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0 }
    }

    fn peek(&self) -> &TokenKind {
        &self.tokens[self.pos].kind
    }

    fn peek_token(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn at(&self, kind: &TokenKind) -> bool {
        self.peek() == kind
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, HplError> {
        if self.peek() == &kind {
            Ok(self.advance())
        } else {
            let tok = self.peek_token().clone();
            Err(HplError::syntactic(
                kind.to_string(),
                tok.kind.to_string(),
                tok.line,
                tok.column,
            ))
        }
    }

    fn expect_ident(&mut self) -> Result<String, HplError> {
        match self.peek().clone() {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(name)
            }
            other => {
                let tok = self.peek_token().clone();
                Err(HplError::syntactic(
                    "identifier",
                    other.to_string(),
                    tok.line,
                    tok.column,
                ))
            }
        }
    }

    fn span(&self) -> Span {
        let tok = self.peek_token();
        Span::new(tok.line, tok.column)
    }

    // ---- top level ----

    /// The whole function body. Unlike a nested block, this has no
    /// delimiter of its own to match (the arrow literal's braces were
    /// already stripped before lexing) — so a stray leading `INDENT` (the
    /// body's first line starting indented) or trailing `DEDENT`s (emitted
    /// back down to column 0 at end-of-input) are discarded rather than
    /// treated as a block boundary.
    fn parse_program(&mut self) -> Result<Block, HplError> {
        let mut stmts = Vec::new();
        loop {
            while self.at(&TokenKind::Semicolon)
                || self.at(&TokenKind::Indent)
                || self.at(&TokenKind::Dedent)
            {
                self.advance();
            }
            if self.at(&TokenKind::Eof) {
                break;
            }
            stmts.push(self.parse_stmt()?);
        }
        Ok(stmts)
    }

    /// Parses statements, each optionally followed by one or more `;`,
    /// until the next token matches one of `terminators` (which is left
    /// unconsumed).
    fn parse_stmts_until(&mut self, terminators: &[TokenKind]) -> Result<Block, HplError> {
        let mut stmts = Vec::new();
        while !terminators.contains(self.peek()) {
            while self.at(&TokenKind::Semicolon) {
                self.advance();
            }
            if terminators.contains(self.peek()) {
                break;
            }
            stmts.push(self.parse_stmt()?);
            while self.at(&TokenKind::Semicolon) {
                self.advance();
            }
        }
        Ok(stmts)
    }

    /// A block, dispatching on its leading token per §4.3: `INDENT` runs
    /// until the matching `DEDENT`; `{` runs until `}` (tolerating a
    /// synthetic indent/dedent pair the lexer may have emitted around it);
    /// `:` either recurses into an indent block or accepts a single bare
    /// statement.
    fn parse_block(&mut self) -> Result<Block, HplError> {
        match self.peek().clone() {
            TokenKind::Indent => {
                self.advance();
                let block = self.parse_stmts_until(&[TokenKind::Dedent])?;
                self.expect(TokenKind::Dedent)?;
                Ok(block)
            }
            TokenKind::LBrace => {
                self.advance();
                if self.at(&TokenKind::Indent) {
                    self.advance();
                }
                let block = self.parse_stmts_until(&[TokenKind::RBrace, TokenKind::Dedent])?;
                if self.at(&TokenKind::Dedent) {
                    self.advance();
                }
                self.expect(TokenKind::RBrace)?;
                Ok(block)
            }
            TokenKind::Colon => {
                self.advance();
                if self.at(&TokenKind::Indent) {
                    self.advance();
                    let block = self.parse_stmts_until(&[TokenKind::Dedent])?;
                    self.expect(TokenKind::Dedent)?;
                    Ok(block)
                } else {
                    Ok(vec![self.parse_stmt()?])
                }
            }
            other => {
                let tok = self.peek_token().clone();
                Err(HplError::syntactic(
                    "a block ('{', ':', or indent)",
                    other.to_string(),
                    tok.line,
                    tok.column,
                ))
            }
        }
    }

    // ---- statements ----

    fn parse_stmt(&mut self) -> Result<Stmt, HplError> {
        match self.peek().clone() {
            TokenKind::If => self.parse_if(),
            TokenKind::For => self.parse_for(),
            TokenKind::While => self.parse_while(),
            TokenKind::Try => self.parse_try(),
            TokenKind::Import => self.parse_import(),
            TokenKind::Return => {
                let span = self.span();
                self.advance();
                let value = if self.at(&TokenKind::Semicolon)
                    || self.at(&TokenKind::Dedent)
                    || self.at(&TokenKind::RBrace)
                    || self.at(&TokenKind::Eof)
                {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                Ok(Stmt::Return(value, span))
            }
            TokenKind::Break => {
                let span = self.span();
                self.advance();
                Ok(Stmt::Break(span))
            }
            TokenKind::Continue => {
                let span = self.span();
                self.advance();
                Ok(Stmt::Continue(span))
            }
            TokenKind::Echo => {
                let span = self.span();
                self.advance();
                let value = self.parse_expr()?;
                Ok(Stmt::Echo(value, span))
            }
            _ => self.parse_assign_or_expr_stmt(),
        }
    }

    fn parse_if(&mut self) -> Result<Stmt, HplError> {
        let span = self.span();
        self.advance(); // if
        self.expect(TokenKind::LParen)?;
        let condition = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        let then_branch = self.parse_block()?;
        let else_branch = if self.at(&TokenKind::Else) {
            self.advance();
            Some(self.parse_block()?)
        } else {
            None
        };
        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
            span,
        })
    }

    fn parse_for(&mut self) -> Result<Stmt, HplError> {
        let span = self.span();
        self.advance(); // for
        self.expect(TokenKind::LParen)?;
        let init = if self.at(&TokenKind::Semicolon) {
            None
        } else {
            Some(Box::new(self.parse_assign_or_expr_stmt()?))
        };
        self.expect(TokenKind::Semicolon)?;
        let condition = self.parse_expr()?;
        self.expect(TokenKind::Semicolon)?;
        let step = if self.at(&TokenKind::RParen) {
            None
        } else {
            Some(Box::new(self.parse_assign_or_expr_stmt()?))
        };
        self.expect(TokenKind::RParen)?;
        let body = self.parse_block()?;
        Ok(Stmt::For {
            init,
            condition,
            step,
            body,
            span,
        })
    }

    fn parse_while(&mut self) -> Result<Stmt, HplError> {
        let span = self.span();
        self.advance(); // while
        self.expect(TokenKind::LParen)?;
        let condition = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        let body = self.parse_block()?;
        Ok(Stmt::While {
            condition,
            body,
            span,
        })
    }

    fn parse_try(&mut self) -> Result<Stmt, HplError> {
        let span = self.span();
        self.advance(); // try
        let body = self.parse_block()?;
        self.expect(TokenKind::Catch)?;
        self.expect(TokenKind::LParen)?;
        let catch_name = self.expect_ident()?;
        self.expect(TokenKind::RParen)?;
        let catch_body = self.parse_block()?;
        Ok(Stmt::Try {
            body,
            catch_name,
            catch_body,
            span,
        })
    }

    fn parse_import(&mut self) -> Result<Stmt, HplError> {
        let span = self.span();
        self.advance(); // import
        let module = self.expect_ident()?;
        let alias = if self.at(&TokenKind::As) {
            self.advance();
            Some(self.expect_ident()?)
        } else {
            None
        };
        Ok(Stmt::Import {
            module,
            alias,
            span,
        })
    }

    /// Parses an assignable postfix chain; if it's followed by `=`, that
    /// chain becomes an assignment target (plain name, dotted path, or
    /// array index, per §4.3's "Assignment / compound-target assignment").
    /// Otherwise the chain stands alone as a bare expression statement
    /// (covers function/method calls and `x++`).
    fn parse_assign_or_expr_stmt(&mut self) -> Result<Stmt, HplError> {
        let span = self.span();
        let expr = self.parse_expr()?;
        if self.at(&TokenKind::Eq) {
            self.advance();
            let value = self.parse_expr()?;
            match expr {
                Expr::Identifier(..) | Expr::Attribute { .. } | Expr::Index { .. } => {
                    Ok(Stmt::Assign {
                        target: expr,
                        value,
                        span,
                    })
                }
                _ => Err(HplError::syntactic(
                    "an assignable target (name, '.attr', or '[index]')",
                    "a non-assignable expression",
                    span.line,
                    span.column,
                )),
            }
        } else {
            Ok(Stmt::Expr(expr))
        }
    }

    // ---- expressions: precedence climbing, low to high ----

    fn parse_expr(&mut self) -> Result<Expr, HplError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, HplError> {
        let mut left = self.parse_and()?;
        while self.at(&TokenKind::OrOr) {
            let span = self.span();
            self.advance();
            let right = self.parse_and()?;
            left = Expr::Binary {
                op: BinaryOp::Or,
                left: Box::new(left),
                right: Box::new(right),
                span,
            };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, HplError> {
        let mut left = self.parse_equality()?;
        while self.at(&TokenKind::AndAnd) {
            let span = self.span();
            self.advance();
            let right = self.parse_equality()?;
            left = Expr::Binary {
                op: BinaryOp::And,
                left: Box::new(left),
                right: Box::new(right),
                span,
            };
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr, HplError> {
        let mut left = self.parse_comparison()?;
        loop {
            let op = match self.peek() {
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::NotEq => BinaryOp::NotEq,
                _ => break,
            };
            let span = self.span();
            self.advance();
            let right = self.parse_comparison()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                span,
            };
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr, HplError> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::LtEq => BinaryOp::LtEq,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::GtEq => BinaryOp::GtEq,
                _ => break,
            };
            let span = self.span();
            self.advance();
            let right = self.parse_additive()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                span,
            };
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr, HplError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            let span = self.span();
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                span,
            };
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, HplError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            let span = self.span();
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                span,
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, HplError> {
        match self.peek() {
            TokenKind::Bang => {
                let span = self.span();
                self.advance();
                let operand = self.parse_unary()?;
                Ok(Expr::Not(Box::new(operand), span))
            }
            TokenKind::Minus => {
                // Desugared to `0 - x` per §4.4.
                let span = self.span();
                self.advance();
                let operand = self.parse_unary()?;
                Ok(Expr::Binary {
                    op: BinaryOp::Sub,
                    left: Box::new(Expr::IntLiteral(0, span)),
                    right: Box::new(operand),
                    span,
                })
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Result<Expr, HplError> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek().clone() {
                TokenKind::Dot => {
                    let span = self.span();
                    self.advance();
                    let name = self.expect_ident()?;
                    if self.at(&TokenKind::LParen) {
                        let args = self.parse_args()?;
                        expr = Expr::MethodCall {
                            object: Box::new(expr),
                            method: name,
                            args,
                            span,
                        };
                    } else {
                        expr = Expr::Attribute {
                            object: Box::new(expr),
                            name,
                            span,
                        };
                    }
                }
                TokenKind::LBracket => {
                    let span = self.span();
                    self.advance();
                    let index = self.parse_expr()?;
                    self.expect(TokenKind::RBracket)?;
                    expr = Expr::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                        span,
                    };
                }
                TokenKind::PlusPlus => {
                    let span = self.span();
                    self.advance();
                    expr = Expr::PostfixIncr(Box::new(expr), span);
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>, HplError> {
        self.expect(TokenKind::LParen)?;
        let mut args = Vec::new();
        if !self.at(&TokenKind::RParen) {
            args.push(self.parse_expr()?);
            while self.at(&TokenKind::Comma) {
                self.advance();
                args.push(self.parse_expr()?);
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(args)
    }

    fn parse_primary(&mut self) -> Result<Expr, HplError> {
        let span = self.span();
        match self.peek().clone() {
            TokenKind::Int(n) => {
                self.advance();
                Ok(Expr::IntLiteral(n, span))
            }
            TokenKind::Float(n) => {
                self.advance();
                Ok(Expr::FloatLiteral(n, span))
            }
            TokenKind::Str(s) => {
                self.advance();
                Ok(Expr::StrLiteral(s, span))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::BoolLiteral(true, span))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::BoolLiteral(false, span))
            }
            TokenKind::Null => {
                self.advance();
                Ok(Expr::NullLiteral(span))
            }
            TokenKind::This => {
                self.advance();
                Ok(Expr::This(span))
            }
            TokenKind::Ident(name) => {
                self.advance();
                if self.at(&TokenKind::LParen) {
                    let args = self.parse_args()?;
                    Ok(Expr::Call { name, args, span })
                } else {
                    Ok(Expr::Identifier(name, span))
                }
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::LBracket => {
                self.advance();
                let mut elements = Vec::new();
                if !self.at(&TokenKind::RBracket) {
                    elements.push(self.parse_expr()?);
                    while self.at(&TokenKind::Comma) {
                        self.advance();
                        elements.push(self.parse_expr()?);
                    }
                }
                self.expect(TokenKind::RBracket)?;
                Ok(Expr::ArrayLiteral(elements, span))
            }
            other => Err(HplError::syntactic(
                "an expression",
                other.to_string(),
                span.line,
                span.column,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Block {
        parse_body(src).unwrap()
    }

    #[test]
    fn parses_arithmetic_with_precedence() {
        let block = parse("return 1 + 2 * 3;");
        match &block[0] {
            Stmt::Return(Some(Expr::Binary { op: BinaryOp::Add, right, .. }), _) => {
                assert!(matches!(**right, Expr::Binary { op: BinaryOp::Mul, .. }));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn parses_brace_block_if_else() {
        let block = parse("if (x == 1) { echo \"a\" } else { echo \"b\" }");
        assert_eq!(block.len(), 1);
        assert!(matches!(block[0], Stmt::If { else_branch: Some(_), .. }));
    }

    #[test]
    fn parses_colon_single_statement_block() {
        let block = parse("if (x == 1): echo \"a\"");
        match &block[0] {
            Stmt::If { then_branch, .. } => assert_eq!(then_branch.len(), 1),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn parses_colon_indent_block() {
        let src = "while (i < 3):\n    echo i\n    i++\n";
        let block = parse(src);
        match &block[0] {
            Stmt::While { body, .. } => assert_eq!(body.len(), 2),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn parses_indented_top_level_body_with_no_enclosing_block_keyword() {
        let src = "\n    x = 1\n    y = 2\n    return x + y\n";
        let block = parse(src);
        assert_eq!(block.len(), 3);
        assert!(matches!(block[2], Stmt::Return(Some(_), _)));
    }

    #[test]
    fn parses_dotted_assignment_target() {
        let block = parse("this.count = this.count + 1;");
        match &block[0] {
            Stmt::Assign { target, .. } => assert!(matches!(target, Expr::Attribute { .. })),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn parses_method_call_vs_property_access() {
        let block = parse("a.b.c(1, 2);");
        match &block[0] {
            Stmt::Expr(Expr::MethodCall { object, method, args, .. }) => {
                assert_eq!(method, "c");
                assert_eq!(args.len(), 2);
                assert!(matches!(**object, Expr::Attribute { .. }));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn parses_array_index_chain() {
        let block = parse("return arr[0][1];");
        assert!(matches!(&block[0], Stmt::Return(Some(Expr::Index { .. }), _)));
    }

    #[test]
    fn parses_for_loop_header() {
        let block = parse("for (i = 0; i < 10; i++) { echo i }");
        assert!(matches!(block[0], Stmt::For { .. }));
    }

    #[test]
    fn parses_try_catch() {
        let block = parse("try { x = 1/0 } catch (e) { echo e }");
        match &block[0] {
            Stmt::Try { catch_name, .. } => assert_eq!(catch_name, "e"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn unary_minus_desugars_to_subtraction_from_zero() {
        let block = parse("return -x;");
        match &block[0] {
            Stmt::Return(Some(Expr::Binary { op: BinaryOp::Sub, left, .. }), _) => {
                assert!(matches!(**left, Expr::IntLiteral(0, _)));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn import_with_alias() {
        let block = parse("import math as m;");
        match &block[0] {
            Stmt::Import { module, alias, .. } => {
                assert_eq!(module, "math");
                assert_eq!(alias.as_deref(), Some("m"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn syntax_error_reports_position() {
        let err = parse_body("return 1 +").unwrap_err();
        assert!(matches!(err, HplError::Syntactic { .. }));
    }
}
