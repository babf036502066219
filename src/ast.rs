// ABOUTME: AST node types produced by the parser and consumed by the evaluator

use crate::error::Position;
use std::rc::Rc;

/// A position an AST node was parsed from, kept so evaluation errors can
/// report a source location even though evaluation itself walks the tree
/// rather than the token stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(line: usize, column: usize) -> Self {
        Span { line, column }
    }

    pub fn pos(self) -> Position {
        Position::from((self.line, self.column))
    }
}

pub type Block = Vec<Stmt>;

#[derive(Debug, Clone, PartialEq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
}

#[derive(Debug, Clone)]
pub enum Expr {
    IntLiteral(i64, Span),
    FloatLiteral(f64, Span),
    StrLiteral(String, Span),
    BoolLiteral(bool, Span),
    NullLiteral(Span),
    ArrayLiteral(Vec<Expr>, Span),
    Identifier(String, Span),
    This(Span),
    /// Unary `-x`, already desugared by the parser to `0 - x` per §4.4, so
    /// the evaluator never sees this variant for numeric negation — it
    /// remains only as the boolean-not case.
    Not(Box<Expr>, Span),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        span: Span,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
        span: Span,
    },
    Attribute {
        object: Box<Expr>,
        name: String,
        span: Span,
    },
    Call {
        name: String,
        args: Vec<Expr>,
        span: Span,
    },
    MethodCall {
        object: Box<Expr>,
        method: String,
        args: Vec<Expr>,
        span: Span,
    },
    /// `x++`: evaluates to the pre-increment value of the named place
    /// (identifier, attribute, or index) and increments it as a side
    /// effect.
    PostfixIncr(Box<Expr>, Span),
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::IntLiteral(_, s)
            | Expr::FloatLiteral(_, s)
            | Expr::StrLiteral(_, s)
            | Expr::BoolLiteral(_, s)
            | Expr::NullLiteral(s)
            | Expr::ArrayLiteral(_, s)
            | Expr::Identifier(_, s)
            | Expr::This(s)
            | Expr::Not(_, s)
            | Expr::PostfixIncr(_, s) => *s,
            Expr::Binary { span, .. }
            | Expr::Index { span, .. }
            | Expr::Attribute { span, .. }
            | Expr::Call { span, .. }
            | Expr::MethodCall { span, .. } => *span,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Expr(Expr),
    /// Assignment to a name, a dotted path, or an array element. `target`
    /// is always one of `Expr::Identifier`, `Expr::Attribute`, or
    /// `Expr::Index`; the parser never produces another shape here.
    Assign {
        target: Expr,
        value: Expr,
        span: Span,
    },
    If {
        condition: Expr,
        then_branch: Block,
        else_branch: Option<Block>,
        span: Span,
    },
    For {
        init: Option<Box<Stmt>>,
        condition: Expr,
        step: Option<Box<Stmt>>,
        body: Block,
        span: Span,
    },
    While {
        condition: Expr,
        body: Block,
        span: Span,
    },
    Return(Option<Expr>, Span),
    Break(Span),
    Continue(Span),
    Echo(Expr, Span),
    Try {
        body: Block,
        catch_name: String,
        catch_body: Block,
        span: Span,
    },
    Import {
        module: String,
        alias: Option<String>,
        span: Span,
    },
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Expr(e) => e.span(),
            Stmt::Assign { span, .. }
            | Stmt::If { span, .. }
            | Stmt::For { span, .. }
            | Stmt::While { span, .. }
            | Stmt::Return(_, span)
            | Stmt::Break(span)
            | Stmt::Continue(span)
            | Stmt::Echo(_, span)
            | Stmt::Try { span, .. }
            | Stmt::Import { span, .. } => *span,
        }
    }
}

/// The parameter list and body shared by top-level functions and methods.
#[derive(Debug, Clone)]
pub struct FunctionDescriptor {
    pub name: String,
    pub params: Vec<String>,
    pub body: Rc<Block>,
}
