//! Statements and blocks.

use crate::{
    ast::{Expr, TypeDesc},
    span::{Span, Spanned},
};

/// A braced statement list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Var(VarDecl),
    Assign(AssignStmt),
    Send(SendStmt),
    Return(ReturnStmt),
    If(IfStmt),
    For(ForStmt),
    Branch(BranchStmt),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Var(v) => v.span,
            Stmt::Assign(a) => a.span,
            Stmt::Send(s) => s.span,
            Stmt::Return(r) => r.span,
            Stmt::If(i) => i.span,
            Stmt::For(f) => f.span,
            Stmt::Branch(b) => b.span,
        }
    }
}

/// `var a, b T = x, y`; the type and the values are each optional.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub names: Vec<Spanned<String>>,
    pub ty: Option<Spanned<TypeDesc>>,
    pub values: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    /// `:=`
    Define,
    /// `=`
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    /// `++`
    Inc,
    /// `--`
    Dec,
}

impl AssignOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignOp::Define => ":=",
            AssignOp::Assign => "=",
            AssignOp::AddAssign => "+=",
            AssignOp::SubAssign => "-=",
            AssignOp::MulAssign => "*=",
            AssignOp::DivAssign => "/=",
            AssignOp::Inc => "++",
            AssignOp::Dec => "--",
        }
    }

    /// Returns `true` for the operator that introduces new names.
    pub fn is_declaring(&self) -> bool {
        matches!(self, AssignOp::Define)
    }

    /// Returns `true` for the postfix operators that take no right-hand side.
    pub fn is_postfix(&self) -> bool {
        matches!(self, AssignOp::Inc | AssignOp::Dec)
    }
}

/// The unified assignment / expression statement.
///
/// Without an operator this is an expression statement and `targets` holds
/// the single expression. With an operator, `targets` are the left-hand side.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignStmt {
    pub targets: Vec<Expr>,
    pub op: Option<Spanned<AssignOp>>,
    pub values: Vec<Expr>,
    pub span: Span,
}

/// `ch <- value`
#[derive(Debug, Clone, PartialEq)]
pub struct SendStmt {
    pub channel: Expr,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStmt {
    pub values: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub init: Option<Box<Stmt>>,
    pub cond: Expr,
    pub then: Block,
    pub otherwise: Option<ElseBranch>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElseBranch {
    If(Box<IfStmt>),
    Block(Block),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForStmt {
    pub header: ForHeader,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForHeader {
    /// `for { }`
    Infinite,
    /// `for cond { }`
    Cond(Expr),
    /// `for init; cond; post { }`
    Classic {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        post: Option<Box<Stmt>>,
    },
    /// `for key, value := range iterable { }`
    Range {
        key: Option<Spanned<String>>,
        value: Option<Spanned<String>>,
        iterable: Expr,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchKind {
    Break,
    Continue,
}

impl BranchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BranchKind::Break => "break",
            BranchKind::Continue => "continue",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BranchStmt {
    pub kind: BranchKind,
    pub span: Span,
}
