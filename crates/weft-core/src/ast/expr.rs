//! Expressions.
//!
//! Binary expressions are kept as a flat left-to-right chain of operands;
//! no precedence is applied. Generators re-emit the chain in source order
//! and leave precedence to the downstream compiler.

use crate::{
    ast::{Block, Param, TypeDesc},
    span::{Span, Spanned},
};

/// An operand followed by zero or more `(operator, operand)` pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub head: Primary,
    pub tail: Vec<(Spanned<BinaryOp>, Primary)>,
    pub span: Span,
}

impl Expr {
    /// An expression made of a single operand.
    pub fn single(primary: Primary) -> Self {
        let span = primary.span();
        Self {
            head: primary,
            tail: Vec::new(),
            span,
        }
    }

    /// The operand when the expression has no binary operators.
    pub fn as_primary(&self) -> Option<&Primary> {
        self.tail.is_empty().then_some(&self.head)
    }

    /// The identifier when the whole expression is a bare name.
    pub fn as_ident(&self) -> Option<&Spanned<String>> {
        match self.as_primary()? {
            Primary::CallOrSelector(cs) => cs.as_ident(),
            _ => None,
        }
    }

    /// Returns `true` when the whole expression is a call.
    pub fn is_call(&self) -> bool {
        matches!(
            self.as_primary(),
            Some(Primary::CallOrSelector(cs)) if cs.is_call()
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    AndNot,
}

impl BinaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::AndNot => "&^",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
    Ref,
    Deref,
    BitNot,
}

impl UnaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Plus => "+",
            UnaryOp::Not => "!",
            UnaryOp::Ref => "&",
            UnaryOp::Deref => "*",
            UnaryOp::BitNot => "^",
        }
    }
}

/// A single operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Primary {
    Literal(Literal),
    Composite(CompositeLit),
    Make(MakeExpr),
    Index(IndexExpr),
    CallOrSelector(CallOrSelector),
    FuncLit(FuncLit),
    Receive(ReceiveExpr),
    Unary(UnaryExpr),
    Paren(Box<Expr>),
}

impl Primary {
    pub fn span(&self) -> Span {
        match self {
            Primary::Literal(lit) => lit.span(),
            Primary::Composite(c) => c.span,
            Primary::Make(m) => m.span,
            Primary::Index(i) => i.span,
            Primary::CallOrSelector(cs) => cs.span,
            Primary::FuncLit(f) => f.span,
            Primary::Receive(r) => r.span,
            Primary::Unary(u) => u.span,
            Primary::Paren(e) => e.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Integer literal, kept in its source spelling.
    Int(Spanned<String>),
    /// Float literal, kept in its source spelling.
    Float(Spanned<String>),
    /// Double-quoted string with escapes resolved.
    String(Spanned<String>),
    Template(TemplateLit),
}

impl Literal {
    pub fn span(&self) -> Span {
        match self {
            Literal::Int(s) | Literal::Float(s) | Literal::String(s) => s.span(),
            Literal::Template(t) => t.span,
        }
    }
}

/// A backtick template string split into literal and interpolated parts.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateLit {
    pub fragments: Vec<Fragment>,
    pub span: Span,
}

impl TemplateLit {
    /// Channel receives appearing directly in interpolations.
    pub fn received_channels(&self) -> impl Iterator<Item = &Spanned<String>> {
        self.fragments.iter().filter_map(|fragment| match fragment {
            Fragment::Expr(expr) => match expr.as_primary() {
                Some(Primary::Receive(recv)) => Some(&recv.channel),
                _ => None,
            },
            Fragment::Text(_) => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    Text(String),
    Expr(Expr),
}

/// `Type{a, b}` or `Type{x: a, y: b}`.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeLit {
    pub ty: Spanned<TypeDesc>,
    pub elements: Vec<CompositeElement>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompositeElement {
    pub key: Option<Spanned<String>>,
    pub value: Expr,
}

/// `make(chan T)`, `make(chan T, n)`, `make([]T, len, cap)`.
#[derive(Debug, Clone, PartialEq)]
pub struct MakeExpr {
    pub ty: Spanned<TypeDesc>,
    pub args: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexExpr {
    pub target: Box<Primary>,
    pub index: IndexKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndexKind {
    /// `a[i]`
    Single(Box<Expr>),
    /// `a[lo:hi]`, either bound optional.
    Slice {
        low: Option<Box<Expr>>,
        high: Option<Box<Expr>>,
    },
}

/// A selector path that may end in a call.
///
/// `a`, `a.b.c` and `a.b.c(x)` all parse to this node; the presence of
/// `args` is the only thing distinguishing a call from a selector.
#[derive(Debug, Clone, PartialEq)]
pub struct CallOrSelector {
    pub base: SelectorBase,
    pub path: Vec<Spanned<String>>,
    pub args: Option<Vec<Expr>>,
    pub span: Span,
}

impl CallOrSelector {
    /// A bare identifier reference.
    pub fn ident(name: Spanned<String>) -> Self {
        let span = name.span();
        Self {
            base: SelectorBase::Ident(name),
            path: Vec::new(),
            args: None,
            span,
        }
    }

    pub fn is_call(&self) -> bool {
        self.args.is_some()
    }

    /// The identifier when this node is just a name: no path, no call.
    pub fn as_ident(&self) -> Option<&Spanned<String>> {
        match &self.base {
            SelectorBase::Ident(name) if self.path.is_empty() && self.args.is_none() => {
                Some(name)
            }
            _ => None,
        }
    }

    /// The base identifier, if the chain starts with one.
    pub fn base_ident(&self) -> Option<&Spanned<String>> {
        match &self.base {
            SelectorBase::Ident(name) => Some(name),
            SelectorBase::Expr(_) => None,
        }
    }

    /// The dotted name (`a.b.c`) when the chain starts with an identifier.
    pub fn qualified_name(&self) -> Option<String> {
        let base = self.base_ident()?;
        let mut name = base.inner().clone();
        for segment in &self.path {
            name.push('.');
            name.push_str(segment);
        }
        Some(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectorBase {
    Ident(Spanned<String>),
    /// A chain continued from a non-identifier operand, e.g. `f(x).y`.
    Expr(Box<Primary>),
}

/// `func(params) results { body }`
#[derive(Debug, Clone, PartialEq)]
pub struct FuncLit {
    pub params: Vec<Param>,
    pub results: Vec<Spanned<TypeDesc>>,
    pub body: Block,
    pub span: Span,
}

/// `<-ch`
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiveExpr {
    pub channel: Spanned<String>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub operand: Box<Primary>,
    pub span: Span,
}
