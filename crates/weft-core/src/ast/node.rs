//! Declarative child nodes of a component body.

use crate::{
    ast::{Expr, TemplateLit},
    span::{Span, Spanned},
};

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    /// A plain string literal child.
    Text(Spanned<String>),
    Template(TemplateLit),
    If(NodeIf),
    For(NodeFor),
}

impl Node {
    pub fn span(&self) -> Span {
        match self {
            Node::Element(e) => e.span,
            Node::Text(t) => t.span(),
            Node::Template(t) => t.span,
            Node::If(i) => i.span,
            Node::For(f) => f.span,
        }
    }
}

/// `Tag(name: value, ...) { children }`; both the argument list and the
/// children block are optional.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: Spanned<String>,
    pub args: Vec<ElementArg>,
    pub children: Vec<Node>,
    pub span: Span,
}

/// A named (`class: "x"`) or positional element argument.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementArg {
    pub name: Option<Spanned<String>>,
    pub value: Expr,
}

/// A conditional child list. An `else if` chain nests a single [`Node::If`]
/// in `otherwise`.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeIf {
    pub cond: Expr,
    pub then: Vec<Node>,
    pub otherwise: Vec<Node>,
    pub span: Span,
}

/// A repeated child list: `for key, value := range iterable { ... }`.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeFor {
    pub key: Option<Spanned<String>>,
    pub value: Option<Spanned<String>>,
    pub iterable: Expr,
    pub children: Vec<Node>,
    pub span: Span,
}
