//! Top-level declarations: components, parameters and plain types.

use crate::{
    ast::{Node, Stmt, TypeDesc, VarDecl},
    span::{Span, Spanned},
};

/// A function parameter. `variadic` is only legal on the last parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Spanned<String>,
    pub ty: Spanned<TypeDesc>,
    pub variadic: bool,
}

/// The body of a component, split into its three ordered parts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Body {
    /// `var` declarations at the top level of the body. In a renderable
    /// unit these become persistent state.
    pub vars: Vec<VarDecl>,
    pub stmts: Vec<Stmt>,
    pub nodes: Vec<Node>,
}

/// A `func` declaration at the top level of a unit.
///
/// With a non-empty result list this is a renderable unit; otherwise it is a
/// plain helper function.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub name: Spanned<String>,
    pub params: Vec<Param>,
    pub results: Vec<Spanned<TypeDesc>>,
    pub body: Body,
    /// Set by a leading `@props` directive.
    pub auto_props: bool,
    pub span: Span,
}

impl Component {
    pub fn is_renderable(&self) -> bool {
        !self.results.is_empty()
    }

    /// Parameters whose type is a channel.
    pub fn channel_params(&self) -> impl Iterator<Item = &Param> {
        self.params.iter().filter(|p| p.ty.is_chan())
    }
}

/// `type Name struct { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDef {
    pub name: Spanned<String>,
    pub fields: Vec<Field>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: Spanned<String>,
    pub ty: Spanned<TypeDesc>,
}
