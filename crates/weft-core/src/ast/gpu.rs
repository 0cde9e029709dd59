//! GPU declarations.
//!
//! Decorators are stored as written; their meaning (address spaces, stages,
//! builtins) is resolved by the shader generator.

use crate::{
    ast::{Block, Expr, TypeDesc},
    span::{Span, Spanned},
};

/// `@name` or `@name(args...)`
#[derive(Debug, Clone, PartialEq)]
pub struct Decorator {
    pub name: Spanned<String>,
    pub args: Vec<Expr>,
    pub span: Span,
}

/// A decorated `type Name struct { ... }`.
#[derive(Debug, Clone, PartialEq)]
pub struct GpuStruct {
    pub decorators: Vec<Decorator>,
    pub name: Spanned<String>,
    pub fields: Vec<GpuField>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GpuField {
    pub decorators: Vec<Decorator>,
    pub name: Spanned<String>,
    pub ty: Spanned<TypeDesc>,
}

/// A decorated top-level `var name Type`.
#[derive(Debug, Clone, PartialEq)]
pub struct GpuBinding {
    pub decorators: Vec<Decorator>,
    pub name: Spanned<String>,
    pub ty: Spanned<TypeDesc>,
    pub span: Span,
}

/// A decorated function compiled to shader code.
#[derive(Debug, Clone, PartialEq)]
pub struct GpuFunction {
    pub decorators: Vec<Decorator>,
    pub name: Spanned<String>,
    pub params: Vec<GpuParam>,
    pub result: Option<GpuResult>,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GpuParam {
    pub decorators: Vec<Decorator>,
    pub name: Spanned<String>,
    pub ty: Spanned<TypeDesc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GpuResult {
    pub decorators: Vec<Decorator>,
    pub ty: Spanned<TypeDesc>,
}
