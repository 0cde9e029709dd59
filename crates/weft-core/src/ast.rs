//! Syntax tree for Weft compilation units.
//!
//! The tree is built once by the parser and never mutated afterwards. Every
//! node owns its children; there are no back references.

mod decl;
mod expr;
mod gpu;
mod node;
mod stmt;
mod types;

pub use decl::{Body, Component, Field, Param, TypeDef};
pub use expr::{
    BinaryOp, CallOrSelector, CompositeElement, CompositeLit, Expr, Fragment, FuncLit, IndexExpr,
    IndexKind, Literal, MakeExpr, Primary, ReceiveExpr, SelectorBase, TemplateLit, UnaryExpr,
    UnaryOp,
};
pub use gpu::{Decorator, GpuBinding, GpuField, GpuFunction, GpuParam, GpuResult, GpuStruct};
pub use node::{Element, ElementArg, Node, NodeFor, NodeIf};
pub use stmt::{
    AssignOp, AssignStmt, Block, BranchKind, BranchStmt, ElseBranch, ForHeader, ForStmt, IfStmt,
    ReturnStmt, SendStmt, Stmt, VarDecl,
};
pub use types::TypeDesc;

use crate::span::Spanned;

/// One parsed source file.
#[derive(Debug, Clone, PartialEq)]
pub struct CompilationUnit {
    pub package: Spanned<String>,
    pub imports: Vec<Spanned<String>>,
    pub types: Vec<TypeDef>,
    pub components: Vec<Component>,
    pub gpu_structs: Vec<GpuStruct>,
    pub gpu_bindings: Vec<GpuBinding>,
    pub gpu_functions: Vec<GpuFunction>,
}

impl CompilationUnit {
    /// Returns `true` when the unit declares anything for the shader side.
    pub fn has_gpu(&self) -> bool {
        !(self.gpu_structs.is_empty()
            && self.gpu_bindings.is_empty()
            && self.gpu_functions.is_empty())
    }

    pub fn component(&self, name: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.name.inner() == name)
    }
}
