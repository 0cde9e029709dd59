//! Read-only traversal of the syntax tree.
//!
//! [`Visitor`] has one method per node kind. Every method defaults to the
//! matching `walk_*` function, which visits the node's children in
//! declaration order and skips absent optional children. Implementors
//! override the methods they care about and call the `walk_*` function to
//! keep descending.
//!
//! [`Accept`] gives every node type an `accept` entry point that dispatches
//! to its visitor method.

use crate::{
    ast::{
        AssignStmt, Block, Body, BranchStmt, CallOrSelector, CompilationUnit, Component,
        CompositeLit, Decorator, Element, ElementArg, ElseBranch, Expr, Field, ForHeader, ForStmt,
        Fragment, FuncLit, GpuBinding, GpuField, GpuFunction, GpuParam, GpuStruct, IfStmt,
        IndexExpr, IndexKind, Literal, MakeExpr, Node, NodeFor, NodeIf, Param, Primary,
        ReceiveExpr, ReturnStmt, SelectorBase, SendStmt, Stmt, TemplateLit, TypeDef, TypeDesc,
        UnaryExpr, VarDecl,
    },
    span::Spanned,
};

/// Visitor over the syntax tree. See the module documentation.
pub trait Visitor {
    fn visit_unit(&mut self, unit: &CompilationUnit) {
        walk_unit(self, unit);
    }

    fn visit_import(&mut self, _path: &Spanned<String>) {}

    fn visit_type_def(&mut self, def: &TypeDef) {
        walk_type_def(self, def);
    }

    fn visit_field(&mut self, field: &Field) {
        self.visit_type(&field.ty);
    }

    fn visit_component(&mut self, component: &Component) {
        walk_component(self, component);
    }

    fn visit_param(&mut self, param: &Param) {
        self.visit_type(&param.ty);
    }

    fn visit_type(&mut self, _ty: &Spanned<TypeDesc>) {}

    fn visit_body(&mut self, body: &Body) {
        walk_body(self, body);
    }

    fn visit_block(&mut self, block: &Block) {
        walk_block(self, block);
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_var_decl(&mut self, decl: &VarDecl) {
        walk_var_decl(self, decl);
    }

    fn visit_assign(&mut self, stmt: &AssignStmt) {
        walk_assign(self, stmt);
    }

    fn visit_send(&mut self, stmt: &SendStmt) {
        self.visit_expr(&stmt.channel);
        self.visit_expr(&stmt.value);
    }

    fn visit_return(&mut self, stmt: &ReturnStmt) {
        for value in &stmt.values {
            self.visit_expr(value);
        }
    }

    fn visit_if(&mut self, stmt: &IfStmt) {
        walk_if(self, stmt);
    }

    fn visit_for(&mut self, stmt: &ForStmt) {
        walk_for(self, stmt);
    }

    fn visit_branch(&mut self, _stmt: &BranchStmt) {}

    fn visit_node(&mut self, node: &Node) {
        walk_node(self, node);
    }

    fn visit_element(&mut self, element: &Element) {
        walk_element(self, element);
    }

    fn visit_element_arg(&mut self, arg: &ElementArg) {
        self.visit_expr(&arg.value);
    }

    fn visit_text(&mut self, _text: &Spanned<String>) {}

    fn visit_node_if(&mut self, node: &NodeIf) {
        walk_node_if(self, node);
    }

    fn visit_node_for(&mut self, node: &NodeFor) {
        walk_node_for(self, node);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr);
    }

    fn visit_primary(&mut self, primary: &Primary) {
        walk_primary(self, primary);
    }

    fn visit_literal(&mut self, literal: &Literal) {
        if let Literal::Template(template) = literal {
            self.visit_template(template);
        }
    }

    fn visit_template(&mut self, template: &TemplateLit) {
        walk_template(self, template);
    }

    fn visit_composite(&mut self, composite: &CompositeLit) {
        self.visit_type(&composite.ty);
        for element in &composite.elements {
            self.visit_expr(&element.value);
        }
    }

    fn visit_make(&mut self, make: &MakeExpr) {
        self.visit_type(&make.ty);
        for arg in &make.args {
            self.visit_expr(arg);
        }
    }

    fn visit_index(&mut self, index: &IndexExpr) {
        walk_index(self, index);
    }

    fn visit_call_or_selector(&mut self, call: &CallOrSelector) {
        walk_call_or_selector(self, call);
    }

    fn visit_func_lit(&mut self, func: &FuncLit) {
        walk_func_lit(self, func);
    }

    fn visit_receive(&mut self, _recv: &ReceiveExpr) {}

    fn visit_unary(&mut self, unary: &UnaryExpr) {
        self.visit_primary(&unary.operand);
    }

    fn visit_decorator(&mut self, decorator: &Decorator) {
        for arg in &decorator.args {
            self.visit_expr(arg);
        }
    }

    fn visit_gpu_struct(&mut self, gpu_struct: &GpuStruct) {
        walk_gpu_struct(self, gpu_struct);
    }

    fn visit_gpu_field(&mut self, field: &GpuField) {
        walk_decorators(self, &field.decorators);
        self.visit_type(&field.ty);
    }

    fn visit_gpu_binding(&mut self, binding: &GpuBinding) {
        walk_decorators(self, &binding.decorators);
        self.visit_type(&binding.ty);
    }

    fn visit_gpu_function(&mut self, function: &GpuFunction) {
        walk_gpu_function(self, function);
    }

    fn visit_gpu_param(&mut self, param: &GpuParam) {
        walk_decorators(self, &param.decorators);
        self.visit_type(&param.ty);
    }
}

pub fn walk_unit<V: Visitor + ?Sized>(v: &mut V, unit: &CompilationUnit) {
    for import in &unit.imports {
        v.visit_import(import);
    }
    for def in &unit.types {
        v.visit_type_def(def);
    }
    for component in &unit.components {
        v.visit_component(component);
    }
    for gpu_struct in &unit.gpu_structs {
        v.visit_gpu_struct(gpu_struct);
    }
    for binding in &unit.gpu_bindings {
        v.visit_gpu_binding(binding);
    }
    for function in &unit.gpu_functions {
        v.visit_gpu_function(function);
    }
}

pub fn walk_type_def<V: Visitor + ?Sized>(v: &mut V, def: &TypeDef) {
    for field in &def.fields {
        v.visit_field(field);
    }
}

pub fn walk_component<V: Visitor + ?Sized>(v: &mut V, component: &Component) {
    for param in &component.params {
        v.visit_param(param);
    }
    for result in &component.results {
        v.visit_type(result);
    }
    v.visit_body(&component.body);
}

pub fn walk_body<V: Visitor + ?Sized>(v: &mut V, body: &Body) {
    for decl in &body.vars {
        v.visit_var_decl(decl);
    }
    for stmt in &body.stmts {
        v.visit_stmt(stmt);
    }
    for node in &body.nodes {
        v.visit_node(node);
    }
}

pub fn walk_block<V: Visitor + ?Sized>(v: &mut V, block: &Block) {
    for stmt in &block.stmts {
        v.visit_stmt(stmt);
    }
}

pub fn walk_stmt<V: Visitor + ?Sized>(v: &mut V, stmt: &Stmt) {
    match stmt {
        Stmt::Var(decl) => v.visit_var_decl(decl),
        Stmt::Assign(assign) => v.visit_assign(assign),
        Stmt::Send(send) => v.visit_send(send),
        Stmt::Return(ret) => v.visit_return(ret),
        Stmt::If(stmt) => v.visit_if(stmt),
        Stmt::For(stmt) => v.visit_for(stmt),
        Stmt::Branch(branch) => v.visit_branch(branch),
    }
}

pub fn walk_var_decl<V: Visitor + ?Sized>(v: &mut V, decl: &VarDecl) {
    if let Some(ty) = &decl.ty {
        v.visit_type(ty);
    }
    for value in &decl.values {
        v.visit_expr(value);
    }
}

pub fn walk_assign<V: Visitor + ?Sized>(v: &mut V, stmt: &AssignStmt) {
    for target in &stmt.targets {
        v.visit_expr(target);
    }
    for value in &stmt.values {
        v.visit_expr(value);
    }
}

pub fn walk_if<V: Visitor + ?Sized>(v: &mut V, stmt: &IfStmt) {
    if let Some(init) = &stmt.init {
        v.visit_stmt(init);
    }
    v.visit_expr(&stmt.cond);
    v.visit_block(&stmt.then);
    match &stmt.otherwise {
        Some(ElseBranch::If(next)) => v.visit_if(next),
        Some(ElseBranch::Block(block)) => v.visit_block(block),
        None => {}
    }
}

pub fn walk_for<V: Visitor + ?Sized>(v: &mut V, stmt: &ForStmt) {
    walk_for_header(v, &stmt.header);
    v.visit_block(&stmt.body);
}

pub fn walk_for_header<V: Visitor + ?Sized>(v: &mut V, header: &ForHeader) {
    match header {
        ForHeader::Infinite => {}
        ForHeader::Cond(cond) => v.visit_expr(cond),
        ForHeader::Classic { init, cond, post } => {
            if let Some(init) = init {
                v.visit_stmt(init);
            }
            if let Some(cond) = cond {
                v.visit_expr(cond);
            }
            if let Some(post) = post {
                v.visit_stmt(post);
            }
        }
        ForHeader::Range { iterable, .. } => v.visit_expr(iterable),
    }
}

pub fn walk_node<V: Visitor + ?Sized>(v: &mut V, node: &Node) {
    match node {
        Node::Element(element) => v.visit_element(element),
        Node::Text(text) => v.visit_text(text),
        Node::Template(template) => v.visit_template(template),
        Node::If(node) => v.visit_node_if(node),
        Node::For(node) => v.visit_node_for(node),
    }
}

pub fn walk_element<V: Visitor + ?Sized>(v: &mut V, element: &Element) {
    for arg in &element.args {
        v.visit_element_arg(arg);
    }
    for child in &element.children {
        v.visit_node(child);
    }
}

pub fn walk_node_if<V: Visitor + ?Sized>(v: &mut V, node: &NodeIf) {
    v.visit_expr(&node.cond);
    for child in &node.then {
        v.visit_node(child);
    }
    for child in &node.otherwise {
        v.visit_node(child);
    }
}

pub fn walk_node_for<V: Visitor + ?Sized>(v: &mut V, node: &NodeFor) {
    v.visit_expr(&node.iterable);
    for child in &node.children {
        v.visit_node(child);
    }
}

pub fn walk_expr<V: Visitor + ?Sized>(v: &mut V, expr: &Expr) {
    v.visit_primary(&expr.head);
    for (_, operand) in &expr.tail {
        v.visit_primary(operand);
    }
}

pub fn walk_primary<V: Visitor + ?Sized>(v: &mut V, primary: &Primary) {
    match primary {
        Primary::Literal(lit) => v.visit_literal(lit),
        Primary::Composite(c) => v.visit_composite(c),
        Primary::Make(m) => v.visit_make(m),
        Primary::Index(i) => v.visit_index(i),
        Primary::CallOrSelector(cs) => v.visit_call_or_selector(cs),
        Primary::FuncLit(f) => v.visit_func_lit(f),
        Primary::Receive(r) => v.visit_receive(r),
        Primary::Unary(u) => v.visit_unary(u),
        Primary::Paren(e) => v.visit_expr(e),
    }
}

pub fn walk_template<V: Visitor + ?Sized>(v: &mut V, template: &TemplateLit) {
    for fragment in &template.fragments {
        if let Fragment::Expr(expr) = fragment {
            v.visit_expr(expr);
        }
    }
}

pub fn walk_index<V: Visitor + ?Sized>(v: &mut V, index: &IndexExpr) {
    v.visit_primary(&index.target);
    match &index.index {
        IndexKind::Single(expr) => v.visit_expr(expr),
        IndexKind::Slice { low, high } => {
            if let Some(low) = low {
                v.visit_expr(low);
            }
            if let Some(high) = high {
                v.visit_expr(high);
            }
        }
    }
}

pub fn walk_call_or_selector<V: Visitor + ?Sized>(v: &mut V, call: &CallOrSelector) {
    if let SelectorBase::Expr(base) = &call.base {
        v.visit_primary(base);
    }
    for arg in call.args.iter().flatten() {
        v.visit_expr(arg);
    }
}

pub fn walk_func_lit<V: Visitor + ?Sized>(v: &mut V, func: &FuncLit) {
    for param in &func.params {
        v.visit_param(param);
    }
    for result in &func.results {
        v.visit_type(result);
    }
    v.visit_block(&func.body);
}

pub fn walk_decorators<V: Visitor + ?Sized>(v: &mut V, decorators: &[Decorator]) {
    for decorator in decorators {
        v.visit_decorator(decorator);
    }
}

pub fn walk_gpu_struct<V: Visitor + ?Sized>(v: &mut V, gpu_struct: &GpuStruct) {
    walk_decorators(v, &gpu_struct.decorators);
    for field in &gpu_struct.fields {
        v.visit_gpu_field(field);
    }
}

pub fn walk_gpu_function<V: Visitor + ?Sized>(v: &mut V, function: &GpuFunction) {
    walk_decorators(v, &function.decorators);
    for param in &function.params {
        v.visit_gpu_param(param);
    }
    if let Some(result) = &function.result {
        walk_decorators(v, &result.decorators);
        v.visit_type(&result.ty);
    }
    v.visit_block(&function.body);
}

/// Double-dispatch entry point implemented by every node type.
pub trait Accept {
    fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V);
}

macro_rules! impl_accept {
    ($($ty:ty => $method:ident),* $(,)?) => {
        $(
            impl Accept for $ty {
                fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V) {
                    visitor.$method(self);
                }
            }
        )*
    };
}

impl_accept! {
    CompilationUnit => visit_unit,
    TypeDef => visit_type_def,
    Field => visit_field,
    Component => visit_component,
    Param => visit_param,
    Body => visit_body,
    Block => visit_block,
    Stmt => visit_stmt,
    VarDecl => visit_var_decl,
    AssignStmt => visit_assign,
    SendStmt => visit_send,
    ReturnStmt => visit_return,
    IfStmt => visit_if,
    ForStmt => visit_for,
    BranchStmt => visit_branch,
    Node => visit_node,
    Element => visit_element,
    ElementArg => visit_element_arg,
    NodeIf => visit_node_if,
    NodeFor => visit_node_for,
    Expr => visit_expr,
    Primary => visit_primary,
    Literal => visit_literal,
    TemplateLit => visit_template,
    CompositeLit => visit_composite,
    MakeExpr => visit_make,
    IndexExpr => visit_index,
    CallOrSelector => visit_call_or_selector,
    FuncLit => visit_func_lit,
    ReceiveExpr => visit_receive,
    UnaryExpr => visit_unary,
    Decorator => visit_decorator,
    GpuStruct => visit_gpu_struct,
    GpuField => visit_gpu_field,
    GpuBinding => visit_gpu_binding,
    GpuFunction => visit_gpu_function,
    GpuParam => visit_gpu_param,
}

impl Accept for Spanned<TypeDesc> {
    fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V) {
        visitor.visit_type(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ast::{AssignOp, ReceiveExpr},
        span::Span,
    };

    fn ident(name: &str) -> Expr {
        Expr::single(Primary::CallOrSelector(CallOrSelector::ident(Spanned::new(
            name.to_string(),
            Span::default(),
        ))))
    }

    #[derive(Default)]
    struct IdentCollector {
        names: Vec<String>,
        receives: usize,
    }

    impl Visitor for IdentCollector {
        fn visit_call_or_selector(&mut self, call: &CallOrSelector) {
            if let Some(name) = call.as_ident() {
                self.names.push(name.inner().clone());
            }
            walk_call_or_selector(self, call);
        }

        fn visit_receive(&mut self, _recv: &ReceiveExpr) {
            self.receives += 1;
        }
    }

    #[test]
    fn test_default_traversal_reaches_nested_expressions() {
        let stmt = Stmt::If(IfStmt {
            init: None,
            cond: ident("ready"),
            then: Block {
                stmts: vec![Stmt::Assign(AssignStmt {
                    targets: vec![ident("x")],
                    op: Some(Spanned::new(AssignOp::Assign, Span::default())),
                    values: vec![Expr::single(Primary::Receive(ReceiveExpr {
                        channel: Spanned::new("ch".to_string(), Span::default()),
                        span: Span::default(),
                    }))],
                    span: Span::default(),
                })],
                span: Span::default(),
            },
            otherwise: Some(ElseBranch::Block(Block {
                stmts: vec![Stmt::Return(ReturnStmt {
                    values: vec![ident("y")],
                    span: Span::default(),
                })],
                span: Span::default(),
            })),
            span: Span::default(),
        });

        let mut collector = IdentCollector::default();
        stmt.accept(&mut collector);

        assert_eq!(collector.names, vec!["ready", "x", "y"]);
        assert_eq!(collector.receives, 1);
    }

    #[test]
    fn test_absent_optional_children_are_skipped() {
        let stmt = Stmt::For(ForStmt {
            header: ForHeader::Classic {
                init: None,
                cond: None,
                post: None,
            },
            body: Block::default(),
            span: Span::default(),
        });

        let mut collector = IdentCollector::default();
        stmt.accept(&mut collector);
        assert!(collector.names.is_empty());
    }
}
