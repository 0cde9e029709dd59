//! Indented tree dump of a compilation unit, for debugging.

use std::fmt::Write as _;

use crate::{
    ast::{
        AssignStmt, BranchStmt, CallOrSelector, CompilationUnit, Component, CompositeLit,
        Decorator, Element, ElementArg, Expr, ForStmt, FuncLit, GpuBinding, GpuFunction,
        GpuStruct, IfStmt, IndexExpr, Literal, MakeExpr, NodeFor, NodeIf, Param, ReceiveExpr,
        ReturnStmt, SendStmt, TemplateLit, TypeDef, UnaryExpr, VarDecl,
    },
    span::Spanned,
    visitor::{self, Visitor},
};

/// Renders a syntax tree as an indented outline.
///
/// ```
/// # use weft_core::printer::AstPrinter;
/// # fn demo(unit: &weft_core::ast::CompilationUnit) {
/// let dump = AstPrinter::print(unit);
/// # }
/// ```
#[derive(Debug, Default)]
pub struct AstPrinter {
    out: String,
    depth: usize,
}

impl AstPrinter {
    pub fn print(unit: &CompilationUnit) -> String {
        let mut printer = Self::default();
        printer.visit_unit(unit);
        printer.out
    }

    fn line(&mut self, text: impl AsRef<str>) {
        for _ in 0..self.depth {
            self.out.push_str("  ");
        }
        self.out.push_str(text.as_ref());
        self.out.push('\n');
    }

    fn nested(&mut self, f: impl FnOnce(&mut Self)) {
        self.depth += 1;
        f(self);
        self.depth -= 1;
    }
}

impl Visitor for AstPrinter {
    fn visit_unit(&mut self, unit: &CompilationUnit) {
        self.line(format!("Unit package={}", unit.package));
        self.nested(|p| visitor::walk_unit(p, unit));
    }

    fn visit_import(&mut self, path: &Spanned<String>) {
        self.line(format!("Import {:?}", path.inner()));
    }

    fn visit_type_def(&mut self, def: &TypeDef) {
        self.line(format!("Type {}", def.name));
        self.nested(|p| {
            for field in &def.fields {
                p.line(format!("Field {} {}", field.name, field.ty));
            }
        });
    }

    fn visit_component(&mut self, component: &Component) {
        let kind = if component.is_renderable() {
            "Component"
        } else {
            "Func"
        };
        let props = if component.auto_props { " @props" } else { "" };
        self.line(format!("{kind} {}{props}", component.name));
        self.nested(|p| visitor::walk_component(p, component));
    }

    fn visit_param(&mut self, param: &Param) {
        let dots = if param.variadic { "..." } else { "" };
        self.line(format!("Param {} {dots}{}", param.name, param.ty));
    }

    fn visit_var_decl(&mut self, decl: &VarDecl) {
        let names: Vec<&str> = decl.names.iter().map(|n| n.as_str()).collect();
        let ty = decl
            .ty
            .as_ref()
            .map(|t| format!(" {t}"))
            .unwrap_or_default();
        self.line(format!("Var {}{ty}", names.join(", ")));
        self.nested(|p| visitor::walk_var_decl(p, decl));
    }

    fn visit_assign(&mut self, stmt: &AssignStmt) {
        match &stmt.op {
            Some(op) => self.line(format!("Assign {}", op.as_str())),
            None => self.line("ExprStmt"),
        }
        self.nested(|p| visitor::walk_assign(p, stmt));
    }

    fn visit_send(&mut self, stmt: &SendStmt) {
        self.line("Send");
        self.nested(|p| {
            p.visit_expr(&stmt.channel);
            p.visit_expr(&stmt.value);
        });
    }

    fn visit_return(&mut self, stmt: &ReturnStmt) {
        self.line("Return");
        self.nested(|p| {
            for value in &stmt.values {
                p.visit_expr(value);
            }
        });
    }

    fn visit_if(&mut self, stmt: &IfStmt) {
        self.line("If");
        self.nested(|p| visitor::walk_if(p, stmt));
    }

    fn visit_for(&mut self, stmt: &ForStmt) {
        self.line("For");
        self.nested(|p| visitor::walk_for(p, stmt));
    }

    fn visit_branch(&mut self, stmt: &BranchStmt) {
        self.line(stmt.kind.as_str());
    }

    fn visit_element(&mut self, element: &Element) {
        self.line(format!("Element {}", element.tag));
        self.nested(|p| visitor::walk_element(p, element));
    }

    fn visit_element_arg(&mut self, arg: &ElementArg) {
        match &arg.name {
            Some(name) => self.line(format!("Arg {name}")),
            None => self.line("Arg"),
        }
        self.nested(|p| p.visit_expr(&arg.value));
    }

    fn visit_text(&mut self, text: &Spanned<String>) {
        self.line(format!("Text {:?}", text.inner()));
    }

    fn visit_node_if(&mut self, node: &NodeIf) {
        self.line("NodeIf");
        self.nested(|p| visitor::walk_node_if(p, node));
    }

    fn visit_node_for(&mut self, node: &NodeFor) {
        self.line("NodeFor");
        self.nested(|p| visitor::walk_node_for(p, node));
    }

    fn visit_expr(&mut self, expr: &Expr) {
        if expr.tail.is_empty() {
            visitor::walk_expr(self, expr);
            return;
        }
        let ops: Vec<&str> = expr.tail.iter().map(|(op, _)| op.as_str()).collect();
        self.line(format!("Binary [{}]", ops.join(" ")));
        self.nested(|p| visitor::walk_expr(p, expr));
    }

    fn visit_literal(&mut self, literal: &Literal) {
        match literal {
            Literal::Int(v) => self.line(format!("Int {v}")),
            Literal::Float(v) => self.line(format!("Float {v}")),
            Literal::String(v) => self.line(format!("String {:?}", v.inner())),
            Literal::Template(t) => self.visit_template(t),
        }
    }

    fn visit_template(&mut self, template: &TemplateLit) {
        self.line(format!("Template ({} fragments)", template.fragments.len()));
        self.nested(|p| visitor::walk_template(p, template));
    }

    fn visit_composite(&mut self, composite: &CompositeLit) {
        self.line(format!("Composite {}", composite.ty));
        self.nested(|p| {
            for element in &composite.elements {
                p.visit_expr(&element.value);
            }
        });
    }

    fn visit_make(&mut self, make: &MakeExpr) {
        self.line(format!("Make {}", make.ty));
        self.nested(|p| {
            for arg in &make.args {
                p.visit_expr(arg);
            }
        });
    }

    fn visit_index(&mut self, index: &IndexExpr) {
        self.line("Index");
        self.nested(|p| visitor::walk_index(p, index));
    }

    fn visit_call_or_selector(&mut self, call: &CallOrSelector) {
        let mut label = String::from(if call.is_call() { "Call" } else { "Selector" });
        if let Some(name) = call.qualified_name() {
            let _ = write!(label, " {name}");
        }
        self.line(label);
        self.nested(|p| visitor::walk_call_or_selector(p, call));
    }

    fn visit_func_lit(&mut self, func: &FuncLit) {
        self.line("FuncLit");
        self.nested(|p| visitor::walk_func_lit(p, func));
    }

    fn visit_receive(&mut self, recv: &ReceiveExpr) {
        self.line(format!("Receive {}", recv.channel));
    }

    fn visit_unary(&mut self, unary: &UnaryExpr) {
        self.line(format!("Unary {}", unary.op.as_str()));
        self.nested(|p| p.visit_primary(&unary.operand));
    }

    fn visit_decorator(&mut self, decorator: &Decorator) {
        self.line(format!("@{}", decorator.name));
    }

    fn visit_gpu_struct(&mut self, gpu_struct: &GpuStruct) {
        self.line(format!("GpuStruct {}", gpu_struct.name));
        self.nested(|p| {
            visitor::walk_decorators(p, &gpu_struct.decorators);
            for field in &gpu_struct.fields {
                p.line(format!("Field {} {}", field.name, field.ty));
            }
        });
    }

    fn visit_gpu_binding(&mut self, binding: &GpuBinding) {
        self.line(format!("GpuBinding {} {}", binding.name, binding.ty));
        self.nested(|p| visitor::walk_decorators(p, &binding.decorators));
    }

    fn visit_gpu_function(&mut self, function: &GpuFunction) {
        self.line(format!("GpuFunction {}", function.name));
        self.nested(|p| visitor::walk_gpu_function(p, function));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ast::{Body, Fragment, Node, Primary, TypeDesc},
        span::Span,
    };

    fn s(text: &str) -> Spanned<String> {
        Spanned::new(text.to_string(), Span::default())
    }

    #[test]
    fn test_print_component_outline() {
        let unit = CompilationUnit {
            package: s("main"),
            imports: vec![],
            types: vec![],
            components: vec![Component {
                name: s("Counter"),
                params: vec![Param {
                    name: s("n"),
                    ty: Spanned::new(TypeDesc::named("int"), Span::default()),
                    variadic: false,
                }],
                results: vec![Spanned::new(TypeDesc::named("Node"), Span::default())],
                body: Body {
                    vars: vec![],
                    stmts: vec![],
                    nodes: vec![Node::Element(Element {
                        tag: s("Div"),
                        args: vec![],
                        children: vec![Node::Template(TemplateLit {
                            fragments: vec![
                                Fragment::Text("n = ".to_string()),
                                Fragment::Expr(Expr::single(Primary::CallOrSelector(
                                    CallOrSelector::ident(s("n")),
                                ))),
                            ],
                            span: Span::default(),
                        })],
                        span: Span::default(),
                    })],
                },
                auto_props: false,
                span: Span::default(),
            }],
            gpu_structs: vec![],
            gpu_bindings: vec![],
            gpu_functions: vec![],
        };

        let dump = AstPrinter::print(&unit);
        let expected = "\
Unit package=main
  Component Counter
    Param n int
    Element Div
      Template (2 fragments)
        Selector n
";
        assert_eq!(dump, expected);
    }
}
