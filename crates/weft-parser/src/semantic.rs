//! Scope checking over a parsed unit.
//!
//! The analyzer walks the tree with a stack of scopes. It never stops at the
//! first problem: every diagnostic is collected into an [`Analysis`] and the
//! caller decides whether errors abort the compilation.

use indexmap::IndexMap;
use log::{debug, trace};
use weft_core::{
    ast::{
        AssignStmt, Block, Body, CompilationUnit, Component, Expr, ForHeader, ForStmt, FuncLit,
        GpuFunction, IfStmt, NodeFor, ReceiveExpr, SendStmt, VarDecl,
    },
    span::{Span, Spanned},
    visitor::{self, Visitor},
};

use crate::error::{Diagnostic, DiagnosticCollector, ErrorCode};

/// Result of [`analyze`]: every diagnostic found, in source walk order.
#[derive(Debug, Default)]
pub struct Analysis {
    diagnostics: Vec<Diagnostic>,
}

impl Analysis {
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.severity().is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.severity().is_warning())
    }
}

/// Check name usage in `unit`.
///
/// Reports assignments to undeclared names (E200), channel operations on
/// undeclared names (E201) and declarations whose name and value counts
/// disagree (E202), plus the E203/E204 warnings.
pub fn analyze(unit: &CompilationUnit) -> Analysis {
    let mut analyzer = Analyzer::default();
    analyzer.visit_unit(unit);

    let diagnostics = analyzer.collector.into_diagnostics();
    debug!(
        package = unit.package.inner().as_str(),
        diagnostics = diagnostics.len();
        "Semantic analysis finished"
    );
    Analysis { diagnostics }
}

/// What introduced a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Binding,
    Param,
    Hoisted,
    Local,
}

#[derive(Debug, Default)]
struct Scope {
    names: IndexMap<String, Origin>,
}

#[derive(Debug, Default)]
struct Analyzer {
    scopes: Vec<Scope>,
    collector: DiagnosticCollector,
}

impl Analyzer {
    fn push_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Spanned<String>, origin: Origin) {
        if name.inner() == "_" {
            return;
        }
        trace!(name = name.inner().as_str(), origin:? = origin; "Declare");
        if let Some(scope) = self.scopes.last_mut() {
            scope.names.insert(name.inner().clone(), origin);
        }
    }

    fn is_visible(&self, name: &str) -> bool {
        name == "_"
            || self
                .scopes
                .iter()
                .rev()
                .any(|scope| scope.names.contains_key(name))
    }

    fn check_assignable(&mut self, name: &Spanned<String>) {
        if !self.is_visible(name) {
            self.collector.emit(
                Diagnostic::error(format!("undefined variable: {}", name.inner()))
                    .with_code(ErrorCode::E200)
                    .with_label(name.span(), "not declared in any enclosing scope")
                    .with_help("declare it with `:=` or `var` first"),
            );
        }
    }

    fn check_channel(&mut self, name: &Spanned<String>) {
        if !self.is_visible(name) {
            self.collector.emit(
                Diagnostic::error(format!("undefined channel: {}", name.inner()))
                    .with_code(ErrorCode::E201)
                    .with_label(name.span(), "no channel with this name is in scope"),
            );
        }
    }

    fn check_counts(&mut self, names: usize, values: &[Expr], span: Span) {
        if values.is_empty() || values.len() == 1 || names == values.len() {
            return;
        }
        self.collector.emit(
            Diagnostic::error(format!(
                "assignment mismatch: {names} variables but {} values",
                values.len()
            ))
            .with_code(ErrorCode::E202)
            .with_label(span, "declared here"),
        );
    }

    fn declare_params<'a>(&mut self, names: impl IntoIterator<Item = &'a Spanned<String>>) {
        for name in names {
            self.declare(name, Origin::Param);
        }
    }
}

impl Visitor for Analyzer {
    fn visit_unit(&mut self, unit: &CompilationUnit) {
        self.push_scope();
        for binding in &unit.gpu_bindings {
            self.declare(&binding.name, Origin::Binding);
        }
        visitor::walk_unit(self, unit);
        self.pop_scope();
    }

    fn visit_component(&mut self, component: &Component) {
        if !component.is_renderable() {
            if let Some(first) = component.body.nodes.first() {
                self.collector.emit(
                    Diagnostic::warning(format!(
                        "child nodes in plain function `{}` are ignored",
                        component.name.inner()
                    ))
                    .with_code(ErrorCode::E203)
                    .with_label(first.span(), "this node is never rendered")
                    .with_secondary_label(component.name.span(), "declared without results")
                    .with_help("add a result type such as `(Node)` to make it renderable"),
                );
            }
        }

        self.push_scope();
        self.declare_params(component.params.iter().map(|p| &p.name));
        visitor::walk_component(self, component);
        self.pop_scope();
    }

    fn visit_body(&mut self, body: &Body) {
        self.push_scope();

        // Hoisted names are visible to the whole body, earlier statements
        // included.
        for decl in &body.vars {
            for name in &decl.names {
                let shadows_param = self
                    .scopes
                    .iter()
                    .rev()
                    .nth(1)
                    .and_then(|params| params.names.get(name.inner()))
                    == Some(&Origin::Param);
                if shadows_param {
                    self.collector.emit(
                        Diagnostic::warning(format!(
                            "variable `{}` shadows a parameter",
                            name.inner()
                        ))
                        .with_code(ErrorCode::E204)
                        .with_label(name.span(), "hoisted here")
                        .with_help("rename the variable or the parameter"),
                    );
                }
                self.declare(name, Origin::Hoisted);
            }
        }

        visitor::walk_body(self, body);
        self.pop_scope();
    }

    fn visit_block(&mut self, block: &Block) {
        self.push_scope();
        visitor::walk_block(self, block);
        self.pop_scope();
    }

    fn visit_var_decl(&mut self, decl: &VarDecl) {
        for value in &decl.values {
            self.visit_expr(value);
        }
        self.check_counts(decl.names.len(), &decl.values, decl.span);
        let origin = if self.is_hoisted(decl) {
            Origin::Hoisted
        } else {
            Origin::Local
        };
        for name in &decl.names {
            self.declare(name, origin);
        }
    }

    fn visit_assign(&mut self, stmt: &AssignStmt) {
        for value in &stmt.values {
            self.visit_expr(value);
        }

        let Some(op) = &stmt.op else {
            for target in &stmt.targets {
                self.visit_expr(target);
            }
            return;
        };

        if op.is_declaring() {
            self.check_counts(stmt.targets.len(), &stmt.values, stmt.span);
            for target in &stmt.targets {
                match target.as_ident() {
                    Some(name) => self.declare(name, Origin::Local),
                    None => self.visit_expr(target),
                }
            }
            return;
        }

        for target in &stmt.targets {
            match target.as_ident() {
                Some(name) => self.check_assignable(name),
                None => self.visit_expr(target),
            }
        }
    }

    fn visit_send(&mut self, stmt: &SendStmt) {
        match stmt.channel.as_ident() {
            Some(name) => self.check_channel(name),
            None => self.visit_expr(&stmt.channel),
        }
        self.visit_expr(&stmt.value);
    }

    fn visit_receive(&mut self, recv: &ReceiveExpr) {
        self.check_channel(&recv.channel);
    }

    fn visit_if(&mut self, stmt: &IfStmt) {
        // The init clause gets its own scope around the branches.
        self.push_scope();
        visitor::walk_if(self, stmt);
        self.pop_scope();
    }

    fn visit_for(&mut self, stmt: &ForStmt) {
        self.push_scope();
        match &stmt.header {
            ForHeader::Range {
                key,
                value,
                iterable,
            } => {
                self.visit_expr(iterable);
                for name in key.iter().chain(value) {
                    self.declare(name, Origin::Local);
                }
            }
            header => visitor::walk_for_header(self, header),
        }
        self.visit_block(&stmt.body);
        self.pop_scope();
    }

    fn visit_node_for(&mut self, node: &NodeFor) {
        self.visit_expr(&node.iterable);
        self.push_scope();
        for name in node.key.iter().chain(&node.value) {
            self.declare(name, Origin::Local);
        }
        for child in &node.children {
            self.visit_node(child);
        }
        self.pop_scope();
    }

    fn visit_func_lit(&mut self, func: &FuncLit) {
        self.push_scope();
        self.declare_params(func.params.iter().map(|p| &p.name));
        visitor::walk_func_lit(self, func);
        self.pop_scope();
    }

    fn visit_gpu_function(&mut self, function: &GpuFunction) {
        self.push_scope();
        self.declare_params(function.params.iter().map(|p| &p.name));
        visitor::walk_gpu_function(self, function);
        self.pop_scope();
    }
}

impl Analyzer {
    /// A body-level `var` was registered before the walk reached it.
    fn is_hoisted(&self, decl: &VarDecl) -> bool {
        self.scopes.last().is_some_and(|scope| {
            decl.names
                .iter()
                .all(|n| scope.names.get(n.inner()) == Some(&Origin::Hoisted))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Severity, parse};

    fn analyze_source(source: &str) -> Analysis {
        let unit = parse("test.weft", source).expect("source should parse");
        analyze(&unit)
    }

    fn codes(analysis: &Analysis) -> Vec<ErrorCode> {
        analysis
            .diagnostics()
            .iter()
            .filter_map(Diagnostic::code)
            .collect()
    }

    #[test]
    fn test_define_in_if_body_is_not_visible_outside() {
        let analysis = analyze_source(
            r#"
            package main
            func f() {
                if true {
                    x := 1
                }
                x = 2
            }
            "#,
        );
        assert_eq!(codes(&analysis), vec![ErrorCode::E200]);
        let diag = analysis.errors().next().expect("one error");
        assert_eq!(diag.message(), "undefined variable: x");
    }

    #[test]
    fn test_define_then_assign_in_same_scope_is_fine() {
        let analysis = analyze_source(
            r#"
            package main
            func f() {
                x := 1
                x = 2
                x++
                x += 3
            }
            "#,
        );
        assert!(analysis.diagnostics().is_empty());
    }

    #[test]
    fn test_params_and_hoisted_vars_are_visible() {
        let analysis = analyze_source(
            r#"
            package main
            func Counter(step int) (Node) {
                count = count + step
                step = 2
                var count int = 0
                P { `{count}` }
            }
            "#,
        );
        assert!(!analysis.has_errors(), "{:?}", analysis.diagnostics());
    }

    #[test]
    fn test_undefined_channel_on_receive_and_send() {
        let analysis = analyze_source(
            r#"
            package main
            func Ticker(ticks chan int) (Node) {
                other <- 1
                P { `{<-ticks} {<-missing}` }
            }
            "#,
        );
        let errors: Vec<&str> = analysis.errors().map(Diagnostic::message).collect();
        assert_eq!(
            errors,
            vec!["undefined channel: other", "undefined channel: missing"]
        );
        assert!(codes(&analysis).iter().all(|c| *c == ErrorCode::E201));
    }

    #[test]
    fn test_assignment_mismatch() {
        let analysis = analyze_source(
            r#"
            package main
            func f() {
                a, b := 1, 2, 3
                c, d := pair()
                var e, g int = 1, 2
            }
            "#,
        );
        assert_eq!(codes(&analysis), vec![ErrorCode::E202]);
        assert!(
            analysis.diagnostics()[0]
                .message()
                .contains("2 variables but 3 values")
        );
    }

    #[test]
    fn test_blank_identifier_is_always_visible() {
        let analysis = analyze_source(
            r#"
            package main
            func f() {
                _ = compute()
            }
            "#,
        );
        assert!(analysis.diagnostics().is_empty());
    }

    #[test]
    fn test_plain_identifiers_are_not_checked() {
        let analysis = analyze_source(
            r#"
            package main
            func f() {
                y := unknown + other.field
                log.Println(y)
            }
            "#,
        );
        assert!(analysis.diagnostics().is_empty());
    }

    #[test]
    fn test_loop_variables_are_scoped_to_the_loop() {
        let analysis = analyze_source(
            r#"
            package main
            func f(items []int) {
                for i := 0; i < 3; i++ {
                    i = i + 1
                }
                for _, item := range items {
                    item = 0
                }
                i = 4
                item = 5
            }
            "#,
        );
        let errors: Vec<&str> = analysis.errors().map(Diagnostic::message).collect();
        assert_eq!(
            errors,
            vec!["undefined variable: i", "undefined variable: item"]
        );
    }

    #[test]
    fn test_if_init_is_scoped_to_the_branches() {
        let analysis = analyze_source(
            r#"
            package main
            func f() {
                if v, ok := lookup(); ok {
                    v = 1
                } else {
                    ok = false
                }
                v = 2
            }
            "#,
        );
        assert_eq!(codes(&analysis), vec![ErrorCode::E200]);
    }

    #[test]
    fn test_func_literal_params_and_closure_capture() {
        let analysis = analyze_source(
            r#"
            package main
            func Button(label string) (Node) {
                var clicks int
                handler := func(n int) {
                    clicks = clicks + n
                    n = 0
                }
                Div(onClick: handler) { `{label}` }
            }
            "#,
        );
        assert!(analysis.diagnostics().is_empty(), "{:?}", analysis.diagnostics());
    }

    #[test]
    fn test_gpu_bindings_are_visible_in_gpu_functions() {
        let analysis = analyze_source(
            r#"
            package main
            @group(0) @binding(0) @storage(read_write)
            var data []f32

            @compute @workgroup_size(64)
            func double(@builtin(global_invocation_id) id vec3u) {
                data[id.x] = data[id.x] * 2.0
                total = 1.0
            }
            "#,
        );
        let errors: Vec<&str> = analysis.errors().map(Diagnostic::message).collect();
        assert_eq!(errors, vec!["undefined variable: total"]);
    }

    #[test]
    fn test_nodes_in_plain_function_warn() {
        let analysis = analyze_source(
            r#"
            package main
            func helper() {
                Div { "never shown" }
            }
            "#,
        );
        assert!(!analysis.has_errors());
        let warnings: Vec<&Diagnostic> = analysis.warnings().collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code(), Some(ErrorCode::E203));
        assert_eq!(warnings[0].severity(), Severity::Warning);
    }

    #[test]
    fn test_hoisted_var_shadowing_param_warns() {
        let analysis = analyze_source(
            r#"
            package main
            func Card(title string) (Node) {
                var title string = "override"
                H1 { `{title}` }
            }
            "#,
        );
        assert_eq!(codes(&analysis), vec![ErrorCode::E204]);
        assert!(!analysis.has_errors());
    }

    #[test]
    fn test_nested_var_declares_locally() {
        let analysis = analyze_source(
            r#"
            package main
            func f() {
                if true {
                    var n int
                    n = 1
                }
                n = 2
            }
            "#,
        );
        assert_eq!(codes(&analysis), vec![ErrorCode::E200]);
    }
}
