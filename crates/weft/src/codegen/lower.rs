//! Statement and expression lowering.
//!
//! Names bound to unit state are rewritten to field accesses unless a local
//! declaration shadows them. Locals are tracked with a scope stack that
//! mirrors Go's block structure.

use std::collections::{HashMap, HashSet};

use weft_core::ast::{
    AssignStmt, Block, CallOrSelector, CompilationUnit, CompositeLit, ElseBranch, Expr,
    ForHeader, ForStmt, Fragment, FuncLit, IfStmt, IndexKind, Literal, Param, Primary,
    SelectorBase, Stmt, TemplateLit, TypeDesc, VarDecl,
};

use super::syntax::{self, quote};
use crate::writer::CodeWriter;

/// Source names that lower to fields of the receiver.
#[derive(Debug, Default)]
pub(super) struct State {
    /// Source name → Go access expression, e.g. `clicks` → `c.clicks`.
    fields: HashMap<String, String>,
    /// Channel name → mirror access, e.g. `count` → `c.countValue`.
    mirrors: HashMap<String, String>,
}

impl State {
    pub fn insert_field(&mut self, name: &str, access: String) {
        self.fields.insert(name.to_string(), access);
    }

    pub fn insert_mirror(&mut self, name: &str, access: String) {
        self.mirrors.insert(name.to_string(), access);
    }
}

pub(super) struct Lowerer<'a> {
    pub(super) unit: &'a CompilationUnit,
    pub(super) alias: &'a str,
    state: State,
    scopes: Vec<HashSet<String>>,
    /// One entry per enclosing function literal: whether it assigned state.
    state_writes: Vec<bool>,
    /// Indentation of the line the current expression starts on.
    pub(super) level: usize,
    pub(super) uses_fmt: bool,
    pub(super) uses_runtime: bool,
}

impl<'a> Lowerer<'a> {
    pub fn new(unit: &'a CompilationUnit, alias: &'a str, state: State) -> Self {
        Self {
            unit,
            alias,
            state,
            scopes: vec![HashSet::new()],
            state_writes: Vec::new(),
            level: 0,
            uses_fmt: false,
            uses_runtime: false,
        }
    }

    // -----------------------------------------------------------------------
    // Scopes
    // -----------------------------------------------------------------------

    pub fn push_scope(&mut self) {
        self.scopes.push(HashSet::new());
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    pub fn declare(&mut self, name: &str) {
        if name == "_" {
            return;
        }
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string());
        }
    }

    pub fn declare_params(&mut self, params: &[Param]) {
        for param in params {
            self.declare(param.name.inner());
        }
    }

    fn is_local(&self, name: &str) -> bool {
        self.scopes.iter().any(|scope| scope.contains(name))
    }

    /// The state field `name` lowers to, unless shadowed.
    fn state_field(&self, name: &str) -> Option<&str> {
        if self.is_local(name) {
            return None;
        }
        self.state.fields.get(name).map(String::as_str)
    }

    fn resolve(&self, name: &str) -> String {
        self.state_field(name)
            .map_or_else(|| name.to_string(), str::to_string)
    }

    fn note_state_write(&mut self, target: &Expr) {
        let base = match target.as_primary() {
            Some(Primary::CallOrSelector(call)) => call.base_ident(),
            Some(Primary::Index(index)) => match index.target.as_ref() {
                Primary::CallOrSelector(call) => call.base_ident(),
                _ => None,
            },
            _ => None,
        };
        let writes_state = base.is_some_and(|name| self.state_field(name).is_some());
        if writes_state {
            if let Some(flag) = self.state_writes.last_mut() {
                *flag = true;
            }
        }
    }

    pub fn go_type(&mut self, ty: &TypeDesc) -> String {
        syntax::go_type(ty, self.alias, &mut self.uses_runtime)
    }

    /// `rt.` qualified runtime name.
    pub fn runtime(&mut self, name: &str) -> String {
        self.uses_runtime = true;
        format!("{}.{name}", self.alias)
    }

    // -----------------------------------------------------------------------
    // Statements
    // -----------------------------------------------------------------------

    /// Lower `block` into `out` inside a fresh scope.
    pub fn block(&mut self, out: &mut CodeWriter, block: &Block) {
        self.push_scope();
        self.stmts(out, &block.stmts);
        self.pop_scope();
    }

    pub fn stmts(&mut self, out: &mut CodeWriter, stmts: &[Stmt]) {
        for stmt in stmts {
            self.stmt(out, stmt);
        }
    }

    pub fn stmt(&mut self, out: &mut CodeWriter, stmt: &Stmt) {
        self.level = out.level();
        match stmt {
            Stmt::Var(_) | Stmt::Assign(_) | Stmt::Send(_) => {
                let text = self.simple(stmt);
                out.line(text);
            }
            Stmt::Return(ret) => {
                let values = self.expr_list(&ret.values);
                if values.is_empty() {
                    out.line("return");
                } else {
                    out.line(format!("return {values}"));
                }
            }
            Stmt::If(if_stmt) => {
                let head = self.if_head(if_stmt);
                out.line(format!("if {head} {{"));
                self.if_rest(out, if_stmt);
                out.line("}");
            }
            Stmt::For(for_stmt) => self.for_stmt(out, for_stmt),
            Stmt::Branch(branch) => out.line(branch.kind.as_str()),
        }
    }

    /// A statement that fits on one line: declarations, assignments,
    /// sends and expression statements.
    pub fn simple(&mut self, stmt: &Stmt) -> String {
        match stmt {
            Stmt::Var(decl) => self.var_decl(decl),
            Stmt::Assign(assign) => self.assign(assign),
            Stmt::Send(send) => {
                let channel = self.expr(&send.channel);
                let value = self.expr(&send.value);
                format!("{channel} <- {value}")
            }
            other => {
                let mut out = CodeWriter::tabs().at_level(self.level);
                self.stmt(&mut out, other);
                out.finish().trim().to_string()
            }
        }
    }

    pub fn var_decl(&mut self, decl: &VarDecl) -> String {
        let mut text = format!(
            "var {}",
            decl.names
                .iter()
                .map(|n| n.inner().as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        if let Some(ty) = &decl.ty {
            text.push(' ');
            text.push_str(&self.go_type(ty));
        }
        if !decl.values.is_empty() {
            text.push_str(" = ");
            text.push_str(&self.expr_list(&decl.values));
        }
        for name in &decl.names {
            self.declare(name.inner());
        }
        text
    }

    fn assign(&mut self, assign: &AssignStmt) -> String {
        let Some(op) = &assign.op else {
            return self.expr_list(&assign.targets);
        };

        if op.is_declaring() {
            let values = self.expr_list(&assign.values);
            let mut targets = Vec::with_capacity(assign.targets.len());
            for target in &assign.targets {
                match target.as_ident() {
                    Some(name) => {
                        targets.push(name.inner().clone());
                        self.declare(name.inner());
                    }
                    None => targets.push(self.expr(target)),
                }
            }
            return format!("{} := {values}", targets.join(", "));
        }

        for target in &assign.targets {
            self.note_state_write(target);
        }
        let targets = self.expr_list(&assign.targets);
        if op.is_postfix() {
            format!("{targets}{}", op.as_str())
        } else {
            let values = self.expr_list(&assign.values);
            format!("{targets} {} {values}", op.as_str())
        }
    }

    /// `init; cond` of an `if`, opening the scope closed by [`Self::if_rest`].
    fn if_head(&mut self, if_stmt: &IfStmt) -> String {
        self.push_scope();
        match &if_stmt.init {
            Some(init) => {
                let init = self.simple(init);
                format!("{init}; {}", self.expr(&if_stmt.cond))
            }
            None => self.expr(&if_stmt.cond),
        }
    }

    fn if_rest(&mut self, out: &mut CodeWriter, if_stmt: &IfStmt) {
        out.indent();
        self.block(out, &if_stmt.then);
        out.dedent();
        match &if_stmt.otherwise {
            None => {}
            Some(ElseBranch::Block(block)) => {
                out.line("} else {");
                out.indent();
                self.block(out, block);
                out.dedent();
            }
            Some(ElseBranch::If(next)) => {
                self.level = out.level();
                let head = self.if_head(next);
                out.line(format!("}} else if {head} {{"));
                self.if_rest(out, next);
            }
        }
        self.pop_scope();
    }

    fn for_stmt(&mut self, out: &mut CodeWriter, for_stmt: &ForStmt) {
        self.push_scope();
        let head = match &for_stmt.header {
            ForHeader::Infinite => "for {".to_string(),
            ForHeader::Cond(cond) => format!("for {} {{", self.expr(cond)),
            ForHeader::Classic { init, cond, post } => {
                let init = init.as_deref().map(|s| self.simple(s)).unwrap_or_default();
                let cond = cond.as_ref().map(|c| self.expr(c)).unwrap_or_default();
                let post = post.as_deref().map(|s| self.simple(s)).unwrap_or_default();
                format!("for {init}; {cond}; {post} {{")
            }
            ForHeader::Range {
                key,
                value,
                iterable,
            } => {
                let iterable = self.expr(iterable);
                let vars = range_vars(key.as_deref(), value.as_deref());
                for name in [key, value].into_iter().flatten() {
                    self.declare(name.inner());
                }
                format!("for {vars}range {iterable} {{")
            }
        };
        out.line(head);
        out.indent();
        self.block(out, &for_stmt.body);
        out.dedent();
        out.line("}");
        self.pop_scope();
    }

    // -----------------------------------------------------------------------
    // Expressions
    // -----------------------------------------------------------------------

    pub fn expr_list(&mut self, exprs: &[Expr]) -> String {
        exprs
            .iter()
            .map(|e| self.expr(e))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn expr(&mut self, expr: &Expr) -> String {
        let mut out = self.primary(&expr.head);
        for (op, operand) in &expr.tail {
            out.push(' ');
            out.push_str(op.as_str());
            out.push(' ');
            out.push_str(&self.primary(operand));
        }
        out
    }

    fn primary(&mut self, primary: &Primary) -> String {
        match primary {
            Primary::Literal(Literal::Int(text) | Literal::Float(text)) => text.inner().clone(),
            Primary::Literal(Literal::String(text)) => quote(text),
            Primary::Literal(Literal::Template(template)) => self.template(template),
            Primary::Composite(composite) => self.composite(composite),
            Primary::Make(make) => {
                let mut parts = vec![self.go_type(&make.ty)];
                parts.extend(make.args.iter().map(|a| self.expr(a)));
                format!("make({})", parts.join(", "))
            }
            Primary::Index(index) => {
                let target = self.primary(&index.target);
                match &index.index {
                    IndexKind::Single(i) => format!("{target}[{}]", self.expr(i)),
                    IndexKind::Slice { low, high } => {
                        let low = low.as_ref().map(|e| self.expr(e)).unwrap_or_default();
                        let high = high.as_ref().map(|e| self.expr(e)).unwrap_or_default();
                        format!("{target}[{low}:{high}]")
                    }
                }
            }
            Primary::CallOrSelector(call) => self.call_or_selector(call),
            Primary::FuncLit(func) => self.func_lit(func),
            Primary::Receive(recv) => {
                let name = recv.channel.inner();
                match self.state.mirrors.get(name.as_str()) {
                    Some(mirror) if !self.is_local(name) => mirror.clone(),
                    _ => format!("<-{}", self.resolve(name)),
                }
            }
            Primary::Unary(unary) => {
                format!("{}{}", unary.op.as_str(), self.primary(&unary.operand))
            }
            Primary::Paren(inner) => format!("({})", self.expr(inner)),
        }
    }

    fn call_or_selector(&mut self, call: &CallOrSelector) -> String {
        let mut out = match &call.base {
            SelectorBase::Ident(name) => self.resolve(name),
            SelectorBase::Expr(base) => self.primary(base),
        };
        for segment in &call.path {
            out.push('.');
            out.push_str(segment);
        }
        if let Some(args) = &call.args {
            let args = self.expr_list(args);
            out.push('(');
            out.push_str(&args);
            out.push(')');
        }
        out
    }

    fn composite(&mut self, composite: &CompositeLit) -> String {
        let ty = self.go_type(&composite.ty);
        let elements: Vec<String> = composite
            .elements
            .iter()
            .map(|element| {
                let value = self.expr(&element.value);
                match &element.key {
                    Some(key) => format!("{}: {value}", key.inner()),
                    None => value,
                }
            })
            .collect();
        format!("{ty}{{{}}}", elements.join(", "))
    }

    /// `fmt.Sprintf` over the template; a template without interpolations
    /// is a plain string literal.
    pub fn template(&mut self, template: &TemplateLit) -> String {
        let mut format = String::new();
        let mut args = Vec::new();
        for fragment in &template.fragments {
            match fragment {
                Fragment::Text(text) => format.push_str(&text.replace('%', "%%")),
                Fragment::Expr(expr) => {
                    format.push_str("%v");
                    args.push(self.expr(expr));
                }
            }
        }
        if args.is_empty() {
            return quote(&format.replace("%%", "%"));
        }
        self.uses_fmt = true;
        format!("fmt.Sprintf({}, {})", quote(&format), args.join(", "))
    }

    fn func_lit(&mut self, func: &FuncLit) -> String {
        let level = self.level;
        let params = self.params(&func.params);
        let results: Vec<String> = func.results.iter().map(|r| self.go_type(r)).collect();
        let head = format!("func({params}){}", syntax::result_suffix(&results));

        self.push_scope();
        self.declare_params(&func.params);
        self.state_writes.push(false);
        let mut body = CodeWriter::tabs().at_level(level + 1);
        self.block(&mut body, &func.body);
        let writes_state = self.state_writes.pop().unwrap_or(false);
        self.pop_scope();
        self.level = level;

        if body.is_empty() && !writes_state {
            return format!("{head} {{}}");
        }
        let mut text = format!("{head} {{\n");
        if writes_state {
            text.push_str(&body.pad(level + 1));
            text.push_str("defer c.Update()\n");
        }
        let close = body.pad(level);
        text.push_str(&body.finish());
        text.push_str(&close);
        text.push('}');
        text
    }

    /// A Go parameter list: `a int, rest ...string`.
    pub fn params(&mut self, params: &[Param]) -> String {
        params
            .iter()
            .map(|p| {
                let ty = self.go_type(&p.ty);
                if p.variadic {
                    format!("{} ...{ty}", p.name.inner())
                } else {
                    format!("{} {ty}", p.name.inner())
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// `k, v := `, `_, v := `, `k := ` or nothing.
pub(super) fn range_vars(key: Option<&String>, value: Option<&String>) -> String {
    match (key, value) {
        (Some(key), Some(value)) => format!("{key}, {value} := "),
        (None, Some(value)) => format!("_, {value} := "),
        (Some(key), None) => format!("{key} := "),
        (None, None) => String::new(),
    }
}
