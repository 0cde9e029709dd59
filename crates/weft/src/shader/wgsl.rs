//! WGSL source emission.
//!
//! Statements and expressions are translated one to one; anything WGSL has
//! no counterpart for is rejected with a [`ShaderError`] naming the
//! construct.

use std::collections::HashSet;

use log::trace;

use weft_core::{
    ast::{
        AssignOp, AssignStmt, BinaryOp, Block, BranchKind, CallOrSelector, CompilationUnit,
        CompositeLit, Decorator, ElseBranch, Expr, ForHeader, ForStmt, GpuBinding, GpuFunction,
        GpuStruct, IfStmt, IndexKind, Literal, Primary, SelectorBase, Stmt, TypeDesc, UnaryOp,
        VarDecl,
    },
    span::{Span, Spanned},
};

use super::{ShaderError, binding, layout::LayoutTable, types};
use crate::writer::CodeWriter;

type Result<T> = std::result::Result<T, ShaderError>;

/// Built-in functions passed through unchanged.
const BUILTIN_FUNCTIONS: &[&str] = &[
    "abs",
    "acos",
    "all",
    "any",
    "arrayLength",
    "asin",
    "atan",
    "atan2",
    "atomicAdd",
    "atomicLoad",
    "atomicMax",
    "atomicMin",
    "atomicStore",
    "bool",
    "ceil",
    "clamp",
    "cos",
    "cosh",
    "cross",
    "degrees",
    "determinant",
    "distance",
    "dot",
    "exp",
    "exp2",
    "f32",
    "faceForward",
    "floor",
    "fma",
    "fract",
    "i32",
    "inverseSqrt",
    "length",
    "log",
    "log2",
    "max",
    "min",
    "mix",
    "normalize",
    "pow",
    "radians",
    "reflect",
    "refract",
    "round",
    "saturate",
    "select",
    "sign",
    "sin",
    "sinh",
    "smoothstep",
    "sqrt",
    "step",
    "storageBarrier",
    "tan",
    "tanh",
    "transpose",
    "trunc",
    "u32",
    "workgroupBarrier",
];

const STRUCT_ATTRIBUTES: &[&str] = &["gpu"];
const FIELD_ATTRIBUTES: &[&str] = &["location", "builtin", "interpolate", "invariant", "align", "size"];
const FUNCTION_ATTRIBUTES: &[&str] = &["vertex", "fragment", "compute", "workgroup_size"];
const IO_ATTRIBUTES: &[&str] = &["location", "builtin", "interpolate", "invariant"];

/// Emit WGSL for every GPU declaration of `unit`.
pub(super) fn generate(unit: &CompilationUnit, layouts: &LayoutTable) -> Result<String> {
    let mut generator = WgslGenerator::new(unit, layouts);
    generator.emit_unit()?;
    Ok(generator.out.finish())
}

struct WgslGenerator<'a> {
    unit: &'a CompilationUnit,
    layouts: &'a LayoutTable,
    functions: HashSet<&'a str>,
    out: CodeWriter,
}

impl<'a> WgslGenerator<'a> {
    fn new(unit: &'a CompilationUnit, layouts: &'a LayoutTable) -> Self {
        Self {
            unit,
            layouts,
            functions: unit
                .gpu_functions
                .iter()
                .map(|f| f.name.inner().as_str())
                .collect(),
            out: CodeWriter::spaces(),
        }
    }

    fn emit_unit(&mut self) -> Result<()> {
        let unit = self.unit;
        for gpu_struct in &unit.gpu_structs {
            self.emit_struct(gpu_struct)?;
            self.out.blank();
        }
        for binding in &unit.gpu_bindings {
            self.emit_binding(binding)?;
        }
        if !unit.gpu_bindings.is_empty() {
            self.out.blank();
        }
        for (i, function) in unit.gpu_functions.iter().enumerate() {
            if i > 0 {
                self.out.blank();
            }
            self.emit_function(function)?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Declarations
    // -----------------------------------------------------------------------

    fn emit_struct(&mut self, gpu_struct: &GpuStruct) -> Result<()> {
        for decorator in &gpu_struct.decorators {
            check_decorator(decorator, STRUCT_ATTRIBUTES, "struct")?;
        }

        self.out.line(format!("struct {} {{", gpu_struct.name.inner()));
        self.out.indent();
        for field in &gpu_struct.fields {
            let attrs = self.attributes(&field.decorators, FIELD_ATTRIBUTES, "field")?;
            let ty = self.type_name(&field.ty, false)?;
            self.out
                .line(format!("{attrs}{}: {ty},", field.name.inner()));
        }
        self.out.dedent();
        self.out.line("}");
        Ok(())
    }

    fn emit_binding(&mut self, gpu_binding: &GpuBinding) -> Result<()> {
        let info = binding::resolve(gpu_binding)?;
        let runtime_array = matches!(info.space, binding::AddressSpace::Storage { .. });
        let ty = self.type_name(&gpu_binding.ty, runtime_array)?;

        let slot = match info.slot {
            Some((group, slot)) => format!("@group({group}) @binding({slot}) "),
            None => String::new(),
        };
        self.out.line(format!(
            "{slot}var<{}> {}: {ty};",
            info.space.wgsl(),
            gpu_binding.name.inner()
        ));
        Ok(())
    }

    fn emit_function(&mut self, function: &GpuFunction) -> Result<()> {
        trace!(name = function.name.inner().as_str(); "Emitting GPU function");

        let stage = self.attributes(&function.decorators, FUNCTION_ATTRIBUTES, "function")?;
        if !stage.is_empty() {
            self.out.line(stage.trim_end());
        }

        let mut params = Vec::with_capacity(function.params.len());
        for param in &function.params {
            let attrs = self.attributes(&param.decorators, IO_ATTRIBUTES, "parameter")?;
            let ty = self.type_name(&param.ty, false)?;
            params.push(format!("{attrs}{}: {ty}", param.name.inner()));
        }

        let result = match &function.result {
            Some(result) => {
                let attrs = self.attributes(&result.decorators, IO_ATTRIBUTES, "result")?;
                format!(" -> {attrs}{}", self.type_name(&result.ty, false)?)
            }
            None => String::new(),
        };

        self.out.line(format!(
            "fn {}({}){result} {{",
            function.name.inner(),
            params.join(", ")
        ));
        self.block_body(&function.body)?;
        self.out.line("}");
        Ok(())
    }

    /// Render decorators as WGSL attributes followed by a space each.
    fn attributes(
        &self,
        decorators: &[Decorator],
        allowed: &[&str],
        target: &'static str,
    ) -> Result<String> {
        let mut out = String::new();
        for decorator in decorators {
            check_decorator(decorator, allowed, target)?;
            out.push('@');
            out.push_str(decorator.name.inner());
            if !decorator.args.is_empty() {
                let args = decorator
                    .args
                    .iter()
                    .map(|arg| self.expr(arg))
                    .collect::<Result<Vec<_>>>()?;
                out.push('(');
                out.push_str(&args.join(", "));
                out.push(')');
            }
            out.push(' ');
        }
        Ok(out)
    }

    /// The WGSL spelling of `ty`. `[]T` is only accepted when
    /// `runtime_array` is set.
    fn type_name(&self, ty: &Spanned<TypeDesc>, runtime_array: bool) -> Result<String> {
        self.type_desc(ty.inner(), ty.span(), runtime_array)
    }

    fn type_desc(&self, ty: &TypeDesc, span: Span, runtime_array: bool) -> Result<String> {
        match ty {
            TypeDesc::Named { name, arg: None } => {
                if let Some(builtin) = types::lookup(name) {
                    Ok(builtin.wgsl.to_string())
                } else if self.layouts.get(name).is_some() {
                    Ok(name.clone())
                } else {
                    Err(ShaderError::UnknownType {
                        name: name.clone(),
                        reason: "not a GPU type".to_string(),
                        span,
                    })
                }
            }
            TypeDesc::Slice(elem) if runtime_array => {
                Ok(format!("array<{}>", self.type_desc(elem, span, false)?))
            }
            TypeDesc::Slice(_) => Err(ShaderError::UnknownType {
                name: ty.to_string(),
                reason: "runtime-sized arrays are only allowed as storage bindings".to_string(),
                span,
            }),
            TypeDesc::Chan { .. } => Err(ShaderError::ChannelOperation { span }),
            _ => Err(ShaderError::UnknownType {
                name: ty.to_string(),
                reason: "not a GPU type".to_string(),
                span,
            }),
        }
    }

    // -----------------------------------------------------------------------
    // Statements
    // -----------------------------------------------------------------------

    fn block_body(&mut self, block: &Block) -> Result<()> {
        self.out.indent();
        for stmt in &block.stmts {
            self.stmt(stmt)?;
        }
        self.out.dedent();
        Ok(())
    }

    fn stmt(&mut self, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::Var(decl) => {
                for line in self.var_decl(decl)? {
                    self.out.line(format!("{line};"));
                }
            }
            Stmt::Assign(assign) => {
                let text = self.assign(assign)?;
                self.out.line(format!("{text};"));
            }
            Stmt::Send(send) => return Err(ShaderError::ChannelOperation { span: send.span }),
            Stmt::Return(ret) => match ret.values.as_slice() {
                [] => self.out.line("return;"),
                [value] => {
                    let value = self.expr(value)?;
                    self.out.line(format!("return {value};"));
                }
                _ => return Err(unsupported("multi-value return", ret.span)),
            },
            Stmt::If(if_stmt) => self.emit_if(if_stmt)?,
            Stmt::For(for_stmt) => self.emit_for(for_stmt)?,
            Stmt::Branch(branch) => match branch.kind {
                BranchKind::Break => self.out.line("break;"),
                BranchKind::Continue => self.out.line("continue;"),
            },
        }
        Ok(())
    }

    /// One `var` declaration per name, without trailing semicolons.
    fn var_decl(&self, decl: &VarDecl) -> Result<Vec<String>> {
        if !decl.values.is_empty() && decl.values.len() != decl.names.len() {
            return Err(unsupported("multi-value assignment", decl.span));
        }
        let ty = decl
            .ty
            .as_ref()
            .map(|ty| self.type_name(ty, false))
            .transpose()?;

        let mut lines = Vec::with_capacity(decl.names.len());
        for (i, name) in decl.names.iter().enumerate() {
            let value = decl.values.get(i).map(|v| self.expr(v)).transpose()?;
            let line = match (&ty, value) {
                (Some(ty), Some(value)) => format!("var {}: {ty} = {value}", name.inner()),
                (Some(ty), None) => format!("var {}: {ty}", name.inner()),
                (None, Some(value)) => format!("var {} = {value}", name.inner()),
                (None, None) => {
                    return Err(unsupported("variable without type or value", decl.span));
                }
            };
            lines.push(line);
        }
        Ok(lines)
    }

    /// An assignment or call statement, without the trailing semicolon.
    fn assign(&self, assign: &AssignStmt) -> Result<String> {
        let Some(op) = &assign.op else {
            return match assign.targets.as_slice() {
                [call] if call.is_call() => self.expr(call),
                _ => Err(unsupported("expression statement", assign.span)),
            };
        };

        let [target] = assign.targets.as_slice() else {
            return Err(unsupported("multi-value assignment", assign.span));
        };
        if op.is_postfix() {
            return Ok(format!("{}{}", self.expr(target)?, op.as_str()));
        }
        let [value] = assign.values.as_slice() else {
            return Err(unsupported("multi-value assignment", assign.span));
        };
        let value = self.expr(value)?;

        match op.inner() {
            AssignOp::Define => match target.as_ident() {
                Some(name) => Ok(format!("var {} = {value}", name.inner())),
                None => Err(unsupported("declaration of a non-identifier", target.span)),
            },
            other => Ok(format!("{} {} {value}", self.expr(target)?, other.as_str())),
        }
    }

    /// A statement inside a `for (...)` clause.
    fn clause(&self, stmt: &Stmt) -> Result<String> {
        match stmt {
            Stmt::Assign(assign) => self.assign(assign),
            Stmt::Var(decl) => match self.var_decl(decl)?.as_slice() {
                [single] => Ok(single.clone()),
                _ => Err(unsupported("multi-value assignment", decl.span)),
            },
            other => Err(unsupported("statement in a loop clause", other.span())),
        }
    }

    fn emit_if(&mut self, if_stmt: &IfStmt) -> Result<()> {
        let Some(init) = &if_stmt.init else {
            return self.emit_if_chain(if_stmt);
        };
        // The init clause lives in a block around the whole chain.
        self.out.line("{");
        self.out.indent();
        self.stmt(init)?;
        self.emit_if_chain(if_stmt)?;
        self.out.dedent();
        self.out.line("}");
        Ok(())
    }

    fn emit_if_chain(&mut self, if_stmt: &IfStmt) -> Result<()> {
        let cond = self.expr(&if_stmt.cond)?;
        self.out.line(format!("if {cond} {{"));
        self.block_body(&if_stmt.then)?;

        let mut otherwise = &if_stmt.otherwise;
        loop {
            match otherwise {
                None => break,
                Some(ElseBranch::Block(block)) => {
                    self.out.line("} else {");
                    self.block_body(block)?;
                    break;
                }
                Some(ElseBranch::If(next)) if next.init.is_none() => {
                    let cond = self.expr(&next.cond)?;
                    self.out.line(format!("}} else if {cond} {{"));
                    self.block_body(&next.then)?;
                    otherwise = &next.otherwise;
                }
                Some(ElseBranch::If(next)) => {
                    self.out.line("} else {");
                    self.out.indent();
                    self.emit_if(next)?;
                    self.out.dedent();
                    break;
                }
            }
        }
        self.out.line("}");
        Ok(())
    }

    fn emit_for(&mut self, for_stmt: &ForStmt) -> Result<()> {
        let head = match &for_stmt.header {
            ForHeader::Infinite => "loop {".to_string(),
            ForHeader::Cond(cond) => format!("while {} {{", self.expr(cond)?),
            ForHeader::Classic { init, cond, post } => {
                let init = init.as_deref().map(|s| self.clause(s)).transpose()?;
                let cond = cond.as_ref().map(|c| self.expr(c)).transpose()?;
                let post = post.as_deref().map(|s| self.clause(s)).transpose()?;
                format!(
                    "for ({}; {}; {}) {{",
                    init.unwrap_or_default(),
                    cond.unwrap_or_default(),
                    post.unwrap_or_default()
                )
            }
            ForHeader::Range { .. } => return Err(unsupported("`range` loop", for_stmt.span)),
        };
        self.out.line(head);
        self.block_body(&for_stmt.body)?;
        self.out.line("}");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Expressions
    // -----------------------------------------------------------------------

    fn expr(&self, expr: &Expr) -> Result<String> {
        let mut out = self.primary(&expr.head)?;
        for (op, operand) in &expr.tail {
            if *op.inner() == BinaryOp::AndNot {
                return Err(unsupported("the `&^` operator", op.span()));
            }
            out.push(' ');
            out.push_str(op.as_str());
            out.push(' ');
            out.push_str(&self.primary(operand)?);
        }
        Ok(out)
    }

    fn primary(&self, primary: &Primary) -> Result<String> {
        match primary {
            Primary::Literal(Literal::Int(text) | Literal::Float(text)) => Ok(text.inner().clone()),
            Primary::Literal(lit) => Err(unsupported("string", lit.span())),
            Primary::Composite(composite) => self.composite(composite),
            Primary::Make(make) if make.ty.is_chan() => {
                Err(ShaderError::ChannelOperation { span: make.span })
            }
            Primary::Make(make) => Err(unsupported("`make`", make.span)),
            Primary::Index(index) => {
                let target = self.primary(&index.target)?;
                match &index.index {
                    IndexKind::Single(i) => Ok(format!("{target}[{}]", self.expr(i)?)),
                    IndexKind::Slice { .. } => Err(unsupported("slice expression", index.span)),
                }
            }
            Primary::CallOrSelector(call) => self.call_or_selector(call),
            Primary::FuncLit(func) => Err(unsupported("function literal", func.span)),
            Primary::Receive(recv) => Err(ShaderError::ChannelOperation { span: recv.span }),
            Primary::Unary(unary) => {
                let operand = self.primary(&unary.operand)?;
                Ok(match unary.op {
                    UnaryOp::Plus => operand,
                    UnaryOp::BitNot => format!("~{operand}"),
                    op => format!("{}{operand}", op.as_str()),
                })
            }
            Primary::Paren(inner) => Ok(format!("({})", self.expr(inner)?)),
        }
    }

    fn call_or_selector(&self, call: &CallOrSelector) -> Result<String> {
        let mut out = match &call.base {
            SelectorBase::Ident(name) => name.inner().clone(),
            SelectorBase::Expr(base) => self.primary(base)?,
        };

        let Some(args) = &call.args else {
            for segment in &call.path {
                out.push('.');
                out.push_str(segment);
            }
            return Ok(out);
        };

        let callee = match (&call.base, call.path.is_empty()) {
            (SelectorBase::Ident(name), true) => self.callee(name)?,
            _ => {
                return Err(ShaderError::UnknownFunction {
                    name: call
                        .qualified_name()
                        .unwrap_or_else(|| "<expression>".to_string()),
                    span: call.span,
                });
            }
        };
        let args = args
            .iter()
            .map(|arg| self.expr(arg))
            .collect::<Result<Vec<_>>>()?;
        Ok(format!("{callee}({})", args.join(", ")))
    }

    /// Resolve the name of a called function.
    fn callee(&self, name: &Spanned<String>) -> Result<String> {
        let text = name.inner().as_str();
        if let Some(builtin) = types::lookup(text) {
            return Ok(builtin.wgsl.to_string());
        }
        if BUILTIN_FUNCTIONS.contains(&text)
            || self.functions.contains(text)
            || self.layouts.get(text).is_some()
        {
            return Ok(text.to_string());
        }
        Err(ShaderError::UnknownFunction {
            name: text.to_string(),
            span: name.span(),
        })
    }

    /// `T{a, b}` → `T(a, b)`; keyed fields are put in declaration order and
    /// missing ones are zero-constructed.
    fn composite(&self, composite: &CompositeLit) -> Result<String> {
        let keyed = composite.elements.iter().filter(|e| e.key.is_some()).count();
        if keyed != 0 && keyed != composite.elements.len() {
            return Err(unsupported(
                "mixed keyed and positional fields",
                composite.span,
            ));
        }

        if let TypeDesc::Slice(elem) = composite.ty.inner() {
            if keyed != 0 {
                return Err(unsupported("keyed array element", composite.span));
            }
            let elem = self.type_desc(elem, composite.ty.span(), false)?;
            let values = self.values(composite.elements.iter().map(|e| &e.value))?;
            return Ok(format!(
                "array<{elem}, {}>({})",
                composite.elements.len(),
                values.join(", ")
            ));
        }

        let ty = self.type_name(&composite.ty, false)?;
        if keyed == 0 {
            let values = self.values(composite.elements.iter().map(|e| &e.value))?;
            return Ok(format!("{ty}({})", values.join(", ")));
        }

        let Some(decl) = self
            .unit
            .gpu_structs
            .iter()
            .find(|s| Some(s.name.inner().as_str()) == composite.ty.base_name())
        else {
            return Err(unsupported("keyed fields on a built-in type", composite.span));
        };

        for element in &composite.elements {
            if let Some(key) = &element.key {
                if !decl.fields.iter().any(|f| f.name.inner() == key.inner()) {
                    return Err(unsupported(
                        &format!("unknown field `{}` of `{ty}`", key.inner()),
                        key.span(),
                    ));
                }
            }
        }

        let mut args = Vec::with_capacity(decl.fields.len());
        for field in &decl.fields {
            let value = composite
                .elements
                .iter()
                .find(|e| e.key.as_ref().map(|k| k.inner()) == Some(field.name.inner()));
            args.push(match value {
                Some(element) => self.expr(&element.value)?,
                None => format!("{}()", self.type_name(&field.ty, false)?),
            });
        }
        Ok(format!("{ty}({})", args.join(", ")))
    }

    fn values<'e>(&self, exprs: impl Iterator<Item = &'e Expr>) -> Result<Vec<String>> {
        exprs.map(|e| self.expr(e)).collect()
    }
}

fn check_decorator(decorator: &Decorator, allowed: &[&str], target: &'static str) -> Result<()> {
    if allowed.contains(&decorator.name.inner().as_str()) {
        Ok(())
    } else {
        Err(ShaderError::UnsupportedDecorator {
            name: decorator.name.inner().clone(),
            target,
            span: decorator.span,
        })
    }
}

fn unsupported(construct: &str, span: Span) -> ShaderError {
    ShaderError::UnsupportedConstruct {
        construct: construct.to_string(),
        span,
    }
}

#[cfg(test)]
mod tests {
    use weft_parser::ErrorCode;

    use super::*;

    fn compile(source: &str) -> Result<String> {
        let unit = weft_parser::parse("shader.weft", source).expect("source should parse");
        let layouts = LayoutTable::build(&unit.gpu_structs)?;
        generate(&unit, &layouts)
    }

    fn compile_ok(source: &str) -> String {
        compile(source).unwrap_or_else(|e| panic!("shader generation failed: {e}"))
    }

    fn function(body: &str) -> Result<String> {
        compile(&format!(
            "package main\n@compute @workgroup_size(1)\nfunc main() {{\n{body}\n}}"
        ))
    }

    #[test]
    fn test_particles() {
        let wgsl = compile_ok(
            r#"
            package main

            @gpu
            type Particle struct {
                pos vec4
                vel vec4
            }

            @group(0) @binding(0) @storage(read_write)
            var particles []Particle

            @compute @workgroup_size(64)
            func step(@builtin(global_invocation_id) id vec3u) {
                i := id.x
                particles[i].pos = particles[i].pos + particles[i].vel
            }
            "#,
        );
        let expected = "\
struct Particle {
    pos: vec4<f32>,
    vel: vec4<f32>,
}

@group(0) @binding(0) var<storage, read_write> particles: array<Particle>;

@compute @workgroup_size(64)
fn step(@builtin(global_invocation_id) id: vec3<u32>) {
    var i = id.x;
    particles[i].pos = particles[i].pos + particles[i].vel;
}
";
        assert_eq!(wgsl, expected);
    }

    #[test]
    fn test_literal_index_then_field() {
        let wgsl = compile_ok(
            r#"
            package main
            @gpu
            type Particle struct { pos vec4 }
            @group(0) @binding(0) @storage(read_write)
            var ps []Particle
            @compute @workgroup_size(1)
            func main() {
                v := ps[1].pos
                ps[0].pos = v
            }
            "#,
        );
        assert!(wgsl.contains("    var v = ps[1].pos;\n"), "{wgsl}");
        assert!(wgsl.contains("    ps[0].pos = v;\n"), "{wgsl}");
    }

    #[test]
    fn test_vertex_and_fragment_io() {
        let wgsl = compile_ok(
            r#"
            package main

            @gpu
            type VertexOut struct {
                @builtin(position) pos vec4
                @location(0) color vec4
            }

            @vertex
            func vs(@location(0) p vec2) VertexOut {
                return VertexOut{color: vec4(1.0, 0.0, 0.0, 1.0), pos: vec4(p.x, p.y, 0.0, 1.0)}
            }

            @fragment
            func fs(@location(0) color vec4) @location(0) vec4 {
                return color
            }
            "#,
        );
        assert!(wgsl.contains("    @builtin(position) pos: vec4<f32>,\n"));
        assert!(wgsl.contains("fn vs(@location(0) p: vec2<f32>) -> VertexOut {"));
        assert!(wgsl.contains(
            "return VertexOut(vec4<f32>(p.x, p.y, 0.0, 1.0), vec4<f32>(1.0, 0.0, 0.0, 1.0));"
        ));
        assert!(wgsl.contains("@fragment\nfn fs(@location(0) color: vec4<f32>) -> @location(0) vec4<f32> {"));
    }

    #[test]
    fn test_keyed_composite_fills_missing_fields() {
        let wgsl = compile_ok(
            r#"
            package main
            @gpu
            type Light struct {
                dir vec3
                power f32
            }
            @compute @workgroup_size(1)
            func main() {
                l := Light{power: 2.0}
            }
            "#,
        );
        assert!(wgsl.contains("var l = Light(vec3<f32>(), 2.0);"));
    }

    #[test]
    fn test_control_flow() {
        let wgsl = function(
            r#"
            var total f32 = 0.0
            for i := 0; i < 4; i++ {
                if i == 2 {
                    continue
                } else if i == 3 {
                    break
                } else {
                    total += 1.0
                }
            }
            for total < 10.0 {
                total *= 2.0
            }
            for {
                break
            }
            "#,
        )
        .expect("control flow");
        let expected_body = "\
    var total: f32 = 0.0;
    for (var i = 0; i < 4; i++) {
        if i == 2 {
            continue;
        } else if i == 3 {
            break;
        } else {
            total += 1.0;
        }
    }
    while total < 10.0 {
        total *= 2.0;
    }
    loop {
        break;
    }
";
        assert!(wgsl.contains(expected_body), "{wgsl}");
    }

    #[test]
    fn test_if_with_init_gets_a_block() {
        let wgsl = function("if x := 1.0; x > 0.5 { x = 0.0 }").expect("if");
        assert!(wgsl.contains("    {\n        var x = 1.0;\n        if x > 0.5 {\n"));
    }

    #[test]
    fn test_builtin_calls_and_unary() {
        let wgsl = function("v := -sqrt(abs(2.0)) * max(1.0, 3.0)\nn := ^1").expect("calls");
        assert!(wgsl.contains("var v = -sqrt(abs(2.0)) * max(1.0, 3.0);"));
        assert!(wgsl.contains("var n = ~1;"));
    }

    fn code(result: Result<String>) -> ErrorCode {
        result.expect_err("generation should fail").code()
    }

    #[test]
    fn test_rejections() {
        assert_eq!(code(function("ch <- 1")), ErrorCode::E302);
        assert_eq!(code(function("x := <-ch")), ErrorCode::E302);
        assert_eq!(code(function("ch := make(chan int)")), ErrorCode::E302);
        assert_eq!(code(function("xs := make([]f32, 4)")), ErrorCode::E303);
        assert_eq!(code(function("f := func() {}")), ErrorCode::E303);
        assert_eq!(code(function(r#"s := "text""#)), ErrorCode::E303);
        assert_eq!(code(function("for _, v := range xs { }")), ErrorCode::E303);
        assert_eq!(code(function("a, b := 1.0, 2.0")), ErrorCode::E303);
        assert_eq!(code(function("x := mystery(1.0)")), ErrorCode::E304);
        assert_eq!(code(function("math.Sin(1.0)")), ErrorCode::E304);
        assert_eq!(code(function("var s string")), ErrorCode::E300);
    }

    #[test]
    fn test_unknown_decorators() {
        let err = compile("package main\n@compute @inline\nfunc f() {}").expect_err("inline");
        assert!(matches!(
            err,
            ShaderError::UnsupportedDecorator { ref name, target: "function", .. } if name == "inline"
        ));

        let err = compile("package main\n@gpu @packed\ntype P struct { a f32 }").expect_err("packed");
        assert_eq!(err.code(), ErrorCode::E301);
    }

    #[test]
    fn test_user_functions_and_uniform_binding() {
        let wgsl = compile_ok(
            r#"
            package main
            @gpu
            type Params struct { scale f32 }
            @group(0) @binding(1) @uniform
            var params Params
            @private
            var counter u32
            func helper(x f32) f32 { return x }
            @compute @workgroup_size(8, 8)
            func main() {
                y := double(params.scale)
            }
            @vertex
            func double(@location(0) x f32) @location(0) f32 { return x * 2.0 }
            "#,
        );
        assert!(wgsl.contains("@group(0) @binding(1) var<uniform> params: Params;"));
        assert!(wgsl.contains("var<private> counter: u32;"));
        assert!(wgsl.contains("@compute @workgroup_size(8, 8)"));
        assert!(wgsl.contains("var y = double(params.scale);"));
        assert!(!wgsl.contains("helper"));
    }
}
