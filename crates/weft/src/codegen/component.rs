//! Renderable units: struct, constructor and the runtime lifecycle.

use std::collections::HashSet;

use log::{debug, trace};

use weft_core::{
    ast::{Component, CompilationUnit, Param, TemplateLit, TypeDesc},
    visitor::{self, Accept, Visitor},
};

use super::{
    lower::{Lowerer, State},
    syntax::{align, infer_type},
};
use crate::{config::CodegenConfig, naming::exported, writer::CodeWriter};

/// A channel whose last received value is mirrored into a field.
struct ChannelProp {
    /// Source name of the parameter or hoisted variable.
    name: String,
    /// Go expression of the channel, e.g. `c.count`.
    access: String,
    /// Go field holding the last received value.
    mirror: String,
    elem: TypeDesc,
}

/// Channels read through `{<-ch}` in a template.
#[derive(Default)]
struct TemplateReceives {
    names: HashSet<String>,
}

impl Visitor for TemplateReceives {
    fn visit_template(&mut self, template: &TemplateLit) {
        self.names
            .extend(template.received_channels().map(|c| c.inner().clone()));
        visitor::walk_template(self, template);
    }
}

/// Generated-code facts about one renderable component.
pub(super) struct UnitPlan<'a> {
    component: &'a Component,
    /// `(field, type)` rows of the struct, in declaration order.
    fields: Vec<(String, String)>,
    channels: Vec<ChannelProp>,
}

impl<'a> UnitPlan<'a> {
    fn name(&self) -> &str {
        self.component.name.inner()
    }
}

/// Emits one renderable unit.
pub(super) struct UnitEmitter<'a> {
    unit: &'a CompilationUnit,
    config: &'a CodegenConfig,
    pub(super) uses_fmt: bool,
    pub(super) uses_runtime: bool,
}

impl<'a> UnitEmitter<'a> {
    pub fn new(unit: &'a CompilationUnit, config: &'a CodegenConfig) -> Self {
        Self {
            unit,
            config,
            uses_fmt: false,
            uses_runtime: false,
        }
    }

    fn alias(&self) -> &'a str {
        self.config.runtime_alias()
    }

    /// A lowerer with every parameter and hoisted variable bound to its
    /// field.
    fn lowerer(&self, component: &Component, channels: &[ChannelProp]) -> Lowerer<'a> {
        let mut state = State::default();
        for param in &component.params {
            state.insert_field(param.name.inner(), param_access(component, param));
        }
        for decl in &component.body.vars {
            for name in &decl.names {
                state.insert_field(name.inner(), format!("c.{}", name.inner()));
            }
        }
        for channel in channels {
            state.insert_mirror(&channel.name, channel.mirror.clone());
        }
        Lowerer::new(self.unit, self.alias(), state)
    }

    fn finish_lowerer(&mut self, lowerer: &Lowerer<'_>) {
        self.uses_fmt |= lowerer.uses_fmt;
        self.uses_runtime |= lowerer.uses_runtime;
    }

    fn plan(&mut self, component: &'a Component) -> UnitPlan<'a> {
        let alias = self.alias();
        let mut lowerer = Lowerer::new(self.unit, alias, State::default());
        let mut fields = Vec::new();

        if component.auto_props {
            if !component.params.is_empty() {
                fields.push(("props".to_string(), format!("{}Props", component.name.inner())));
            }
        } else {
            for param in &component.params {
                fields.push((param.name.inner().clone(), param_type(&mut lowerer, param)));
            }
        }

        for decl in &component.body.vars {
            for (i, name) in decl.names.iter().enumerate() {
                let ty = match &decl.ty {
                    Some(ty) => Some(ty.inner().clone()),
                    None if decl.values.len() == decl.names.len() => {
                        decl.values[i].as_primary().and_then(infer_type)
                    }
                    None => None,
                };
                let go = match &ty {
                    Some(ty) => lowerer.go_type(ty),
                    None => "any".to_string(),
                };
                fields.push((name.inner().clone(), go));
            }
        }

        let channels = channel_props(component);
        for channel in &channels {
            let mirror = channel.mirror.trim_start_matches("c.").to_string();
            fields.push((mirror, lowerer.go_type(&channel.elem)));
        }
        if !channels.is_empty() {
            fields.push(("quit".to_string(), "chan struct{}".to_string()));
        }

        self.finish_lowerer(&lowerer);
        UnitPlan {
            component,
            fields,
            channels,
        }
    }

    pub fn emit(&mut self, out: &mut CodeWriter, component: &'a Component) {
        let plan = self.plan(component);
        debug!(
            name = plan.name(),
            fields = plan.fields.len(),
            channels = plan.channels.len(),
            auto_props = component.auto_props;
            "Emitting renderable unit"
        );

        if component.auto_props {
            self.emit_props(out, &plan);
        }
        self.emit_struct(out, &plan);
        self.emit_constructor(out, &plan);
        self.emit_render(out, &plan);
        self.emit_mount(out, &plan);
        self.emit_unmount(out, &plan);
        self.emit_update(out, &plan);
    }

    fn emit_props(&mut self, out: &mut CodeWriter, plan: &UnitPlan<'_>) {
        let name = plan.name();
        let mut lowerer = Lowerer::new(self.unit, self.alias(), State::default());
        let rows: Vec<(String, String)> = plan
            .component
            .params
            .iter()
            .map(|p| (exported(p.name.inner()), param_type(&mut lowerer, p)))
            .collect();

        out.line(format!("// {name}Props holds the properties of {name}."));
        struct_block(out, &format!("{name}Props"), &rows);
        out.blank();

        out.line(format!("// {name}Option sets one property of {name}."));
        out.line(format!("type {name}Option func(*{name}Props)"));
        out.blank();

        for param in &plan.component.params {
            let field = exported(param.name.inner());
            let ty = lowerer.go_type(&param.ty);
            let variadic = if param.variadic { "..." } else { "" };
            out.line(format!("// {name}With{field} sets {field}."));
            out.line(format!("func {name}With{field}(v {variadic}{ty}) {name}Option {{"));
            out.indent();
            out.line(format!("return func(p *{name}Props) {{"));
            out.indent();
            out.line(format!("p.{field} = v"));
            out.dedent();
            out.line("}");
            out.dedent();
            out.line("}");
            out.blank();
        }
        self.finish_lowerer(&lowerer);
    }

    fn emit_struct(&mut self, out: &mut CodeWriter, plan: &UnitPlan<'_>) {
        let name = plan.name();
        out.line(format!("// {name} is a renderable unit."));
        struct_block(out, name, &plan.fields);
        out.blank();
    }

    fn emit_constructor(&mut self, out: &mut CodeWriter, plan: &UnitPlan<'a>) {
        let name = plan.name();
        let component = plan.component;
        let mut lowerer = self.lowerer(component, &plan.channels);

        out.line(format!("// New{name} creates a {name}."));
        if component.auto_props {
            out.line(format!("func New{name}(opts ...{name}Option) *{name} {{"));
            out.indent();
            out.line(format!("c := &{name}{{}}"));
            if !component.params.is_empty() {
                out.line("for _, opt := range opts {");
                out.indent();
                out.line("opt(&c.props)");
                out.dedent();
                out.line("}");
            }
        } else {
            let params = lowerer.params(&component.params);
            out.line(format!("func New{name}({params}) *{name} {{"));
            out.indent();
            if component.params.is_empty() {
                out.line(format!("c := &{name}{{}}"));
            } else {
                out.line(format!("c := &{name}{{"));
                out.indent();
                for param in &component.params {
                    out.line(format!("{0}: {0},", param.name.inner()));
                }
                out.dedent();
                out.line("}");
            }
        }

        for decl in &component.body.vars {
            if decl.values.is_empty() {
                continue;
            }
            lowerer.level = out.level();
            let targets: Vec<String> = decl
                .names
                .iter()
                .map(|n| format!("c.{}", n.inner()))
                .collect();
            let values = lowerer.expr_list(&decl.values);
            out.line(format!("{} = {values}", targets.join(", ")));
        }
        out.line("return c");
        out.dedent();
        out.line("}");
        out.blank();
        self.finish_lowerer(&lowerer);
    }

    fn emit_render(&mut self, out: &mut CodeWriter, plan: &UnitPlan<'a>) {
        let name = plan.name();
        let component = plan.component;
        let mut lowerer = self.lowerer(component, &plan.channels);
        let node = lowerer.runtime("Node");

        out.line(format!("// Render builds the node tree of {name}."));
        out.line(format!("func (c *{name}) Render() {node} {{"));
        out.indent();
        lowerer.stmts(out, &component.body.stmts);
        let root = lowerer.node_list(&component.body.nodes, out.level());
        out.line(format!("return {root}"));
        out.dedent();
        out.line("}");
        out.blank();
        self.finish_lowerer(&lowerer);
    }

    fn emit_mount(&mut self, out: &mut CodeWriter, plan: &UnitPlan<'_>) {
        let name = plan.name();
        out.line(format!("// Mount starts listening on the channel props of {name}."));
        if plan.channels.is_empty() {
            out.line(format!("func (c *{name}) Mount() {{}}"));
            out.blank();
            return;
        }

        let mut lowerer = Lowerer::new(self.unit, self.alias(), State::default());
        out.line(format!("func (c *{name}) Mount() {{"));
        out.indent();
        out.line("c.quit = make(chan struct{})");
        for channel in &plan.channels {
            let elem = lowerer.go_type(&channel.elem);
            out.line(format!("if {} != nil {{", channel.access));
            out.indent();
            out.line(format!(
                "go func(ch <-chan {elem}, quit <-chan struct{{}}) {{"
            ));
            out.indent();
            out.line("for {");
            out.indent();
            out.line("select {");
            out.line("case v, ok := <-ch:");
            out.indent();
            out.line("if !ok {");
            out.indent();
            out.line("return");
            out.dedent();
            out.line("}");
            out.line(format!("{} = v", channel.mirror));
            out.line("c.Update()");
            out.dedent();
            out.line("case <-quit:");
            out.indent();
            out.line("return");
            out.dedent();
            out.line("}");
            out.dedent();
            out.line("}");
            out.dedent();
            out.line(format!("}}({}, c.quit)", channel.access));
            out.dedent();
            out.line("}");
        }
        out.dedent();
        out.line("}");
        out.blank();
        self.finish_lowerer(&lowerer);
    }

    fn emit_unmount(&mut self, out: &mut CodeWriter, plan: &UnitPlan<'_>) {
        let name = plan.name();
        out.line("// Unmount stops the listeners started by Mount.");
        if plan.channels.is_empty() {
            out.line(format!("func (c *{name}) Unmount() {{}}"));
            out.blank();
            return;
        }
        out.line(format!("func (c *{name}) Unmount() {{"));
        out.indent();
        out.line("if c.quit != nil {");
        out.indent();
        out.line("close(c.quit)");
        out.line("c.quit = nil");
        out.dedent();
        out.line("}");
        out.dedent();
        out.line("}");
        out.blank();
    }

    fn emit_update(&mut self, out: &mut CodeWriter, plan: &UnitPlan<'_>) {
        let name = plan.name();
        self.uses_runtime = true;
        out.line(format!("// Update schedules a re-render of {name}."));
        out.line(format!("func (c *{name}) Update() {{"));
        out.indent();
        out.line(format!("{}.ScheduleUpdate(c)", self.alias()));
        out.dedent();
        out.line("}");
        out.blank();
    }
}

/// Channel parameters, plus hoisted channels read from a template.
fn channel_props(component: &Component) -> Vec<ChannelProp> {
    let mut channels = Vec::new();
    for param in component.channel_params() {
        if let Some(elem) = param.ty.chan_elem() {
            channels.push(ChannelProp {
                name: param.name.inner().clone(),
                access: param_access(component, param),
                mirror: format!("c.{}Value", param.name.inner()),
                elem: elem.clone(),
            });
        }
    }

    let mut receives = TemplateReceives::default();
    component.body.accept(&mut receives);
    for decl in &component.body.vars {
        for (i, name) in decl.names.iter().enumerate() {
            if !receives.names.contains(name.inner().as_str()) {
                continue;
            }
            let ty = decl
                .ty
                .as_ref()
                .map(|t| t.inner().clone())
                .or_else(|| decl.values.get(i)?.as_primary().and_then(infer_type));
            match ty.as_ref().and_then(TypeDesc::chan_elem) {
                Some(elem) => channels.push(ChannelProp {
                    name: name.inner().clone(),
                    access: format!("c.{}", name.inner()),
                    mirror: format!("c.{}Value", name.inner()),
                    elem: elem.clone(),
                }),
                None => trace!(name = name.inner().as_str(); "Received name is not a known channel"),
            }
        }
    }
    channels
}

/// How a parameter is read inside methods of its unit.
fn param_access(component: &Component, param: &Param) -> String {
    if component.auto_props {
        format!("c.props.{}", exported(param.name.inner()))
    } else {
        format!("c.{}", param.name.inner())
    }
}

/// The stored type of a parameter; variadic parameters are slices.
fn param_type(lowerer: &mut Lowerer<'_>, param: &Param) -> String {
    let ty = lowerer.go_type(&param.ty);
    if param.variadic { format!("[]{ty}") } else { ty }
}

/// `type Name struct { ... }` with gofmt-aligned fields.
pub(super) fn struct_block(out: &mut CodeWriter, name: &str, rows: &[(String, String)]) {
    if rows.is_empty() {
        out.line(format!("type {name} struct{{}}"));
        return;
    }
    out.line(format!("type {name} struct {{"));
    out.indent();
    for row in align(rows, " ") {
        out.line(row);
    }
    out.dedent();
    out.line("}");
}
