//! Go source generation.
//!
//! Every renderable component becomes a struct with a constructor and the
//! `Render`/`Mount`/`Unmount`/`Update` methods expected by the runtime.
//! Plain functions and type definitions pass through. Output is laid out
//! the way gofmt would lay it out, so it is stable across runs.
//!
//! - `component`: struct, constructor and lifecycle methods of one unit
//! - `lower`: statements and expressions, with state rewriting
//! - `node`: child nodes to `rt.Element` / `rt.Text` calls
//! - `syntax`: Go spelling of types, strings and names

mod component;
mod lower;
mod node;
mod syntax;

use std::collections::BTreeSet;

use log::{debug, info};

use weft_core::ast::{CompilationUnit, Component, TypeDef};

use crate::{config::CodegenConfig, writer::CodeWriter};

use component::{UnitEmitter, struct_block};
use lower::{Lowerer, State};

/// Generate the Go file for `unit` in package `package`.
///
/// Generation has no failure mode: every unit the parser accepts lowers.
/// Undefined names are left for the Go compiler to report.
pub fn generate(unit: &CompilationUnit, package: &str, config: &CodegenConfig) -> String {
    info!(
        package,
        components = unit.components.len(),
        types = unit.types.len();
        "Generating Go source"
    );

    let mut body = CodeWriter::tabs();
    let mut emitter = UnitEmitter::new(unit, config);
    let mut uses_fmt = false;
    let mut uses_runtime = false;

    for def in &unit.types {
        emit_type_def(&mut body, def, config, &mut uses_runtime);
    }
    for component in &unit.components {
        if component.is_renderable() {
            emitter.emit(&mut body, component);
        } else {
            let mut lowerer = Lowerer::new(unit, config.runtime_alias(), State::default());
            emit_function(&mut body, &mut lowerer, component);
            uses_fmt |= lowerer.uses_fmt;
            uses_runtime |= lowerer.uses_runtime;
        }
    }
    uses_fmt |= emitter.uses_fmt;
    uses_runtime |= emitter.uses_runtime;

    let mut out = CodeWriter::tabs();
    if !config.header().is_empty() {
        out.line(config.header());
        out.blank();
    }
    out.line(format!("package {package}"));
    out.blank();
    emit_imports(&mut out, unit, config, uses_fmt, uses_runtime);

    let mut text = out.finish();
    text.push_str(&body.finish());
    let mut text = text.trim_end().to_string();
    text.push('\n');
    debug!(bytes = text.len(); "Go source generated");
    text
}

fn emit_type_def(out: &mut CodeWriter, def: &TypeDef, config: &CodegenConfig, uses_runtime: &mut bool) {
    let rows: Vec<(String, String)> = def
        .fields
        .iter()
        .map(|f| {
            let ty = syntax::go_type(&f.ty, config.runtime_alias(), uses_runtime);
            (f.name.inner().clone(), ty)
        })
        .collect();
    struct_block(out, def.name.inner(), &rows);
    out.blank();
}

/// A plain function: hoisted `var`s first, then the statements. Child
/// nodes have no meaning here and are dropped.
fn emit_function(out: &mut CodeWriter, lowerer: &mut Lowerer<'_>, component: &Component) {
    if !component.body.nodes.is_empty() {
        debug!(name = component.name.inner().as_str(); "Nodes in a plain function dropped");
    }
    let params = lowerer.params(&component.params);
    out.line(format!("func {}({params}) {{", component.name.inner()));
    out.indent();
    lowerer.push_scope();
    lowerer.declare_params(&component.params);
    for decl in &component.body.vars {
        lowerer.level = out.level();
        let text = lowerer.var_decl(decl);
        out.line(text);
    }
    lowerer.stmts(out, &component.body.stmts);
    lowerer.pop_scope();
    out.dedent();
    out.line("}");
    out.blank();
}

fn emit_imports(
    out: &mut CodeWriter,
    unit: &CompilationUnit,
    config: &CodegenConfig,
    uses_fmt: bool,
    uses_runtime: bool,
) {
    let mut std = BTreeSet::new();
    let mut external = BTreeSet::new();
    let mut add = |path: &str, line: String| {
        let first = path.split('/').next().unwrap_or(path);
        if first.contains('.') {
            external.insert((path.to_string(), line));
        } else {
            std.insert((path.to_string(), line));
        }
    };

    for import in &unit.imports {
        let path = import.inner();
        if uses_runtime && path == config.runtime_import() {
            continue;
        }
        add(path, syntax::quote(path));
    }
    if uses_fmt && !unit.imports.iter().any(|i| i.inner() == "fmt") {
        add("fmt", syntax::quote("fmt"));
    }
    if uses_runtime {
        let path = config.runtime_import();
        let last = path.rsplit('/').next().unwrap_or(path);
        let line = if last == config.runtime_alias() {
            syntax::quote(path)
        } else {
            format!("{} {}", config.runtime_alias(), syntax::quote(path))
        };
        add(path, line);
    }

    let groups: Vec<Vec<String>> = [std, external]
        .into_iter()
        .filter(|g| !g.is_empty())
        .map(|g| g.into_iter().map(|(_, line)| line).collect())
        .collect();

    match groups.as_slice() {
        [] => {}
        [group] if group.len() == 1 => {
            out.line(format!("import {}", group[0]));
            out.blank();
        }
        groups => {
            out.line("import (");
            out.indent();
            for (i, group) in groups.iter().enumerate() {
                if i > 0 {
                    out.blank();
                }
                for line in group {
                    out.line(line);
                }
            }
            out.dedent();
            out.line(")");
            out.blank();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn go(source: &str) -> String {
        let unit = weft_parser::parse("codegen.weft", source).expect("source should parse");
        generate(&unit, "app", &CodegenConfig::default())
    }

    fn count(haystack: &str, needle: &str) -> usize {
        haystack.matches(needle).count()
    }

    #[test]
    fn test_counter_unit() {
        let out = go("package main\nfunc Counter(n int) (Node) { Div { `{n}` } }");
        let expected = "\
// Code generated by weft. DO NOT EDIT.

package app

import (
\t\"fmt\"

\trt \"github.com/weft-lang/weft/runtime\"
)

// Counter is a renderable unit.
type Counter struct {
\tn int
}

// NewCounter creates a Counter.
func NewCounter(n int) *Counter {
\tc := &Counter{
\t\tn: n,
\t}
\treturn c
}

// Render builds the node tree of Counter.
func (c *Counter) Render() rt.Node {
\treturn rt.Element(\"div\", nil,
\t\trt.Text(fmt.Sprintf(\"%v\", c.n)),
\t)
}

// Mount starts listening on the channel props of Counter.
func (c *Counter) Mount() {}

// Unmount stops the listeners started by Mount.
func (c *Counter) Unmount() {}

// Update schedules a re-render of Counter.
func (c *Counter) Update() {
\trt.ScheduleUpdate(c)
}
";
        assert_eq!(out, expected);
    }

    #[test]
    fn test_channel_listeners_match_channel_params() {
        let out = go(
            "package main\nfunc Ticker(a chan int, b <-chan string, label string) (Node) { P { `{label}` } }",
        );
        assert_eq!(count(&out, "go func("), 2);
        assert!(out.contains("\tif c.a != nil {\n\t\tgo func(ch <-chan int, quit <-chan struct{}) {"));
        assert!(out.contains("\t\t\t\t\tc.bValue = v\n\t\t\t\t\tc.Update()\n"));
        assert!(out.contains("\t\t}(c.b, c.quit)\n"));
        assert!(out.contains("\tquit   chan struct{}\n"));
        assert!(out.contains("\tc.quit = make(chan struct{})\n"));
        assert!(out.contains("\t\tclose(c.quit)\n"));

        let plain = go("package main\nfunc Plain(label string) (Node) { P { `{label}` } }");
        assert_eq!(count(&plain, "go func("), 0);
        assert!(!plain.contains("quit"));
        assert!(plain.contains("func (c *Plain) Mount() {}"));
    }

    #[test]
    fn test_template_receive_reads_mirror() {
        let out = go("package main\nfunc Live(count chan int) (Node) { Span { `Count: {<-count}` } }");
        assert!(out.contains("fmt.Sprintf(\"Count: %v\", c.countValue)"));
        assert!(out.contains("\tcountValue int\n"));
    }

    #[test]
    fn test_hoisted_channel_received_in_template() {
        let out = go(
            "package main\nfunc Clock() (Node) {\n var ticks = make(chan int, 1)\n P { `{<-ticks}` }\n}",
        );
        assert!(out.contains("\tticks      chan int\n\tticksValue int\n"));
        assert!(out.contains("\tc.ticks = make(chan int, 1)\n"));
        assert_eq!(count(&out, "go func("), 1);
        assert!(out.contains("}(c.ticks, c.quit)"));
    }

    #[test]
    fn test_hoisted_state_and_event_handler() {
        let out = go(
            r#"package main
func Clicker(start int) (Node) {
    var clicks int = start
    var label = "clicks"
    Button(onClick: func() { clicks++ }) {
        Class("primary")
        `{label}: {clicks}`
    }
}"#,
        );
        assert!(out.contains("\tstart  int\n\tclicks int\n\tlabel  string\n"));
        assert!(out.contains("\tc.clicks = c.start\n\tc.label = \"clicks\"\n\treturn c\n"));
        let expected_render = "\
\treturn rt.Element(\"button\", rt.Props{\"onClick\": func() {
\t\tdefer c.Update()
\t\tc.clicks++
\t}, \"class\": \"primary\"},
\t\trt.Text(fmt.Sprintf(\"%v: %v\", c.label, c.clicks)),
\t)
";
        assert!(out.contains(expected_render), "{out}");
    }

    #[test]
    fn test_auto_props_strategy() {
        let out = go("package main\n@props\nfunc Card(title string, tags ...string) (Node) { H1 { `{title}` } }");
        assert!(out.contains("type CardProps struct {\n\tTitle string\n\tTags  []string\n}"));
        assert!(out.contains("type CardOption func(*CardProps)"));
        assert!(out.contains(
            "func CardWithTitle(v string) CardOption {\n\treturn func(p *CardProps) {\n\t\tp.Title = v\n\t}\n}"
        ));
        assert!(out.contains("func CardWithTags(v ...string) CardOption {"));
        assert!(out.contains("type Card struct {\n\tprops CardProps\n}"));
        assert!(out.contains(
            "func NewCard(opts ...CardOption) *Card {\n\tc := &Card{}\n\tfor _, opt := range opts {\n\t\topt(&c.props)\n\t}\n\treturn c\n}"
        ));
        assert!(out.contains("fmt.Sprintf(\"%v\", c.props.Title)"));
    }

    #[test]
    fn test_render_statements_and_fragment() {
        let out = go(
            r#"package main
func List(items []string) (Node) {
    total := len(items)
    H2 { `{total} items` }
    Ul {
        for i, item := range items {
            Li { `{i}: {item}` }
        }
    }
}"#,
        );
        let expected = "\
func (c *List) Render() rt.Node {
\ttotal := len(c.items)
\treturn rt.Fragment(
\t\trt.Element(\"h2\", nil,
\t\t\trt.Text(fmt.Sprintf(\"%v items\", total)),
\t\t),
\t\trt.Element(\"ul\", nil,
\t\t\tfunc() rt.Node {
\t\t\t\tvar nodes []rt.Node
\t\t\t\tfor i, item := range c.items {
\t\t\t\t\tnodes = append(nodes, rt.Element(\"li\", nil,
\t\t\t\t\t\trt.Text(fmt.Sprintf(\"%v: %v\", i, item)),
\t\t\t\t\t))
\t\t\t\t}
\t\t\t\treturn rt.Fragment(nodes...)
\t\t\t}(),
\t\t),
\t)
}
";
        assert!(out.contains(expected), "{out}");
    }

    #[test]
    fn test_node_conditional() {
        let out = go(
            r#"package main
func Badge(n int) (Node) {
    if n > 3 { P { "many" } } else { P { "few" } }
}"#,
        );
        let expected = "\
\treturn func() rt.Node {
\t\tif c.n > 3 {
\t\t\treturn rt.Element(\"p\", nil,
\t\t\t\trt.Text(\"many\"),
\t\t\t)
\t\t}
\t\treturn rt.Element(\"p\", nil,
\t\t\trt.Text(\"few\"),
\t\t)
\t}()
";
        assert!(out.contains(expected), "{out}");
    }

    #[test]
    fn test_embedded_components() {
        let out = go(
            r#"package main
func Tag(text string, size int) (Node) { Span { `{text}` } }
@props
func Icon(name string) (Node) { I { `{name}` } }
func Page() (Node) {
    Div {
        Tag(size: 2)
        Icon("star")
        Remote("x", 1)
    }
}"#,
        );
        assert!(out.contains("rt.Embed(NewTag(*new(string), 2))"));
        assert!(out.contains("rt.Embed(NewIcon(IconWithName(\"star\")))"));
        assert!(out.contains("rt.Embed(NewRemote(\"x\", 1))"));
    }

    #[test]
    fn test_plain_function_and_type_pass_through() {
        let out = go(
            r#"package main
import "strings"
type Point struct {
    X int
    Label string
}
func log(msg string) {
    var prefix = "> "
    println(strings.ToUpper(prefix + msg))
}"#,
        );
        assert!(out.contains("type Point struct {\n\tX     int\n\tLabel string\n}"));
        assert!(out.contains(
            "func log(msg string) {\n\tvar prefix = \"> \"\n\tprintln(strings.ToUpper(prefix + msg))\n}"
        ));
        assert!(out.contains("import \"strings\"\n"));
        assert!(!out.contains("runtime"));
    }

    #[test]
    fn test_custom_runtime_import() {
        let unit = weft_parser::parse("c.weft", "package main\nfunc A() (Node) { Br() }").expect("parse");
        let config = CodegenConfig::new("example.com/ui/runtime", "runtime", "");
        let out = generate(&unit, "ui", &config);
        assert!(out.starts_with("package ui\n\nimport \"example.com/ui/runtime\"\n"));
        assert!(out.contains("return runtime.Element(\"br\", nil)"));
    }
}
