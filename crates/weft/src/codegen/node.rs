//! Node lowering.
//!
//! A node lowers to a single Go expression of type `rt.Node`. Children are
//! written one per line with trailing commas, which is how gofmt lays out
//! a multi-line call. `level` is the indentation of the line the node
//! expression starts on.

use log::debug;

use weft_core::{
    ast::{Element, ElementArg, Expr, Literal, Node, NodeFor, NodeIf, Primary},
    reserved,
};

use super::{
    lower::{Lowerer, range_vars},
    syntax::quote,
};
use crate::naming::exported;

impl Lowerer<'_> {
    /// `nil`, the single node, or an `rt.Fragment` of all nodes.
    pub fn node_list(&mut self, nodes: &[Node], level: usize) -> String {
        let nodes = renderable(nodes);
        match nodes.as_slice() {
            [] => "nil".to_string(),
            [single] => self.node(single, level),
            many => {
                let fragment = self.runtime("Fragment");
                let children = many.iter().map(|n| self.node(n, level + 1)).collect();
                call_with_children(format!("{fragment}("), children, level, "")
            }
        }
    }

    /// Lower one node. Built-in prop nodes are filtered out by the caller.
    fn node(&mut self, node: &Node, level: usize) -> String {
        match node {
            Node::Element(element) => self.element(element, level),
            Node::Text(text) => format!("{}({})", self.runtime("Text"), quote(text)),
            Node::Template(template) => {
                self.level = level;
                let value = self.template(template);
                format!("{}({value})", self.runtime("Text"))
            }
            Node::If(node_if) => self.node_if(node_if, level),
            Node::For(node_for) => self.node_for(node_for, level),
        }
    }

    fn element(&mut self, element: &Element, level: usize) -> String {
        match reserved::element_tag(element.tag.inner()) {
            Some(html) => self.builtin_element(html, element, level),
            None => self.embed(element, level),
        }
    }

    fn builtin_element(&mut self, html: &str, element: &Element, level: usize) -> String {
        self.level = level;
        let mut props = Vec::new();
        let mut children = Vec::new();

        for arg in &element.args {
            let value = self.expr(&arg.value);
            match &arg.name {
                Some(name) => props.push(format!("{}: {value}", quote(name))),
                None => children.push(self.text_of(&arg.value, value)),
            }
        }

        // Prop nodes fold into this element's props.
        for child in &element.children {
            let Some(key) = prop_key(child) else {
                continue;
            };
            let Node::Element(prop) = child else {
                continue;
            };
            self.level = level;
            match prop.args.first() {
                Some(arg) => {
                    let value = self.expr(&arg.value);
                    props.push(format!("{}: {value}", quote(key)));
                }
                None => debug!(prop = key; "Prop node without a value ignored"),
            }
        }

        for child in element.children.iter().filter(|c| prop_key(c).is_none()) {
            children.push(self.node(child, level + 1));
        }

        let props = if props.is_empty() {
            "nil".to_string()
        } else {
            format!("{}{{{}}}", self.runtime("Props"), props.join(", "))
        };
        let head = format!("{}({}, {props}", self.runtime("Element"), quote(html));
        call_with_children(head, children, level, ", ")
    }

    /// A positional element argument rendered as a text child.
    fn text_of(&mut self, expr: &Expr, lowered: String) -> String {
        let text = self.runtime("Text");
        match expr.as_primary() {
            Some(Primary::Literal(Literal::String(_) | Literal::Template(_))) => {
                format!("{text}({lowered})")
            }
            _ => {
                self.uses_fmt = true;
                format!("{text}(fmt.Sprint({lowered}))")
            }
        }
    }

    /// `rt.Embed(NewX(...))` for a component element.
    fn embed(&mut self, element: &Element, level: usize) -> String {
        self.level = level;
        let tag = element.tag.inner();
        if !element.children.is_empty() {
            debug!(component = tag.as_str(); "Children of an embedded component ignored");
        }

        let unit = self.unit;
        let args = match unit.component(tag).filter(|c| c.is_renderable()) {
            Some(component) if component.auto_props => {
                let mut options = Vec::new();
                let mut positional = component.params.iter();
                for arg in &element.args {
                    let param = match &arg.name {
                        Some(name) => component
                            .params
                            .iter()
                            .find(|p| p.name.inner() == name.inner()),
                        None => positional.next(),
                    };
                    let Some(param) = param else {
                        debug!(component = tag.as_str(); "Argument without a matching prop ignored");
                        continue;
                    };
                    let value = self.expr(&arg.value);
                    options.push(format!("{tag}With{}({value})", exported(param.name.inner())));
                }
                options
            }
            Some(component) => {
                let mut args = Vec::with_capacity(component.params.len());
                let mut positional = element.args.iter().filter(|a| a.name.is_none());
                for param in &component.params {
                    let named = element
                        .args
                        .iter()
                        .find(|a| a.name.as_ref().map(|n| n.inner()) == Some(param.name.inner()));
                    if param.variadic {
                        match named {
                            Some(arg) => args.push(format!("{}...", self.expr(&arg.value))),
                            None => {
                                let rest: Vec<&ElementArg> = positional.by_ref().collect();
                                for arg in rest {
                                    args.push(self.expr(&arg.value));
                                }
                            }
                        }
                        continue;
                    }
                    match named.or_else(|| positional.next()) {
                        Some(arg) => args.push(self.expr(&arg.value)),
                        None => {
                            let ty = self.go_type(&param.ty);
                            args.push(format!("*new({ty})"));
                        }
                    }
                }
                args
            }
            // Declared in another file of the package.
            None => element.args.iter().map(|a| self.expr(&a.value)).collect(),
        };

        format!("{}(New{tag}({}))", self.runtime("Embed"), args.join(", "))
    }

    /// `func() rt.Node { if cond { return ... }; return ... }()`
    fn node_if(&mut self, node_if: &NodeIf, level: usize) -> String {
        let node = self.runtime("Node");
        let pad = "\t".repeat(level);
        self.level = level + 1;
        let cond = self.expr(&node_if.cond);
        let then = self.node_list(&node_if.then, level + 2);
        let otherwise = self.node_list(&node_if.otherwise, level + 1);

        format!(
            "func() {node} {{\n\
             {pad}\tif {cond} {{\n\
             {pad}\t\treturn {then}\n\
             {pad}\t}}\n\
             {pad}\treturn {otherwise}\n\
             {pad}}}()"
        )
    }

    /// A loop collecting its children into a fragment.
    fn node_for(&mut self, node_for: &NodeFor, level: usize) -> String {
        let node = self.runtime("Node");
        let fragment = self.runtime("Fragment");
        let pad = "\t".repeat(level);
        self.level = level + 1;
        let iterable = self.expr(&node_for.iterable);
        let vars = range_vars(node_for.key.as_deref(), node_for.value.as_deref());

        self.push_scope();
        for name in [&node_for.key, &node_for.value].into_iter().flatten() {
            self.declare(name.inner());
        }
        let append = match renderable(&node_for.children).as_slice() {
            [] => String::new(),
            [single] => {
                let child = self.node(single, level + 2);
                format!("{pad}\t\tnodes = append(nodes, {child})\n")
            }
            many => {
                let children = many.iter().map(|n| self.node(n, level + 3)).collect();
                let call = call_with_children("append(nodes".to_string(), children, level + 2, ", ");
                format!("{pad}\t\tnodes = {call}\n")
            }
        };
        self.pop_scope();

        format!(
            "func() {node} {{\n\
             {pad}\tvar nodes []{node}\n\
             {pad}\tfor {vars}range {iterable} {{\n\
             {append}\
             {pad}\t}}\n\
             {pad}\treturn {fragment}(nodes...)\n\
             {pad}}}()"
        )
    }
}

/// The prop key of a built-in prop node such as `Class("x")`.
fn prop_key(node: &Node) -> Option<&'static str> {
    match node {
        Node::Element(element) => reserved::builtin_prop(element.tag.inner()),
        _ => None,
    }
}

/// Nodes that render on their own; prop nodes outside an element have no
/// parent to fold into.
fn renderable(nodes: &[Node]) -> Vec<&Node> {
    nodes
        .iter()
        .filter(|node| match prop_key(node) {
            Some(key) => {
                debug!(prop = key; "Prop node outside an element ignored");
                false
            }
            None => true,
        })
        .collect()
}

/// Close `head` directly without children, otherwise put one child per
/// line. `separator` goes between the head and the first child.
fn call_with_children(head: String, children: Vec<String>, level: usize, separator: &str) -> String {
    if children.is_empty() {
        return format!("{head})");
    }
    let pad = "\t".repeat(level);
    let mut text = format!("{head}{}\n", separator.trim_end());
    for child in children {
        text.push_str(&pad);
        text.push('\t');
        text.push_str(&child);
        text.push_str(",\n");
    }
    text.push_str(&pad);
    text.push(')');
    text
}
