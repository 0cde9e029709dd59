//! Reserved identifiers: built-in element tags and built-in prop names.
//!
//! A statement may not start with one of these names; the parser treats
//! them as the start of a UI element instead. The tables are built once on
//! first use and are read-only afterwards.

use std::{collections::HashMap, sync::LazyLock};

/// Element tag → rendered tag name.
static ELEMENT_TAGS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    [
        ("A", "a"),
        ("Article", "article"),
        ("Aside", "aside"),
        ("Br", "br"),
        ("Button", "button"),
        ("Canvas", "canvas"),
        ("Code", "code"),
        ("Div", "div"),
        ("Em", "em"),
        ("Footer", "footer"),
        ("Form", "form"),
        ("H1", "h1"),
        ("H2", "h2"),
        ("H3", "h3"),
        ("H4", "h4"),
        ("H5", "h5"),
        ("H6", "h6"),
        ("Header", "header"),
        ("Hr", "hr"),
        ("Img", "img"),
        ("Input", "input"),
        ("Label", "label"),
        ("Li", "li"),
        ("Main", "main"),
        ("Nav", "nav"),
        ("Ol", "ol"),
        ("Option", "option"),
        ("P", "p"),
        ("Pre", "pre"),
        ("Section", "section"),
        ("Select", "select"),
        ("Span", "span"),
        ("Strong", "strong"),
        ("Table", "table"),
        ("Td", "td"),
        ("Textarea", "textarea"),
        ("Th", "th"),
        ("Tr", "tr"),
        ("Ul", "ul"),
    ]
    .into_iter()
    .collect()
});

/// Built-in prop name → prop key on the parent element.
static BUILTIN_PROPS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    [
        ("Alt", "alt"),
        ("Checked", "checked"),
        ("Class", "class"),
        ("Disabled", "disabled"),
        ("Href", "href"),
        ("Id", "id"),
        ("Key", "key"),
        ("OnChange", "onChange"),
        ("OnClick", "onClick"),
        ("OnInput", "onInput"),
        ("OnKeyDown", "onKeyDown"),
        ("OnMouseEnter", "onMouseEnter"),
        ("OnMouseLeave", "onMouseLeave"),
        ("OnSubmit", "onSubmit"),
        ("Placeholder", "placeholder"),
        ("Src", "src"),
        ("Style", "style"),
        ("Title", "title"),
        ("Value", "value"),
    ]
    .into_iter()
    .collect()
});

/// Returns `true` if `name` can never start a statement.
pub fn is_reserved(name: &str) -> bool {
    ELEMENT_TAGS.contains_key(name) || BUILTIN_PROPS.contains_key(name)
}

/// The rendered tag for a built-in element, e.g. `Div` → `div`.
pub fn element_tag(name: &str) -> Option<&'static str> {
    ELEMENT_TAGS.get(name).copied()
}

/// The prop key for a built-in prop node, e.g. `OnClick` → `onClick`.
pub fn builtin_prop(name: &str) -> Option<&'static str> {
    BUILTIN_PROPS.get(name).copied()
}
