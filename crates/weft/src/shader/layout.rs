//! Memory layout of GPU structs.
//!
//! Each field is placed at the next multiple of its alignment; the struct's
//! alignment is the largest field alignment and its size is rounded up to
//! that alignment. Structs may nest: a struct field uses the nested
//! struct's computed size and alignment.

use indexmap::{IndexMap, IndexSet};
use log::trace;

use weft_core::{
    ast::{GpuStruct, TypeDesc},
    span::{Span, Spanned},
};

use super::{ShaderError, types};

/// Round `value` up to the next multiple of `align`.
pub fn round_up(value: u32, align: u32) -> u32 {
    if align == 0 {
        return value;
    }
    value.div_ceil(align) * align
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLayout {
    pub name: String,
    pub offset: u32,
    pub size: u32,
    pub align: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructLayout {
    pub fields: Vec<FieldLayout>,
    pub size: u32,
    pub align: u32,
}

impl StructLayout {
    /// Lay out `(name, size, align)` triples in order.
    pub fn compute<'a>(fields: impl IntoIterator<Item = (&'a str, u32, u32)>) -> Self {
        let mut offset = 0;
        let mut max_align = 1;
        let mut placed = Vec::new();

        for (name, size, align) in fields {
            offset = round_up(offset, align);
            placed.push(FieldLayout {
                name: name.to_string(),
                offset,
                size,
                align,
            });
            offset += size;
            max_align = max_align.max(align);
        }

        Self {
            fields: placed,
            size: round_up(offset, max_align),
            align: max_align,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldLayout> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Layouts of every GPU struct in a unit, in declaration order.
#[derive(Debug, Default)]
pub struct LayoutTable {
    structs: IndexMap<String, StructLayout>,
}

impl LayoutTable {
    /// Compute layouts for `structs`.
    ///
    /// # Errors
    ///
    /// Fails with [`ShaderError::UnknownType`] when a field type is neither a
    /// built-in GPU type nor another GPU struct, or when structs contain each
    /// other.
    pub fn build(structs: &[GpuStruct]) -> Result<Self, ShaderError> {
        let decls: IndexMap<&str, &GpuStruct> = structs
            .iter()
            .map(|s| (s.name.inner().as_str(), s))
            .collect();

        let mut table = Self::default();
        let mut in_progress = IndexSet::new();
        for name in decls.keys() {
            table.resolve(name, &decls, &mut in_progress)?;
        }
        Ok(table)
    }

    fn resolve(
        &mut self,
        name: &str,
        decls: &IndexMap<&str, &GpuStruct>,
        in_progress: &mut IndexSet<String>,
    ) -> Result<(u32, u32), ShaderError> {
        if let Some(layout) = self.structs.get(name) {
            return Ok((layout.size, layout.align));
        }
        let Some(decl) = decls.get(name) else {
            return Err(ShaderError::UnknownType {
                name: name.to_string(),
                reason: "not a GPU type".to_string(),
                span: Span::default(),
            });
        };
        if !in_progress.insert(name.to_string()) {
            return Err(ShaderError::UnknownType {
                name: name.to_string(),
                reason: "struct contains itself".to_string(),
                span: decl.name.span(),
            });
        }

        let mut fields = Vec::with_capacity(decl.fields.len());
        for field in &decl.fields {
            let type_name = field_type_name(&field.ty)?;
            let (size, align) = if let Some(builtin) = types::lookup(type_name) {
                (builtin.size, builtin.align)
            } else if decls.contains_key(type_name) {
                self.resolve(type_name, decls, in_progress)?
            } else {
                return Err(ShaderError::UnknownType {
                    name: type_name.to_string(),
                    reason: "not a GPU type".to_string(),
                    span: field.ty.span(),
                });
            };
            fields.push((field.name.inner().as_str(), size, align));
        }

        let layout = StructLayout::compute(fields);
        trace!(name = name, size = layout.size, align = layout.align; "Laid out GPU struct");
        let result = (layout.size, layout.align);
        in_progress.shift_remove(name);
        self.structs.insert(name.to_string(), layout);
        Ok(result)
    }

    pub fn get(&self, name: &str) -> Option<&StructLayout> {
        self.structs.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StructLayout)> {
        self.structs.iter().map(|(name, layout)| (name.as_str(), layout))
    }
}

/// The base name of a struct field type; only plain names are allowed
/// inside structs.
fn field_type_name(ty: &Spanned<TypeDesc>) -> Result<&str, ShaderError> {
    match ty.inner() {
        TypeDesc::Named { name, arg: None } => Ok(name),
        TypeDesc::Slice(_) => Err(ShaderError::UnknownType {
            name: ty.to_string(),
            reason: "runtime-sized arrays are only allowed as storage bindings".to_string(),
            span: ty.span(),
        }),
        _ => Err(ShaderError::UnknownType {
            name: ty.to_string(),
            reason: "not a GPU type".to_string(),
            span: ty.span(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn layout_of(names: &[&str]) -> StructLayout {
        StructLayout::compute(names.iter().map(|n| {
            let ty = types::lookup(n).expect("known type");
            (*n, ty.size, ty.align)
        }))
    }

    fn offsets(layout: &StructLayout) -> Vec<u32> {
        layout.fields.iter().map(|f| f.offset).collect()
    }

    #[test]
    fn test_scalar_then_vec4() {
        let layout = layout_of(&["f32", "vec4"]);
        assert_eq!(offsets(&layout), vec![0, 16]);
        assert_eq!(layout.size, 32);
        assert_eq!(layout.align, 16);
    }

    #[test]
    fn test_vec2_then_vec4() {
        let layout = layout_of(&["vec2", "vec4"]);
        assert_eq!(offsets(&layout), vec![0, 16]);
        assert_eq!(layout.size, 32);
    }

    #[test]
    fn test_vec3_followed_by_scalar_packs() {
        let layout = layout_of(&["vec3", "f32"]);
        assert_eq!(offsets(&layout), vec![0, 12]);
        assert_eq!(layout.size, 16);
    }

    #[test]
    fn test_trailing_padding() {
        let layout = layout_of(&["vec4", "f32"]);
        assert_eq!(offsets(&layout), vec![0, 16]);
        assert_eq!(layout.size, 32);
    }

    #[test]
    fn test_empty_struct() {
        let layout = StructLayout::compute(std::iter::empty());
        assert_eq!(layout.size, 0);
        assert_eq!(layout.align, 1);
    }

    fn parse_structs(source: &str) -> Vec<GpuStruct> {
        weft_parser::parse("layout.weft", source)
            .expect("source should parse")
            .gpu_structs
    }

    #[test]
    fn test_nested_struct_uses_its_layout() {
        let structs = parse_structs(
            r#"
            package main
            @gpu
            type Outer struct {
                flag u32
                inner Inner
            }
            @gpu
            type Inner struct {
                a vec3
                b f32
            }
            "#,
        );
        let table = LayoutTable::build(&structs).expect("layout");
        let outer = table.get("Outer").expect("Outer");
        assert_eq!(offsets(outer), vec![0, 16]);
        assert_eq!(outer.size, 32);
        let names: Vec<&str> = table.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Inner", "Outer"]);
    }

    #[test]
    fn test_recursive_struct_is_rejected() {
        let structs = parse_structs(
            r#"
            package main
            @gpu
            type Node struct { next Node }
            "#,
        );
        let err = LayoutTable::build(&structs).expect_err("recursion");
        assert!(matches!(err, ShaderError::UnknownType { ref reason, .. } if reason.contains("itself")));
    }

    #[test]
    fn test_unknown_field_type() {
        let structs = parse_structs(
            r#"
            package main
            @gpu
            type P struct { name string }
            "#,
        );
        let err = LayoutTable::build(&structs).expect_err("string");
        assert!(matches!(err, ShaderError::UnknownType { ref name, .. } if name == "string"));
    }

    #[test]
    fn test_runtime_array_field_is_rejected() {
        let structs = parse_structs(
            r#"
            package main
            @gpu
            type P struct { xs []f32 }
            "#,
        );
        let err = LayoutTable::build(&structs).expect_err("array");
        assert!(err.to_string().contains("storage bindings"));
    }

    fn type_name() -> impl Strategy<Value = &'static str> {
        prop::sample::select(vec![
            "f32", "i32", "u32", "vec2", "vec2u", "vec3", "vec3i", "vec4", "mat2x2", "mat3x3",
            "mat4x4",
        ])
    }

    proptest! {
        #[test]
        fn layout_invariants(names in prop::collection::vec(type_name(), 0..12)) {
            let layout = layout_of(&names);

            prop_assert_eq!(layout.size % layout.align, 0);
            let mut end = 0;
            for field in &layout.fields {
                prop_assert_eq!(field.offset % field.align, 0);
                prop_assert!(field.offset >= end);
                prop_assert!(field.align <= layout.align);
                end = field.offset + field.size;
            }
            prop_assert!(layout.size >= end);
        }
    }
}
