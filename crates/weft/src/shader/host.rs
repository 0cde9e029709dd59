//! Go host structs matching the shader memory layout.
//!
//! Every GPU struct becomes a Go struct with exported fields and explicit
//! `_ [N]byte` padding, so `unsafe.Sizeof` on the Go side equals the WGSL
//! size. `Bytes()` writes the little-endian image expected by the GPU.

use weft_core::ast::{CompilationUnit, GpuField, GpuStruct};

use super::{
    ShaderError, binding,
    layout::{LayoutTable, StructLayout},
    types::{self, GpuType, ScalarKind},
};
use crate::{naming::exported, writer::CodeWriter};

/// How a field is written by `Bytes()`.
enum FieldKind {
    Builtin(&'static GpuType),
    Nested,
}

struct HostField {
    go_name: String,
    go_type: String,
    kind: FieldKind,
    offset: u32,
}

#[derive(Default)]
struct Imports {
    binary: bool,
    math: bool,
    unsafe_: bool,
}

/// Emit the Go host file for `unit`.
pub(super) fn generate(
    unit: &CompilationUnit,
    layouts: &LayoutTable,
    package: &str,
    header: &str,
) -> Result<String, ShaderError> {
    let mut imports = Imports::default();
    let mut body = CodeWriter::tabs();

    let mut structs = Vec::with_capacity(unit.gpu_structs.len());
    for gpu_struct in &unit.gpu_structs {
        let name = gpu_struct.name.inner();
        let Some(layout) = layouts.get(name) else {
            return Err(ShaderError::UnknownType {
                name: name.clone(),
                reason: "struct has no layout".to_string(),
                span: gpu_struct.span,
            });
        };
        let fields = host_fields(gpu_struct, layout)?;
        emit_struct(&mut body, name, layout, &fields, &mut imports);
        structs.push(name.as_str());
    }

    if !structs.is_empty() {
        imports.unsafe_ = true;
        body.line("func init() {");
        body.indent();
        for name in &structs {
            body.line(format!("if unsafe.Sizeof({name}{{}}) != {name}Size {{"));
            body.indent();
            body.line(format!(
                "panic(\"{name}: host size does not match the shader layout\")"
            ));
            body.dedent();
            body.line("}");
        }
        body.dedent();
        body.line("}");
    }

    emit_binding_slots(&mut body, unit)?;

    let mut out = CodeWriter::tabs();
    if !header.is_empty() {
        out.line(header);
        out.blank();
    }
    out.line(format!("package {package}"));
    out.blank();
    emit_imports(&mut out, &imports);
    let mut text = out.finish();
    text.push_str(&body.finish());
    let mut text = text.trim_end().to_string();
    text.push('\n');
    Ok(text)
}

fn host_fields(gpu_struct: &GpuStruct, layout: &StructLayout) -> Result<Vec<HostField>, ShaderError> {
    gpu_struct
        .fields
        .iter()
        .zip(&layout.fields)
        .map(|(field, placed)| {
            let (go_type, kind) = field_kind(field)?;
            Ok(HostField {
                go_name: exported(field.name.inner()),
                go_type,
                kind,
                offset: placed.offset,
            })
        })
        .collect()
}

fn field_kind(field: &GpuField) -> Result<(String, FieldKind), ShaderError> {
    let Some(name) = field.ty.base_name() else {
        return Err(ShaderError::UnknownType {
            name: field.ty.to_string(),
            reason: "not a GPU type".to_string(),
            span: field.ty.span(),
        });
    };
    Ok(match types::lookup(name) {
        Some(builtin) => (builtin.host.to_string(), FieldKind::Builtin(builtin)),
        None => (name.to_string(), FieldKind::Nested),
    })
}

fn emit_struct(
    out: &mut CodeWriter,
    name: &str,
    layout: &StructLayout,
    fields: &[HostField],
    imports: &mut Imports,
) {
    out.line(format!("// {name}Size is the size of {name} in shader memory."));
    out.line(format!("const {name}Size = {}", layout.size));
    out.blank();

    // Declared fields interleaved with the padding that keeps offsets equal.
    let mut rows: Vec<(String, String)> = Vec::with_capacity(fields.len() * 2);
    let mut end = 0;
    for (field, placed) in fields.iter().zip(&layout.fields) {
        if placed.offset > end {
            rows.push(("_".to_string(), format!("[{}]byte", placed.offset - end)));
        }
        rows.push((field.go_name.clone(), field.go_type.clone()));
        end = placed.offset + placed.size;
    }
    if layout.size > end {
        rows.push(("_".to_string(), format!("[{}]byte", layout.size - end)));
    }

    out.line(format!("// {name} mirrors the shader struct {name}."));
    if rows.is_empty() {
        out.line(format!("type {name} struct{{}}"));
    } else {
        let width = rows.iter().map(|(n, _)| n.len()).max().unwrap_or(0);
        out.line(format!("type {name} struct {{"));
        out.indent();
        for (field, ty) in &rows {
            out.line(format!("{field:<width$} {ty}"));
        }
        out.dedent();
        out.line("}");
    }
    out.blank();

    out.line(format!(
        "// Bytes returns the little-endian shader image of {name}."
    ));
    out.line(format!("func (v *{name}) Bytes() []byte {{"));
    out.indent();
    out.line(format!("buf := make([]byte, {name}Size)"));
    for field in fields {
        emit_field_write(out, field, imports);
    }
    out.line("return buf");
    out.dedent();
    out.line("}");
    out.blank();
}

fn emit_field_write(out: &mut CodeWriter, field: &HostField, imports: &mut Imports) {
    let offset = field.offset;
    match &field.kind {
        FieldKind::Nested => {
            out.line(format!("copy(buf[{offset}:], v.{}.Bytes())", field.go_name));
        }
        FieldKind::Builtin(ty) if ty.is_scalar() => {
            imports.binary = true;
            let bits = scalar_bits(ty.scalar, &format!("v.{}", field.go_name), imports);
            out.line(format!(
                "binary.LittleEndian.PutUint32(buf[{offset}:], {bits})"
            ));
        }
        FieldKind::Builtin(ty) => {
            imports.binary = true;
            let bits = scalar_bits(ty.scalar, "x", imports);
            let index = if offset == 0 {
                "i*4".to_string()
            } else {
                format!("{offset}+i*4")
            };
            out.line(format!("for i, x := range v.{} {{", field.go_name));
            out.indent();
            out.line(format!("binary.LittleEndian.PutUint32(buf[{index}:], {bits})"));
            out.dedent();
            out.line("}");
        }
    }
}

/// The `uint32` bit pattern of a scalar value.
fn scalar_bits(kind: ScalarKind, value: &str, imports: &mut Imports) -> String {
    match kind {
        ScalarKind::Float => {
            imports.math = true;
            format!("math.Float32bits({value})")
        }
        ScalarKind::Sint => format!("uint32({value})"),
        ScalarKind::Uint => value.to_string(),
    }
}

fn emit_binding_slots(out: &mut CodeWriter, unit: &CompilationUnit) -> Result<(), ShaderError> {
    let mut rows = Vec::new();
    for gpu_binding in &unit.gpu_bindings {
        let info = binding::resolve(gpu_binding)?;
        if let Some((group, slot)) = info.slot {
            let name = exported(gpu_binding.name.inner());
            rows.push((format!("{name}Group"), group));
            rows.push((format!("{name}Slot"), slot));
        }
    }
    if rows.is_empty() {
        return Ok(());
    }

    if !out.is_empty() {
        out.blank();
    }
    out.line("// Bind group and slot of each shader resource.");
    out.line("const (");
    out.indent();
    let width = rows.iter().map(|(n, _)| n.len()).max().unwrap_or(0);
    for (name, value) in &rows {
        out.line(format!("{name:<width$} = {value}"));
    }
    out.dedent();
    out.line(")");
    Ok(())
}

fn emit_imports(out: &mut CodeWriter, imports: &Imports) {
    let used: Vec<&str> = [
        (imports.binary, "encoding/binary"),
        (imports.math, "math"),
        (imports.unsafe_, "unsafe"),
    ]
    .into_iter()
    .filter_map(|(used, path)| used.then_some(path))
    .collect();

    match used.as_slice() {
        [] => {}
        [single] => {
            out.line(format!("import \"{single}\""));
            out.blank();
        }
        many => {
            out.line("import (");
            out.indent();
            for path in many {
                out.line(format!("\"{path}\""));
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

    fn host(source: &str) -> String {
        let unit = weft_parser::parse("host.weft", source).expect("source should parse");
        let layouts = LayoutTable::build(&unit.gpu_structs).expect("layout");
        generate(&unit, &layouts, "gfx", "// header").expect("host generation")
    }

    #[test]
    fn test_particle_host_file() {
        let go = host(
            r#"
            package main
            @gpu
            type Particle struct {
                pos vec4
                vel vec4
            }
            @group(0) @binding(2) @storage(read_write)
            var particles []Particle
            "#,
        );
        let expected = "\
// header

package gfx

import (
\t\"encoding/binary\"
\t\"math\"
\t\"unsafe\"
)

// ParticleSize is the size of Particle in shader memory.
const ParticleSize = 32

// Particle mirrors the shader struct Particle.
type Particle struct {
\tPos [4]float32
\tVel [4]float32
}

// Bytes returns the little-endian shader image of Particle.
func (v *Particle) Bytes() []byte {
\tbuf := make([]byte, ParticleSize)
\tfor i, x := range v.Pos {
\t\tbinary.LittleEndian.PutUint32(buf[i*4:], math.Float32bits(x))
\t}
\tfor i, x := range v.Vel {
\t\tbinary.LittleEndian.PutUint32(buf[16+i*4:], math.Float32bits(x))
\t}
\treturn buf
}

func init() {
\tif unsafe.Sizeof(Particle{}) != ParticleSize {
\t\tpanic(\"Particle: host size does not match the shader layout\")
\t}
}

// Bind group and slot of each shader resource.
const (
\tParticlesGroup = 0
\tParticlesSlot  = 2
)
";
        assert_eq!(go, expected);
    }

    #[test]
    fn test_padding_is_explicit() {
        let go = host(
            r#"
            package main
            @gpu
            type Light struct {
                power f32
                color vec4
                count u32
            }
            "#,
        );
        assert!(go.contains("type Light struct {\n\tPower float32\n"));
        assert!(go.contains("\t_     [12]byte\n\tColor [4]float32\n\tCount uint32\n\t_     [12]byte\n}"));
        assert!(go.contains("const LightSize = 48"));
        assert!(go.contains("binary.LittleEndian.PutUint32(buf[32:], v.Count)"));
    }

    #[test]
    fn test_signed_and_nested_fields() {
        let go = host(
            r#"
            package main
            @gpu
            type Inner struct { id i32 }
            @gpu
            type Outer struct {
                inner Inner
                cell vec2i
            }
            "#,
        );
        assert!(go.contains("binary.LittleEndian.PutUint32(buf[0:], uint32(v.Id))"));
        assert!(go.contains("copy(buf[0:], v.Inner.Bytes())"));
        assert!(go.contains("PutUint32(buf[8+i*4:], uint32(x))"));
        assert!(!go.contains("\"math\""));
        assert!(go.contains("if unsafe.Sizeof(Inner{}) != InnerSize {"));
        assert!(go.contains("if unsafe.Sizeof(Outer{}) != OuterSize {"));
    }

    #[test]
    fn test_bindings_only() {
        let go = host(
            r#"
            package main
            @private
            var seed u32
            @compute @workgroup_size(1)
            func main() {}
            "#,
        );
        assert_eq!(go, "// header\n\npackage gfx\n");
    }
}
