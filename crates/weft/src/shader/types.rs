//! The fixed table of GPU value types.
//!
//! Sizes and alignments are the WGSL host-shareable values. `host` is the
//! Go type that holds the same bytes; 3-component matrices are padded to
//! four rows so the Go array covers the whole WGSL size.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Float,
    Sint,
    Uint,
}

impl ScalarKind {
    pub fn wgsl(&self) -> &'static str {
        match self {
            ScalarKind::Float => "f32",
            ScalarKind::Sint => "i32",
            ScalarKind::Uint => "u32",
        }
    }

    pub fn go(&self) -> &'static str {
        match self {
            ScalarKind::Float => "float32",
            ScalarKind::Sint => "int32",
            ScalarKind::Uint => "uint32",
        }
    }
}

/// One entry of the type table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpuType {
    /// The spelling used in Weft source.
    pub name: &'static str,
    pub wgsl: &'static str,
    pub host: &'static str,
    pub size: u32,
    pub align: u32,
    pub scalar: ScalarKind,
    /// Number of 4-byte slots in the host representation.
    pub components: u32,
}

impl GpuType {
    pub fn is_scalar(&self) -> bool {
        self.components == 1
    }
}

const fn entry(
    name: &'static str,
    wgsl: &'static str,
    host: &'static str,
    size: u32,
    align: u32,
    scalar: ScalarKind,
) -> GpuType {
    GpuType {
        name,
        wgsl,
        host,
        size,
        align,
        scalar,
        components: size / 4,
    }
}

use ScalarKind::{Float, Sint, Uint};

static TYPES: &[GpuType] = &[
    entry("f32", "f32", "float32", 4, 4, Float),
    entry("i32", "i32", "int32", 4, 4, Sint),
    entry("u32", "u32", "uint32", 4, 4, Uint),
    entry("vec2", "vec2<f32>", "[2]float32", 8, 8, Float),
    entry("vec2f", "vec2<f32>", "[2]float32", 8, 8, Float),
    entry("vec2i", "vec2<i32>", "[2]int32", 8, 8, Sint),
    entry("vec2u", "vec2<u32>", "[2]uint32", 8, 8, Uint),
    entry("vec3", "vec3<f32>", "[3]float32", 12, 16, Float),
    entry("vec3f", "vec3<f32>", "[3]float32", 12, 16, Float),
    entry("vec3i", "vec3<i32>", "[3]int32", 12, 16, Sint),
    entry("vec3u", "vec3<u32>", "[3]uint32", 12, 16, Uint),
    entry("vec4", "vec4<f32>", "[4]float32", 16, 16, Float),
    entry("vec4f", "vec4<f32>", "[4]float32", 16, 16, Float),
    entry("vec4i", "vec4<i32>", "[4]int32", 16, 16, Sint),
    entry("vec4u", "vec4<u32>", "[4]uint32", 16, 16, Uint),
    entry("mat2", "mat2x2<f32>", "[4]float32", 16, 8, Float),
    entry("mat2x2", "mat2x2<f32>", "[4]float32", 16, 8, Float),
    entry("mat3", "mat3x3<f32>", "[12]float32", 48, 16, Float),
    entry("mat3x3", "mat3x3<f32>", "[12]float32", 48, 16, Float),
    entry("mat4", "mat4x4<f32>", "[16]float32", 64, 16, Float),
    entry("mat4x4", "mat4x4<f32>", "[16]float32", 64, 16, Float),
];

/// Look up a built-in GPU type by its source name.
pub fn lookup(name: &str) -> Option<&'static GpuType> {
    TYPES.iter().find(|ty| ty.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_sizes_and_alignments() {
        let cases = [
            ("f32", 4, 4),
            ("vec2", 8, 8),
            ("vec3", 12, 16),
            ("vec3u", 12, 16),
            ("vec4", 16, 16),
            ("mat2x2", 16, 8),
            ("mat3", 48, 16),
            ("mat4x4", 64, 16),
        ];
        for (name, size, align) in cases {
            let ty = lookup(name).expect(name);
            assert_eq!((ty.size, ty.align), (size, align), "{name}");
        }
    }

    #[test]
    fn test_names_and_kinds() {
        let vec3u = lookup("vec3u").expect("vec3u");
        assert_eq!(vec3u.wgsl, "vec3<u32>");
        assert_eq!(vec3u.host, "[3]uint32");
        assert_eq!(vec3u.scalar, ScalarKind::Uint);
        assert_eq!(vec3u.components, 3);

        assert!(lookup("u32").expect("u32").is_scalar());
        assert_eq!(lookup("mat3").expect("mat3").components, 12);
        assert!(lookup("float").is_none());
        assert!(lookup("Vec4").is_none());
    }

    #[test]
    fn test_every_size_is_a_multiple_of_four() {
        for ty in TYPES {
            assert_eq!(ty.size % 4, 0, "{}", ty.name);
            assert!(ty.align.is_power_of_two(), "{}", ty.name);
        }
    }
}
