//! Integration tests for the Compiler API

use weft::{
    Compiler, ErrorCode, WeftError,
    config::{AppConfig, CodegenConfig, ShaderConfig},
};

const COUNTER: &str = "package main\nfunc Counter(n int) (Node) { Div { `{n}` } }";

const PARTICLES: &str = r#"
package sim

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
"#;

#[test]
fn test_compile_counter() {
    let output = Compiler::default()
        .compile("counter.weft", COUNTER, None)
        .expect("Failed to compile counter");

    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
    assert!(output.shader.is_none());
    assert!(output.go.contains("package main\n"));
    assert!(output.go.contains("\tn int\n"));
    assert!(output.go.contains("func NewCounter(n int) *Counter {"));
    assert!(output.go.contains("rt.Element(\"div\""));
    assert!(output.go.contains("fmt.Sprintf(\"%v\", c.n)"));
}

#[test]
fn test_package_override() {
    let output = Compiler::default()
        .compile("counter.weft", COUNTER, Some("widgets"))
        .expect("Failed to compile counter");
    assert!(output.go.contains("package widgets\n"));
    assert!(!output.go.contains("package main"));
}

#[test]
fn test_compile_shader_unit() {
    let output = Compiler::default()
        .compile("particles.weft", PARTICLES, None)
        .expect("Failed to compile particles");

    let shader = output.shader.expect("GPU declarations produce a shader");
    assert!(shader.wgsl.contains("struct Particle {"));
    assert!(shader.wgsl.contains("var<storage, read_write> particles: array<Particle>;"));
    assert!(shader.wgsl.contains("@compute @workgroup_size(64)"));

    let host = shader.host.expect("host file is on by default");
    assert!(host.contains("package sim\n"));
    assert!(host.contains("const ParticleSize = 32"));
    assert!(host.contains("func (v *Particle) Bytes() []byte {"));
    assert!(host.contains("ParticlesGroup = 0"));
}

#[test]
fn test_host_file_can_be_disabled() {
    let config = AppConfig::new(CodegenConfig::default(), ShaderConfig::new(false));
    let output = Compiler::new(config)
        .compile("particles.weft", PARTICLES, None)
        .expect("Failed to compile particles");
    let shader = output.shader.expect("shader output");
    assert!(shader.host.is_none());
    assert!(!shader.wgsl.is_empty());
}

#[test]
fn test_semantic_errors_are_reported_not_raised() {
    let source = r#"
        package main
        func Broken() (Node) {
            if true {
                x := 1
            }
            x = 2
            P { "text" }
        }
    "#;
    let output = Compiler::default()
        .compile("broken.weft", source, None)
        .expect("semantic errors do not stop generation");

    assert!(output.has_errors());
    let undefined: Vec<_> = output
        .diagnostics
        .iter()
        .filter(|d| d.code() == Some(ErrorCode::E200))
        .collect();
    assert_eq!(undefined.len(), 1);
    assert_eq!(undefined[0].message(), "undefined variable: x");
    assert!(output.go.contains("func (c *Broken) Render() rt.Node {"));
}

#[test]
fn test_warnings_are_not_errors() {
    let source = "package main\nfunc helper() { P { \"dropped\" } }";
    let output = Compiler::default()
        .compile("helper.weft", source, None)
        .expect("Failed to compile helper");
    assert!(!output.has_errors());
    assert!(
        output
            .diagnostics
            .iter()
            .any(|d| d.code() == Some(ErrorCode::E203))
    );
    assert!(output.go.contains("func helper() {\n}"));
}

#[test]
fn test_parse_error_keeps_source() {
    let source = "package main\nfunc Broken() (Node) { Div {";
    let err = Compiler::default()
        .compile("broken.weft", source, None)
        .expect_err("unclosed element");
    match err {
        WeftError::Parse { err, src } => {
            assert_eq!(src, source);
            assert_eq!(err.file(), Some("broken.weft"));
            assert!(!err.diagnostics().is_empty());
        }
        other => panic!("expected a parse error, got {other:?}"),
    }
}

#[test]
fn test_shader_error_stops_compilation() {
    let source = r#"
        package main
        @compute @workgroup_size(1)
        func main(@builtin(global_invocation_id) id vec3u) {
            ch := make(chan int)
        }
    "#;
    let err = Compiler::default()
        .compile("bad.weft", source, None)
        .expect_err("channels are not shader code");
    match err {
        WeftError::Shader { err, .. } => assert_eq!(err.code(), ErrorCode::E302),
        other => panic!("expected a shader error, got {other:?}"),
    }
}

#[test]
fn test_compiler_reusability() {
    let compiler = Compiler::default();
    let first = compiler
        .compile("a.weft", "package a\nfunc A() (Node) { Br }", None)
        .expect("Failed to compile a");
    let second = compiler
        .compile("b.weft", "package b\nfunc B() (Node) { Hr }", None)
        .expect("Failed to compile b");
    assert!(first.go.contains("rt.Element(\"br\", nil)"));
    assert!(second.go.contains("rt.Element(\"hr\", nil)"));
}
