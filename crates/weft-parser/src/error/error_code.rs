//! Error codes, grouped by phase:
//! - `E0xx` lexer
//! - `E1xx` parser
//! - `E2xx` semantic analysis
//! - `E3xx` shader generation

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Lexer
    /// A `"` string was opened but never closed on the same line.
    E001,
    /// A character that starts no token.
    E002,
    /// A backslash escape the string or template does not support.
    E003,
    /// A backtick template was opened but never closed.
    E004,
    /// A `/*` comment runs to the end of the file.
    E005,

    // Parser
    /// The parser found a token it did not expect.
    E100,
    /// The input ended inside a construct.
    E101,
    /// A `...T` parameter is not the last parameter.
    E102,

    // Semantic analysis
    /// Assignment to a name no enclosing scope declares.
    E200,
    /// Send or receive on a name no enclosing scope declares.
    E201,
    /// Declared names and values differ in count.
    E202,
    /// Child nodes in a function that renders nothing.
    E203,
    /// A hoisted `var` shadows a parameter of the same name.
    E204,

    // Shader generation
    /// A type with no WGSL mapping.
    E300,
    /// A decorator the shader generator does not know.
    E301,
    /// Channel operations cannot run on the GPU.
    E302,
    /// A construct WGSL cannot express.
    E303,
    /// A call to a function that is neither builtin nor declared.
    E304,
    /// A resource binding without an address-space decorator.
    E305,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E003 => "E003",
            ErrorCode::E004 => "E004",
            ErrorCode::E005 => "E005",
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            ErrorCode::E202 => "E202",
            ErrorCode::E203 => "E203",
            ErrorCode::E204 => "E204",
            ErrorCode::E300 => "E300",
            ErrorCode::E301 => "E301",
            ErrorCode::E302 => "E302",
            ErrorCode::E303 => "E303",
            ErrorCode::E304 => "E304",
            ErrorCode::E305 => "E305",
        }
    }

    /// Short description, used as the default label text.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "unterminated string literal",
            ErrorCode::E002 => "unexpected character",
            ErrorCode::E003 => "invalid escape sequence",
            ErrorCode::E004 => "unterminated template string",
            ErrorCode::E005 => "unterminated block comment",
            ErrorCode::E100 => "unexpected token",
            ErrorCode::E101 => "incomplete input",
            ErrorCode::E102 => "variadic parameter must be last",
            ErrorCode::E200 => "undefined variable",
            ErrorCode::E201 => "undefined channel",
            ErrorCode::E202 => "assignment mismatch",
            ErrorCode::E203 => "nodes ignored in plain function",
            ErrorCode::E204 => "variable shadows parameter",
            ErrorCode::E300 => "unknown shader type",
            ErrorCode::E301 => "unsupported decorator",
            ErrorCode::E302 => "channel operation in shader",
            ErrorCode::E303 => "unsupported shader construct",
            ErrorCode::E304 => "unknown shader function",
            ErrorCode::E305 => "missing address space",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::E001.to_string(), "E001");
        assert_eq!(ErrorCode::E102.to_string(), "E102");
        assert_eq!(ErrorCode::E305.to_string(), "E305");
    }

    #[test]
    fn test_error_code_description() {
        assert_eq!(ErrorCode::E200.description(), "undefined variable");
        assert_eq!(ErrorCode::E004.description(), "unterminated template string");
    }
}
