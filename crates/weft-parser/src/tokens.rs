//! Token definitions produced by the [`lexer`](super::lexer).

use std::fmt;

use winnow::stream::Location;

use crate::span::Span;

/// A lexical token. Whitespace and comments never reach the parser.
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'src> {
    // Keywords
    Package,
    Import,
    Type,
    Struct,
    Func,
    Var,
    If,
    Else,
    For,
    Range,
    Return,
    Break,
    Continue,
    Chan,
    Make,

    Identifier(&'src str),
    IntLiteral(&'src str),
    FloatLiteral(&'src str),
    /// Double-quoted string with escapes already resolved.
    StringLiteral(String),

    // Template strings
    /// Opening backtick.
    TemplateStart,
    /// A literal run inside a template, escapes resolved.
    TemplateText(String),
    /// `{` opening an interpolation inside a template.
    InterpOpen,
    /// `}` closing an interpolation.
    InterpClose,
    /// Closing backtick.
    TemplateEnd,

    // Multi-character operators
    Ellipsis,
    Define,
    Arrow,
    PlusPlus,
    MinusMinus,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    EqEq,
    NotEq,
    LtEq,
    GtEq,
    AndAnd,
    OrOr,
    Shl,
    Shr,
    AndNot,

    // Single-character operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Assign,
    Lt,
    Gt,
    Bang,
    Amp,
    Pipe,
    Caret,

    // Punctuation
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Comma,
    Semicolon,
    Colon,
    Dot,
    At,
}

/// A token together with its source span.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedToken<'src> {
    pub token: Token<'src>,
    pub span: Span,
}

impl<'src> PositionedToken<'src> {
    pub fn new(token: Token<'src>, span: Span) -> Self {
        Self { token, span }
    }
}

impl<'src> std::ops::Deref for PositionedToken<'src> {
    type Target = Token<'src>;

    fn deref(&self) -> &Self::Target {
        &self.token
    }
}

impl fmt::Display for PositionedToken<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.token.fmt(f)
    }
}

impl Location for PositionedToken<'_> {
    fn previous_token_end(&self) -> usize {
        self.span.start()
    }

    fn current_token_start(&self) -> usize {
        self.span.start()
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Token::Package => "package",
            Token::Import => "import",
            Token::Type => "type",
            Token::Struct => "struct",
            Token::Func => "func",
            Token::Var => "var",
            Token::If => "if",
            Token::Else => "else",
            Token::For => "for",
            Token::Range => "range",
            Token::Return => "return",
            Token::Break => "break",
            Token::Continue => "continue",
            Token::Chan => "chan",
            Token::Make => "make",
            Token::Identifier(name) => return write!(f, "{name}"),
            Token::IntLiteral(n) | Token::FloatLiteral(n) => return write!(f, "{n}"),
            Token::StringLiteral(s) => return write!(f, "{s:?}"),
            Token::TemplateStart | Token::TemplateEnd => "`",
            Token::TemplateText(s) => return write!(f, "{s}"),
            Token::InterpOpen => "{",
            Token::InterpClose => "}",
            Token::Ellipsis => "...",
            Token::Define => ":=",
            Token::Arrow => "<-",
            Token::PlusPlus => "++",
            Token::MinusMinus => "--",
            Token::PlusAssign => "+=",
            Token::MinusAssign => "-=",
            Token::StarAssign => "*=",
            Token::SlashAssign => "/=",
            Token::EqEq => "==",
            Token::NotEq => "!=",
            Token::LtEq => "<=",
            Token::GtEq => ">=",
            Token::AndAnd => "&&",
            Token::OrOr => "||",
            Token::Shl => "<<",
            Token::Shr => ">>",
            Token::AndNot => "&^",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::Assign => "=",
            Token::Lt => "<",
            Token::Gt => ">",
            Token::Bang => "!",
            Token::Amp => "&",
            Token::Pipe => "|",
            Token::Caret => "^",
            Token::LeftParen => "(",
            Token::RightParen => ")",
            Token::LeftBrace => "{",
            Token::RightBrace => "}",
            Token::LeftBracket => "[",
            Token::RightBracket => "]",
            Token::Comma => ",",
            Token::Semicolon => ";",
            Token::Colon => ":",
            Token::Dot => ".",
            Token::At => "@",
        };
        f.write_str(text)
    }
}
