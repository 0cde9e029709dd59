//! Lexical analyzer for Weft source text.
//!
//! The lexer keeps a stack of modes:
//!
//! - `Root`: ordinary code.
//! - `Template`: inside a backtick string. Produces literal text runs,
//!   [`Token::InterpOpen`] for `{`, and [`Token::TemplateEnd`] for the
//!   closing backtick.
//! - `TemplateExpr`: inside a `{...}` interpolation. Lexes like `Root`; the
//!   `}` that balances the opening brace becomes [`Token::InterpClose`] and
//!   returns to `Template`.
//!
//! Whitespace and comments are recognised and dropped. Lexing stops at the
//! first error.

use winnow::{
    Parser as _,
    ascii::digit1,
    combinator::{alt, cut_err, not, opt, peek, preceded, repeat, terminated},
    error::{AddContext, ContextError, ErrMode},
    stream::{LocatingSlice, Location, Stream},
    token::{literal, none_of, one_of, take_until, take_while},
};

use crate::{
    error::{Diagnostic, ErrorCode, ParseError},
    span::Span,
    tokens::{PositionedToken, Token},
};

/// Diagnostic information attached to winnow errors via `.context()`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LexerDiagnostic {
    code: ErrorCode,
    message: &'static str,
    help: Option<&'static str>,
    /// The error span covers from `start` to the error position.
    start: usize,
}

type Input<'a> = LocatingSlice<&'a str>;
type IResult<O> = Result<O, ErrMode<ContextError<LexerDiagnostic>>>;

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Standard escape character after the backslash in a string literal.
fn string_escape_char(input: &mut Input<'_>) -> IResult<char> {
    one_of(['n', 'r', 't', '\\', '"', '0'])
        .map(|c| match c {
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            '0' => '\0',
            other => other,
        })
        .parse_next(input)
}

/// Escape character after the backslash in a template text run.
fn template_escape_char(input: &mut Input<'_>) -> IResult<char> {
    one_of(['`', '{', '}', '\\', 'n', 't'])
        .map(|c| match c {
            'n' => '\n',
            't' => '\t',
            other => other,
        })
        .parse_next(input)
}

/// Parse a backslash escape using `escape_char` for the character after it.
fn escape(
    input: &mut Input<'_>,
    escape_char: fn(&mut Input<'_>) -> IResult<char>,
    help: &'static str,
) -> IResult<char> {
    let escape_start = input.current_token_start();
    '\\'.parse_next(input)?;

    if let Ok(ch) = escape_char(input) {
        return Ok(ch);
    }

    Err(ErrMode::Cut(ContextError::new().add_context(
        input,
        &input.checkpoint(),
        LexerDiagnostic {
            code: ErrorCode::E003,
            message: "invalid escape sequence",
            help: Some(help),
            start: escape_start,
        },
    )))
}

fn string_escape(input: &mut Input<'_>) -> IResult<char> {
    escape(
        input,
        string_escape_char,
        "valid escapes: `\\n`, `\\r`, `\\t`, `\\\\`, `\\\"`, `\\0`",
    )
}

fn template_escape(input: &mut Input<'_>) -> IResult<char> {
    escape(
        input,
        template_escape_char,
        "valid escapes: `\\``, `\\{`, `\\}`, `\\\\`, `\\n`, `\\t`",
    )
}

/// Parse a double-quoted string literal.
fn string_literal<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    let string_char = none_of(['"', '\\', '\n', '\r']);
    let string_content = repeat(0.., alt((string_escape, string_char))).fold(
        String::new,
        |mut acc: String, ch| {
            acc.push(ch);
            acc
        },
    );

    let start_pos = input.current_token_start();
    '"'.parse_next(input)?;

    cut_err(terminated(string_content, '"'))
        .context(LexerDiagnostic {
            code: ErrorCode::E001,
            message: "unterminated string literal",
            help: Some("add closing `\"`"),
            start: start_pos,
        })
        .parse_next(input)
        .map(Token::StringLiteral)
}

/// Parse an integer or float literal.
///
/// Accepts `42`, `0x1F`, `1.5`, `1.`, `2e10`, `6.02e-23`. A number may not
/// run straight into identifier characters. A `.` directly followed by an
/// identifier is a selector, so `xs[0].name` lexes `0` as an integer.
fn number<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    let hex = preceded(
        alt(("0x", "0X")),
        take_while(1.., |c: char| c.is_ascii_hexdigit()),
    )
    .take()
    .map(Token::IntLiteral);

    let exponent = (one_of(['e', 'E']), take_while(0..=1, ['+', '-']), digit1);
    let fraction = alt((
        ('.', digit1).void(),
        ('.', peek(not(one_of(|c: char| is_ident_char(c) || c == '.')))).void(),
    ));
    let decimal = (digit1, opt(fraction), opt(exponent))
        .with_taken()
        .map(|((_, fraction, exp), text): (_, &str)| {
            if fraction.is_some() || exp.is_some() {
                Token::FloatLiteral(text)
            } else {
                Token::IntLiteral(text)
            }
        });

    terminated(alt((hex, decimal)), peek(not(one_of(is_ident_char)))).parse_next(input)
}

/// Parse keywords with word boundary checking.
fn keyword<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    terminated(
        alt((
            literal("package").value(Token::Package),
            literal("import").value(Token::Import),
            literal("type").value(Token::Type),
            literal("struct").value(Token::Struct),
            literal("func").value(Token::Func),
            literal("var").value(Token::Var),
            literal("if").value(Token::If),
            literal("else").value(Token::Else),
            literal("for").value(Token::For),
            literal("range").value(Token::Range),
            literal("return").value(Token::Return),
            literal("break").value(Token::Break),
            literal("continue").value(Token::Continue),
            literal("chan").value(Token::Chan),
            literal("make").value(Token::Make),
        )),
        peek(not(one_of(is_ident_char))),
    )
    .parse_next(input)
}

fn identifier<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    (
        one_of(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., is_ident_char),
    )
        .take()
        .map(Token::Identifier)
        .parse_next(input)
}

/// Multi-character operators, longest first.
fn multi_char_operator<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    alt((
        literal("...").value(Token::Ellipsis),
        literal(":=").value(Token::Define),
        literal("<-").value(Token::Arrow),
        literal("++").value(Token::PlusPlus),
        literal("--").value(Token::MinusMinus),
        literal("+=").value(Token::PlusAssign),
        literal("-=").value(Token::MinusAssign),
        literal("*=").value(Token::StarAssign),
        literal("/=").value(Token::SlashAssign),
        literal("==").value(Token::EqEq),
        literal("!=").value(Token::NotEq),
        literal("<=").value(Token::LtEq),
        literal(">=").value(Token::GtEq),
        literal("&&").value(Token::AndAnd),
        literal("||").value(Token::OrOr),
        literal("<<").value(Token::Shl),
        literal(">>").value(Token::Shr),
        literal("&^").value(Token::AndNot),
    ))
    .parse_next(input)
}

fn single_char_token<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    alt((
        alt((
            '+'.value(Token::Plus),
            '-'.value(Token::Minus),
            '*'.value(Token::Star),
            '/'.value(Token::Slash),
            '%'.value(Token::Percent),
            '='.value(Token::Assign),
            '<'.value(Token::Lt),
            '>'.value(Token::Gt),
            '!'.value(Token::Bang),
            '&'.value(Token::Amp),
            '|'.value(Token::Pipe),
            '^'.value(Token::Caret),
        )),
        alt((
            '('.value(Token::LeftParen),
            ')'.value(Token::RightParen),
            '{'.value(Token::LeftBrace),
            '}'.value(Token::RightBrace),
            '['.value(Token::LeftBracket),
            ']'.value(Token::RightBracket),
            ','.value(Token::Comma),
            ';'.value(Token::Semicolon),
            ':'.value(Token::Colon),
            '.'.value(Token::Dot),
            '@'.value(Token::At),
        )),
    ))
    .parse_next(input)
}

fn line_comment(input: &mut Input<'_>) -> IResult<()> {
    preceded("//", take_while(0.., |c| c != '\n'))
        .void()
        .parse_next(input)
}

fn block_comment(input: &mut Input<'_>) -> IResult<()> {
    let start_pos = input.current_token_start();
    "/*".parse_next(input)?;
    cut_err((take_until(0.., "*/"), "*/"))
        .context(LexerDiagnostic {
            code: ErrorCode::E005,
            message: "unterminated block comment",
            help: Some("add closing `*/`"),
            start: start_pos,
        })
        .void()
        .parse_next(input)
}

fn whitespace(input: &mut Input<'_>) -> IResult<()> {
    take_while(1.., char::is_whitespace)
        .void()
        .parse_next(input)
}

/// One token in `Root` or `TemplateExpr` mode; `None` for dropped trivia.
fn root_token<'a>(input: &mut Input<'a>) -> IResult<Option<Token<'a>>> {
    alt((
        whitespace.value(None),
        line_comment.value(None),
        block_comment.value(None),
        string_literal.map(Some),
        '`'.value(Some(Token::TemplateStart)),
        number.map(Some),
        keyword.map(Some),
        identifier.map(Some),
        multi_char_operator.map(Some),
        single_char_token.map(Some),
    ))
    .parse_next(input)
}

/// One token in `Template` mode.
fn template_token<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    let text = repeat(1.., alt((template_escape, none_of(['`', '{', '\\'])))).fold(
        String::new,
        |mut acc: String, ch| {
            acc.push(ch);
            acc
        },
    );

    alt((
        '`'.value(Token::TemplateEnd),
        '{'.value(Token::InterpOpen),
        text.map(Token::TemplateText),
    ))
    .parse_next(input)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Root,
    Template,
    /// Inside an interpolation; `depth` counts unmatched `{` opened within it.
    TemplateExpr { depth: usize },
}

/// Mode-stacked lexer state.
struct Lexer<'a> {
    tokens: Vec<PositionedToken<'a>>,
    modes: Vec<Mode>,
    /// Start offsets of the templates currently open.
    template_starts: Vec<usize>,
}

impl<'a> Lexer<'a> {
    fn new() -> Self {
        Self {
            tokens: Vec::new(),
            modes: vec![Mode::Root],
            template_starts: Vec::new(),
        }
    }

    fn mode(&self) -> Mode {
        self.modes.last().copied().unwrap_or(Mode::Root)
    }

    /// Tokenize the whole input, stopping at the first error.
    fn tokenize(&mut self, mut input: Input<'a>) -> Result<(), Diagnostic> {
        while !input.is_empty() {
            let start = input.current_token_start();
            let result = match self.mode() {
                Mode::Root | Mode::TemplateExpr { .. } => root_token(&mut input),
                Mode::Template => template_token(&mut input).map(Some),
            };
            let token = result.map_err(|e| convert_err_mode(e, input.current_token_start()))?;
            let end = input.current_token_start();

            if let Some(token) = token {
                let token = self.transition(token, start);
                self.tokens
                    .push(PositionedToken::new(token, Span::new(start..end)));
            }
        }

        match self.template_starts.last() {
            Some(&start) => Err(Diagnostic::error("unterminated template string")
                .with_code(ErrorCode::E004)
                .with_label(Span::new(start..input.current_token_start()), "template starts here")
                .with_help("add closing `` ` ``")),
            None => Ok(()),
        }
    }

    /// Apply the mode change caused by `token`, returning the token to emit.
    fn transition(&mut self, token: Token<'a>, start: usize) -> Token<'a> {
        match (self.mode(), token) {
            (_, Token::TemplateStart) => {
                self.modes.push(Mode::Template);
                self.template_starts.push(start);
                Token::TemplateStart
            }
            (Mode::Template, Token::TemplateEnd) => {
                self.modes.pop();
                self.template_starts.pop();
                Token::TemplateEnd
            }
            (Mode::Template, Token::InterpOpen) => {
                self.modes.push(Mode::TemplateExpr { depth: 0 });
                Token::InterpOpen
            }
            (Mode::TemplateExpr { depth }, Token::LeftBrace) => {
                self.set_mode(Mode::TemplateExpr { depth: depth + 1 });
                Token::LeftBrace
            }
            (Mode::TemplateExpr { depth: 0 }, Token::RightBrace) => {
                self.modes.pop();
                Token::InterpClose
            }
            (Mode::TemplateExpr { depth }, Token::RightBrace) => {
                self.set_mode(Mode::TemplateExpr { depth: depth - 1 });
                Token::RightBrace
            }
            (_, token) => token,
        }
    }

    fn set_mode(&mut self, mode: Mode) {
        if let Some(top) = self.modes.last_mut() {
            *top = mode;
        }
    }

    fn finish(self) -> Vec<PositionedToken<'a>> {
        self.tokens
    }
}

/// Convert a winnow error at `error_pos` to a [`Diagnostic`].
///
/// Uses the first [`LexerDiagnostic`] context when present and falls back to
/// E002 (unexpected character).
fn convert_err_mode(err: ErrMode<ContextError<LexerDiagnostic>>, error_pos: usize) -> Diagnostic {
    let context_error = match err {
        ErrMode::Backtrack(ctx) | ErrMode::Cut(ctx) => ctx,
        ErrMode::Incomplete(_) => ContextError::new(),
    };

    if let Some(LexerDiagnostic {
        code,
        message,
        help,
        start,
    }) = context_error.context().next()
    {
        let span = Span::new(*start..error_pos);
        let mut diag = Diagnostic::error(*message)
            .with_code(*code)
            .with_label(span, code.description());
        if let Some(h) = help {
            diag = diag.with_help(*h);
        }
        return diag;
    }

    let span = Span::new(error_pos..error_pos.saturating_add(1));
    Diagnostic::error("unexpected character")
        .with_code(ErrorCode::E002)
        .with_label(span, ErrorCode::E002.description())
}

/// Tokenize source text.
///
/// # Errors
///
/// Returns a [`ParseError`] holding the first lexing diagnostic.
pub fn tokenize(input: &str) -> Result<Vec<PositionedToken<'_>>, ParseError> {
    let mut lexer = Lexer::new();
    lexer.tokenize(LocatingSlice::new(input))?;
    let tokens = lexer.finish();
    log::trace!(tokens = tokens.len(); "Tokenized source");
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn kinds(input: &str) -> Vec<Token<'_>> {
        tokenize(input)
            .expect("input should tokenize")
            .into_iter()
            .map(|t| t.token)
            .collect()
    }

    fn error_code(input: &str) -> ErrorCode {
        let err = tokenize(input).expect_err("input should fail to tokenize");
        err.diagnostics()[0].code().expect("lexer errors carry a code")
    }

    #[test]
    fn test_keywords_and_identifiers() {
        assert_eq!(
            kinds("package main func funcs"),
            vec![
                Token::Package,
                Token::Identifier("main"),
                Token::Func,
                Token::Identifier("funcs"),
            ]
        );
        assert_eq!(kinds("make chan"), vec![Token::Make, Token::Chan]);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("42 0x1F 1.5 2e10 6.02e-23"),
            vec![
                Token::IntLiteral("42"),
                Token::IntLiteral("0x1F"),
                Token::FloatLiteral("1.5"),
                Token::FloatLiteral("2e10"),
                Token::FloatLiteral("6.02e-23"),
            ]
        );
    }

    #[test]
    fn test_float_edges() {
        assert_eq!(
            kinds("1.5 1. 2.0e3"),
            vec![
                Token::FloatLiteral("1.5"),
                Token::FloatLiteral("1."),
                Token::FloatLiteral("2.0e3"),
            ]
        );
        assert_eq!(
            kinds("1 .x"),
            vec![Token::IntLiteral("1"), Token::Dot, Token::Identifier("x")]
        );
        assert_eq!(
            kinds("1.e3"),
            vec![Token::IntLiteral("1"), Token::Dot, Token::Identifier("e3")]
        );
        assert_eq!(
            kinds("1..2"),
            vec![
                Token::IntLiteral("1"),
                Token::Dot,
                Token::Dot,
                Token::IntLiteral("2"),
            ]
        );
    }

    #[test]
    fn test_index_then_selector() {
        assert_eq!(
            kinds("xs[0].name"),
            vec![
                Token::Identifier("xs"),
                Token::LeftBracket,
                Token::IntLiteral("0"),
                Token::RightBracket,
                Token::Dot,
                Token::Identifier("name"),
            ]
        );
        assert_eq!(
            kinds("ps[i][0].pos"),
            vec![
                Token::Identifier("ps"),
                Token::LeftBracket,
                Token::Identifier("i"),
                Token::RightBracket,
                Token::LeftBracket,
                Token::IntLiteral("0"),
                Token::RightBracket,
                Token::Dot,
                Token::Identifier("pos"),
            ]
        );
    }

    #[test]
    fn test_operators_longest_match() {
        assert_eq!(
            kinds("x := <-ch; i++ a &^ b ..."),
            vec![
                Token::Identifier("x"),
                Token::Define,
                Token::Arrow,
                Token::Identifier("ch"),
                Token::Semicolon,
                Token::Identifier("i"),
                Token::PlusPlus,
                Token::Identifier("a"),
                Token::AndNot,
                Token::Identifier("b"),
                Token::Ellipsis,
            ]
        );
    }

    #[test]
    fn test_comments_and_whitespace_are_dropped() {
        assert_eq!(
            kinds("a // trailing\n /* block\n comment */ b"),
            vec![Token::Identifier("a"), Token::Identifier("b")]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            kinds(r#""say \"hi\"\n""#),
            vec![Token::StringLiteral("say \"hi\"\n".to_string())]
        );
    }

    #[test]
    fn test_template_modes() {
        assert_eq!(
            kinds("`Counter: {count}!`"),
            vec![
                Token::TemplateStart,
                Token::TemplateText("Counter: ".to_string()),
                Token::InterpOpen,
                Token::Identifier("count"),
                Token::InterpClose,
                Token::TemplateText("!".to_string()),
                Token::TemplateEnd,
            ]
        );
    }

    #[test]
    fn test_template_receive_and_nested_braces() {
        assert_eq!(
            kinds("`{<-ch} {Point{1}}`"),
            vec![
                Token::TemplateStart,
                Token::InterpOpen,
                Token::Arrow,
                Token::Identifier("ch"),
                Token::InterpClose,
                Token::TemplateText(" ".to_string()),
                Token::InterpOpen,
                Token::Identifier("Point"),
                Token::LeftBrace,
                Token::IntLiteral("1"),
                Token::RightBrace,
                Token::InterpClose,
                Token::TemplateEnd,
            ]
        );
    }

    #[test]
    fn test_template_escapes_and_whitespace_kept() {
        assert_eq!(
            kinds(r"`a \{b\} // c`"),
            vec![
                Token::TemplateStart,
                Token::TemplateText("a {b} // c".to_string()),
                Token::TemplateEnd,
            ]
        );
    }

    #[test]
    fn test_template_after_code_returns_to_root() {
        assert_eq!(
            kinds("`x` y"),
            vec![
                Token::TemplateStart,
                Token::TemplateText("x".to_string()),
                Token::TemplateEnd,
                Token::Identifier("y"),
            ]
        );
    }

    #[test]
    fn test_span_tracking() {
        let tokens = tokenize("func  main").unwrap();
        assert_eq!(tokens[0].span, Span::new(0..4));
        assert_eq!(tokens[1].span, Span::new(6..10));
    }

    #[test]
    fn test_lexer_errors() {
        assert_eq!(error_code("\"open"), ErrorCode::E001);
        assert_eq!(error_code("x # y"), ErrorCode::E002);
        assert_eq!(error_code(r#""\q""#), ErrorCode::E003);
        assert_eq!(error_code("`open {x}"), ErrorCode::E004);
        assert_eq!(error_code("/* never closed"), ErrorCode::E005);
    }

    #[test]
    fn test_unexpected_character_span() {
        let err = tokenize("ab $").unwrap_err();
        let diag = &err.diagnostics()[0];
        assert_eq!(diag.labels()[0].span(), Span::new(3..4));
    }

    fn valid_identifier_strategy() -> impl Strategy<Value = String> {
        "[a-z_][a-zA-Z0-9_]{0,20}".prop_filter("avoid keywords", |s| {
            !matches!(
                s.as_str(),
                "package"
                    | "import"
                    | "type"
                    | "struct"
                    | "func"
                    | "var"
                    | "if"
                    | "else"
                    | "for"
                    | "range"
                    | "return"
                    | "break"
                    | "continue"
                    | "chan"
                    | "make"
            )
        })
    }

    proptest! {
        #[test]
        fn identifiers_tokenize_to_one_token(id in valid_identifier_strategy()) {
            let tokens = tokenize(&id).unwrap();
            prop_assert_eq!(tokens.len(), 1);
            prop_assert_eq!(&tokens[0].token, &Token::Identifier(id.as_str()));
        }

        #[test]
        fn integers_and_floats_tokenize(int in 0u32..100000, frac in 0u32..10000) {
            let source = format!("{int} {int}.{frac}");
            let tokens = tokenize(&source).unwrap();
            prop_assert_eq!(tokens.len(), 2);
            prop_assert!(matches!(tokens[0].token, Token::IntLiteral(_)));
            prop_assert!(matches!(tokens[1].token, Token::FloatLiteral(_)));
        }
    }
}
