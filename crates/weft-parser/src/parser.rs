//! Parser for Weft token streams.
//!
//! Recursive descent over a [`TokenSlice`] of [`PositionedToken`]s. Most
//! choices are made on the next one or two tokens. The rest use checkpoints:
//!
//! - A component body item is first tried as a statement and then as a
//!   node. A statement may not start with a reserved tag or prop name, may
//!   not be a bare value, and may not be a call followed by `{`; any of
//!   these sends the item to the node parser.
//! - `for` headers are scanned for a `range` clause before being read as a
//!   C-style or condition loop.
//! - `if` and `for` headers parse with composite literals disabled, so
//!   `Name {` there opens the block.
//!
//! The public entry point is [`parse_tokens`].

use winnow::{
    Parser as _,
    combinator::{opt, separated},
    error::{ContextError, ErrMode},
    stream::{Stream, TokenSlice},
    token::any,
};

use weft_core::{
    ast::{
        AssignOp, AssignStmt, BinaryOp, Block, Body, BranchKind, BranchStmt, CallOrSelector,
        CompilationUnit, Component, CompositeElement, CompositeLit, Decorator, Element,
        ElementArg, ElseBranch, Expr, Field, ForHeader, ForStmt, Fragment, FuncLit, GpuBinding,
        GpuField, GpuFunction, GpuParam, GpuResult, GpuStruct, IfStmt, IndexExpr, IndexKind,
        Literal, MakeExpr, Node, NodeFor, NodeIf, Param, Primary, ReceiveExpr, ReturnStmt,
        SelectorBase, SendStmt, Stmt, TemplateLit, TypeDef, TypeDesc, UnaryExpr, UnaryOp,
        VarDecl,
    },
    reserved,
};

use crate::{
    error::{Diagnostic, ErrorCode},
    span::{Span, Spanned},
    tokens::{PositionedToken, Token},
};

/// Context attached to parser errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Context {
    /// What was expected at the failure point.
    Label(&'static str),
    /// Remaining token count (`eof_offset()`) where the failing construct began.
    StartOffset(usize),
    /// A `...` parameter that is followed by more parameters.
    VariadicNotLast(Span),
}

type Input<'src> = TokenSlice<'src, PositionedToken<'src>>;
type IResult<O> = std::result::Result<O, ErrMode<ContextError<Context>>>;

/// `(key, value, iterable)` of a `range` clause.
type RangeClause = (Option<Spanned<String>>, Option<Spanned<String>>, Expr);

fn backtrack(label: &'static str) -> ErrMode<ContextError<Context>> {
    let mut e = ContextError::new();
    e.push(Context::Label(label));
    ErrMode::Backtrack(e)
}

/// Run `f`, turning a backtrack into a cut that remembers where `f` started.
fn cut_err<'src, O, F>(input: &mut Input<'src>, f: F) -> IResult<O>
where
    F: FnOnce(&mut Input<'src>) -> IResult<O>,
{
    let start_remaining = input.eof_offset();

    match f(input) {
        Ok(o) => Ok(o),
        Err(ErrMode::Backtrack(mut e)) | Err(ErrMode::Cut(mut e)) => {
            e.push(Context::StartOffset(start_remaining));
            Err(ErrMode::Cut(e))
        }
        Err(e) => Err(e),
    }
}

fn peek<'src>(input: &Input<'src>) -> Option<&'src Token<'src>> {
    input.peek_token().map(|t| &t.token)
}

fn peek_nth<'src>(input: &Input<'src>, n: usize) -> Option<&'src Token<'src>> {
    let mut lookahead = input.clone();
    for _ in 0..n {
        lookahead.next_token()?;
    }
    peek(&lookahead)
}

fn at<'src>(input: &Input<'src>, expected: Token<'src>) -> bool {
    peek(input) == Some(&expected)
}

/// Consume the next token if it is `expected`.
fn eat<'src>(input: &mut Input<'src>, expected: Token<'src>) -> Option<Span> {
    match input.peek_token() {
        Some(t) if t.token == expected => {
            let _ = input.next_token();
            Some(t.span)
        }
        _ => None,
    }
}

fn expect<'src>(input: &mut Input<'src>, expected: Token<'src>, label: &'static str) -> IResult<Span> {
    any.verify(move |t: &PositionedToken<'src>| t.token == expected)
        .map(|t: &PositionedToken<'src>| t.span)
        .context(Context::Label(label))
        .parse_next(input)
}

fn skip_semicolons(input: &mut Input<'_>) {
    while eat(input, Token::Semicolon).is_some() {}
}

fn comma<'src>(input: &mut Input<'src>) -> IResult<Span> {
    expect(input, Token::Comma, "`,`")
}

fn identifier<'src>(input: &mut Input<'src>) -> IResult<Spanned<String>> {
    any.verify_map(|t: &PositionedToken<'src>| match &t.token {
        Token::Identifier(name) => Some(Spanned::new((*name).to_string(), t.span)),
        _ => None,
    })
    .context(Context::Label("identifier"))
    .parse_next(input)
}

fn identifier_list<'src>(input: &mut Input<'src>) -> IResult<Vec<Spanned<String>>> {
    separated(1.., identifier, comma).parse_next(input)
}

fn string_literal<'src>(input: &mut Input<'src>) -> IResult<Spanned<String>> {
    any.verify_map(|t: &PositionedToken<'src>| match &t.token {
        Token::StringLiteral(s) => Some(Spanned::new(s.clone(), t.span)),
        _ => None,
    })
    .context(Context::Label("string literal"))
    .parse_next(input)
}

fn starts_type(token: Option<&Token<'_>>) -> bool {
    matches!(
        token,
        Some(
            Token::Identifier(_)
                | Token::Star
                | Token::LeftBracket
                | Token::Chan
                | Token::Arrow
                | Token::Func
        )
    )
}

fn starts_expr(token: Option<&Token<'_>>) -> bool {
    matches!(
        token,
        Some(
            Token::Identifier(_)
                | Token::IntLiteral(_)
                | Token::FloatLiteral(_)
                | Token::StringLiteral(_)
                | Token::TemplateStart
                | Token::LeftParen
                | Token::LeftBracket
                | Token::Minus
                | Token::Plus
                | Token::Bang
                | Token::Amp
                | Token::Star
                | Token::Caret
                | Token::Arrow
                | Token::Func
                | Token::Make
        )
    )
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Parse a type: `T`, `pkg.T`, `T[U]`, `*T`, `[]T`, `chan T`, `<-chan T`,
/// `func(A, B) R`.
fn type_desc<'src>(input: &mut Input<'src>) -> IResult<Spanned<TypeDesc>> {
    let Some(first) = input.peek_token() else {
        return Err(backtrack("type"));
    };
    let start = first.span;

    let wrap = |inner: Spanned<TypeDesc>, f: fn(TypeDesc) -> TypeDesc| {
        let span = start.union(inner.span());
        Spanned::new(f(inner.into_inner()), span)
    };

    match &first.token {
        Token::Star => {
            let _ = input.next_token();
            let inner = cut_err(input, type_desc)?;
            Ok(wrap(inner, TypeDesc::pointer))
        }
        Token::LeftBracket => {
            let _ = input.next_token();
            expect(input, Token::RightBracket, "`]` of slice type")?;
            let inner = cut_err(input, type_desc)?;
            Ok(wrap(inner, TypeDesc::slice))
        }
        Token::Chan => {
            let _ = input.next_token();
            let inner = cut_err(input, type_desc)?;
            Ok(wrap(inner, TypeDesc::chan))
        }
        Token::Arrow => {
            let _ = input.next_token();
            expect(input, Token::Chan, "`chan` after `<-`")?;
            let inner = cut_err(input, type_desc)?;
            Ok(wrap(inner, |elem| TypeDesc::Chan {
                recv_only: true,
                elem: Box::new(elem),
            }))
        }
        Token::Func => {
            let _ = input.next_token();
            cut_err(input, |input| {
                expect(input, Token::LeftParen, "`(`")?;
                let (params, close) = type_list_rest(input)?;
                let mut span = start.union(close);
                let results = match peek(input) {
                    Some(Token::LeftParen) => {
                        let _ = input.next_token();
                        let (results, close) = type_list_rest(input)?;
                        span = span.union(close);
                        results
                    }
                    next if starts_type(next) => {
                        let result = type_desc(input)?;
                        span = span.union(result.span());
                        vec![result.into_inner()]
                    }
                    _ => Vec::new(),
                };
                Ok(Spanned::new(TypeDesc::Func { params, results }, span))
            })
        }
        Token::Identifier(_) => {
            let name = identifier(input)?;
            let mut span = name.span();
            let mut name = name.into_inner();
            if at(input, Token::Dot) && matches!(peek_nth(input, 1), Some(Token::Identifier(_))) {
                let _ = input.next_token();
                let member = identifier(input)?;
                span = span.union(member.span());
                name = format!("{name}.{}", member.inner());
            }
            let mut arg = None;
            if at(input, Token::LeftBracket) && !matches!(peek_nth(input, 1), Some(Token::RightBracket)) {
                let _ = input.next_token();
                let inner = cut_err(input, type_desc)?;
                let close = expect(input, Token::RightBracket, "`]` closing the type argument")?;
                span = span.union(close);
                arg = Some(Box::new(inner.into_inner()));
            }
            Ok(Spanned::new(TypeDesc::Named { name, arg }, span))
        }
        _ => Err(backtrack("type")),
    }
}

/// Comma-separated types after `(`, through the closing `)`.
fn type_list_rest<'src>(input: &mut Input<'src>) -> IResult<(Vec<TypeDesc>, Span)> {
    let mut types = Vec::new();
    loop {
        if let Some(close) = eat(input, Token::RightParen) {
            return Ok((types, close));
        }
        types.push(type_desc(input)?.into_inner());
        if eat(input, Token::Comma).is_none() {
            let close = expect(input, Token::RightParen, "`)`")?;
            return Ok((types, close));
        }
    }
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

fn expr_list<'src>(input: &mut Input<'src>, composite: bool) -> IResult<Vec<Expr>> {
    let mut exprs = vec![expr(input, composite)?];
    while eat(input, Token::Comma).is_some() {
        exprs.push(cut_err(input, |input| expr(input, composite))?);
    }
    Ok(exprs)
}

/// Parse a binary chain. Operators are kept in source order without
/// precedence; the generated code's compiler applies its own.
///
/// With `composite` false, `Name {` is not read as a composite literal.
fn expr<'src>(input: &mut Input<'src>, composite: bool) -> IResult<Expr> {
    let head = primary(input, composite)?;
    let mut span = head.span();
    let mut tail = Vec::new();

    while let Some(op) = binary_op(input) {
        let operand = cut_err(input, |input| primary(input, composite))?;
        span = span.union(operand.span());
        tail.push((op, operand));
    }

    Ok(Expr { head, tail, span })
}

fn binary_op(input: &mut Input<'_>) -> Option<Spanned<BinaryOp>> {
    let t = input.peek_token()?;
    let op = match &t.token {
        Token::Plus => BinaryOp::Add,
        Token::Minus => BinaryOp::Sub,
        Token::Star => BinaryOp::Mul,
        Token::Slash => BinaryOp::Div,
        Token::Percent => BinaryOp::Rem,
        Token::EqEq => BinaryOp::Eq,
        Token::NotEq => BinaryOp::Ne,
        Token::Lt => BinaryOp::Lt,
        Token::LtEq => BinaryOp::Le,
        Token::Gt => BinaryOp::Gt,
        Token::GtEq => BinaryOp::Ge,
        Token::AndAnd => BinaryOp::And,
        Token::OrOr => BinaryOp::Or,
        Token::Amp => BinaryOp::BitAnd,
        Token::Pipe => BinaryOp::BitOr,
        Token::Caret => BinaryOp::BitXor,
        Token::Shl => BinaryOp::Shl,
        Token::Shr => BinaryOp::Shr,
        Token::AndNot => BinaryOp::AndNot,
        _ => return None,
    };
    let _ = input.next_token();
    Some(Spanned::new(op, t.span))
}

fn unary_op(token: &Token<'_>) -> Option<UnaryOp> {
    match token {
        Token::Minus => Some(UnaryOp::Neg),
        Token::Plus => Some(UnaryOp::Plus),
        Token::Bang => Some(UnaryOp::Not),
        Token::Amp => Some(UnaryOp::Ref),
        Token::Star => Some(UnaryOp::Deref),
        Token::Caret => Some(UnaryOp::BitNot),
        _ => None,
    }
}

/// An operand with its selectors, calls, indexes and composite braces.
fn primary<'src>(input: &mut Input<'src>, composite: bool) -> IResult<Primary> {
    let Some(first) = input.peek_token() else {
        return Err(backtrack("expression"));
    };
    let start = first.span;

    if let Some(op) = unary_op(&first.token) {
        let _ = input.next_token();
        let operand = cut_err(input, |input| primary(input, composite))?;
        return Ok(Primary::Unary(UnaryExpr {
            op,
            span: start.union(operand.span()),
            operand: Box::new(operand),
        }));
    }

    let operand = match &first.token {
        Token::Arrow => {
            let _ = input.next_token();
            let channel = cut_err(input, identifier)?;
            return Ok(Primary::Receive(ReceiveExpr {
                span: start.union(channel.span()),
                channel,
            }));
        }
        Token::IntLiteral(text) => {
            let _ = input.next_token();
            Primary::Literal(Literal::Int(Spanned::new((*text).to_string(), start)))
        }
        Token::FloatLiteral(text) => {
            let _ = input.next_token();
            Primary::Literal(Literal::Float(Spanned::new((*text).to_string(), start)))
        }
        Token::StringLiteral(text) => {
            let _ = input.next_token();
            Primary::Literal(Literal::String(Spanned::new(text.clone(), start)))
        }
        Token::TemplateStart => Primary::Literal(Literal::Template(template(input)?)),
        Token::Func => Primary::FuncLit(func_lit(input)?),
        Token::Make => Primary::Make(make_expr(input)?),
        Token::LeftParen => {
            let _ = input.next_token();
            let inner = cut_err(input, |input| expr(input, true))?;
            expect(input, Token::RightParen, "`)`")?;
            Primary::Paren(Box::new(inner))
        }
        Token::LeftBracket => {
            let ty = type_desc(input)?;
            Primary::Composite(cut_err(input, |input| composite_body(input, ty))?)
        }
        Token::Identifier(_) => Primary::CallOrSelector(CallOrSelector::ident(identifier(input)?)),
        _ => return Err(backtrack("expression")),
    };

    postfix(input, operand, composite)
}

fn postfix<'src>(input: &mut Input<'src>, mut operand: Primary, composite: bool) -> IResult<Primary> {
    loop {
        operand = match peek(input) {
            Some(Token::Dot) => {
                let _ = input.next_token();
                let field = cut_err(input, identifier)?;
                match operand {
                    Primary::CallOrSelector(mut cs) if cs.args.is_none() => {
                        cs.span = cs.span.union(field.span());
                        cs.path.push(field);
                        Primary::CallOrSelector(cs)
                    }
                    other => {
                        let span = other.span().union(field.span());
                        Primary::CallOrSelector(CallOrSelector {
                            base: SelectorBase::Expr(Box::new(other)),
                            path: vec![field],
                            args: None,
                            span,
                        })
                    }
                }
            }
            Some(Token::LeftParen) => {
                let _ = input.next_token();
                let (args, close) = cut_err(input, call_args_rest)?;
                match operand {
                    Primary::CallOrSelector(mut cs) if cs.args.is_none() => {
                        cs.span = cs.span.union(close);
                        cs.args = Some(args);
                        Primary::CallOrSelector(cs)
                    }
                    other => {
                        let span = other.span().union(close);
                        Primary::CallOrSelector(CallOrSelector {
                            base: SelectorBase::Expr(Box::new(other)),
                            path: Vec::new(),
                            args: Some(args),
                            span,
                        })
                    }
                }
            }
            Some(Token::LeftBracket) => {
                let _ = input.next_token();
                let (index, close) = cut_err(input, index_rest)?;
                Primary::Index(IndexExpr {
                    span: operand.span().union(close),
                    target: Box::new(operand),
                    index,
                })
            }
            Some(Token::LeftBrace) if composite => match composite_type(&operand) {
                Some(ty) => Primary::Composite(cut_err(input, |input| composite_body(input, ty))?),
                None => return Ok(operand),
            },
            _ => return Ok(operand),
        };
    }
}

/// The type named by a primary that may head a composite literal.
fn composite_type(operand: &Primary) -> Option<Spanned<TypeDesc>> {
    match operand {
        Primary::CallOrSelector(cs) if cs.args.is_none() && cs.path.len() <= 1 => {
            let name = cs.qualified_name()?;
            Some(Spanned::new(TypeDesc::named(name), cs.span))
        }
        _ => None,
    }
}

/// Arguments after `(`, through the closing `)`. A trailing comma is allowed.
fn call_args_rest<'src>(input: &mut Input<'src>) -> IResult<(Vec<Expr>, Span)> {
    let mut args = Vec::new();
    loop {
        if let Some(close) = eat(input, Token::RightParen) {
            return Ok((args, close));
        }
        args.push(expr(input, true)?);
        if eat(input, Token::Comma).is_none() {
            let close = expect(input, Token::RightParen, "`,` or `)`")?;
            return Ok((args, close));
        }
    }
}

/// Index or slice bounds after `[`, through the closing `]`.
fn index_rest<'src>(input: &mut Input<'src>) -> IResult<(IndexKind, Span)> {
    let low = if at(input, Token::Colon) {
        None
    } else {
        Some(Box::new(expr(input, true)?))
    };

    let kind = if eat(input, Token::Colon).is_some() {
        let high = if at(input, Token::RightBracket) {
            None
        } else {
            Some(Box::new(expr(input, true)?))
        };
        IndexKind::Slice { low, high }
    } else {
        match low {
            Some(index) => IndexKind::Single(index),
            None => return Err(backtrack("index")),
        }
    };

    let close = expect(input, Token::RightBracket, "`]`")?;
    Ok((kind, close))
}

/// `{ elem, key: elem, ... }` following a composite literal's type.
fn composite_body<'src>(input: &mut Input<'src>, ty: Spanned<TypeDesc>) -> IResult<CompositeLit> {
    expect(input, Token::LeftBrace, "`{` of composite literal")?;
    let mut elements = Vec::new();
    loop {
        if let Some(close) = eat(input, Token::RightBrace) {
            return Ok(CompositeLit {
                span: ty.span().union(close),
                ty,
                elements,
            });
        }
        let key = if matches!(peek(input), Some(Token::Identifier(_)))
            && matches!(peek_nth(input, 1), Some(Token::Colon))
        {
            let key = identifier(input)?;
            let _ = input.next_token();
            Some(key)
        } else {
            None
        };
        let value = expr(input, true)?;
        elements.push(CompositeElement { key, value });
        if eat(input, Token::Comma).is_none() {
            let close = expect(input, Token::RightBrace, "`,` or `}`")?;
            return Ok(CompositeLit {
                span: ty.span().union(close),
                ty,
                elements,
            });
        }
    }
}

fn make_expr<'src>(input: &mut Input<'src>) -> IResult<MakeExpr> {
    let start = expect(input, Token::Make, "`make`")?;
    cut_err(input, |input| {
        expect(input, Token::LeftParen, "`(`")?;
        let ty = type_desc(input)?;
        let mut args = Vec::new();
        while eat(input, Token::Comma).is_some() {
            if at(input, Token::RightParen) {
                break;
            }
            args.push(expr(input, true)?);
        }
        let close = expect(input, Token::RightParen, "`)`")?;
        Ok(MakeExpr {
            ty,
            args,
            span: start.union(close),
        })
    })
}

fn func_lit<'src>(input: &mut Input<'src>) -> IResult<FuncLit> {
    let start = expect(input, Token::Func, "`func`")?;
    cut_err(input, |input| {
        let params = param_list(input, false)?
            .into_iter()
            .map(|p| p.param)
            .collect();
        let results = result_list(input)?;
        let body = block(input)?;
        Ok(FuncLit {
            params,
            results,
            span: start.union(body.span),
            body,
        })
    })
}

/// A backtick template: literal runs and `{expr}` interpolations.
fn template<'src>(input: &mut Input<'src>) -> IResult<TemplateLit> {
    let start = expect(input, Token::TemplateStart, "template")?;
    cut_err(input, |input| {
        let mut fragments = Vec::new();
        loop {
            let Some(t) = input.peek_token() else {
                return Err(backtrack("closing backtick"));
            };
            match &t.token {
                Token::TemplateText(text) => {
                    let _ = input.next_token();
                    fragments.push(Fragment::Text(text.clone()));
                }
                Token::InterpOpen => {
                    let _ = input.next_token();
                    let value = expr(input, true)?;
                    expect(input, Token::InterpClose, "`}` closing the interpolation")?;
                    fragments.push(Fragment::Expr(value));
                }
                Token::TemplateEnd => {
                    let _ = input.next_token();
                    return Ok(TemplateLit {
                        fragments,
                        span: start.union(t.span),
                    });
                }
                _ => return Err(backtrack("template text or interpolation")),
            }
        }
    })
}

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

/// A statement, refused (without consuming) when it would really be a node.
fn statement<'src>(input: &mut Input<'src>) -> IResult<Stmt> {
    if matches!(peek(input), Some(Token::Identifier(name)) if reserved::is_reserved(name)) {
        return Err(backtrack("statement"));
    }

    match peek(input) {
        Some(Token::Var) => var_decl(input).map(Stmt::Var),
        Some(Token::Return) => return_stmt(input).map(Stmt::Return),
        Some(Token::Break) | Some(Token::Continue) => branch_stmt(input).map(Stmt::Branch),
        Some(Token::If) => if_stmt(input).map(Stmt::If),
        Some(Token::For) => for_stmt(input).map(Stmt::For),
        _ => {
            let checkpoint = input.checkpoint();
            let stmt = simple_stmt(input, true)?;
            if let Stmt::Assign(AssignStmt {
                op: None, targets, ..
            }) = &stmt
            {
                let is_call = matches!(targets.as_slice(), [single] if single.is_call());
                if !is_call || at(input, Token::LeftBrace) {
                    input.reset(&checkpoint);
                    return Err(backtrack("statement"));
                }
            }
            Ok(stmt)
        }
    }
}

/// Assignment, declaration, `++`/`--`, send, or expression statement.
fn simple_stmt<'src>(input: &mut Input<'src>, composite: bool) -> IResult<Stmt> {
    let mut targets = expr_list(input, composite)?;
    let start = targets[0].span;

    let Some(t) = input.peek_token() else {
        return Ok(expression_stmt(targets, start));
    };

    let op = match &t.token {
        Token::Define => AssignOp::Define,
        Token::Assign => AssignOp::Assign,
        Token::PlusAssign => AssignOp::AddAssign,
        Token::MinusAssign => AssignOp::SubAssign,
        Token::StarAssign => AssignOp::MulAssign,
        Token::SlashAssign => AssignOp::DivAssign,
        Token::PlusPlus => AssignOp::Inc,
        Token::MinusMinus => AssignOp::Dec,
        Token::Arrow if targets.len() == 1 => {
            let _ = input.next_token();
            let value = cut_err(input, |input| expr(input, composite))?;
            let channel = targets.remove(0);
            return Ok(Stmt::Send(SendStmt {
                span: start.union(value.span),
                channel,
                value,
            }));
        }
        _ => return Ok(expression_stmt(targets, start)),
    };
    let _ = input.next_token();
    let op = Spanned::new(op, t.span);

    if op.is_postfix() {
        return Ok(Stmt::Assign(AssignStmt {
            span: start.union(op.span()),
            targets,
            op: Some(op),
            values: Vec::new(),
        }));
    }

    let values = cut_err(input, |input| expr_list(input, composite))?;
    let end = values.last().map_or(op.span(), |v| v.span);
    Ok(Stmt::Assign(AssignStmt {
        targets,
        op: Some(op),
        values,
        span: start.union(end),
    }))
}

fn expression_stmt(targets: Vec<Expr>, start: Span) -> Stmt {
    let end = targets.last().map_or(start, |t| t.span);
    Stmt::Assign(AssignStmt {
        targets,
        op: None,
        values: Vec::new(),
        span: start.union(end),
    })
}

/// `var a, b T = x, y`; at least one of the type and the values is present.
fn var_decl<'src>(input: &mut Input<'src>) -> IResult<VarDecl> {
    let start = expect(input, Token::Var, "`var`")?;
    cut_err(input, |input| {
        let names = identifier_list(input)?;
        let ty = if starts_type(peek(input)) {
            Some(type_desc(input)?)
        } else {
            None
        };
        let values = if eat(input, Token::Assign).is_some() {
            expr_list(input, true)?
        } else {
            Vec::new()
        };

        let end = match (values.last(), &ty) {
            (Some(value), _) => value.span,
            (None, Some(ty)) => ty.span(),
            (None, None) => return Err(backtrack("variable type or `=`")),
        };

        Ok(VarDecl {
            names,
            ty,
            values,
            span: start.union(end),
        })
    })
}

fn return_stmt<'src>(input: &mut Input<'src>) -> IResult<ReturnStmt> {
    let start = expect(input, Token::Return, "`return`")?;
    let values = if starts_expr(peek(input)) {
        cut_err(input, |input| expr_list(input, true))?
    } else {
        Vec::new()
    };
    let end = values.last().map_or(start, |v| v.span);
    Ok(ReturnStmt {
        values,
        span: start.union(end),
    })
}

fn branch_stmt<'src>(input: &mut Input<'src>) -> IResult<BranchStmt> {
    if let Some(span) = eat(input, Token::Break) {
        return Ok(BranchStmt {
            kind: BranchKind::Break,
            span,
        });
    }
    let span = expect(input, Token::Continue, "`break` or `continue`")?;
    Ok(BranchStmt {
        kind: BranchKind::Continue,
        span,
    })
}

fn block<'src>(input: &mut Input<'src>) -> IResult<Block> {
    let open = expect(input, Token::LeftBrace, "`{`")?;
    let mut stmts = Vec::new();
    loop {
        skip_semicolons(input);
        if let Some(close) = eat(input, Token::RightBrace) {
            return Ok(Block {
                stmts,
                span: open.union(close),
            });
        }
        stmts.push(statement(input)?);
    }
}

fn if_stmt<'src>(input: &mut Input<'src>) -> IResult<IfStmt> {
    let start = expect(input, Token::If, "`if`")?;
    let (init, cond) = if_header(input)?;
    let then = block(input)?;
    let mut span = start.union(then.span);

    let otherwise = if eat(input, Token::Else).is_some() {
        if at(input, Token::If) {
            let nested = if_stmt(input)?;
            span = span.union(nested.span);
            Some(ElseBranch::If(Box::new(nested)))
        } else {
            let block = block(input)?;
            span = span.union(block.span);
            Some(ElseBranch::Block(block))
        }
    } else {
        None
    };

    Ok(IfStmt {
        init,
        cond,
        then,
        otherwise,
        span,
    })
}

/// `[init;] cond` of an `if`.
fn if_header<'src>(input: &mut Input<'src>) -> IResult<(Option<Box<Stmt>>, Expr)> {
    let first = simple_stmt(input, false)?;
    if eat(input, Token::Semicolon).is_some() {
        let cond = expr(input, false)?;
        return Ok((Some(Box::new(first)), cond));
    }
    Ok((None, into_condition(first)?))
}

/// Unwrap an expression statement into the expression it holds.
fn into_condition(stmt: Stmt) -> IResult<Expr> {
    match stmt {
        Stmt::Assign(AssignStmt {
            op: None,
            mut targets,
            ..
        }) if targets.len() == 1 => Ok(targets.remove(0)),
        _ => Err(backtrack("condition")),
    }
}

fn for_stmt<'src>(input: &mut Input<'src>) -> IResult<ForStmt> {
    let start = expect(input, Token::For, "`for`")?;
    let header = for_header(input)?;
    let body = block(input)?;
    Ok(ForStmt {
        header,
        span: start.union(body.span),
        body,
    })
}

fn for_header<'src>(input: &mut Input<'src>) -> IResult<ForHeader> {
    if at(input, Token::LeftBrace) {
        return Ok(ForHeader::Infinite);
    }
    if let Some((key, value, iterable)) = range_clause(input)? {
        return Ok(ForHeader::Range {
            key,
            value,
            iterable,
        });
    }

    let init = if at(input, Token::Semicolon) {
        None
    } else {
        Some(simple_stmt(input, false)?)
    };

    if eat(input, Token::Semicolon).is_none() {
        return match init {
            Some(stmt) => into_condition(stmt).map(ForHeader::Cond),
            None => Err(backtrack("loop condition")),
        };
    }

    let cond = if at(input, Token::Semicolon) {
        None
    } else {
        Some(expr(input, false)?)
    };
    expect(input, Token::Semicolon, "`;` after loop condition")?;
    let post = if at(input, Token::LeftBrace) {
        None
    } else {
        Some(Box::new(simple_stmt(input, false)?))
    };

    Ok(ForHeader::Classic {
        init: init.map(Box::new),
        cond,
        post,
    })
}

/// Probe for `range x`, `k := range x` or `k, v := range x`.
///
/// Returns `None` with the input untouched when the header is not a range
/// clause.
fn range_clause<'src>(input: &mut Input<'src>) -> IResult<Option<RangeClause>> {
    if eat(input, Token::Range).is_some() {
        let iterable = cut_err(input, |input| expr(input, false))?;
        return Ok(Some((None, None, iterable)));
    }

    let checkpoint = input.checkpoint();
    let vars: Option<Vec<Spanned<String>>> = opt(identifier_list).parse_next(input)?;
    let is_range = matches!(vars.as_deref(), Some([_]) | Some([_, _]))
        && (eat(input, Token::Define).is_some() || eat(input, Token::Assign).is_some())
        && eat(input, Token::Range).is_some();
    if !is_range {
        input.reset(&checkpoint);
        return Ok(None);
    }

    let mut vars = vars.unwrap_or_default().into_iter();
    let key = vars.next();
    let value = vars.next();
    let iterable = cut_err(input, |input| expr(input, false))?;
    Ok(Some((key, value, iterable)))
}

// ---------------------------------------------------------------------------
// Nodes
// ---------------------------------------------------------------------------

fn node<'src>(input: &mut Input<'src>) -> IResult<Node> {
    match peek(input) {
        Some(Token::StringLiteral(_)) => string_literal(input).map(Node::Text),
        Some(Token::TemplateStart) => template(input).map(Node::Template),
        Some(Token::If) => node_if(input).map(Node::If),
        Some(Token::For) => node_for(input).map(Node::For),
        Some(Token::Identifier(_)) => element(input).map(Node::Element),
        _ => Err(backtrack("element, text or template")),
    }
}

/// `{ node* }`
fn node_block<'src>(input: &mut Input<'src>) -> IResult<(Vec<Node>, Span)> {
    let open = expect(input, Token::LeftBrace, "`{`")?;
    let mut nodes = Vec::new();
    loop {
        skip_semicolons(input);
        if let Some(close) = eat(input, Token::RightBrace) {
            return Ok((nodes, open.union(close)));
        }
        nodes.push(node(input)?);
    }
}

/// `Tag`, `Tag(args)`, `Tag { children }` or `Tag(args) { children }`.
fn element<'src>(input: &mut Input<'src>) -> IResult<Element> {
    let tag = identifier(input)?;
    let mut span = tag.span();

    let mut args = Vec::new();
    if eat(input, Token::LeftParen).is_some() {
        loop {
            if let Some(close) = eat(input, Token::RightParen) {
                span = span.union(close);
                break;
            }
            args.push(element_arg(input)?);
            if eat(input, Token::Comma).is_none() {
                let close = expect(input, Token::RightParen, "`,` or `)`")?;
                span = span.union(close);
                break;
            }
        }
    }

    let children = if at(input, Token::LeftBrace) {
        let (children, block_span) = node_block(input)?;
        span = span.union(block_span);
        children
    } else {
        Vec::new()
    };

    Ok(Element {
        tag,
        args,
        children,
        span,
    })
}

/// `name: value` or a positional value.
fn element_arg<'src>(input: &mut Input<'src>) -> IResult<ElementArg> {
    let name = if matches!(peek(input), Some(Token::Identifier(_)))
        && matches!(peek_nth(input, 1), Some(Token::Colon))
    {
        let name = identifier(input)?;
        let _ = input.next_token();
        Some(name)
    } else {
        None
    };
    let value = expr(input, true)?;
    Ok(ElementArg { name, value })
}

fn node_if<'src>(input: &mut Input<'src>) -> IResult<NodeIf> {
    let start = expect(input, Token::If, "`if`")?;
    let cond = expr(input, false)?;
    let (then, then_span) = node_block(input)?;
    let mut span = start.union(then_span);

    let otherwise = if eat(input, Token::Else).is_some() {
        if at(input, Token::If) {
            let nested = node_if(input)?;
            span = span.union(nested.span);
            vec![Node::If(nested)]
        } else {
            let (nodes, else_span) = node_block(input)?;
            span = span.union(else_span);
            nodes
        }
    } else {
        Vec::new()
    };

    Ok(NodeIf {
        cond,
        then,
        otherwise,
        span,
    })
}

fn node_for<'src>(input: &mut Input<'src>) -> IResult<NodeFor> {
    let start = expect(input, Token::For, "`for`")?;
    let Some((key, value, iterable)) = range_clause(input)? else {
        return Err(backtrack("`range` clause"));
    };
    let (children, block_span) = node_block(input)?;
    Ok(NodeFor {
        key,
        value,
        iterable,
        children,
        span: start.union(block_span),
    })
}

// ---------------------------------------------------------------------------
// Declarations
// ---------------------------------------------------------------------------

/// A parameter with the decorators written before it.
struct ParsedParam {
    decorators: Vec<Decorator>,
    param: Param,
}

/// `(a, b int, rest ...string)`.
///
/// Names without a type take the type of the next typed entry, as in Go.
fn param_list<'src>(input: &mut Input<'src>, decorated: bool) -> IResult<Vec<ParsedParam>> {
    struct Entry {
        decorators: Vec<Decorator>,
        name: Spanned<String>,
        ty: Option<(Spanned<TypeDesc>, Option<Span>)>,
    }

    expect(input, Token::LeftParen, "`(`")?;
    let mut entries = Vec::new();
    loop {
        if eat(input, Token::RightParen).is_some() {
            break;
        }
        let decorators = if decorated {
            decorator_list(input)?
        } else {
            Vec::new()
        };
        let name = identifier(input)?;
        let ellipsis = eat(input, Token::Ellipsis);
        let ty = if ellipsis.is_some() || !matches!(peek(input), Some(Token::Comma | Token::RightParen)) {
            Some((type_desc(input)?, ellipsis))
        } else {
            None
        };
        entries.push(Entry {
            decorators,
            name,
            ty,
        });
        if eat(input, Token::Comma).is_none() {
            expect(input, Token::RightParen, "`,` or `)`")?;
            break;
        }
    }

    let mut params = Vec::with_capacity(entries.len());
    let mut pending: Option<(Spanned<TypeDesc>, Option<Span>)> = None;
    for entry in entries.into_iter().rev() {
        if entry.ty.is_some() {
            pending = entry.ty;
        }
        let Some((ty, ellipsis)) = pending.clone() else {
            return Err(backtrack("parameter type"));
        };
        params.push(ParsedParam {
            decorators: entry.decorators,
            param: Param {
                name: entry.name,
                ty,
                variadic: ellipsis.is_some(),
            },
        });
        // A grouped name shares the type but not the `...`.
        if let Some((_, ellipsis)) = &mut pending {
            *ellipsis = None;
        }
    }
    params.reverse();

    let last = params.len().saturating_sub(1);
    if let Some(misplaced) = params
        .iter()
        .enumerate()
        .find(|(i, p)| p.param.variadic && *i != last)
    {
        let mut e = ContextError::new();
        e.push(Context::VariadicNotLast(misplaced.1.param.name.span()));
        return Err(ErrMode::Cut(e));
    }

    Ok(params)
}

/// `T`, `(T, U)` or nothing.
fn result_list<'src>(input: &mut Input<'src>) -> IResult<Vec<Spanned<TypeDesc>>> {
    if eat(input, Token::LeftParen).is_some() {
        let mut results = Vec::new();
        loop {
            if eat(input, Token::RightParen).is_some() {
                return Ok(results);
            }
            results.push(type_desc(input)?);
            if eat(input, Token::Comma).is_none() {
                expect(input, Token::RightParen, "`,` or `)`")?;
                return Ok(results);
            }
        }
    }
    if starts_type(peek(input)) {
        return Ok(vec![type_desc(input)?]);
    }
    Ok(Vec::new())
}

fn decorator<'src>(input: &mut Input<'src>) -> IResult<Decorator> {
    let at_span = expect(input, Token::At, "`@`")?;
    cut_err(input, |input| {
        let name = identifier(input)?;
        let mut span = at_span.union(name.span());
        let mut args = Vec::new();
        if eat(input, Token::LeftParen).is_some() {
            let (parsed, close) = call_args_rest(input)?;
            args = parsed;
            span = span.union(close);
        }
        Ok(Decorator { name, args, span })
    })
}

fn decorator_list<'src>(input: &mut Input<'src>) -> IResult<Vec<Decorator>> {
    let mut out = Vec::new();
    while at(input, Token::At) {
        out.push(decorator(input)?);
    }
    Ok(out)
}

/// `{ [@deco] a, b T ... }` of a struct declaration. Field decorators are
/// only accepted when `decorated` is set.
fn struct_fields<'src>(
    input: &mut Input<'src>,
    decorated: bool,
) -> IResult<(Vec<GpuField>, Span)> {
    expect(input, Token::LeftBrace, "`{`")?;
    let mut fields = Vec::new();
    loop {
        while eat(input, Token::Semicolon).is_some() || eat(input, Token::Comma).is_some() {}
        if let Some(close) = eat(input, Token::RightBrace) {
            return Ok((fields, close));
        }
        if !decorated && at(input, Token::At) {
            return Err(backtrack("field name (decorators need a GPU struct)"));
        }
        let decorators = decorator_list(input)?;
        let names = identifier_list(input)?;
        let ty = type_desc(input)?;
        for name in names {
            fields.push(GpuField {
                decorators: decorators.clone(),
                name,
                ty: ty.clone(),
            });
        }
    }
}

enum StructDecl {
    Plain(TypeDef),
    Gpu(GpuStruct),
}

/// `type Name struct { ... }`; any decorator makes it a GPU struct.
fn struct_decl<'src>(
    input: &mut Input<'src>,
    decorators: Vec<Decorator>,
    start: Span,
) -> IResult<StructDecl> {
    expect(input, Token::Type, "`type`")?;
    cut_err(input, |input| {
        let name = identifier(input)?;
        expect(input, Token::Struct, "`struct`")?;
        let (fields, close) = struct_fields(input, !decorators.is_empty())?;
        let span = start.union(close);

        if !decorators.is_empty() {
            return Ok(StructDecl::Gpu(GpuStruct {
                decorators,
                name,
                fields,
                span,
            }));
        }
        Ok(StructDecl::Plain(TypeDef {
            name,
            fields: fields
                .into_iter()
                .map(|f| Field {
                    name: f.name,
                    ty: f.ty,
                })
                .collect(),
            span,
        }))
    })
}

fn component<'src>(input: &mut Input<'src>, auto_props: bool, start: Span) -> IResult<Component> {
    expect(input, Token::Func, "`func`")?;
    cut_err(input, |input| {
        let name = identifier(input)?;
        let params = param_list(input, false)?
            .into_iter()
            .map(|p| p.param)
            .collect();
        let results = result_list(input)?;
        let (body, body_span) = component_body(input)?;
        Ok(Component {
            name,
            params,
            results,
            body,
            auto_props,
            span: start.union(body_span),
        })
    })
}

/// `{ item* }` where each item is a hoisted `var`, a statement, or a node.
fn component_body<'src>(input: &mut Input<'src>) -> IResult<(Body, Span)> {
    let open = expect(input, Token::LeftBrace, "`{`")?;
    let mut body = Body::default();
    loop {
        skip_semicolons(input);
        if let Some(close) = eat(input, Token::RightBrace) {
            return Ok((body, open.union(close)));
        }
        body_item(input, &mut body)?;
    }
}

/// Try a statement, then a node. When both fail, report whichever got
/// further.
fn body_item<'src>(input: &mut Input<'src>, body: &mut Body) -> IResult<()> {
    if at(input, Token::Var) {
        body.vars.push(var_decl(input)?);
        return Ok(());
    }

    let start = input.checkpoint();
    let stmt_err = match statement(input) {
        Ok(stmt) => {
            body.stmts.push(stmt);
            return Ok(());
        }
        Err(e) => e,
    };
    let stmt_failed_at = input.checkpoint();
    let stmt_remaining = input.eof_offset();
    input.reset(&start);

    match node(input) {
        // A statement that failed past the end of the node was the real intent.
        Ok(_) if stmt_remaining < input.eof_offset() => {
            input.reset(&stmt_failed_at);
            Err(into_cut(stmt_err))
        }
        Ok(node) => {
            body.nodes.push(node);
            Ok(())
        }
        Err(node_err) if input.eof_offset() <= stmt_remaining => Err(into_cut(node_err)),
        Err(_) => {
            input.reset(&stmt_failed_at);
            Err(into_cut(stmt_err))
        }
    }
}

fn into_cut(err: ErrMode<ContextError<Context>>) -> ErrMode<ContextError<Context>> {
    match err {
        ErrMode::Backtrack(e) => ErrMode::Cut(e),
        other => other,
    }
}

fn gpu_function<'src>(
    input: &mut Input<'src>,
    decorators: Vec<Decorator>,
    start: Span,
) -> IResult<GpuFunction> {
    expect(input, Token::Func, "`func`")?;
    cut_err(input, |input| {
        let name = identifier(input)?;
        let params = param_list(input, true)?
            .into_iter()
            .map(|p| GpuParam {
                decorators: p.decorators,
                name: p.param.name,
                ty: p.param.ty,
            })
            .collect();
        let result = if at(input, Token::At) || starts_type(peek(input)) {
            let decorators = decorator_list(input)?;
            let ty = type_desc(input)?;
            Some(GpuResult { decorators, ty })
        } else {
            None
        };
        let body = block(input)?;
        Ok(GpuFunction {
            decorators,
            name,
            params,
            result,
            span: start.union(body.span),
            body,
        })
    })
}

/// `var name T` preceded by binding decorators.
fn gpu_binding<'src>(
    input: &mut Input<'src>,
    decorators: Vec<Decorator>,
    start: Span,
) -> IResult<GpuBinding> {
    expect(input, Token::Var, "`var`")?;
    cut_err(input, |input| {
        let name = identifier(input)?;
        let ty = type_desc(input)?;
        Ok(GpuBinding {
            decorators,
            name,
            span: start.union(ty.span()),
            ty,
        })
    })
}

fn import_decl<'src>(input: &mut Input<'src>, imports: &mut Vec<Spanned<String>>) -> IResult<()> {
    expect(input, Token::Import, "`import`")?;
    cut_err(input, |input| {
        if eat(input, Token::LeftParen).is_none() {
            imports.push(string_literal(input)?);
            return Ok(());
        }
        loop {
            skip_semicolons(input);
            if eat(input, Token::RightParen).is_some() {
                return Ok(());
            }
            imports.push(string_literal(input)?);
        }
    })
}

fn top_level_decl<'src>(input: &mut Input<'src>, unit: &mut CompilationUnit) -> IResult<()> {
    let start = input
        .peek_token()
        .map(|t| t.span)
        .ok_or_else(|| backtrack("declaration"))?;
    let decorators = decorator_list(input)?;

    match peek(input) {
        Some(Token::Type) => match struct_decl(input, decorators, start)? {
            StructDecl::Plain(def) => unit.types.push(def),
            StructDecl::Gpu(gpu) => unit.gpu_structs.push(gpu),
        },
        Some(Token::Func) => {
            let props = decorators
                .iter()
                .filter(|d| d.name.inner() == "props")
                .count();
            if decorators.is_empty() {
                unit.components.push(component(input, false, start)?);
            } else if props == 0 {
                unit.gpu_functions
                    .push(gpu_function(input, decorators, start)?);
            } else if props == 1 && decorators.len() == 1 {
                unit.components.push(component(input, true, start)?);
            } else {
                return Err(into_cut(backtrack("`@props` as the only decorator")));
            }
        }
        Some(Token::Var) if !decorators.is_empty() => {
            unit.gpu_bindings.push(gpu_binding(input, decorators, start)?);
        }
        _ => return Err(into_cut(backtrack("`type`, `func` or decorated `var`"))),
    }
    Ok(())
}

fn compilation_unit<'src>(input: &mut Input<'src>) -> IResult<CompilationUnit> {
    skip_semicolons(input);
    expect(input, Token::Package, "`package` clause")?;
    let package = cut_err(input, identifier)?;

    let mut unit = CompilationUnit {
        package,
        imports: Vec::new(),
        types: Vec::new(),
        components: Vec::new(),
        gpu_structs: Vec::new(),
        gpu_bindings: Vec::new(),
        gpu_functions: Vec::new(),
    };

    skip_semicolons(input);
    while at(input, Token::Import) {
        import_decl(input, &mut unit.imports)?;
        skip_semicolons(input);
    }

    while input.eof_offset() > 0 {
        top_level_decl(input, &mut unit)?;
        skip_semicolons(input);
    }

    Ok(unit)
}

/// Convert a winnow error to a [`Diagnostic`].
///
/// `remaining` is the number of unconsumed tokens when parsing stopped; the
/// token at that position is reported as unexpected.
fn convert_error(
    error: ErrMode<ContextError<Context>>,
    tokens: &[PositionedToken<'_>],
    remaining: usize,
) -> Diagnostic {
    let position = tokens.len().saturating_sub(remaining);
    let last_span = tokens.last().map(|t| t.span).unwrap_or_default();

    let context = match error {
        ErrMode::Backtrack(e) | ErrMode::Cut(e) => e,
        ErrMode::Incomplete(_) => {
            return Diagnostic::error("incomplete input, more tokens expected")
                .with_code(ErrorCode::E101)
                .with_label(last_span, "input ends here");
        }
    };

    if let Some(span) = context.context().find_map(|ctx| match ctx {
        Context::VariadicNotLast(span) => Some(*span),
        _ => None,
    }) {
        return Diagnostic::error("variadic parameter must be the last parameter")
            .with_code(ErrorCode::E102)
            .with_label(span, "followed by more parameters")
            .with_help("move the `...` parameter to the end of the list");
    }

    let expected = context.context().find_map(|ctx| match ctx {
        Context::Label(label) => Some(*label),
        _ => None,
    });
    let started_at = context
        .context()
        .filter_map(|ctx| match ctx {
            Context::StartOffset(n) => Some(tokens.len().saturating_sub(*n)),
            _ => None,
        })
        .find(|&start| start < position);

    let Some(found) = tokens.get(position) else {
        let message = match expected {
            Some(label) => format!("unexpected end of input, expected {label}"),
            None => "unexpected end of input".to_string(),
        };
        return Diagnostic::error(message)
            .with_code(ErrorCode::E101)
            .with_label(last_span, "input ends here");
    };

    let message = match expected {
        Some(label) => format!("expected {label}, found `{}`", found.token),
        None => format!("unexpected token `{}`", found.token),
    };
    let mut diag = Diagnostic::error(message)
        .with_code(ErrorCode::E100)
        .with_label(found.span, "unexpected token");

    if let Some(first) = started_at.and_then(|start| tokens.get(start)) {
        diag = diag.with_secondary_label(first.span, "while parsing this");
    }
    diag
}

/// Parse a token stream into a [`CompilationUnit`].
///
/// # Errors
///
/// Returns the first syntax error as a [`Diagnostic`]; no partial tree is
/// produced.
pub fn parse_tokens<'src>(
    tokens: &'src [PositionedToken<'src>],
) -> Result<CompilationUnit, Diagnostic> {
    let mut token_slice = TokenSlice::new(tokens);

    match compilation_unit(&mut token_slice) {
        Ok(unit) => Ok(unit),
        Err(e) => {
            let remaining = token_slice.eof_offset();
            Err(convert_error(e, tokens, remaining))
        }
    }
}
