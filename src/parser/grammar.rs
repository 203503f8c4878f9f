//! Parser implementation using chumsky

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::parser::ast::*;
use crate::parser::lexer::Token;

/// Parse layer document source into an AST
pub fn parse(input: &str) -> Result<Document, Vec<crate::ParseError>> {
    let len = input.len();

    // Create a logos lexer and convert to token stream
    let token_iter = crate::parser::lexer::lex(input).map(|(tok, span)| (tok, span.into()));

    // Turn the token iterator into a stream that chumsky can use
    let token_stream = Stream::from_iter(token_iter)
        // Split (Token, SimpleSpan) into token and span parts
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    document_parser()
        .parse(token_stream)
        .into_result()
        .map_err(|errs| errs.into_iter().map(|e| e.into()).collect())
}

/// Helper to extract span range from chumsky's MapExtra
fn span_range(e: &impl chumsky::span::Span<Offset = usize>) -> std::ops::Range<usize> {
    e.start()..e.end()
}

fn document_parser<'a, I>() -> impl Parser<'a, I, Document, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    // Basic token parsers
    let identifier = select! {
        Token::Ident(s) => s,
    }
    .map_with(|id, e| Spanned::new(id, span_range(&e.span())));

    let string_literal = select! {
        Token::String(s) => s,
    }
    .map_with(|s, e| Spanned::new(s, span_range(&e.span())));

    let number = select! {
        Token::Number(n) => n,
    };

    let value = choice((
        // Hex colors like #ff0000, #f00 or #ff000080
        select! { Token::HexColor(c) => Value::Color(c) },
        // Numbers (including negative via Minus token)
        just(Token::Minus)
            .or_not()
            .then(number)
            .map(|(neg, n)| Value::Number(if neg.is_some() { -n } else { n })),
        select! { Token::String(s) => Value::String(s) },
        // Bare words: ellipse, multiply, true, center...
        select! { Token::Ident(s) => Value::Keyword(s) },
    ))
    .map_with(|v, e| Spanned::new(v, span_range(&e.span())));

    let modifier = identifier
        .clone()
        .then_ignore(just(Token::Colon))
        .then(value)
        .map_with(|(key, value), e| Spanned::new(Modifier { key, value }, span_range(&e.span())));

    let modifier_block = modifier
        .separated_by(just(Token::Comma))
        .allow_trailing()
        .collect::<Vec<_>>()
        .delimited_by(just(Token::BracketOpen), just(Token::BracketClose));

    let modifiers = modifier_block.or_not().map(|m| m.unwrap_or_default());

    // Canvas declaration: canvas [width: 800, height: 600]
    let canvas = just(Token::Canvas)
        .ignore_then(modifiers.clone())
        .map(|modifiers| CanvasDecl { modifiers });

    // Recursive layer parser (groups contain layers)
    let layer = recursive(|layer| {
        let group = just(Token::Group)
            .ignore_then(string_literal.clone())
            .then(modifiers.clone())
            .then(
                layer
                    .clone()
                    .repeated()
                    .collect::<Vec<_>>()
                    .delimited_by(just(Token::BraceOpen), just(Token::BraceClose)),
            )
            .map(|((name, modifiers), children)| (name, modifiers, LayerBody::Group { children }));

        let text = just(Token::Text)
            .ignore_then(string_literal.clone())
            .then(modifiers.clone())
            .then(string_literal.clone())
            .map(|((name, modifiers), content)| (name, modifiers, LayerBody::Text { content }));

        // The source is optional: a bare placeholder gets a blank payload
        let placed = just(Token::Placed)
            .ignore_then(string_literal.clone())
            .then(modifiers.clone())
            .then(string_literal.clone().or_not())
            .map(|((name, modifiers), source)| (name, modifiers, LayerBody::Placed { source }));

        let pixels = just(Token::Pixels)
            .ignore_then(string_literal.clone())
            .then(modifiers.clone())
            .then(string_literal.clone())
            .map(|((name, modifiers), source)| (name, modifiers, LayerBody::Pixels { source }));

        let fill = just(Token::Fill)
            .ignore_then(string_literal.clone())
            .then(modifiers.clone())
            .map(|(name, modifiers)| (name, modifiers, LayerBody::Fill));

        choice((group, text, placed, pixels, fill))
            .map_with(|(name, modifiers, body), e| LayerDecl {
                name,
                body,
                modifiers,
                span: span_range(&e.span()),
            })
            .boxed()
    });

    let statement = choice((
        canvas.map(Statement::Canvas),
        layer.map(Statement::Layer),
    ))
    .map_with(|s, e| Spanned::new(s, span_range(&e.span())));

    // Document is a list of statements
    statement
        .repeated()
        .collect()
        .then_ignore(end())
        .map(|statements| Document { statements })
}
