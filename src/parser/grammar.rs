//! Parser implementation using chumsky
//!
//! Wiki markup never fails to parse. Every structured construct is tried
//! first and any token that does not start one (or whose construct does not
//! close) is kept as text.

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::parser::ast::*;
use crate::parser::lexer::{self, ExtensionTags, Token};

/// Parse markup into a node sequence with the default extension tags
pub fn parse(input: &str) -> Result<Vec<Node>, Vec<crate::ParseError>> {
    parse_with_tags(input, ExtensionTags::default())
}

/// Parse markup into a node sequence, recognising the given extension tags
pub fn parse_with_tags(
    input: &str,
    tags: ExtensionTags,
) -> Result<Vec<Node>, Vec<crate::ParseError>> {
    let len = input.len();

    let token_iter = lexer::lex_with_tags(input, tags)
        .into_iter()
        .map(|(tok, span)| (tok, span.into()));

    // Turn the token iterator into a stream that chumsky can use
    let token_stream = Stream::from_iter(token_iter)
        // Split (Token, SimpleSpan) into token and span parts
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    document_parser()
        .parse(token_stream)
        .into_result()
        .map_err(|errs| errs.into_iter().map(|e| e.into()).collect())
}

fn ends_template_name(tok: &Token) -> bool {
    matches!(tok, Token::Pipe | Token::TemplateClose)
}

fn ends_parameter_name(tok: &Token) -> bool {
    matches!(tok, Token::Pipe | Token::TemplateClose | Token::Equals(_))
}

fn ends_argument_name(tok: &Token) -> bool {
    matches!(tok, Token::Pipe | Token::ArgClose)
}

fn ends_argument_default(tok: &Token) -> bool {
    matches!(tok, Token::ArgClose)
}

fn ends_link_target(tok: &Token) -> bool {
    matches!(tok, Token::Pipe | Token::LinkClose)
}

fn ends_link_text(tok: &Token) -> bool {
    matches!(tok, Token::LinkClose)
}

/// A named parameter split on an `=` run keeps the surplus `=` in its value
fn with_surplus_equals(run: usize, mut value: Vec<Node>) -> Vec<Node> {
    if run > 1 {
        value.insert(0, Node::Text("=".repeat(run - 1)));
    }
    merge_text(value)
}

fn document_parser<'a, I>() -> impl Parser<'a, I, Vec<Node>, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    // A structured node: template, argument, link, comment, tag or marker
    let element = recursive(|element| {
        // Nodes up to (not including) a token accepted by `stop`
        let inline = |stop: fn(&Token) -> bool| {
            choice((
                element.clone(),
                any()
                    .filter(move |tok: &Token| !stop(tok))
                    .map(|tok: Token| Node::Text(tok.to_string())),
            ))
            .repeated()
            .collect::<Vec<_>>()
            .map(merge_text)
        };

        // Split on the first `=` outside nested constructs, without backtracking
        let parameter = inline(ends_parameter_name)
            .then(
                select! { Token::Equals(run) => run }
                    .then(inline(ends_template_name))
                    .or_not(),
            )
            .map(|(name, value)| match value {
                Some((run, value)) => Parameter::named(name, with_surplus_equals(run, value)),
                None => Parameter::anonymous(name),
            });

        let template = just(Token::TemplateOpen)
            .ignore_then(inline(ends_template_name))
            .then(
                just(Token::Pipe)
                    .ignore_then(parameter)
                    .repeated()
                    .collect::<Vec<_>>(),
            )
            .then_ignore(just(Token::TemplateClose))
            .map(|(name, parameters)| Node::Template(Template { name, parameters }));

        let argument = just(Token::ArgOpen)
            .ignore_then(inline(ends_argument_name))
            .then(
                just(Token::Pipe)
                    .ignore_then(inline(ends_argument_default))
                    .or_not(),
            )
            .then_ignore(just(Token::ArgClose))
            .map(|(name, default)| Node::Argument(Argument { name, default }));

        let link = just(Token::LinkOpen)
            .ignore_then(inline(ends_link_target))
            .then(just(Token::Pipe).ignore_then(inline(ends_link_text)).or_not())
            .then_ignore(just(Token::LinkClose))
            .map(|(target, text)| Node::Link(Link { target, text }));

        let leaf = select! {
            Token::Comment(comment) => Node::Comment(comment),
            Token::Tag(tag) => Node::Tag(tag),
            Token::Marker(marker) => Node::Ignore(marker),
        };

        choice((template, argument, link, leaf)).boxed()
    });

    // Document is a list of nodes; anything that is not a construct is text
    choice((
        element,
        any().map(|tok: Token| Node::Text(tok.to_string())),
    ))
    .repeated()
    .collect::<Vec<_>>()
    .then_ignore(end())
    .map(|nodes| detect_headers(merge_text(nodes)))
}

/// Turn top-level lines of the form `== title ==` into header nodes
fn detect_headers(nodes: Vec<Node>) -> Vec<Node> {
    let mut lines: Vec<Vec<Node>> = Vec::new();
    let mut current = Vec::new();
    for node in nodes {
        match node {
            Node::Text(text) if text.contains('\n') => {
                let mut pieces = text.split('\n');
                if let Some(first) = pieces.next() {
                    current.push(Node::text(first));
                }
                for piece in pieces {
                    lines.push(std::mem::take(&mut current));
                    current.push(Node::text(piece));
                }
            }
            other => current.push(other),
        }
    }
    lines.push(current);

    let mut out = Vec::new();
    for (index, line) in lines.into_iter().enumerate() {
        if index > 0 {
            out.push(Node::text("\n"));
        }
        match header_from_line(merge_text(line)) {
            Ok(header) => out.push(Node::Header(header)),
            Err(line) => out.extend(line),
        }
    }
    merge_text(out)
}

fn leading_equals(text: &str) -> usize {
    text.chars().take_while(|&c| c == '=').count()
}

fn trailing_equals(text: &str) -> usize {
    text.chars().rev().take_while(|&c| c == '=').count()
}

/// Split a line into a header, or hand it back untouched
fn header_from_line(line: Vec<Node>) -> Result<Header, Vec<Node>> {
    let starts_with_equals = matches!(line.first(), Some(Node::Text(t)) if t.starts_with('='));
    if !starts_with_equals {
        return Err(line);
    }

    // Peel comments and blanks off the end
    let mut body = line.clone();
    let mut trailing = Vec::new();
    while let Some(last) = body.pop() {
        match last {
            Node::Comment(_) => trailing.insert(0, last),
            Node::Text(text) => {
                let trimmed = text.trim_end_matches([' ', '\t']);
                if trimmed.is_empty() {
                    trailing.insert(0, Node::Text(text));
                    continue;
                }
                if trimmed.len() < text.len() {
                    trailing.insert(0, Node::text(&text[trimmed.len()..]));
                }
                body.push(Node::text(trimmed));
                break;
            }
            other => {
                body.push(other);
                break;
            }
        }
    }

    let (Some(Node::Text(first)), Some(Node::Text(last))) = (body.first(), body.last()) else {
        return Err(line);
    };
    if !last.ends_with('=') {
        return Err(line);
    }

    let mut level = leading_equals(first).min(trailing_equals(last));
    if body.len() == 1 && leading_equals(first) == first.len() {
        // A line made only of `=`: keep at least one as the title
        level = level.min(first.len().saturating_sub(1) / 2);
    }
    let level = level.min(6);
    if level == 0 {
        return Err(line);
    }

    let count = body.len();
    let title = body
        .into_iter()
        .enumerate()
        .map(|(index, node)| match node {
            Node::Text(mut text) => {
                if index + 1 == count {
                    text.truncate(text.len() - level);
                }
                if index == 0 {
                    text.drain(..level);
                }
                Node::Text(text)
            }
            other => other,
        })
        .collect();

    Ok(Header {
        level,
        title: merge_text(title),
        trailing,
    })
}
