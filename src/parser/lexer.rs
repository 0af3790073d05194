//! Lexer for wiki markup using logos
//!
//! Lexing happens in two steps. The logos lexer produces [`RawToken`]s where
//! braces are plain runs; [`lex`] then pairs the runs into template and
//! argument delimiters the way the wiki preprocessor does.

use std::collections::HashSet;
use std::fmt;

use logos::{Lexer, Logos};

use super::ast::{Comment, Span, Tag};

/// Parser extension tags recognised by a site out of the box
pub const DEFAULT_EXTENSION_TAGS: &[&str] = &[
    "categorytree",
    "charinsert",
    "chem",
    "code",
    "gallery",
    "graph",
    "hiero",
    "imagemap",
    "indicator",
    "inputbox",
    "mapframe",
    "maplink",
    "math",
    "nowiki",
    "poem",
    "pre",
    "ref",
    "references",
    "score",
    "section",
    "source",
    "syntaxhighlight",
    "templatedata",
    "templatestyles",
    "timeline",
];

/// Tags that only control transclusion and never produce output
const TRANSCLUSION_MARKERS: &[&str] = &["includeonly", "noinclude", "onlyinclude"];

/// Set of tag names whose content is kept verbatim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionTags(HashSet<String>);

impl Default for ExtensionTags {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSION_TAGS.iter().copied())
    }
}

impl ExtensionTags {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            names
                .into_iter()
                .map(|name| name.as_ref().to_ascii_lowercase())
                .collect(),
        )
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(&name.to_ascii_lowercase())
    }
}

/// What a `<name` prefix turned out to be
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagToken {
    /// A complete extension tag
    Element(Tag),
    /// `<noinclude>`, `</includeonly>` and friends
    Marker(String),
    /// Anything else; only the `<name` prefix is consumed
    Text(String),
}

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(extras = ExtensionTags)]
pub enum RawToken {
    #[regex(r"\{+", |lex| lex.slice().len())]
    OpenBraces(usize),

    #[regex(r"\}+", |lex| lex.slice().len())]
    CloseBraces(usize),

    #[token("[[")]
    LinkOpen,

    #[token("]]")]
    LinkClose,

    #[token("|")]
    Pipe,

    #[regex(r"=+", |lex| lex.slice().len())]
    Equals(usize),

    #[token("\n")]
    Newline,

    #[token("<!--", lex_comment)]
    Comment(Comment),

    #[regex(r"</?[a-zA-Z][a-zA-Z0-9]*", lex_tag)]
    Tag(TagToken),

    #[regex(r"[^{}\[\]|=<\n]+", |lex| lex.slice().to_string())]
    Text(String),

    // Single brackets and stray angle brackets
    #[regex(r"[\[\]<]", |lex| lex.slice().to_string())]
    Stray(String),
}

/// Consume a comment body up to `-->`, or to end of input when unterminated
fn lex_comment(lex: &mut Lexer<RawToken>) -> Comment {
    let rest = lex.remainder();
    match rest.find("-->") {
        Some(end) => {
            let content = rest[..end].to_string();
            lex.bump(end + 3);
            Comment {
                content,
                closed: true,
            }
        }
        None => {
            let content = rest.to_string();
            lex.bump(rest.len());
            Comment {
                content,
                closed: false,
            }
        }
    }
}

/// Decide whether `<name` starts an extension tag, a transclusion marker, or text
fn lex_tag(lex: &mut Lexer<RawToken>) -> TagToken {
    let prefix = lex.slice().to_string();
    let closing = prefix.starts_with("</");
    let name = prefix.trim_start_matches('<').trim_start_matches('/').to_ascii_lowercase();
    let rest = lex.remainder();

    let Some(gt) = rest.find('>') else {
        return TagToken::Text(prefix);
    };
    let attributes = &rest[..gt];
    if attributes.contains('<') || attributes.contains('\n') {
        return TagToken::Text(prefix);
    }
    let open = format!("{}{}", prefix, &rest[..=gt]);

    if TRANSCLUSION_MARKERS.contains(&name.as_str()) {
        lex.bump(gt + 1);
        return TagToken::Marker(open);
    }
    if closing || !lex.extras.contains(&name) {
        return TagToken::Text(prefix);
    }

    if attributes.trim_end().ends_with('/') {
        lex.bump(gt + 1);
        return TagToken::Element(Tag {
            name,
            open,
            inner: None,
            close: String::new(),
        });
    }

    // An extension tag without a matching close is plain text
    let body = &rest[gt + 1..];
    let Some((start, end)) = find_closing_tag(body, &name) else {
        return TagToken::Text(prefix);
    };
    let tag = Tag {
        name,
        open,
        inner: Some(body[..start].to_string()),
        close: body[start..end].to_string(),
    };
    lex.bump(gt + 1 + end);
    TagToken::Element(tag)
}

/// Locate `</name>` (case-insensitive, optional whitespace before `>`)
fn find_closing_tag(body: &str, name: &str) -> Option<(usize, usize)> {
    let lowered = body.to_ascii_lowercase();
    let needle = format!("</{}", name);
    let mut from = 0;
    while let Some(found) = lowered[from..].find(&needle) {
        let start = from + found;
        let after = &lowered[start + needle.len()..];
        let padding = after.len() - after.trim_start().len();
        if after[padding..].starts_with('>') {
            return Some((start, start + needle.len() + padding + 1));
        }
        from = start + needle.len();
    }
    None
}

/// Token with brace runs resolved into template and argument delimiters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    ArgOpen,
    ArgClose,
    TemplateOpen,
    TemplateClose,
    LinkOpen,
    LinkClose,
    Pipe,
    Equals(usize),
    Newline,
    Comment(Comment),
    Tag(Tag),
    Marker(String),
    Text(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::ArgOpen => f.write_str("{{{"),
            Token::ArgClose => f.write_str("}}}"),
            Token::TemplateOpen => f.write_str("{{"),
            Token::TemplateClose => f.write_str("}}"),
            Token::LinkOpen => f.write_str("[["),
            Token::LinkClose => f.write_str("]]"),
            Token::Pipe => f.write_str("|"),
            Token::Equals(n) => f.write_str(&"=".repeat(*n)),
            Token::Newline => f.write_str("\n"),
            Token::Comment(comment) => write!(f, "{}", comment),
            Token::Tag(tag) => write!(f, "{}", tag),
            Token::Marker(text) | Token::Text(text) => f.write_str(text),
        }
    }
}

/// Lex markup with the default extension tags
pub fn lex(input: &str) -> Vec<(Token, Span)> {
    lex_with_tags(input, ExtensionTags::default())
}

/// Lex markup, recognising the given extension tags
pub fn lex_with_tags(input: &str, tags: ExtensionTags) -> Vec<(Token, Span)> {
    let raw = RawToken::lexer_with_extras(input, tags)
        .spanned()
        .map(|(tok, span)| match tok {
            Ok(tok) => (tok, span),
            Err(_) => (RawToken::Text(input[span.clone()].to_string()), span),
        });
    pair_links(balance_braces(raw))
}

enum Scope {
    Braces,
    Link(usize),
}

/// Pair `[[` with `]]`.
///
/// A link has to close inside the template or argument it was opened in.
/// Brackets left unpaired are text, so the grammar never starts a link it
/// cannot finish.
fn pair_links(mut tokens: Vec<(Token, Span)>) -> Vec<(Token, Span)> {
    let mut scopes: Vec<Scope> = Vec::new();
    let mut unpaired = Vec::new();
    for (index, (token, _)) in tokens.iter().enumerate() {
        match token {
            Token::TemplateOpen | Token::ArgOpen => scopes.push(Scope::Braces),
            Token::TemplateClose | Token::ArgClose => {
                // Links still open inside the construct die with it
                while let Some(Scope::Link(open)) = scopes.pop() {
                    unpaired.push(open);
                }
            }
            Token::LinkOpen => scopes.push(Scope::Link(index)),
            Token::LinkClose => match scopes.last() {
                Some(Scope::Link(_)) => {
                    scopes.pop();
                }
                _ => unpaired.push(index),
            },
            _ => {}
        }
    }
    unpaired.extend(scopes.into_iter().filter_map(|scope| match scope {
        Scope::Link(open) => Some(open),
        Scope::Braces => None,
    }));

    for index in unpaired {
        let token = &mut tokens[index].0;
        *token = Token::Text(token.to_string());
    }
    tokens
}

enum Slot {
    Token(Token, Span),
    Run(usize),
}

/// An opening brace run waiting for closing braces
struct OpenRun {
    start: usize,
    remaining: usize,
    /// Widths (2 or 3) assigned so far, innermost first
    pieces: Vec<usize>,
}

/// Pair brace runs into template (2) and argument (3) delimiters.
///
/// A closing run is matched against the innermost open run, taking three
/// braces when both sides have them and two otherwise. Braces left over on
/// either side are text.
fn balance_braces(raw: impl Iterator<Item = (RawToken, Span)>) -> Vec<(Token, Span)> {
    let mut slots = Vec::new();
    let mut runs: Vec<OpenRun> = Vec::new();
    // Indices into `runs` that still have at least two braces left
    let mut stack: Vec<usize> = Vec::new();

    for (tok, span) in raw {
        let token = match tok {
            RawToken::OpenBraces(len) => {
                if len >= 2 {
                    stack.push(runs.len());
                }
                slots.push(Slot::Run(runs.len()));
                runs.push(OpenRun {
                    start: span.start,
                    remaining: len,
                    pieces: Vec::new(),
                });
                continue;
            }
            RawToken::CloseBraces(len) => {
                let mut remaining = len;
                let mut offset = span.start;
                while remaining >= 2 {
                    let Some(&top) = stack.last() else {
                        break;
                    };
                    let run = &mut runs[top];
                    let width = if remaining >= 3 && run.remaining >= 3 { 3 } else { 2 };
                    run.pieces.push(width);
                    run.remaining -= width;
                    if run.remaining < 2 {
                        stack.pop();
                    }
                    let close = if width == 3 {
                        Token::ArgClose
                    } else {
                        Token::TemplateClose
                    };
                    slots.push(Slot::Token(close, offset..offset + width));
                    offset += width;
                    remaining -= width;
                }
                if remaining > 0 {
                    slots.push(Slot::Token(
                        Token::Text("}".repeat(remaining)),
                        offset..offset + remaining,
                    ));
                }
                continue;
            }
            RawToken::LinkOpen => Token::LinkOpen,
            RawToken::LinkClose => Token::LinkClose,
            RawToken::Pipe => Token::Pipe,
            RawToken::Equals(n) => Token::Equals(n),
            RawToken::Newline => Token::Newline,
            RawToken::Comment(comment) => Token::Comment(comment),
            RawToken::Tag(TagToken::Element(tag)) => Token::Tag(tag),
            RawToken::Tag(TagToken::Marker(marker)) => Token::Marker(marker),
            RawToken::Tag(TagToken::Text(text)) | RawToken::Text(text) | RawToken::Stray(text) => {
                Token::Text(text)
            }
        };
        slots.push(Slot::Token(token, span));
    }

    let mut tokens = Vec::with_capacity(slots.len());
    for slot in slots {
        match slot {
            Slot::Token(token, span) => tokens.push((token, span)),
            Slot::Run(index) => {
                let run = &runs[index];
                let mut offset = run.start;
                if run.remaining > 0 {
                    tokens.push((
                        Token::Text("{".repeat(run.remaining)),
                        offset..offset + run.remaining,
                    ));
                    offset += run.remaining;
                }
                // Outermost construct opens first
                for &width in run.pieces.iter().rev() {
                    let open = if width == 3 {
                        Token::ArgOpen
                    } else {
                        Token::TemplateOpen
                    };
                    tokens.push((open, offset..offset + width));
                    offset += width;
                }
            }
        }
    }
    tokens
}
