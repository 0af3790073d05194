//! Node tree for wiki markup
//!
//! Every node renders its original source text through [`std::fmt::Display`],
//! which is what the evaluator falls back to when a construct cannot be
//! resolved.

use std::fmt;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// A single node of parsed markup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Plain text, kept verbatim
    Text(String),
    /// `<!-- ... -->`
    Comment(Comment),
    /// `== title ==` at the start of a line
    Header(Header),
    /// Partial transclusion markers such as `<noinclude>`
    Ignore(String),
    /// `[[target|text]]`
    Link(Link),
    /// `{{name|param|key=value}}`
    Template(Template),
    /// `{{{name|default}}}`
    Argument(Argument),
    /// A template parameter. Only meaningful inside a [`Template`].
    Parameter(Parameter),
    /// Parser extension tag such as `<nowiki>...</nowiki>`
    Tag(Tag),
}

/// An HTML comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub content: String,
    /// False when the comment ran to the end of input without `-->`
    pub closed: bool,
}

/// A section header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Number of `=` on each side, 1 to 6
    pub level: usize,
    pub title: Vec<Node>,
    /// Comments and whitespace after the closing `=` run
    pub trailing: Vec<Node>,
}

/// A wiki link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub target: Vec<Node>,
    /// Caption after the first pipe, if any
    pub text: Option<Vec<Node>>,
}

/// A template, parser function or variable invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub name: Vec<Node>,
    pub parameters: Vec<Parameter>,
}

/// A template argument reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    pub name: Vec<Node>,
    pub default: Option<Vec<Node>>,
}

/// One `|`-separated parameter of a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// `None` for anonymous (positional) parameters
    pub name: Option<Vec<Node>>,
    pub value: Vec<Node>,
}

impl Parameter {
    pub fn anonymous(value: Vec<Node>) -> Self {
        Self { name: None, value }
    }

    pub fn named(name: Vec<Node>, value: Vec<Node>) -> Self {
        Self {
            name: Some(name),
            value,
        }
    }
}

/// A parser extension tag whose content is kept verbatim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Lower-cased tag name
    pub name: String,
    /// Opening tag including attributes, e.g. `<ref name="a">`
    pub open: String,
    /// Inner text; `None` for self-closing tags
    pub inner: Option<String>,
    /// Closing tag, empty for self-closing tags
    pub close: String,
}

impl Tag {
    /// Inner text, empty for self-closing tags
    pub fn inner_text(&self) -> &str {
        self.inner.as_deref().unwrap_or_default()
    }
}

/// Dispatch over the node kinds
///
/// Implementors handle exactly one method per node; [`Node::accept`] picks it.
pub trait Visitor {
    type Output;

    fn visit_text(&mut self, text: &str) -> Self::Output;
    fn visit_comment(&mut self, comment: &Comment) -> Self::Output;
    fn visit_header(&mut self, header: &Header) -> Self::Output;
    fn visit_ignore(&mut self, marker: &str) -> Self::Output;
    fn visit_link(&mut self, link: &Link) -> Self::Output;
    fn visit_template(&mut self, template: &Template) -> Self::Output;
    fn visit_argument(&mut self, argument: &Argument) -> Self::Output;
    fn visit_parameter(&mut self, parameter: &Parameter) -> Self::Output;
    fn visit_tag(&mut self, tag: &Tag) -> Self::Output;
}

impl Node {
    pub fn text(s: impl Into<String>) -> Self {
        Node::Text(s.into())
    }

    /// Route this node to the matching visitor method
    pub fn accept<V: Visitor>(&self, visitor: &mut V) -> V::Output {
        match self {
            Node::Text(text) => visitor.visit_text(text),
            Node::Comment(comment) => visitor.visit_comment(comment),
            Node::Header(header) => visitor.visit_header(header),
            Node::Ignore(marker) => visitor.visit_ignore(marker),
            Node::Link(link) => visitor.visit_link(link),
            Node::Template(template) => visitor.visit_template(template),
            Node::Argument(argument) => visitor.visit_argument(argument),
            Node::Parameter(parameter) => visitor.visit_parameter(parameter),
            Node::Tag(tag) => visitor.visit_tag(tag),
        }
    }

    /// The original markup this node was parsed from
    pub fn to_source(&self) -> String {
        self.to_string()
    }
}

/// Render a node sequence back to markup
pub fn to_source(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        out.push_str(&node.to_string());
    }
    out
}

/// Merge adjacent text nodes and drop empty ones
pub fn merge_text(nodes: Vec<Node>) -> Vec<Node> {
    let mut merged: Vec<Node> = Vec::with_capacity(nodes.len());
    for node in nodes {
        if let Node::Text(text) = &node {
            if text.is_empty() {
                continue;
            }
            if let Some(Node::Text(prev)) = merged.last_mut() {
                prev.push_str(text);
                continue;
            }
        }
        merged.push(node);
    }
    merged
}

fn write_nodes(f: &mut fmt::Formatter<'_>, nodes: &[Node]) -> fmt::Result {
    nodes.iter().try_for_each(|node| write!(f, "{}", node))
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Text(text) => f.write_str(text),
            Node::Comment(comment) => write!(f, "{}", comment),
            Node::Header(header) => write!(f, "{}", header),
            Node::Ignore(marker) => f.write_str(marker),
            Node::Link(link) => write!(f, "{}", link),
            Node::Template(template) => write!(f, "{}", template),
            Node::Argument(argument) => write!(f, "{}", argument),
            Node::Parameter(parameter) => write!(f, "{}", parameter),
            Node::Tag(tag) => write!(f, "{}", tag),
        }
    }
}

impl fmt::Display for Comment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<!--{}", self.content)?;
        if self.closed {
            f.write_str("-->")?;
        }
        Ok(())
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marks = "=".repeat(self.level);
        f.write_str(&marks)?;
        write_nodes(f, &self.title)?;
        f.write_str(&marks)?;
        write_nodes(f, &self.trailing)
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[[")?;
        write_nodes(f, &self.target)?;
        if let Some(text) = &self.text {
            f.write_str("|")?;
            write_nodes(f, text)?;
        }
        f.write_str("]]")
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{{")?;
        write_nodes(f, &self.name)?;
        for parameter in &self.parameters {
            write!(f, "|{}", parameter)?;
        }
        f.write_str("}}")
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{{{")?;
        write_nodes(f, &self.name)?;
        if let Some(default) = &self.default {
            f.write_str("|")?;
            write_nodes(f, default)?;
        }
        f.write_str("}}}")
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.name {
            write_nodes(f, name)?;
            f.write_str("=")?;
        }
        write_nodes(f, &self.value)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.open)?;
        if let Some(inner) = &self.inner {
            f.write_str(inner)?;
        }
        f.write_str(&self.close)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_source() {
        let template = Template {
            name: vec![Node::text("Infobox")],
            parameters: vec![
                Parameter::anonymous(vec![Node::text("a")]),
                Parameter::named(vec![Node::text("key")], vec![Node::text("value")]),
            ],
        };
        assert_eq!(template.to_string(), "{{Infobox|a|key=value}}");
    }

    #[test]
    fn test_argument_source() {
        let argument = Argument {
            name: vec![Node::text("1")],
            default: Some(vec![]),
        };
        assert_eq!(argument.to_string(), "{{{1|}}}");
    }

    #[test]
    fn test_header_source() {
        let header = Header {
            level: 2,
            title: vec![Node::text(" History ")],
            trailing: vec![Node::Comment(Comment {
                content: " x ".to_string(),
                closed: true,
            })],
        };
        assert_eq!(header.to_string(), "== History ==<!-- x -->");
    }

    #[test]
    fn test_unclosed_comment_source() {
        let comment = Comment {
            content: " open".to_string(),
            closed: false,
        };
        assert_eq!(Node::Comment(comment).to_source(), "<!-- open");
    }

    #[test]
    fn test_merge_text() {
        let nodes = merge_text(vec![
            Node::text("a"),
            Node::text(""),
            Node::text("b"),
            Node::Ignore("<noinclude>".to_string()),
            Node::text("c"),
        ]);
        assert_eq!(
            nodes,
            vec![
                Node::text("ab"),
                Node::Ignore("<noinclude>".to_string()),
                Node::text("c"),
            ]
        );
    }

    struct KindCounter(Vec<&'static str>);

    impl Visitor for KindCounter {
        type Output = ();

        fn visit_text(&mut self, _: &str) {
            self.0.push("text");
        }
        fn visit_comment(&mut self, _: &Comment) {
            self.0.push("comment");
        }
        fn visit_header(&mut self, _: &Header) {
            self.0.push("header");
        }
        fn visit_ignore(&mut self, _: &str) {
            self.0.push("ignore");
        }
        fn visit_link(&mut self, _: &Link) {
            self.0.push("link");
        }
        fn visit_template(&mut self, _: &Template) {
            self.0.push("template");
        }
        fn visit_argument(&mut self, _: &Argument) {
            self.0.push("argument");
        }
        fn visit_parameter(&mut self, _: &Parameter) {
            self.0.push("parameter");
        }
        fn visit_tag(&mut self, _: &Tag) {
            self.0.push("tag");
        }
    }

    #[test]
    fn test_accept_routes_by_kind() {
        let mut counter = KindCounter(Vec::new());
        Node::text("x").accept(&mut counter);
        Node::Parameter(Parameter::anonymous(vec![])).accept(&mut counter);
        Node::Link(Link {
            target: vec![Node::text("Foo")],
            text: None,
        })
        .accept(&mut counter);
        assert_eq!(counter.0, vec!["text", "parameter", "link"]);
    }
}
