//! Built-in resolvers
//!
//! Positional resolvers read a fixed parameter of the frame, title
//! resolvers read the page title or the first argument, and the case
//! functions transform the first argument. Resolvers return `None` when
//! they have nothing to say, which leaves the invocation as markup.

use crate::site::{Site, MAIN_NAMESPACE};
use crate::title::Title;

use super::frame::Frame;
use super::registry::{HandlerKind, HandlerRegistry, RegistryError};
use super::Context;

/// Signature shared by every built-in resolver
pub type Resolver = fn(&Context<'_>, &Frame<'_>) -> Option<String>;

fn positional<'a>(frame: &'a Frame<'_>, index: usize) -> Option<&'a str> {
    frame.parameters().positional(index)
}

/// Positional parameter `1`, empty when missing
pub fn first_positional(_context: &Context<'_>, frame: &Frame<'_>) -> Option<String> {
    Some(positional(frame, 1).unwrap_or_default().to_string())
}

/// Positional parameter `2`, empty when missing
pub fn second_positional(_context: &Context<'_>, frame: &Frame<'_>) -> Option<String> {
    Some(positional(frame, 2).unwrap_or_default().to_string())
}

/// Positional parameter `2`, else `1`, else empty
pub fn second_or_first_positional(_context: &Context<'_>, frame: &Frame<'_>) -> Option<String> {
    let value = positional(frame, 2).or_else(|| positional(frame, 1));
    Some(value.unwrap_or_default().to_string())
}

/// Resolves to nothing; the invocation disappears from the output
pub fn ignore(_context: &Context<'_>, _frame: &Frame<'_>) -> Option<String> {
    Some(String::new())
}

/// `{{!}}`
pub fn pipe(_context: &Context<'_>, _frame: &Frame<'_>) -> Option<String> {
    Some("|".to_string())
}

/// Apply `component` to the title named by the first argument, or to the
/// current page title when there is none.
fn title_component<F>(context: &Context<'_>, frame: &Frame<'_>, component: F) -> Option<String>
where
    F: FnOnce(&Title) -> String,
{
    match frame.first_argument() {
        Some(argument) if argument.is_empty() => Some(String::new()),
        Some(argument) => Some(component(&Title::parse(
            context.site(),
            argument,
            MAIN_NAMESPACE,
        ))),
        None => context.current_title().map(|title| component(&title)),
    }
}

pub fn full_page_name(context: &Context<'_>, frame: &Frame<'_>) -> Option<String> {
    title_component(context, frame, Title::full_name)
}

pub fn page_name(context: &Context<'_>, frame: &Frame<'_>) -> Option<String> {
    title_component(context, frame, |title| title.page_name().to_string())
}

pub fn namespace(context: &Context<'_>, frame: &Frame<'_>) -> Option<String> {
    title_component(context, frame, |title| title.namespace_name().to_string())
}

pub fn base_page_name(context: &Context<'_>, frame: &Frame<'_>) -> Option<String> {
    title_component(context, frame, |title| title.base_page_name().to_string())
}

pub fn root_page_name(context: &Context<'_>, frame: &Frame<'_>) -> Option<String> {
    title_component(context, frame, |title| title.root_page_name().to_string())
}

pub fn sub_page_name(context: &Context<'_>, frame: &Frame<'_>) -> Option<String> {
    title_component(context, frame, |title| title.sub_page_name().to_string())
}

pub fn talk_page_name(context: &Context<'_>, frame: &Frame<'_>) -> Option<String> {
    let site = context.site();
    title_component(context, frame, |title| {
        title
            .talk_page(site)
            .map(|talk| talk.full_name())
            .unwrap_or_default()
    })
}

fn case_function(frame: &Frame<'_>, convert: fn(&str) -> String) -> Option<String> {
    Some(frame.first_argument().map(convert).unwrap_or_default())
}

fn lower_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn upper_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `{{lc:...}}`
pub fn lc(_context: &Context<'_>, frame: &Frame<'_>) -> Option<String> {
    case_function(frame, str::to_lowercase)
}

/// `{{uc:...}}`
pub fn uc(_context: &Context<'_>, frame: &Frame<'_>) -> Option<String> {
    case_function(frame, str::to_uppercase)
}

/// `{{lcfirst:...}}`
pub fn lc_first(_context: &Context<'_>, frame: &Frame<'_>) -> Option<String> {
    case_function(frame, lower_first)
}

/// `{{ucfirst:...}}`
pub fn uc_first(_context: &Context<'_>, frame: &Frame<'_>) -> Option<String> {
    case_function(frame, upper_first)
}

/// Register the built-in resolvers under their site magic words.
///
/// Title words work both as variables (`{{PAGENAME}}`) and as parser
/// functions (`{{PAGENAME:Other page}}`). Behaviour switches that only
/// affect page metadata resolve to nothing.
pub fn register_defaults(registry: &mut HandlerRegistry, site: &Site) -> Result<(), RegistryError> {
    let title_words: [(&str, Resolver); 7] = [
        ("fullpagename", full_page_name),
        ("pagename", page_name),
        ("namespace", namespace),
        ("basepagename", base_page_name),
        ("rootpagename", root_page_name),
        ("subpagename", sub_page_name),
        ("talkpagename", talk_page_name),
    ];
    for (word, resolver) in title_words {
        registry.register(site, HandlerKind::Variable, word, resolver)?;
        registry.register(site, HandlerKind::ParserFunction, word, resolver)?;
    }

    registry.register(site, HandlerKind::Variable, "!", pipe)?;

    let functions: [(&str, Resolver); 6] = [
        ("lc", lc),
        ("uc", uc),
        ("lcfirst", lc_first),
        ("ucfirst", uc_first),
        ("defaultsort", ignore),
        ("displaytitle", ignore),
    ];
    for (word, resolver) in functions {
        registry.register(site, HandlerKind::ParserFunction, word, resolver)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::Parameters;

    fn with_argument(argument: Option<&str>, f: impl FnOnce(&Frame<'_>)) {
        let root = Frame::root();
        let frame = Frame::new("X", argument.map(str::to_string), Parameters::new(), &root);
        f(&frame);
    }

    #[test]
    fn test_positional_resolvers() {
        let site = Site::default();
        let registry = HandlerRegistry::new();
        let context = Context::new(&site, &registry);
        let root = Frame::root();
        let parameters: Parameters = [("1", "a"), ("2", "b")].into_iter().collect();
        let frame = Frame::new("T", None, parameters, &root);
        assert_eq!(first_positional(&context, &frame).as_deref(), Some("a"));
        assert_eq!(second_positional(&context, &frame).as_deref(), Some("b"));
        assert_eq!(second_or_first_positional(&context, &frame).as_deref(), Some("b"));

        let single: Parameters = [("1", "a")].into_iter().collect();
        let frame = Frame::new("T", None, single, &root);
        assert_eq!(second_positional(&context, &frame).as_deref(), Some(""));
        assert_eq!(second_or_first_positional(&context, &frame).as_deref(), Some("a"));

        let frame = Frame::new("T", None, Parameters::new(), &root);
        assert_eq!(first_positional(&context, &frame).as_deref(), Some(""));
        assert_eq!(ignore(&context, &frame).as_deref(), Some(""));
        assert_eq!(pipe(&context, &frame).as_deref(), Some("|"));
    }

    #[test]
    fn test_title_resolvers_use_page_title() {
        let site = Site::default();
        let registry = HandlerRegistry::new();
        let context = Context::new(&site, &registry)
            .with_title(site.parse_title("Help:Editing/Tables/Advanced", MAIN_NAMESPACE));
        with_argument(None, |frame| {
            assert_eq!(full_page_name(&context, frame).as_deref(), Some("Help:Editing/Tables/Advanced"));
            assert_eq!(page_name(&context, frame).as_deref(), Some("Editing/Tables/Advanced"));
            assert_eq!(namespace(&context, frame).as_deref(), Some("Help"));
            assert_eq!(base_page_name(&context, frame).as_deref(), Some("Editing/Tables"));
            assert_eq!(root_page_name(&context, frame).as_deref(), Some("Editing"));
            assert_eq!(sub_page_name(&context, frame).as_deref(), Some("Advanced"));
            assert_eq!(
                talk_page_name(&context, frame).as_deref(),
                Some("Help talk:Editing/Tables/Advanced")
            );
        });
    }

    #[test]
    fn test_title_resolvers_use_first_argument() {
        let site = Site::default();
        let registry = HandlerRegistry::new();
        let context = Context::new(&site, &registry);
        with_argument(Some("user:example"), |frame| {
            assert_eq!(full_page_name(&context, frame).as_deref(), Some("User:Example"));
            assert_eq!(namespace(&context, frame).as_deref(), Some("User"));
            assert_eq!(talk_page_name(&context, frame).as_deref(), Some("User talk:Example"));
        });
        with_argument(Some(""), |frame| {
            assert_eq!(page_name(&context, frame).as_deref(), Some(""));
        });
    }

    #[test]
    fn test_title_resolvers_without_title_decline() {
        let site = Site::default();
        let registry = HandlerRegistry::new();
        let context = Context::new(&site, &registry);
        with_argument(None, |frame| {
            assert_eq!(page_name(&context, frame), None);
        });
    }

    #[test]
    fn test_case_functions() {
        let site = Site::default();
        let registry = HandlerRegistry::new();
        let context = Context::new(&site, &registry);
        with_argument(Some("Ärger Im Büro"), |frame| {
            assert_eq!(lc(&context, frame).as_deref(), Some("ärger im büro"));
            assert_eq!(uc(&context, frame).as_deref(), Some("ÄRGER IM BÜRO"));
            assert_eq!(lc_first(&context, frame).as_deref(), Some("ärger Im Büro"));
        });
        with_argument(Some("über"), |frame| {
            assert_eq!(uc_first(&context, frame).as_deref(), Some("Über"));
        });
        with_argument(None, |frame| {
            assert_eq!(uc(&context, frame).as_deref(), Some(""));
        });
    }

    #[test]
    fn test_register_defaults() {
        let site = Site::default();
        let registry = HandlerRegistry::with_defaults(&site).expect("defaults");
        for name in ["FULLPAGENAME", "PAGENAME", "NAMESPACE", "TALKPAGENAME", "!"] {
            assert!(registry.variable(name).is_some(), "{name} variable");
        }
        for name in ["PAGENAME", "lc", "UC", "ucfirst", "DEFAULTSORT", "DEFAULTSORTKEY", "DISPLAYTITLE"] {
            assert!(registry.function(name).is_some(), "{name} function");
        }
        assert!(registry.variable("lc").is_none());
        assert!(registry.function("#lc").is_none());
        assert!(registry.function("#PAGENAME").is_none());
    }

    #[test]
    fn test_register_defaults_needs_catalog() {
        let site = Site::from_str(
            r#"
[[namespaces]]
id = 0
name = ""

[[namespaces]]
id = 10
name = "Template"
"#,
        )
        .expect("site");
        let mut registry = HandlerRegistry::new();
        let err = register_defaults(&mut registry, &site).unwrap_err();
        assert!(matches!(err, RegistryError::UnknownMagicWord { word } if word == "fullpagename"));
    }
}
