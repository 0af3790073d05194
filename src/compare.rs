//! Equality of markup by its flattened text
//!
//! Two pieces of markup are equal when they flatten to the same text, after
//! an optional normaliser and under the chosen text comparison. `key`
//! produces a value consistent with `equals` for use in hash maps.

use std::fmt;

use crate::eval::{evaluate_nodes, evaluate_text, Context, EvalError, Frame};
use crate::parser::Node;

/// How flattened text is compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextComparison {
    /// Exact string equality
    #[default]
    Ordinal,
    /// Equality after lower-casing both sides
    IgnoreCase,
}

impl TextComparison {
    fn equals(self, a: &str, b: &str) -> bool {
        match self {
            TextComparison::Ordinal => a == b,
            TextComparison::IgnoreCase => a.to_lowercase() == b.to_lowercase(),
        }
    }

    fn fold(self, text: String) -> String {
        match self {
            TextComparison::Ordinal => text,
            TextComparison::IgnoreCase => text.to_lowercase(),
        }
    }
}

/// Markup given either as source text or as parsed nodes
#[derive(Debug, Clone, Copy)]
pub enum Markup<'a> {
    Text(&'a str),
    Nodes(&'a [Node]),
}

impl<'a> From<&'a str> for Markup<'a> {
    fn from(text: &'a str) -> Self {
        Markup::Text(text)
    }
}

impl<'a> From<&'a [Node]> for Markup<'a> {
    fn from(nodes: &'a [Node]) -> Self {
        Markup::Nodes(nodes)
    }
}

impl<'a> From<&'a Vec<Node>> for Markup<'a> {
    fn from(nodes: &'a Vec<Node>) -> Self {
        Markup::Nodes(nodes)
    }
}

type Normalizer = Box<dyn Fn(&str) -> String + Send + Sync>;

/// Compares markup by flattening both sides in the same context
pub struct FlatteningComparer<'c> {
    context: &'c Context<'c>,
    normalizer: Option<Normalizer>,
    comparison: TextComparison,
}

impl<'c> FlatteningComparer<'c> {
    pub fn new(context: &'c Context<'c>) -> Self {
        Self {
            context,
            normalizer: None,
            comparison: TextComparison::default(),
        }
    }

    /// Apply `normalizer` to flattened text before comparing
    pub fn with_normalizer<F>(mut self, normalizer: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.normalizer = Some(Box::new(normalizer));
        self
    }

    pub fn with_comparison(mut self, comparison: TextComparison) -> Self {
        self.comparison = comparison;
        self
    }

    /// Flatten markup and apply the normaliser
    pub fn flatten(&self, markup: Markup<'_>) -> Result<String, EvalError> {
        let evaluation = match markup {
            Markup::Text(text) => evaluate_text(text, self.context)?,
            Markup::Nodes(nodes) => evaluate_nodes(nodes, self.context, &Frame::root())?,
        };
        let text = evaluation.into_text();
        Ok(match &self.normalizer {
            Some(normalize) => normalize(&text),
            None => text,
        })
    }

    /// Whether two values flatten to equal text. Absent values are equal only
    /// to each other.
    pub fn equals(&self, a: Option<Markup<'_>>, b: Option<Markup<'_>>) -> Result<bool, EvalError> {
        match (a, b) {
            (None, None) => Ok(true),
            (None, Some(_)) | (Some(_), None) => Ok(false),
            (Some(a), Some(b)) => {
                let a = self.flatten(a)?;
                let b = self.flatten(b)?;
                Ok(self.comparison.equals(&a, &b))
            }
        }
    }

    /// A key that is equal for any two values `equals` considers equal
    pub fn key(&self, markup: Markup<'_>) -> Result<String, EvalError> {
        let text = self.flatten(markup)?;
        Ok(self.comparison.fold(text))
    }
}

impl fmt::Debug for FlatteningComparer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlatteningComparer")
            .field("normalizer", &self.normalizer.is_some())
            .field("comparison", &self.comparison)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::HandlerRegistry;
    use crate::parser::parse;
    use crate::site::{Site, MAIN_NAMESPACE};

    fn collapse_whitespace(text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_absent_values() {
        let site = Site::default();
        let registry = HandlerRegistry::new();
        let context = Context::new(&site, &registry);
        let comparer = FlatteningComparer::new(&context);
        assert!(comparer.equals(None, None).unwrap());
        assert!(!comparer.equals(Some("".into()), None).unwrap());
        assert!(!comparer.equals(None, Some("".into())).unwrap());
        assert!(comparer.equals(Some("".into()), Some("".into())).unwrap());
    }

    #[test]
    fn test_text_and_nodes_agree() {
        let site = Site::default();
        let registry = HandlerRegistry::with_defaults(&site).unwrap();
        let context = Context::new(&site, &registry)
            .with_title(site.parse_title("Example", MAIN_NAMESPACE));
        let comparer = FlatteningComparer::new(&context);
        let nodes = parse("{{PAGENAME}}").unwrap();
        assert!(comparer
            .equals(Some((&nodes).into()), Some("Example".into()))
            .unwrap());
    }

    #[test]
    fn test_normalizer_and_ignore_case() {
        let site = Site::default();
        let registry = HandlerRegistry::new();
        let context = Context::new(&site, &registry);
        let plain = FlatteningComparer::new(&context);
        assert!(!plain.equals(Some("a  b".into()), Some("A b".into())).unwrap());

        let relaxed = FlatteningComparer::new(&context)
            .with_normalizer(collapse_whitespace)
            .with_comparison(TextComparison::IgnoreCase);
        assert!(relaxed.equals(Some("a  b".into()), Some("A b".into())).unwrap());
        assert_eq!(
            relaxed.key("a  b".into()).unwrap(),
            relaxed.key("A b".into()).unwrap()
        );
    }
}
