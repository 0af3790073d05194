//! Call frames: the bound parameters of one template invocation

use crate::parser::ast::{Node, Template};

use super::EvalError;

/// Template parameters in source order
///
/// Anonymous parameters are keyed `"1"`, `"2"`, ... in the order they appear.
/// A later binding of an existing key replaces the value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameters(Vec<(String, String)>);

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Positional parameter, counting from 1
    pub fn positional(&self, index: usize) -> Option<&str> {
        self.get(&index.to_string())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Parameters {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut parameters = Parameters::new();
        for (key, value) in iter {
            parameters.insert(key, value);
        }
        parameters
    }
}

/// The context of one template or magic word invocation
///
/// Frames are immutable once built and link to the frame of their caller.
#[derive(Debug)]
pub struct Frame<'p> {
    name: String,
    first_argument: Option<String>,
    parameters: Parameters,
    parent: Option<&'p Frame<'p>>,
    depth: usize,
}

impl Frame<'static> {
    /// The frame a page is evaluated in
    pub fn root() -> Self {
        Frame {
            name: String::new(),
            first_argument: None,
            parameters: Parameters::new(),
            parent: None,
            depth: 0,
        }
    }
}

/// Split `name:argument` on the first colon
fn split_invocation(text: &str) -> (String, Option<String>) {
    match text.split_once(':') {
        Some((name, argument)) => (name.trim().to_string(), Some(argument.trim().to_string())),
        None => (text.trim().to_string(), None),
    }
}

impl<'p> Frame<'p> {
    /// A frame called from `parent`
    pub fn new(
        name: impl Into<String>,
        first_argument: Option<String>,
        parameters: Parameters,
        parent: &'p Frame<'p>,
    ) -> Self {
        Frame {
            name: name.into(),
            first_argument,
            parameters,
            parent: Some(parent),
            depth: parent.depth + 1,
        }
    }

    /// Build the frame for a template node.
    ///
    /// `evaluate` flattens node sequences in the caller's frame; it is used for
    /// the invocation name, parameter names and parameter values. Named
    /// parameters are trimmed, positional ones are kept as written.
    pub fn from_template<F>(
        template: &Template,
        parent: &'p Frame<'p>,
        mut evaluate: F,
    ) -> Result<Self, EvalError>
    where
        F: FnMut(&[Node]) -> Result<String, EvalError>,
    {
        let invocation = evaluate(&template.name)?;
        let (name, first_argument) = split_invocation(&invocation);

        let mut parameters = Parameters::new();
        let mut position = 0;
        for parameter in &template.parameters {
            match &parameter.name {
                Some(key) => {
                    let key = evaluate(key)?;
                    let value = evaluate(&parameter.value)?;
                    parameters.insert(key.trim(), value.trim());
                }
                None => {
                    position += 1;
                    let value = evaluate(&parameter.value)?;
                    parameters.insert(position.to_string(), value);
                }
            }
        }

        Ok(Self::new(name, first_argument, parameters, parent))
    }

    /// Invocation text before the first colon
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Text between the first colon and the first pipe, for parser functions
    pub fn first_argument(&self) -> Option<&str> {
        self.first_argument.as_deref()
    }

    /// The full invocation text, `name` or `name:first_argument`
    pub fn invocation(&self) -> String {
        match &self.first_argument {
            Some(argument) => format!("{}:{}", self.name, argument),
            None => self.name.clone(),
        }
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn parent(&self) -> Option<&'p Frame<'p>> {
        self.parent
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// No first argument and no parameters: `{{NAME}}`
    pub fn may_be_variable(&self) -> bool {
        self.first_argument.is_none() && self.parameters.is_empty()
    }

    /// Enclosing frames, innermost first
    pub fn ancestors(&self) -> impl Iterator<Item = &'p Frame<'p>> {
        std::iter::successors(self.parent, |frame| frame.parent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::{Parameter, Template};

    fn text(s: &str) -> Vec<Node> {
        vec![Node::text(s)]
    }

    fn flatten(nodes: &[Node]) -> Result<String, EvalError> {
        Ok(crate::parser::to_source(nodes))
    }

    #[test]
    fn test_root_frame() {
        let root = Frame::root();
        assert_eq!(root.depth(), 0);
        assert_eq!(root.name(), "");
        assert!(root.first_argument().is_none());
        assert!(root.parameters().is_empty());
        assert!(root.parent().is_none());
    }

    #[test]
    fn test_anonymous_numbering_ignores_named() {
        let template = Template {
            name: text("T"),
            parameters: vec![
                Parameter::anonymous(text("a")),
                Parameter::named(text("name"), text("b")),
                Parameter::anonymous(text("c")),
            ],
        };
        let root = Frame::root();
        let frame = Frame::from_template(&template, &root, flatten).expect("frame");
        let bound: Vec<_> = frame.parameters().iter().collect();
        assert_eq!(bound, vec![("1", "a"), ("name", "b"), ("2", "c")]);
        assert_eq!(frame.depth(), 1);
        assert!(!frame.may_be_variable());
    }

    #[test]
    fn test_named_values_are_trimmed() {
        let template = Template {
            name: text(" T "),
            parameters: vec![
                Parameter::named(text(" key "), text(" value\n")),
                Parameter::anonymous(text(" kept ")),
            ],
        };
        let root = Frame::root();
        let frame = Frame::from_template(&template, &root, flatten).expect("frame");
        assert_eq!(frame.name(), "T");
        assert_eq!(frame.parameters().get("key"), Some("value"));
        assert_eq!(frame.parameters().positional(1), Some(" kept "));
    }

    #[test]
    fn test_split_on_first_colon() {
        let template = Template {
            name: text("#if: a:b "),
            parameters: vec![],
        };
        let root = Frame::root();
        let frame = Frame::from_template(&template, &root, flatten).expect("frame");
        assert_eq!(frame.name(), "#if");
        assert_eq!(frame.first_argument(), Some("a:b"));
        assert_eq!(frame.invocation(), "#if:a:b");
        assert!(!frame.may_be_variable());
    }

    #[test]
    fn test_later_binding_replaces_value() {
        let parameters: Parameters = [("1", "a"), ("x", "b"), ("1", "c")].into_iter().collect();
        assert_eq!(parameters.len(), 2);
        assert_eq!(parameters.positional(1), Some("c"));
    }

    #[test]
    fn test_ancestors() {
        let root = Frame::root();
        let child = Frame::new("a", None, Parameters::new(), &root);
        let grandchild = Frame::new("b", None, Parameters::new(), &child);
        assert_eq!(grandchild.depth(), 2);
        let names: Vec<_> = grandchild.ancestors().map(|f| f.name()).collect();
        assert_eq!(names, vec!["a", ""]);
    }

    #[test]
    fn test_evaluation_error_propagates() {
        let template = Template {
            name: text("T"),
            parameters: vec![Parameter::anonymous(text("a"))],
        };
        let root = Frame::root();
        let result = Frame::from_template(&template, &root, |_| Err(EvalError::ParameterVisited));
        assert!(matches!(result, Err(EvalError::ParameterVisited)));
    }
}
