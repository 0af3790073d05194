//! Tree-walking evaluator that flattens markup to text

use tracing::debug;

use crate::parser::ast::{Argument, Comment, Header, Link, Node, Parameter, Tag, Template, Visitor};

use super::frame::Frame;
use super::registry::UnhandledWords;
use super::{Context, EvalError, Evaluation};

/// Walks a node sequence within one frame, accumulating output text and
/// the names of invocations nobody handled.
///
/// `evaluate` consumes the evaluator; nested sequences get their own
/// evaluator and their unhandled names are merged back.
pub struct Evaluator<'c, 'f> {
    context: &'c Context<'c>,
    frame: &'f Frame<'f>,
    output: String,
    unhandled: UnhandledWords,
}

impl<'c, 'f> Evaluator<'c, 'f> {
    pub fn new(context: &'c Context<'c>, frame: &'f Frame<'f>) -> Self {
        Self {
            context,
            frame,
            output: String::new(),
            unhandled: UnhandledWords::new(),
        }
    }

    pub fn evaluate(mut self, nodes: &[Node]) -> Result<Evaluation, EvalError> {
        for node in nodes {
            node.accept(&mut self)?;
        }
        Ok(Evaluation::new(self.output, self.unhandled))
    }

    fn evaluate_in(&mut self, nodes: &[Node], frame: &Frame<'_>) -> Result<String, EvalError> {
        let (text, unhandled) = Evaluator::new(self.context, frame)
            .evaluate(nodes)?
            .into_parts();
        self.unhandled.extend(unhandled);
        Ok(text)
    }

    /// Evaluate a nested sequence in the current frame
    fn evaluate_nested(&mut self, nodes: &[Node]) -> Result<String, EvalError> {
        let frame = self.frame;
        self.evaluate_in(nodes, frame)
    }
}

impl Visitor for Evaluator<'_, '_> {
    type Output = Result<(), EvalError>;

    fn visit_text(&mut self, text: &str) -> Self::Output {
        self.output.push_str(text);
        Ok(())
    }

    fn visit_comment(&mut self, _comment: &Comment) -> Self::Output {
        Ok(())
    }

    fn visit_header(&mut self, header: &Header) -> Self::Output {
        let marks = "=".repeat(header.level);
        let title = self.evaluate_nested(&header.title)?;
        let trailing = self.evaluate_nested(&header.trailing)?;
        self.output.push_str(&marks);
        self.output.push_str(&title);
        self.output.push_str(&marks);
        self.output.push_str(&trailing);
        Ok(())
    }

    fn visit_ignore(&mut self, _marker: &str) -> Self::Output {
        Ok(())
    }

    fn visit_link(&mut self, link: &Link) -> Self::Output {
        if let Some(text) = &link.text {
            let caption = self.evaluate_nested(text)?;
            self.output.push_str(&caption);
        }
        Ok(())
    }

    fn visit_template(&mut self, template: &Template) -> Self::Output {
        let context = self.context;
        let parent = self.frame;
        let frame = Frame::from_template(template, parent, |nodes| self.evaluate_nested(nodes))?;

        let resolved = context
            .registry()
            .dispatch(context.site(), &frame, &mut self.unhandled)
            .and_then(|handler| handler(context, &frame));

        match resolved {
            Some(text) => self.output.push_str(&text),
            None => {
                debug!(
                    name = frame.name(),
                    depth = frame.depth(),
                    "emitting unresolved template as markup"
                );
                self.output.push_str(&template.to_string());
            }
        }
        Ok(())
    }

    fn visit_argument(&mut self, argument: &Argument) -> Self::Output {
        let frame = self.frame;
        let name = self.evaluate_nested(&argument.name)?;
        if let Some(value) = frame.parameters().get(name.trim()) {
            self.output.push_str(value);
        } else if let Some(default) = &argument.default {
            let value = self.evaluate_nested(default)?;
            self.output.push_str(&value);
        }
        Ok(())
    }

    fn visit_parameter(&mut self, _parameter: &Parameter) -> Self::Output {
        Err(EvalError::ParameterVisited)
    }

    fn visit_tag(&mut self, tag: &Tag) -> Self::Output {
        self.output.push_str(tag.inner_text());
        Ok(())
    }
}
