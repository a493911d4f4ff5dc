//! Minimal CSS-style selectors.
//!
//! Only what the block contracts need: compound steps of an optional tag name
//! plus any number of `.class` conditions, joined by the descendant combinator
//! (`".highlight-mermaid pre"`). Anything else is rejected at parse time so a
//! malformed selector fails when it is configured, not mid-pass.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Error raised when a selector string cannot be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectorError {
    #[error("selector is empty")]
    Empty,
    #[error("unsupported selector step `{0}`")]
    UnsupportedStep(String),
}

/// A single compound step: optional tag name plus required classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    tag: Option<String>,
    classes: Vec<String>,
}

impl Step {
    /// Tag name this step requires, if any.
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Classes this step requires.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Test a node described by its tag name and class list against this step.
    pub fn matches<S: AsRef<str>>(&self, tag: &str, classes: &[S]) -> bool {
        if let Some(required) = &self.tag
            && !required.eq_ignore_ascii_case(tag)
        {
            return false;
        }
        self.classes
            .iter()
            .all(|required| classes.iter().any(|c| c.as_ref() == required))
    }

    fn parse(raw: &str) -> Result<Self, SelectorError> {
        if raw.contains(['>', '+', '~', '[', ':', '*', '#']) {
            return Err(SelectorError::UnsupportedStep(raw.to_string()));
        }

        let mut tag = None;
        let mut classes = Vec::new();
        for (idx, part) in raw.split('.').enumerate() {
            if idx == 0 {
                if !part.is_empty() {
                    tag = Some(part.to_ascii_lowercase());
                }
            } else if part.is_empty() {
                return Err(SelectorError::UnsupportedStep(raw.to_string()));
            } else {
                classes.push(part.to_string());
            }
        }

        if tag.is_none() && classes.is_empty() {
            return Err(SelectorError::UnsupportedStep(raw.to_string()));
        }
        Ok(Self { tag, classes })
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(tag) = &self.tag {
            write!(f, "{tag}")?;
        }
        for class in &self.classes {
            write!(f, ".{class}")?;
        }
        Ok(())
    }
}

/// A parsed selector: one target step, possibly scoped under ancestor steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    /// Steps in source order; the last one is the target.
    steps: Vec<Step>,
}

impl Selector {
    /// Parse a selector string.
    ///
    /// # Errors
    ///
    /// Returns an error if the selector is empty or uses anything beyond
    /// `tag`/`.class` compounds and the descendant combinator.
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let mut steps = Vec::new();
        for raw in input.split_whitespace() {
            steps.push(Step::parse(raw)?);
        }
        if steps.is_empty() {
            return Err(SelectorError::Empty);
        }
        Ok(Self { steps })
    }

    /// Build a selector matching a single class.
    ///
    /// # Errors
    ///
    /// Returns an error if `class` is not a plain class token.
    pub fn for_class(class: &str) -> Result<Self, SelectorError> {
        if class.is_empty() || class.chars().any(char::is_whitespace) {
            return Err(SelectorError::UnsupportedStep(class.to_string()));
        }
        Self::parse(&format!(".{class}"))
    }

    /// The step the matched node itself must satisfy.
    pub fn target(&self) -> &Step {
        self.steps.last().expect("selector has at least one step")
    }

    /// Ancestor steps scoping the target, outermost first.
    pub fn ancestors(&self) -> &[Step] {
        &self.steps[..self.steps.len() - 1]
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, step) in self.steps.iter().enumerate() {
            if idx > 0 {
                write!(f, " ")?;
            }
            write!(f, "{step}")?;
        }
        Ok(())
    }
}
