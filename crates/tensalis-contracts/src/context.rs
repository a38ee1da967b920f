//! Ground-truth context passed alongside every verification request.

use serde::{Deserialize, Deserializer, Serialize};

/// An ordered sequence of source passages the response is checked against.
///
/// A single passage and a list of passages normalize to the same shape, so
/// `Context::from("a")` and `Context::from(vec!["a"])` produce identical
/// wire payloads. A `Context` is never mutated after construction.
///
/// Deserializes from either a JSON string or an array of strings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct Context(Vec<String>);

impl Context {
    /// Build a context from any sequence of passages.
    pub fn new<I, S>(passages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(passages.into_iter().map(Into::into).collect())
    }

    /// The passages in their original order.
    pub fn passages(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no passage carries any non-whitespace text.
    ///
    /// Verifying against such a context is meaningless, so the verifier
    /// rejects it before sending anything.
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|p| p.trim().is_empty())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ContextRepr {
    One(String),
    Many(Vec<String>),
}

impl<'de> Deserialize<'de> for Context {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match ContextRepr::deserialize(deserializer)? {
            ContextRepr::One(passage) => Self::from(passage),
            ContextRepr::Many(passages) => Self::from(passages),
        })
    }
}

impl From<&str> for Context {
    fn from(passage: &str) -> Self {
        Self(vec![passage.to_string()])
    }
}

impl From<String> for Context {
    fn from(passage: String) -> Self {
        Self(vec![passage])
    }
}

impl From<&String> for Context {
    fn from(passage: &String) -> Self {
        Self(vec![passage.clone()])
    }
}

impl From<Vec<String>> for Context {
    fn from(passages: Vec<String>) -> Self {
        Self(passages)
    }
}

impl From<Vec<&str>> for Context {
    fn from(passages: Vec<&str>) -> Self {
        Self::new(passages)
    }
}

impl From<&[&str]> for Context {
    fn from(passages: &[&str]) -> Self {
        Self::new(passages.iter().copied())
    }
}

impl From<&[String]> for Context {
    fn from(passages: &[String]) -> Self {
        Self(passages.to_vec())
    }
}

impl<const N: usize> From<[&str; N]> for Context {
    fn from(passages: [&str; N]) -> Self {
        Self::new(passages)
    }
}

impl From<&Context> for Context {
    fn from(context: &Context) -> Self {
        context.clone()
    }
}
