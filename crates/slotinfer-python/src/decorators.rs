//! Recognition of the slot decorator.
//!
//! A decorator matches when its expression is a plain or dotted name equal to
//! one of the configured names. Calls such as `@slots()` never match.

use slotinfer_python_cst::{Decorator, FunctionDef};

/// Matches decorators against the configured slot decorator names.
#[derive(Debug, Clone)]
pub struct DecoratorMatcher {
    names: Vec<String>,
}

impl DecoratorMatcher {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        DecoratorMatcher {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn matches(&self, decorator: &Decorator<'_>) -> bool {
        decorator
            .dotted_name()
            .is_some_and(|name| self.names.iter().any(|n| *n == name))
    }

    /// The slot decorators of a function, in source order.
    pub fn slot_decorators<'f, 'a>(&self, function: &'f FunctionDef<'a>) -> Vec<&'f Decorator<'a>> {
        function
            .decorators
            .iter()
            .filter(|d| self.matches(d))
            .collect()
    }
}
