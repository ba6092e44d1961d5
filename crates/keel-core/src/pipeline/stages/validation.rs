//! Request validation stage.
//!
//! Runs the rule set registered for the request's type before anything
//! downstream. On any violation the chain short-circuits with a validation
//! fault carrying one message per offending field; the terminal handler
//! never sees a structurally invalid request.

use crate::error::{Fault, FieldErrors};
use crate::pipeline::behavior::{Behavior, BoxFuture, Next};
use crate::pipeline::request::Request;
use tokio_util::sync::CancellationToken;

/// One structural rule over a request value.
pub struct Rule<R> {
    field: &'static str,
    message: String,
    check: Box<dyn Fn(&R) -> bool + Send + Sync>,
}

/// Ordered rules registered for one request type.
///
/// Rules run in declaration order; only the first violation per field is
/// kept, later violations for an already-flagged field are discarded.
///
/// # Example
///
/// ```
/// use keel_core::pipeline::RuleSet;
///
/// struct Login {
///     user_name: String,
///     password: String,
/// }
///
/// let rules = RuleSet::new()
///     .rule("user_name", "user_name_should_not_be_empty", |r: &Login| {
///         !r.user_name.is_empty()
///     })
///     .rule("password", "password_should_not_be_empty", |r: &Login| {
///         !r.password.is_empty()
///     });
///
/// let violations = rules.check(&Login {
///     user_name: String::new(),
///     password: "secret".to_string(),
/// });
/// assert_eq!(violations.len(), 1);
/// ```
pub struct RuleSet<R> {
    rules: Vec<Rule<R>>,
}

impl<R> Default for RuleSet<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> RuleSet<R> {
    /// Creates an empty rule set.
    #[must_use]
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Adds a rule; `check` must return `true` for a valid value.
    #[must_use]
    pub fn rule<F>(mut self, field: &'static str, message: impl Into<String>, check: F) -> Self
    where
        F: Fn(&R) -> bool + Send + Sync + 'static,
    {
        self.rules.push(Rule {
            field,
            message: message.into(),
            check: Box::new(check),
        });
        self
    }

    /// Evaluates all rules, folding violations first-per-field.
    #[must_use]
    pub fn check(&self, request: &R) -> FieldErrors {
        let mut errors = FieldErrors::new();
        for rule in &self.rules {
            if !(rule.check)(request) {
                errors.add(rule.field, rule.message.clone());
            }
        }
        errors
    }

    /// Returns the number of registered rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` when no rules are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Stage enforcing a request type's rule set.
pub struct ValidationStage<R> {
    rules: RuleSet<R>,
}

impl<R> ValidationStage<R> {
    /// Wraps a rule set as a pipeline stage.
    #[must_use]
    pub fn new(rules: RuleSet<R>) -> Self {
        Self { rules }
    }
}

impl<R: Request> Behavior<R> for ValidationStage<R> {
    fn name(&self) -> &'static str {
        "validation"
    }

    fn handle<'a>(
        &'a self,
        request: R,
        next: Next<'a, R>,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<R::Response, Fault>> {
        Box::pin(async move {
            let errors = self.rules.check(&request);
            if !errors.is_empty() {
                return Err(Fault::validation(errors));
            }
            next.run(request, cancel).await
        })
    }
}
