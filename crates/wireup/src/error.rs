// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::{self, Display, Formatter};

use thiserror::Error;

/// The error type user-supplied bodies and callbacks report failures with.
///
/// The engine never inspects these; they are preserved as the [`source`]
/// chain of [`Error::FunctionFailed`] / [`Error::CallbackFailed`].
///
/// [`source`]: std::error::Error::source
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// An error returned by [`Program`][crate::Program] operations.
///
/// Registration reports only [`InvalidFunction`][Error::InvalidFunction].
/// Everything else is produced by [`run`][crate::Program::run]: resolution
/// errors before any function executes, execution errors as soon as a
/// function misbehaves. User failures keep their original cause reachable
/// through [`source`][std::error::Error::source], so callers can match on
/// error chains rather than message strings.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A function descriptor failed structural validation during
    /// [`register`][crate::Program::register].
    #[error("invalid function: {0}")]
    InvalidFunction(#[from] InvalidFunction),

    /// Two outputs declare the same value id; `tag1` names the later
    /// registrant, `tag2` the function already owning the id.
    #[error("value already exists; tag1={tag1:?} tag2={tag2:?} out_value_id={value_id:?}")]
    ValueAlreadyExists {
        /// Tag of the function whose output collided.
        tag1: String,
        /// Tag of the function that already produces the value.
        tag2: String,
        /// The contested value id.
        value_id: String,
    },

    /// A mandatory argument or a hook references a value id no output
    /// declares.
    #[error("value not found; tag={tag:?} in_value_id={value_id:?}")]
    ValueNotFound {
        /// Tag of the consuming function.
        tag: String,
        /// The unresolved value id.
        value_id: String,
    },

    /// A consumer's cell type matches neither the producer's value type nor
    /// its aliasing `Slot` type.
    #[error(
        "value type mismatch; tag1={tag1:?} tag2={tag2:?} value_id={value_id:?} \
         in_value_type={in_value_type:?} out_value_type={out_value_type:?}"
    )]
    ValueTypeMismatch {
        /// Tag of the consuming function.
        tag1: String,
        /// Tag of the producing function.
        tag2: String,
        /// The value id both sides reference.
        value_id: String,
        /// Type name of the consumer's cell.
        in_value_type: &'static str,
        /// Type name of the producer's cell.
        out_value_type: &'static str,
    },

    /// The dependency graph contains a cycle; `path` traces it.
    #[error("circular dependencies; {path}")]
    CircularDependencies {
        /// The recursion stack at the moment the cycle was detected.
        path: CyclePath,
    },

    /// A function promised a cleanup but its body returned without
    /// provisioning the slot.
    #[error("cleanup not provisioned; tag={tag:?}")]
    CleanupNotProvisioned {
        /// Tag of the offending function.
        tag: String,
    },

    /// A function declared a hook but its body returned without provisioning
    /// the callback slot.
    #[error("callback not provisioned; tag={tag:?} in_value_id={value_id:?}")]
    CallbackNotProvisioned {
        /// Tag of the offending function.
        tag: String,
        /// Value id of the unprovisioned hook.
        value_id: String,
    },

    /// A function body returned an error; the run stops immediately.
    #[error("function failed; tag={tag:?}: {source}")]
    FunctionFailed {
        /// Tag of the failed function.
        tag: String,
        /// The body's own error.
        #[source]
        source: BoxError,
    },

    /// A hook callback returned an error; the run stops immediately.
    #[error("callback failed; tag={tag:?} in_value_id={value_id:?}: {source}")]
    CallbackFailed {
        /// Tag of the function owning the hook.
        tag: String,
        /// Value id the hook intercepts.
        value_id: String,
        /// The callback's own error.
        #[source]
        source: BoxError,
    },
}

/// Structural problems with a [`Function`][crate::Function] descriptor.
///
/// Each consumer/producer kind wraps its violation distinctly so diagnostics
/// name the part of the declaration at fault; all of them surface as
/// [`Error::InvalidFunction`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InvalidFunction {
    /// The tag is empty.
    #[error("empty tag")]
    EmptyTag,

    /// No body was supplied.
    #[error("missing body; tag={tag:?}")]
    MissingBody {
        /// Tag of the function.
        tag: String,
    },

    /// An argument declares an empty value id.
    #[error("invalid argument: empty in-value id; tag={tag:?}")]
    EmptyArgumentValueId {
        /// Tag of the function.
        tag: String,
    },

    /// An output declares an empty value id.
    #[error("invalid output: empty out-value id; tag={tag:?}")]
    EmptyOutputValueId {
        /// Tag of the function.
        tag: String,
    },

    /// A hook declares an empty value id.
    #[error("invalid hook: empty in-value id; tag={tag:?}")]
    EmptyHookValueId {
        /// Tag of the function.
        tag: String,
    },
}

/// The kind of reference an edge in a cycle diagnostic travels through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// The function consumes the value as an argument.
    Argument,
    /// The function intercepts the value with a hook.
    Hook,
}

impl ReferenceKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Argument => "argument",
            Self::Hook => "hook",
        }
    }
}

impl Display for ReferenceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a [`CyclePath`]: a function tag, plus the reference through
/// which the traversal left it. The final entry of a path repeats the tag the
/// cycle closed on and carries no reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleStep {
    tag: String,
    reference: Option<(ReferenceKind, String)>,
}

impl CycleStep {
    /// Creates a step that left `tag` through the given reference.
    #[must_use]
    pub fn new(tag: impl Into<String>, kind: ReferenceKind, value_id: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            reference: Some((kind, value_id.into())),
        }
    }

    /// Creates the terminal step naming the repeated function.
    #[must_use]
    pub fn terminal(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            reference: None,
        }
    }

    /// The function tag.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The outgoing reference, if this is not the terminal step.
    #[must_use]
    pub fn reference(&self) -> Option<(ReferenceKind, &str)> {
        self.reference.as_ref().map(|(kind, id)| (*kind, id.as_str()))
    }
}

impl Display for CycleStep {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{{tag: {:?}", self.tag)?;
        if let Some((kind, value_id)) = &self.reference {
            write!(f, ", {kind}: {value_id:?}")?;
        }
        f.write_str("}")
    }
}

/// An ordered trace proving a dependency cycle, from the root of the
/// traversal down to the function the cycle closed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CyclePath {
    steps: Vec<CycleStep>,
}

impl CyclePath {
    pub(crate) fn new(steps: Vec<CycleStep>) -> Self {
        Self { steps }
    }

    /// The steps of the trace, outermost first.
    #[must_use]
    pub fn steps(&self) -> &[CycleStep] {
        &self.steps
    }
}

impl Display for CyclePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (index, step) in self.steps.iter().enumerate() {
            if index > 0 {
                f.write_str(" => ")?;
            }
            write!(f, "{step}")?;
        }
        Ok(())
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assert_types() {
        static_assertions::assert_impl_all!(Error: Send, Sync);
        static_assertions::assert_impl_all!(InvalidFunction: Send, Sync);
        static_assertions::assert_impl_all!(CyclePath: Send, Sync, Clone);
    }

    #[test]
    fn renders_single_step_cycle() {
        let path = CyclePath::new(vec![
            CycleStep::new("foo", ReferenceKind::Argument, "x"),
            CycleStep::terminal("foo"),
        ]);

        assert_eq!(path.to_string(), "{tag: \"foo\", argument: \"x\"} => {tag: \"foo\"}");
    }

    #[test]
    fn renders_mixed_reference_kinds() {
        let path = CyclePath::new(vec![
            CycleStep::new("foo", ReferenceKind::Hook, "x"),
            CycleStep::new("bar", ReferenceKind::Argument, "x"),
            CycleStep::terminal("foo"),
        ]);

        assert_eq!(
            path.to_string(),
            "{tag: \"foo\", hook: \"x\"} => {tag: \"bar\", argument: \"x\"} => {tag: \"foo\"}"
        );
    }

    #[test]
    fn circular_dependencies_message_embeds_path() {
        let error = Error::CircularDependencies {
            path: CyclePath::new(vec![
                CycleStep::new("a", ReferenceKind::Argument, "v"),
                CycleStep::terminal("a"),
            ]),
        };

        assert_eq!(
            error.to_string(),
            "circular dependencies; {tag: \"a\", argument: \"v\"} => {tag: \"a\"}"
        );
    }

    #[test]
    fn invalid_function_wraps_kinds() {
        let error = Error::from(InvalidFunction::EmptyArgumentValueId { tag: "foo".into() });

        assert_eq!(
            error.to_string(),
            "invalid function: invalid argument: empty in-value id; tag=\"foo\""
        );
        assert!(matches!(error, Error::InvalidFunction(_)));
    }

    #[test]
    fn failure_wrappers_preserve_the_cause() {
        let cause: BoxError = "boom".into();
        let error = Error::FunctionFailed {
            tag: "foo".into(),
            source: cause,
        };

        assert_eq!(error.to_string(), "function failed; tag=\"foo\": boom");
        let source = std::error::Error::source(&error).expect("cause preserved");
        assert_eq!(source.to_string(), "boom");
    }
}
