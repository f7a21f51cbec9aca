// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::{self, Debug, Formatter};

use crate::error::BoxError;
use crate::slot::{AnySource, AnyTarget, Slot};

/// The executable logic of a [`Function`].
///
/// Bodies receive the caller-supplied context passed to
/// [`Program::run`][crate::Program::run] and report failures as [`BoxError`].
pub type Body<Cx> = Box<dyn FnMut(&mut Cx) -> Result<(), BoxError>>;

/// A hook callback, invoked right after the hooked value is produced.
pub type Callback<Cx> = Box<dyn FnMut(&mut Cx) -> Result<(), BoxError>>;

/// A teardown action provisioned by a body and invoked by
/// [`Program::clean`][crate::Program::clean].
pub type Cleanup = Box<dyn FnOnce()>;

/// The slot a body must fill with its hook's [`Callback`].
pub type CallbackSlot<Cx> = Slot<Callback<Cx>>;

/// The slot a body must fill with its [`Cleanup`] action.
pub type CleanupSlot = Slot<Cleanup>;

/// A unit of work registered with a [`Program`][crate::Program].
///
/// A function declares the values it consumes ([`Argument`]s), the values it
/// produces ([`Output`]s), the values it intercepts ([`Hook`]s), an optional
/// promise to provision a cleanup, and the body that does the work. The
/// declaration is plain data; nothing executes until
/// [`Program::run`][crate::Program::run].
///
/// # Examples
///
/// ```
/// use wireup::{Function, Output, Slot};
///
/// let port = Slot::new();
/// let function = Function {
///     tag: "listen".into(),
///     outputs: vec![Output::new("PORT", &port)],
///     body: Some(Box::new(move |_: &mut ()| {
///         port.set(8080_u16);
///         Ok(())
///     })),
///     ..Function::default()
/// };
/// assert_eq!(function.tag, "listen");
/// ```
pub struct Function<Cx = ()> {
    /// Diagnostic label; must be non-empty. Uniqueness is conventional, not
    /// enforced.
    pub tag: String,

    /// Values this function consumes.
    pub arguments: Vec<Argument>,

    /// Values this function produces.
    pub outputs: Vec<Output>,

    /// Values this function intercepts.
    pub hooks: Vec<Hook<Cx>>,

    /// When present, the body must fill this slot before returning; the
    /// engine rejects the run otherwise.
    pub cleanup: Option<CleanupSlot>,

    /// The work itself; registration fails when absent.
    pub body: Option<Body<Cx>>,
}

impl<Cx> Function<Cx> {
    /// Starts a [`FunctionBuilder`][crate::FunctionBuilder] for the given tag.
    #[must_use]
    pub fn builder(tag: impl Into<String>) -> crate::FunctionBuilder<Cx> {
        crate::FunctionBuilder::new(tag)
    }
}

impl<Cx> Default for Function<Cx> {
    fn default() -> Self {
        Self {
            tag: String::new(),
            arguments: Vec::new(),
            outputs: Vec::new(),
            hooks: Vec::new(),
            cleanup: None,
            body: None,
        }
    }
}

impl<Cx> Debug for Function<Cx> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("tag", &self.tag)
            .field("arguments", &self.arguments)
            .field("outputs", &self.outputs)
            .field("hooks", &self.hooks)
            .field("cleanup", &self.cleanup)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

/// A value a [`Function`] consumes.
///
/// Before the owning body runs, the engine fills `target` from the producing
/// output: by value when the target's type equals the produced type, by
/// address when the target is a `Slot<Slot<T>>` against a producer of `T`.
pub struct Argument {
    pub(crate) value_id: String,
    pub(crate) target: Box<dyn AnyTarget>,
    pub(crate) optional: bool,
}

impl Argument {
    /// Declares a mandatory argument filling `target`.
    #[must_use]
    pub fn new<T: 'static>(value_id: impl Into<String>, target: &Slot<T>) -> Self {
        Self {
            value_id: value_id.into(),
            target: target.erased_target(),
            optional: false,
        }
    }

    /// Declares an optional argument; when no output resolves the id, the
    /// target is simply never written.
    #[must_use]
    pub fn optional<T: 'static>(value_id: impl Into<String>, target: &Slot<T>) -> Self {
        Self {
            value_id: value_id.into(),
            target: target.erased_target(),
            optional: true,
        }
    }

    /// The referenced value id.
    #[must_use]
    pub fn value_id(&self) -> &str {
        &self.value_id
    }

    /// Whether an unresolved id is tolerated.
    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.optional
    }
}

impl Debug for Argument {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Argument")
            .field("value_id", &self.value_id)
            .field("optional", &self.optional)
            .finish_non_exhaustive()
    }
}

/// A value a [`Function`] produces.
///
/// The owning body writes the value through the same [`Slot`] handle captured
/// at declaration. Value ids are global: at most one output per id across the
/// whole program.
pub struct Output {
    pub(crate) value_id: String,
    pub(crate) source: Box<dyn AnySource>,
}

impl Output {
    /// Declares an output backed by `source`.
    ///
    /// `T: Clone` because consumers bound by value receive a clone of the
    /// produced contents.
    #[must_use]
    pub fn new<T: Clone + 'static>(value_id: impl Into<String>, source: &Slot<T>) -> Self {
        Self {
            value_id: value_id.into(),
            source: source.erased_source(),
        }
    }

    /// The declared value id.
    #[must_use]
    pub fn value_id(&self) -> &str {
        &self.value_id
    }
}

impl Debug for Output {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Output")
            .field("value_id", &self.value_id)
            .finish_non_exhaustive()
    }
}

/// An interceptor for a value produced elsewhere.
///
/// Immediately after the referenced output's value becomes available — and
/// before any argument bound to it observes it — the engine fills `target`
/// and invokes the callback the owning body stored in `callback`. Hooks are
/// never optional: the referenced value must exist, and the callback must be
/// provisioned by the time the owning body returns.
pub struct Hook<Cx = ()> {
    pub(crate) value_id: String,
    pub(crate) target: Box<dyn AnyTarget>,
    pub(crate) callback: CallbackSlot<Cx>,
}

impl<Cx> Hook<Cx> {
    /// Declares a hook on `value_id`, filling `target` and firing the
    /// callback stored in `callback`.
    #[must_use]
    pub fn new<T: 'static>(
        value_id: impl Into<String>,
        target: &Slot<T>,
        callback: &CallbackSlot<Cx>,
    ) -> Self {
        Self {
            value_id: value_id.into(),
            target: target.erased_target(),
            callback: callback.clone(),
        }
    }

    /// The referenced value id.
    #[must_use]
    pub fn value_id(&self) -> &str {
        &self.value_id
    }
}

impl<Cx> Debug for Hook<Cx> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook")
            .field("value_id", &self.value_id)
            .field("callback", &self.callback)
            .finish_non_exhaustive()
    }
}
