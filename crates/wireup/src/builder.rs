// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::{self, Debug, Formatter};

use crate::error::BoxError;
use crate::function::{Argument, CallbackSlot, CleanupSlot, Function, Hook, Output};
use crate::slot::Slot;

/// Fluent construction of a [`Function`] descriptor.
///
/// Pure data entry: the builder performs no validation of its own, so a
/// descriptor it produces is checked the same way a struct-literal one is
/// when it reaches [`Program::register`][crate::Program::register].
///
/// # Examples
///
/// ```
/// use wireup::{Function, Slot};
///
/// let greeting = Slot::new();
/// let function = Function::builder("greet")
///     .output("GREETING", &greeting)
///     .body(move |_: &mut ()| {
///         greeting.set("hello".to_string());
///         Ok(())
///     })
///     .build();
/// assert_eq!(function.tag, "greet");
/// ```
pub struct FunctionBuilder<Cx = ()> {
    function: Function<Cx>,
}

impl<Cx> FunctionBuilder<Cx> {
    /// Starts a builder for a function with the given tag.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            function: Function {
                tag: tag.into(),
                ..Function::default()
            },
        }
    }

    /// Adds a mandatory argument.
    #[must_use]
    pub fn argument<T: 'static>(mut self, value_id: impl Into<String>, target: &Slot<T>) -> Self {
        self.function.arguments.push(Argument::new(value_id, target));
        self
    }

    /// Adds an optional argument.
    #[must_use]
    pub fn optional_argument<T: 'static>(
        mut self,
        value_id: impl Into<String>,
        target: &Slot<T>,
    ) -> Self {
        self.function.arguments.push(Argument::optional(value_id, target));
        self
    }

    /// Adds an output.
    #[must_use]
    pub fn output<T: Clone + 'static>(
        mut self,
        value_id: impl Into<String>,
        source: &Slot<T>,
    ) -> Self {
        self.function.outputs.push(Output::new(value_id, source));
        self
    }

    /// Adds a hook.
    #[must_use]
    pub fn hook<T: 'static>(
        mut self,
        value_id: impl Into<String>,
        target: &Slot<T>,
        callback: &CallbackSlot<Cx>,
    ) -> Self {
        self.function.hooks.push(Hook::new(value_id, target, callback));
        self
    }

    /// Promises a cleanup the body will provision into `slot`.
    #[must_use]
    pub fn cleanup(mut self, slot: &CleanupSlot) -> Self {
        self.function.cleanup = Some(slot.clone());
        self
    }

    /// Supplies the body.
    #[must_use]
    pub fn body(mut self, body: impl FnMut(&mut Cx) -> Result<(), BoxError> + 'static) -> Self {
        self.function.body = Some(Box::new(body));
        self
    }

    /// Finishes the descriptor.
    #[must_use]
    pub fn build(self) -> Function<Cx> {
        self.function
    }
}

impl<Cx> Debug for FunctionBuilder<Cx> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionBuilder")
            .field("function", &self.function)
            .finish()
    }
}
