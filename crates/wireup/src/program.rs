// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::{self, Debug, Formatter};

use tracing::{Level, event};

use crate::error::{Error, InvalidFunction};
use crate::function::{Argument, Body, CallbackSlot, CleanupSlot, Function, Hook, Output};
use crate::resolve;
use crate::slot::{AnySource, AnyTarget};

/// A set of registered [`Function`]s and the engine that runs them.
///
/// The life of a program has three phases:
///
/// 1. **Registration** — [`register`][Self::register] validates each
///    descriptor structurally and records it.
/// 2. **Run** — [`run`][Self::run] binds every argument and hook to the
///    output producing its value id, orders the functions so producers and
///    hook owners run before their dependents, then executes the bodies in
///    that order, fanning produced values out to hooks as they appear. The
///    first failure of any kind aborts the run.
/// 3. **Teardown** — [`clean`][Self::clean] invokes the cleanups provisioned
///    by the functions whose bodies completed, in reverse execution order.
///
/// The type parameter `Cx` is an opaque caller context passed by mutable
/// reference to every body and callback; the engine never reads it.
///
/// # Examples
///
/// ```
/// use wireup::{Argument, Function, Output, Program, Slot};
///
/// fn main() -> Result<(), wireup::Error> {
///     let mut program = Program::new();
///
///     let produced = Slot::new();
///     program.register(Function {
///         tag: "produce".into(),
///         outputs: vec![Output::new("NUMBER", &produced)],
///         body: Some(Box::new({
///             let produced = produced.clone();
///             move |_: &mut ()| {
///                 produced.set(21_i64);
///                 Ok(())
///             }
///         })),
///         ..Function::default()
///     })?;
///
///     let consumed = Slot::new();
///     let doubled = Slot::new();
///     program.register(Function {
///         tag: "consume".into(),
///         arguments: vec![Argument::new("NUMBER", &consumed)],
///         body: Some(Box::new({
///             let consumed = consumed.clone();
///             let doubled = doubled.clone();
///             move |_: &mut ()| {
///                 let number: i64 = consumed.take().unwrap_or_default();
///                 doubled.set(number * 2);
///                 Ok(())
///             }
///         })),
///         ..Function::default()
///     })?;
///
///     program.run(&mut ())?;
///     assert_eq!(doubled.take(), Some(42));
///     program.clean();
///     Ok(())
/// }
/// ```
pub struct Program<Cx = ()> {
    functions: Vec<FunctionDesc<Cx>>,
    order: Vec<usize>,
    executed: usize,
}

impl<Cx> Program<Cx> {
    /// Creates an empty program.
    #[must_use]
    pub fn new() -> Self {
        Self {
            functions: Vec::new(),
            order: Vec::new(),
            executed: 0,
        }
    }

    /// The number of registered functions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Whether no functions are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Validates and records a function.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFunction`] when the tag is empty, the body is
    /// absent, or any argument, output, or hook declares an empty value id.
    pub fn register(&mut self, function: Function<Cx>) -> Result<(), Error> {
        let descriptor = describe(function)?;
        event!(Level::TRACE, tag = %descriptor.tag, "function registered");
        self.functions.push(descriptor);
        Ok(())
    }

    /// Resolves, orders, and executes the registered functions.
    ///
    /// `cx` is forwarded untouched to every body and hook callback, in
    /// execution order; the run is strictly sequential and single-threaded.
    /// Each run starts a fresh session: the executed-function bookkeeping
    /// consulted by [`clean`][Self::clean] is reset first.
    ///
    /// # Errors
    ///
    /// Resolution errors ([`Error::ValueAlreadyExists`],
    /// [`Error::ValueNotFound`], [`Error::ValueTypeMismatch`],
    /// [`Error::CircularDependencies`]) are returned before anything
    /// executes. Once execution starts, the first body failure, callback
    /// failure, or unprovisioned cleanup/callback slot aborts the run; the
    /// functions already executed remain eligible for teardown.
    pub fn run(&mut self, cx: &mut Cx) -> Result<(), Error> {
        self.executed = 0;
        self.order.clear();
        resolve::bind(&mut self.functions)?;
        self.order = resolve::sort(&self.functions)?;
        event!(
            Level::DEBUG,
            function_count = self.functions.len(),
            "running program"
        );
        self.call_functions(cx)
    }

    /// Invokes provisioned cleanups in reverse execution order.
    ///
    /// Only functions whose bodies completed successfully in the preceding
    /// [`run`][Self::run] are torn down; empty cleanup slots are skipped.
    /// Safe to call after a failed run, or not at all. Call it at most once
    /// per run.
    pub fn clean(&mut self) {
        event!(Level::DEBUG, executed = self.executed, "cleaning program");
        for position in (0..self.executed).rev() {
            let descriptor = &self.functions[self.order[position]];
            if let Some(slot) = &descriptor.cleanup {
                if let Some(cleanup) = slot.take() {
                    event!(Level::TRACE, tag = %descriptor.tag, "running cleanup");
                    cleanup();
                }
            }
        }
    }

    fn call_functions(&mut self, cx: &mut Cx) -> Result<(), Error> {
        let order = self.order.clone();
        for index in order {
            self.copy_in(index);
            event!(Level::TRACE, tag = %self.functions[index].tag, "calling function body");
            if let Err(source) = (self.functions[index].body)(cx) {
                return Err(Error::FunctionFailed {
                    tag: self.functions[index].tag.clone(),
                    source,
                });
            }
            self.executed += 1;
            self.check_provisioned(index)?;
            self.fan_out(index, cx)?;
        }
        Ok(())
    }

    /// Fills the bound argument targets of `index` from their producers.
    fn copy_in(&self, index: usize) {
        for argument in &self.functions[index].arguments {
            let Some(binding) = &argument.binding else {
                continue;
            };
            let producer = &self.functions[binding.producer.function];
            let source = &producer.outputs[binding.producer.output].source;
            if binding.by_alias {
                source.share_into(argument.target.as_ref());
            } else {
                source.copy_into(argument.target.as_ref());
            }
        }
    }

    fn check_provisioned(&self, index: usize) -> Result<(), Error> {
        let descriptor = &self.functions[index];
        if let Some(cleanup) = &descriptor.cleanup {
            if !cleanup.is_set() {
                return Err(Error::CleanupNotProvisioned {
                    tag: descriptor.tag.clone(),
                });
            }
        }
        for hook in &descriptor.hooks {
            if !hook.callback.is_set() {
                return Err(Error::CallbackNotProvisioned {
                    tag: descriptor.tag.clone(),
                    value_id: hook.value_id.clone(),
                });
            }
        }
        Ok(())
    }

    /// Delivers the outputs of `index` to their hooks and fires the callbacks.
    fn fan_out(&self, index: usize, cx: &mut Cx) -> Result<(), Error> {
        for output in &self.functions[index].outputs {
            for hook_ref in &output.hooks {
                let owner = &self.functions[hook_ref.function];
                let hook = &owner.hooks[hook_ref.hook];
                let binding = hook.binding.as_ref().expect("recorded hooks are bound");
                if binding.by_alias {
                    output.source.share_into(hook.target.as_ref());
                } else {
                    output.source.copy_into(hook.target.as_ref());
                }
                event!(
                    Level::TRACE,
                    tag = %owner.tag,
                    in_value_id = %hook.value_id,
                    "invoking hook callback"
                );
                let mut callback = hook
                    .callback
                    .take()
                    .expect("provisioning was checked when the owning body returned");
                if let Err(source) = callback(cx) {
                    return Err(Error::CallbackFailed {
                        tag: owner.tag.clone(),
                        value_id: hook.value_id.clone(),
                        source,
                    });
                }
            }
        }
        Ok(())
    }
}

impl<Cx> Default for Program<Cx> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Cx> Debug for Program<Cx> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Program")
            .field("functions", &self.functions)
            .field("order", &self.order)
            .field("executed", &self.executed)
            .finish()
    }
}

fn describe<Cx>(function: Function<Cx>) -> Result<FunctionDesc<Cx>, Error> {
    if function.tag.is_empty() {
        return Err(InvalidFunction::EmptyTag.into());
    }
    let Some(body) = function.body else {
        return Err(InvalidFunction::MissingBody { tag: function.tag }.into());
    };
    if function.arguments.iter().any(|a| a.value_id.is_empty()) {
        return Err(InvalidFunction::EmptyArgumentValueId { tag: function.tag }.into());
    }
    if function.outputs.iter().any(|o| o.value_id.is_empty()) {
        return Err(InvalidFunction::EmptyOutputValueId { tag: function.tag }.into());
    }
    if function.hooks.iter().any(|h| h.value_id.is_empty()) {
        return Err(InvalidFunction::EmptyHookValueId { tag: function.tag }.into());
    }
    Ok(FunctionDesc {
        tag: function.tag,
        arguments: function.arguments.into_iter().map(ArgumentDesc::from).collect(),
        outputs: function.outputs.into_iter().map(OutputDesc::from).collect(),
        hooks: function.hooks.into_iter().map(HookDesc::from).collect(),
        cleanup: function.cleanup,
        body,
    })
}

pub(crate) struct FunctionDesc<Cx> {
    pub tag: String,
    pub arguments: Vec<ArgumentDesc>,
    pub outputs: Vec<OutputDesc>,
    pub hooks: Vec<HookDesc<Cx>>,
    pub cleanup: Option<CleanupSlot>,
    pub body: Body<Cx>,
}

impl<Cx> Debug for FunctionDesc<Cx> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("tag", &self.tag)
            .field("arguments", &self.arguments)
            .field("outputs", &self.outputs)
            .field("hooks", &self.hooks)
            .field("cleanup", &self.cleanup)
            .finish_non_exhaustive()
    }
}

pub(crate) struct ArgumentDesc {
    pub value_id: String,
    pub target: Box<dyn AnyTarget>,
    pub optional: bool,
    pub binding: Option<Binding>,
}

impl From<Argument> for ArgumentDesc {
    fn from(argument: Argument) -> Self {
        Self {
            value_id: argument.value_id,
            target: argument.target,
            optional: argument.optional,
            binding: None,
        }
    }
}

impl Debug for ArgumentDesc {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Argument")
            .field("value_id", &self.value_id)
            .field("optional", &self.optional)
            .field("binding", &self.binding)
            .finish_non_exhaustive()
    }
}

pub(crate) struct OutputDesc {
    pub value_id: String,
    pub source: Box<dyn AnySource>,
    /// Hooks bound to this output, in hook declaration order.
    pub hooks: Vec<HookRef>,
}

impl From<Output> for OutputDesc {
    fn from(output: Output) -> Self {
        Self {
            value_id: output.value_id,
            source: output.source,
            hooks: Vec::new(),
        }
    }
}

impl Debug for OutputDesc {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Output")
            .field("value_id", &self.value_id)
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}

pub(crate) struct HookDesc<Cx> {
    pub value_id: String,
    pub target: Box<dyn AnyTarget>,
    pub callback: CallbackSlot<Cx>,
    pub binding: Option<Binding>,
}

impl<Cx> From<Hook<Cx>> for HookDesc<Cx> {
    fn from(hook: Hook<Cx>) -> Self {
        Self {
            value_id: hook.value_id,
            target: hook.target,
            callback: hook.callback,
            binding: None,
        }
    }
}

impl<Cx> Debug for HookDesc<Cx> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook")
            .field("value_id", &self.value_id)
            .field("callback", &self.callback)
            .field("binding", &self.binding)
            .finish_non_exhaustive()
    }
}

/// A resolved link from a consumer to the output producing its value id.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Binding {
    pub producer: ResultRef,
    /// Address semantics: the consumer receives a handle to the producer's
    /// storage instead of a copy of the value.
    pub by_alias: bool,
}

/// Position of an output: owning function index, output index within it.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ResultRef {
    pub function: usize,
    pub output: usize,
}

/// Position of a hook: owning function index, hook index within it.
#[derive(Debug, Clone, Copy)]
pub(crate) struct HookRef {
    pub function: usize,
    pub hook: usize,
}
