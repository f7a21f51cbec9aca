// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![doc(html_logo_url = "https://media.githubusercontent.com/media/microsoft/oxidizer/refs/heads/main/crates/wireup/logo.png")]
#![doc(html_favicon_url = "https://media.githubusercontent.com/media/microsoft/oxidizer/refs/heads/main/crates/wireup/favicon.ico")]

//! # Wireup
//!
//! Runtime-checked dependency injection with ordered execution and
//! reverse-order teardown.
//!
//! Register a set of [`Function`]s — each declaring the values it consumes,
//! the values it produces, and optional post-production [`Hook`]s — and
//! [`Program::run`] figures out a valid execution order from the declared
//! data dependencies, executes the bodies in that order, and propagates each
//! produced value into every consumer bound to it. [`Program::clean`] later
//! tears down whatever actually ran, in reverse order.
//!
//! Where [`fundle`](https://docs.rs/fundle) wires dependencies at compile
//! time, this crate trades static guarantees for runtime flexibility: values
//! are matched by string id with dynamic type checks, so the set of
//! functions can be assembled from independent modules, plugins, or
//! configuration without a central type knowing all of them.
//!
//! ## Quick Start
//!
//! ```
//! use wireup::{Argument, Function, Output, Program, Slot};
//!
//! fn main() -> Result<(), wireup::Error> {
//!     let mut program = Program::new();
//!
//!     // Registration order does not matter; the program is reordered from
//!     // the declared data dependencies.
//!     let x_in = Slot::new();
//!     let y_in = Slot::new();
//!     program.register(Function {
//!         tag: "sum".into(),
//!         arguments: vec![Argument::new("x", &x_in), Argument::new("y", &y_in)],
//!         body: Some(Box::new({
//!             let (x_in, y_in) = (x_in.clone(), y_in.clone());
//!             move |_: &mut ()| {
//!                 let sum = x_in.take().unwrap_or(0) + y_in.take().unwrap_or(0);
//!                 assert_eq!(sum, 300);
//!                 Ok(())
//!             }
//!         })),
//!         ..Function::default()
//!     })?;
//!
//!     let x_out = Slot::new();
//!     program.register(Function {
//!         tag: "provide-x".into(),
//!         outputs: vec![Output::new("x", &x_out)],
//!         body: Some(Box::new({
//!             let x_out = x_out.clone();
//!             move |_: &mut ()| {
//!                 x_out.set(100);
//!                 Ok(())
//!             }
//!         })),
//!         ..Function::default()
//!     })?;
//!
//!     let y_out = Slot::new();
//!     program.register(Function {
//!         tag: "provide-y".into(),
//!         outputs: vec![Output::new("y", &y_out)],
//!         body: Some(Box::new({
//!             let y_out = y_out.clone();
//!             move |_: &mut ()| {
//!                 y_out.set(200);
//!                 Ok(())
//!             }
//!         })),
//!         ..Function::default()
//!     })?;
//!
//!     program.run(&mut ())?;
//!     program.clean();
//!     Ok(())
//! }
//! ```
//!
//! ## Key Concepts
//!
//! - **Function**: a unit of work with a diagnostic tag, declared inputs and
//!   outputs, and a body. Declared as a struct literal or via
//!   [`Function::builder`].
//! - **Slot**: a shared value cell. Declarations and bodies hold clones of
//!   the same slot, which is how a body reads the values the engine wired in
//!   and writes the values it promised.
//! - **Binding**: arguments and hooks are matched to outputs by value id.
//!   A consumer cell of the produced type `T` receives a copy; a consumer
//!   cell of type `Slot<T>` receives a handle to the producer's storage
//!   (address semantics), through which it can observe and mutate the value
//!   in place.
//! - **Hook**: an interceptor that sees a value immediately after
//!   production, before any argument does. The hook's owner must provision a
//!   callback during its own body; the engine enforces this, as it does for
//!   promised cleanups.
//! - **Cleanup**: a teardown action a body stores into its
//!   [`CleanupSlot`]; [`Program::clean`] invokes cleanups of successfully
//!   executed functions in reverse execution order.
//!
//! ## Execution Model
//!
//! Everything is single-threaded and synchronous: no internal threads, no
//! locking, no reordering. Bodies and callbacks receive the caller's context
//! (`Program<Cx>` is generic over it) by mutable reference and may observe
//! cancellation through it however they see fit; the engine passes it along
//! untouched. The first failure — resolution error, body error, callback
//! error, or an unprovisioned promise — aborts the run. Whatever executed
//! before the failure can still be torn down with [`Program::clean`].
//!
//! ## Diagnostics
//!
//! Every [`Error`] names the tags and value ids involved; dependency cycles
//! carry the full traversal path that proves them. The engine emits
//! `tracing` events (DEBUG for run/clean, TRACE for per-function steps) and
//! installs no subscriber of its own.

mod builder;
mod error;
mod function;
mod macros;
mod program;
mod resolve;
mod slot;

pub use builder::FunctionBuilder;
pub use error::{BoxError, CyclePath, CycleStep, Error, InvalidFunction, ReferenceKind};
pub use function::{
    Argument, Body, Callback, CallbackSlot, Cleanup, CleanupSlot, Function, Hook, Output,
};
pub use macros::type_name_of;
pub use program::Program;
pub use slot::Slot;
