// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::any::{Any, TypeId, type_name};
use std::cell::RefCell;
use std::fmt::{self, Debug, Formatter};
use std::rc::Rc;

/// A shared, initially empty value cell.
///
/// A `Slot` is how values move between functions in a [`Program`][crate::Program]:
/// a function declares an [`Output`][crate::Output] backed by a slot it writes
/// during its body, and other functions declare [`Argument`][crate::Argument]s
/// or [`Hook`][crate::Hook]s backed by slots the engine fills before their code
/// observes them. Callback and cleanup slots work the same way, holding actions
/// instead of data.
///
/// Cloning a `Slot` is cheap and produces a handle to the *same* storage, so a
/// closure can capture one clone while the function declaration keeps another.
/// Slots are single-threaded by design, matching the engine's strictly
/// sequential execution model.
///
/// # Examples
///
/// ```
/// use wireup::Slot;
///
/// let slot = Slot::new();
/// let handle = slot.clone();
///
/// slot.set(42);
/// assert_eq!(handle.get(), Some(42));
/// ```
pub struct Slot<T>(Rc<RefCell<Option<T>>>);

impl<T> Slot<T> {
    /// Creates an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(None)))
    }

    /// Stores a value, replacing any previous contents.
    pub fn set(&self, value: T) {
        *self.0.borrow_mut() = Some(value);
    }

    /// Removes and returns the contents, leaving the slot empty.
    pub fn take(&self) -> Option<T> {
        self.0.borrow_mut().take()
    }

    /// Returns whether the slot currently holds a value.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.0.borrow().is_some()
    }

    /// Returns a clone of the contents, if any.
    #[must_use]
    pub fn get(&self) -> Option<T>
    where
        T: Clone,
    {
        self.0.borrow().clone()
    }

    /// Runs `op` against a shared borrow of the contents, if any.
    ///
    /// # Panics
    ///
    /// Panics if `op` accesses the same slot mutably.
    pub fn with<R>(&self, op: impl FnOnce(&T) -> R) -> Option<R> {
        self.0.borrow().as_ref().map(op)
    }

    /// Runs `op` against a mutable borrow of the contents, if any.
    ///
    /// # Panics
    ///
    /// Panics if `op` accesses the same slot.
    pub fn with_mut<R>(&self, op: impl FnOnce(&mut T) -> R) -> Option<R> {
        self.0.borrow_mut().as_mut().map(op)
    }

    fn cell(&self) -> &RefCell<Option<T>> {
        &self.0
    }
}

impl<T: 'static> Slot<T> {
    pub(crate) fn erased_target(&self) -> Box<dyn AnyTarget> {
        Box::new(TargetCell(self.clone()))
    }
}

impl<T: Clone + 'static> Slot<T> {
    pub(crate) fn erased_source(&self) -> Box<dyn AnySource> {
        Box::new(SourceCell(self.clone()))
    }
}

impl<T> Clone for Slot<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Debug for Slot<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let state = match self.0.try_borrow() {
            Ok(contents) if contents.is_some() => "set",
            Ok(_) => "empty",
            Err(_) => "borrowed",
        };
        f.debug_tuple("Slot").field(&state).finish()
    }
}

/// Runtime descriptor of a cell's value type, used for binding checks.
#[derive(Clone, Copy)]
pub(crate) struct TypeInfo {
    pub id: TypeId,
    pub name: &'static str,
}

impl TypeInfo {
    pub(crate) fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }
}

/// Type-erased view of a consumer cell (argument or hook target).
pub(crate) trait AnyTarget {
    fn value_type(&self) -> TypeInfo;

    fn storage(&self) -> &dyn Any;
}

/// Type-erased view of a producer cell (output source).
///
/// The concrete value type is only known here, so the write operations live on
/// the source side: a source can clone its contents into a target of the same
/// type, or store a handle to its own storage into a target declared as
/// `Slot<Slot<T>>` (address semantics).
pub(crate) trait AnySource {
    fn value_type(&self) -> TypeInfo;

    /// The `TypeId` a target must have to receive this source by address.
    fn alias_type(&self) -> TypeId;

    fn copy_into(&self, target: &dyn AnyTarget);

    fn share_into(&self, target: &dyn AnyTarget);
}

struct TargetCell<T>(Slot<T>);

impl<T: 'static> AnyTarget for TargetCell<T> {
    fn value_type(&self) -> TypeInfo {
        TypeInfo::of::<T>()
    }

    fn storage(&self) -> &dyn Any {
        self.0.cell()
    }
}

struct SourceCell<T>(Slot<T>);

impl<T: Clone + 'static> AnySource for SourceCell<T> {
    fn value_type(&self) -> TypeInfo {
        TypeInfo::of::<T>()
    }

    fn alias_type(&self) -> TypeId {
        TypeId::of::<Slot<T>>()
    }

    fn copy_into(&self, target: &dyn AnyTarget) {
        let cell = target
            .storage()
            .downcast_ref::<RefCell<Option<T>>>()
            .expect("copy binding checked the value types");
        let contents = self.0.cell().borrow().clone();
        *cell.borrow_mut() = contents;
    }

    fn share_into(&self, target: &dyn AnyTarget) {
        let cell = target
            .storage()
            .downcast_ref::<RefCell<Option<Slot<T>>>>()
            .expect("alias binding checked the cell type");
        *cell.borrow_mut() = Some(self.0.clone());
    }
}
