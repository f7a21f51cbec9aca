// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// Expands to a `&'static str` labeling the call site as
/// `module::path:line`.
///
/// Convenient for function tags when nothing more descriptive is at hand;
/// the engine treats tags as opaque diagnostics.
///
/// # Examples
///
/// ```
/// let tag = wireup::tag!();
/// assert!(tag.contains(':'));
/// ```
#[macro_export]
macro_rules! tag {
    () => {
        concat!(module_path!(), ":", line!())
    };
}

/// Returns the type name of a value, usable as a diagnostic label.
///
/// For closures this yields the compiler-generated `{{closure}}` path of the
/// defining function, which is often exactly the label wanted for a
/// [`Function`][crate::Function] constructed there.
#[must_use]
pub fn type_name_of<T: ?Sized>(_value: &T) -> &'static str {
    std::any::type_name::<T>()
}
