//! Exception type identities with explicit parent links.
//!
//! A handler that is registered for a broad family ("illegal state") still
//! has to honour a more specific declaration made for one concrete type in
//! that family. Instead of runtime reflection, each [`ExceptionType`] names
//! its parent, and lookups walk that chain.
//!
//! # Governance
//!
//! Types are `const` values. They are declared once, compared by name and lineage, and
//! passed around by `&'static` reference.
//!
//! # Example
//!
//! ```rust
//! use palisade_http_errors::{define_exception_types, types};
//!
//! define_exception_types! {
//!     &types::ILLEGAL_STATE => {
//!         DISCOVERY_UNCHANGEABLE = "DiscoveryUnchangeable",
//!     }
//! }
//!
//! assert!(DISCOVERY_UNCHANGEABLE.descends_from(&types::RUNTIME));
//! ```

use std::fmt;

/// Identity of an exception type and its place in the hierarchy.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct ExceptionType {
    name: &'static str,
    parent: Option<&'static ExceptionType>,
}

impl ExceptionType {
    /// Declare the root of a hierarchy.
    #[inline]
    pub const fn root(name: &'static str) -> Self {
        Self { name, parent: None }
    }

    /// Declare a type extending `parent`.
    #[inline]
    pub const fn extends(name: &'static str, parent: &'static ExceptionType) -> Self {
        Self {
            name,
            parent: Some(parent),
        }
    }

    /// Type name, unique among its siblings.
    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Direct parent; `None` for a root.
    #[inline]
    pub const fn parent(&self) -> Option<&'static ExceptionType> {
        self.parent
    }

    /// Iterate from this type up to the root, this type first.
    pub fn ancestry(&self) -> Ancestry<'_> {
        Ancestry { next: Some(self) }
    }

    /// True if `other` is this type or one of its ancestors.
    pub fn descends_from(&self, other: &ExceptionType) -> bool {
        self.ancestry().any(|ty| ty == other)
    }
}

impl fmt::Display for ExceptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Iterator over a type and its ancestors.
pub struct Ancestry<'a> {
    next: Option<&'a ExceptionType>,
}

impl<'a> Iterator for Ancestry<'a> {
    type Item = &'a ExceptionType;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.parent;
        Some(current)
    }
}

/// Declare a batch of exception types sharing one parent.
///
/// ```rust
/// # use palisade_http_errors::{define_exception_types, types};
/// define_exception_types! {
///     &types::INVALID_REQUEST => {
///         MISSING_PIPELINE = "MissingPipeline",
///         BAD_TRIGGER = "BadTrigger",
///     }
/// }
/// assert_eq!(BAD_TRIGGER.parent().map(|p| p.name()), Some("InvalidRequest"));
/// ```
#[macro_export]
macro_rules! define_exception_types {
    ($parent:expr => { $( $ident:ident = $name:literal ),+ $(,)? }) => {
        $(
            #[doc = concat!("Exception type `", $name, "`.")]
            pub const $ident: $crate::ExceptionType =
                $crate::ExceptionType::extends($name, $parent);
        )+
    };
}

/// Root of the built-in hierarchy.
pub const EXCEPTION: ExceptionType = ExceptionType::root("Exception");

/// Base of every built-in handling category.
pub const RUNTIME: ExceptionType = ExceptionType::extends("RuntimeException", &EXCEPTION);

define_exception_types! {
    &RUNTIME => {
        ACCESS_DENIED = "AccessDenied",
        NOT_FOUND = "NotFound",
        INVALID_REQUEST = "InvalidRequest",
        USER_INPUT = "UserInput",
        ILLEGAL_ARGUMENT = "IllegalArgument",
        ILLEGAL_STATE = "IllegalState",
        UPSTREAM_FAILURE = "UpstreamFailure",
        UPSTREAM_FAILURE_WRAPPER = "UpstreamFailureWrapper",
    }
}
