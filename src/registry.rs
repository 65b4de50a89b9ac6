//! Declared statuses for exception types.
//!
//! A declaration says "exceptions of this type answer with this status and,
//! when they have no message of their own, this reason". The registry is
//! filled once at startup and only read afterwards.
//!
//! Lookup walks the type's ancestry, so a declaration on a base type covers
//! every descendant that does not carry a more specific one.
//!
//! ```rust
//! use palisade_http_errors::{HttpStatus, StatusRegistry, ExceptionType, types};
//!
//! const LOCKED: ExceptionType = ExceptionType::extends("PipelineLocked", &types::ILLEGAL_STATE);
//!
//! let registry = StatusRegistry::builder()
//!     .declare(&types::ILLEGAL_STATE, HttpStatus::INTERNAL_SERVER_ERROR, "")
//!     .declare(&LOCKED, HttpStatus::CONFLICT, "Pipeline is locked")
//!     .build();
//!
//! assert_eq!(registry.find(&LOCKED).unwrap().status(), HttpStatus::CONFLICT);
//! ```

use crate::status::HttpStatus;
use crate::types::ExceptionType;
use std::borrow::Cow;
use std::collections::HashMap;

/// Status and fallback reason declared for one exception type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredStatus {
    status: HttpStatus,
    reason: Cow<'static, str>,
}

impl DeclaredStatus {
    /// Declare `status` with fallback `reason`.
    pub fn new(status: HttpStatus, reason: impl Into<Cow<'static, str>>) -> Self {
        Self {
            status,
            reason: reason.into(),
        }
    }

    /// Declared status.
    #[inline]
    pub fn status(&self) -> HttpStatus {
        self.status
    }

    /// Declared reason; may be empty.
    #[inline]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Type name plus parent name; same-named types under different parents
/// stay distinct.
type TypeKey = (&'static str, Option<&'static str>);

fn key_of(ty: &ExceptionType) -> TypeKey {
    (ty.name(), ty.parent().map(ExceptionType::name))
}

/// Read-only mapping from exception type to declared status.
#[derive(Debug, Default, Clone)]
pub struct StatusRegistry {
    declarations: HashMap<TypeKey, DeclaredStatus>,
}

impl StatusRegistry {
    /// Start declaring statuses.
    pub fn builder() -> StatusRegistryBuilder {
        StatusRegistryBuilder::default()
    }

    /// Nearest declaration for `ty` or any of its ancestors.
    pub fn find(&self, ty: &ExceptionType) -> Option<&DeclaredStatus> {
        ty.ancestry()
            .find_map(|t| self.declarations.get(&key_of(t)))
    }

    /// Number of declared types.
    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    /// True when nothing is declared.
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}

/// Startup-time builder for [`StatusRegistry`].
#[derive(Debug, Default)]
pub struct StatusRegistryBuilder {
    declarations: HashMap<TypeKey, DeclaredStatus>,
}

impl StatusRegistryBuilder {
    /// Declare a status for `ty`. A later declaration for the same type
    /// replaces the earlier one.
    pub fn declare(
        mut self,
        ty: &'static ExceptionType,
        status: HttpStatus,
        reason: impl Into<Cow<'static, str>>,
    ) -> Self {
        self.declarations
            .insert(key_of(ty), DeclaredStatus::new(status, reason));
        self
    }

    /// Freeze the declarations.
    pub fn build(self) -> StatusRegistry {
        StatusRegistry {
            declarations: self.declarations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::define_exception_types;
    use crate::types;

    define_exception_types! {
        &types::ILLEGAL_STATE => {
            DISCOVERY_UNCHANGEABLE = "DiscoveryUnchangeable",
            PLAIN_STATE = "PlainState",
        }
    }

    const NESTED: ExceptionType = ExceptionType::extends("Nested", &DISCOVERY_UNCHANGEABLE);

    fn registry() -> StatusRegistry {
        StatusRegistry::builder()
            .declare(&types::ILLEGAL_STATE, HttpStatus::SERVICE_UNAVAILABLE, "Unavailable")
            .declare(&DISCOVERY_UNCHANGEABLE, HttpStatus::CONFLICT, "Conflict")
            .build()
    }

    #[test]
    fn exact_type_declaration() {
        let found = registry().find(&DISCOVERY_UNCHANGEABLE).cloned();
        assert_eq!(found, Some(DeclaredStatus::new(HttpStatus::CONFLICT, "Conflict")));
    }

    #[test]
    fn nearest_ancestor_wins() {
        let registry = registry();
        assert_eq!(registry.find(&NESTED).unwrap().status(), HttpStatus::CONFLICT);
        assert_eq!(
            registry.find(&PLAIN_STATE).unwrap().status(),
            HttpStatus::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn unrelated_type_has_no_declaration() {
        assert!(registry().find(&types::NOT_FOUND).is_none());
        assert!(registry().find(&types::EXCEPTION).is_none());
    }

    #[test]
    fn same_name_under_different_parents_is_distinct() {
        const STATE_TIMEOUT: ExceptionType = ExceptionType::extends("Timeout", &types::ILLEGAL_STATE);
        const UPSTREAM_TIMEOUT: ExceptionType =
            ExceptionType::extends("Timeout", &types::UPSTREAM_FAILURE);

        let registry = StatusRegistry::builder()
            .declare(&STATE_TIMEOUT, HttpStatus::CONFLICT, "Conflict")
            .declare(&UPSTREAM_TIMEOUT, HttpStatus::GATEWAY_TIMEOUT, "Gateway Timeout")
            .build();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.find(&STATE_TIMEOUT).unwrap().status(), HttpStatus::CONFLICT);
        assert_eq!(
            registry.find(&UPSTREAM_TIMEOUT).unwrap().status(),
            HttpStatus::GATEWAY_TIMEOUT
        );
    }

    #[test]
    fn redeclaration_replaces() {
        let registry = StatusRegistry::builder()
            .declare(&PLAIN_STATE, HttpStatus::CONFLICT, "first")
            .declare(&PLAIN_STATE, HttpStatus::GATEWAY_TIMEOUT, "second")
            .build();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.find(&PLAIN_STATE).unwrap().reason(), "second");
    }
}
