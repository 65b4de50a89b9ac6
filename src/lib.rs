//! # Palisade HTTP Errors
//!
//! Security-conscious translation of request-handling failures into HTTP
//! error responses.
//!
//! ## Design Philosophy
//!
//! 1. **Every failure gets a response**: classification is exhaustive, with
//!    a 500 catch-all
//! 2. **Authorization failures reveal nothing**: the caller sees a fixed phrase
//! 3. **Internal logs keep full context**: message, attributes and cause chain
//! 4. **Diagnostics are recorded before the response leaves**
//! 5. **Sensitive text is zeroized** when the exception record drops
//!
//! ## Request Flow
//!
//! An external dispatcher catches a failure, wraps it in an
//! [`ExceptionRecord`] and calls [`ExceptionHandlers::handle`] with the
//! request's [`DiagnosticScope`] and [`ResponseChannel`]:
//!
//! - [`Classifier`] picks the status, message and log level
//! - [`extract_context`] pulls `url`/`body` out of upstream failures
//! - [`scope::record`] stores the record for the later rendering stage
//! - [`response::emit`] writes the status line and plain-text body
//!
//! ## Quick Start
//!
//! ```rust
//! use palisade_http_errors::{
//!     define_exception_types, types, ExceptionHandlers, ExceptionRecord, HttpStatus,
//!     RequestScope, StatusRegistry, WireResponse,
//! };
//!
//! define_exception_types! {
//!     &types::ILLEGAL_STATE => {
//!         PIPELINE_LOCKED = "PipelineLocked",
//!     }
//! }
//!
//! let handlers = ExceptionHandlers::builder()
//!     .registry(
//!         StatusRegistry::builder()
//!             .declare(&PIPELINE_LOCKED, HttpStatus::CONFLICT, "Conflict")
//!             .build(),
//!     )
//!     .build();
//!
//! let mut scope = RequestScope::new("req-42");
//! let mut response = WireResponse::new(Vec::new());
//! let exception = ExceptionRecord::illegal_state("").with_type(&PIPELINE_LOCKED);
//!
//! handlers.handle(exception, &mut scope, &mut response)?;
//!
//! let wire = String::from_utf8(response.into_inner()).unwrap();
//! assert!(wire.starts_with("HTTP/1.1 409 Conflict"));
//! assert!(wire.ends_with("\r\n\r\nConflict"));
//! # Ok::<(), palisade_http_errors::EmitError>(())
//! ```
//!
//! ## Features
//!
//! - `trusted_debug`: Enable `HandlerLog::format_for_trusted_debug` (debug builds only)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod classify;
pub mod decorator;
pub mod handler;
pub mod logging;
pub mod models;
pub mod registry;
pub mod response;
pub mod ring_buffer;
pub mod scope;
pub mod status;
pub mod types;
pub mod upstream;

pub use classify::*;
pub use decorator::*;
pub use handler::*;
pub use logging::*;
pub use models::*;
pub use registry::*;
pub use response::{emit, EmitError, ResponseChannel, WireResponse};
pub use ring_buffer::*;
pub use scope::{DiagnosticScope, RejectedRecord, RequestScope, ScopeRejection};
pub use status::*;
pub use types::{Ancestry, ExceptionType};
pub use upstream::*;

/// Type alias for Results of handling an exception.
pub type Result<T> = std::result::Result<T, EmitError>;
