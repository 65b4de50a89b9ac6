//! Dispatcher entry point.
//!
//! For every caught exception the handler runs, in this order:
//!
//! 1. classification (and, for upstream failures with a response, context
//!    extraction into a wrapper record)
//! 2. server-side logging at the classified level
//! 3. recording into the request's diagnostic scope
//! 4. emission of the response
//!
//! Recording always completes before the response is committed, and
//! logging always precedes the write so a failed write still leaves a
//! trace. Only emission errors escape.

use crate::classify::{Classification, Classifier};
use crate::decorator::{MessageDecorator, PassthroughDecorator};
use crate::logging::{self, HandlerLog, LogLevel, LogSink, TracingSink};
use crate::models::{ExceptionKind, ExceptionRecord};
use crate::registry::StatusRegistry;
use crate::response::{self, EmitError, ResponseChannel};
use crate::scope::{self, DiagnosticScope};
use crate::status::HttpStatus;
use crate::types;
use crate::upstream;
use std::sync::Arc;

/// Shared, thread-safe exception handlers.
///
/// ```rust
/// use palisade_http_errors::{ExceptionHandlers, ExceptionRecord, RequestScope, WireResponse};
///
/// let handlers = ExceptionHandlers::builder().build();
/// let mut scope = RequestScope::new("req-1");
/// let mut response = WireResponse::new(Vec::new());
///
/// handlers
///     .handle(ExceptionRecord::illegal_argument("limit must be positive"), &mut scope, &mut response)
///     .unwrap();
///
/// let wire = String::from_utf8(response.into_inner()).unwrap();
/// assert!(wire.starts_with("HTTP/1.1 400 Bad Request"));
/// assert!(wire.ends_with("limit must be positive"));
/// ```
#[derive(Clone)]
pub struct ExceptionHandlers {
    classifier: Classifier,
    sink: Arc<dyn LogSink>,
}

impl ExceptionHandlers {
    /// Start configuring handlers.
    pub fn builder() -> ExceptionHandlersBuilder {
        ExceptionHandlersBuilder::default()
    }

    /// Classifier used for every request.
    #[inline]
    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Translate `exception` into an error response.
    ///
    /// # Errors
    ///
    /// Returns [`EmitError`] when the response was already committed or
    /// could not be written. Nothing else fails.
    pub fn handle(
        &self,
        exception: ExceptionRecord,
        scope: &mut dyn DiagnosticScope,
        response: &mut dyn ResponseChannel,
    ) -> Result<(), EmitError> {
        let (outcome, recorded) = self.translate(exception);
        let Classification {
            status,
            message,
            log_level,
        } = outcome.classification;

        logging::dispatch(
            self.sink.as_ref(),
            &HandlerLog::new(log_level, status, outcome.summary, &recorded),
        );
        scope::record(scope, recorded, self.sink.as_ref());

        response::emit(status, &message, response)
    }

    /// Classify, and swap upstream failures with a response for a wrapper
    /// carrying the original diagnostics plus the extracted context.
    fn translate(&self, mut exception: ExceptionRecord) -> (Outcome, ExceptionRecord) {
        let decorator = self.classifier.decorator();

        let context = match exception.kind() {
            ExceptionKind::Upstream(failure) => upstream::extract_context(failure),
            _ => None,
        };

        let Some(context) = context else {
            let outcome = {
                let resolution = self.classifier.resolve(&exception);
                let message = decorator.decorate(&exception, &resolution.message);
                Outcome::new(
                    resolution.status,
                    resolution.log_level,
                    resolution.summary,
                    message,
                )
            };
            return (outcome, exception);
        };

        let (status, log_level, summary, candidate) = {
            let resolution = self.classifier.resolve(&exception);
            (
                resolution.status,
                resolution.log_level,
                resolution.summary,
                resolution.message.into_owned(),
            )
        };

        let (attributes, source) = exception.take_diagnostics();
        let mut wrapper =
            ExceptionRecord::new(ExceptionKind::Other, exception.message().map(str::to_owned))
                .with_type(&types::UPSTREAM_FAILURE_WRAPPER)
                .with_attributes(attributes)
                .with_attributes(context.into_attributes());
        if let Some(source) = source {
            wrapper = wrapper.with_source(source);
        }

        let message = decorator.decorate(&wrapper, &candidate);
        (Outcome::new(status, log_level, summary, message), wrapper)
    }
}

struct Outcome {
    classification: Classification,
    summary: &'static str,
}

impl Outcome {
    fn new(status: HttpStatus, log_level: LogLevel, summary: &'static str, message: String) -> Self {
        Self {
            classification: Classification {
                status,
                message,
                log_level,
            },
            summary,
        }
    }
}

/// Startup configuration for [`ExceptionHandlers`].
pub struct ExceptionHandlersBuilder {
    registry: StatusRegistry,
    decorator: Arc<dyn MessageDecorator>,
    sink: Arc<dyn LogSink>,
}

impl Default for ExceptionHandlersBuilder {
    fn default() -> Self {
        Self {
            registry: StatusRegistry::default(),
            decorator: Arc::new(PassthroughDecorator),
            sink: Arc::new(TracingSink),
        }
    }
}

impl ExceptionHandlersBuilder {
    /// Declared statuses (empty by default).
    pub fn registry(mut self, registry: StatusRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Message decorator (passthrough by default).
    pub fn decorator(mut self, decorator: impl MessageDecorator + 'static) -> Self {
        self.decorator = Arc::new(decorator);
        self
    }

    /// Server-side log sink ([`TracingSink`] by default).
    pub fn sink(mut self, sink: impl LogSink + 'static) -> Self {
        self.sink = Arc::new(sink);
        self
    }

    /// Freeze the configuration.
    pub fn build(self) -> ExceptionHandlers {
        ExceptionHandlers {
            classifier: Classifier::with_decorator(self.registry, self.decorator),
            sink: self.sink,
        }
    }
}
