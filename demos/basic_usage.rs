use palisade_http_errors::{
    define_exception_types, types, CorrelationIdDecorator, ExceptionHandlers, ExceptionRecord,
    Header, HttpStatus, RequestScope, RingBufferLogger, StatusRegistry, UpstreamFailure,
    UpstreamResponse, WireResponse,
};

define_exception_types! {
    &types::ILLEGAL_STATE => {
        PIPELINE_LOCKED = "PipelineLocked",
    }
}

fn run_request(handlers: &ExceptionHandlers, request_id: &str, exception: ExceptionRecord) {
    let mut scope = RequestScope::new(request_id);
    let mut response = WireResponse::new(Vec::new());

    if let Err(e) = handlers.handle(exception, &mut scope, &mut response) {
        println!("   emit failed: {}", e);
        return;
    }

    // What the client receives
    let wire = String::from_utf8_lossy(response.get_ref());
    println!("   [CLIENT] {}", wire.replace("\r\n", " | "));

    // What the rendering stage finds in the scope
    if let Some(recorded) = scope.recorded() {
        println!("   [SCOPE]  {}", recorded);
        for (key, value) in recorded.attributes() {
            println!("            {} = {}", key, value);
        }
    }
    scope.finalize();
}

fn main() {
    let logger = RingBufferLogger::new(32, 2048);
    let handlers = ExceptionHandlers::builder()
        .registry(
            StatusRegistry::builder()
                .declare(&PIPELINE_LOCKED, HttpStatus::CONFLICT, "Conflict")
                .build(),
        )
        .decorator(CorrelationIdDecorator::default())
        .sink(logger.clone())
        .build();

    println!("--- Basic Usage Example ---\n");

    println!("1. Authorization failure (details never leave the server):");
    run_request(
        &handlers,
        "req-1",
        ExceptionRecord::access_denied("user jdoe lacks role ADMIN")
            .with_attribute("correlation_id", "req-1"),
    );

    println!("\n2. Bad input (message passes through):");
    run_request(
        &handlers,
        "req-2",
        ExceptionRecord::illegal_argument("limit must be positive"),
    );

    println!("\n3. Upstream service returned an error:");
    let upstream = UpstreamResponse::new("http://front50/pipelines/abc", 502)
        .with_header(Header::new("Content-Type", "application/json"))
        .with_body(br#"{"error":"timeout"}"#.to_vec());
    run_request(
        &handlers,
        "req-3",
        ExceptionRecord::upstream(UpstreamFailure::with_response(upstream), "front50 timed out"),
    );

    println!("\n4. Declared status with no message:");
    run_request(
        &handlers,
        "req-4",
        ExceptionRecord::illegal_state("").with_type(&PIPELINE_LOCKED),
    );

    println!("\n[INTERNAL LOG] What the operator sees:");
    for entry in logger.get_all() {
        println!(
            "   [{}] {} {} summary='{}' message='{}'",
            entry.level, entry.status, entry.type_name, entry.summary, entry.message
        );
    }
}
