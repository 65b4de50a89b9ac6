#![no_main]

use libfuzzer_sys::fuzz_target;
use palisade_http_errors::{
    ExceptionHandlers, ExceptionRecord, NullSink, RequestScope, UpstreamFailure,
    UpstreamResponse, WireResponse,
};

fuzz_target!(|data: &[u8]| {
    let Some((&selector, rest)) = data.split_first() else {
        return;
    };
    let message = String::from_utf8_lossy(rest).into_owned();

    let record = match selector % 7 {
        0 => ExceptionRecord::access_denied(message),
        1 => ExceptionRecord::not_found(message),
        2 => ExceptionRecord::illegal_argument(message),
        3 => ExceptionRecord::illegal_state(message),
        4 => {
            let status = u16::from_le_bytes([selector, rest.first().copied().unwrap_or(0)]);
            let response = UpstreamResponse::new("http://fuzz", status);
            ExceptionRecord::upstream(UpstreamFailure::with_response(response), message)
        }
        5 => ExceptionRecord::upstream(UpstreamFailure::network("http://fuzz"), message),
        _ => ExceptionRecord::other(message),
    };

    let handlers = ExceptionHandlers::builder().sink(NullSink).build();
    let classification = handlers.classifier().classify(&record);
    assert!((100..=599).contains(&classification.status.as_u16()));

    let mut scope = RequestScope::new("fuzz");
    let mut response = WireResponse::new(Vec::new());
    handlers
        .handle(record, &mut scope, &mut response)
        .expect("in-memory emit cannot fail");
    assert!(scope.recorded().is_some());
});
