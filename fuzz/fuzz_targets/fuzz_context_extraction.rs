#![no_main]

use libfuzzer_sys::fuzz_target;
use palisade_http_errors::{extract_context, Header, UpstreamFailure, UpstreamResponse};

fuzz_target!(|data: &[u8]| {
    let split = data.first().map(|&b| b as usize).unwrap_or(0).min(data.len());
    let (content_type, body) = data.split_at(split);

    let response = UpstreamResponse::new("http://fuzz", 500)
        .with_header(Header::new(
            "Content-Type",
            String::from_utf8_lossy(content_type).into_owned(),
        ))
        .with_body(body.to_vec());
    let failure = UpstreamFailure::with_response(response);

    let context = extract_context(&failure).expect("response present");
    assert_eq!(context.get("url"), Some("http://fuzz"));
    if context.contains_key("body") {
        assert!(failure.response().is_some_and(|r| r.is_json()));
    }
});
