//! Verify `normalize` against JSON test vectors stored in `test-vectors/`.
//!
//! Each case gives a simulated response and either the expected normalized
//! result or the expected error message. Comparing parsed JSON (not raw
//! strings) avoids false negatives from field-ordering differences.

use envelope_core::{normalize, RawResponse};

fn simulated_response(case: &serde_json::Value) -> RawResponse {
    RawResponse {
        status: case["status"].as_u64().unwrap() as u16,
        headers: vec![("content-type".to_string(), "application/json".to_string())],
        body: case["body"].as_str().unwrap().to_string(),
    }
}

#[test]
fn normalize_test_vectors() {
    let raw = include_str!("../../test-vectors/normalize.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let response = simulated_response(case);
        let result = normalize(response.clone());

        if let Some(expected_error) = case.get("expected_error") {
            let err = result.unwrap_err();
            assert_eq!(err.to_string(), expected_error.as_str().unwrap(), "{name}: message");
            assert_eq!(err.response(), Some(&response), "{name}: attached response");
            continue;
        }

        let expected = &case["expected_result"];
        let result = result.unwrap_or_else(|e| panic!("{name}: unexpected error {e}"));
        assert_eq!(result.data.as_ref(), expected.get("data"), "{name}: data");
        assert_eq!(result.meta.next.as_deref(), expected["next"].as_str(), "{name}: next");
        assert_eq!(
            result.meta.previous.as_deref(),
            expected["previous"].as_str(),
            "{name}: previous"
        );
    }
}

#[test]
fn every_vector_is_either_result_or_error() {
    let raw = include_str!("../../test-vectors/normalize.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let has_result = case.get("expected_result").is_some();
        let has_error = case.get("expected_error").is_some();
        assert!(has_result ^ has_error, "{}: ambiguous vector", case["name"]);
    }
}
