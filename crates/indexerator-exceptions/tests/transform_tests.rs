use indexerator_exceptions::{
    exception_events_schema, DanglingReference, ErrorKind, ExceptionDataTransformer,
    TransformError,
};
use serde_json::{json, Value};

const BUILD_EVENT: &str = include_str!("../resources/exception_data_event.json");

fn decode(line: &str) -> Value {
    serde_json::from_str(line).expect("record should be valid JSON")
}

fn contains_null(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.iter().any(contains_null),
        Value::Object(fields) => fields.values().any(contains_null),
        _ => false,
    }
}

#[test]
fn test_end_to_end_single_exception() {
    let raw = json!({
        "exceptions": {
            "e1": {
                "stackTrace": "t1",
                "className": "NPE",
                "causes": [],
                "metadata": {},
                "classLevelAnnotations": []
            }
        },
        "stackTraces": { "t1": { "stackFrames": ["f1"] } },
        "stackFrames": {
            "f1": { "declaringClass": "Foo", "methodName": "bar", "lineNumber": 42 }
        }
    })
    .to_string();

    let lines = ExceptionDataTransformer::new().transform(&raw).unwrap();

    assert_eq!(lines.len(), 1);
    assert_eq!(
        lines[0],
        concat!(
            r#"{"exceptionId":"e1","className":"NPE","message":"","#,
            r#""stacktrace":{"stackTraceId":"t1","stackFrames":[{"stackFrameId":"f1","#,
            r#""declaringClass":"Foo","methodName":"bar","fileName":"","lineNumber":42,"fileRef":""}]},"#,
            r#""causes":[],"metadata":"{}","classLevelAnnotations":[]}"#
        )
    );
}

#[test]
fn test_fan_out_matches_exception_count_and_order() {
    let raw = json!({
        "exceptions": {
            "e3": { "stackTrace": "t1" },
            "e1": { "stackTrace": "t2" },
            "e2": { "stackTrace": "t1" }
        },
        "stackTraces": {
            "t1": { "stackFrames": ["f1"] },
            "t2": { "stackFrames": [] }
        },
        "stackFrames": { "f1": { "methodName": "main" } }
    })
    .to_string();

    let lines = ExceptionDataTransformer::new().transform(&raw).unwrap();
    let ids: Vec<String> = lines
        .iter()
        .map(|line| decode(line)["exceptionId"].as_str().unwrap().to_string())
        .collect();

    assert_eq!(ids, vec!["e3", "e1", "e2"]);
}

#[test]
fn test_build_event_fixture() {
    let transformer = ExceptionDataTransformer::new();
    let lines = transformer.transform(BUILD_EVENT.trim()).unwrap();
    assert_eq!(lines.len(), 2);

    let first = decode(&lines[0]);
    assert_eq!(first["exceptionId"], "-4133390937421578302");
    assert_eq!(
        first["className"],
        "org.gradle.api.tasks.TaskExecutionException"
    );
    assert_eq!(first["causes"], json!(["5880148627382617412"]));
    assert_eq!(
        first["metadata"],
        r#"{"taskPath":":compileJava","attempts":[1,2]}"#
    );
    assert_eq!(
        first["classLevelAnnotations"],
        json!(["org.gradle.api.NonNullApi", "org.gradle.api.Contextual"])
    );

    let frames = first["stacktrace"]["stackFrames"].as_array().unwrap();
    let frame_ids: Vec<&str> = frames
        .iter()
        .map(|frame| frame["stackFrameId"].as_str().unwrap())
        .collect();
    assert_eq!(frame_ids, vec!["101", "102", "103"]);
    assert_eq!(frames[0]["fileRef"], "");
    assert_eq!(frames[2]["lineNumber"], 748);

    let second = decode(&lines[1]);
    assert_eq!(second["stacktrace"]["stackTraceId"], "-918273645546372819");
    let frames = second["stacktrace"]["stackFrames"].as_array().unwrap();
    assert_eq!(frames[0]["stackFrameId"], "201");
    assert_eq!(frames[0]["fileName"], "");
    assert_eq!(frames[0]["lineNumber"], -2);
    assert_eq!(frames[1]["stackFrameId"], "101");
}

#[test]
fn test_records_never_contain_null() {
    let raw = json!({
        "exceptions": {
            "e1": {
                "stackTrace": "t1",
                "className": null,
                "message": null,
                "causes": null,
                "metadata": null,
                "classLevelAnnotations": null
            }
        },
        "stackTraces": { "t1": { "stackFrames": ["f1"] } },
        "stackFrames": {
            "f1": {
                "declaringClass": null,
                "methodName": null,
                "fileName": null,
                "lineNumber": null,
                "fileRef": null
            }
        }
    })
    .to_string();

    let lines = ExceptionDataTransformer::new().transform(&raw).unwrap();
    let schema = exception_events_schema();

    for line in lines.iter().chain(
        ExceptionDataTransformer::new()
            .transform(BUILD_EVENT.trim())
            .unwrap()
            .iter(),
    ) {
        let record = decode(line);
        assert!(!contains_null(&record), "null in {}", line);
        assert!(schema.check(&record).is_ok());
        assert!(!line.contains('\n'));
    }

    let record = decode(&lines[0]);
    assert_eq!(record["className"], "");
    assert_eq!(record["message"], "");
    assert_eq!(record["metadata"], "");
    assert_eq!(record["causes"], json!([]));
    assert_eq!(record["stacktrace"]["stackFrames"][0]["lineNumber"], 0);
}

#[test]
fn test_missing_stack_trace_is_dangling_reference() {
    let raw = json!({
        "exceptions": {
            "e1": { "stackTrace": "t1" },
            "e2": { "stackTrace": "nope" }
        },
        "stackTraces": { "t1": { "stackFrames": [] } }
    })
    .to_string();

    let err = ExceptionDataTransformer::new().transform(&raw).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DanglingReference);
    match err {
        TransformError::DanglingReference(DanglingReference::StackTrace {
            exception_id,
            stack_trace_id,
        }) => {
            assert_eq!(exception_id, "e2");
            assert_eq!(stack_trace_id.as_deref(), Some("nope"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_missing_stack_frame_is_dangling_reference() {
    let raw = json!({
        "exceptions": { "e1": { "stackTrace": "t1" } },
        "stackTraces": { "t1": { "stackFrames": ["f1", "f2"] } },
        "stackFrames": { "f1": {} }
    })
    .to_string();

    let err = ExceptionDataTransformer::new().transform(&raw).unwrap_err();

    assert_eq!(
        err.to_string(),
        "Dangling reference: stack trace 't1' references unknown stack frame 'f2'"
    );
}

#[test]
fn test_malformed_input() {
    let transformer = ExceptionDataTransformer::new();

    let err = transformer.transform("{not json").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedEnvelope);

    let err = transformer.transform(r#"{"exceptions":"e1"}"#).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedEnvelope);

    let err = transformer.transform("").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedEnvelope);
}

#[test]
fn test_transform_is_idempotent() {
    let transformer = ExceptionDataTransformer::new();

    let first = transformer.transform(BUILD_EVENT.trim()).unwrap();
    let second = transformer.transform(BUILD_EVENT.trim()).unwrap();
    let fresh = ExceptionDataTransformer::default()
        .transform(BUILD_EVENT.trim())
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(first, fresh);
}

#[test]
fn test_envelope_without_exceptions_yields_nothing() {
    let lines = ExceptionDataTransformer::new()
        .transform(r#"{"eventType":"ExceptionData","data":{}}"#)
        .unwrap();
    assert!(lines.is_empty());
}

#[test]
fn test_transformer_shared_across_threads() {
    let transformer = std::sync::Arc::new(ExceptionDataTransformer::new());
    let expected = transformer.transform(BUILD_EVENT.trim()).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let transformer = transformer.clone();
            std::thread::spawn(move || transformer.transform(BUILD_EVENT.trim()).unwrap())
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}

#[test]
fn test_empty_trace_and_frame_ids_resolve() {
    let raw = r#"{"exceptions":{"e1":{"stackTrace":""}},"stackTraces":{"":{"stackFrames":[""]}},"stackFrames":{"":{"methodName":"m"}}}"#;

    let lines = ExceptionDataTransformer::new().transform(raw).unwrap();

    assert_eq!(lines.len(), 1);
    let record = decode(&lines[0]);
    assert_eq!(record["exceptionId"], "e1");
    assert_eq!(record["stacktrace"]["stackTraceId"], "");
    assert_eq!(record["stacktrace"]["stackFrames"][0]["stackFrameId"], "");
    assert_eq!(record["stacktrace"]["stackFrames"][0]["methodName"], "m");
}

#[test]
fn test_class_level_annotations_keep_order() {
    let raw = json!({
        "exceptions": {
            "e1": {
                "stackTrace": "t1",
                "classLevelAnnotations": ["z.Last", "a.First", "m.Middle", "a.First"]
            }
        },
        "stackTraces": { "t1": { "stackFrames": [] } }
    })
    .to_string();

    let lines = ExceptionDataTransformer::new().transform(&raw).unwrap();
    assert_eq!(
        decode(&lines[0])["classLevelAnnotations"],
        json!(["z.Last", "a.First", "m.Middle", "a.First"])
    );
}
