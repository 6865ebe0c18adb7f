use pipewatch_core::{
    decode_frame, EventKind, FrameError, PipelineStatus, StreamMessage, TaskOutcome,
    TaskSnapshot, TaskStatus, UNKNOWN_FAILURE_MESSAGE,
};

#[test]
fn decodes_event_as_sent_by_backend() {
    let raw = r#"{"id":"e-1","taskId":"t-1","agentName":"Planner","eventType":"start","message":"Planning","createdAt":"2024-05-01T10:15:30.123456"}"#;

    let StreamMessage::Event(ev) = decode_frame(raw).unwrap() else {
        panic!("expected event");
    };
    assert_eq!(ev.id, "e-1");
    assert_eq!(ev.task_id.as_deref(), Some("t-1"));
    assert_eq!(ev.event_type, EventKind::Start);

    let ts = ev.created_at_utc().expect("naive timestamp should read as utc");
    assert_eq!(ts.to_rfc3339(), "2024-05-01T10:15:30.123456+00:00");
}

#[test]
fn decodes_status_update() {
    let raw = r#"{"type":"STATUS_UPDATE","status":"completed"}"#;
    assert_eq!(
        decode_frame(raw).unwrap(),
        StreamMessage::Status(PipelineStatus::Completed)
    );
}

#[test]
fn unknown_event_kind_survives_reencoding() {
    let raw = r#"{"id":"e-9","agentName":"Writer","eventType":"paused","message":"hold"}"#;
    let msg = decode_frame(raw).unwrap();

    let StreamMessage::Event(ev) = &msg else {
        panic!("expected event");
    };
    assert_eq!(ev.event_type, EventKind::Other("paused".into()));
    assert!(!ev.event_type.is_known());

    let again = decode_frame(&msg.to_json().unwrap()).unwrap();
    assert_eq!(again, msg);
}

#[test]
fn malformed_frames_are_errors() {
    assert!(matches!(decode_frame("not json"), Err(FrameError::Json(_))));
    assert!(matches!(
        decode_frame(r#"{"type":"STATUS_UPDATE"}"#),
        Err(FrameError::MissingField("status"))
    ));
    assert!(matches!(
        decode_frame(r#"{"type":"STATUS_UPDATE","status":"exploded"}"#),
        Err(FrameError::UnknownStatus(_))
    ));
    assert!(matches!(
        decode_frame(r#"{"id":"","agentName":"Planner","eventType":"start","message":""}"#),
        Err(FrameError::MissingField("id"))
    ));
}

#[test]
fn snapshot_outcome_reads_terminal_result() {
    let done: TaskSnapshot = serde_json::from_str(
        r#"{"id":"t","prompt":"p","status":"completed","result":{"finalReport":"X","pipelineOutput":{"Writer":{"draft":"d"}}}}"#,
    )
    .unwrap();
    assert_eq!(
        done.outcome(),
        Some(TaskOutcome::Completed {
            final_report: Some("X".into())
        })
    );

    let failed: TaskSnapshot =
        serde_json::from_str(r#"{"id":"t","prompt":"p","status":"failed"}"#).unwrap();
    assert_eq!(
        failed.outcome(),
        Some(TaskOutcome::Failed {
            error: UNKNOWN_FAILURE_MESSAGE.into()
        })
    );

    let running: TaskSnapshot =
        serde_json::from_str(r#"{"id":"t","prompt":"p","status":"in_progress"}"#).unwrap();
    assert_eq!(running.status, TaskStatus::InProgress);
    assert!(running.outcome().is_none());
}

#[test]
fn reencoding_keeps_only_known_fields() {
    let raw = r#"{"id":"e-9","agentName":"Writer","eventType":"info","priority":3}"#;
    let msg = decode_frame(raw).unwrap();

    let value: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
    assert_eq!(value["message"], "");
    assert!(value.get("priority").is_none());
    assert!(value.get("createdAt").is_none());
}
