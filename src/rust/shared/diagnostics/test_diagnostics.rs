use super::*;

fn fixed_clock() -> Clock {
    Rc::new(|| 1_700_000_000_000.0)
}

#[test]
fn test_ring_buffer_keeps_most_recent_entries() {
    let diagnostics = Diagnostics::with_clock(DEFAULT_CAPACITY, Verbosity::Quiet, fixed_clock());
    for i in 0..250 {
        diagnostics.info("TEST", format!("event {i}"));
    }

    let entries = diagnostics.entries();
    assert_eq!(entries.len(), 200);
    assert_eq!(entries.first().unwrap().message, "event 50");
    assert_eq!(entries.last().unwrap().message, "event 249");
}

#[test]
fn test_data_is_copied_at_record_time() {
    let diagnostics = Diagnostics::with_clock(10, Verbosity::Quiet, fixed_clock());
    let mut payload = vec![1, 2, 3];
    diagnostics.info_with("TEST", "payload", &payload);
    payload.push(4);

    let stored = diagnostics.entries()[0].data.clone().unwrap();
    assert_eq!(stored, serde_json::json!([1, 2, 3]));
}

#[test]
fn test_clear_leaves_single_entry() {
    let diagnostics = Diagnostics::with_clock(10, Verbosity::Quiet, fixed_clock());
    diagnostics.warn("TEST", "one");
    diagnostics.error("TEST", "two");
    diagnostics.clear();

    let entries = diagnostics.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].message, "Debug logs cleared");
    assert_eq!(entries[0].level, DiagnosticLevel::Info);
}

#[test]
fn test_echo_respects_verbosity() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let diagnostics = Diagnostics::with_clock(10, Verbosity::Normal, fixed_clock());
    let sink = seen.clone();
    diagnostics.set_echo(Rc::new(move |event: &DiagnosticEvent| {
        sink.borrow_mut().push(event.message.clone());
    }));

    diagnostics.info("TEST", "quiet info");
    diagnostics.warn("TEST", "loud warn");
    diagnostics.set_verbosity(Verbosity::Verbose);
    diagnostics.info("TEST", "verbose info");

    assert_eq!(*seen.borrow(), vec!["loud warn", "verbose info"]);
    assert_eq!(diagnostics.len(), 3);
}

#[test]
fn test_echo_may_record_again() {
    let diagnostics = Rc::new(Diagnostics::with_clock(10, Verbosity::Verbose, fixed_clock()));
    let inner = Rc::downgrade(&diagnostics);
    diagnostics.set_echo(Rc::new(move |event: &DiagnosticEvent| {
        if event.category == "OUTER" {
            if let Some(d) = inner.upgrade() {
                d.info("INNER", "nested");
            }
        }
    }));

    diagnostics.info("OUTER", "first");
    assert_eq!(diagnostics.len(), 2);
}

#[test]
fn test_export_report_shape() {
    let diagnostics = Diagnostics::with_clock(10, Verbosity::Quiet, fixed_clock());
    diagnostics.info("UNLOCK", "started");

    let report = diagnostics
        .export(&serde_json::json!({ "userAgent": "test" }), &serde_json::json!({ "isUnlocked": false }))
        .unwrap();
    let parsed: Value = serde_json::from_str(&report).unwrap();

    assert_eq!(parsed["timestamp"], "2023-11-14T22:13:20Z");
    assert_eq!(parsed["deviceInfo"]["userAgent"], "test");
    assert_eq!(parsed["audioStatus"]["isUnlocked"], false);
    assert_eq!(parsed["logs"][0]["category"], "UNLOCK");
    assert_eq!(parsed["logs"][0]["level"], "info");
}
