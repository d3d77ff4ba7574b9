// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde_json::{json, Value};

use super::{AppointmentNotice, Notification, Record};

fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("not an object: {other}"),
    }
}

#[yare::parameterized(
    confirmed = { json!({ "type": "appointment_confirmed", "appointment_id": 12 }), "appointment_confirmed" },
    cancelled = { json!({ "type": "appointment_cancelled" }), "appointment_cancelled" },
    reminder = { json!({ "type": "appointment_reminder", "scheduled_at": "2026-10-20T09:00:00Z" }), "appointment_reminder" },
    lab = { json!({ "type": "lab_result_ready", "test_name": "CBC" }), "lab_result_ready" },
    message = { json!({ "type": "message", "title": "Hi", "body": "مرحبا" }), "message" },
    unknown_type = { json!({ "type": "invoice_paid", "amount": 3 }), "invoice_paid" },
    no_type = { json!({ "amount": 3 }), "unknown" },
)]
fn decodes_kind(value: Value, kind: &str) {
    assert_eq!(Notification::from_record(&record(value)).kind(), kind);
}

#[test]
fn decodes_appointment_fields() {
    let n = Notification::from_record(&record(json!({
        "type": "appointment_confirmed",
        "appointment_id": "A-77",
        "doctor": "Dr. Nour",
        "extra": true,
    })));
    assert_eq!(
        n,
        Notification::AppointmentConfirmed(AppointmentNotice {
            appointment_id: Some(json!("A-77")),
            doctor: Some("Dr. Nour".to_owned()),
            ..AppointmentNotice::default()
        })
    );
}

#[test]
fn mistyped_known_kind_falls_back_to_other() {
    let raw = record(json!({ "type": "message", "title": 42 }));
    assert_eq!(Notification::from_record(&raw), Notification::Other(raw.clone()));
}
