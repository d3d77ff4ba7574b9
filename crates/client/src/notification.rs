// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed view over received records, for UI code.
//!
//! The relay and the socket keep payloads opaque; decoding into known kinds
//! happens only here.

use serde::Deserialize;
use serde_json::Value;

/// A received message: a JSON object with arbitrary keys.
pub type Record = serde_json::Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct AppointmentNotice {
    #[serde(default)]
    pub appointment_id: Option<Value>,
    #[serde(default)]
    pub scheduled_at: Option<String>,
    #[serde(default)]
    pub doctor: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct LabResultNotice {
    #[serde(default)]
    pub result_id: Option<Value>,
    #[serde(default)]
    pub test_name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct MessageNotice {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

/// Known notification kinds, keyed on the record's `type` field.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    AppointmentConfirmed(AppointmentNotice),
    AppointmentCancelled(AppointmentNotice),
    AppointmentReminder(AppointmentNotice),
    LabResultReady(LabResultNotice),
    Message(MessageNotice),
    /// Unknown `type`, missing `type`, or a known kind that failed to decode.
    Other(Record),
}

impl Notification {
    pub fn from_record(record: &Record) -> Self {
        let kind = record.get("type").and_then(Value::as_str).unwrap_or_default();
        let decoded = match kind {
            "appointment_confirmed" => decode(record).map(Self::AppointmentConfirmed),
            "appointment_cancelled" => decode(record).map(Self::AppointmentCancelled),
            "appointment_reminder" => decode(record).map(Self::AppointmentReminder),
            "lab_result_ready" => decode(record).map(Self::LabResultReady),
            "message" => decode(record).map(Self::Message),
            _ => None,
        };
        decoded.unwrap_or_else(|| Self::Other(record.clone()))
    }

    pub fn kind(&self) -> &str {
        match self {
            Self::AppointmentConfirmed(_) => "appointment_confirmed",
            Self::AppointmentCancelled(_) => "appointment_cancelled",
            Self::AppointmentReminder(_) => "appointment_reminder",
            Self::LabResultReady(_) => "lab_result_ready",
            Self::Message(_) => "message",
            Self::Other(record) => record.get("type").and_then(Value::as_str).unwrap_or("unknown"),
        }
    }
}

fn decode<T: for<'de> Deserialize<'de>>(record: &Record) -> Option<T> {
    match serde_json::from_value(Value::Object(record.clone())) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::debug!(err = %e, "notification did not match its declared type");
            None
        }
    }
}

#[cfg(test)]
#[path = "notification_tests.rs"]
mod tests;
