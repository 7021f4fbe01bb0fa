//! Producer helpers — the boundary where domain services (appointments,
//! consultations, pharmacy) hand events to the hub.
//!
//! The hub routes opaque events; the business meaning lives here. All
//! helpers are fire-and-forget: offline recipients are skipped, and
//! per-connection failures stay inside the hub.

use medpulse_core::{Notification, Role, UserId};
use medpulse_notify::NotificationHub;
use serde_json::{Value, json};

/// Tell a patient they are being called into a consultation room.
pub async fn patient_called(hub: &NotificationHub, patient_id: UserId, doctor_id: UserId, room: &str) {
    let event = Notification::new(
        "patient_called",
        "It's your turn",
        format!("The doctor is waiting for you in {room}"),
        json!({
            "patient_id": patient_id,
            "doctor_id": doctor_id,
            "room": room,
        }),
    );
    hub.send_to_user(patient_id, &event).await;
}

/// Tell a patient the state of one of their appointments changed.
pub async fn appointment_updated(
    hub: &NotificationHub,
    appointment_id: i64,
    patient_id: UserId,
    new_status: &str,
    message: &str,
) {
    let event = Notification::new(
        "appointment_updated",
        "Appointment update",
        message,
        json!({
            "appointment_id": appointment_id,
            "new_status": new_status,
        }),
    );
    hub.send_to_user(patient_id, &event).await;
}

/// Tell a patient their prescription is ready for pickup.
pub async fn prescription_ready(hub: &NotificationHub, patient_id: UserId, prescription_id: i64) {
    let event = Notification::new(
        "prescription_ready",
        "Prescription ready",
        "Your prescription is ready at the pharmacy",
        json!({ "prescription_id": prescription_id }),
    );
    hub.send_to_user(patient_id, &event).await;
}

/// Notify every connected doctor.
pub async fn notify_doctors(hub: &NotificationHub, title: &str, message: &str, data: Option<Value>) {
    let event = Notification::new(
        "doctor_notice",
        title,
        message,
        data.unwrap_or_else(|| json!({})),
    );
    hub.send_to_role(Role::Doctor, &event).await;
}

/// Notify every connected pharmacist.
pub async fn notify_pharmacists(
    hub: &NotificationHub,
    title: &str,
    message: &str,
    data: Option<Value>,
) {
    let event = Notification::new(
        "pharmacy_notice",
        title,
        message,
        data.unwrap_or_else(|| json!({})),
    );
    hub.send_to_role(Role::Pharmacist, &event).await;
}

/// Notify everyone online, regardless of role.
pub async fn system_broadcast(hub: &NotificationHub, title: &str, message: &str, data: Option<Value>) {
    let event = Notification::new(
        "system_notice",
        title,
        message,
        data.unwrap_or_else(|| json!({})),
    );
    hub.broadcast(&event).await;
}
