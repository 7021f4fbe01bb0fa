//! # medpulse-core
//!
//! Foundation types for the MedPulse real-time notification service:
//!
//! - [`roles::Role`]: the fixed staff-role enumeration used for fanout targeting
//! - [`notification::Notification`]: the immutable logical event producers hand
//!   to the hub, and its stamped wire envelope
//! - [`UserId`]: integer user identity assigned at authentication time
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by `medpulse-notify` and `medpulse-server`.

#![deny(unsafe_code)]

pub mod notification;
pub mod roles;

pub use notification::{Notification, WireNotification};
pub use roles::Role;

/// Integer user identity, as issued by the employee/patient store.
pub type UserId = i64;
