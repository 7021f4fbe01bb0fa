//! Staff roles used for role-targeted fanout.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A coarse permission category attached to a user at authentication time.
///
/// Only these four roles participate in role-targeted fanout. Tokens may
/// carry other role strings (patients, contractors, interns); those users
/// are tracked by user id only and still receive direct and broadcast
/// deliveries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Back-office administrator.
    Administrator,
    /// Attending physician.
    Doctor,
    /// Nursing staff.
    Nurse,
    /// Pharmacy staff.
    Pharmacist,
}

impl Role {
    /// All recognized roles, in a stable order.
    pub const ALL: [Role; 4] = [
        Role::Administrator,
        Role::Doctor,
        Role::Nurse,
        Role::Pharmacist,
    ];

    /// Parse a role claim as issued by the token service.
    ///
    /// Returns `None` for unrecognized roles; such users only lose
    /// role-fanout eligibility.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Administrator" => Some(Role::Administrator),
            "Doctor" => Some(Role::Doctor),
            "Nurse" => Some(Role::Nurse),
            "Pharmacist" => Some(Role::Pharmacist),
            _ => None,
        }
    }

    /// Canonical name, as it appears in token claims and stats output.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Administrator => "Administrator",
            Role::Doctor => "Doctor",
            Role::Nurse => "Nurse",
            Role::Pharmacist => "Pharmacist",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
