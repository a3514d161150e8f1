//! Roles and the capability gates built on them.

use serde::{Deserialize, Serialize};

/// The single role a principal holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Normal,
    Gardener,
    Supervisor,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Normal => "normal",
            Role::Gardener => "gardener",
            Role::Supervisor => "supervisor",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "normal" => Some(Role::Normal),
            "gardener" => Some(Role::Gardener),
            "supervisor" => Some(Role::Supervisor),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Approved => "approved",
            VerificationStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<VerificationStatus> {
        match s {
            "pending" => Some(VerificationStatus::Pending),
            "approved" => Some(VerificationStatus::Approved),
            "rejected" => Some(VerificationStatus::Rejected),
            _ => None,
        }
    }
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role paired with the verification state it depends on. Gates are
/// evaluated against this, never against the raw role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Standing {
    Normal,
    Gardener,
    Supervisor,
    Admin(VerificationStatus),
}

impl Standing {
    pub fn of(role: Role, verification: VerificationStatus) -> Self {
        match role {
            Role::Normal => Standing::Normal,
            Role::Gardener => Standing::Gardener,
            Role::Supervisor => Standing::Supervisor,
            Role::Admin => Standing::Admin(verification),
        }
    }

    pub fn is_effective_admin(&self) -> bool {
        matches!(self, Standing::Admin(VerificationStatus::Approved))
    }

    pub fn is_supervisor_or_above(&self) -> bool {
        matches!(self, Standing::Supervisor) || self.is_effective_admin()
    }

    pub fn is_gardener_or_above(&self) -> bool {
        matches!(self, Standing::Gardener) || self.is_supervisor_or_above()
    }
}

/// A named authorization predicate over [`Standing`].
pub trait Gate: Send + Sync + 'static {
    const DENIED: &'static str;
    fn admits(standing: Standing) -> bool;
}

pub struct AdminGate;
pub struct SupervisorGate;
pub struct GardenerGate;

impl Gate for AdminGate {
    const DENIED: &'static str = "Not authorized as an admin";
    fn admits(standing: Standing) -> bool {
        standing.is_effective_admin()
    }
}

impl Gate for SupervisorGate {
    const DENIED: &'static str = "Not authorized as a supervisor";
    fn admits(standing: Standing) -> bool {
        standing.is_supervisor_or_above()
    }
}

impl Gate for GardenerGate {
    const DENIED: &'static str = "Not authorized as a gardener";
    fn admits(standing: Standing) -> bool {
        standing.is_gardener_or_above()
    }
}
