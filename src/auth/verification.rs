//! Admin-verification lifecycle: pending -> approved | rejected.
//!
//! The verification record lives on every principal but only carries meaning
//! while the role is `admin`. A rejection sends the principal back to
//! `normal`; the rejected record is kept until the next request opens a fresh
//! cycle.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::User;
use super::roles::{Role, VerificationStatus};

pub const DEFAULT_REJECTION_REASON: &str = "No reason provided";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminVerification {
    pub status: VerificationStatus,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub request_date: Option<OffsetDateTime>,
    pub verified_by: Option<Uuid>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub verification_date: Option<OffsetDateTime>,
    pub rejection_reason: Option<String>,
}

impl AdminVerification {
    fn opened(now: OffsetDateTime) -> Self {
        Self {
            status: VerificationStatus::Pending,
            request_date: Some(now),
            verified_by: None,
            verification_date: None,
            rejection_reason: None,
        }
    }
}

/// Outcome chosen by an effective admin for a pending request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject { reason: Option<String> },
}

impl Decision {
    pub fn status(&self) -> VerificationStatus {
        match self {
            Decision::Approve => VerificationStatus::Approved,
            Decision::Reject { .. } => VerificationStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum VerificationError {
    #[error("principal is already an approved admin")]
    AlreadyAdmin,
    #[error("admin request already pending")]
    RequestAlreadyPending,
    #[error("no pending admin request")]
    NoPendingRequest,
}

impl User {
    /// Puts the principal into the admin role with a fresh pending request.
    pub fn open_admin_request(&mut self, now: OffsetDateTime) {
        self.role = Role::Admin;
        self.admin_verification = AdminVerification::opened(now);
    }

    /// Self-service request for admin privileges.
    pub fn request_admin(&mut self, now: OffsetDateTime) -> Result<(), VerificationError> {
        if self.role == Role::Admin {
            match self.admin_verification.status {
                VerificationStatus::Approved => return Err(VerificationError::AlreadyAdmin),
                VerificationStatus::Pending => {
                    return Err(VerificationError::RequestAlreadyPending)
                }
                VerificationStatus::Rejected => {}
            }
        }
        self.open_admin_request(now);
        Ok(())
    }

    /// Applies an admin's decision to this principal's pending request.
    pub fn decide_admin_request(
        &mut self,
        decision: Decision,
        verifier: Uuid,
        now: OffsetDateTime,
    ) -> Result<(), VerificationError> {
        if self.role != Role::Admin || self.admin_verification.status != VerificationStatus::Pending
        {
            return Err(VerificationError::NoPendingRequest);
        }

        let v = &mut self.admin_verification;
        v.status = decision.status();
        v.verified_by = Some(verifier);
        v.verification_date = Some(now);

        if let Decision::Reject { reason } = decision {
            v.rejection_reason = Some(
                reason
                    .filter(|r| !r.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_REJECTION_REASON.to_string()),
            );
            self.role = Role::Normal;
        }
        Ok(())
    }
}
