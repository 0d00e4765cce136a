use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::actor::CompanyId;
use super::transition::TransitionError;

/// Identifier wrapper for posted vacancies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VacancyId(pub String);

/// Visibility and availability of a vacancy.
///
/// `PendingReview -> Open -> {Closed | InProcess | Filled}`. `Closed` and `Filled`
/// accept no further lifecycle moves apart from the administrative overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VacancyStatus {
    PendingReview,
    Open,
    Closed,
    InProcess,
    Filled,
}

impl VacancyStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::PendingReview => "pending_review",
            Self::Open => "open",
            Self::Closed => "closed",
            Self::InProcess => "in_process",
            Self::Filled => "filled",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Filled)
    }
}

/// A company-posted internship opening.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vacancy {
    pub id: VacancyId,
    pub company: CompanyId,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub status: VacancyStatus,
}

impl Vacancy {
    /// New postings always wait for university review.
    pub fn submit(
        id: VacancyId,
        company: CompanyId,
        title: String,
        description: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            company,
            title,
            description,
            created_at,
            status: VacancyStatus::PendingReview,
        }
    }

    pub fn is_owned_by(&self, company: &CompanyId) -> bool {
        &self.company == company
    }

    pub fn accepts_applications(&self) -> bool {
        self.status == VacancyStatus::Open
    }

    pub fn approve(&mut self) -> Result<(), TransitionError> {
        match self.status {
            VacancyStatus::PendingReview => {
                self.status = VacancyStatus::Open;
                Ok(())
            }
            other => Err(self.refuse(other, "approve")),
        }
    }

    /// Administrative override: closes the vacancy whatever its current state.
    /// Returns the state it was forced out of.
    pub fn reject(&mut self) -> VacancyStatus {
        std::mem::replace(&mut self.status, VacancyStatus::Closed)
    }

    /// Owner-initiated close. Ownership is checked by the caller.
    pub fn close(&mut self) -> Result<(), TransitionError> {
        match self.status {
            VacancyStatus::Open | VacancyStatus::PendingReview => {
                self.status = VacancyStatus::Closed;
                Ok(())
            }
            other => Err(self.refuse(other, "close")),
        }
    }

    /// Applied when one of the vacancy's applications receives final approval.
    pub fn mark_filled(&mut self) -> VacancyStatus {
        std::mem::replace(&mut self.status, VacancyStatus::Filled)
    }

    fn refuse(&self, from: VacancyStatus, action: &'static str) -> TransitionError {
        TransitionError {
            entity: "vacancy",
            id: self.id.0.clone(),
            from: from.label(),
            action,
        }
    }
}
