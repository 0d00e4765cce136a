use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::actor::StudentId;
use super::transition::TransitionError;
use super::vacancy::VacancyId;

/// Identifier wrapper for student applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

/// Where an application sits between the company and the university.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Received,
    CompanyReview,
    UniversityReview,
    Approved,
    RejectedByCompany,
    RejectedByUniversity,
    CompletedByCompany,
    Cancelled,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::CompanyReview => "company_review",
            Self::UniversityReview => "university_review",
            Self::Approved => "approved",
            Self::RejectedByCompany => "rejected_by_company",
            Self::RejectedByUniversity => "rejected_by_university",
            Self::CompletedByCompany => "completed_by_company",
            Self::Cancelled => "cancelled",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::RejectedByCompany
                | Self::RejectedByUniversity
                | Self::CompletedByCompany
                | Self::Cancelled
        )
    }

    /// States that represent an internship which was actually granted.
    pub const fn placement_states() -> [Self; 3] {
        [Self::Approved, Self::CompletedByCompany, Self::Cancelled]
    }
}

/// Agreed internship window, set on final approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PracticePeriod {
    start: NaiveDate,
    end: NaiveDate,
}

impl PracticePeriod {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (end >= start).then_some(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

/// Every state-changing move an actor can request on an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationAction {
    CompanyApprove,
    CompanyReject,
    UniversityApprove(PracticePeriod),
    UniversityReject,
    CompanyComplete,
    CompanyCancel,
    UniversityCancel,
}

impl ApplicationAction {
    pub const fn verb(&self) -> &'static str {
        match self {
            Self::CompanyApprove => "company-approve",
            Self::CompanyReject => "company-reject",
            Self::UniversityApprove(_) => "university-approve",
            Self::UniversityReject => "university-reject",
            Self::CompanyComplete => "complete",
            Self::CompanyCancel => "company-cancel",
            Self::UniversityCancel => "university-cancel",
        }
    }

    pub const fn allowed_from(&self) -> &'static [ApplicationStatus] {
        match self {
            Self::CompanyApprove | Self::CompanyReject => &[ApplicationStatus::Received],
            Self::UniversityApprove(_) | Self::UniversityReject => {
                &[ApplicationStatus::UniversityReview]
            }
            Self::CompanyComplete | Self::CompanyCancel | Self::UniversityCancel => {
                &[ApplicationStatus::Approved]
            }
        }
    }

    pub const fn target(&self) -> ApplicationStatus {
        match self {
            Self::CompanyApprove => ApplicationStatus::UniversityReview,
            Self::CompanyReject => ApplicationStatus::RejectedByCompany,
            Self::UniversityApprove(_) => ApplicationStatus::Approved,
            Self::UniversityReject => ApplicationStatus::RejectedByUniversity,
            Self::CompanyComplete => ApplicationStatus::CompletedByCompany,
            Self::CompanyCancel | Self::UniversityCancel => ApplicationStatus::Cancelled,
        }
    }

    pub const fn requires_comment(&self) -> bool {
        !matches!(self, Self::CompanyApprove | Self::UniversityApprove(_))
    }
}

/// A student's request to fill a specific vacancy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub student: StudentId,
    pub vacancy: VacancyId,
    pub created_at: DateTime<Utc>,
    pub status: ApplicationStatus,
    pub practice_start: Option<NaiveDate>,
    pub practice_end: Option<NaiveDate>,
}

impl Application {
    pub fn receive(
        id: ApplicationId,
        student: StudentId,
        vacancy: VacancyId,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            student,
            vacancy,
            created_at,
            status: ApplicationStatus::Received,
            practice_start: None,
            practice_end: None,
        }
    }

    /// Moves the application according to `action`, returning the prior state.
    /// Practice dates are written only by final approval.
    pub fn transition(
        &mut self,
        action: ApplicationAction,
    ) -> Result<ApplicationStatus, TransitionError> {
        let from = self.status;
        if !action.allowed_from().contains(&from) {
            return Err(TransitionError {
                entity: "application",
                id: self.id.0.clone(),
                from: from.label(),
                action: action.verb(),
            });
        }

        if let ApplicationAction::UniversityApprove(period) = action {
            self.practice_start = Some(period.start());
            self.practice_end = Some(period.end());
        }
        self.status = action.target();
        Ok(from)
    }

    pub fn practice_period(&self) -> Option<PracticePeriod> {
        match (self.practice_start, self.practice_end) {
            (Some(start), Some(end)) => PracticePeriod::new(start, end),
            _ => None,
        }
    }
}
