//! Internship placement lifecycle.
//!
//! Companies post vacancies, the university reviews them, students apply, and each
//! application passes company review and university sign-off before becoming a
//! placement. Every application state change lands in an append-only history.

pub mod actor;
pub mod application;
pub mod bootstrap;
pub mod document;
pub mod history;
pub mod memory;
pub mod projection;
pub mod repository;
pub mod router;
pub mod service;
pub mod transition;
pub mod vacancy;

#[cfg(test)]
mod tests;

pub use actor::{
    ActorRef, AuthError, CompanyId, Credential, IdentityResolver, StudentId, UniversityRole,
    UniversityUserId,
};
pub use application::{
    Application, ApplicationAction, ApplicationId, ApplicationStatus, PracticePeriod,
};
pub use bootstrap::{
    ensure_first_admin, BootstrapError, BootstrapOutcome, NewUniversityUser, UniversityDirectory,
    UniversityUser,
};
pub use document::{DocumentDescriptor, DocumentId, DocumentKind, DocumentRecord};
pub use history::{Attribution, HistoryEntry, HistoryEntryView, HistoryId};
pub use memory::InMemoryPlacementStore;
pub use projection::{
    ApplicationDossier, ApplicationView, PlacementQueries, PlacementView, VacancyView,
};
pub use repository::{
    ApplicationFilter, PlacementRepository, RepositoryError, TransitionCommit, VacancyFilter,
};
pub use router::{bearer_credential, placement_router, CommentRequest, PlacementState};
pub use service::{PlacementApproval, PlacementError, PlacementService, VacancyDraft};
pub use transition::TransitionError;
pub use vacancy::{Vacancy, VacancyId, VacancyStatus};
