//! Append-only audit trail for applications.
//!
//! Every state change and every explicit comment produces one [`HistoryEntry`]. Entries
//! carry the application's state at the time they were written and at most one actor.
//! Nothing in this crate edits or removes an entry once it is persisted.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::actor::{ActorRef, CompanyId, StudentId, UniversityUserId};
use super::application::{Application, ApplicationId, ApplicationStatus};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HistoryId(pub String);

static HISTORY_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_history_id() -> HistoryId {
    let id = HISTORY_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    HistoryId(format!("hst-{id:06}"))
}

/// Who an entry is attributed to. The enum makes the slots mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Attribution {
    University(UniversityUserId),
    Company(CompanyId),
    Student(StudentId),
    System,
}

impl From<&ActorRef> for Attribution {
    fn from(actor: &ActorRef) -> Self {
        match actor {
            ActorRef::University { id, .. } => Self::University(id.clone()),
            ActorRef::Company { id } => Self::Company(id.clone()),
            ActorRef::Student { id } => Self::Student(id.clone()),
        }
    }
}

impl Attribution {
    pub fn university(&self) -> Option<&UniversityUserId> {
        match self {
            Self::University(id) => Some(id),
            _ => None,
        }
    }

    pub fn company(&self) -> Option<&CompanyId> {
        match self {
            Self::Company(id) => Some(id),
            _ => None,
        }
    }

    pub fn student(&self) -> Option<&StudentId> {
        match self {
            Self::Student(id) => Some(id),
            _ => None,
        }
    }
}

/// One immutable audit record of an application's state or commentary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: HistoryId,
    pub application: ApplicationId,
    pub status: ApplicationStatus,
    pub recorded_at: DateTime<Utc>,
    pub comment: Option<String>,
    pub attribution: Attribution,
}

impl HistoryEntry {
    /// Snapshot of `application` as it stands now, stamped with the server clock.
    /// `None` as actor marks a system-triggered entry.
    pub fn record(
        application: &Application,
        comment: Option<&str>,
        actor: Option<&ActorRef>,
    ) -> Self {
        Self {
            id: next_history_id(),
            application: application.id.clone(),
            status: application.status,
            recorded_at: Utc::now(),
            comment: normalize_comment(comment),
            attribution: actor.map(Attribution::from).unwrap_or(Attribution::System),
        }
    }

    pub fn view(&self) -> HistoryEntryView {
        HistoryEntryView {
            id: self.id.clone(),
            application_id: self.application.clone(),
            status: self.status.label(),
            recorded_at: self.recorded_at,
            comment: self.comment.clone(),
            university_actor: self.attribution.university().cloned(),
            company_actor: self.attribution.company().cloned(),
            student_actor: self.attribution.student().cloned(),
        }
    }
}

pub(crate) fn normalize_comment(comment: Option<&str>) -> Option<String> {
    comment
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

/// Orders entries by timestamp; entries sharing a timestamp keep insertion order.
pub fn chronological(mut entries: Vec<HistoryEntry>) -> Vec<HistoryEntry> {
    entries.sort_by_key(|entry| entry.recorded_at);
    entries
}

/// Flattened projection with one optional slot per actor kind.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntryView {
    pub id: HistoryId,
    pub application_id: ApplicationId,
    pub status: &'static str,
    pub recorded_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub university_actor: Option<UniversityUserId>,
    pub company_actor: Option<CompanyId>,
    pub student_actor: Option<StudentId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::placement::actor::UniversityRole;
    use crate::workflows::placement::vacancy::VacancyId;
    use chrono::Duration;

    fn application() -> Application {
        Application::receive(
            ApplicationId("pst-history".to_string()),
            StudentId("stu-1".to_string()),
            VacancyId("vac-1".to_string()),
            Utc::now(),
        )
    }

    #[test]
    fn record_captures_current_state_and_single_actor() {
        let application = application();
        let actor = ActorRef::university("adm-1", UniversityRole::Coordinator);

        let entry = HistoryEntry::record(&application, Some("  looks good "), Some(&actor));

        assert_eq!(entry.status, ApplicationStatus::Received);
        assert_eq!(entry.comment.as_deref(), Some("looks good"));
        let view = entry.view();
        assert_eq!(
            view.university_actor,
            Some(UniversityUserId("adm-1".to_string()))
        );
        assert!(view.company_actor.is_none());
        assert!(view.student_actor.is_none());
    }

    #[test]
    fn system_entries_have_no_actor() {
        let entry = HistoryEntry::record(&application(), None, None);
        assert_eq!(entry.attribution, Attribution::System);
        let view = entry.view();
        assert!(view.university_actor.is_none());
        assert!(view.company_actor.is_none());
        assert!(view.student_actor.is_none());
    }

    #[test]
    fn blank_comments_are_dropped() {
        assert_eq!(normalize_comment(Some("   ")), None);
        assert_eq!(normalize_comment(None), None);
    }

    #[test]
    fn chronological_is_stable_for_equal_timestamps() {
        let application = application();
        let mut first = HistoryEntry::record(&application, Some("first"), None);
        let mut second = HistoryEntry::record(&application, Some("second"), None);
        let mut earliest = HistoryEntry::record(&application, Some("earliest"), None);
        let now = Utc::now();
        first.recorded_at = now;
        second.recorded_at = now;
        earliest.recorded_at = now - Duration::seconds(5);

        let ordered = chronological(vec![first, second, earliest]);
        let comments: Vec<_> = ordered
            .iter()
            .filter_map(|entry| entry.comment.as_deref())
            .collect();
        assert_eq!(comments, vec!["earliest", "first", "second"]);
    }
}
