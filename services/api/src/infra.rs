use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use practicum::config::BootstrapConfig;
use practicum::workflows::placement::{
    ensure_first_admin, ActorRef, AuthError, BootstrapError, BootstrapOutcome, CompanyId,
    Credential, IdentityResolver, NewUniversityUser, RepositoryError, StudentId,
    UniversityDirectory, UniversityUser, UniversityUserId,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Company registered by university staff. The tax id is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct CompanyAccount {
    pub(crate) id: CompanyId,
    pub(crate) name: String,
    pub(crate) tax_id: String,
}

/// Student registered by university staff. The institutional email is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct StudentAccount {
    pub(crate) id: StudentId,
    pub(crate) name: String,
    pub(crate) email: String,
}

#[derive(Default)]
struct DirectoryState {
    tokens: HashMap<String, ActorRef>,
    university_users: Vec<UniversityUser>,
    companies: Vec<CompanyAccount>,
    students: Vec<StudentAccount>,
}

/// Process-local account directory: bearer tokens, university staff, companies, students.
#[derive(Default, Clone)]
pub(crate) struct InMemoryIdentityDirectory {
    state: Arc<Mutex<DirectoryState>>,
}

impl InMemoryIdentityDirectory {
    fn lock(&self) -> Result<MutexGuard<'_, DirectoryState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("directory mutex poisoned".to_string()))
    }

    pub(crate) fn register_token(
        &self,
        token: impl Into<String>,
        actor: ActorRef,
    ) -> Result<(), RepositoryError> {
        self.lock()?.tokens.insert(token.into(), actor);
        Ok(())
    }

    /// Binds a fresh random token to `actor` and returns it.
    pub(crate) fn issue_token(&self, actor: ActorRef) -> Result<String, RepositoryError> {
        let token = Uuid::new_v4().simple().to_string();
        self.register_token(token.clone(), actor)?;
        Ok(token)
    }

    pub(crate) fn register_company(
        &self,
        name: String,
        tax_id: String,
    ) -> Result<CompanyAccount, RepositoryError> {
        let mut state = self.lock()?;
        if state.companies.iter().any(|existing| existing.tax_id == tax_id) {
            return Err(RepositoryError::Conflict);
        }

        let account = CompanyAccount {
            id: CompanyId(format!("cmp-{:04}", state.companies.len() + 1)),
            name,
            tax_id,
        };
        state.companies.push(account.clone());
        Ok(account)
    }

    pub(crate) fn register_student(
        &self,
        name: String,
        email: String,
    ) -> Result<StudentAccount, RepositoryError> {
        let mut state = self.lock()?;
        if state
            .students
            .iter()
            .any(|existing| existing.email.eq_ignore_ascii_case(&email))
        {
            return Err(RepositoryError::Conflict);
        }

        let account = StudentAccount {
            id: StudentId(format!("std-{:04}", state.students.len() + 1)),
            name,
            email,
        };
        state.students.push(account.clone());
        Ok(account)
    }
}

impl IdentityResolver for InMemoryIdentityDirectory {
    fn resolve(&self, credential: &Credential) -> Result<ActorRef, AuthError> {
        let state = self.lock().map_err(|_| AuthError::InvalidCredential)?;
        state
            .tokens
            .get(&credential.0)
            .cloned()
            .ok_or(AuthError::InvalidCredential)
    }
}

impl UniversityDirectory for InMemoryIdentityDirectory {
    fn university_user_count(&self) -> Result<usize, RepositoryError> {
        Ok(self.lock()?.university_users.len())
    }

    fn register_university_user(
        &self,
        user: NewUniversityUser,
    ) -> Result<UniversityUser, RepositoryError> {
        let mut state = self.lock()?;
        if state
            .university_users
            .iter()
            .any(|existing| existing.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(RepositoryError::Conflict);
        }

        let stored = UniversityUser {
            id: UniversityUserId(format!("uni-{:04}", state.university_users.len() + 1)),
            name: user.name,
            email: user.email,
            role: user.role,
        };
        state.university_users.push(stored.clone());
        Ok(stored)
    }
}

/// Registers the configured administrator on an empty directory and binds its token.
pub(crate) fn bootstrap_admin(
    directory: &InMemoryIdentityDirectory,
    config: &BootstrapConfig,
) -> Result<BootstrapOutcome, BootstrapError> {
    let outcome = ensure_first_admin(directory, config.new_admin())?;
    if let BootstrapOutcome::Created(user) = &outcome {
        directory.register_token(
            config.admin_token.clone(),
            ActorRef::University {
                id: user.id.clone(),
                role: user.role,
            },
        )?;
    }
    Ok(outcome)
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
