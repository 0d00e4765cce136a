use std::collections::HashMap;
use std::sync::{Arc, Barrier, Mutex};

use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::workflows::placement::actor::{
    ActorRef, AuthError, Credential, IdentityResolver, UniversityRole,
};
use crate::workflows::placement::application::{Application, ApplicationId};
use crate::workflows::placement::document::DocumentRecord;
use crate::workflows::placement::history::HistoryEntry;
use crate::workflows::placement::memory::InMemoryPlacementStore;
use crate::workflows::placement::repository::{
    ApplicationFilter, PlacementRepository, RepositoryError, TransitionCommit, VacancyFilter,
};
use crate::workflows::placement::router::placement_router;
use crate::workflows::placement::service::{PlacementApproval, PlacementService, VacancyDraft};
use crate::workflows::placement::vacancy::{Vacancy, VacancyId, VacancyStatus};

pub(super) const ADMIN_TOKEN: &str = "admin-token";
pub(super) const ASSISTANT_TOKEN: &str = "assistant-token";
pub(super) const ACME_TOKEN: &str = "acme-token";
pub(super) const GLOBEX_TOKEN: &str = "globex-token";
pub(super) const ANA_TOKEN: &str = "ana-token";
pub(super) const BEN_TOKEN: &str = "ben-token";

pub(super) fn admin() -> ActorRef {
    ActorRef::university("uni-admin", UniversityRole::Administrator)
}

pub(super) fn coordinator() -> ActorRef {
    ActorRef::university("uni-coord", UniversityRole::Coordinator)
}

pub(super) fn assistant() -> ActorRef {
    ActorRef::university("uni-assist", UniversityRole::Assistant)
}

pub(super) fn acme() -> ActorRef {
    ActorRef::company("acme")
}

pub(super) fn globex() -> ActorRef {
    ActorRef::company("globex")
}

pub(super) fn ana() -> ActorRef {
    ActorRef::student("ana")
}

pub(super) fn ben() -> ActorRef {
    ActorRef::student("ben")
}

pub(super) fn draft() -> VacancyDraft {
    VacancyDraft {
        title: "Backend intern".to_string(),
        description: "Six months on the billing platform".to_string(),
    }
}

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn approval() -> PlacementApproval {
    PlacementApproval {
        practice_start: date(2025, 2, 3),
        practice_end: date(2025, 7, 31),
        comment: None,
    }
}

pub(super) fn build_service() -> (
    PlacementService<InMemoryPlacementStore>,
    Arc<InMemoryPlacementStore>,
) {
    let store = Arc::new(InMemoryPlacementStore::default());
    let service = PlacementService::new(store.clone());
    (service, store)
}

/// Vacancy posted by Acme and opened by the administrator.
pub(super) fn open_vacancy<R>(service: &PlacementService<R>) -> Vacancy
where
    R: PlacementRepository + 'static,
{
    let vacancy = service
        .submit_vacancy(&acme(), draft())
        .expect("vacancy submitted");
    service
        .approve_vacancy(&admin(), &vacancy.id)
        .expect("vacancy approved")
}

/// Ana's application to a fresh Acme vacancy, waiting for university sign-off.
pub(super) fn application_in_university_review<R>(
    service: &PlacementService<R>,
) -> (Vacancy, Application)
where
    R: PlacementRepository + 'static,
{
    let vacancy = open_vacancy(service);
    let application = service.apply(&ana(), &vacancy.id).expect("applied");
    let application = service
        .company_approve(&acme(), &application.id, Some("strong interview"))
        .expect("company approved");
    (vacancy, application)
}

pub(super) fn approved_application<R>(service: &PlacementService<R>) -> (Vacancy, Application)
where
    R: PlacementRepository + 'static,
{
    let (vacancy, application) = application_in_university_review(service);
    let application = service
        .university_approve(&admin(), &application.id, approval())
        .expect("university approved");
    (vacancy, application)
}

/// Token table standing in for the account service.
pub(super) struct StaticResolver {
    actors: HashMap<String, ActorRef>,
}

impl Default for StaticResolver {
    fn default() -> Self {
        let actors = [
            (ADMIN_TOKEN, admin()),
            (ASSISTANT_TOKEN, assistant()),
            (ACME_TOKEN, acme()),
            (GLOBEX_TOKEN, globex()),
            (ANA_TOKEN, ana()),
            (BEN_TOKEN, ben()),
        ]
        .into_iter()
        .map(|(token, actor)| (token.to_string(), actor))
        .collect();
        Self { actors }
    }
}

impl IdentityResolver for StaticResolver {
    fn resolve(&self, credential: &Credential) -> Result<ActorRef, AuthError> {
        self.actors
            .get(&credential.0)
            .cloned()
            .ok_or(AuthError::InvalidCredential)
    }
}

pub(super) fn router_with_service<R>(service: PlacementService<R>) -> axum::Router
where
    R: PlacementRepository + 'static,
{
    placement_router(Arc::new(service), Arc::new(StaticResolver::default()))
}

pub(super) fn request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).expect("serialize body")))
            .expect("request builds"),
        None => builder.body(Body::empty()).expect("request builds"),
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) struct UnavailableRepository;

fn offline() -> RepositoryError {
    RepositoryError::Unavailable("database offline".to_string())
}

impl PlacementRepository for UnavailableRepository {
    fn insert_vacancy(&self, _vacancy: Vacancy) -> Result<Vacancy, RepositoryError> {
        Err(offline())
    }

    fn update_vacancy(
        &self,
        _vacancy: Vacancy,
        _expected: VacancyStatus,
    ) -> Result<(), RepositoryError> {
        Err(offline())
    }

    fn fetch_vacancy(&self, _id: &VacancyId) -> Result<Option<Vacancy>, RepositoryError> {
        Err(offline())
    }

    fn list_vacancies(&self, _filter: &VacancyFilter) -> Result<Vec<Vacancy>, RepositoryError> {
        Err(offline())
    }

    fn insert_application(
        &self,
        _application: Application,
        _entry: HistoryEntry,
    ) -> Result<Application, RepositoryError> {
        Err(offline())
    }

    fn commit_transition(&self, _commit: TransitionCommit) -> Result<(), RepositoryError> {
        Err(offline())
    }

    fn fetch_application(
        &self,
        _id: &ApplicationId,
    ) -> Result<Option<Application>, RepositoryError> {
        Err(offline())
    }

    fn list_applications(
        &self,
        _filter: &ApplicationFilter,
    ) -> Result<Vec<Application>, RepositoryError> {
        Err(offline())
    }

    fn append_history(&self, _entry: HistoryEntry) -> Result<HistoryEntry, RepositoryError> {
        Err(offline())
    }

    fn history(&self, _application: &ApplicationId) -> Result<Vec<HistoryEntry>, RepositoryError> {
        Err(offline())
    }

    fn insert_document(&self, _document: DocumentRecord) -> Result<DocumentRecord, RepositoryError> {
        Err(offline())
    }

    fn documents(
        &self,
        _application: &ApplicationId,
    ) -> Result<Vec<DocumentRecord>, RepositoryError> {
        Err(offline())
    }
}

/// In-memory store whose writes wait on a shared barrier once armed, so racing
/// callers both finish their reads before either one writes.
#[derive(Debug, Default)]
pub(super) struct GatedStore {
    inner: InMemoryPlacementStore,
    gate: Mutex<Option<Arc<Barrier>>>,
}

impl GatedStore {
    pub(super) fn arm(&self, parties: usize) {
        *self.gate.lock().expect("gate lock") = Some(Arc::new(Barrier::new(parties)));
    }

    pub(super) fn disarm(&self) {
        *self.gate.lock().expect("gate lock") = None;
    }

    pub(super) fn inner(&self) -> &InMemoryPlacementStore {
        &self.inner
    }

    fn wait(&self) {
        let gate = self.gate.lock().expect("gate lock").clone();
        if let Some(barrier) = gate {
            barrier.wait();
        }
    }
}

impl PlacementRepository for GatedStore {
    fn insert_vacancy(&self, vacancy: Vacancy) -> Result<Vacancy, RepositoryError> {
        self.inner.insert_vacancy(vacancy)
    }

    fn update_vacancy(
        &self,
        vacancy: Vacancy,
        expected: VacancyStatus,
    ) -> Result<(), RepositoryError> {
        self.wait();
        self.inner.update_vacancy(vacancy, expected)
    }

    fn fetch_vacancy(&self, id: &VacancyId) -> Result<Option<Vacancy>, RepositoryError> {
        self.inner.fetch_vacancy(id)
    }

    fn list_vacancies(&self, filter: &VacancyFilter) -> Result<Vec<Vacancy>, RepositoryError> {
        self.inner.list_vacancies(filter)
    }

    fn insert_application(
        &self,
        application: Application,
        entry: HistoryEntry,
    ) -> Result<Application, RepositoryError> {
        self.wait();
        self.inner.insert_application(application, entry)
    }

    fn commit_transition(&self, commit: TransitionCommit) -> Result<(), RepositoryError> {
        self.wait();
        self.inner.commit_transition(commit)
    }

    fn fetch_application(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        self.inner.fetch_application(id)
    }

    fn list_applications(
        &self,
        filter: &ApplicationFilter,
    ) -> Result<Vec<Application>, RepositoryError> {
        self.inner.list_applications(filter)
    }

    fn append_history(&self, entry: HistoryEntry) -> Result<HistoryEntry, RepositoryError> {
        self.inner.append_history(entry)
    }

    fn history(&self, application: &ApplicationId) -> Result<Vec<HistoryEntry>, RepositoryError> {
        self.inner.history(application)
    }

    fn insert_document(&self, document: DocumentRecord) -> Result<DocumentRecord, RepositoryError> {
        self.inner.insert_document(document)
    }

    fn documents(&self, application: &ApplicationId) -> Result<Vec<DocumentRecord>, RepositoryError> {
        self.inner.documents(application)
    }
}

pub(super) fn build_gated_service() -> (PlacementService<GatedStore>, Arc<GatedStore>) {
    let store = Arc::new(GatedStore::default());
    let service = PlacementService::new(store.clone());
    (service, store)
}
