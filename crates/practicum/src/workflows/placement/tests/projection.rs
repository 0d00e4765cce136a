use super::common::*;

use crate::workflows::placement::application::ApplicationStatus;
use crate::workflows::placement::document::{DocumentDescriptor, DocumentKind};
use crate::workflows::placement::service::PlacementError;
use crate::workflows::placement::vacancy::VacancyId;

#[test]
fn open_vacancies_hide_pending_and_closed_postings() {
    let (service, _) = build_service();
    let open = open_vacancy(&service);
    let pending = service.submit_vacancy(&globex(), draft()).expect("submitted");
    let closed = open_vacancy(&service);
    service
        .close_vacancy(&acme(), &closed.id)
        .expect("owner closes");

    let listed = service.queries().open_vacancies(&ana()).expect("listing");
    let ids: Vec<_> = listed.iter().map(|view| view.id.clone()).collect();
    assert_eq!(ids, vec![open.id]);
    assert!(listed.iter().all(|view| view.status == "open"));
    assert!(!ids.contains(&pending.id));
}

#[test]
fn pending_vacancies_are_a_reviewer_queue() {
    let (service, _) = build_service();
    let pending = service.submit_vacancy(&globex(), draft()).expect("submitted");
    open_vacancy(&service);

    let queue = service
        .queries()
        .pending_vacancies(&admin())
        .expect("reviewer queue");
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].id, pending.id);

    let result = service.queries().pending_vacancies(&assistant());
    assert!(matches!(result, Err(PlacementError::Forbidden(_))));
}

#[test]
fn company_sees_only_its_own_postings() {
    let (service, _) = build_service();
    open_vacancy(&service);
    service.submit_vacancy(&acme(), draft()).expect("submitted");
    service.submit_vacancy(&globex(), draft()).expect("submitted");

    let acme_view = service.queries().company_vacancies(&acme()).expect("listing");
    assert_eq!(acme_view.len(), 2);
    assert!(acme_view.iter().all(|view| view.company_id.0 == "acme"));

    let result = service.queries().company_vacancies(&ana());
    assert!(matches!(result, Err(PlacementError::Forbidden(_))));
}

#[test]
fn application_listings_are_scoped_to_the_caller() {
    let (service, _) = build_service();
    let acme_vacancy = open_vacancy(&service);
    let globex_vacancy = service.submit_vacancy(&globex(), draft()).expect("submitted");
    service
        .approve_vacancy(&admin(), &globex_vacancy.id)
        .expect("approved");

    service.apply(&ana(), &acme_vacancy.id).expect("applied");
    service.apply(&ana(), &globex_vacancy.id).expect("applied");
    service.apply(&ben(), &acme_vacancy.id).expect("applied");

    let ana_view = service.queries().student_applications(&ana()).expect("own");
    assert_eq!(ana_view.len(), 2);
    assert!(ana_view.iter().all(|view| view.student_id.0 == "ana"));

    let acme_view = service.queries().company_applications(&acme()).expect("own");
    assert_eq!(acme_view.len(), 2);
    assert!(acme_view
        .iter()
        .all(|view| view.vacancy_id == acme_vacancy.id));
}

#[test]
fn views_flag_records_that_left_the_lifecycle() {
    let (service, _) = build_service();
    let open = open_vacancy(&service);
    let closed = open_vacancy(&service);
    service
        .close_vacancy(&acme(), &closed.id)
        .expect("owner closes");
    let waiting = service.apply(&ana(), &open.id).expect("applied");
    let refused = service.apply(&ben(), &open.id).expect("applied");
    service
        .company_reject(&acme(), &refused.id, "profile mismatch")
        .expect("rejected");

    let vacancies = service.queries().company_vacancies(&acme()).expect("listing");
    let flag_of = |id: &VacancyId| {
        vacancies
            .iter()
            .find(|view| &view.id == id)
            .map(|view| view.is_final)
    };
    assert_eq!(flag_of(&open.id), Some(false));
    assert_eq!(flag_of(&closed.id), Some(true));

    let applications = service.queries().company_applications(&acme()).expect("listing");
    for view in &applications {
        assert_eq!(view.is_final, view.id == refused.id, "{}", view.id.0);
    }
    assert!(applications.iter().any(|view| view.id == waiting.id));
}

#[test]
fn university_review_queue_lists_company_approved_applications() {
    let (service, _) = build_service();
    let (_, waiting) = application_in_university_review(&service);
    let vacancy = open_vacancy(&service);
    service.apply(&ben(), &vacancy.id).expect("applied");

    let queue = service
        .queries()
        .pending_university_review(&coordinator())
        .expect("queue");
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].id, waiting.id);
    assert_eq!(queue[0].status, "university_review");
}

#[test]
fn placement_ledger_lists_granted_internships() {
    let (service, _) = build_service();
    let (vacancy, approved) = approved_application(&service);
    let (_, cancelled) = approved_application(&service);
    service
        .university_cancel(&admin(), &cancelled.id, "student withdrew")
        .expect("cancelled");
    application_in_university_review(&service);

    let ledger = service.queries().placements(&admin()).expect("ledger");
    assert_eq!(ledger.len(), 2);
    let first = &ledger[0];
    assert_eq!(first.application_id, approved.id);
    assert_eq!(first.vacancy_title, vacancy.title);
    assert_eq!(first.practice_start, Some(date(2025, 2, 3)));
    assert_eq!(ledger[1].status, ApplicationStatus::Cancelled.label());
    assert_eq!(ledger[1].practice_end, Some(date(2025, 7, 31)));

    let globex_view = service.queries().placements(&globex()).expect("own ledger");
    assert!(globex_view.is_empty());

    let result = service.queries().placements(&assistant());
    assert!(matches!(result, Err(PlacementError::Forbidden(_))));
}

#[test]
fn dossier_bundles_history_and_documents_for_involved_parties() {
    let (service, _) = build_service();
    let (_, application) = application_in_university_review(&service);
    service
        .attach_document(
            &ana(),
            &application.id,
            DocumentDescriptor {
                name: "transcript.pdf".to_string(),
                kind: DocumentKind::AcademicTranscript,
                storage_key: "uploads/ana/transcript.pdf".to_string(),
            },
        )
        .expect("attached");

    let dossier = service
        .queries()
        .dossier(&acme(), &application.id)
        .expect("hiring company sees dossier");
    assert_eq!(dossier.application.status, "university_review");
    assert_eq!(dossier.history.len(), 2);
    assert_eq!(dossier.history[1].company_actor.as_ref().map(|id| id.0.as_str()), Some("acme"));
    assert_eq!(dossier.documents.len(), 1);

    service
        .queries()
        .dossier(&ana(), &application.id)
        .expect("applicant sees dossier");
    service
        .queries()
        .dossier(&admin(), &application.id)
        .expect("reviewer sees dossier");

    for actor in [ben(), globex(), assistant()] {
        let result = service.queries().dossier(&actor, &application.id);
        assert!(matches!(result, Err(PlacementError::Forbidden(_))));
    }
}
