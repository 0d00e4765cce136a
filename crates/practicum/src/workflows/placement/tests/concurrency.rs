use std::thread;

use super::common::*;

use crate::workflows::placement::repository::PlacementRepository;
use crate::workflows::placement::service::PlacementError;
use crate::workflows::placement::vacancy::VacancyStatus;

#[test]
fn racing_company_decisions_commit_exactly_one() {
    let (service, store) = build_gated_service();
    let vacancy = open_vacancy(&service);
    let application = service.apply(&ana(), &vacancy.id).expect("applied");
    store.arm(2);

    let (approved, rejected) = thread::scope(|scope| {
        let approve = scope.spawn(|| {
            service.company_approve(&acme(), &application.id, Some("strong interview"))
        });
        let reject = scope.spawn(|| {
            service.company_reject(&acme(), &application.id, "position filled internally")
        });
        (
            approve.join().expect("approve thread"),
            reject.join().expect("reject thread"),
        )
    });
    store.disarm();

    assert_ne!(approved.is_ok(), rejected.is_ok(), "exactly one decision lands");
    let refused = approved
        .as_ref()
        .err()
        .or(rejected.as_ref().err())
        .expect("one decision refused");
    assert!(matches!(refused, PlacementError::InvalidStateTransition(_)));

    let stored = store
        .fetch_application(&application.id)
        .expect("fetch")
        .expect("application stored");
    let history = service.history(&admin(), &application.id).expect("history");
    assert_eq!(history.len(), 2);
    assert_eq!(history.last().map(|entry| entry.status), Some(stored.status));
}

#[test]
fn racing_duplicate_applications_store_one() {
    let (service, store) = build_gated_service();
    let vacancy = open_vacancy(&service);
    store.arm(2);

    let results = thread::scope(|scope| {
        let handles: Vec<_> = (0..2)
            .map(|_| scope.spawn(|| service.apply(&ana(), &vacancy.id)))
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("apply thread"))
            .collect::<Vec<_>>()
    });
    store.disarm();

    assert_eq!(results.iter().filter(|result| result.is_ok()).count(), 1);
    assert!(results
        .iter()
        .any(|result| matches!(result, Err(PlacementError::Conflict { .. }))));
    assert_eq!(store.inner().application_count().expect("count"), 1);
}

#[test]
fn racing_vacancy_review_and_withdrawal_keep_one_outcome() {
    let (service, store) = build_gated_service();
    let vacancy = service
        .submit_vacancy(&acme(), draft())
        .expect("vacancy submitted");
    store.arm(2);

    let (approved, closed) = thread::scope(|scope| {
        let approve = scope.spawn(|| service.approve_vacancy(&admin(), &vacancy.id));
        let close = scope.spawn(|| service.close_vacancy(&acme(), &vacancy.id));
        (
            approve.join().expect("approve thread"),
            close.join().expect("close thread"),
        )
    });
    store.disarm();

    assert_ne!(approved.is_ok(), closed.is_ok(), "exactly one review lands");
    let stored = store
        .fetch_vacancy(&vacancy.id)
        .expect("fetch")
        .expect("vacancy stored");
    let expected = if approved.is_ok() {
        VacancyStatus::Open
    } else {
        VacancyStatus::Closed
    };
    assert_eq!(stored.status, expected);
}

