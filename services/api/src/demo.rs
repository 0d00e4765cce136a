use crate::infra::parse_date;
use chrono::{Local, NaiveDate};
use clap::Args;
use practicum::error::AppError;
use practicum::workflows::placement::{
    ActorRef, Application, HistoryEntry, InMemoryPlacementStore, PlacementApproval,
    PlacementError, PlacementService, UniversityRole, VacancyDraft,
};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// First day of the internship (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) practice_start: Option<NaiveDate>,
    /// Last day of the internship (YYYY-MM-DD). Defaults to practice_start + 120 days.
    #[arg(long, value_parser = parse_date)]
    pub(crate) practice_end: Option<NaiveDate>,
    /// Stop after the company approval so the application stays in university review.
    #[arg(long)]
    pub(crate) skip_university: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        practice_start,
        practice_end,
        skip_university,
    } = args;

    let practice_start = practice_start.unwrap_or_else(|| Local::now().date_naive());
    let practice_end =
        practice_end.unwrap_or_else(|| practice_start + chrono::Duration::days(120));

    let store = Arc::new(InMemoryPlacementStore::default());
    let service = PlacementService::new(store);
    let coordinator = ActorRef::university("uni-0001", UniversityRole::Coordinator);
    let company = ActorRef::company("acme-labs");
    let student = ActorRef::student("stu-ana");

    println!("Internship placement demo");
    let vacancy = service.submit_vacancy(
        &company,
        VacancyDraft {
            title: "Backend engineering intern".to_string(),
            description: "Build billing integrations alongside the platform team".to_string(),
        },
    )?;
    println!(
        "- {} submitted vacancy {} ({})",
        company,
        vacancy.id.0,
        vacancy.status.label()
    );

    let vacancy = service.approve_vacancy(&coordinator, &vacancy.id)?;
    println!(
        "- {} approved vacancy {} ({})",
        coordinator,
        vacancy.id.0,
        vacancy.status.label()
    );

    let application = service.apply(&student, &vacancy.id)?;
    print_application(&student, "applied", &application);

    match service.apply(&student, &vacancy.id) {
        Err(err @ PlacementError::Conflict { .. }) => println!("- duplicate refused: {err}"),
        Err(err) => return Err(err.into()),
        Ok(duplicate) => println!("- unexpected duplicate {}", duplicate.id.0),
    }

    let application =
        service.company_approve(&company, &application.id, Some("Great technical interview"))?;
    print_application(&company, "approved", &application);

    if !skip_university {
        let application = service.university_approve(
            &coordinator,
            &application.id,
            PlacementApproval {
                practice_start,
                practice_end,
                comment: Some("Internship agreement signed".to_string()),
            },
        )?;
        print_application(&coordinator, "signed off", &application);
        println!("  practice window {practice_start} .. {practice_end}");

        for placement in service.queries().placements(&coordinator)? {
            println!(
                "- placement ledger: {} at {} ({})",
                placement.student_id.0, placement.company_id.0, placement.vacancy_title
            );
        }
    }

    println!("\nAudit trail for {}", application.id.0);
    for entry in service.history(&coordinator, &application.id)? {
        print_history_entry(&entry);
    }

    Ok(())
}

fn print_application(actor: &ActorRef, verb: &str, application: &Application) {
    println!(
        "- {} {} application {} ({})",
        actor,
        verb,
        application.id.0,
        application.status.label()
    );
}

fn print_history_entry(entry: &HistoryEntry) {
    let view = entry.view();
    let actor = view
        .university_actor
        .map(|id| format!("university:{}", id.0))
        .or_else(|| view.company_actor.map(|id| format!("company:{}", id.0)))
        .or_else(|| view.student_actor.map(|id| format!("student:{}", id.0)))
        .unwrap_or_else(|| "system".to_string());
    println!(
        "  {} | {:<22} | {:<24} | {}",
        view.recorded_at.format("%Y-%m-%d %H:%M:%S"),
        view.status,
        actor,
        view.comment.as_deref().unwrap_or("-")
    );
}
