//! End-to-end workflow tests against the in-memory mail service
//!
//! These exercise the full pipeline: mailbox enumeration, sender catalog
//! construction, scripted marking, and the bulk actions (trash and filter
//! creation).

mod common;

use common::{message, FakeMailService};
use gmail_sweep::catalog;
use gmail_sweep::cli::list_all_message_ids;
use gmail_sweep::criteria::{FilterCriteria, FilterDisposition};
use gmail_sweep::error::SweepError;
use gmail_sweep::marking::{MarkingSession, ScriptedDecisions};
use gmail_sweep::sweeper::Sweeper;

#[tokio::test]
async fn test_catalog_deduplicates_repeat_senders() {
    let service = FakeMailService::new(
        vec![vec!["m1", "m2", "m3"]],
        vec![
            message("m1", "Alice <a@x.com>", &["INBOX"]),
            message("m2", "Bob <b@x.com>", &["INBOX"]),
            message("m3", "Alice <a@x.com>", &["INBOX"]),
        ],
    );

    let ids = list_all_message_ids(&service).await.unwrap();
    let catalog = catalog::collect(&service, &ids).await.unwrap();

    assert_eq!(catalog.len(), 2);
    assert!(catalog.contains_raw("Alice <a@x.com>"));
    assert!(catalog.contains_raw("Bob <b@x.com>"));
}

#[tokio::test]
async fn test_mark_first_sender_and_build_criteria() {
    let service = FakeMailService::new(
        vec![vec!["m1", "m2"]],
        vec![
            message("m1", "Alice <a@x.com>", &["INBOX"]),
            message("m2", "Bob <b@x.com>", &["INBOX"]),
        ],
    );

    let ids = list_all_message_ids(&service).await.unwrap();
    let catalog = catalog::collect(&service, &ids).await.unwrap();

    // Keep the first sender, decline the second
    let mut session = MarkingSession::new(ScriptedDecisions::new(vec![true, false]));
    let marked = session.mark(&catalog).unwrap();

    assert_eq!(marked.len(), 1);
    let criteria = FilterCriteria::from_marked(&marked);
    assert_eq!(criteria.expression(), "a@x.com");
}

#[tokio::test]
async fn test_two_page_traversal_trashes_and_protects() {
    // One trashable and one protected message from the marked sender on
    // each page, plus an unrelated message.
    let service = FakeMailService::new(
        vec![vec!["m1", "m2", "m5"], vec!["m3", "m4"]],
        vec![
            message("m1", "Alice <a@x.com>", &["INBOX"]),
            message("m2", "Alice <a@x.com>", &["INBOX", "STARRED"]),
            message("m3", "Alice <a@x.com>", &["INBOX"]),
            message("m4", "Alice <a@x.com>", &["STARRED"]),
            message("m5", "Bob <b@x.com>", &["INBOX"]),
        ],
    );

    let marked = vec![gmail_sweep::identity::SenderIdentity::parse(
        "Alice <a@x.com>",
    )];
    let sweeper = Sweeper::new(&service, "STARRED");
    let report = sweeper.trash_marked(&marked).await.unwrap();

    assert_eq!(report.pages, 2);
    assert_eq!(report.examined, 5);
    assert_eq!(report.trashed, 2);
    assert_eq!(report.skipped, 2);
    assert_eq!(service.trashed_ids(), vec!["m1", "m3"]);

    // Page-level continuation only: the first call carries no token, the
    // second carries the first page's token, and no page is revisited.
    assert_eq!(
        service.list_calls(),
        vec![None, Some("page-1".to_string())]
    );
}

#[tokio::test]
async fn test_trash_all_spares_only_protected_messages() {
    let service = FakeMailService::new(
        vec![vec!["m1", "m2"], vec!["m3"]],
        vec![
            message("m1", "Alice <a@x.com>", &["INBOX"]),
            message("m2", "Bob <b@x.com>", &["INBOX", "STARRED"]),
            message("m3", "carol@x.com", &["INBOX"]),
        ],
    );

    let sweeper = Sweeper::new(&service, "STARRED");
    let report = sweeper.trash_all().await.unwrap();

    assert_eq!(report.trashed, 2);
    assert_eq!(report.skipped, 1);
    // Whole-mailbox scope does not care whether the From header parses
    assert_eq!(service.trashed_ids(), vec!["m1", "m3"]);
}

#[tokio::test]
async fn test_abort_mid_run_keeps_earlier_mutations() {
    let service = FakeMailService::new(
        vec![vec!["m1"], vec!["m2", "m3"]],
        vec![
            message("m1", "Alice <a@x.com>", &["INBOX"]),
            message("m2", "Alice <a@x.com>", &["INBOX"]),
            message("m3", "Alice <a@x.com>", &["INBOX"]),
        ],
    );
    service.fail_on_get("m2");

    let sweeper = Sweeper::new(&service, "STARRED");
    let result = sweeper.trash_all().await;

    match result {
        Err(SweepError::SweepAborted {
            page,
            message_id,
            trashed,
            unprocessed,
            ..
        }) => {
            assert_eq!(page, 2);
            assert_eq!(message_id, "m2");
            assert_eq!(trashed, 1);
            assert_eq!(unprocessed, 1);
        }
        _ => panic!("expected SweepAborted"),
    }

    // m1 stays trashed; nothing is rolled back
    assert_eq!(service.trashed_ids(), vec!["m1"]);
}

#[tokio::test]
async fn test_filter_workflow_records_criteria_and_disposition() {
    let service = FakeMailService::new(
        vec![vec!["m1", "m2"]],
        vec![
            message("m1", "Alice <a@x.com>", &["INBOX"]),
            message("m2", "Bob <b@x.com>", &["INBOX"]),
        ],
    );

    let ids = list_all_message_ids(&service).await.unwrap();
    let catalog = catalog::collect(&service, &ids).await.unwrap();

    let mut session = MarkingSession::new(ScriptedDecisions::new(vec![true, true]));
    let marked = session.mark(&catalog).unwrap();

    let sweeper = Sweeper::new(&service, "STARRED");
    let filter_id = sweeper
        .create_sender_filter(&marked, &FilterDisposition::default())
        .await
        .unwrap();

    assert_eq!(filter_id, "filter-1");
    let created = service.created_filters();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].0, "a@x.com OR b@x.com");
    assert_eq!(created[0].1.remove_label_ids, vec!["INBOX"]);
}

#[tokio::test]
async fn test_marked_senders_without_emails_trash_nothing() {
    let service = FakeMailService::new(
        vec![vec!["m1"]],
        vec![message("m1", "bare@x.com", &["INBOX"])],
    );

    // The raw header has no angle-bracket address, so the marked identity
    // carries no email and the traversal never starts.
    let marked = vec![gmail_sweep::identity::SenderIdentity::parse("bare@x.com")];
    let sweeper = Sweeper::new(&service, "STARRED");
    let report = sweeper.trash_marked(&marked).await.unwrap();

    assert_eq!(report.pages, 0);
    assert_eq!(report.examined, 0);
    assert!(service.trashed_ids().is_empty());
    assert!(service.list_calls().is_empty());
}
