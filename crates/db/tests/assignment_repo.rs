//! Integration tests for draw persistence against a real PostgreSQL database.
//!
//! These need `DATABASE_URL` pointing at a Postgres server the test user may
//! create databases on.

use assert_matches::assert_matches;
use chrono::Utc;
use kringle_core::assignment::{assign, Pair};
use kringle_core::types::DbId;
use kringle_db::models::assignment::NotificationStatus;
use kringle_db::models::event::CreateEvent;
use kringle_db::models::participant::{CreateParticipant, Participant};
use kringle_db::repositories::{AssignmentRepo, DrawInsert, EventRepo, ParticipantRepo};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed_event(pool: &PgPool, participants: usize) -> (DbId, Vec<Participant>) {
    let event = EventRepo::create(
        pool,
        &CreateEvent {
            name: "Office party".to_string(),
            description: None,
            event_date: Utc::now(),
        },
    )
    .await
    .unwrap();

    let mut people = Vec::new();
    for i in 0..participants {
        let p = ParticipantRepo::create(
            pool,
            event.id,
            &CreateParticipant {
                name: format!("person-{i}"),
                email: format!("person-{i}@example.com"),
                gift_idea: Some(format!("idea {i}")),
                gift_image: None,
            },
        )
        .await
        .unwrap();
        people.push(p);
    }

    (event.id, people)
}

fn draw(people: &[Participant]) -> Vec<Pair<DbId>> {
    let ids: Vec<DbId> = people.iter().map(|p| p.id).collect();
    assign(&ids).unwrap()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn insert_draw_writes_every_pair(pool: PgPool) {
    let (event_id, people) = seed_event(&pool, 5).await;

    let result = AssignmentRepo::insert_draw(&pool, event_id, &draw(&people))
        .await
        .unwrap();

    let rows = assert_matches!(result, DrawInsert::Inserted(rows) => rows);
    assert_eq!(rows.len(), 5);
    assert!(rows.iter().all(|r| r.sent_at.is_none() && r.last_error.is_none()));
    assert_eq!(AssignmentRepo::count_for_event(&pool, event_id).await.unwrap(), 5);
}

#[sqlx::test(migrations = "./migrations")]
async fn second_insert_is_rejected_without_writing(pool: PgPool) {
    let (event_id, people) = seed_event(&pool, 4).await;

    AssignmentRepo::insert_draw(&pool, event_id, &draw(&people))
        .await
        .unwrap();
    let second = AssignmentRepo::insert_draw(&pool, event_id, &draw(&people))
        .await
        .unwrap();

    assert_matches!(second, DrawInsert::AlreadyDrawn);
    assert_eq!(AssignmentRepo::count_for_event(&pool, event_id).await.unwrap(), 4);
}

#[sqlx::test(migrations = "./migrations")]
async fn concurrent_inserts_are_serialized(pool: PgPool) {
    let (event_id, people) = seed_event(&pool, 6).await;
    let first = draw(&people);
    let second = draw(&people);

    let (a, b) = tokio::join!(
        AssignmentRepo::insert_draw(&pool, event_id, &first),
        AssignmentRepo::insert_draw(&pool, event_id, &second),
    );

    let inserted = [a.unwrap(), b.unwrap()]
        .into_iter()
        .filter(|r| matches!(r, DrawInsert::Inserted(_)))
        .count();
    assert_eq!(inserted, 1);
    assert_eq!(AssignmentRepo::count_for_event(&pool, event_id).await.unwrap(), 6);
}

#[sqlx::test(migrations = "./migrations")]
async fn self_pair_aborts_the_whole_draw(pool: PgPool) {
    let (event_id, people) = seed_event(&pool, 3).await;
    let pairs = vec![
        Pair { giver: people[0].id, receiver: people[1].id },
        Pair { giver: people[1].id, receiver: people[1].id },
    ];

    let err = AssignmentRepo::insert_draw(&pool, event_id, &pairs)
        .await
        .unwrap_err();

    assert_matches!(err, sqlx::Error::Database(_));
    assert_eq!(AssignmentRepo::count_for_event(&pool, event_id).await.unwrap(), 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn delete_then_redraw_succeeds(pool: PgPool) {
    let (event_id, people) = seed_event(&pool, 3).await;

    AssignmentRepo::insert_draw(&pool, event_id, &draw(&people))
        .await
        .unwrap();
    let removed = AssignmentRepo::delete_for_event(&pool, event_id).await.unwrap();
    assert_eq!(removed, 3);
    assert_eq!(AssignmentRepo::delete_for_event(&pool, event_id).await.unwrap(), 0);

    let again = AssignmentRepo::insert_draw(&pool, event_id, &draw(&people))
        .await
        .unwrap();
    assert_matches!(again, DrawInsert::Inserted(rows) if rows.len() == 3);
}

#[sqlx::test(migrations = "./migrations")]
async fn notification_status_updates(pool: PgPool) {
    let (event_id, people) = seed_event(&pool, 2).await;
    let rows = match AssignmentRepo::insert_draw(&pool, event_id, &draw(&people))
        .await
        .unwrap()
    {
        DrawInsert::Inserted(rows) => rows,
        DrawInsert::AlreadyDrawn => panic!("fresh event reported as drawn"),
    };

    let failed = NotificationStatus::Failed {
        error: "mailbox unavailable".to_string(),
    };
    assert!(AssignmentRepo::update_notification_status(&pool, rows[0].id, &failed)
        .await
        .unwrap());

    let sent = NotificationStatus::Sent {
        sent_at: Utc::now(),
        external_message_id: Some("<abc@kringle.local>".to_string()),
    };
    assert!(AssignmentRepo::update_notification_status(&pool, rows[1].id, &sent)
        .await
        .unwrap());

    let stored = AssignmentRepo::list_for_event(&pool, event_id).await.unwrap();
    let first = stored.iter().find(|r| r.id == rows[0].id).unwrap();
    let second = stored.iter().find(|r| r.id == rows[1].id).unwrap();

    assert!(first.sent_at.is_none());
    assert_eq!(first.last_error.as_deref(), Some("mailbox unavailable"));
    assert!(second.sent_at.is_some());
    assert!(second.last_error.is_none());
    assert_eq!(second.external_message_id.as_deref(), Some("<abc@kringle.local>"));
}

#[sqlx::test(migrations = "./migrations")]
async fn find_receiver_for_follows_the_draw(pool: PgPool) {
    let (event_id, people) = seed_event(&pool, 3).await;

    let before = ParticipantRepo::find_receiver_for(&pool, event_id, people[0].id)
        .await
        .unwrap();
    assert!(before.is_none());

    let pairs = draw(&people);
    AssignmentRepo::insert_draw(&pool, event_id, &pairs)
        .await
        .unwrap();

    let expected = pairs
        .iter()
        .find(|p| p.giver == people[0].id)
        .unwrap()
        .receiver;
    let receiver = ParticipantRepo::find_receiver_for(&pool, event_id, people[0].id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(receiver.id, expected);

    let details = AssignmentRepo::list_details(&pool, event_id).await.unwrap();
    assert_eq!(details.len(), 3);
}
