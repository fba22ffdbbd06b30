use chronos_shared::{Collection, Error, Filter};
use chronos_store::DocumentStore;
use serde_json::json;
use temp_dir::TempDir;

mod helpers;

use helpers::fields;

#[tokio::test]
async fn test_query_narrows_on_owner_and_fields() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let state = helpers::setup_test_state(dir.child("db.sqlite3")).await?;

    for (uid, week) in [("john", 1), ("john", 2), ("albert", 1)] {
        state
            .store
            .create(
                Collection::WeeklyPlans,
                fields(json!({ "uid": uid, "year": 2024, "week": week, "goals": [] })),
            )
            .await?;
    }

    let docs = state
        .store
        .query(
            Collection::WeeklyPlans,
            &[
                Filter::eq("uid", "john"),
                Filter::eq("year", 2024),
                Filter::eq("week", 2),
            ],
        )
        .await?;
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].fields["week"], json!(2));

    let docs = state
        .store
        .query(Collection::WeeklyPlans, &[Filter::eq("week", 1)])
        .await?;
    assert_eq!(docs.len(), 2);

    let docs = state
        .store
        .query(Collection::MonthlyPlans, &[Filter::eq("uid", "john")])
        .await?;
    assert!(docs.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_range_filter_on_dates() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let state = helpers::setup_test_state(dir.child("db.sqlite3")).await?;

    for date in ["2023-12-31", "2024-01-01", "2024-06-15"] {
        state
            .store
            .create(
                Collection::DailyPlans,
                fields(json!({ "uid": "john", "date": date })),
            )
            .await?;
    }

    let docs = state
        .store
        .query(
            Collection::DailyPlans,
            &[Filter::eq("uid", "john"), Filter::gte("date", "2024-01-01")],
        )
        .await?;
    let mut dates = docs
        .iter()
        .map(|d| d.fields["date"].as_str().unwrap_or_default().to_owned())
        .collect::<Vec<_>>();
    dates.sort();
    assert_eq!(dates, vec!["2024-01-01", "2024-06-15"]);

    Ok(())
}

#[tokio::test]
async fn test_update_merges_dotted_fields() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let state = helpers::setup_test_state(dir.child("db.sqlite3")).await?;

    let id = state
        .store
        .create(
            Collection::DailyPlans,
            fields(json!({
                "uid": "john",
                "date": "2024-01-10",
                "habitLogs": { "a": { "completed": true, "value": 1 } }
            })),
        )
        .await?;

    state
        .store
        .update(
            Collection::DailyPlans,
            &id,
            fields(json!({
                "habitLogs.b": { "completed": false, "value": 0 },
                "bigThing": { "text": "ship", "completed": false }
            })),
        )
        .await?;

    let docs = state
        .store
        .query(Collection::DailyPlans, &[Filter::eq("uid", "john")])
        .await?;
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].id, id);
    assert_eq!(
        docs[0].fields["habitLogs"],
        json!({
            "a": { "completed": true, "value": 1 },
            "b": { "completed": false, "value": 0 }
        })
    );
    assert_eq!(docs[0].fields["bigThing"]["text"], json!("ship"));

    let updated_at = sqlx::query_scalar::<_, Option<i64>>(
        "SELECT updated_at FROM document WHERE collection = ? AND id = ?",
    )
    .bind("daily_plans")
    .bind(&id)
    .fetch_one(&state.pool)
    .await?;
    assert!(updated_at.is_some());

    Ok(())
}

#[tokio::test]
async fn test_update_missing_document() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let state = helpers::setup_test_state(dir.child("db.sqlite3")).await?;

    let res = state
        .store
        .update(
            Collection::AnnualPlans,
            "01HZZZZZZZZZZZZZZZZZZZZZZZ",
            fields(json!({ "goals": [] })),
        )
        .await;

    assert!(matches!(res, Err(Error::NotFound(_))));

    Ok(())
}

#[tokio::test]
async fn test_writes_notify_changes() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let state = helpers::setup_test_state(dir.child("db.sqlite3")).await?;
    let mut changes = state.store.changes();

    let id = state
        .store
        .create(Collection::Habits, fields(json!({ "uid": "john", "name": "Read" })))
        .await?;
    assert_eq!(changes.recv().await?, Collection::Habits);

    state.store.delete(Collection::Habits, &id).await?;
    assert_eq!(changes.recv().await?, Collection::Habits);

    state.store.delete(Collection::Habits, &id).await?;
    assert!(changes.try_recv().is_err());

    let docs = state.store.query(Collection::Habits, &[]).await?;
    assert!(docs.is_empty());

    Ok(())
}
