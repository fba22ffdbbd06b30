use chronos_planning::{
    AnnualEngine, MonthKey, MonthlyEngine, PlanEngine, PlanState, SyncMode, WeekKey, WeeklyEngine,
};
use chronos_shared::{
    AnnualPatch, Collection, Error, Goal, Milestone, MonthlyPatch, READ_ONLY_ID, UNSAVED_ID,
    WeeklyPatch,
};
use chronos_store::DocumentStore;
use serde_json::json;
use time::macros::datetime;

mod helpers;

use helpers::{TestState, fields};

fn annual(state: &TestState) -> AnnualEngine {
    PlanEngine::new(
        state.store.clone(),
        state.clock.clone(),
        state.identity.subscribe(),
        state.navigation.annual().subscribe(),
        SyncMode::Once,
    )
}

fn monthly(state: &TestState) -> MonthlyEngine {
    PlanEngine::new(
        state.store.clone(),
        state.clock.clone(),
        state.identity.subscribe(),
        state.navigation.monthly().subscribe(),
        SyncMode::Once,
    )
}

fn weekly(state: &TestState) -> WeeklyEngine {
    WeeklyEngine::new(PlanEngine::new(
        state.store.clone(),
        state.clock.clone(),
        state.identity.subscribe(),
        state.navigation.weekly().subscribe(),
        SyncMode::Once,
    ))
}

#[tokio::test]
async fn test_annual_placeholder_is_promoted_on_first_edit() -> anyhow::Result<()> {
    let state = helpers::setup_test_state(datetime!(2024-01-11 09:00 UTC));
    let engine = annual(&state);

    let plan = engine.ensure_plan().await?.unwrap();
    assert_eq!(plan.id, UNSAVED_ID);
    assert_eq!(plan.year, 2024);
    assert_eq!(state.store.creates(), 0);

    let goal = Goal::new("g1", "Run a marathon");
    engine
        .update_plan(&AnnualPatch {
            goals: Some(vec![goal.clone()]),
        })
        .await?;

    assert_eq!(state.store.creates(), 1);
    assert_eq!(state.store.updates(), 0);

    let plan = engine.current_plan().unwrap();
    assert_ne!(plan.id, UNSAVED_ID);
    assert_eq!(plan.goals, vec![goal]);
    assert!(engine.current_state().is_persisted());

    let stored = state.store.inner.get(Collection::AnnualPlans, &plan.id).unwrap();
    assert_eq!(stored["goals"][0]["text"], json!("Run a marathon"));

    engine
        .update_plan(&AnnualPatch {
            goals: Some(vec![]),
        })
        .await?;

    assert_eq!(state.store.creates(), 1);
    assert_eq!(state.store.updates(), 1);
    assert_eq!(engine.current_plan().unwrap().id, plan.id);

    Ok(())
}

#[tokio::test]
async fn test_concurrent_edits_create_annual_plan_once() -> anyhow::Result<()> {
    let state = helpers::setup_test_state(datetime!(2024-01-11 09:00 UTC));
    let engine = annual(&state);
    engine.ensure_plan().await?;

    let first = AnnualPatch {
        goals: Some(vec![Goal::new("g1", "First")]),
    };
    let second = AnnualPatch {
        goals: Some(vec![Goal::new("g2", "Second")]),
    };
    let (a, b) = tokio::join!(engine.update_plan(&first), engine.update_plan(&second));
    a?;
    b?;

    assert_eq!(state.store.creates(), 1);
    assert_eq!(state.store.inner.count(Collection::AnnualPlans), 1);
    assert_ne!(engine.current_plan().unwrap().id, UNSAVED_ID);

    Ok(())
}

#[tokio::test]
async fn test_annual_plans_are_never_locked() -> anyhow::Result<()> {
    let state = helpers::setup_test_state(datetime!(2024-01-11 09:00 UTC));
    let engine = annual(&state);
    state.navigation.prev_year();
    state.navigation.prev_year();

    assert!(!engine.is_past_period());

    engine.ensure_plan().await?;
    engine
        .update_plan(&AnnualPatch {
            goals: Some(vec![Goal::new("g1", "Look back")]),
        })
        .await?;

    let plan = engine.current_plan().unwrap();
    assert_eq!(plan.year, 2022);
    assert_eq!(state.store.creates(), 1);

    Ok(())
}

#[tokio::test]
async fn test_ensure_is_idempotent() -> anyhow::Result<()> {
    let state = helpers::setup_test_state(datetime!(2024-01-11 09:00 UTC));
    let engine = monthly(&state);

    let first = engine.ensure_plan().await?.unwrap();
    let second = engine.ensure_plan().await?.unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(first.month, 0);

    let other = monthly(&state);
    let third = other.ensure_plan().await?.unwrap();
    assert_eq!(third.id, first.id);

    assert_eq!(state.store.creates(), 1);
    assert_eq!(state.store.inner.count(Collection::MonthlyPlans), 1);

    Ok(())
}

#[tokio::test]
async fn test_past_month_gets_read_only_placeholder() -> anyhow::Result<()> {
    let state = helpers::setup_test_state(datetime!(2024-01-11 09:00 UTC));
    let engine = monthly(&state);
    state.navigation.prev_month();
    assert_eq!(state.navigation.monthly_view(), MonthKey::new(2023, 11));
    assert!(engine.is_past_period());

    let plan = engine.ensure_plan().await?.unwrap();
    assert_eq!(plan.id, READ_ONLY_ID);
    assert!(engine.current_state().is_read_only());
    assert_eq!(state.store.creates(), 0);

    let res = engine
        .update_plan(&MonthlyPatch {
            milestones: Some(vec![Milestone::default()]),
        })
        .await;
    assert!(matches!(res, Err(Error::ReadOnly(_))));
    assert_eq!(state.store.creates(), 0);
    assert_eq!(state.store.updates(), 0);

    Ok(())
}

#[tokio::test]
async fn test_past_month_with_stored_plan_is_adopted() -> anyhow::Result<()> {
    let state = helpers::setup_test_state(datetime!(2024-01-11 09:00 UTC));
    let id = state
        .store
        .create(
            Collection::MonthlyPlans,
            fields(json!({ "uid": "john", "year": 2023, "month": 11, "milestones": [] })),
        )
        .await?;
    let engine = monthly(&state);
    state.navigation.prev_month();

    let plan = engine.ensure_plan().await?.unwrap();
    assert_eq!(plan.id, id);
    assert!(engine.current_state().is_persisted());
    assert_eq!(state.store.creates(), 1);

    Ok(())
}

#[tokio::test]
async fn test_past_week_never_creates() -> anyhow::Result<()> {
    let state = helpers::setup_test_state(datetime!(2024-01-11 09:00 UTC));
    let engine = weekly(&state);
    assert_eq!(state.navigation.weekly_view(), WeekKey::new(2024, 2));

    state.navigation.prev_week();
    let plan = engine.ensure_plan().await?.unwrap();
    assert_eq!(plan.id, READ_ONLY_ID);
    assert_eq!(plan.week, 1);

    state.navigation.prev_week();
    assert_eq!(state.navigation.weekly_view(), WeekKey::new(2023, 52));
    engine.ensure_plan().await?;

    assert_eq!(state.store.creates(), 0);

    state.navigation.reset_weekly_view();
    let plan = engine.ensure_plan().await?.unwrap();
    assert_ne!(plan.id, READ_ONLY_ID);
    assert_eq!(state.store.creates(), 1);

    Ok(())
}

#[tokio::test]
async fn test_weekly_focus_is_migrated_once() -> anyhow::Result<()> {
    let state = helpers::setup_test_state(datetime!(2024-01-11 09:00 UTC));
    let id = state
        .store
        .create(
            Collection::WeeklyPlans,
            fields(json!({ "uid": "john", "year": 2024, "week": 2, "focus": "Ship it", "goals": [] })),
        )
        .await?;
    let engine = weekly(&state);

    let plan = engine.ensure_plan().await?.unwrap();
    assert_eq!(plan.id, id);
    assert_eq!(plan.focus, "");
    assert_eq!(plan.goals.len(), 1);
    assert_eq!(plan.goals[0].text, "Ship it");

    let stored = state.store.inner.get(Collection::WeeklyPlans, &id).unwrap();
    assert_eq!(stored["focus"], json!(""));
    assert_eq!(stored["goals"][0]["text"], json!("Ship it"));

    engine.ensure_plan().await?;
    assert_eq!(state.store.updates(), 1);

    Ok(())
}

#[tokio::test]
async fn test_weekly_update_merges_locally_first() -> anyhow::Result<()> {
    let state = helpers::setup_test_state(datetime!(2024-01-11 09:00 UTC));
    let engine = weekly(&state);
    let plan = engine.ensure_plan().await?.unwrap();

    engine
        .update_plan(&WeeklyPatch {
            goals: Some(vec![Goal::new("g1", "Write tests")]),
            ..Default::default()
        })
        .await?;

    let local = engine.current_plan().unwrap();
    assert_eq!(local.goals[0].text, "Write tests");
    assert!(local.blocks.is_empty());

    let stored = state.store.inner.get(Collection::WeeklyPlans, &plan.id).unwrap();
    assert_eq!(stored["goals"][0]["id"], json!("g1"));
    assert_eq!(stored["year"], json!(2024));

    Ok(())
}

#[tokio::test]
async fn test_signed_out_engine_is_inactive() -> anyhow::Result<()> {
    let state = helpers::setup_test_state(datetime!(2024-01-11 09:00 UTC));
    let engine = monthly(&state);
    state.identity.sign_out();

    assert!(engine.ensure_plan().await?.is_none());
    engine
        .update_plan(&MonthlyPatch {
            milestones: Some(vec![]),
        })
        .await?;

    assert_eq!(engine.current_state(), PlanState::Idle);
    assert_eq!(state.store.creates(), 0);
    assert_eq!(state.store.updates(), 0);

    Ok(())
}

#[tokio::test]
async fn test_once_mode_follows_cursor_without_creating() -> anyhow::Result<()> {
    let state = helpers::setup_test_state(datetime!(2024-01-11 09:00 UTC));
    let engine = monthly(&state);
    let mut view = engine.watch();
    engine.start();

    tokio::time::timeout(
        std::time::Duration::from_secs(1),
        view.wait_for(|v| v.state == PlanState::Missing),
    )
    .await??;
    assert_eq!(state.store.creates(), 0);

    engine.ensure_plan().await?;
    assert!(engine.current_state().is_persisted());

    state.navigation.next_month();
    tokio::time::timeout(
        std::time::Duration::from_secs(1),
        view.wait_for(|v| v.key == MonthKey::new(2024, 1) && v.state == PlanState::Missing),
    )
    .await??;

    state.navigation.prev_month();
    tokio::time::timeout(
        std::time::Duration::from_secs(1),
        view.wait_for(|v| v.key == MonthKey::new(2024, 0) && v.state.is_persisted()),
    )
    .await??;
    assert_eq!(state.store.creates(), 1);

    engine.stop();

    Ok(())
}
