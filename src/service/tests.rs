use crate::{
    scheduling::AlarmState,
    storage::InMemoryReminderRepository,
    test_utils::{TestContext, UnavailableRepository, reminder, scheduler_settings, utc},
};

use super::*;

fn r1() -> ReminderId {
    ReminderId::new("r1")
}

fn service_with(
    ctx: &TestContext,
    cancel_completed: bool,
) -> (ReminderService, Arc<InMemoryReminderRepository>) {
    let repository = Arc::new(InMemoryReminderRepository::new());
    let service = ReminderService::new(
        repository.clone(),
        Arc::clone(&ctx.store),
        &scheduler_settings(cancel_completed),
    );
    (service, repository)
}

#[tokio::test]
pub async fn create_saves_and_schedules() {
    let ctx = TestContext::new();
    let (service, repository) = service_with(&ctx, false);

    let outcome = service
        .create(reminder("r1", "25 Dec 2025", "09:00 AM"))
        .await
        .unwrap();

    assert_eq!(outcome, ArmOutcome::Scheduled(utc(2025, 12, 25, 9, 0)));
    assert!(repository.get(&r1()).await.unwrap().is_some());
    assert_eq!(ctx.host.live_instants(), vec![utc(2025, 12, 25, 9, 0)]);
}

#[tokio::test]
pub async fn create_in_the_past_is_saved_but_rejected() {
    let ctx = TestContext::new();
    let (service, repository) = service_with(&ctx, false);

    let outcome = service
        .create(reminder("r1", "01 Dec 2025", "09:00 AM"))
        .await
        .unwrap();

    assert_eq!(outcome, ArmOutcome::Rejected(Rejection::PastInstant));
    assert!(repository.get(&r1()).await.unwrap().is_some());
    assert!(ctx.host.live().is_empty());
}

#[tokio::test]
pub async fn create_with_notifications_off_does_not_schedule() {
    let ctx = TestContext::new();
    let (service, _) = service_with(&ctx, false);
    let mut r1 = reminder("r1", "25 Dec 2025", "09:00 AM");
    r1.notification_active = false;

    let outcome = service.create(r1).await.unwrap();

    assert_eq!(outcome, ArmOutcome::Disabled);
    assert_eq!(ctx.host.register_calls(), 0);
}

#[tokio::test]
pub async fn create_with_unreadable_time_is_a_format_error() {
    let ctx = TestContext::new();
    let (service, _) = service_with(&ctx, false);

    let result = service.create(reminder("r1", "25 Dec 2025", "9 o'clock")).await;

    assert!(matches!(result, Err(ServiceError::Format(_))));
}

#[tokio::test]
pub async fn update_moves_the_alarm() {
    let ctx = TestContext::new();
    let (service, _) = service_with(&ctx, false);
    service
        .create(reminder("r1", "25 Dec 2025", "09:00 AM"))
        .await
        .unwrap();

    let outcome = service
        .update(reminder("r1", "25 Dec 2025", "11:30 AM"))
        .await
        .unwrap();

    assert_eq!(outcome, ArmOutcome::Scheduled(utc(2025, 12, 25, 11, 30)));
    assert_eq!(ctx.host.live_instants(), vec![utc(2025, 12, 25, 11, 30)]);
}

#[tokio::test]
pub async fn update_into_the_past_drops_the_alarm() {
    let ctx = TestContext::new();
    let (service, _) = service_with(&ctx, false);
    service
        .create(reminder("r1", "25 Dec 2025", "09:00 AM"))
        .await
        .unwrap();

    let outcome = service
        .update(reminder("r1", "23 Dec 2025", "09:00 AM"))
        .await
        .unwrap();

    assert_eq!(outcome, ArmOutcome::Rejected(Rejection::PastInstant));
    assert_eq!(ctx.store.state(&r1()).await, AlarmState::Unscheduled);
}

#[tokio::test]
pub async fn update_with_unreadable_date_drops_the_alarm() {
    let ctx = TestContext::new();
    let (service, repository) = service_with(&ctx, false);
    service
        .create(reminder("r1", "25 Dec 2025", "09:00 AM"))
        .await
        .unwrap();

    let result = service
        .update(reminder("r1", "31 Foo 2025", "09:00 AM"))
        .await;

    assert!(matches!(result, Err(ServiceError::Format(_))));
    assert_eq!(repository.get(&r1()).await.unwrap().unwrap().date, "31 Foo 2025");
    assert_eq!(ctx.store.state(&r1()).await, AlarmState::Unscheduled);
    assert!(ctx.host.live().is_empty());
}

#[tokio::test]
pub async fn update_turning_notifications_off_cancels() {
    let ctx = TestContext::new();
    let (service, _) = service_with(&ctx, false);
    service
        .create(reminder("r1", "25 Dec 2025", "09:00 AM"))
        .await
        .unwrap();
    let mut r1 = reminder("r1", "25 Dec 2025", "09:00 AM");
    r1.notification_active = false;

    let outcome = service.update(r1).await.unwrap();

    assert_eq!(outcome, ArmOutcome::Disabled);
    assert!(ctx.host.live().is_empty());
}

#[tokio::test]
pub async fn delete_removes_and_cancels() {
    let ctx = TestContext::new();
    let (service, repository) = service_with(&ctx, false);
    service
        .create(reminder("r1", "25 Dec 2025", "09:00 AM"))
        .await
        .unwrap();

    service.delete(&r1()).await.unwrap();

    assert!(repository.get(&r1()).await.unwrap().is_none());
    assert!(ctx.host.live().is_empty());
}

#[tokio::test]
pub async fn completing_keeps_the_alarm_by_default() {
    let ctx = TestContext::new();
    let (service, repository) = service_with(&ctx, false);
    service
        .create(reminder("r1", "25 Dec 2025", "09:00 AM"))
        .await
        .unwrap();

    service.mark_completed(&r1()).await.unwrap();

    assert!(repository.get(&r1()).await.unwrap().unwrap().is_completed);
    assert_eq!(
        ctx.store.state(&r1()).await,
        AlarmState::Scheduled(utc(2025, 12, 25, 9, 0))
    );
}

#[tokio::test]
pub async fn completing_cancels_when_configured() {
    let ctx = TestContext::new();
    let (service, _) = service_with(&ctx, true);
    service
        .create(reminder("r1", "25 Dec 2025", "09:00 AM"))
        .await
        .unwrap();

    service.mark_completed(&r1()).await.unwrap();

    assert_eq!(ctx.store.state(&r1()).await, AlarmState::Unscheduled);
}

#[tokio::test]
pub async fn repository_failure_leaves_the_alarm_untouched() {
    let ctx = TestContext::new();
    let service = ReminderService::new(
        Arc::new(UnavailableRepository),
        Arc::clone(&ctx.store),
        &scheduler_settings(false),
    );

    let result = service
        .create(reminder("r1", "25 Dec 2025", "09:00 AM"))
        .await;

    assert!(matches!(result, Err(ServiceError::Repository(_))));
    assert_eq!(ctx.host.calls().len(), 0);
}

#[tokio::test]
pub async fn refresh_sweeps_the_users_reminders() {
    let ctx = TestContext::new();
    let (service, repository) = service_with(&ctx, false);
    repository
        .save(reminder("r1", "25 Dec 2025", "09:00 AM"))
        .await
        .unwrap();
    repository
        .save(reminder("r2", "20 Dec 2025", "09:00 AM"))
        .await
        .unwrap();

    let report = service.refresh(&"u1".to_owned()).await.unwrap();

    assert_eq!(report.scheduled, vec![r1()]);
    assert_eq!(report.past_due, vec![ReminderId::new("r2")]);
}

#[tokio::test]
pub async fn granting_permission_arms_waiting_reminders() {
    let ctx = TestContext::new();
    let (service, _) = service_with(&ctx, false);
    ctx.host.deny_exact_alarms(true);
    let result = service
        .create(reminder("r1", "25 Dec 2025", "09:00 AM"))
        .await;
    assert!(matches!(
        result,
        Err(ServiceError::Scheduling(SchedulingError::PermissionDenied { .. }))
    ));

    ctx.host.deny_exact_alarms(false);
    let failures = service.permission_granted().await;

    assert!(failures.is_empty());
    assert_eq!(ctx.host.live_instants(), vec![utc(2025, 12, 25, 9, 0)]);
}
