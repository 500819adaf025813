use jiff::{
    SignedDuration, Timestamp,
    civil::{Weekday, date},
    tz::TimeZone,
};
use rust_decimal::Decimal;
use smallvec::smallvec;
use testresult::TestResult;
use uuid::Uuid;

use crate::{
    domain::{
        appointments::records::{AccountUuid, ClientUuid},
        businesses::records::BusinessUuid,
        catalog::records::ServiceUuid,
        habits::HabitBucketKey,
        promotions::{Discount, PromoRule, PromoRuleUuid},
    },
    test::fakes::{MemoryStore, PushBehaviour},
};

use super::*;

const ZONE: &str = "America/Costa_Rica";

fn at(year: i16, month: i8, day: i8, hour: i8, minute: i8) -> Result<Timestamp, jiff::Error> {
    Ok(date(year, month, day)
        .at(hour, minute, 0, 0)
        .to_zoned(TimeZone::get(ZONE)?)?
        .timestamp())
}

/// Tuesday 2026-03-03 15:30 in Costa Rica.
fn now() -> Result<Timestamp, jiff::Error> {
    at(2026, 3, 3, 15, 30)
}

/// Three Wednesday 10:15 visits before `now`.
fn wednesday_visits() -> Result<Vec<Timestamp>, jiff::Error> {
    Ok(vec![
        at(2026, 2, 11, 10, 15)?,
        at(2026, 2, 18, 10, 15)?,
        at(2026, 2, 25, 10, 15)?,
    ])
}

fn all_week(id: &str) -> PromoRule {
    PromoRule {
        id: id.to_string(),
        label: "All week".to_string(),
        enabled: true,
        priority: 0,
        days: smallvec![
            Weekday::Sunday,
            Weekday::Monday,
            Weekday::Tuesday,
            Weekday::Wednesday,
            Weekday::Thursday,
            Weekday::Friday,
            Weekday::Saturday,
        ],
        start_hour: 0,
        end_hour: 24,
        discount: Discount::Percent(Decimal::from(20)),
        service_ids: Vec::new(),
    }
}

struct Salon {
    store: MemoryStore,
    business: BusinessUuid,
    haircut: ServiceUuid,
    client: ClientUuid,
    account: AccountUuid,
}

/// One business with one account that habitually books a haircut on
/// Wednesdays at 10.
fn salon_with_rule(rule: PromoRule) -> Result<Salon, jiff::Error> {
    let store = MemoryStore::default();

    let business = store.add_business("downtown", Some(ZONE), vec![rule]);
    let haircut = store.add_service(business, "Haircut", 10_000, true);
    let client = ClientUuid::new();
    let account = AccountUuid::new();

    store.add_visits(
        business,
        client,
        Some(account),
        Some(haircut),
        &wednesday_visits()?,
    );

    Ok(Salon {
        store,
        business,
        haircut,
        client,
        account,
    })
}

fn salon() -> Result<Salon, jiff::Error> {
    salon_with_rule(all_week("all-week"))
}

fn job(store: &MemoryStore) -> SmartPromoJob {
    SmartPromoJob::new(store.services(), EngineSettings::default())
}

#[tokio::test]
async fn habitual_account_gets_one_attributed_promotion() -> TestResult {
    let salon = salon()?;
    let now = now()?;

    let summary = job(&salon.store).run(now).await;

    assert_eq!(
        summary,
        RunSummary {
            businesses_processed: 1,
            clients_evaluated: 1,
            candidates_found: 1,
            sent: 1,
            skipped: 0,
            errors: 0,
        }
    );

    let attributions = salon.store.attributions();
    let notifications = salon.store.notifications();
    let pushes = salon.store.pushes();

    assert_eq!(attributions.len(), 1);
    assert_eq!(notifications.len(), 1);
    assert_eq!(pushes.len(), 1);

    let record = attributions.first().ok_or("missing attribution")?;
    let (notification_id, notification) = notifications.first().ok_or("missing notification")?;
    let (pushed_to, push) = pushes.first().ok_or("missing push")?;

    assert_eq!(record.business, salon.business);
    assert_eq!(record.account, salon.account);
    assert_eq!(record.client, salon.client);
    assert_eq!(
        Some(record.bucket),
        HabitBucketKey::new(Weekday::Wednesday, 10)
    );
    assert_eq!(record.sent_at, Some(now));
    assert_eq!(record.notification, Some(*notification_id));
    assert_eq!(record.expires_at, now.checked_add(SignedDuration::from_hours(7 * 24))?);
    assert_eq!(record.promo_rule, None);

    assert_eq!(*pushed_to, salon.account);
    assert_eq!(push.url, format!("/book/downtown?sn={}", record.token));
    assert_eq!(push.body, "20% off Haircut. Book before it ends.");
    assert_eq!(
        push.tag,
        format!("smart-promo-{}-{}", salon.business, salon.account)
    );

    assert_eq!(notification.account, salon.account);
    assert_eq!(notification.kind, "smart_promo_offer");
    assert_eq!(notification.reference_type, "smart_promo");
    assert_eq!(
        notification.metadata["token"],
        serde_json::json!(record.token.to_string())
    );
    assert_eq!(notification.metadata["promo_rule_id"], serde_json::Value::Null);

    Ok(())
}

#[tokio::test]
async fn rerun_within_cooldown_sends_nothing() -> TestResult {
    let salon = salon()?;
    let job = job(&salon.store);

    let first = job.run(now()?).await;
    let second = job.run(now()?.checked_add(SignedDuration::from_hours(1))?).await;

    assert_eq!(first.sent, 1);
    assert_eq!(second.sent, 0);
    assert_eq!(second.skipped, 1);
    assert_eq!(salon.store.attributions().len(), 1);
    assert_eq!(salon.store.pushes().len(), 1);

    Ok(())
}

#[tokio::test]
async fn cooldown_expires() -> TestResult {
    let salon = salon()?;
    let job = job(&salon.store);

    job.run(now()?).await;

    // Exactly one cooldown after the first send, which no longer counts: the
    // window excludes its start. The habit projects into tomorrow again.
    let later = at(2026, 3, 10, 15, 30)?;

    let summary = job.run(later).await;

    assert_eq!(summary.sent, 1);
    assert_eq!(salon.store.attributions().len(), 2);

    Ok(())
}

#[tokio::test]
async fn every_channel_failing_leaves_no_record() -> TestResult {
    let salon = salon()?;

    {
        let mut state = salon.store.state();
        state.push = PushBehaviour::NoDevices;
        state.in_app_fails = true;
    }

    let summary = job(&salon.store).run(now()?).await;

    assert_eq!(summary.candidates_found, 1);
    assert_eq!(summary.sent, 0);
    assert_eq!(summary.errors, 1);
    assert!(salon.store.attributions().is_empty());

    // Nothing was delivered, so no cooldown applies to the next run.
    salon.store.state().in_app_fails = false;

    let summary = job(&salon.store).run(now()?).await;

    assert_eq!(summary.sent, 1);
    assert_eq!(salon.store.attributions().len(), 1);

    Ok(())
}

#[tokio::test]
async fn push_only_delivery_is_recorded_without_notification() -> TestResult {
    let salon = salon()?;

    salon.store.state().in_app_fails = true;

    let summary = job(&salon.store).run(now()?).await;

    assert_eq!(summary.sent, 1);
    assert_eq!(summary.errors, 0);

    let attributions = salon.store.attributions();
    let record = attributions.first().ok_or("missing attribution")?;

    assert!(record.sent_at.is_some());
    assert_eq!(record.notification, None);

    Ok(())
}

#[tokio::test]
async fn push_gateway_error_falls_back_to_in_app() -> TestResult {
    let salon = salon()?;

    salon.store.state().push = PushBehaviour::Fail;

    let summary = job(&salon.store).run(now()?).await;

    assert_eq!(summary.sent, 1);
    assert!(salon.store.pushes().is_empty());
    assert_eq!(salon.store.notifications().len(), 1);

    let attributions = salon.store.attributions();

    assert!(
        attributions
            .first()
            .is_some_and(|record| record.notification.is_some())
    );

    Ok(())
}

#[tokio::test]
async fn unrecorded_commit_still_counts_as_sent() -> TestResult {
    let salon = salon()?;

    salon.store.state().mark_sent_fails = true;

    let summary = job(&salon.store).run(now()?).await;

    assert_eq!(summary.sent, 1);
    assert_eq!(summary.errors, 1);

    let attributions = salon.store.attributions();

    assert!(
        attributions
            .first()
            .is_some_and(|record| record.sent_at.is_none())
    );

    Ok(())
}

#[tokio::test]
async fn unrecorded_commit_holds_cooldown_on_the_next_run() -> TestResult {
    let salon = salon()?;
    let now = now()?;

    salon.store.state().mark_sent_fails = true;

    let first = job(&salon.store).run(now).await;

    assert_eq!(first.sent, 1);
    assert_eq!(first.errors, 1);

    salon.store.state().mark_sent_fails = false;

    let second = job(&salon.store).run(now).await;

    assert_eq!(second.sent, 0);
    assert_eq!(second.skipped, 1);
    assert_eq!(second.errors, 0);
    assert_eq!(salon.store.pushes().len(), 1);

    let attributions = salon.store.attributions();

    assert_eq!(attributions.len(), 1);
    assert_eq!(
        attributions.first().and_then(|record| record.sent_at),
        Some(now)
    );

    Ok(())
}

#[tokio::test]
async fn expired_unreleased_reservation_is_deleted() -> TestResult {
    let salon = salon()?;

    {
        let mut state = salon.store.state();
        state.push = PushBehaviour::NoDevices;
        state.in_app_fails = true;
        state.release_fails = true;
    }

    let first = job(&salon.store).run(now()?).await;

    assert_eq!(first.sent, 0);
    assert_eq!(first.errors, 2);

    let orphan = salon
        .store
        .attributions()
        .first()
        .map(|record| record.token)
        .ok_or("expected an unsettled reservation")?;

    {
        let mut state = salon.store.state();
        state.push = PushBehaviour::Deliver;
        state.in_app_fails = false;
        state.release_fails = false;
    }

    let second = job(&salon.store).run(at(2026, 3, 10, 15, 30)?).await;

    assert_eq!(second.sent, 1);

    let attributions = salon.store.attributions();

    assert_eq!(attributions.len(), 1);
    assert!(attributions.iter().all(|record| record.token != orphan));

    Ok(())
}

#[tokio::test]
async fn opted_out_and_paused_accounts_are_skipped() -> TestResult {
    let opted_out = salon()?;
    let now = now()?;

    opted_out
        .store
        .set_preference(opted_out.business, opted_out.account, false, None);

    let summary = job(&opted_out.store).run(now).await;

    assert_eq!(summary.clients_evaluated, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.candidates_found, 0);

    let paused = salon()?;

    paused.store.set_preference(
        paused.business,
        paused.account,
        true,
        Some(now.checked_add(SignedDuration::from_hours(48))?),
    );

    let summary = job(&paused.store).run(now).await;

    assert_eq!(summary.skipped, 1);
    assert!(paused.store.attributions().is_empty());

    Ok(())
}

#[tokio::test]
async fn expired_pause_no_longer_blocks() -> TestResult {
    let salon = salon()?;
    let now = now()?;

    salon.store.set_preference(
        salon.business,
        salon.account,
        true,
        Some(now.checked_sub(SignedDuration::from_hours(1))?),
    );

    assert_eq!(job(&salon.store).run(now).await.sent, 1);

    Ok(())
}

#[tokio::test]
async fn too_few_visits_is_not_a_habit() -> TestResult {
    let store = MemoryStore::default();
    let business = store.add_business("downtown", Some(ZONE), vec![all_week("all-week")]);

    let visits = wednesday_visits()?;

    store.add_visits(
        business,
        ClientUuid::new(),
        Some(AccountUuid::new()),
        None,
        visits.get(..2).ok_or("expected visits")?,
    );

    let summary = job(&store).run(now()?).await;

    assert_eq!(summary.clients_evaluated, 1);
    assert_eq!(summary.skipped, 1);
    assert!(store.attributions().is_empty());

    Ok(())
}

#[tokio::test]
async fn habit_outside_the_window_is_skipped() -> TestResult {
    let salon = salon()?;

    // Thursday noon: next Wednesday 10:00 is six days away.
    let summary = job(&salon.store).run(at(2026, 3, 5, 12, 0)?).await;

    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.candidates_found, 0);
    assert!(salon.store.pushes().is_empty());

    Ok(())
}

#[tokio::test]
async fn slot_outside_every_rule_is_skipped() -> TestResult {
    let mut evenings = all_week("evenings");
    evenings.start_hour = 17;
    evenings.end_hour = 21;

    let salon = salon_with_rule(evenings)?;

    let summary = job(&salon.store).run(now()?).await;

    assert_eq!(summary.skipped, 1);
    assert!(salon.store.attributions().is_empty());

    Ok(())
}

#[tokio::test]
async fn service_scoped_rule_needs_the_habitual_service() -> TestResult {
    let mut scoped = all_week("colour-only");
    scoped.service_ids = vec![ServiceUuid::new()];

    let colour_only = salon_with_rule(scoped)?;

    assert_eq!(job(&colour_only.store).run(now()?).await.sent, 0);

    let mut scoped = all_week("haircut-only");
    let haircut_only = salon()?;
    scoped.service_ids = vec![haircut_only.haircut];
    haircut_only
        .store
        .state()
        .businesses
        .iter_mut()
        .for_each(|business| {
            business.rules = vec![scoped.clone()];
        });

    assert_eq!(job(&haircut_only.store).run(now()?).await.sent, 1);

    Ok(())
}

#[tokio::test]
async fn inactive_service_is_left_out_of_the_copy() -> TestResult {
    let store = MemoryStore::default();
    let business = store.add_business("downtown", Some(ZONE), vec![all_week("all-week")]);
    let retired = store.add_service(business, "Beard trim", 8_000, false);

    store.add_visits(
        business,
        ClientUuid::new(),
        Some(AccountUuid::new()),
        Some(retired),
        &wednesday_visits()?,
    );

    assert_eq!(job(&store).run(now()?).await.sent, 1);

    let pushes = store.pushes();

    assert_eq!(
        pushes.first().map(|(_, push)| push.body.as_str()),
        Some("20% off. Book before it ends.")
    );

    Ok(())
}

#[tokio::test]
async fn uuid_rule_ids_are_recorded() -> TestResult {
    let id = Uuid::now_v7().to_string();
    let salon = salon_with_rule(all_week(&id))?;

    job(&salon.store).run(now()?).await;

    let attributions = salon.store.attributions();

    assert_eq!(
        attributions.first().and_then(|record| record.promo_rule),
        PromoRuleUuid::parse(&id)
    );

    Ok(())
}

#[tokio::test]
async fn clients_of_one_account_are_merged() -> TestResult {
    let store = MemoryStore::default();
    let business = store.add_business("downtown", Some(ZONE), vec![all_week("all-week")]);
    let account = AccountUuid::new();
    let older = ClientUuid::new();
    let newer = ClientUuid::new();

    let visits = wednesday_visits()?;

    store.add_visits(
        business,
        older,
        Some(account),
        None,
        visits.get(..2).ok_or("expected visits")?,
    );
    store.add_visits(
        business,
        newer,
        Some(account),
        None,
        visits.get(2..).ok_or("expected visits")?,
    );

    let summary = job(&store).run(now()?).await;

    assert_eq!(summary.clients_evaluated, 1);
    assert_eq!(summary.sent, 1);

    let attributions = store.attributions();

    assert_eq!(attributions.first().map(|record| record.client), Some(newer));

    Ok(())
}

#[tokio::test]
async fn anonymous_clients_are_ignored() -> TestResult {
    let store = MemoryStore::default();
    let business = store.add_business("downtown", Some(ZONE), vec![all_week("all-week")]);

    store.add_visits(
        business,
        ClientUuid::new(),
        None,
        None,
        &wednesday_visits()?,
    );

    let summary = job(&store).run(now()?).await;

    assert_eq!(summary.businesses_processed, 1);
    assert_eq!(summary.clients_evaluated, 0);
    assert_eq!(summary.skipped, 1);

    Ok(())
}

#[tokio::test]
async fn held_business_is_skipped() -> TestResult {
    let salon = salon()?;

    salon.store.state().held.insert(salon.business);

    let summary = job(&salon.store).run(now()?).await;

    assert_eq!(summary.businesses_processed, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.clients_evaluated, 0);
    assert!(salon.store.pushes().is_empty());

    Ok(())
}

#[tokio::test]
async fn lease_is_released_after_processing() -> TestResult {
    let salon = salon()?;

    job(&salon.store).run(now()?).await;

    let state = salon.store.state();

    assert_eq!(state.released, vec![salon.business]);
    assert!(state.held.is_empty());

    Ok(())
}

#[tokio::test]
async fn failing_business_does_not_stop_the_run() -> TestResult {
    let salon = salon()?;

    let broken = salon
        .store
        .add_business("uptown", Some(ZONE), vec![all_week("all-week")]);

    salon.store.state().broken_history.insert(broken);

    let summary = job(&salon.store).run(now()?).await;

    assert_eq!(summary.businesses_processed, 2);
    assert_eq!(summary.errors, 1);
    assert_eq!(summary.sent, 1);

    Ok(())
}

#[tokio::test]
async fn unknown_time_zone_counts_an_error() -> TestResult {
    let store = MemoryStore::default();
    let business = store.add_business("nowhere", Some("Mars/Olympus_Mons"), vec![all_week("a")]);

    store.add_visits(
        business,
        ClientUuid::new(),
        Some(AccountUuid::new()),
        None,
        &wednesday_visits()?,
    );

    let summary = job(&store).run(now()?).await;

    assert_eq!(summary.businesses_processed, 1);
    assert_eq!(summary.errors, 1);
    assert_eq!(summary.clients_evaluated, 0);
    assert!(store.state().released.is_empty());

    Ok(())
}

#[tokio::test]
async fn businesses_without_enabled_rules_are_not_visited() -> TestResult {
    let mut disabled = all_week("off");
    disabled.enabled = false;

    let salon = salon_with_rule(disabled)?;

    assert_eq!(job(&salon.store).run(now()?).await, RunSummary::default());

    Ok(())
}

#[tokio::test]
async fn run_can_be_restricted_to_one_business() -> TestResult {
    let salon = salon()?;
    let other = salon
        .store
        .add_business("uptown", Some(ZONE), vec![all_week("all-week")]);

    let settings = EngineSettings {
        only_business: Some(other),
        ..EngineSettings::default()
    };

    let summary = SmartPromoJob::new(salon.store.services(), settings)
        .run(now()?)
        .await;

    assert_eq!(summary.businesses_processed, 1);
    assert_eq!(summary.sent, 0);
    assert!(salon.store.attributions().is_empty());

    Ok(())
}

#[tokio::test]
async fn business_without_time_zone_uses_the_default() -> TestResult {
    let store = MemoryStore::default();
    let business = store.add_business("downtown", None, vec![all_week("all-week")]);
    let account = AccountUuid::new();

    store.add_visits(
        business,
        ClientUuid::new(),
        Some(account),
        None,
        &wednesday_visits()?,
    );

    let settings = EngineSettings {
        default_time_zone: TimeZone::get(ZONE)?,
        ..EngineSettings::default()
    };

    SmartPromoJob::new(store.services(), settings)
        .run(now()?)
        .await;

    let attributions = store.attributions();

    assert_eq!(
        attributions.first().map(|record| record.bucket),
        HabitBucketKey::new(Weekday::Wednesday, 10)
    );

    Ok(())
}
