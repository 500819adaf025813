//! Smart Promotions Job
//!
//! One run visits each selected business in turn and, within a business, each
//! account in turn. Every failure is logged and counted; nothing aborts the run.

use std::sync::Arc;

use jiff::{Timestamp, tz::TimeZone};
use rustc_hash::FxHashMap;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::domain::{
    appointments::{AppointmentsService, HistoryWindow, records::AccountUuid},
    attribution::{
        AttributionLedger, AttributionRequest, AttributionService, AttributionState, SettleError,
    },
    businesses::{BusinessesService, records::BusinessRecord},
    catalog::{
        CatalogService,
        records::{ServiceRecord, ServiceUuid},
    },
    eligibility::EligibilityFilter,
    habits::{ClientHabitProfile, HabitMiner, group_by_account},
    notifications::{
        NotificationDispatcher, NotificationsService,
        copy::{PromoMessage, PromoOffer},
        push::PushSender,
    },
    preferences::PreferencesService,
    promotions::{PromoEvaluator, PromoRule},
    slots::SlotProjector,
};

mod lease;
mod settings;
mod summary;

pub use lease::{BusinessLease, BusinessLeases, LeaseError, LeaseGuard, PgBusinessLeases};
pub use settings::EngineSettings;
pub use summary::RunSummary;

use summary::CandidateOutcome;

/// Collaborators of a run.
#[derive(Clone)]
pub struct JobServices {
    pub businesses: Arc<dyn BusinessesService>,
    pub appointments: Arc<dyn AppointmentsService>,
    pub catalog: Arc<dyn CatalogService>,
    pub preferences: Arc<dyn PreferencesService>,
    pub attribution: Arc<dyn AttributionService>,
    pub notifications: Arc<dyn NotificationsService>,
    pub push: Arc<dyn PushSender>,
    pub evaluator: Arc<dyn PromoEvaluator>,
    pub leases: Arc<dyn BusinessLeases>,
}

impl std::fmt::Debug for JobServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobServices").finish_non_exhaustive()
    }
}

/// The smart promotions batch job.
#[derive(Debug, Clone)]
pub struct SmartPromoJob {
    services: JobServices,
    ledger: AttributionLedger,
    dispatcher: NotificationDispatcher,
    miner: HabitMiner,
    projector: SlotProjector,
    settings: EngineSettings,
}

/// Everything known about a business once its data is loaded.
struct BusinessRun<'a> {
    business: &'a BusinessRecord,
    time_zone: TimeZone,
    rules: Vec<PromoRule>,
    services: FxHashMap<ServiceUuid, ServiceRecord>,
    eligibility: EligibilityFilter,
}

impl SmartPromoJob {
    pub fn new(services: JobServices, settings: EngineSettings) -> Self {
        Self {
            ledger: AttributionLedger::new(
                Arc::clone(&services.attribution),
                settings.attribution_ttl,
            ),
            dispatcher: NotificationDispatcher::new(
                Arc::clone(&services.notifications),
                Arc::clone(&services.push),
            ),
            miner: HabitMiner::new(settings.min_support),
            projector: SlotProjector::new(settings.slot_window),
            services,
            settings,
        }
    }

    /// Run once as of `now`.
    #[tracing::instrument(name = "job.run", skip(self), fields(now = %now))]
    pub async fn run(&self, now: Timestamp) -> RunSummary {
        let mut summary = RunSummary::default();

        let businesses = match self
            .services
            .businesses
            .list_eligible_businesses(self.settings.only_business, self.settings.max_businesses)
            .await
        {
            Ok(businesses) => businesses,
            Err(error) => {
                error!(%error, "failed to select businesses");
                summary.errors += 1;

                return summary;
            }
        };

        for business in &businesses {
            let span = info_span!("job.business", business_id = %business.id, slug = %business.slug);

            summary += self.process_business(business, now).instrument(span).await;
        }

        info!(
            businesses_processed = summary.businesses_processed,
            clients_evaluated = summary.clients_evaluated,
            candidates_found = summary.candidates_found,
            sent = summary.sent,
            skipped = summary.skipped,
            errors = summary.errors,
            "smart promotions run finished"
        );

        summary
    }

    async fn process_business(&self, business: &BusinessRecord, now: Timestamp) -> RunSummary {
        let mut summary = RunSummary::business();

        let time_zone = match business.time_zone(&self.settings.default_time_zone) {
            Ok(time_zone) => time_zone,
            Err(error) => {
                error!(%error, timezone = ?business.timezone, "unknown business time zone");
                summary.errors += 1;

                return summary;
            }
        };

        let rules = business.enabled_rules();

        if rules.is_empty() {
            debug!("no usable promo rules");
            summary.skipped += 1;

            return summary;
        }

        let lease = match self.services.leases.try_acquire(business.id).await {
            Ok(Some(lease)) => lease,
            Ok(None) => {
                warn!("business is being processed elsewhere, skipping");
                summary.skipped += 1;

                return summary;
            }
            Err(error) => {
                error!(%error, "failed to acquire business lease");
                summary.errors += 1;

                return summary;
            }
        };

        summary += self.process_leased(business, time_zone, rules, now).await;

        if let Err(error) = lease.release().await {
            warn!(%error, "failed to release business lease");
        }

        summary
    }

    async fn process_leased(
        &self,
        business: &BusinessRecord,
        time_zone: TimeZone,
        rules: Vec<PromoRule>,
        now: Timestamp,
    ) -> RunSummary {
        let mut summary = RunSummary::default();

        if let Err(error) = self.ledger.recover(business.id, now).await {
            error!(%error, "failed to recover unsettled attributions");
            summary.errors += 1;

            return summary;
        }

        let Some(profiles) = self.load_profiles(business, now).await else {
            summary.errors += 1;

            return summary;
        };

        if profiles.is_empty() {
            debug!("no mineable accounts");
            summary.skipped += 1;

            return summary;
        }

        let Some(run) = self
            .load_business_run(business, time_zone, rules, &profiles, now)
            .await
        else {
            summary.errors += 1;

            return summary;
        };

        for profile in &profiles {
            let outcome = self
                .process_account(&run, profile, now)
                .instrument(info_span!("job.account", account_id = %profile.account))
                .await;

            summary.record(outcome);
        }

        summary
    }

    async fn load_profiles(
        &self,
        business: &BusinessRecord,
        now: Timestamp,
    ) -> Option<Vec<ClientHabitProfile>> {
        let window = HistoryWindow {
            lookback: self.settings.history_lookback,
            row_cap: self.settings.history_row_cap,
        };

        match self
            .services
            .appointments
            .load_completed_history(business.id, now, window)
            .await
        {
            Ok(history) => Some(group_by_account(&history)),
            Err(error) => {
                error!(%error, "failed to load appointment history");

                None
            }
        }
    }

    async fn load_business_run<'a>(
        &self,
        business: &'a BusinessRecord,
        time_zone: TimeZone,
        rules: Vec<PromoRule>,
        profiles: &[ClientHabitProfile],
        now: Timestamp,
    ) -> Option<BusinessRun<'a>> {
        let accounts: Vec<AccountUuid> = profiles.iter().map(|profile| profile.account).collect();
        let since = now
            .checked_sub(self.settings.cooldown)
            .unwrap_or(Timestamp::MIN);

        let cooling_down = self
            .ledger
            .cooling_down(business.id, &accounts, since)
            .await
            .inspect_err(|error| error!(%error, "failed to load cooldowns"))
            .ok()?;

        let preferences = self
            .services
            .preferences
            .load_preferences(business.id, &accounts)
            .await
            .inspect_err(|error| error!(%error, "failed to load preferences"))
            .ok()?;

        let services = self
            .services
            .catalog
            .list_services(business.id)
            .await
            .inspect_err(|error| error!(%error, "failed to load service catalog"))
            .ok()?;

        Some(BusinessRun {
            business,
            time_zone,
            rules,
            services: services
                .into_iter()
                .map(|service| (service.id, service))
                .collect(),
            eligibility: EligibilityFilter::new(now, cooling_down, preferences),
        })
    }

    async fn process_account(
        &self,
        run: &BusinessRun<'_>,
        profile: &ClientHabitProfile,
        now: Timestamp,
    ) -> CandidateOutcome {
        if let Err(reason) = run.eligibility.check(profile.account) {
            debug!(?reason, "account not eligible");

            return CandidateOutcome::Ineligible(reason);
        }

        let Some(habit) = self.miner.mine(profile, &run.time_zone) else {
            debug!(samples = profile.samples.len(), "no habit");

            return CandidateOutcome::NoHabit;
        };

        let Some(slot) = self.projector.project(habit.bucket, now, &run.time_zone) else {
            debug!(
                weekday = habit.bucket.weekday_number(),
                hour = habit.bucket.hour(),
                "habit does not fall within the slot window"
            );

            return CandidateOutcome::NoSlot;
        };

        let service = habit
            .service
            .and_then(|id| run.services.get(&id))
            .filter(|service| service.is_active);

        let evaluation = self.services.evaluator.evaluate(
            &run.rules,
            slot,
            service.map(|service| service.id),
            service.map_or(0, |service| service.price),
            &run.time_zone,
        );

        let Some(rule) = evaluation.rule.as_ref() else {
            debug!(reason = ?evaluation.reason, %slot, "no promo applies");

            return CandidateOutcome::NoPromo;
        };

        let request = AttributionRequest {
            business: run.business.id,
            client: profile.client,
            account: profile.account,
            bucket: habit.bucket,
            promo_rule: rule.uuid(),
        };

        let reservation = match self.ledger.reserve(request, now).await {
            Ok(reservation) => reservation,
            Err(error) => {
                error!(%error, "failed to reserve attribution");

                return CandidateOutcome::ReservationFailed;
            }
        };

        let message = PromoMessage::compose(
            PromoOffer {
                business: run.business,
                account: profile.account,
                rule,
                service_name: service.map(|service| service.name.as_str()),
                token: reservation.token(),
            },
            &self.settings.booking_path_prefix,
        );

        let outcome = self.dispatcher.dispatch(&message).await;

        match self.ledger.settle(reservation, &outcome, now).await {
            Ok(AttributionState::Sent) => {
                info!(
                    %slot,
                    rule_id = %rule.id,
                    push = outcome.push_delivered,
                    in_app = outcome.in_app.is_some(),
                    "sent smart promotion"
                );

                CandidateOutcome::Sent
            }
            Ok(AttributionState::RolledBack) => {
                warn!("every channel failed, reservation rolled back");

                CandidateOutcome::Undelivered
            }
            Err(SettleError {
                intended: AttributionState::Sent,
                ..
            }) => CandidateOutcome::SentNotRecorded,
            Err(_) => CandidateOutcome::UndeliveredNotReleased,
        }
    }
}

#[cfg(test)]
mod tests;
