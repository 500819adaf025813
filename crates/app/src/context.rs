//! App Context

use std::sync::Arc;

use thiserror::Error;

use crate::{
    config::RunConfig,
    database::{self, Db},
    domain::{
        appointments::PgAppointmentsService,
        attribution::PgAttributionService,
        businesses::PgBusinessesService,
        catalog::PgCatalogService,
        notifications::{
            PgNotificationsService,
            push::{DisabledPushSender, HttpPushSender, PushError, PushSender},
        },
        preferences::PgPreferencesService,
        promotions::RuleWindowEvaluator,
    },
    job::{JobServices, PgBusinessLeases, SmartPromoJob},
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),

    #[error("failed to build push gateway client")]
    PushGateway(#[source] PushError),
}

#[derive(Debug, Clone)]
pub struct AppContext {
    pub job: SmartPromoJob,
}

impl AppContext {
    /// Connect to the store and wire the job's collaborators.
    ///
    /// # Errors
    ///
    /// Returns an error when establishing a database connection or building
    /// the push client fails.
    pub async fn from_config(config: &RunConfig) -> Result<Self, AppInitError> {
        let pool = database::connect(&config.database.database_url)
            .await
            .map_err(AppInitError::Database)?;

        let db = Db::new(pool);

        let push: Arc<dyn PushSender> = match config.push.gateway() {
            Some(gateway) => {
                Arc::new(HttpPushSender::new(gateway).map_err(AppInitError::PushGateway)?)
            }
            None => Arc::new(DisabledPushSender),
        };

        let services = JobServices {
            businesses: Arc::new(PgBusinessesService::new(db.clone())),
            appointments: Arc::new(PgAppointmentsService::new(db.clone())),
            catalog: Arc::new(PgCatalogService::new(db.clone())),
            preferences: Arc::new(PgPreferencesService::new(db.clone())),
            attribution: Arc::new(PgAttributionService::new(db.clone())),
            notifications: Arc::new(PgNotificationsService::new(db.clone())),
            push,
            evaluator: Arc::new(RuleWindowEvaluator),
            leases: Arc::new(PgBusinessLeases::new(db)),
        };

        Ok(Self {
            job: SmartPromoJob::new(services, config.settings()),
        })
    }
}
