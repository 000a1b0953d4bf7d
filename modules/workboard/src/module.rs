use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use axum::Router;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::api::rest::routes::{register_routes, RestServices};
use crate::config::WorkboardConfig;
use crate::domain::credentials::TokenService;
use crate::domain::ports::{MailTransport, PasswordHasher};
use crate::domain::service::{
    AuthService, DirectoryService, ProjectService, TaskService, WorkloadTracker,
};
use crate::infra::mail::{LogMailTransport, MailOutbox, SmtpMailTransport};
use crate::infra::password::Argon2PasswordHasher;
use crate::infra::storage::migrations::Migrator;
use crate::infra::storage::SeaOrmRepository;

/// Fully wired workboard: services over one database, the mail outbox
/// worker and the REST routes.
pub struct Workboard {
    services: RestServices,
    outbox_cancel: CancellationToken,
    outbox_worker: JoinHandle<()>,
}

impl Workboard {
    /// Apply pending schema migrations.
    pub async fn migrate(db: &DatabaseConnection) -> anyhow::Result<()> {
        Migrator::up(db, None)
            .await
            .context("failed to run workboard migrations")?;
        info!("Workboard migrations applied");
        Ok(())
    }

    /// Build from configuration, picking the SMTP transport when mail is
    /// enabled and the log transport otherwise. Must run inside a Tokio runtime.
    pub fn init(cfg: &WorkboardConfig, db: DatabaseConnection) -> anyhow::Result<Self> {
        let transport: Arc<dyn MailTransport> = if cfg.mail.enabled {
            Arc::new(SmtpMailTransport::new(&cfg.mail)?)
        } else {
            warn!("Mail delivery is disabled; notifications will only be logged");
            Arc::new(LogMailTransport)
        };
        Self::with_transport(cfg, db, transport)
    }

    pub fn with_transport(
        cfg: &WorkboardConfig,
        db: DatabaseConnection,
        transport: Arc<dyn MailTransport>,
    ) -> anyhow::Result<Self> {
        let problems = cfg.validate();
        if !problems.is_empty() {
            bail!("invalid workboard configuration: {}", problems.join("; "));
        }

        let repo = Arc::new(SeaOrmRepository::new(db));
        let hasher: Arc<dyn PasswordHasher> = Arc::new(Argon2PasswordHasher);
        let tokens = Arc::new(TokenService::new(&cfg.jwt));

        let outbox_cancel = CancellationToken::new();
        let (outbox, outbox_worker) = MailOutbox::start(
            transport,
            cfg.mail.queue_capacity,
            Duration::from_secs(cfg.mail.timeout_secs),
            outbox_cancel.clone(),
        );
        let notifier = Arc::new(outbox);

        let workload = WorkloadTracker::new(repo.clone(), repo.clone(), repo.clone());
        let services = RestServices {
            auth: Arc::new(AuthService::new(repo.clone(), hasher, tokens.clone())),
            projects: Arc::new(ProjectService::new(
                repo.clone(),
                repo.clone(),
                workload.clone(),
                notifier.clone(),
            )),
            tasks: Arc::new(TaskService::new(
                repo.clone(),
                repo.clone(),
                repo.clone(),
                workload,
                notifier,
            )),
            directory: Arc::new(DirectoryService::new(repo)),
            tokens,
        };

        info!(
            mail_queue = cfg.mail.queue_capacity,
            token_days = cfg.jwt.expiration_days,
            "Workboard initialized"
        );
        Ok(Self {
            services,
            outbox_cancel,
            outbox_worker,
        })
    }

    pub fn services(&self) -> &RestServices {
        &self.services
    }

    /// Mount the REST API on `router`.
    pub fn register_routes(&self, router: Router) -> Router {
        register_routes(router, self.services.clone())
    }

    /// Stop accepting notifications and wait for queued mail to be delivered.
    pub async fn shutdown(self) -> anyhow::Result<()> {
        self.outbox_cancel.cancel();
        self.outbox_worker
            .await
            .context("mail worker terminated abnormally")?;
        info!("Workboard stopped");
        Ok(())
    }
}
