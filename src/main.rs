use std::sync::Arc;

use reminder_alarms::{
    clock::{Clock, SystemClock},
    notification::{FireHandling, LogNotificationHost, NotificationPresenter},
    scheduling::{AlarmAction, AlarmStore, HostFire, TokioAlarmHost, TriggerPolicy},
    service::ReminderService,
    settings::AppSettings,
    storage::{InMemoryReminderRepository, ReminderRepository},
};
use tokio::sync::mpsc;

struct App {
    service: ReminderService,
    presenter: NotificationPresenter,
    store: Arc<AlarmStore>,
    host: Arc<TokioAlarmHost>,
    fires: mpsc::UnboundedReceiver<HostFire>,
}

impl App {
    async fn build(settings: &AppSettings, clock: Arc<dyn Clock>) -> Self {
        let (host, fires) = TokioAlarmHost::new(Arc::clone(&clock));
        let host = Arc::new(host);
        let store = Arc::new(AlarmStore::new(host.clone(), TriggerPolicy::new(clock)));

        let reminders = settings.demo.reminders.iter().cloned().map(|mut reminder| {
            reminder.user_id = settings.demo.user_id.clone();
            reminder
        });
        let repository: Arc<dyn ReminderRepository> =
            Arc::new(InMemoryReminderRepository::with_reminders(reminders));

        let service = ReminderService::new(
            Arc::clone(&repository),
            Arc::clone(&store),
            &settings.scheduler,
        );
        let presenter = NotificationPresenter::new(
            Arc::clone(&store),
            Arc::new(LogNotificationHost),
            repository,
            service.codec(),
            settings.notifications.channel(),
        )
        .await;

        Self {
            service,
            presenter,
            store,
            host,
            fires,
        }
    }

    async fn run(self, user_id: &str, shutdown: impl Future<Output = ()>) {
        let App {
            service,
            presenter,
            store,
            host,
            mut fires,
        } = self;

        match service.refresh(&user_id.to_owned()).await {
            Some(report) if report.permission_denied() => {
                log::warn!("Exact alarms are not permitted, some reminders are waiting. [report = {report:?}]")
            }
            Some(report) => log::info!("Reminders reconciled. [report = {report:?}]"),
            None => log::warn!("Reminders could not be reconciled on startup"),
        }

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    log::info!(
                        "Shutting down. [armed = {}, pending_host_alarms = {}]",
                        store.armed_count().await,
                        host.pending_count()
                    );
                    break;
                }
                fire = fires.recv() => {
                    let Some(fire) = fire else { break };
                    dispatch(&presenter, &store, fire).await;
                }
            }
        }
    }
}

/// Presents the alert and, with nobody to press a button, presses Accept.
async fn dispatch(presenter: &NotificationPresenter, store: &AlarmStore, fire: HostFire) {
    let id = fire.payload.reminder_id.clone();

    match presenter.handle_fire(fire).await {
        Ok(FireHandling::Presented) => {
            let accept = store.action_request_id(&id, AlarmAction::Accept).await;
            if let Err(error) = presenter.handle_request(accept).await {
                log::error!("Could not acknowledge reminder. [reminder_id = {id}, error = {error}]");
            }
        }
        Ok(FireHandling::Discarded) => {}
        Err(error) => log::error!("Could not present reminder. [reminder_id = {id}, error = {error}]"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    pretty_env_logger::init();

    let settings = AppSettings::load()?;
    let app = App::build(&settings, Arc::new(SystemClock)).await;

    app.run(&settings.demo.user_id, async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            log::error!("Could not listen for shutdown signal. [error = {error}]");
        }
    })
    .await;

    Ok(())
}
