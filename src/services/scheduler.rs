use tokio_cron_scheduler::{Job, JobScheduler};

use crate::error::BotError;
use crate::services::polls::{Announcement, PollCoordinator};
use crate::utils::logging::{log_job_error, log_system_event};

/// Drives the poll coordinator on two cron schedules.
pub struct PollScheduler {
    coordinator: PollCoordinator,
    scheduler: JobScheduler,
    send_cron: String,
    tally_cron: String,
}

impl PollScheduler {
    pub async fn new(
        coordinator: PollCoordinator,
        send_cron: impl Into<String>,
        tally_cron: impl Into<String>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let scheduler = JobScheduler::new().await?;

        Ok(Self {
            coordinator,
            scheduler,
            send_cron: send_cron.into(),
            tally_cron: tally_cron.into(),
        })
    }

    pub async fn start(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let coordinator = self.coordinator.clone();
        let send_job = Job::new_async(self.send_cron.as_str(), move |_uuid, _l| {
            let coordinator = coordinator.clone();
            Box::pin(async move {
                run_send(&coordinator).await;
            })
        })?;

        let coordinator = self.coordinator.clone();
        let tally_job = Job::new_async(self.tally_cron.as_str(), move |_uuid, _l| {
            let coordinator = coordinator.clone();
            Box::pin(async move {
                run_tally(&coordinator).await;
            })
        })?;

        self.scheduler.add(send_job).await?;
        self.scheduler.add(tally_job).await?;
        self.scheduler.start().await?;

        tracing::info!(
            "Poll scheduler started - sending on '{}', tallying on '{}' (UTC)",
            self.send_cron, self.tally_cron
        );
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.scheduler.shutdown().await?;
        Ok(())
    }
}

async fn run_send(coordinator: &PollCoordinator) {
    match coordinator.send_scheduled_polls().await {
        Ok(polls) => log_system_event("Scheduled polls sent", Some(&format!("{} polls", polls.len()))),
        Err(BotError::InsufficientData) => log_system_event("Scheduled polls skipped", Some("not enough places")),
        Err(e) => log_job_error("send_scheduled_polls", &e.to_string()),
    }
}

async fn run_tally(coordinator: &PollCoordinator) {
    match coordinator.tally_and_announce().await {
        Ok(Announcement::Winners { time_slot, place }) => {
            log_system_event("Poll results announced", Some(&format!("{place} at {time_slot}")))
        }
        Ok(Announcement::NotEnoughData) => log_system_event("Poll results announced", Some("not enough data")),
        Err(e) => log_job_error("tally_and_announce", &e.to_string()),
    }
}
