//! Background removal of expired notes.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use snote_service::NoteService;

/// Spawn a task that purges expired notes every `interval` until `shutdown`
/// is cancelled. The first sweep runs immediately.
pub fn spawn(
    service: Arc<NoteService>,
    interval: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                _ = ticker.tick() => match service.purge_expired().await {
                    Ok(0) => {}
                    Ok(purged) => info!(purged, "expired notes purged"),
                    Err(e) => warn!(error = %e, "expired note sweep failed"),
                },
            }
        }

        debug!("sweeper stopped");
    })
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, Utc};
    use snote_core::NewNote;
    use snote_store::NoteRepository;
    use snote_store_memory::MemoryNoteRepository;

    use super::*;

    fn expired_note() -> NewNote {
        let created_at = Utc::now() - TimeDelta::hours(2);
        NewNote {
            content: b"gone".to_vec(),
            created_at,
            expires_at: created_at + TimeDelta::hours(1),
            expires_at_time_zone: "UTC".to_owned(),
            key_hash: vec![0; 32],
        }
    }

    #[tokio::test(start_paused = true)]
    async fn sweeps_until_cancelled() {
        let repo = Arc::new(MemoryNoteRepository::new());
        let service = Arc::new(
            NoteService::builder()
                .repository(repo.clone())
                .build()
                .unwrap(),
        );
        repo.create(&expired_note()).await.unwrap();

        let shutdown = CancellationToken::new();
        let handle = spawn(service, Duration::from_secs(60), shutdown.clone());

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(repo.is_empty(), "first sweep should run immediately");

        repo.create(&expired_note()).await.unwrap();
        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(repo.is_empty(), "second sweep should run after the interval");

        shutdown.cancel();
        handle.await.unwrap();
    }
}
