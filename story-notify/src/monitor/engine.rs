//! The polling loop.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use story_api::{Notification, StoryApi};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::cursor::PollCursor;
use crate::config::Preferences;
use crate::credentials::{RecoveryOutcome, SessionRecovery};
use crate::notification::{NotificationEnricher, Notifier, filter_reason};
use crate::{Error, Result};

/// What a single cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Nothing unseen; the feed was not fetched.
    Idle,
    /// The feed was empty.
    Empty,
    /// The feed was walked and the cursor advanced.
    Polled { displayed: usize, filtered: usize },
    /// The session expired and could not be recovered this time.
    RecoverySkipped(RecoveryOutcome),
}

/// Polls the notification feed on a fixed interval and shows what is new.
///
/// Cycles never overlap: the next one is scheduled only after the previous
/// one has finished, however long it took.
pub struct PollingEngine {
    api: Arc<dyn StoryApi>,
    recovery: Arc<SessionRecovery>,
    preferences: Preferences,
    enricher: NotificationEnricher,
    notifier: Arc<dyn Notifier>,
    cursor: PollCursor,
    interval: Duration,
}

impl PollingEngine {
    pub fn new(
        api: Arc<dyn StoryApi>,
        recovery: Arc<SessionRecovery>,
        preferences: Preferences,
        notifier: Arc<dyn Notifier>,
        interval: Duration,
    ) -> Self {
        Self {
            enricher: NotificationEnricher::new(api.clone()),
            api,
            recovery,
            preferences,
            notifier,
            cursor: PollCursor::new(),
            interval,
        }
    }

    pub fn cursor(&self) -> &PollCursor {
        &self.cursor
    }

    /// Run until `cancel` fires. The first cycle starts one interval after the call.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!(
            interval_ms = self.interval.as_millis() as u64,
            notifier = self.notifier.name(),
            "Polling engine started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
            self.tick().await;
        }

        info!("Polling engine stopped");
    }

    /// One cycle with every error and panic contained.
    async fn tick(&mut self) {
        match AssertUnwindSafe(self.run_cycle()).catch_unwind().await {
            Ok(Ok(CycleOutcome::Polled { displayed, filtered })) if displayed + filtered > 0 => {
                info!(displayed, filtered, "Poll cycle finished");
            }
            Ok(Ok(outcome)) => debug!(?outcome, "Poll cycle finished"),
            Ok(Err(e)) => warn!(error = %e, "Poll cycle failed"),
            Err(panic) => error!(panic = %panic_message(&*panic), "Poll cycle panicked"),
        }
    }

    /// Run a single cycle. After a successful session recovery the cycle is
    /// retried once; a second expiry is returned as an error.
    #[instrument(skip(self), fields(cursor = ?self.cursor.last_seen_id()))]
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome> {
        match self.poll().await {
            Err(e) if e.is_session_expired() => {
                warn!("Session expired");
                let outcome = self.recovery.recover().await;
                if !outcome.is_recovered() {
                    return Ok(CycleOutcome::RecoverySkipped(outcome));
                }
                self.poll().await
            }
            other => other,
        }
    }

    async fn poll(&mut self) -> Result<CycleOutcome> {
        let status = self.api.notification_status().await?;
        if !status.has_unseen() && self.cursor.is_primed() {
            return Ok(CycleOutcome::Idle);
        }

        let feed = self.api.notifications().await?;
        let Some(first) = feed.first() else {
            return Ok(CycleOutcome::Empty);
        };

        let fresh = self.cursor.fresh_records(&feed);
        let result = self.display_all(fresh).await;
        self.cursor.advance(first);
        result
    }

    /// Show `records` newest first. The first failure ends the walk.
    async fn display_all(&self, records: &[Notification]) -> Result<CycleOutcome> {
        let mut displayed = 0;
        let mut filtered = 0;

        for notification in records {
            match AssertUnwindSafe(self.display_one(notification))
                .catch_unwind()
                .await
            {
                Ok(Ok(true)) => displayed += 1,
                Ok(Ok(false)) => filtered += 1,
                Ok(Err(e)) => {
                    warn!(
                        id = %notification.id,
                        displayed,
                        error = %e,
                        "Display failed, ending walk"
                    );
                    return Err(e);
                }
                Err(panic) => {
                    return Err(Error::other(format!(
                        "display of {} panicked: {}",
                        notification.id,
                        panic_message(&*panic)
                    )));
                }
            }
        }

        Ok(CycleOutcome::Polled {
            displayed,
            filtered,
        })
    }

    /// Filter, enrich and show one record. Returns whether it was shown.
    async fn display_one(&self, notification: &Notification) -> Result<bool> {
        let prefs = self.preferences.notification_preferences();
        if let Some(reason) = filter_reason(notification, &prefs) {
            debug!(id = %notification.id, ?reason, "Notification filtered");
            return Ok(false);
        }

        let alert = self.enricher.enrich(notification).await;
        self.notifier.display(&alert).await?;
        Ok(true)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MemorySettings, PreferenceKey};
    use crate::testing::{
        FakeApi, FakeAuth, FakeCredentials, GatedAuth, Misbehave, RecordingNotifier, at,
        notification,
    };

    struct Harness {
        api: Arc<FakeApi>,
        auth: Arc<FakeAuth>,
        notifier: Arc<RecordingNotifier>,
        preferences: Preferences,
        engine: PollingEngine,
    }

    fn harness_with(auth: FakeAuth) -> Harness {
        let api = Arc::new(FakeApi::new());
        let auth = Arc::new(auth);
        let notifier = Arc::new(RecordingNotifier::new());
        let preferences = Preferences::new(Arc::new(MemorySettings::new()));
        let recovery = Arc::new(SessionRecovery::new(
            api.clone(),
            auth.clone(),
            Arc::new(FakeCredentials::valid()),
        ));
        let engine = PollingEngine::new(
            api.clone(),
            recovery,
            preferences.clone(),
            notifier.clone(),
            Duration::from_millis(10),
        );
        Harness {
            api,
            auth,
            notifier,
            preferences,
            engine,
        }
    }

    fn harness() -> Harness {
        harness_with(FakeAuth::succeeding())
    }

    /// Run the priming cycle against a feed whose newest entry is at `secs`.
    async fn prime(h: &mut Harness, secs: i64) {
        h.api.set_feed(vec![notification("seed", secs, false)]);
        h.engine.run_cycle().await.unwrap();
        assert_eq!(h.engine.cursor().last_seen_at(), Some(at(secs)));
    }

    #[tokio::test]
    async fn test_first_cycle_only_primes() {
        let mut h = harness();
        h.api.set_feed(vec![
            notification("r2", 20, true),
            notification("r1", 10, true),
        ]);

        let outcome = h.engine.run_cycle().await.unwrap();

        assert_eq!(
            outcome,
            CycleOutcome::Polled {
                displayed: 0,
                filtered: 0
            }
        );
        assert_eq!(h.notifier.count(), 0);
        assert_eq!(h.engine.cursor().last_seen_id(), Some("r2"));
        assert_eq!(h.engine.cursor().last_seen_at(), Some(at(20)));
    }

    #[tokio::test]
    async fn test_first_cycle_fetches_even_when_nothing_unseen() {
        let mut h = harness();
        h.api.set_unseen(0);
        h.api.set_feed(vec![notification("r1", 10, false)]);

        h.engine.run_cycle().await.unwrap();

        assert_eq!(h.api.feed_calls(), 1);
        assert_eq!(h.engine.cursor().last_seen_id(), Some("r1"));
    }

    #[tokio::test]
    async fn test_new_records_shown_newest_first() {
        let mut h = harness();
        prime(&mut h, 35).await;

        h.api.set_feed(vec![
            notification("r5", 50, true),
            notification("r4", 40, true),
            notification("r3", 30, false),
            notification("r2", 20, true),
        ]);
        let outcome = h.engine.run_cycle().await.unwrap();

        assert_eq!(
            outcome,
            CycleOutcome::Polled {
                displayed: 2,
                filtered: 0
            }
        );
        assert_eq!(h.notifier.titles(), vec!["message r5", "message r4"]);
        assert_eq!(h.engine.cursor().last_seen_id(), Some("r5"));
    }

    #[tokio::test]
    async fn test_same_feed_is_not_shown_twice() {
        let mut h = harness();
        prime(&mut h, 10).await;

        h.api.set_feed(vec![
            notification("r2", 20, true),
            notification("seed", 10, false),
        ]);
        h.engine.run_cycle().await.unwrap();
        h.engine.run_cycle().await.unwrap();

        assert_eq!(h.notifier.titles(), vec!["message r2"]);
    }

    #[tokio::test]
    async fn test_nothing_unseen_skips_feed_after_priming() {
        let mut h = harness();
        prime(&mut h, 10).await;
        assert_eq!(h.api.feed_calls(), 1);

        h.api.set_unseen(0);
        let outcome = h.engine.run_cycle().await.unwrap();

        assert_eq!(outcome, CycleOutcome::Idle);
        assert_eq!(h.api.feed_calls(), 1);
        assert_eq!(h.api.status_calls(), 2);
    }

    #[tokio::test]
    async fn test_empty_feed_is_not_an_error() {
        let mut h = harness();
        prime(&mut h, 10).await;

        h.api.set_feed(Vec::new());
        let outcome = h.engine.run_cycle().await.unwrap();

        assert_eq!(outcome, CycleOutcome::Empty);
        assert_eq!(h.engine.cursor().last_seen_id(), Some("seed"));
    }

    #[tokio::test]
    async fn test_filtered_records_still_advance_cursor() {
        let mut h = harness();
        prime(&mut h, 10).await;
        h.preferences
            .set(PreferenceKey::EmotionNotifications, false)
            .unwrap();

        let mut liked = notification("like", 30, true);
        liked.emotion = Some(serde_json::json!({"id": "like"}));
        h.api.set_feed(vec![liked, notification("r2", 20, true)]);

        let outcome = h.engine.run_cycle().await.unwrap();

        assert_eq!(
            outcome,
            CycleOutcome::Polled {
                displayed: 1,
                filtered: 1
            }
        );
        assert_eq!(h.notifier.titles(), vec!["message r2"]);
        assert_eq!(h.engine.cursor().last_seen_id(), Some("like"));
    }

    #[tokio::test]
    async fn test_display_failure_still_advances_cursor() {
        let mut h = harness();
        prime(&mut h, 10).await;
        h.notifier.misbehave_on("message r3", Misbehave::Fail);

        h.api.set_feed(vec![
            notification("r3", 30, true),
            notification("r2", 20, true),
        ]);

        assert!(h.engine.run_cycle().await.is_err());
        assert_eq!(h.engine.cursor().last_seen_id(), Some("r3"));
        assert_eq!(h.notifier.count(), 0);

        // The failing record is not retried.
        let outcome = h.engine.run_cycle().await.unwrap();
        assert_eq!(
            outcome,
            CycleOutcome::Polled {
                displayed: 0,
                filtered: 0
            }
        );
    }

    #[tokio::test]
    async fn test_display_panic_still_advances_cursor() {
        let mut h = harness();
        prime(&mut h, 10).await;
        h.notifier.misbehave_on("message r2", Misbehave::Panic);

        h.api.set_feed(vec![
            notification("r3", 30, true),
            notification("r2", 20, true),
        ]);

        let err = h.engine.run_cycle().await.unwrap_err();
        assert!(err.to_string().contains("panicked"));
        assert_eq!(h.notifier.titles(), vec!["message r3"]);
        assert_eq!(h.engine.cursor().last_seen_id(), Some("r3"));
    }

    #[tokio::test]
    async fn test_expired_session_recovers_and_retries() {
        let mut h = harness();
        h.api.set_feed(vec![notification("r1", 10, true)]);
        h.api.expire_session();

        let outcome = h.engine.run_cycle().await.unwrap();

        assert_eq!(
            outcome,
            CycleOutcome::Polled {
                displayed: 0,
                filtered: 0
            }
        );
        assert_eq!(h.auth.calls(), 1);
        assert_eq!(h.api.installed_sessions(), 1);
        assert_eq!(h.api.status_calls(), 2);
        assert_eq!(h.engine.cursor().last_seen_id(), Some("r1"));
    }

    #[tokio::test]
    async fn test_failed_recovery_leaves_cursor_untouched() {
        let mut h = harness_with(FakeAuth::failing());
        h.api.set_feed(vec![notification("r1", 10, true)]);
        h.api.expire_session();

        let outcome = h.engine.run_cycle().await.unwrap();

        assert!(matches!(
            outcome,
            CycleOutcome::RecoverySkipped(RecoveryOutcome::Failed(_))
        ));
        assert!(!h.engine.cursor().is_primed());
        assert_eq!(h.api.feed_calls(), 0);
    }

    #[tokio::test]
    async fn test_second_expiry_after_recovery_is_an_error() {
        let mut h = harness();
        h.api.set_feed(vec![notification("r1", 10, true)]);
        h.api.expire_session();
        h.api.reject_new_sessions();

        let err = h.engine.run_cycle().await.unwrap_err();

        assert!(err.is_session_expired());
        assert_eq!(h.auth.calls(), 1);
        assert_eq!(h.api.installed_sessions(), 1);
        assert_eq!(h.api.status_calls(), 2);
        assert_eq!(h.api.feed_calls(), 0);
        assert!(!h.engine.cursor().is_primed());
    }

    #[tokio::test]
    async fn test_login_in_progress_skips_cycle() {
        let api = Arc::new(FakeApi::new());
        let auth = Arc::new(GatedAuth::new(true));
        let notifier = Arc::new(RecordingNotifier::new());
        let recovery = Arc::new(SessionRecovery::new(
            api.clone(),
            auth.clone(),
            Arc::new(FakeCredentials::valid()),
        ));
        let mut engine = PollingEngine::new(
            api.clone(),
            recovery.clone(),
            Preferences::new(Arc::new(MemorySettings::new())),
            notifier.clone(),
            Duration::from_millis(10),
        );
        api.set_feed(vec![notification("r1", 10, true)]);
        api.expire_session();

        let login = tokio::spawn({
            let recovery = recovery.clone();
            async move { recovery.recover().await }
        });
        auth.wait_entered().await;

        let outcome = engine.run_cycle().await.unwrap();

        assert_eq!(
            outcome,
            CycleOutcome::RecoverySkipped(RecoveryOutcome::InProgress)
        );
        assert!(!engine.cursor().is_primed());
        assert_eq!(api.feed_calls(), 0);
        assert_eq!(notifier.count(), 0);

        auth.release();
        assert_eq!(login.await.unwrap(), RecoveryOutcome::Recovered);
        assert_eq!(auth.calls(), 1);
    }

    #[tokio::test]
    async fn test_run_keeps_polling_until_cancelled() {
        let h = harness();
        h.api.set_feed(vec![notification("r1", 10, true)]);
        let api = h.api.clone();

        let cancel = CancellationToken::new();
        let task = tokio::spawn(h.engine.run(cancel.clone()));

        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("engine did not stop")
            .unwrap();

        assert!(api.status_calls() >= 2);
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(&*payload), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(&*payload), "bang");
        let payload: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(&*payload), "unknown panic payload");
    }
}
