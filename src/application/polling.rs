//! Cancellable background polling of bulk user creation jobs.
//!
//! Each job gets one task keyed by its id. The first poll fires immediately;
//! later polls wait for the configured interval, optionally grown by a backoff
//! factor up to a ceiling. Observers read the latest status from a watch channel.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use metrics::counter;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use collabdesk_api_types::{BulkCreationState, BulkCreationStatus};

use super::api::{AdminApi, ApiError};

pub const METRIC_BULK_STATUS_POLLS: &str = "collabdesk_bulk_status_polls_total";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub backoff_factor: f64,
    pub max_interval: Duration,
    /// Transport failures in a row tolerated before the task gives up.
    pub max_consecutive_errors: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            backoff_factor: 1.0,
            max_interval: Duration::from_secs(30),
            max_consecutive_errors: 5,
        }
    }
}

impl PollPolicy {
    /// Delay after `current`, never above `max_interval`.
    pub fn next_delay(&self, current: Duration) -> Duration {
        let factor = self.backoff_factor.max(1.0);
        Duration::try_from_secs_f64(current.as_secs_f64() * factor)
            .map_or(self.max_interval, |next| next.min(self.max_interval))
    }
}

/// How a poll task ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollExit {
    Terminal(BulkCreationState),
    Cancelled,
    Errored(String),
}

pub type StatusReceiver = watch::Receiver<Option<BulkCreationStatus>>;

struct PollTask {
    stop: oneshot::Sender<()>,
    handle: JoinHandle<PollExit>,
    status: StatusReceiver,
}

/// Registry of running poll tasks. Dropping it cancels every task.
pub struct BulkStatusPoller {
    api: Arc<dyn AdminApi>,
    policy: PollPolicy,
    tasks: DashMap<Uuid, PollTask>,
}

impl BulkStatusPoller {
    pub fn new(api: Arc<dyn AdminApi>, policy: PollPolicy) -> Self {
        Self {
            api,
            policy,
            tasks: DashMap::new(),
        }
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Start polling `job`, or join the task already polling it.
    pub fn start(&self, job: Uuid) -> StatusReceiver {
        let running = self
            .tasks
            .get(&job)
            .filter(|task| !task.handle.is_finished())
            .map(|task| task.status.clone());
        if let Some(status) = running {
            return status;
        }

        let (status_tx, status_rx) = watch::channel(None);
        let (stop_tx, stop_rx) = oneshot::channel();
        let handle = tokio::spawn(poll_job(
            self.api.clone(),
            self.policy,
            job,
            status_tx,
            stop_rx,
        ));
        info!(%job, "bulk status polling started");

        self.tasks.insert(
            job,
            PollTask {
                stop: stop_tx,
                handle,
                status: status_rx.clone(),
            },
        );
        status_rx
    }

    pub fn subscribe(&self, job: Uuid) -> Option<StatusReceiver> {
        self.tasks.get(&job).map(|task| task.status.clone())
    }

    pub fn is_polling(&self, job: Uuid) -> bool {
        self.tasks
            .get(&job)
            .is_some_and(|task| !task.handle.is_finished())
    }

    /// Cancel the task for `job` and wait for it to wind down.
    pub async fn stop(&self, job: Uuid) -> Option<PollExit> {
        let (_, task) = self.tasks.remove(&job)?;
        let _ = task.stop.send(());
        Some(join(job, task.handle).await)
    }

    /// Wait for the task for `job` to end on its own.
    pub async fn wait(&self, job: Uuid) -> Option<PollExit> {
        let (_, task) = self.tasks.remove(&job)?;
        let PollTask { stop, handle, .. } = task;
        let exit = join(job, handle).await;
        drop(stop);
        Some(exit)
    }
}

impl Drop for BulkStatusPoller {
    fn drop(&mut self) {
        for task in self.tasks.iter() {
            task.handle.abort();
        }
    }
}

async fn join(job: Uuid, handle: JoinHandle<PollExit>) -> PollExit {
    match handle.await {
        Ok(exit) => exit,
        Err(err) if err.is_cancelled() => PollExit::Cancelled,
        Err(err) => {
            warn!(%job, error = %err, "bulk status poll task panicked");
            PollExit::Errored(err.to_string())
        }
    }
}

async fn poll_job(
    api: Arc<dyn AdminApi>,
    policy: PollPolicy,
    job: Uuid,
    status_tx: watch::Sender<Option<BulkCreationStatus>>,
    mut stop: oneshot::Receiver<()>,
) -> PollExit {
    let mut delay = policy.interval;
    let mut consecutive_errors = 0u32;

    loop {
        let fetched = tokio::select! {
            _ = &mut stop => return cancelled(job),
            fetched = api.get_bulk_creation_status(job) => fetched,
        };

        match fetched {
            Ok(status) => {
                consecutive_errors = 0;
                counter!(METRIC_BULK_STATUS_POLLS, "outcome" => "ok").increment(1);
                let state = status.status;
                debug!(%job, state = state.as_str(), "bulk status polled");
                status_tx.send_replace(Some(status));
                if state.is_terminal() {
                    info!(%job, state = state.as_str(), "bulk creation finished");
                    return PollExit::Terminal(state);
                }
            }
            Err(err @ ApiError::Rejected { .. }) => {
                counter!(METRIC_BULK_STATUS_POLLS, "outcome" => "rejected").increment(1);
                warn!(%job, error = %err, "bulk status rejected");
                return PollExit::Errored(err.to_string());
            }
            Err(err) => {
                consecutive_errors += 1;
                counter!(METRIC_BULK_STATUS_POLLS, "outcome" => "error").increment(1);
                warn!(
                    %job,
                    error = %err,
                    attempt = consecutive_errors,
                    "bulk status poll failed"
                );
                if consecutive_errors >= policy.max_consecutive_errors {
                    return PollExit::Errored(err.to_string());
                }
            }
        }

        tokio::select! {
            _ = &mut stop => return cancelled(job),
            _ = tokio::time::sleep(delay) => {}
        }
        delay = policy.next_delay(delay);
    }
}

fn cancelled(job: Uuid) -> PollExit {
    info!(%job, "bulk status polling cancelled");
    PollExit::Cancelled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::memory::InMemoryAdminApi;

    fn status(state: BulkCreationState, processed: u32) -> BulkCreationStatus {
        BulkCreationStatus {
            status: state,
            total_instructors: 2,
            processed_instructors: processed.min(2),
            total_students: 4,
            processed_students: processed.saturating_sub(2),
            error_message: None,
        }
    }

    #[test]
    fn default_delay_stays_at_the_interval() {
        let policy = PollPolicy::default();
        assert_eq!(policy.next_delay(policy.interval), Duration::from_secs(3));
    }

    #[test]
    fn delay_grows_until_the_ceiling() {
        let policy = PollPolicy {
            backoff_factor: 1.5,
            ..PollPolicy::default()
        };
        let mut delay = policy.interval;
        let mut seen = vec![delay];
        for _ in 0..8 {
            delay = policy.next_delay(delay);
            seen.push(delay);
        }
        assert_eq!(seen[1], Duration::from_millis(4500));
        assert_eq!(seen[2], Duration::from_millis(6750));
        assert_eq!(*seen.last().expect("delays"), Duration::from_secs(30));
        assert!(seen.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn enormous_factor_is_capped_at_the_ceiling() {
        for factor in [1e300, f64::MAX] {
            let policy = PollPolicy {
                backoff_factor: factor,
                ..PollPolicy::default()
            };
            assert_eq!(policy.next_delay(policy.interval), policy.max_interval);
            assert_eq!(policy.next_delay(Duration::MAX), policy.max_interval);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn polls_until_terminal_state() {
        let backend = Arc::new(InMemoryAdminApi::default());
        let job = backend.script_bulk_job(vec![
            status(BulkCreationState::Processing, 1),
            status(BulkCreationState::Processing, 4),
            status(BulkCreationState::Completed, 6),
        ]);
        let poller = BulkStatusPoller::new(backend.clone(), PollPolicy::default());

        let updates = poller.start(job);
        assert!(poller.is_polling(job));
        assert_eq!(
            poller.wait(job).await,
            Some(PollExit::Terminal(BulkCreationState::Completed))
        );

        let last = updates.borrow().clone().expect("status published");
        assert_eq!(last.processed_students, 4);
        assert_eq!(backend.calls_to("get_bulk_creation_status"), 3);
        assert!(!poller.is_polling(job));
    }

    #[tokio::test(start_paused = true)]
    async fn tolerates_a_few_transport_errors() {
        let backend = Arc::new(InMemoryAdminApi::default());
        let job = backend.script_bulk_job(vec![status(BulkCreationState::Completed, 6)]);
        backend.fail_next(ApiError::transport("timed out"));
        backend.fail_next(ApiError::transport("timed out"));
        let poller = BulkStatusPoller::new(backend, PollPolicy::default());

        poller.start(job);
        assert_eq!(
            poller.wait(job).await,
            Some(PollExit::Terminal(BulkCreationState::Completed))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_consecutive_errors() {
        let backend = Arc::new(InMemoryAdminApi::default());
        let job = backend.script_bulk_job(vec![status(BulkCreationState::Processing, 0)]);
        for _ in 0..5 {
            backend.fail_next(ApiError::transport("connection refused"));
        }
        let poller = BulkStatusPoller::new(backend.clone(), PollPolicy::default());

        poller.start(job);
        let exit = poller.wait(job).await.expect("task registered");
        assert!(matches!(exit, PollExit::Errored(reason) if reason.contains("connection refused")));
        assert_eq!(backend.calls_to("get_bulk_creation_status"), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_a_running_task() {
        let backend = Arc::new(InMemoryAdminApi::default());
        let job = backend.script_bulk_job(vec![status(BulkCreationState::Processing, 1)]);
        let poller = BulkStatusPoller::new(backend, PollPolicy::default());

        poller.start(job);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(poller.is_polling(job));

        assert_eq!(poller.stop(job).await, Some(PollExit::Cancelled));
        assert!(!poller.is_polling(job));
        assert_eq!(poller.stop(job).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn starting_twice_joins_the_running_task() {
        let backend = Arc::new(InMemoryAdminApi::default());
        let job = backend.script_bulk_job(vec![status(BulkCreationState::Processing, 1)]);
        let poller = BulkStatusPoller::new(backend.clone(), PollPolicy::default());

        let first = poller.start(job);
        let second = poller.start(job);
        assert!(first.same_channel(&second));
        poller.stop(job).await;
    }
}
