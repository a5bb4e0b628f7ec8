// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Submit / poll / fetch driver for task-queue style APIs.
//!
//! Some metered APIs do not answer inline: they accept a task, hand back a
//! task id, and expect the client to poll until the task is terminal and then
//! download the result from a URL. [`PollingBackend`] runs that loop on top of
//! a caller-provided [`TaskApi`] and presents it as a [`RemoteBackend`].

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::backends::remote::RemoteBackend;
use crate::config::consts::{DEFAULT_MAX_POLL_ATTEMPTS, DEFAULT_POLL_INTERVAL};
use crate::errors::ProviderError;
use crate::observability::messages::provider::{PollingExhausted, TaskSubmitted};
use crate::observability::messages::StructuredLog;

/// State of a submitted task as reported by the API.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskState {
    Pending,
    /// Terminal success; `results` are locations to fetch, first one wins
    Succeeded { results: Vec<String> },
    Failed { message: String },
}

/// The three calls of a task-queue API.
#[async_trait]
pub trait TaskApi: Send + Sync {
    /// Upload/submit the image and return the task id.
    async fn submit(&self, model_id: &str, image: Arc<[u8]>) -> Result<String, ProviderError>;

    async fn status(&self, task_id: &str) -> Result<TaskState, ProviderError>;

    async fn fetch(&self, location: &str) -> Result<Vec<u8>, ProviderError>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
        }
    }
}

impl PollPolicy {
    /// Longest a task can stay pending before the driver gives up.
    pub fn budget(&self) -> Duration {
        self.interval * self.max_attempts
    }
}

pub struct PollingBackend {
    api: Arc<dyn TaskApi>,
    policy: PollPolicy,
}

impl PollingBackend {
    pub fn new(api: Arc<dyn TaskApi>) -> Self {
        Self::with_policy(api, PollPolicy::default())
    }

    pub fn with_policy(api: Arc<dyn TaskApi>, policy: PollPolicy) -> Self {
        Self { api, policy }
    }

    async fn wait_for_results(&self, task_id: &str) -> Result<Vec<String>, ProviderError> {
        for attempt in 0..self.policy.max_attempts {
            match self.api.status(task_id).await? {
                TaskState::Succeeded { results } => return Ok(results),
                TaskState::Failed { message } => {
                    return Err(ProviderError::Failed(format!("task {} failed: {}", task_id, message)))
                }
                TaskState::Pending if attempt + 1 < self.policy.max_attempts => {
                    tokio::time::sleep(self.policy.interval).await;
                }
                TaskState::Pending => {}
            }
        }

        PollingExhausted {
            task_id,
            attempts: self.policy.max_attempts,
        }
        .log();
        Err(ProviderError::Timeout(self.policy.budget()))
    }
}

#[async_trait]
impl RemoteBackend for PollingBackend {
    async fn remove_background(&self, model_id: &str, image: Arc<[u8]>) -> Result<Vec<u8>, ProviderError> {
        let task_id = self.api.submit(model_id, image).await?;
        TaskSubmitted {
            model_id,
            task_id: &task_id,
        }
        .log();

        let results = self.wait_for_results(&task_id).await?;
        // A finished task with nothing to download is a failure, not something to poll again.
        let location = results.first().ok_or_else(|| {
            ProviderError::Failed(format!("task {} succeeded without any result", task_id))
        })?;

        self.api.fetch(location).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Replays a fixed sequence of states, then stays pending.
    struct ScriptedApi {
        states: Mutex<VecDeque<TaskState>>,
        polls: AtomicU32,
    }

    impl ScriptedApi {
        fn new(states: Vec<TaskState>) -> Arc<Self> {
            Arc::new(Self {
                states: Mutex::new(states.into()),
                polls: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl TaskApi for ScriptedApi {
        async fn submit(&self, model_id: &str, _image: Arc<[u8]>) -> Result<String, ProviderError> {
            Ok(format!("task-{}", model_id))
        }

        async fn status(&self, _task_id: &str) -> Result<TaskState, ProviderError> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            let next = self.states.lock().unwrap().pop_front();
            Ok(next.unwrap_or(TaskState::Pending))
        }

        async fn fetch(&self, location: &str) -> Result<Vec<u8>, ProviderError> {
            Ok(location.as_bytes().to_vec())
        }
    }

    fn policy() -> PollPolicy {
        PollPolicy {
            interval: Duration::from_secs(2),
            max_attempts: 5,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_until_success_and_fetches_first_result() {
        let api = ScriptedApi::new(vec![
            TaskState::Pending,
            TaskState::Pending,
            TaskState::Succeeded {
                results: vec!["cdn://a.png".into(), "cdn://b.png".into()],
            },
        ]);
        let backend = PollingBackend::with_policy(api.clone(), policy());

        let started = tokio::time::Instant::now();
        let bytes = backend
            .remove_background("recraft", Arc::from(&b"img"[..]))
            .await
            .unwrap();

        assert_eq!(bytes, b"cdn://a.png".to_vec());
        assert_eq!(api.polls.load(Ordering::SeqCst), 3);
        assert_eq!(started.elapsed(), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_states_table_driven() {
        struct TestCase {
            name: &'static str,
            states: Vec<TaskState>,
            check: fn(&Result<Vec<u8>, ProviderError>) -> bool,
        }

        let test_cases = vec![
            TestCase {
                name: "task failure is a provider failure",
                states: vec![TaskState::Failed {
                    message: "unsupported image".into(),
                }],
                check: |r| matches!(r, Err(ProviderError::Failed(m)) if m.contains("unsupported image")),
            },
            TestCase {
                name: "success without results is a failure",
                states: vec![TaskState::Succeeded { results: vec![] }],
                check: |r| matches!(r, Err(ProviderError::Failed(m)) if m.contains("without any result")),
            },
            TestCase {
                name: "never finishing runs out of attempts",
                states: vec![],
                check: |r| *r == Err(ProviderError::Timeout(Duration::from_secs(10))),
            },
        ];

        for test_case in test_cases {
            let api = ScriptedApi::new(test_case.states);
            let backend = PollingBackend::with_policy(api.clone(), policy());
            let result = backend.remove_background("m", Arc::from(&b"x"[..])).await;
            assert!((test_case.check)(&result), "{}: got {:?}", test_case.name, result);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_polls_exactly_max_attempts() {
        let api = ScriptedApi::new(vec![]);
        let backend = PollingBackend::with_policy(api.clone(), policy());
        let _ = backend.remove_background("m", Arc::from(&b"x"[..])).await;
        assert_eq!(api.polls.load(Ordering::SeqCst), 5);
    }
}
