// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Load-once cache of local inference sessions, keyed by model id.
//!
//! The first request for a model starts the load on the inference pool in a
//! detached task and every concurrent request for the same model waits on the
//! same load. A waiter that is cancelled stops waiting but does not abort the
//! load, so the next request finds it finished or still in flight. A failed
//! load is evicted so a later request can try again.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::backends::local::CpuPool;
use crate::errors::ProviderError;
use crate::observability::messages::provider::{SessionLoadFailed, SessionLoaded};
use crate::observability::messages::StructuredLog;

/// A loaded model ready to run. `run` is synchronous CPU work.
pub trait InferenceSession: Send + Sync {
    fn run(&self, input: &[u8]) -> Result<Vec<u8>, ProviderError>;
}

/// Loads model sessions. Loading is synchronous and may be slow.
pub trait ModelLoader: Send + Sync {
    fn load(&self, model_id: &str) -> Result<Arc<dyn InferenceSession>, ProviderError>;

    /// Cheap check used by health probes, e.g. "are the weights on disk".
    fn has_model(&self, _model_id: &str) -> bool {
        true
    }
}

type LoadState = Option<Result<Arc<dyn InferenceSession>, String>>;

pub struct SessionCache {
    loader: Arc<dyn ModelLoader>,
    pool: CpuPool,
    sessions: Arc<Mutex<HashMap<String, watch::Receiver<LoadState>>>>,
}

impl SessionCache {
    pub fn new(loader: Arc<dyn ModelLoader>, pool: CpuPool) -> Self {
        Self {
            loader,
            pool,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn loader(&self) -> &Arc<dyn ModelLoader> {
        &self.loader
    }

    /// The session for `model_id`, loading it if nobody has yet.
    pub async fn get(
        &self,
        model_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Arc<dyn InferenceSession>, ProviderError> {
        let mut state = {
            let mut sessions = self
                .sessions
                .lock()
                .map_err(|_| ProviderError::failed("session cache lock poisoned"))?;
            match sessions.get(model_id) {
                Some(state) => state.clone(),
                None => {
                    let (tx, rx) = watch::channel(None);
                    sessions.insert(model_id.to_string(), rx.clone());
                    self.spawn_load(model_id.to_string(), tx);
                    rx
                }
            }
        };

        let loaded = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ProviderError::Cancelled),
            ready = state.wait_for(Option::is_some) => match ready {
                Ok(ready) => ready.clone(),
                Err(_) => None,
            },
        };

        match loaded {
            Some(Ok(session)) => Ok(session),
            Some(Err(message)) => Err(ProviderError::Failed(message)),
            None => Err(ProviderError::failed(format!(
                "loading model '{}' was abandoned",
                model_id
            ))),
        }
    }

    /// Whether `model_id` has finished loading successfully.
    pub fn is_loaded(&self, model_id: &str) -> bool {
        self.sessions
            .lock()
            .ok()
            .and_then(|sessions| sessions.get(model_id).map(|state| matches!(*state.borrow(), Some(Ok(_)))))
            .unwrap_or(false)
    }

    fn spawn_load(&self, model_id: String, tx: watch::Sender<LoadState>) {
        let loader = Arc::clone(&self.loader);
        let pool = self.pool.clone();
        let sessions = Arc::clone(&self.sessions);

        tokio::spawn(async move {
            let started = Instant::now();
            let id = model_id.clone();
            let result = match pool
                .run(&CancellationToken::new(), move || loader.load(&id))
                .await
            {
                Ok(result) => result,
                Err(pool_error) => Err(pool_error.into()),
            };

            let failed = match result {
                Ok(session) => {
                    SessionLoaded {
                        model_id: &model_id,
                        elapsed: started.elapsed(),
                    }
                    .log();
                    tx.send_replace(Some(Ok(session)));
                    false
                }
                Err(error) => {
                    let message = error.to_string();
                    SessionLoadFailed {
                        model_id: &model_id,
                        error: &message,
                    }
                    .log();
                    tx.send_replace(Some(Err(message)));
                    true
                }
            };

            if failed {
                if let Ok(mut sessions) = sessions.lock() {
                    let stale = sessions
                        .get(&model_id)
                        .is_some_and(|state| matches!(*state.borrow(), Some(Err(_))));
                    if stale {
                        sessions.remove(&model_id);
                    }
                }
            }
        });
    }
}
