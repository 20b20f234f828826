//! Process activation backend.
//!
//! Runs one worker process per active endpoint. The credential payload and
//! endpoint key reach the worker through environment variables so they never
//! show up in process listings.

use std::collections::HashMap;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;

use super::EndpointActivator;
use crate::error::ActivationError;
use crate::types::config::ActivationConfig;

struct RunningEndpoint {
    payload: String,
    child: Child,
}

/// Production backend: spawns `config.program` per endpoint and stops it
/// with SIGTERM, then SIGKILL after the grace period.
pub struct ProcessActivator {
    config: ActivationConfig,
    running: Mutex<HashMap<String, RunningEndpoint>>,
}

impl ProcessActivator {
    pub fn new(config: ActivationConfig) -> Self {
        ProcessActivator {
            config,
            running: Mutex::new(HashMap::new()),
        }
    }

    /// Keys of endpoints whose worker is still alive, sorted. Workers that
    /// exited on their own are reaped and dropped.
    pub async fn active_endpoints(&self) -> Vec<String> {
        let mut running = self.running.lock().await;
        running.retain(|key, ep| match ep.child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                tracing::warn!(endpoint = %key, %status, "endpoint worker exited");
                false
            }
            Err(e) => {
                tracing::warn!(endpoint = %key, error = %e, "cannot poll endpoint worker");
                false
            }
        });
        let mut keys: Vec<String> = running.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Stop every running worker. Failures are logged, not returned.
    pub async fn shutdown(&self) {
        let drained: Vec<(String, RunningEndpoint)> = self.running.lock().await.drain().collect();
        for (key, mut ep) in drained {
            if let Err(e) = self.stop(&key, &mut ep.child).await {
                tracing::error!(endpoint = %key, error = %e, "failed to stop endpoint on shutdown");
            }
        }
    }

    fn spawn(&self, key: &str, payload: &str) -> Result<Child, ActivationError> {
        Command::new(&self.config.program)
            .args(self.config.args_for(key))
            .env(&self.config.endpoint_env, key)
            .env(&self.config.payload_env, payload)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ActivationError::Spawn {
                key: key.to_string(),
                source,
            })
    }

    async fn stop(&self, key: &str, child: &mut Child) -> Result<(), ActivationError> {
        let stop_err = |source: std::io::Error| ActivationError::Stop {
            key: key.to_string(),
            source,
        };

        if child.try_wait().map_err(stop_err)?.is_some() {
            return Ok(());
        }

        if let Some(pid) = child.id() {
            // Ask politely first; the child has not been reaped so the pid is ours.
            unsafe {
                libc::kill(pid as libc::pid_t, libc::SIGTERM);
            }
            let grace = Duration::from_millis(self.config.stop_grace_ms);
            match tokio::time::timeout(grace, child.wait()).await {
                Ok(Ok(_)) => return Ok(()),
                Ok(Err(source)) => return Err(stop_err(source)),
                Err(_) => {
                    tracing::warn!(endpoint = %key, pid, "worker ignored SIGTERM, killing");
                }
            }
        }

        child.kill().await.map_err(stop_err)
    }
}

#[async_trait]
impl EndpointActivator for ProcessActivator {
    async fn activate(&self, key: &str, payload: &str) -> Result<(), ActivationError> {
        let mut running = self.running.lock().await;

        if let Some(existing) = running.get_mut(key) {
            let alive = matches!(existing.child.try_wait(), Ok(None));
            if alive && existing.payload == payload {
                tracing::debug!(endpoint = %key, "endpoint already running with same payload");
                return Ok(());
            }
        }

        if let Some(mut previous) = running.remove(key) {
            self.stop(key, &mut previous.child).await?;
            tracing::info!(endpoint = %key, "endpoint stopped for restart");
        }

        let child = self.spawn(key, payload)?;
        tracing::info!(endpoint = %key, pid = ?child.id(), "endpoint started");
        running.insert(
            key.to_string(),
            RunningEndpoint {
                payload: payload.to_string(),
                child,
            },
        );
        Ok(())
    }

    async fn deactivate(&self, key: &str) -> Result<(), ActivationError> {
        let previous = self.running.lock().await.remove(key);
        match previous {
            Some(mut ep) => {
                self.stop(key, &mut ep.child).await?;
                tracing::info!(endpoint = %key, "endpoint stopped");
            }
            None => {
                tracing::debug!(endpoint = %key, "endpoint not running, nothing to stop");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sleeper() -> ProcessActivator {
        let mut config = ActivationConfig::new("sleep", &["30"]);
        config.stop_grace_ms = 200;
        ProcessActivator::new(config)
    }

    async fn pid_of(activator: &ProcessActivator, key: &str) -> Option<u32> {
        let running = activator.running.lock().await;
        running.get(key).and_then(|ep| ep.child.id())
    }

    #[tokio::test]
    async fn activate_then_deactivate() {
        let activator = sleeper();
        activator.activate("ep1", "YQ==").await.unwrap();
        assert_eq!(activator.active_endpoints().await, vec!["ep1"]);

        activator.deactivate("ep1").await.unwrap();
        assert!(activator.active_endpoints().await.is_empty());
    }

    #[tokio::test]
    async fn activate_same_payload_is_idempotent() {
        let activator = sleeper();
        activator.activate("ep1", "YQ==").await.unwrap();
        let first = pid_of(&activator, "ep1").await;
        activator.activate("ep1", "YQ==").await.unwrap();
        assert_eq!(pid_of(&activator, "ep1").await, first);
        activator.shutdown().await;
    }

    #[tokio::test]
    async fn activate_new_payload_restarts() {
        let activator = sleeper();
        activator.activate("ep1", "YQ==").await.unwrap();
        let first = pid_of(&activator, "ep1").await;
        activator.activate("ep1", "Yg==").await.unwrap();
        let second = pid_of(&activator, "ep1").await;
        assert!(second.is_some());
        assert_ne!(first, second);
        assert_eq!(activator.active_endpoints().await, vec!["ep1"]);
        activator.shutdown().await;
    }

    #[tokio::test]
    async fn worker_ignoring_sigterm_is_killed_after_grace() {
        let mut config = ActivationConfig::new("sh", &["-c", "trap '' TERM; exec sleep 30"]);
        config.stop_grace_ms = 200;
        let activator = ProcessActivator::new(config);
        activator.activate("ep1", "YQ==").await.unwrap();
        // Let the shell install its trap before the stop.
        tokio::time::sleep(Duration::from_millis(100)).await;

        let started = std::time::Instant::now();
        activator.deactivate("ep1").await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(200));
        assert!(activator.active_endpoints().await.is_empty());
    }

    #[tokio::test]
    async fn deactivate_unknown_endpoint_succeeds() {
        let activator = sleeper();
        assert!(activator.deactivate("ghost").await.is_ok());
    }

    #[tokio::test]
    async fn spawn_failure_is_reported() {
        let activator = ProcessActivator::new(ActivationConfig::new("/nonexistent/worker", &[]));
        let err = activator.activate("ep1", "YQ==").await.unwrap_err();
        assert!(matches!(err, ActivationError::Spawn { ref key, .. } if key == "ep1"));
        assert!(activator.active_endpoints().await.is_empty());
    }

    #[tokio::test]
    async fn exited_workers_are_not_active() {
        let activator = ProcessActivator::new(ActivationConfig::new("true", &[]));
        activator.activate("ep1", "YQ==").await.unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(activator.active_endpoints().await.is_empty());
    }

    #[tokio::test]
    async fn shutdown_stops_everything() {
        let activator = sleeper();
        activator.activate("ep1", "YQ==").await.unwrap();
        activator.activate("ep2", "Yg==").await.unwrap();
        assert_eq!(activator.active_endpoints().await, vec!["ep1", "ep2"]);
        activator.shutdown().await;
        assert!(activator.active_endpoints().await.is_empty());
    }
}
