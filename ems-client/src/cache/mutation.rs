//! Mutations
//!
//! A write against the backend that, once it succeeds, invalidates the
//! cached queries of the resources it touched. A mutation is disabled while
//! it is pending; separate mutations never block each other.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;

use super::QueryClient;
use crate::{ClientError, ClientResult};

/// Lifecycle of one mutation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MutationStatus {
    #[default]
    Idle,
    Pending,
    Success,
    /// Failed with a user-facing message
    Error(String),
}

/// A named write that invalidates resources on success
#[derive(Clone)]
pub struct Mutation {
    name: &'static str,
    client: QueryClient,
    invalidates: Vec<String>,
    status: Arc<watch::Sender<MutationStatus>>,
}

impl std::fmt::Debug for Mutation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mutation")
            .field("name", &self.name)
            .field("invalidates", &self.invalidates)
            .field("status", &*self.status.borrow())
            .finish()
    }
}

impl Mutation {
    pub fn new(name: &'static str, client: QueryClient) -> Self {
        let (status, _) = watch::channel(MutationStatus::Idle);
        Self {
            name,
            client,
            invalidates: Vec::new(),
            status: Arc::new(status),
        }
    }

    /// Invalidate `resource` after every success
    pub fn invalidates(mut self, resource: impl Into<String>) -> Self {
        self.invalidates.push(resource.into());
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn status(&self) -> MutationStatus {
        self.status.borrow().clone()
    }

    /// Pending mutations disable their trigger
    pub fn is_pending(&self) -> bool {
        *self.status.borrow() == MutationStatus::Pending
    }

    /// Back to `Idle` (e.g. when a dialog is reopened)
    pub fn reset(&self) {
        self.status.send_if_modified(|status| {
            if matches!(status, MutationStatus::Pending | MutationStatus::Idle) {
                return false;
            }
            *status = MutationStatus::Idle;
            true
        });
    }

    /// Run the write
    ///
    /// Returns `Busy` without running `request` when already pending.
    pub async fn run<T, Fut>(&self, request: Fut) -> ClientResult<T>
    where
        Fut: Future<Output = ClientResult<T>>,
    {
        let started = self.status.send_if_modified(|status| {
            if *status == MutationStatus::Pending {
                return false;
            }
            *status = MutationStatus::Pending;
            true
        });
        if !started {
            tracing::debug!(mutation = self.name, "Mutation already pending");
            return Err(ClientError::Busy(self.name));
        }

        let guard = PendingGuard {
            status: &self.status,
        };
        let result = request.await;
        std::mem::forget(guard);

        match &result {
            Ok(_) => {
                for resource in &self.invalidates {
                    self.client.invalidate(resource);
                }
                tracing::debug!(mutation = self.name, "Mutation succeeded");
                self.status.send_replace(MutationStatus::Success);
            }
            Err(e) => {
                tracing::debug!(mutation = self.name, error = %e, "Mutation failed");
                let message = e.user_message(&e.to_string());
                self.status.send_replace(MutationStatus::Error(message));
            }
        }
        result
    }
}

/// Resets a pending status when `run` is cancelled mid-flight
struct PendingGuard<'a> {
    status: &'a watch::Sender<MutationStatus>,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.status.send_replace(MutationStatus::Idle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::QueryKey;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_success_invalidates_resource() {
        let client = QueryClient::default();
        let key = QueryKey::new("employees").with("page", 1);
        client.fetch(key.clone(), || async { Ok(1u32) }).await.unwrap();
        assert!(!client.peek::<u32>(&key).is_stale);

        let delete = Mutation::new("delete employee", client.clone()).invalidates("employees");
        delete.run(async { Ok(()) }).await.unwrap();

        assert_eq!(delete.status(), MutationStatus::Success);
        assert!(client.peek::<u32>(&key).is_stale);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_leaves_cache_untouched() {
        let client = QueryClient::default();
        let key = QueryKey::new("employees");
        client.fetch(key.clone(), || async { Ok(1u32) }).await.unwrap();

        let delete = Mutation::new("delete employee", client.clone()).invalidates("employees");
        let result = delete
            .run(async {
                Err::<(), _>(ClientError::Api {
                    status: 422,
                    message: "Employee is locked".into(),
                })
            })
            .await;

        assert!(result.is_err());
        assert_eq!(
            delete.status(),
            MutationStatus::Error("Employee is locked".into())
        );
        assert!(!client.peek::<u32>(&key).is_stale);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_mutation_rejects_second_run() {
        let client = QueryClient::default();
        let delete = Mutation::new("delete employee", client.clone());
        let other = Mutation::new("update profile", client);

        let running = tokio::spawn({
            let delete = delete.clone();
            async move {
                delete
                    .run(async {
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        Ok(1u32)
                    })
                    .await
            }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(delete.is_pending());

        let second = delete.run(async { Ok(2u32) }).await;
        assert!(matches!(second, Err(ClientError::Busy("delete employee"))));

        // independent mutations are not blocked
        assert_eq!(other.run(async { Ok(3u32) }).await.unwrap(), 3);

        assert_eq!(running.await.unwrap().unwrap(), 1);
        assert_eq!(delete.status(), MutationStatus::Success);
    }

    #[tokio::test]
    async fn test_cancelled_run_returns_to_idle() {
        let delete = Mutation::new("delete employee", QueryClient::default());
        {
            let fut = delete.run(futures::future::pending::<ClientResult<()>>());
            futures::pin_mut!(fut);
            assert!(futures::poll!(fut.as_mut()).is_pending());
            assert!(delete.is_pending());
        }
        assert_eq!(delete.status(), MutationStatus::Idle);
    }
}
