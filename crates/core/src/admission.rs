use std::sync::{Arc, LazyLock};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Capacity of the process-wide admission gate.
pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 1000;

static GLOBAL_GATE: LazyLock<AdmissionGate> =
    LazyLock::new(|| AdmissionGate::new(DEFAULT_MAX_CONCURRENT_REQUESTS));

/// Bounded counter limiting concurrently in-flight remote calls.
///
/// A permit is held for the entire attempt loop of one logical call, covering
/// every retry, and is released exactly once when the permit guard drops.
/// Clones share the same underlying permits, so every handle derived from one
/// root observes a single limit.
#[derive(Clone, Debug)]
pub struct AdmissionGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl AdmissionGate {
    pub fn new(capacity: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// The process-wide gate shared by every client that doesn't inject its
    /// own. Capacity is [`DEFAULT_MAX_CONCURRENT_REQUESTS`].
    pub fn global() -> Self {
        GLOBAL_GATE.clone()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Permits not currently held by in-flight calls.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Waits until a permit is free. The returned guard releases the permit
    /// on drop, on every exit path including cancellation.
    pub async fn acquire(&self) -> OwnedSemaphorePermit {
        self.semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("admission gate semaphore is never closed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn permits_release_on_drop() {
        let gate = AdmissionGate::new(2);
        assert_eq!(gate.available(), 2);
        let permit = gate.acquire().await;
        assert_eq!(gate.available(), 1);
        drop(permit);
        assert_eq!(gate.available(), 2);
    }

    #[tokio::test]
    async fn clones_share_permits() {
        let gate = AdmissionGate::new(1);
        let clone = gate.clone();
        let _permit = gate.acquire().await;
        assert_eq!(clone.available(), 0);
    }

    #[test]
    fn global_gate_is_a_single_instance() {
        let a = AdmissionGate::global();
        let b = AdmissionGate::global();
        assert!(Arc::ptr_eq(&a.semaphore, &b.semaphore));
        assert_eq!(a.capacity(), DEFAULT_MAX_CONCURRENT_REQUESTS);
    }
}
