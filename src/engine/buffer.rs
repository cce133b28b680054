use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Rolling window of recent price samples for one symbol.
///
/// Cloning shares the underlying storage: the sampler holds one handle as the
/// writer, the renderer another as the reader. All access goes through the
/// internal lock, so a snapshot never observes a half-applied append.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    inner: Arc<RwLock<VecDeque<f64>>>,
    capacity: usize,
}

impl SampleBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append one sample, evicting the oldest once at capacity.
    pub async fn append(&self, value: f64) {
        let mut samples = self.inner.write().await;
        if samples.len() >= self.capacity {
            samples.pop_front();
        }
        samples.push_back(value);
    }

    /// Owned copy of the current contents, oldest first.
    pub async fn snapshot(&self) -> Vec<f64> {
        self.inner.read().await.iter().copied().collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}
