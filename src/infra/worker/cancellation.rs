use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Shared stop flag for one execution. Cloning shares the flag.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    inner: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` only for the call that actually flipped the flag.
    pub fn cancel(&self) -> bool {
        !self.inner.swap(true, Ordering::SeqCst)
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_cancel_wins_and_clones_observe_it() {
        let token = CancellationToken::new();
        let seen_by_task = token.clone();
        assert!(!seen_by_task.is_cancelled());

        assert!(token.cancel());
        assert!(!token.cancel());
        assert!(seen_by_task.is_cancelled());
    }
}
