//! One-shot completion callbacks

/// Completion callback fired at most once
pub type Callback = Box<dyn FnOnce() + Send>;

/// Invoke an optional callback, doing nothing when it is unset
#[inline]
pub fn invoke_if_set(callback: Option<Callback>) {
    if let Some(callback) = callback {
        callback();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_invoke_if_set() {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();

        invoke_if_set(Some(Box::new(move || {
            h.fetch_add(1, Ordering::SeqCst);
        })));
        invoke_if_set(None);

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
