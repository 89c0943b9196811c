//! Internal disposal bag for managing cleanup hooks.

/// Container for disposal hooks with LIFO execution order.
///
/// Hooks are pushed as instances are built, so running them in reverse tears
/// dependents down before the things they depend on.
#[derive(Default)]
pub(crate) struct DisposeBag {
    hooks: Vec<Box<dyn FnOnce() + Send>>,
}

impl DisposeBag {
    pub(crate) fn push(&mut self, f: Box<dyn FnOnce() + Send>) {
        self.hooks.push(f);
    }

    /// Execute all hooks in reverse order (LIFO), returning how many ran.
    pub(crate) fn run_all_reverse(&mut self) -> usize {
        let mut ran = 0;
        while let Some(f) = self.hooks.pop() {
            (f)();
            ran += 1;
        }
        ran
    }

    /// Removes the hooks without running them.
    pub(crate) fn take(&mut self) -> DisposeBag {
        DisposeBag {
            hooks: std::mem::take(&mut self.hooks),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.hooks.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn runs_in_reverse_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut bag = DisposeBag::default();
        for i in 0..3 {
            let log = log.clone();
            bag.push(Box::new(move || log.lock().unwrap().push(i)));
        }
        assert_eq!(bag.len(), 3);
        assert_eq!(bag.run_all_reverse(), 3);
        assert!(bag.is_empty());
        assert_eq!(*log.lock().unwrap(), vec![2, 1, 0]);
    }

    #[test]
    fn take_leaves_the_bag_empty() {
        let mut bag = DisposeBag::default();
        bag.push(Box::new(|| {}));
        let mut taken = bag.take();
        assert!(bag.is_empty());
        assert_eq!(taken.run_all_reverse(), 1);
    }
}
