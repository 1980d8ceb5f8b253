//! Bounded-parallelism fan-out for file renders and Provider calls
//! (spec.md §5: batches default to 8-way parallelism unless configured
//! otherwise).

use std::sync::Mutex;

/// Default number of concurrent workers for a batch operation.
pub const DEFAULT_PARALLELISM: usize = 8;

/// Run `f` over every item in `items`, using at most `parallelism` worker
/// threads at once, and return the results in the same order as `items`.
///
/// `parallelism` is clamped to at least 1 and at most `items.len()` so an
/// empty batch spawns no threads.
pub fn run_bounded<T, R, F>(items: Vec<T>, parallelism: usize, f: F) -> Vec<R>
where
    T: Send,
    R: Send,
    F: Fn(T) -> R + Sync,
{
    if items.is_empty() {
        return Vec::new();
    }
    let workers = parallelism.max(1).min(items.len());
    let queue = Mutex::new(items.into_iter().enumerate().collect::<Vec<_>>());
    let results = Mutex::new(Vec::with_capacity(workers));

    std::thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| {
                loop {
                    let next = queue.lock().expect("queue mutex poisoned").pop();
                    let Some((idx, item)) = next else { break };
                    let result = f(item);
                    results.lock().expect("results mutex poisoned").push((idx, result));
                }
            });
        }
    });

    let mut results = results.into_inner().expect("results mutex poisoned");
    results.sort_by_key(|(idx, _)| *idx);
    results.into_iter().map(|(_, r)| r).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn preserves_input_order() {
        let items = vec![1, 2, 3, 4, 5];
        let results = run_bounded(items, 3, |n| n * 10);
        assert_eq!(results, vec![10, 20, 30, 40, 50]);
    }

    #[test]
    fn empty_input_spawns_nothing() {
        let results: Vec<i32> = run_bounded(Vec::new(), DEFAULT_PARALLELISM, |n: i32| n);
        assert!(results.is_empty());
    }

    #[test]
    fn bounds_concurrent_workers() {
        let active = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let items: Vec<u32> = (0..20).collect();
        run_bounded(items, 4, |n| {
            let now = active.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(2));
            active.fetch_sub(1, Ordering::SeqCst);
            n
        });
        assert!(peak.load(Ordering::SeqCst) <= 4);
    }
}
