use crate::Num;
use std::sync::RwLock;

/// A monotonically non-increasing score shared across worker threads.
///
/// Reads happen on every interior node visited by every worker; writes
/// happen only when a worker improves on the current best. A `RwLock`
/// keeps the hot read path lock-free of writer contention while `set_if_smaller`
/// takes the exclusive side only when it actually has something better to record.
pub struct GlobalMinimum {
    current: RwLock<Num>,
}

impl GlobalMinimum {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Num::MAX),
        }
    }

    pub fn get(&self) -> Num {
        *self.current.read().expect("GlobalMinimum lock poisoned")
    }

    pub fn set_if_smaller(&self, score: Num) {
        let mut guard = self.current.write().expect("GlobalMinimum lock poisoned");
        if score < *guard {
            *guard = score;
        }
    }

    pub fn reset(&self) {
        let mut guard = self.current.write().expect("GlobalMinimum lock poisoned");
        *guard = Num::MAX;
    }
}

impl Default for GlobalMinimum {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_max() {
        let g = GlobalMinimum::new();
        assert_eq!(g.get(), Num::MAX);
    }

    #[test]
    fn never_increases() {
        let g = GlobalMinimum::new();
        g.set_if_smaller(10);
        g.set_if_smaller(20);
        assert_eq!(g.get(), 10);
        g.set_if_smaller(-5);
        assert_eq!(g.get(), -5);
    }

    #[test]
    fn reset_restores_max() {
        let g = GlobalMinimum::new();
        g.set_if_smaller(3);
        g.reset();
        assert_eq!(g.get(), Num::MAX);
    }

    #[test]
    fn concurrent_writers_converge_on_the_true_minimum() {
        let g = GlobalMinimum::new();
        std::thread::scope(|scope| {
            let g = &g;
            for score in [50, 10, 30, -20, 40] {
                scope.spawn(move || g.set_if_smaller(score));
            }
        });
        assert_eq!(g.get(), -20);
    }
}
