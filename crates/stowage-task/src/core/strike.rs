use std::collections::VecDeque;

/// Rolling buffer of the most recent health samples.
///
/// The window trips once it is full and every sample in it is unhealthy,
/// i.e. after `capacity` consecutive failures. A single healthy sample
/// pushed into the window breaks the streak.
///
/// # Examples
///
/// ```
/// use stowage_task::StrikeWindow;
///
/// let mut window = StrikeWindow::new(2);
/// assert!(!window.push(false));
/// assert!(!window.push(true));
/// assert!(!window.push(false));
/// assert!(window.push(false));
/// ```
#[derive(Debug, Clone)]
pub struct StrikeWindow {
    samples:  VecDeque<bool>,
    capacity: usize,
}

impl StrikeWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record one sample and report whether the window has tripped.
    pub fn push(&mut self, healthy: bool) -> bool {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(healthy);
        self.is_tripped()
    }

    #[must_use]
    pub fn is_tripped(&self) -> bool {
        self.samples.len() == self.capacity && self.samples.iter().all(|healthy| !healthy)
    }

    /// Consecutive unhealthy samples at the tail of the window.
    #[must_use]
    pub fn streak(&self) -> usize { self.samples.iter().rev().take_while(|healthy| !**healthy).count() }

    pub fn clear(&mut self) { self.samples.clear(); }

    pub fn capacity(&self) -> usize { self.capacity }
}
