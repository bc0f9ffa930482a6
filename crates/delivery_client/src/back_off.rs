use std::time::Duration;

/// Linear back off schedule: `base * attempt` for attempts `1..=max`.
///
/// With a 5s base and 3 attempts this yields 5s, 10s, 15s.
#[derive(Debug, Clone)]
pub struct LinearBackOff {
    base: Duration,
    attempt: u32,
    max_attempts: u32,
}

impl LinearBackOff {
    /// Construct a new schedule.
    pub fn new(base: Duration, max_attempts: u32) -> Self {
        Self {
            base,
            attempt: 0,
            max_attempts,
        }
    }

    /// The 1-based attempt the last yielded interval belongs to.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}

impl Iterator for LinearBackOff {
    type Item = Duration;

    fn next(&mut self) -> Option<Self::Item> {
        if self.attempt >= self.max_attempts {
            return None;
        }
        self.attempt += 1;
        Some(self.base.saturating_mul(self.attempt))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.max_attempts - self.attempt) as usize;
        (left, Some(left))
    }
}

impl ExactSizeIterator for LinearBackOff {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_schedule() {
        let waits = LinearBackOff::new(Duration::from_secs(5), 3)
            .collect::<Vec<_>>();
        assert_eq!(
            vec![
                Duration::from_secs(5),
                Duration::from_secs(10),
                Duration::from_secs(15),
            ],
            waits,
        );
    }

    #[test]
    fn strictly_increasing() {
        let waits = LinearBackOff::new(Duration::from_millis(3), 10)
            .collect::<Vec<_>>();
        assert_eq!(10, waits.len());
        assert!(waits.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn zero_attempts_is_empty() {
        let mut b = LinearBackOff::new(Duration::from_secs(1), 0);
        assert_eq!(0, b.len());
        assert_eq!(None, b.next());
        assert_eq!(0, b.attempt());
    }

    #[test]
    fn tracks_attempt() {
        let mut b = LinearBackOff::new(Duration::from_secs(1), 2);
        b.next();
        assert_eq!(1, b.attempt());
        assert_eq!(1, b.len());
        b.next();
        assert_eq!(2, b.attempt());
        assert_eq!(None, b.next());
        assert_eq!(2, b.attempt());
    }
}
