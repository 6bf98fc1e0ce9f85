//! Streaming indicators computed bar by bar.
//!
//! Both indicators are incremental: each `push` is O(1) (amortized for the
//! rolling extremum), and the value after `n` pushes equals a from-scratch
//! computation over the same `n` inputs.

use std::{collections::VecDeque, num::NonZeroUsize};

/// Session-anchored volume-weighted average price.
///
/// `vwap_i = Σ close_j·volume_j / Σ volume_j` over bars `0..=i`.
#[derive(Debug, Clone, Default)]
pub struct CumulativeVwap {
    price_volume: f64,
    volume: f64,
}

impl CumulativeVwap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one bar and returns the running VWAP, `None` while no volume has traded.
    pub fn push(&mut self, price: f64, volume: u64) -> Option<f64> {
        let volume = volume as f64;
        self.price_volume += price * volume;
        self.volume += volume;
        self.value()
    }

    pub fn value(&self) -> Option<f64> {
        (self.volume > 0.0).then(|| self.price_volume / self.volume)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extremum {
    Max,
    Min,
}

impl Extremum {
    /// Whether `new` makes `old` irrelevant for every future window.
    fn supersedes(self, new: f64, old: f64) -> bool {
        match self {
            Extremum::Max => new >= old,
            Extremum::Min => new <= old,
        }
    }
}

/// Max or min over the last `window` values, via a monotonic deque.
#[derive(Debug, Clone)]
pub struct RollingExtremum {
    kind: Extremum,
    window: usize,
    seen: usize,
    /// (sequence number, value); values are monotonic from front to back.
    candidates: VecDeque<(usize, f64)>,
}

impl RollingExtremum {
    pub fn new(kind: Extremum, window: NonZeroUsize) -> Self {
        Self {
            kind,
            window: window.get(),
            seen: 0,
            candidates: VecDeque::with_capacity(window.get()),
        }
    }

    /// Adds a value; returns the extremum once `window` values have been seen.
    pub fn push(&mut self, value: f64) -> Option<f64> {
        let seq = self.seen;
        self.seen += 1;

        while let Some(&(_, back)) = self.candidates.back() {
            if self.kind.supersedes(value, back) {
                self.candidates.pop_back();
            } else {
                break;
            }
        }
        self.candidates.push_back((seq, value));

        while let Some(&(front_seq, _)) = self.candidates.front() {
            if front_seq + self.window <= seq {
                self.candidates.pop_front();
            } else {
                break;
            }
        }

        if self.seen >= self.window {
            self.candidates.front().map(|&(_, v)| v)
        } else {
            None
        }
    }
}

/// Donchian channel: rolling highest high and lowest low.
#[derive(Debug, Clone)]
pub struct DonchianChannel {
    upper: RollingExtremum,
    lower: RollingExtremum,
}

impl DonchianChannel {
    pub fn new(window: NonZeroUsize) -> Self {
        Self {
            upper: RollingExtremum::new(Extremum::Max, window),
            lower: RollingExtremum::new(Extremum::Min, window),
        }
    }

    /// Adds one bar's high/low; returns `(upper, lower)` once the window is full.
    pub fn push(&mut self, high: f64, low: f64) -> (Option<f64>, Option<f64>) {
        (self.upper.push(high), self.lower.push(low))
    }
}
