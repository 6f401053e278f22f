//! Classification smoother.
//!
//! Raw classifier output is noisy from frame to frame.  The smoother keeps
//! a short FIFO of recent probabilities per label and only reports a
//! [`StableSignal`] once the running average of that window reaches the
//! configured confidence threshold.
//!
//! ```text
//!  sample(label, p) ──▶ window[label] ──▶ mean ──▶ mean >= threshold ? StableSignal
//! ```
//!
//! Windows are created lazily.  The label map is bounded: when a new label
//! arrives and `max_tracked_labels` are already tracked, the label that was
//! observed longest ago is dropped.

use std::collections::HashMap;

use heapless::Deque;
use log::debug;

use crate::config::PetConfig;

/// Upper bound for `buffer_size`; windows are stack-allocated at this size.
pub const WINDOW_CAPACITY: usize = 16;

/// One classifier output for one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfidenceSample {
    pub label: String,
    pub probability: f32,
}

impl ConfidenceSample {
    pub fn new(label: impl Into<String>, probability: f32) -> Self {
        Self {
            label: label.into(),
            probability,
        }
    }

    /// Probability is a finite number within `[0, 1]`.
    pub fn is_valid(&self) -> bool {
        (0.0..=1.0).contains(&self.probability)
    }
}

/// A label whose rolling average met the confidence threshold this tick.
#[derive(Debug, Clone, PartialEq)]
pub struct StableSignal {
    pub label: String,
    pub avg: f32,
}

// ---------------------------------------------------------------------------
// Rolling window
// ---------------------------------------------------------------------------

/// FIFO of the most recent `limit` probabilities for one label.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    samples: Deque<f32, WINDOW_CAPACITY>,
    limit: usize,
}

impl RollingWindow {
    pub fn new(limit: usize) -> Self {
        Self {
            samples: Deque::new(),
            limit: limit.clamp(1, WINDOW_CAPACITY),
        }
    }

    /// Append a probability, evicting the oldest entries past the limit.
    pub fn push(&mut self, probability: f32) {
        while self.samples.len() >= self.limit {
            self.samples.pop_front();
        }
        let pushed = self.samples.push_back(probability);
        debug_assert!(pushed.is_ok(), "window limit exceeds capacity");
    }

    /// Arithmetic mean of the current contents (0 when empty).
    pub fn average(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum: f32 = self.samples.iter().sum();
        sum / self.samples.len() as f32
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Change the limit, dropping the oldest samples if the window shrinks.
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit.clamp(1, WINDOW_CAPACITY);
        while self.samples.len() > self.limit {
            self.samples.pop_front();
        }
    }
}

// ---------------------------------------------------------------------------
// Smoother
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct LabelTrack {
    window: RollingWindow,
    /// Observation sequence number of the last sample, for eviction.
    last_seen: u64,
}

/// Per-label rolling-average confidence tracker.
pub struct ClassificationSmoother {
    tracks: HashMap<String, LabelTrack>,
    buffer_size: usize,
    threshold: f32,
    max_labels: usize,
    seq: u64,
}

impl ClassificationSmoother {
    pub fn new(config: &PetConfig) -> Self {
        Self {
            tracks: HashMap::new(),
            buffer_size: config.buffer_size,
            threshold: config.confidence_threshold,
            max_labels: config.max_tracked_labels.max(1),
            seq: 0,
        }
    }

    /// Feed one sample.  Returns a stable signal when the label's rolling
    /// average is at or above the threshold, on every such tick.
    pub fn observe(&mut self, sample: &ConfidenceSample) -> Option<StableSignal> {
        self.seq += 1;

        if !self.tracks.contains_key(&sample.label) && self.tracks.len() >= self.max_labels {
            self.evict_oldest();
        }

        let buffer_size = self.buffer_size;
        let track = self
            .tracks
            .entry(sample.label.clone())
            .or_insert_with(|| LabelTrack {
                window: RollingWindow::new(buffer_size),
                last_seen: 0,
            });
        track.window.push(sample.probability);
        track.last_seen = self.seq;

        let avg = track.window.average();
        debug!(
            "Smoother: '{}' p={:.2} avg={:.2} n={}",
            sample.label,
            sample.probability,
            avg,
            track.window.len()
        );

        (avg >= self.threshold).then(|| StableSignal {
            label: sample.label.clone(),
            avg,
        })
    }

    /// Current rolling average for `label`, if it is tracked.
    pub fn average(&self, label: &str) -> Option<f32> {
        self.tracks.get(label).map(|t| t.window.average())
    }

    /// Number of labels with a live window.
    pub fn tracked_labels(&self) -> usize {
        self.tracks.len()
    }

    /// Apply smoothing parameters from a new configuration.
    pub fn reconfigure(&mut self, config: &PetConfig) {
        self.threshold = config.confidence_threshold;
        self.max_labels = config.max_tracked_labels.max(1);
        if config.buffer_size != self.buffer_size {
            self.buffer_size = config.buffer_size;
            for track in self.tracks.values_mut() {
                track.window.set_limit(config.buffer_size);
            }
        }
        while self.tracks.len() > self.max_labels {
            self.evict_oldest();
        }
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .tracks
            .iter()
            .min_by_key(|(_, t)| t.last_seen)
            .map(|(label, _)| label.clone());
        if let Some(label) = oldest {
            debug!("Smoother: evicting idle label '{}'", label);
            self.tracks.remove(&label);
        }
    }
}
