//! Weight optimizer - nudges content-type weights toward what performs.

use cadence_core::{ContentType, ContentTypeWeight, MAX_WEIGHT, MIN_WEIGHT, WEIGHT_TOTAL};

use crate::PerformanceWindow;

/// Fraction of the score differential applied per step.
pub const LEARNING_RATE: f64 = 0.2;

/// One weight change proposed by the optimizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightAdjustment {
    /// Content type
    pub content_type: ContentType,
    /// Weight before the step
    pub from: u32,
    /// Weight after clamping, before renormalization
    pub to: u32,
    /// Type average minus overall average
    pub differential: f64,
}

/// `clamp(round(weight + differential * 0.2), 5, 30)`.
pub fn adapt(weight: u32, differential: f64) -> u32 {
    adapt_with_rate(weight, differential, LEARNING_RATE)
}

/// [`adapt`] with an explicit learning rate.
pub fn adapt_with_rate(weight: u32, differential: f64, learning_rate: f64) -> u32 {
    let next = (f64::from(weight) + differential * learning_rate).round();
    next.clamp(f64::from(MIN_WEIGHT), f64::from(MAX_WEIGHT)) as u32
}

/// Scale the set so it sums to exactly 100.
///
/// Each weight lands on the floor or ceiling of its exact share; leftover
/// units go to the largest fractional parts. A zero weight stays zero.
pub fn renormalize(weights: &mut [ContentTypeWeight]) {
    let sum: u32 = weights.iter().map(|w| w.weight).sum();
    if sum == 0 {
        return;
    }

    let scale = f64::from(WEIGHT_TOTAL) / f64::from(sum);
    let mut fractions = Vec::with_capacity(weights.len());
    let mut assigned = 0u32;
    for (i, w) in weights.iter_mut().enumerate() {
        let exact = f64::from(w.weight) * scale;
        w.weight = exact.floor() as u32;
        assigned += w.weight;
        fractions.push((i, exact - exact.floor()));
    }

    fractions.sort_by(|a, b| b.1.total_cmp(&a.1));
    let leftover = WEIGHT_TOTAL.saturating_sub(assigned) as usize;
    for &(i, _) in fractions.iter().take(leftover) {
        weights[i].weight += 1;
    }
}

/// Every content type sharing 100 as evenly as integers allow.
pub fn default_weights() -> Vec<ContentTypeWeight> {
    let n = ContentType::ALL.len() as u32;
    let base = WEIGHT_TOTAL / n;
    let extra = (WEIGHT_TOTAL % n) as usize;
    ContentType::ALL
        .iter()
        .enumerate()
        .map(|(i, &t)| ContentTypeWeight::new(t, base + u32::from(i < extra)))
        .collect()
}

/// Optimizes selection weights based on performance.
#[derive(Debug, Clone, Copy)]
pub struct WeightOptimizer {
    learning_rate: f64,
}

impl WeightOptimizer {
    /// Create an optimizer with the default learning rate.
    pub fn new() -> Self {
        Self { learning_rate: LEARNING_RATE }
    }

    /// Set the learning rate.
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Analyze a window and suggest adjustments. Types without scored posts
    /// are left out.
    pub fn suggest_adjustments(
        &self,
        weights: &[ContentTypeWeight],
        window: &PerformanceWindow,
    ) -> Vec<WeightAdjustment> {
        weights
            .iter()
            .filter_map(|w| {
                let differential = window.differential(w.content_type)?;
                Some(WeightAdjustment {
                    content_type: w.content_type,
                    from: w.weight,
                    to: adapt_with_rate(w.weight, differential, self.learning_rate),
                    differential,
                })
            })
            .collect()
    }

    /// Apply adjustments and renormalize the set.
    pub fn apply_adjustments(&self, weights: &mut [ContentTypeWeight], adjustments: &[WeightAdjustment]) {
        for adjustment in adjustments {
            if let Some(w) = weights.iter_mut().find(|w| w.content_type == adjustment.content_type) {
                w.weight = adjustment.to;
            }
        }
        renormalize(weights);
    }
}

impl Default for WeightOptimizer {
    fn default() -> Self {
        Self::new()
    }
}
