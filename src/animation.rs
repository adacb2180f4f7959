//! Step-through animation of one density curve per ordinal category.
//!
//! The controller owns its tick source. Nothing outside it moves the step
//! index; the rendering loop only calls [`AnimationController::advance`] with
//! the current time and reads back the [`AnimationFrame`].

use std::time::{Duration, Instant};

use crate::aggregate::{OrdinalSample, OrdinalSteps, ordinal_samples};
use crate::data::model::Dataset;
use crate::density::{DensityCurve, EvaluationGrid, estimate, normalize_to_peak};
use crate::error::AnimationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Playback {
    Paused,
    Playing,
    /// Reached the last step on its own; distinct from a user pause.
    Finished,
}

/// Result of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Advanced(usize),
    Finished,
    /// Not playing; nothing happened.
    Idle,
}

// ---------------------------------------------------------------------------
// Tick source
// ---------------------------------------------------------------------------

/// Single periodic, cancellable tick source driven by the caller's clock.
///
/// At most one tick is produced per poll, however late the poll is, so ticks
/// never pile up or overlap.
#[derive(Debug, Clone)]
pub struct Ticker {
    interval: Duration,
    next_due: Option<Instant>,
}

impl Ticker {
    pub fn new(interval: Duration) -> Self {
        Ticker {
            interval,
            next_due: None,
        }
    }

    pub fn start(&mut self, now: Instant) {
        self.next_due = Some(now + self.interval);
    }

    pub fn cancel(&mut self) {
        self.next_due = None;
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.next_due
    }

    /// `true` if a tick is due at `now`; the next one is scheduled one
    /// interval after `now`.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(due) if due <= now => {
                self.next_due = Some(now + self.interval);
                true
            }
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// What the density view draws for the current step.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationFrame {
    pub index: usize,
    pub len: usize,
    pub ordinal: i64,
    pub observations: usize,
    /// Records of the whole dataset left out of every step for a missing
    /// ordinal or value.
    pub excluded: usize,
    /// Peak-normalized curve; empty when the step has too few observations.
    pub curve: DensityCurve,
    /// Shared x-domain of every step.
    pub x_extent: (f64, f64),
    /// `None` when there is no visible curve.
    pub y_extent: Option<(f64, f64)>,
    pub playback: Playback,
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

pub struct AnimationController {
    dimension: String,
    steps: Vec<OrdinalSample>,
    excluded: usize,
    grid: EvaluationGrid,
    bandwidth: f64,
    index: usize,
    playback: Playback,
    ticker: Ticker,
    frame: Option<AnimationFrame>,
}

impl AnimationController {
    /// Steps are the dataset's ordinals with at least one valid value of
    /// `dimension`; the grid spans that dimension's global extent.
    pub fn new(
        dataset: &Dataset,
        dimension: &str,
        bandwidth: f64,
        grid_steps: usize,
        interval: Duration,
    ) -> Self {
        let steps = ordinal_samples(dataset, dimension);
        let grid = dataset
            .extent(dimension)
            .map(|extent| EvaluationGrid::for_extent(extent, grid_steps, bandwidth))
            .unwrap_or_default();
        if steps.steps.is_empty() {
            log::warn!("No animatable categories for '{dimension}'");
        } else {
            log::info!(
                "Animating '{dimension}' over {} categories ({} records excluded)",
                steps.steps.len(),
                steps.excluded
            );
        }
        Self::from_steps(dimension, steps, grid, bandwidth, interval)
    }

    pub fn from_steps(
        dimension: &str,
        steps: OrdinalSteps,
        grid: EvaluationGrid,
        bandwidth: f64,
        interval: Duration,
    ) -> Self {
        let mut controller = AnimationController {
            dimension: dimension.to_string(),
            steps: steps.steps,
            excluded: steps.excluded,
            grid,
            bandwidth,
            index: 0,
            playback: Playback::Paused,
            ticker: Ticker::new(interval),
            frame: None,
        };
        controller.recompute();
        controller
    }

    pub fn dimension(&self) -> &str {
        &self.dimension
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn playback(&self) -> Playback {
        self.playback
    }

    /// Ordinal labels of every step, for a scrub slider.
    pub fn ordinals(&self) -> Vec<i64> {
        self.steps.iter().map(|s| s.ordinal).collect()
    }

    /// When the next tick is due, if playing.
    pub fn next_due(&self) -> Option<Instant> {
        self.ticker.next_due()
    }

    pub fn frame(&self) -> Result<&AnimationFrame, AnimationError> {
        self.frame.as_ref().ok_or(AnimationError::NoAnimatableCategories)
    }

    /// Resume from the current step, or replay from step 0 when already at
    /// the last step.
    pub fn play(&mut self, now: Instant) -> Result<(), AnimationError> {
        self.ensure_animatable()?;
        if self.playback == Playback::Playing {
            return Ok(());
        }
        if self.index + 1 >= self.len() {
            self.scrub_to(0)?;
        }
        self.playback = Playback::Playing;
        self.ticker.start(now);
        self.refresh_playback();
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), AnimationError> {
        self.ensure_animatable()?;
        self.ticker.cancel();
        if self.playback == Playback::Playing {
            self.playback = Playback::Paused;
            self.refresh_playback();
        }
        Ok(())
    }

    /// Jump to a step, clamped to `[0, len - 1]`. Pauses first if playing.
    pub fn scrub_to(&mut self, index: isize) -> Result<usize, AnimationError> {
        self.ensure_animatable()?;
        self.ticker.cancel();
        let last = self.len() - 1;
        self.index = index.clamp(0, last as isize) as usize;
        self.playback = Playback::Paused;
        self.recompute();
        Ok(self.index)
    }

    /// Poll the tick source and run at most one tick.
    pub fn advance(&mut self, now: Instant) -> TickOutcome {
        if self.playback != Playback::Playing || !self.ticker.poll(now) {
            return TickOutcome::Idle;
        }
        self.tick()
    }

    fn tick(&mut self) -> TickOutcome {
        if self.playback != Playback::Playing {
            return TickOutcome::Idle;
        }
        if self.index + 1 >= self.len() {
            self.finish();
            return TickOutcome::Finished;
        }
        self.index += 1;
        self.recompute();
        if self.index + 1 == self.len() {
            self.finish();
            TickOutcome::Finished
        } else {
            TickOutcome::Advanced(self.index)
        }
    }

    fn finish(&mut self) {
        self.ticker.cancel();
        self.playback = Playback::Finished;
        self.refresh_playback();
    }

    fn ensure_animatable(&self) -> Result<(), AnimationError> {
        if self.is_empty() {
            Err(AnimationError::NoAnimatableCategories)
        } else {
            Ok(())
        }
    }

    fn refresh_playback(&mut self) {
        if let Some(frame) = self.frame.as_mut() {
            frame.playback = self.playback;
        }
    }

    /// Rebuild the frame for the current step. A step with fewer than two
    /// observations still gets a frame, with an empty curve.
    fn recompute(&mut self) {
        let Some(step) = self.steps.get(self.index) else {
            self.frame = None;
            return;
        };
        let raw = estimate(&step.values, self.grid.xs(), self.bandwidth);
        let curve = normalize_to_peak(&raw);
        let xs = self.grid.xs();
        let x_extent = match (xs.first(), xs.last()) {
            (Some(&lo), Some(&hi)) => (lo, hi),
            _ => (0.0, 0.0),
        };
        let y_extent = (!curve.is_empty()).then_some((0.0, 1.0));
        self.frame = Some(AnimationFrame {
            index: self.index,
            len: self.steps.len(),
            ordinal: step.ordinal,
            observations: step.values.len(),
            excluded: self.excluded,
            curve,
            x_extent,
            y_extent,
            playback: self.playback,
        });
    }
}
