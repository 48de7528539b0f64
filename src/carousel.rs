//! Looping banner carousel.
//!
//! States: `Idle` (no slides), `Ready`, `Transitioning` (locked for one
//! transition). The index wraps in both directions with `(i + step + n) % n`.
//! Time is passed in by the owner (`now: Instant`), so the engine never owns a
//! timer that could outlive it; the render loop calls [`Carousel::tick`].

use std::time::{Duration, Instant};

use tokio::sync::mpsc::UnboundedSender;

use crate::types::Slide;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    fn step(self) -> isize {
        match self {
            Direction::Forward => 1,
            Direction::Backward => -1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Ready,
    Transitioning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Impression,
    Click,
}

/// Fire-and-forget telemetry for one banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackEvent {
    pub banner_id: u64,
    pub kind: TrackKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarouselSettings {
    /// Auto-advance period.
    pub interval: Duration,
    /// Lock duration of one transition.
    pub transition: Duration,
}

impl Default for CarouselSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(6000),
            transition: Duration::from_millis(700),
        }
    }
}

/// Wrap `index + step` into `[0, len)`. `len` must be non-zero.
pub fn wrap_index(index: usize, step: isize, len: usize) -> usize {
    let n = len as isize;
    ((index as isize % n + step % n + n) % n) as usize
}

#[derive(Debug)]
pub struct Carousel {
    slides: Vec<Slide>,
    active_index: usize,
    staged_index: Option<usize>,
    direction: Direction,
    transition_started: Option<Instant>,
    hovered: bool,
    autoplay: bool,
    next_auto_at: Option<Instant>,
    settings: CarouselSettings,
    tracker: Option<UnboundedSender<TrackEvent>>,
}

impl Carousel {
    pub fn new(settings: CarouselSettings) -> Self {
        Self {
            slides: Vec::new(),
            active_index: 0,
            staged_index: None,
            direction: Direction::Forward,
            transition_started: None,
            hovered: false,
            autoplay: true,
            next_auto_at: None,
            settings,
            tracker: None,
        }
    }

    pub fn with_tracker(mut self, tx: UnboundedSender<TrackEvent>) -> Self {
        self.tracker = Some(tx);
        self
    }

    // ----- getters -----
    pub fn phase(&self) -> Phase {
        if self.slides.is_empty() {
            Phase::Idle
        } else if self.transition_started.is_some() {
            Phase::Transitioning
        } else {
            Phase::Ready
        }
    }
    pub fn len(&self) -> usize {
        self.slides.len()
    }
    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }
    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }
    pub fn active_index(&self) -> usize {
        self.active_index
    }
    pub fn direction(&self) -> Direction {
        self.direction
    }
    pub fn is_transitioning(&self) -> bool {
        self.transition_started.is_some()
    }
    pub fn is_paused(&self) -> bool {
        self.hovered || !self.autoplay
    }
    pub fn autoplay(&self) -> bool {
        self.autoplay
    }
    pub fn next_auto_at(&self) -> Option<Instant> {
        self.next_auto_at
    }
    pub fn settings(&self) -> CarouselSettings {
        self.settings
    }

    pub fn active_slide(&self) -> Option<&Slide> {
        self.slides.get(self.active_index)
    }

    /// Slide being animated out while a transition runs.
    pub fn staged_slide(&self) -> Option<&Slide> {
        self.staged_index.and_then(|i| self.slides.get(i))
    }

    /// Transition progress in `[0, 1]`; `1.0` when not transitioning.
    pub fn transition_progress(&self, now: Instant) -> f32 {
        match self.transition_started {
            None => 1.0,
            Some(start) => {
                let total = self.settings.transition.as_secs_f32();
                if total <= f32::EPSILON {
                    return 1.0;
                }
                (now.saturating_duration_since(start).as_secs_f32() / total).clamp(0.0, 1.0)
            }
        }
    }

    /// One flag per slide, `true` for the active one.
    pub fn indicator(&self) -> Vec<bool> {
        (0..self.slides.len()).map(|i| i == self.active_index).collect()
    }

    // ----- lifecycle -----
    /// `Idle -> Ready`. Slides are fixed once loaded; later calls are ignored.
    pub fn load_slides(&mut self, slides: Vec<Slide>, now: Instant) -> bool {
        if !self.slides.is_empty() || slides.is_empty() {
            return false;
        }
        self.slides = slides;
        self.active_index = 0;
        self.staged_index = None;
        self.direction = Direction::Forward;
        self.transition_started = None;
        self.arm_timer(now);
        log::debug!("[carousel] {} slides loaded", self.slides.len());
        true
    }

    // ----- navigation -----
    /// Step one slide in `dir`, wrapping at both ends.
    pub fn advance(&mut self, dir: Direction, now: Instant) -> bool {
        if !self.can_navigate() {
            return false;
        }
        let target = wrap_index(self.active_index, dir.step(), self.slides.len());
        self.begin_transition(target, dir, now);
        true
    }

    /// Go straight to `index` (dot navigation).
    pub fn jump_to(&mut self, index: usize, now: Instant) -> bool {
        if !self.can_navigate() {
            return false;
        }
        let target = wrap_index(index, 0, self.slides.len());
        if target == self.active_index {
            return false;
        }
        let dir = if target > self.active_index {
            Direction::Forward
        } else {
            Direction::Backward
        };
        self.begin_transition(target, dir, now);
        true
    }

    /// Drive time: finish an elapsed transition, fire a due auto-advance.
    /// Returns `true` when visible state changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let mut changed = false;
        if let Some(start) = self.transition_started {
            if now.saturating_duration_since(start) >= self.settings.transition {
                self.transition_started = None;
                self.staged_index = None;
                self.arm_timer(now);
                changed = true;
            }
        }
        if let Some(due) = self.next_auto_at {
            if now >= due && self.auto_enabled() {
                changed |= self.advance(Direction::Forward, now);
            }
        }
        changed
    }

    // ----- pausing -----
    pub fn pause(&mut self) {
        self.autoplay = false;
        self.next_auto_at = None;
    }

    pub fn resume(&mut self, now: Instant) {
        self.autoplay = true;
        self.arm_timer(now);
    }

    pub fn toggle_autoplay(&mut self, now: Instant) {
        if self.autoplay {
            self.pause();
        } else {
            self.resume(now);
        }
    }

    /// Pointer (or focus) over the carousel pauses auto-advance.
    pub fn set_hovered(&mut self, hovered: bool, now: Instant) {
        if self.hovered == hovered {
            return;
        }
        self.hovered = hovered;
        if hovered {
            self.next_auto_at = None;
        } else {
            self.arm_timer(now);
        }
    }

    /// Open the active slide's call-to-action; records a click.
    pub fn activate(&self) -> Option<&Slide> {
        let slide = self.active_slide()?;
        self.track(slide.id, TrackKind::Click);
        Some(slide)
    }

    // ----- internals -----
    fn can_navigate(&self) -> bool {
        self.slides.len() > 1 && self.transition_started.is_none()
    }

    fn auto_enabled(&self) -> bool {
        self.slides.len() > 1 && !self.is_paused() && self.transition_started.is_none()
    }

    fn arm_timer(&mut self, now: Instant) {
        self.next_auto_at = if self.auto_enabled() {
            Some(now + self.settings.interval)
        } else {
            None
        };
    }

    fn begin_transition(&mut self, target: usize, dir: Direction, now: Instant) {
        let leaving = self.active_index;
        if let Some(slide) = self.slides.get(leaving) {
            self.track(slide.id, TrackKind::Impression);
        }
        self.direction = dir;
        self.staged_index = Some(leaving);
        self.active_index = target;
        self.transition_started = Some(now);
        self.next_auto_at = None;
        log::debug!("[carousel] {leaving} -> {target} ({dir:?})");
    }

    fn track(&self, banner_id: u64, kind: TrackKind) {
        if let Some(tx) = &self.tracker {
            // receiver gone means telemetry is off; navigation goes on regardless
            let _ = tx.send(TrackEvent { banner_id, kind });
        }
    }
}
