//! Fixed-rate driver: the update-then-repaint loop shared by every applet.
//!
//! A [`Driver`] owns the *running* flag and a queue of pending input events.
//! Each [`tick`](Driver::tick) applies queued events, advances the engine by one
//! step (unless paused), then hands a fresh [`Scene`] to a [`Renderer`]. The
//! whole sequence runs on the caller's thread, so a renderer always sees the
//! state produced by a complete step.
//!
//! Wall-clock pacing is separated from the tick itself: [`Driver::run`] ticks
//! back to back (headless, tests), [`Driver::run_paced`] holds a constant
//! cadence against a [`Clock`].

use crate::engine::Engine;
use crate::error::EngineError;
use crate::input::InputEvent;
use crate::scene::Scene;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Consumer of rendered frames.
pub trait Renderer {
    /// Draws one frame. Called once per tick, after the step.
    fn render(&mut self, scene: &Scene) -> Result<(), EngineError>;
}

impl<F> Renderer for F
where
    F: FnMut(&Scene) -> Result<(), EngineError>,
{
    fn render(&mut self, scene: &Scene) -> Result<(), EngineError> {
        self(scene)
    }
}

/// Source of wall-clock time for paced runs.
pub trait Clock {
    fn now(&self) -> Instant;
    /// Blocks until `deadline`. Returns immediately if it has already passed.
    fn sleep_until(&mut self, deadline: Instant);
}

/// [`Clock`] backed by `Instant::now` and `std::thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep_until(&mut self, deadline: Instant) {
        let now = Instant::now();
        if deadline > now {
            std::thread::sleep(deadline - now);
        }
    }
}

/// Record of one completed tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// Zero-based tick index.
    pub index: u64,
    /// Whether the engine was stepped (false while paused).
    pub stepped: bool,
    /// Number of queued input events applied before the step.
    pub events: usize,
    /// Number of queued events the engine rejected this tick.
    pub rejected: usize,
}

/// Fixed-rate scheduler for one engine.
#[derive(Debug)]
pub struct Driver {
    interval: Duration,
    running: bool,
    ticks: u64,
    steps: u64,
    pending: VecDeque<InputEvent>,
    rejected: Vec<EngineError>,
}

/// Interval for a tick rate, or `InvalidTickRate` when `hz` is not positive
/// and finite or its period does not fit in a [`Duration`].
pub fn tick_interval(hz: f64) -> Result<Duration, EngineError> {
    if !hz.is_finite() || hz <= 0.0 {
        return Err(EngineError::InvalidTickRate(hz));
    }
    Duration::try_from_secs_f64(1.0 / hz).map_err(|_| EngineError::InvalidTickRate(hz))
}

impl Driver {
    /// Default cadence, matching a 16 ms repaint timer.
    pub const DEFAULT_HZ: f64 = 60.0;

    /// Creates a running driver ticking at `hz`.
    ///
    /// Returns `EngineError::InvalidTickRate` for any rate [`tick_interval`]
    /// refuses.
    pub fn new(hz: f64) -> Result<Self, EngineError> {
        Ok(Self {
            interval: tick_interval(hz)?,
            ..Self::default()
        })
    }

    /// Time between tick deadlines.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Resumes stepping from the next tick.
    pub fn start(&mut self) {
        self.running = true;
    }

    /// Pauses stepping from the next tick. Rendering continues.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Flips the running flag (a pause/resume button).
    pub fn toggle(&mut self) {
        self.running = !self.running;
    }

    /// Ticks completed so far, paused or not.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Engine steps performed so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Buffers an input event for the next tick boundary.
    pub fn queue(&mut self, event: InputEvent) {
        self.pending.push_back(event);
    }

    /// Number of events waiting for the next tick.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Errors from rejected events since the last call, oldest first.
    pub fn take_rejected(&mut self) -> Vec<EngineError> {
        std::mem::take(&mut self.rejected)
    }

    /// Runs one tick: apply queued events, step if running, render.
    ///
    /// Events are applied in arrival order. A rejected event is dropped and
    /// its error kept for [`take_rejected`](Driver::take_rejected); the
    /// remaining events and the step still run.
    pub fn tick<E, R>(&mut self, engine: &mut E, renderer: &mut R) -> Result<Tick, EngineError>
    where
        E: Engine + ?Sized,
        R: Renderer + ?Sized,
    {
        let mut events = 0;
        let mut rejected = 0;
        while let Some(event) = self.pending.pop_front() {
            match engine.handle_input(&event) {
                Ok(()) => events += 1,
                Err(e) => {
                    self.rejected.push(e);
                    rejected += 1;
                }
            }
        }

        let stepped = self.running;
        if stepped {
            engine.step()?;
            self.steps += 1;
        }

        renderer.render(&engine.scene())?;

        let index = self.ticks;
        self.ticks += 1;
        Ok(Tick {
            index,
            stepped,
            events,
            rejected,
        })
    }

    /// Runs `ticks` ticks back to back with no pacing.
    pub fn run<E, R>(&mut self, engine: &mut E, renderer: &mut R, ticks: u64) -> Result<(), EngineError>
    where
        E: Engine + ?Sized,
        R: Renderer + ?Sized,
    {
        self.run_with(engine, renderer, ticks, |_, _| {})
    }

    /// Like [`run`](Driver::run), calling `before(index, driver)` ahead of each
    /// tick so a script can queue that tick's events.
    pub fn run_with<E, R, F>(
        &mut self,
        engine: &mut E,
        renderer: &mut R,
        ticks: u64,
        mut before: F,
    ) -> Result<(), EngineError>
    where
        E: Engine + ?Sized,
        R: Renderer + ?Sized,
        F: FnMut(u64, &mut Driver),
    {
        for _ in 0..ticks {
            before(self.ticks, self);
            self.tick(engine, renderer)?;
        }
        Ok(())
    }

    /// Runs `ticks` ticks at the driver's cadence, independent of render cost.
    ///
    /// Deadlines advance by one interval per tick. When a tick overruns its
    /// deadline the missed slots are dropped and the cadence restarts from
    /// the current time, so a slow frame never triggers a burst of catch-up
    /// steps. No sleep follows the final tick.
    pub fn run_paced<E, R, C>(
        &mut self,
        engine: &mut E,
        renderer: &mut R,
        ticks: u64,
        clock: &mut C,
    ) -> Result<(), EngineError>
    where
        E: Engine + ?Sized,
        R: Renderer + ?Sized,
        C: Clock + ?Sized,
    {
        self.run_paced_with(engine, renderer, ticks, clock, |_, _| {})
    }

    /// Paced counterpart of [`run_with`](Driver::run_with).
    pub fn run_paced_with<E, R, C, F>(
        &mut self,
        engine: &mut E,
        renderer: &mut R,
        ticks: u64,
        clock: &mut C,
        mut before: F,
    ) -> Result<(), EngineError>
    where
        E: Engine + ?Sized,
        R: Renderer + ?Sized,
        C: Clock + ?Sized,
        F: FnMut(u64, &mut Driver),
    {
        let mut deadline = clock.now();
        for i in 0..ticks {
            before(self.ticks, self);
            self.tick(engine, renderer)?;
            if i + 1 == ticks {
                break;
            }
            deadline += self.interval;
            let now = clock.now();
            if now < deadline {
                clock.sleep_until(deadline);
            } else {
                deadline = now;
            }
        }
        Ok(())
    }
}

impl Default for Driver {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs_f64(1.0 / Self::DEFAULT_HZ),
            running: true,
            ticks: 0,
            steps: 0,
            pending: VecDeque::new(),
            rejected: Vec::new(),
        }
    }
}
