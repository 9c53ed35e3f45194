// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Simulation clock
//!
//! The game state (Stopped, Playing, Paused) is owned by the caller; the
//! clock only reacts to transitions. Starting play from Stopped asks for a
//! field reset, and while playing one generation is due every
//! `step_interval` seconds of timer ticks.

use std::time::Instant;

/// Externally driven play state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameState {
    /// Not running; the next Play resets the field
    #[default]
    Stopped,
    /// Running
    Playing,
    /// Frozen, resumable
    Paused,
}

/// Current game state plus the one it replaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GameStateSignal {
    current: GameState,
    previous: GameState,
}

impl GameStateSignal {
    /// A signal at rest in `Stopped`
    pub fn new() -> Self {
        Self::default()
    }

    /// Move to `state`, remembering the current one as previous
    pub fn set(&mut self, state: GameState) {
        self.previous = self.current;
        self.current = state;
    }

    /// Mark the pending transition handled
    pub fn acknowledge(&mut self) {
        self.previous = self.current;
    }

    /// Get the current state
    pub fn current(&self) -> GameState {
        self.current
    }

    /// Get the previous state
    pub fn previous(&self) -> GameState {
        self.previous
    }
}

/// Pausable millisecond stopwatch
pub trait Timer {
    /// Start, or restart, counting from zero
    fn start(&mut self);

    /// Stop and reset to zero
    fn stop(&mut self);

    /// Freeze the count; no-op unless running
    fn pause(&mut self);

    /// Resume a paused count
    fn unpause(&mut self);

    /// Milliseconds counted so far; 0 when stopped
    fn ticks(&self) -> u64;

    /// Whether the timer has been started
    fn is_started(&self) -> bool;

    /// Whether the timer is started and paused
    fn is_paused(&self) -> bool;
}

/// Stopwatch state over an arbitrary millisecond source
#[derive(Debug, Clone, Copy, Default)]
struct Stopwatch {
    start_ticks: u64,
    paused_ticks: u64,
    started: bool,
    paused: bool,
}

impl Stopwatch {
    fn start(&mut self, now: u64) {
        self.started = true;
        self.paused = false;
        self.start_ticks = now;
        self.paused_ticks = 0;
    }

    fn stop(&mut self) {
        *self = Stopwatch::default();
    }

    fn pause(&mut self, now: u64) {
        if self.started && !self.paused {
            self.paused = true;
            self.paused_ticks = now.saturating_sub(self.start_ticks);
            self.start_ticks = 0;
        }
    }

    fn unpause(&mut self, now: u64) {
        if self.started && self.paused {
            self.paused = false;
            self.start_ticks = now.saturating_sub(self.paused_ticks);
        }
    }

    fn ticks(&self, now: u64) -> u64 {
        match (self.started, self.paused) {
            (false, _) => 0,
            (true, true) => self.paused_ticks,
            (true, false) => now.saturating_sub(self.start_ticks),
        }
    }
}

/// [`Timer`] backed by the monotonic system clock
#[derive(Debug, Clone)]
pub struct SystemTimer {
    origin: Instant,
    watch: Stopwatch,
}

impl SystemTimer {
    /// Create a stopped timer
    pub fn new() -> Self {
        SystemTimer {
            origin: Instant::now(),
            watch: Stopwatch::default(),
        }
    }

    fn now(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

impl Default for SystemTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer for SystemTimer {
    fn start(&mut self) {
        let now = self.now();
        self.watch.start(now);
    }

    fn stop(&mut self) {
        self.watch.stop();
    }

    fn pause(&mut self) {
        let now = self.now();
        self.watch.pause(now);
    }

    fn unpause(&mut self) {
        let now = self.now();
        self.watch.unpause(now);
    }

    fn ticks(&self) -> u64 {
        self.watch.ticks(self.now())
    }

    fn is_started(&self) -> bool {
        self.watch.started
    }

    fn is_paused(&self) -> bool {
        self.watch.started && self.watch.paused
    }
}

/// [`Timer`] whose time only moves when told to
///
/// ```
/// use life_engine::clock::{ManualTimer, Timer};
///
/// let mut timer = ManualTimer::new();
/// timer.start();
/// timer.advance(250);
/// assert_eq!(timer.ticks(), 250);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManualTimer {
    now: u64,
    watch: Stopwatch,
}

impl ManualTimer {
    /// Create a stopped timer at time zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward by `millis`
    pub fn advance(&mut self, millis: u64) {
        self.now += millis;
    }
}

impl Timer for ManualTimer {
    fn start(&mut self) {
        self.watch.start(self.now);
    }

    fn stop(&mut self) {
        self.watch.stop();
    }

    fn pause(&mut self) {
        self.watch.pause(self.now);
    }

    fn unpause(&mut self) {
        self.watch.unpause(self.now);
    }

    fn ticks(&self) -> u64 {
        self.watch.ticks(self.now)
    }

    fn is_started(&self) -> bool {
        self.watch.started
    }

    fn is_paused(&self) -> bool {
        self.watch.started && self.watch.paused
    }
}

/// What the owner of a clock must do this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClockEvents {
    /// Play started from Stopped; reset the field
    pub reinitialize: bool,
    /// A step interval elapsed; advance one generation
    pub advance: bool,
}

/// Turns game-state transitions and elapsed time into [`ClockEvents`]
#[derive(Debug, Clone)]
pub struct SimulationClock<T: Timer = SystemTimer> {
    timer: T,
    signal: GameStateSignal,
    step_interval: f32,
}

impl<T: Timer> SimulationClock<T> {
    /// Create a stopped clock stepping every `step_interval` seconds
    pub fn new(timer: T, step_interval: f32) -> Self {
        SimulationClock {
            timer,
            signal: GameStateSignal::new(),
            step_interval,
        }
    }

    /// Request a new game state; takes effect on the next tick
    pub fn set_state(&mut self, state: GameState) {
        self.signal.set(state);
    }

    /// Get the current game state
    pub fn state(&self) -> GameState {
        self.signal.current()
    }

    /// Get the state signal
    pub fn signal(&self) -> GameStateSignal {
        self.signal
    }

    /// Get the step interval in seconds
    pub fn step_interval(&self) -> f32 {
        self.step_interval
    }

    /// Set the step interval in seconds
    pub fn set_step_interval(&mut self, seconds: f32) {
        self.step_interval = seconds;
    }

    /// Borrow the timer
    pub fn timer(&self) -> &T {
        &self.timer
    }

    /// Mutably borrow the timer
    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }

    /// React to the current state and elapsed time
    pub fn tick(&mut self) -> ClockEvents {
        let mut events = ClockEvents::default();
        let state = self.signal.current();
        let previous = self.signal.previous();

        if state == GameState::Paused && self.timer.is_started() && !self.timer.is_paused() {
            self.timer.pause();
            log::info!("Timer paused");
        }

        if state == GameState::Stopped && previous != GameState::Stopped {
            self.signal.acknowledge();
            self.timer.stop();
            log::info!("Timer stopped");
        }

        if state == GameState::Playing && previous == GameState::Paused && self.timer.is_started() {
            self.signal.acknowledge();
            self.timer.unpause();
            log::info!("Timer unpaused");
        }

        // A pause requested while stopped never started the timer
        if state == GameState::Playing
            && (previous == GameState::Stopped || !self.timer.is_started())
        {
            self.signal.acknowledge();
            self.timer.start();
            events.reinitialize = true;
            log::info!("Timer started");
        }

        if state == GameState::Playing && self.timer.ticks() as f32 / 1000.0 >= self.step_interval {
            self.timer.stop();
            self.timer.start();
            events.advance = true;
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock() -> SimulationClock<ManualTimer> {
        SimulationClock::new(ManualTimer::new(), 1.0)
    }

    #[test]
    fn test_signal_tracks_previous() {
        let mut signal = GameStateSignal::new();
        signal.set(GameState::Playing);
        assert_eq!(signal.previous(), GameState::Stopped);
        signal.acknowledge();
        assert_eq!(signal.previous(), GameState::Playing);
    }

    #[test]
    fn test_manual_timer_pause() {
        let mut timer = ManualTimer::new();
        assert_eq!(timer.ticks(), 0);
        timer.start();
        timer.advance(100);
        timer.pause();
        assert!(timer.is_paused());
        timer.advance(500);
        assert_eq!(timer.ticks(), 100);
        timer.unpause();
        timer.advance(50);
        assert_eq!(timer.ticks(), 150);
        timer.stop();
        assert_eq!(timer.ticks(), 0);
        assert!(!timer.is_started());
    }

    #[test]
    fn test_pause_requires_start() {
        let mut timer = ManualTimer::new();
        timer.pause();
        assert!(!timer.is_paused());
    }

    #[test]
    fn test_system_timer_counts_up() {
        let mut timer = SystemTimer::new();
        timer.start();
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(timer.ticks() >= 5);
    }

    #[test]
    fn test_stopped_clock_is_idle() {
        let mut clock = clock();
        clock.timer_mut().advance(10_000);
        assert_eq!(clock.tick(), ClockEvents::default());
    }

    #[test]
    fn test_play_from_stopped_reinitializes() {
        let mut clock = clock();
        clock.set_state(GameState::Playing);
        let events = clock.tick();
        assert!(events.reinitialize);
        assert!(!events.advance);
        assert!(!clock.tick().reinitialize);
    }

    #[test]
    fn test_advance_after_interval() {
        let mut clock = clock();
        clock.set_state(GameState::Playing);
        clock.tick();

        clock.timer_mut().advance(999);
        assert!(!clock.tick().advance);
        clock.timer_mut().advance(1);
        assert!(clock.tick().advance);
        // Timer restarted
        assert!(!clock.tick().advance);
    }

    #[test]
    fn test_pause_freezes_progress() {
        let mut clock = clock();
        clock.set_state(GameState::Playing);
        clock.tick();
        clock.timer_mut().advance(600);

        clock.set_state(GameState::Paused);
        clock.tick();
        clock.timer_mut().advance(5_000);
        assert!(!clock.tick().advance);

        clock.set_state(GameState::Playing);
        let events = clock.tick();
        assert!(!events.reinitialize);
        assert!(!events.advance);
        clock.timer_mut().advance(400);
        assert!(clock.tick().advance);
    }

    #[test]
    fn test_play_after_pause_from_stopped_starts() {
        let mut clock = clock();
        clock.set_state(GameState::Paused);
        assert_eq!(clock.tick(), ClockEvents::default());
        assert!(!clock.timer().is_started());

        clock.set_state(GameState::Playing);
        let events = clock.tick();
        assert!(events.reinitialize);
        assert!(clock.timer().is_started());

        clock.timer_mut().advance(1_000);
        assert!(clock.tick().advance);
    }

    #[test]
    fn test_stop_then_play_reinitializes_again() {
        let mut clock = clock();
        clock.set_state(GameState::Playing);
        clock.tick();
        clock.set_state(GameState::Stopped);
        clock.tick();
        assert!(!clock.timer().is_started());

        clock.set_state(GameState::Playing);
        assert!(clock.tick().reinitialize);
    }
}
