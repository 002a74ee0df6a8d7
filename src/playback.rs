/// Ping-pong playback engine
///
/// Scans a 1-indexed frame sequence back and forth, reversing direction at
/// either end instead of wrapping. Advancement is gated by wall-clock time
/// against a fixed per-frame budget; the state transition itself is a pure
/// step so it can be tested without timers.

use std::time::Instant;

/// Per-frame display budget in seconds (NTSC-derived).
pub const NTSC_FRAME_BUDGET: f64 = 1.0 / 29.97;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Playback state: current index `n` in `[1, len]` plus scan direction.
/// The index never leaves that range; direction flips exactly when the
/// index reaches an end of the sequence.
#[derive(Debug)]
pub struct Playback {
    index: usize,
    direction: Direction,
    len: usize,
    last_advance: Instant,
}

impl Playback {
    /// Start at frame 1, scanning forward.
    pub fn new(len: usize) -> Self {
        Self {
            index: 1,
            direction: Direction::Forward,
            len,
            last_advance: Instant::now(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// Advance if the per-frame budget has elapsed since the last advance.
    /// Returns whether the index changed. Called once per display tick.
    pub fn tick(&mut self) -> bool {
        let now = Instant::now();
        if now.duration_since(self.last_advance).as_secs_f64() <= NTSC_FRAME_BUDGET {
            return false;
        }
        self.last_advance = now;
        self.step()
    }

    /// One transition of the state machine, independent of the wall clock.
    /// A single static frame never advances.
    pub fn step(&mut self) -> bool {
        if self.len <= 1 {
            return false;
        }
        match self.direction {
            Direction::Forward => {
                self.index += 1;
                if self.index >= self.len {
                    self.index = self.len;
                    self.direction = Direction::Backward;
                }
            }
            Direction::Backward => {
                self.index -= 1;
                if self.index <= 1 {
                    self.index = 1;
                    self.direction = Direction::Forward;
                }
            }
        }
        true
    }
}
