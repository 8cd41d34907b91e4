//! Portion selector switch
//!
//! A three-position switch on a resistor ladder, read through one ADC
//! channel. Two sampling modes:
//!
//! - Polling: every [`FeedSwitch::read`] runs a conversion and blocks for
//!   it.
//! - Free-running: a background sampler converts continuously into a
//!   shared [`LatestSample`]; reads decode whatever it holds last.

use portable_atomic::{AtomicU16, Ordering};

use kibble_core::config::SampleMode;
use kibble_core::feed::{FeedMode, FeedThresholds};
use kibble_hal::adc::AnalogInput;

const EMPTY: u16 = u16::MAX;

/// Most recent background conversion
pub struct LatestSample {
    raw: AtomicU16,
}

impl Default for LatestSample {
    fn default() -> Self {
        Self::new()
    }
}

impl LatestSample {
    pub const fn new() -> Self {
        Self {
            raw: AtomicU16::new(EMPTY),
        }
    }

    pub fn store(&self, raw: u16) {
        self.raw.store(raw.min(EMPTY - 1), Ordering::Release);
    }

    /// `None` until the first conversion lands
    pub fn load(&self) -> Option<u16> {
        match self.raw.load(Ordering::Acquire) {
            EMPTY => None,
            raw => Some(raw),
        }
    }
}

/// Background half of free-running mode: owns the converter
pub struct Sampler<'a, A> {
    adc: A,
    latest: &'a LatestSample,
}

impl<'a, A: AnalogInput> Sampler<'a, A> {
    pub fn new(adc: A, latest: &'a LatestSample) -> Self {
        Self { adc, latest }
    }

    /// Run one conversion and publish it
    pub fn sample(&mut self) -> Result<u16, A::Error> {
        let raw = self.adc.read_blocking()?;
        self.latest.store(raw);
        Ok(raw)
    }
}

enum Source<'a, A> {
    Polled(A),
    Background(&'a LatestSample),
}

/// Feed-mode switch
pub struct FeedSwitch<'a, A> {
    source: Source<'a, A>,
    thresholds: FeedThresholds,
    current: FeedMode,
}

impl<'a, A: AnalogInput> FeedSwitch<'a, A> {
    /// Convert on every read
    pub fn polling(adc: A, thresholds: FeedThresholds) -> Self {
        Self {
            source: Source::Polled(adc),
            thresholds,
            current: FeedMode::Low,
        }
    }

    /// Decode the background sampler's latest conversion
    pub fn free_running(latest: &'a LatestSample, thresholds: FeedThresholds) -> Self {
        Self {
            source: Source::Background(latest),
            thresholds,
            current: FeedMode::Low,
        }
    }

    pub fn sample_mode(&self) -> SampleMode {
        match self.source {
            Source::Polled(_) => SampleMode::Polling,
            Source::Background(_) => SampleMode::FreeRunning,
        }
    }

    /// Current switch position
    ///
    /// In free-running mode before any conversion has landed this is
    /// [`FeedMode::Low`].
    pub fn read(&mut self) -> Result<FeedMode, A::Error> {
        let raw = match &mut self.source {
            Source::Polled(adc) => Some(adc.read_blocking()?),
            Source::Background(latest) => latest.load(),
        };
        if let Some(raw) = raw {
            self.current = self.thresholds.decode(raw);
        }
        Ok(self.current)
    }

    /// Last decoded position, without sampling
    pub fn current(&self) -> FeedMode {
        self.current
    }
}
