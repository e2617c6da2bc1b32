//! Progress accounting for a batch run.
//!
//! Jobs fill the first 90% of the scale; the archive step owns the rest. Within one run the
//! percentage never moves backwards.

use serde::Serialize;
use utoipa::ToSchema;

/// Share of the scale given to job units.
pub const GENERATION_SHARE: f64 = 90.0;
/// Ceiling the synthetic curve approaches but never reaches.
pub const SYNTHETIC_CEILING: f64 = 90.0;
const SYNTHETIC_STEP: f64 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Preparing,
    Generating,
    Finalizing,
    Done,
}

impl Phase {
    pub fn from_percent(percent: u8) -> Self {
        match percent {
            0 => Phase::Preparing,
            1..=89 => Phase::Generating,
            90..=99 => Phase::Finalizing,
            _ => Phase::Done,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BatchProgress {
    pub completed_units: usize,
    pub total_units: usize,
    pub percent: u8,
    pub phase: Phase,
}

impl Default for BatchProgress {
    fn default() -> Self {
        Self::idle()
    }
}

impl BatchProgress {
    pub fn idle() -> Self {
        Self {
            completed_units: 0,
            total_units: 0,
            percent: 0,
            phase: Phase::Preparing,
        }
    }

    pub fn start(total_units: usize) -> Self {
        Self {
            total_units,
            ..Self::idle()
        }
    }

    /// `round(completed / total × 100)`, capped at 100.
    pub fn unit_percent(&self) -> u8 {
        if self.total_units == 0 {
            return 0;
        }
        let ratio = self.completed_units as f64 / self.total_units as f64;
        (ratio * 100.0).round().min(100.0) as u8
    }

    fn generation_percent(&self) -> u8 {
        if self.total_units == 0 {
            return 0;
        }
        let ratio = self.completed_units as f64 / self.total_units as f64;
        (ratio * GENERATION_SHARE).round().min(GENERATION_SHARE) as u8
    }

    /// Count one resolved job, whatever its outcome.
    pub fn complete_unit(&mut self) {
        self.completed_units = (self.completed_units + 1).min(self.total_units);
        let target = self.generation_percent();
        self.advance_to(target);
    }

    /// Raise the displayed percentage; lower values are ignored.
    pub fn advance_to(&mut self, percent: u8) {
        self.percent = self.percent.max(percent.min(100));
        self.phase = Phase::from_percent(self.percent);
    }

    pub fn finish(&mut self) {
        self.completed_units = self.total_units;
        self.advance_to(100);
    }
}

/// Stand-in progress for a single remote job that reports nothing until it returns.
///
/// Every tick closes a fixed fraction of the remaining gap to the ceiling, so the value keeps
/// moving without ever arriving.
#[derive(Debug, Clone, Default)]
pub struct SyntheticCurve {
    value: f64,
}

impl SyntheticCurve {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&mut self) -> u8 {
        self.value += (SYNTHETIC_CEILING - self.value) * SYNTHETIC_STEP;
        // floor keeps the reported value strictly under the ceiling
        (self.value.floor() as u8).min(SYNTHETIC_CEILING as u8 - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_thresholds() {
        assert_eq!(Phase::from_percent(0), Phase::Preparing);
        assert_eq!(Phase::from_percent(1), Phase::Generating);
        assert_eq!(Phase::from_percent(89), Phase::Generating);
        assert_eq!(Phase::from_percent(90), Phase::Finalizing);
        assert_eq!(Phase::from_percent(100), Phase::Done);
    }

    #[test]
    fn test_units_fill_generation_share() {
        let mut progress = BatchProgress::start(3);
        progress.complete_unit();
        assert_eq!(progress.percent, 30);
        assert_eq!(progress.unit_percent(), 33);
        progress.complete_unit();
        progress.complete_unit();
        assert_eq!(progress.percent, 90);
        assert_eq!(progress.unit_percent(), 100);
        assert_eq!(progress.phase, Phase::Finalizing);

        // extra completions are capped
        progress.complete_unit();
        assert_eq!(progress.completed_units, 3);

        progress.finish();
        assert_eq!(progress.percent, 100);
        assert_eq!(progress.phase, Phase::Done);
    }

    #[test]
    fn test_percent_never_moves_backwards() {
        let mut progress = BatchProgress::start(1);
        progress.advance_to(60);
        progress.advance_to(20);
        assert_eq!(progress.percent, 60);
        progress.advance_to(250);
        assert_eq!(progress.percent, 100);
    }

    #[test]
    fn test_synthetic_curve_is_monotonic_and_bounded() {
        let mut curve = SyntheticCurve::new();
        let mut last = 0;
        for _ in 0..200 {
            let value = curve.tick();
            assert!(value >= last);
            assert!(value < 90);
            last = value;
        }
        assert_eq!(last, 89);
    }
}
