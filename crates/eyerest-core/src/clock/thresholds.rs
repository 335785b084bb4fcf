use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ThresholdError;

/// A positive rational multiple of the `test_time` base unit.
///
/// Equality and ordering compare the rational value, so `2/4 == 5/10`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "RawMultiplier")]
pub struct Multiplier {
    num: u64,
    den: u64,
}

#[derive(Deserialize)]
struct RawMultiplier {
    num: u64,
    den: u64,
}

impl TryFrom<RawMultiplier> for Multiplier {
    type Error = ThresholdError;

    fn try_from(raw: RawMultiplier) -> Result<Self, Self::Error> {
        Multiplier::new(raw.num, raw.den)
    }
}

impl Multiplier {
    pub fn new(num: u64, den: u64) -> Result<Self, ThresholdError> {
        if num == 0 || den == 0 {
            return Err(ThresholdError::InvalidMultiplier { num, den });
        }
        Ok(Self { num, den })
    }

    /// `n / 10`, e.g. `tenths(46)` is 4.6.
    pub const fn tenths(n: u64) -> Self {
        Self { num: n, den: 10 }
    }

    /// The elapsed second at which this multiplier fires:
    /// `floor(multiplier * test_time)`.
    pub fn trigger_second(self, test_time: u64) -> u64 {
        ((self.num as u128 * test_time as u128) / self.den as u128) as u64
    }

    pub fn as_f64(self) -> f64 {
        self.num as f64 / self.den as f64
    }
}

impl PartialEq for Multiplier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Multiplier {}

impl PartialOrd for Multiplier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Multiplier {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.num as u128 * other.den as u128).cmp(&(other.num as u128 * self.den as u128))
    }
}

impl fmt::Display for Multiplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_f64())
    }
}

/// Side effect bound to a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdAction {
    /// Capture channel A as the baseline and start the duck ramp.
    CaptureAndDuck,
    /// Speak the elapsed seconds.
    Announce,
    /// Reverse the duck ramp back to the baseline.
    Restore,
    /// Tell the window scheduler a rest loop completed.
    CompleteLoop,
}

#[derive(Debug, Clone)]
pub struct Threshold {
    pub multiplier: Multiplier,
    pub action: ThresholdAction,
    fired: bool,
}

impl Threshold {
    pub fn fired(&self) -> bool {
        self.fired
    }
}

/// Ordered `multiplier -> action` bindings, each firing at most once per run
/// segment.
#[derive(Debug, Clone)]
pub struct ThresholdTable {
    entries: Vec<Threshold>,
}

/// One `multiplier -> action` binding as it appears in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdBinding {
    pub multiplier: Multiplier,
    pub action: ThresholdAction,
}

impl ThresholdBinding {
    pub const fn new(multiplier: Multiplier, action: ThresholdAction) -> Self {
        Self { multiplier, action }
    }
}

/// The eye-rest schedule: duck at 0.1, speak at 1, 2 and 3, restore at 4.6
/// and complete the loop at 5.6.
pub const STANDARD_BINDINGS: [ThresholdBinding; 6] = [
    ThresholdBinding::new(Multiplier::tenths(1), ThresholdAction::CaptureAndDuck),
    ThresholdBinding::new(Multiplier::tenths(10), ThresholdAction::Announce),
    ThresholdBinding::new(Multiplier::tenths(20), ThresholdAction::Announce),
    ThresholdBinding::new(Multiplier::tenths(30), ThresholdAction::Announce),
    ThresholdBinding::new(Multiplier::tenths(46), ThresholdAction::Restore),
    ThresholdBinding::new(Multiplier::tenths(56), ThresholdAction::CompleteLoop),
];

impl ThresholdTable {
    /// Build a table. Multipliers must be strictly increasing.
    pub fn new(
        bindings: impl IntoIterator<Item = (Multiplier, ThresholdAction)>,
    ) -> Result<Self, ThresholdError> {
        let table = Self::build(bindings);
        table.check_increasing()?;
        Ok(table)
    }

    /// Build a table from configured bindings.
    pub fn from_bindings(bindings: &[ThresholdBinding]) -> Result<Self, ThresholdError> {
        Self::new(bindings.iter().map(|b| (b.multiplier, b.action)))
    }

    /// Table built from [`STANDARD_BINDINGS`].
    pub fn standard() -> Self {
        let table = Self::build(STANDARD_BINDINGS.iter().map(|b| (b.multiplier, b.action)));
        debug_assert!(table.check_increasing().is_ok());
        table
    }

    fn build(bindings: impl IntoIterator<Item = (Multiplier, ThresholdAction)>) -> Self {
        Self {
            entries: bindings
                .into_iter()
                .map(|(multiplier, action)| Threshold {
                    multiplier,
                    action,
                    fired: false,
                })
                .collect(),
        }
    }

    fn check_increasing(&self) -> Result<(), ThresholdError> {
        for pair in self.entries.windows(2) {
            if pair[0].multiplier >= pair[1].multiplier {
                return Err(ThresholdError::NotIncreasing {
                    previous: pair[0].multiplier.to_string(),
                    next: pair[1].multiplier.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn entries(&self) -> &[Threshold] {
        &self.entries
    }

    /// Clear every fired flag.
    pub fn reset(&mut self) {
        for entry in &mut self.entries {
            entry.fired = false;
        }
    }

    /// Mark and return, in ascending order, the unfired entries whose trigger
    /// second equals `elapsed`.
    pub fn take_due(&mut self, elapsed: u64, test_time: u64) -> Vec<(Multiplier, ThresholdAction)> {
        let mut due = Vec::new();
        for entry in &mut self.entries {
            if !entry.fired && entry.multiplier.trigger_second(test_time) == elapsed {
                entry.fired = true;
                due.push((entry.multiplier, entry.action));
            }
        }
        due
    }

    /// Trigger second of the next unfired entry still ahead of `elapsed`.
    pub fn next_trigger(&self, elapsed: u64, test_time: u64) -> Option<u64> {
        self.entries
            .iter()
            .filter(|e| !e.fired)
            .map(|e| e.multiplier.trigger_second(test_time))
            .find(|&second| second > elapsed)
    }
}

impl Default for ThresholdTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_trigger_seconds() {
        let table = ThresholdTable::standard();
        let seconds: Vec<u64> = table
            .entries()
            .iter()
            .map(|e| e.multiplier.trigger_second(10))
            .collect();
        assert_eq!(seconds, vec![1, 10, 20, 30, 46, 56]);
    }

    #[test]
    fn standard_table_passes_construction_checks() {
        let built = ThresholdTable::from_bindings(&STANDARD_BINDINGS).unwrap();
        assert_eq!(built.entries().len(), ThresholdTable::standard().entries().len());
        assert!(ThresholdTable::standard().check_increasing().is_ok());
    }

    #[test]
    fn bindings_deserialize_from_toml() {
        #[derive(Deserialize)]
        struct Doc {
            thresholds: Vec<ThresholdBinding>,
        }
        let doc: Doc = toml::from_str(
            r#"
            [[thresholds]]
            multiplier = { num = 1, den = 2 }
            action = "capture_and_duck"

            [[thresholds]]
            multiplier = { num = 3, den = 1 }
            action = "restore"
            "#,
        )
        .unwrap();

        let table = ThresholdTable::from_bindings(&doc.thresholds).unwrap();
        let seconds: Vec<u64> = table
            .entries()
            .iter()
            .map(|e| e.multiplier.trigger_second(10))
            .collect();
        assert_eq!(seconds, vec![5, 30]);
        assert_eq!(table.entries()[1].action, ThresholdAction::Restore);
    }

    #[test]
    fn trigger_second_floors() {
        assert_eq!(Multiplier::tenths(46).trigger_second(3), 13);
        assert_eq!(Multiplier::tenths(1).trigger_second(5), 0);
        assert_eq!(Multiplier::new(1, 3).unwrap().trigger_second(10), 3);
    }

    #[test]
    fn rejects_non_increasing_multipliers() {
        let result = ThresholdTable::new([
            (Multiplier::tenths(20), ThresholdAction::Announce),
            (Multiplier::new(2, 1).unwrap(), ThresholdAction::Announce),
        ]);
        assert!(matches!(result, Err(ThresholdError::NotIncreasing { .. })));
    }

    #[test]
    fn rejects_zero_multiplier() {
        assert!(Multiplier::new(0, 1).is_err());
        assert!(Multiplier::new(1, 0).is_err());
        assert!(serde_json::from_str::<Multiplier>(r#"{"num":3,"den":0}"#).is_err());
    }

    #[test]
    fn entries_fire_once_until_reset() {
        let mut table = ThresholdTable::standard();
        assert_eq!(
            table.take_due(46, 10),
            vec![(Multiplier::tenths(46), ThresholdAction::Restore)]
        );
        assert!(table.take_due(46, 10).is_empty());

        table.reset();
        assert_eq!(table.take_due(46, 10).len(), 1);
    }

    #[test]
    fn next_trigger_skips_fired_entries() {
        let mut table = ThresholdTable::standard();
        assert_eq!(table.next_trigger(0, 10), Some(1));
        table.take_due(1, 10);
        assert_eq!(table.next_trigger(1, 10), Some(10));
        assert_eq!(table.next_trigger(56, 10), None);
    }

    #[test]
    fn multipliers_compare_as_rationals() {
        assert!(Multiplier::new(1, 3).unwrap() < Multiplier::tenths(4));
        assert_eq!(Multiplier::new(2, 4).unwrap(), Multiplier::tenths(5));
    }
}
