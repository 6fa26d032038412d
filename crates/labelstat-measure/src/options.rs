//! Request options of [`crate::measure_labelled_objects`]

use crate::error::MeasureError;
use labelstat_core::SchedulerOptions;
use labelstat_percentile::CommonLevelsTieMode;
use std::fmt;
use std::str::FromStr;

/// Statistic measured for every object
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ObjectParameter {
    Mean,
    MeanSquare,
    StandardDeviation,
    LowPercentile,
    HighPercentile,
    PercentileA,
    PercentileB,
    PercentileC,
    /// High percentile minus low percentile
    PercentilesRange,
    /// Mean between the low and the high percentile
    TruncatedMean,
    Cardinality,
    /// Values of the first non-zero pixel
    FirstNonZero,
}

impl ObjectParameter {
    /// Every parameter, in output order
    pub const ALL: [ObjectParameter; 12] = [
        ObjectParameter::Mean,
        ObjectParameter::MeanSquare,
        ObjectParameter::StandardDeviation,
        ObjectParameter::LowPercentile,
        ObjectParameter::HighPercentile,
        ObjectParameter::PercentileA,
        ObjectParameter::PercentileB,
        ObjectParameter::PercentileC,
        ObjectParameter::PercentilesRange,
        ObjectParameter::TruncatedMean,
        ObjectParameter::Cardinality,
        ObjectParameter::FirstNonZero,
    ];

    /// Snake-case name of the parameter
    pub fn name(self) -> &'static str {
        match self {
            ObjectParameter::Mean => "mean",
            ObjectParameter::MeanSquare => "mean_square",
            ObjectParameter::StandardDeviation => "standard_deviation",
            ObjectParameter::LowPercentile => "low_percentile",
            ObjectParameter::HighPercentile => "high_percentile",
            ObjectParameter::PercentileA => "percentile_a",
            ObjectParameter::PercentileB => "percentile_b",
            ObjectParameter::PercentileC => "percentile_c",
            ObjectParameter::PercentilesRange => "percentiles_range",
            ObjectParameter::TruncatedMean => "truncated_mean",
            ObjectParameter::Cardinality => "cardinality",
            ObjectParameter::FirstNonZero => "first_non_zero",
        }
    }

    /// Check whether the parameter is read from the percentile finder
    pub fn is_percentile(self) -> bool {
        matches!(
            self,
            ObjectParameter::LowPercentile
                | ObjectParameter::HighPercentile
                | ObjectParameter::PercentileA
                | ObjectParameter::PercentileB
                | ObjectParameter::PercentileC
                | ObjectParameter::PercentilesRange
                | ObjectParameter::TruncatedMean
        )
    }
}

impl fmt::Display for ObjectParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ObjectParameter {
    type Err = MeasureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObjectParameter::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| MeasureError::InvalidParameters(format!("unknown object parameter {s:?}")))
    }
}

/// Options of [`crate::measure_labelled_objects`]
///
/// Percentile level lists hold one level per channel; the last level is
/// repeated for further channels.
#[derive(Debug, Clone)]
pub struct MeasureOptions {
    /// Report values without scaling
    pub raw_values: bool,
    /// Override of the maximal pixel value used for scaling
    pub max_possible_value: Option<f64>,
    /// Low percentile levels (default `[0.2]`)
    pub low_percentile: Vec<f64>,
    /// High percentile levels; empty means `1 - low`
    pub high_percentile: Vec<f64>,
    pub percentile_a: Vec<f64>,
    pub percentile_b: Vec<f64>,
    pub percentile_c: Vec<f64>,
    /// Rank every channel by its own values
    pub channel_percentiles: bool,
    /// Channels ranked by their own values even in common-levels mode
    pub separate_channel_percentiles: Vec<usize>,
    /// Channel of the level image ranking the pixels
    pub level_channel: usize,
    /// Tie resolution of common-levels mode
    pub tie_mode: CommonLevelsTieMode,
    /// Scheduling of the parallel passes
    pub scheduler: SchedulerOptions,
}

impl Default for MeasureOptions {
    fn default() -> Self {
        Self {
            raw_values: false,
            max_possible_value: None,
            low_percentile: vec![0.2],
            high_percentile: Vec::new(),
            percentile_a: Vec::new(),
            percentile_b: Vec::new(),
            percentile_c: Vec::new(),
            channel_percentiles: false,
            separate_channel_percentiles: Vec::new(),
            level_channel: 0,
            tie_mode: CommonLevelsTieMode::default(),
            scheduler: SchedulerOptions::default(),
        }
    }
}

impl MeasureOptions {
    /// Create new options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Report unscaled values
    pub fn with_raw_values(mut self, raw_values: bool) -> Self {
        self.raw_values = raw_values;
        self
    }

    /// Set the maximal pixel value used for scaling
    pub fn with_max_possible_value(mut self, value: f64) -> Self {
        self.max_possible_value = Some(value);
        self
    }

    /// Set the low percentile levels
    pub fn with_low_percentile(mut self, levels: Vec<f64>) -> Self {
        self.low_percentile = levels;
        self
    }

    /// Set the high percentile levels
    pub fn with_high_percentile(mut self, levels: Vec<f64>) -> Self {
        self.high_percentile = levels;
        self
    }

    /// Set the levels of percentile A
    pub fn with_percentile_a(mut self, levels: Vec<f64>) -> Self {
        self.percentile_a = levels;
        self
    }

    /// Set the levels of percentile B
    pub fn with_percentile_b(mut self, levels: Vec<f64>) -> Self {
        self.percentile_b = levels;
        self
    }

    /// Set the levels of percentile C
    pub fn with_percentile_c(mut self, levels: Vec<f64>) -> Self {
        self.percentile_c = levels;
        self
    }

    /// Rank every channel by its own values
    pub fn with_channel_percentiles(mut self, channel_percentiles: bool) -> Self {
        self.channel_percentiles = channel_percentiles;
        self
    }

    /// Set the channels ranked by their own values
    pub fn with_separate_channel_percentiles(mut self, channels: Vec<usize>) -> Self {
        self.separate_channel_percentiles = channels;
        self
    }

    /// Set the ranking channel of the level image
    pub fn with_level_channel(mut self, channel: usize) -> Self {
        self.level_channel = channel;
        self
    }

    /// Set the tie resolution of common-levels mode
    pub fn with_tie_mode(mut self, tie_mode: CommonLevelsTieMode) -> Self {
        self.tie_mode = tie_mode;
        self
    }

    /// Set the scheduling options
    pub fn with_scheduler(mut self, scheduler: SchedulerOptions) -> Self {
        self.scheduler = scheduler;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_names() {
        for parameter in ObjectParameter::ALL {
            assert_eq!(parameter.name().parse::<ObjectParameter>().unwrap(), parameter);
        }
        assert!("median".parse::<ObjectParameter>().is_err());
        assert_eq!(ObjectParameter::TruncatedMean.to_string(), "truncated_mean");
    }

    #[test]
    fn test_defaults() {
        let options = MeasureOptions::new().with_level_channel(2);
        assert_eq!(options.low_percentile, vec![0.2]);
        assert!(options.high_percentile.is_empty());
        assert_eq!(options.level_channel, 2);
        assert_eq!(options.tie_mode, CommonLevelsTieMode::AverageTies);
    }
}
