//! Choice between the separate and the ranked finder

use crate::common_levels::{CommonLevelsFinder, CommonLevelsTieMode};
use crate::error::{PercentileError, PercentileResult};
use crate::levels::{PercentileLevels, TruncatedMeanBounds};
use crate::result::ChannelPercentiles;
use crate::separate::SeparateChannelsFinder;
use labelstat_core::{Element, SchedulerOptions};
use labelstat_labels::LabelLists;

/// Percentile finder of either flavour
#[derive(Debug, Clone)]
pub enum PercentilesFinder {
    /// Every channel selected independently
    Separate(SeparateChannelsFinder),
    /// Channels read at percentiles of a ranking channel
    CommonLevels(CommonLevelsFinder),
}

impl PercentilesFinder {
    /// Finder measuring every channel on its own
    pub fn separate(
        levels_by_channels: Vec<PercentileLevels>,
        bounds: Option<TruncatedMeanBounds>,
    ) -> PercentileResult<Self> {
        SeparateChannelsFinder::new(levels_by_channels, bounds).map(Self::Separate)
    }

    /// Finder ranking the pixels by an extra channel
    ///
    /// Falls back to [`Self::Separate`] when every channel is listed in
    /// `separate_channels`.
    pub fn by_ranking_channel(
        levels_by_channels: Vec<PercentileLevels>,
        bounds: Option<TruncatedMeanBounds>,
        separate_channels: &[usize],
        tie_mode: CommonLevelsTieMode,
    ) -> PercentileResult<Self> {
        let finder = CommonLevelsFinder::new(
            levels_by_channels.clone(),
            bounds,
            separate_channels,
            tie_mode,
        )?;
        if finder.all_channels_separate() {
            log::debug!("all channels separate, ranking channel unused");
            return Self::separate(levels_by_channels, bounds);
        }
        Ok(Self::CommonLevels(finder))
    }

    /// Number of result channels
    pub fn number_of_channels(&self) -> usize {
        match self {
            Self::Separate(finder) => finder.number_of_channels(),
            Self::CommonLevels(finder) => finder.number_of_channels(),
        }
    }

    /// Check whether [`Self::find`] needs a ranking channel
    pub fn needs_ranking(&self) -> bool {
        matches!(self, Self::CommonLevels(_))
    }

    /// Find the percentiles of every object
    ///
    /// # Errors
    ///
    /// Returns [`PercentileError::InvalidParameters`] if a ranking channel
    /// is required but missing, or errors from object streaming.
    pub fn find<T: Element>(
        &self,
        lists: &LabelLists,
        channels: &[&[T]],
        ranking: Option<&[T]>,
        options: &SchedulerOptions,
    ) -> PercentileResult<ChannelPercentiles> {
        match self {
            Self::Separate(finder) => finder.find(lists, channels, options),
            Self::CommonLevels(finder) => {
                let ranking = ranking.ok_or_else(|| {
                    PercentileError::InvalidParameters("ranking channel required".into())
                })?;
                finder.find(lists, channels, ranking, options)
            }
        }
    }
}

/// Find the same percentile levels in every channel
///
/// # Arguments
///
/// * `lists` - Pixel lists of the label image
/// * `channels` - Value channels
/// * `levels` - Levels in `[0, 1]`, applied to all channels
/// * `options` - Scheduling options
pub fn find_percentiles<T: Element>(
    lists: &LabelLists,
    channels: &[&[T]],
    levels: &[f64],
    options: &SchedulerOptions,
) -> PercentileResult<ChannelPercentiles> {
    let levels = PercentileLevels::new(levels)?;
    PercentilesFinder::separate(vec![levels; channels.len()], None)?.find(
        lists, channels, None, options,
    )
}
