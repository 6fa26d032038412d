//! Request-level measuring of labelled objects
//!
//! Turns a set of requested [`ObjectParameter`]s into the passes of a
//! [`LabelsAnalyser`]: one sums pass for means and deviations, one list
//! build plus one percentile pass for every percentile-based parameter, and
//! extra passes for first non-zero pixels and, when nothing else produced
//! them, cardinalities.

use crate::analyser::LabelsAnalyser;
use crate::error::{MeasureError, MeasureResult};
use crate::options::{MeasureOptions, ObjectParameter};
use crate::values::ObjectValues;
use labelstat_core::{ChannelSlice, Channels, Error, LabelImage};
use labelstat_percentile::TruncatedMeanBounds;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

/// Measured statistics of every object
#[derive(Debug, Clone, PartialEq)]
pub struct LabelledObjectsMeasurements {
    /// Highest label; arrays hold `max_label` objects
    pub max_label: usize,
    /// Number of image channels
    pub number_of_channels: usize,
    /// Values per requested parameter
    pub values: BTreeMap<ObjectParameter, ObjectValues>,
}

impl LabelledObjectsMeasurements {
    /// Values of `parameter`, if requested
    pub fn get(&self, parameter: ObjectParameter) -> Option<&ObjectValues> {
        self.values.get(&parameter)
    }

    /// Float values of `parameter`
    pub fn floats(&self, parameter: ObjectParameter) -> Option<&[f32]> {
        self.get(parameter).and_then(ObjectValues::as_float)
    }

    /// Integer values of `parameter`
    pub fn ints(&self, parameter: ObjectParameter) -> Option<&[i32]> {
        self.get(parameter).and_then(ObjectValues::as_int)
    }

    /// Number of values per object for `parameter`
    pub fn values_per_object(&self, parameter: ObjectParameter) -> usize {
        match parameter {
            ObjectParameter::Cardinality => 1,
            _ => self.number_of_channels,
        }
    }
}

/// Percentile levels per channel and the level index of each parameter
#[derive(Debug, Default)]
struct PercentilePlan {
    levels_by_channels: Vec<Vec<f64>>,
    level_indexes: BTreeMap<ObjectParameter, usize>,
}

fn level_for(channel: usize, levels: &[f64], name: &str) -> MeasureResult<f64> {
    match levels.get(channel).or(levels.last()) {
        Some(&level) => Ok(level),
        None => Err(MeasureError::InvalidParameters(format!(
            "at least one {name} must be specified"
        ))),
    }
}

impl PercentilePlan {
    fn new(
        requested: &BTreeSet<ObjectParameter>,
        number_of_channels: usize,
        options: &MeasureOptions,
    ) -> MeasureResult<Self> {
        let bounds_needed = requested.contains(&ObjectParameter::PercentilesRange)
            || requested.contains(&ObjectParameter::TruncatedMean);
        let mut plan = PercentilePlan::default();
        for c in 0..number_of_channels {
            let mut levels = Vec::new();
            if bounds_needed || requested.contains(&ObjectParameter::LowPercentile) {
                plan.level_indexes.insert(ObjectParameter::LowPercentile, levels.len());
                levels.push(level_for(c, &options.low_percentile, "low percentile")?);
            }
            if bounds_needed || requested.contains(&ObjectParameter::HighPercentile) {
                plan.level_indexes.insert(ObjectParameter::HighPercentile, levels.len());
                levels.push(if options.high_percentile.is_empty() {
                    1.0 - level_for(0, &options.low_percentile, "low percentile")?
                } else {
                    level_for(c, &options.high_percentile, "high percentile")?
                });
            }
            for (parameter, source, name) in [
                (ObjectParameter::PercentileA, &options.percentile_a, "percentile A"),
                (ObjectParameter::PercentileB, &options.percentile_b, "percentile B"),
                (ObjectParameter::PercentileC, &options.percentile_c, "percentile C"),
            ] {
                if requested.contains(&parameter) {
                    plan.level_indexes.insert(parameter, levels.len());
                    levels.push(level_for(c, source, name)?);
                }
            }
            plan.levels_by_channels.push(levels);
        }
        Ok(plan)
    }

    fn is_needed(&self) -> bool {
        self.levels_by_channels.first().is_some_and(|levels| !levels.is_empty())
    }

    fn index(&self, parameter: ObjectParameter) -> MeasureResult<usize> {
        self.level_indexes.get(&parameter).copied().ok_or_else(|| {
            MeasureError::InvalidParameters(format!("no percentile level for {parameter}"))
        })
    }
}

fn apply_mask<'a>(labels: LabelImage<'a>, mask: ChannelSlice<'_>) -> MeasureResult<LabelImage<'a>> {
    Ok(match mask {
        ChannelSlice::U8(m) => labels.with_mask(m)?,
        ChannelSlice::U16(m) => labels.with_mask(m)?,
        ChannelSlice::I32(m) => labels.with_mask(m)?,
        ChannelSlice::F32(m) => labels.with_mask(m)?,
        ChannelSlice::F64(m) => labels.with_mask(m)?,
    })
}

/// Measure the requested statistics of every labelled object
///
/// # Arguments
///
/// * `labels` - Label image, `0` for background
/// * `mask` - Optional mask; labels where it is zero are ignored
/// * `image` - Value channels aligned with the labels
/// * `level` - Optional image whose `level_channel` ranks the pixels in
///   common-levels mode; the image itself ranks them when absent
/// * `parameters` - Statistics to measure
/// * `options` - Percentile levels, scaling and scheduling
///
/// Percentiles use common-levels mode unless `channel_percentiles` is set
/// or a single-channel image is measured without level image.
///
/// # Errors
///
/// Returns an error for misaligned inputs, missing or invalid percentile
/// levels, and labels too large to be real labels.
///
/// # Examples
///
/// ```
/// use labelstat_core::{Channels, LabelImage};
/// use labelstat_measure::{MeasureOptions, ObjectParameter, measure_labelled_objects};
///
/// let labels = [0, 1, 1, 2, 2, 2];
/// let values = [0u8, 10, 20, 5, 15, 25];
/// let result = measure_labelled_objects(
///     &LabelImage::from_slice(&labels),
///     None,
///     &Channels::single(&values[..]),
///     None,
///     &[ObjectParameter::Cardinality, ObjectParameter::Mean],
///     &MeasureOptions::new().with_raw_values(true),
/// )
/// .unwrap();
/// assert_eq!(result.ints(ObjectParameter::Cardinality), Some(&[2, 3][..]));
/// assert_eq!(result.floats(ObjectParameter::Mean), Some(&[15.0, 15.0][..]));
/// ```
pub fn measure_labelled_objects<'a>(
    labels: &LabelImage<'a>,
    mask: Option<ChannelSlice<'_>>,
    image: &Channels<'a>,
    level: Option<&Channels<'a>>,
    parameters: &[ObjectParameter],
    options: &MeasureOptions,
) -> MeasureResult<LabelledObjectsMeasurements> {
    let start = Instant::now();
    let requested: BTreeSet<ObjectParameter> = parameters.iter().copied().collect();
    let number_of_channels = image.number_of_channels();
    image.validate(labels.len())?;
    if let Some(level) = level {
        level.validate(labels.len())?;
    }
    let plan = PercentilePlan::new(&requested, number_of_channels, options)?;

    let labels = match mask {
        Some(mask) => apply_mask(labels.clone(), mask)?,
        None => labels.clone(),
    };
    let mut analyser = LabelsAnalyser::new(labels).with_scheduler(options.scheduler.clone());
    let channel_percentiles =
        options.channel_percentiles || (level.is_none() && number_of_channels == 1);
    if plan.is_needed() && !channel_percentiles {
        let level_image = level.unwrap_or(image);
        let ranking_channel = options
            .level_channel
            .min(level_image.number_of_channels().saturating_sub(1));
        let ranking = level_image
            .channel(ranking_channel)
            .ok_or(Error::EmptyChannels)?;
        analyser.set_image_and_ranking(image.clone(), ranking, options.raw_values)?;
        let separate: Vec<usize> = options
            .separate_channel_percentiles
            .iter()
            .copied()
            .filter(|&c| c < number_of_channels)
            .collect();
        analyser.set_separate_channels(&separate);
    } else {
        analyser.set_image(image.clone(), options.raw_values)?;
    }
    if let Some(value) = options.max_possible_value {
        analyser.set_max_possible_value(value)?;
    }

    if requested.contains(&ObjectParameter::StandardDeviation)
        || requested.contains(&ObjectParameter::MeanSquare)
    {
        analyser.find_means_and_standard_deviations()?;
    } else if requested.contains(&ObjectParameter::Mean) {
        analyser.find_means()?;
    }
    if plan.is_needed() {
        let bounds = requested.contains(&ObjectParameter::TruncatedMean).then(|| {
            let high = plan.levels_by_channels[0].len().saturating_sub(1).min(1);
            TruncatedMeanBounds::new(0, high)
        });
        analyser
            .set_percentile_levels(plan.levels_by_channels.clone())
            .set_truncated_mean_bounds(bounds)
            .set_tie_mode(options.tie_mode);
        analyser.prepare_lists()?;
        analyser.find_percentiles()?;
    }
    if requested.contains(&ObjectParameter::FirstNonZero) {
        analyser.find_first_non_zero()?;
    }
    if !analyser.has_cardinalities() && requested.contains(&ObjectParameter::Cardinality) {
        analyser.find_cardinalities()?;
    }

    let mut values = BTreeMap::new();
    for &parameter in &requested {
        let result = match parameter {
            ObjectParameter::Cardinality => ObjectValues::Int(analyser.cardinalities()?.to_vec()),
            ObjectParameter::Mean => ObjectValues::Float(analyser.means()?),
            ObjectParameter::MeanSquare => ObjectValues::Float(analyser.mean_squares()?),
            ObjectParameter::StandardDeviation => {
                ObjectValues::Float(analyser.standard_deviations()?)
            }
            ObjectParameter::LowPercentile
            | ObjectParameter::HighPercentile
            | ObjectParameter::PercentileA
            | ObjectParameter::PercentileB
            | ObjectParameter::PercentileC => {
                ObjectValues::Float(analyser.grouped_percentiles_by_level(plan.index(parameter)?)?)
            }
            ObjectParameter::PercentilesRange => ObjectValues::Float(analyser.percentiles_range(
                plan.index(ObjectParameter::LowPercentile)?,
                plan.index(ObjectParameter::HighPercentile)?,
            )?),
            ObjectParameter::TruncatedMean => ObjectValues::Float(analyser.truncated_means()?),
            ObjectParameter::FirstNonZero => analyser.first_non_zero_values()?.clone(),
        };
        values.insert(parameter, result);
    }

    log::debug!(
        "{} labelled objects, {} channels of {}: {:?} measured in {:.3} ms, levels {:?}",
        analyser.max_label(),
        number_of_channels,
        image.element_type().name(),
        requested,
        start.elapsed().as_secs_f64() * 1e3,
        plan.levels_by_channels.first()
    );
    Ok(LabelledObjectsMeasurements {
        max_label: analyser.max_label(),
        number_of_channels,
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use labelstat_percentile::CommonLevelsTieMode;

    const LABELS: [i32; 6] = [0, 1, 1, 2, 2, 2];
    const BYTES: [u8; 6] = [0, 10, 20, 5, 15, 25];

    fn measure(parameters: &[ObjectParameter], options: &MeasureOptions) -> LabelledObjectsMeasurements {
        measure_labelled_objects(
            &LabelImage::from_slice(&LABELS),
            None,
            &Channels::single(&BYTES[..]),
            None,
            parameters,
            options,
        )
        .unwrap()
    }

    #[test]
    fn test_plan_level_order() {
        let requested: BTreeSet<_> = [ObjectParameter::PercentileB, ObjectParameter::TruncatedMean]
            .into_iter()
            .collect();
        let options = MeasureOptions::new()
            .with_low_percentile(vec![0.1, 0.3])
            .with_percentile_b(vec![0.5]);
        let plan = PercentilePlan::new(&requested, 3, &options).unwrap();
        assert_eq!(plan.levels_by_channels[0], vec![0.1, 0.9, 0.5]);
        assert_eq!(plan.levels_by_channels[2], vec![0.3, 0.9, 0.5]);
        assert_eq!(plan.index(ObjectParameter::PercentileB).unwrap(), 2);
        assert!(plan.index(ObjectParameter::PercentileA).is_err());
    }

    #[test]
    fn test_missing_levels_rejected() {
        let requested: BTreeSet<_> = [ObjectParameter::PercentileA].into_iter().collect();
        assert!(PercentilePlan::new(&requested, 1, &MeasureOptions::new()).is_err());
    }

    #[test]
    fn test_truncated_mean_scenario() {
        let options = MeasureOptions::new()
            .with_raw_values(true)
            .with_low_percentile(vec![0.0])
            .with_high_percentile(vec![1.0]);
        let result = measure(
            &[ObjectParameter::TruncatedMean, ObjectParameter::Mean, ObjectParameter::PercentilesRange],
            &options,
        );
        assert_eq!(result.floats(ObjectParameter::TruncatedMean), Some(&[15.0, 15.0][..]));
        assert_eq!(result.floats(ObjectParameter::Mean), Some(&[15.0, 15.0][..]));
        assert_eq!(result.floats(ObjectParameter::PercentilesRange), Some(&[10.0, 20.0][..]));
    }

    #[test]
    fn test_scaled_median_and_cardinalities() {
        let options = MeasureOptions::new().with_percentile_a(vec![0.5]);
        let result = measure(&[ObjectParameter::PercentileA, ObjectParameter::Cardinality], &options);
        assert_eq!(result.max_label, 2);
        assert_eq!(result.ints(ObjectParameter::Cardinality), Some(&[2, 3][..]));
        let median = result.floats(ObjectParameter::PercentileA).unwrap();
        assert!((median[1] - 15.0 / 255.0).abs() < 1e-7);
    }

    #[test]
    fn test_mask_and_first_non_zero() {
        let mask = [1u8, 1, 0, 1, 1, 1];
        let result = measure_labelled_objects(
            &LabelImage::from_slice(&LABELS),
            Some(ChannelSlice::U8(&mask)),
            &Channels::single(&BYTES[..]),
            None,
            &[ObjectParameter::Cardinality, ObjectParameter::FirstNonZero],
            &MeasureOptions::new().with_raw_values(true),
        )
        .unwrap();
        assert_eq!(result.ints(ObjectParameter::Cardinality), Some(&[1, 3][..]));
        assert_eq!(result.ints(ObjectParameter::FirstNonZero), Some(&[10, 5][..]));
    }

    #[test]
    fn test_level_image_ranks_colour_channels() {
        let red = [0u8, 10, 20, 30, 40, 50];
        let green = [0u8, 1, 2, 3, 4, 5];
        let brightness = [0u8, 9, 1, 5, 7, 6];
        let image = Channels::new(vec![&red[..], &green[..]]).unwrap();
        let level = Channels::single(&brightness[..]);
        let options = MeasureOptions::new()
            .with_raw_values(true)
            .with_percentile_a(vec![1.0])
            .with_tie_mode(CommonLevelsTieMode::SinglePixel);
        let result = measure_labelled_objects(
            &LabelImage::from_slice(&LABELS),
            None,
            &image,
            Some(&level),
            &[ObjectParameter::PercentileA],
            &options,
        )
        .unwrap();
        assert_eq!(result.values_per_object(ObjectParameter::PercentileA), 2);
        assert_eq!(
            result.floats(ObjectParameter::PercentileA),
            Some(&[10.0, 1.0, 40.0, 4.0][..])
        );
    }
}
