//! Stateful analysis of one label image
//!
//! [`LabelsAnalyser`] owns a label image and, once an image is attached,
//! runs the reducers and the per-object finders on demand. Every `find_*`
//! call refreshes the maximal label and the cardinalities; the other
//! results stay available until the image is replaced.
//!
//! Aggregated outputs are scaled by `1 / max_possible_value` of the image
//! element type unless raw values are requested. The scale is applied after
//! accumulation, never to the pixel values themselves.

use crate::error::{MeasureError, MeasureResult};
use crate::values::ObjectValues;
use labelstat_core::{
    ChannelSlice, Channels, Element, ElementType, Error, LabelImage, SchedulerOptions,
    dispatch_channels,
};
use labelstat_labels::{LabelLists, LabelSums, build_label_lists, find_first_non_zero, find_sums};
use labelstat_percentile::{
    ChannelPercentiles, CommonLevelsTieMode, PercentileLevels, PercentilesFinder,
    TruncatedMeanBounds,
};
use std::time::Instant;

/// Channels analysed, borrowed or converted to `f32`
#[derive(Debug, Clone)]
enum ImageValues<'a> {
    Native {
        channels: Channels<'a>,
        ranking: Option<ChannelSlice<'a>>,
    },
    Floats {
        channels: Vec<Vec<f32>>,
        ranking: Option<Vec<f32>>,
    },
}

impl ImageValues<'_> {
    fn views(&self) -> (Channels<'_>, Option<ChannelSlice<'_>>) {
        match self {
            ImageValues::Native { channels, ranking } => (channels.clone(), *ranking),
            ImageValues::Floats { channels, ranking } => (
                Channels::F32(channels.iter().map(Vec::as_slice).collect()),
                ranking.as_deref().map(ChannelSlice::F32),
            ),
        }
    }

    fn has_ranking(&self) -> bool {
        match self {
            ImageValues::Native { ranking, .. } => ranking.is_some(),
            ImageValues::Floats { ranking, .. } => ranking.is_some(),
        }
    }
}

#[derive(Debug, Clone)]
struct AnalysedImage<'a> {
    values: ImageValues<'a>,
    element_type: ElementType,
    number_of_channels: usize,
    raw_values: bool,
    scale: f64,
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1e3
}

fn find_percentiles_typed<T: Element>(
    finder: &PercentilesFinder,
    lists: &LabelLists,
    channels: &[&[T]],
    ranking: Option<ChannelSlice<'_>>,
    options: &SchedulerOptions,
) -> MeasureResult<ChannelPercentiles> {
    let ranking = match ranking {
        Some(slice) => Some(T::from_channel_slice(slice).ok_or(Error::MixedElementTypes(
            T::TYPE.name(),
            slice.element_type().name(),
        ))?),
        None => None,
    };
    Ok(finder.find(lists, channels, ranking, options)?)
}

fn find_first_non_zero_typed<T: Element>(
    labels: &[i32],
    channels: &[&[T]],
    raw_values: bool,
    scale: f64,
    options: &SchedulerOptions,
) -> MeasureResult<(Vec<i32>, Vec<i32>, ObjectValues)> {
    let found = find_first_non_zero(labels, channels, options)?;
    let values = if raw_values && T::TYPE.is_integer() {
        ObjectValues::Int(found.int_values(channels))
    } else {
        ObjectValues::Float(found.float_values(channels, scale))
    };
    Ok((found.cardinalities, found.indexes, values))
}

/// Statistics of the objects of one label image
///
/// # Examples
///
/// ```
/// use labelstat_core::{Channels, LabelImage};
/// use labelstat_measure::LabelsAnalyser;
///
/// let labels = [0, 1, 1, 2, 2, 2];
/// let values = [0u8, 10, 20, 5, 15, 25];
/// let mut analyser = LabelsAnalyser::new(LabelImage::from_slice(&labels));
/// analyser.set_image(Channels::single(&values[..]), true).unwrap();
/// analyser.find_means().unwrap();
/// assert_eq!(analyser.means().unwrap(), vec![15.0, 15.0]);
/// ```
#[derive(Debug, Clone)]
pub struct LabelsAnalyser<'a> {
    labels: LabelImage<'a>,
    image: Option<AnalysedImage<'a>>,
    scheduler: SchedulerOptions,
    levels_by_channels: Vec<Vec<f64>>,
    truncated_mean_bounds: Option<TruncatedMeanBounds>,
    separate_channels: Vec<usize>,
    tie_mode: CommonLevelsTieMode,
    max_label: usize,
    cardinalities: Option<Vec<i32>>,
    sums: Option<LabelSums>,
    lists: Option<LabelLists>,
    percentiles: Option<ChannelPercentiles>,
    first_non_zero_indexes: Option<Vec<i32>>,
    first_non_zero_values: Option<ObjectValues>,
}

impl<'a> LabelsAnalyser<'a> {
    /// Create an analyser of `labels`
    pub fn new(labels: LabelImage<'a>) -> Self {
        Self {
            labels,
            image: None,
            scheduler: SchedulerOptions::default(),
            levels_by_channels: Vec::new(),
            truncated_mean_bounds: None,
            separate_channels: Vec::new(),
            tie_mode: CommonLevelsTieMode::default(),
            max_label: 0,
            cardinalities: None,
            sums: None,
            lists: None,
            percentiles: None,
            first_non_zero_indexes: None,
            first_non_zero_values: None,
        }
    }

    /// Set the scheduling options of every pass
    pub fn with_scheduler(mut self, options: SchedulerOptions) -> Self {
        self.scheduler = options;
        self
    }

    /// The analysed label image
    pub fn labels(&self) -> &LabelImage<'a> {
        &self.labels
    }

    /// Attach the image whose values are measured
    ///
    /// # Arguments
    ///
    /// * `image` - Value channels aligned with the labels
    /// * `raw_values` - Report values unscaled
    ///
    /// # Errors
    ///
    /// Returns an error if the channels do not cover the label image.
    pub fn set_image(&mut self, image: Channels<'a>, raw_values: bool) -> MeasureResult<&mut Self> {
        image.validate(self.labels.len())?;
        self.attach(
            image.element_type(),
            image.number_of_channels(),
            raw_values,
            ImageValues::Native {
                channels: image,
                ranking: None,
            },
        );
        Ok(self)
    }

    /// Attach the image together with a channel ranking its pixels
    ///
    /// Percentiles are then found in common-levels mode. When the ranking
    /// channel has another element type than the image, all channels are
    /// converted to `f32`; the scale still follows the image element type.
    ///
    /// # Errors
    ///
    /// Returns an error if the channels or the ranking channel do not cover
    /// the label image.
    pub fn set_image_and_ranking(
        &mut self,
        image: Channels<'a>,
        ranking: ChannelSlice<'a>,
        raw_values: bool,
    ) -> MeasureResult<&mut Self> {
        image.validate(self.labels.len())?;
        if ranking.len() != self.labels.len() {
            return Err(Error::LengthMismatch {
                what: "ranking channel",
                expected: self.labels.len(),
                actual: ranking.len(),
            }
            .into());
        }
        let element_type = image.element_type();
        let number_of_channels = image.number_of_channels();
        let values = if ranking.element_type() == element_type {
            ImageValues::Native {
                channels: image,
                ranking: Some(ranking),
            }
        } else {
            log::debug!(
                "ranking channel is {}, image is {}: converting to f32",
                ranking.element_type().name(),
                element_type.name()
            );
            ImageValues::Floats {
                channels: image.to_f32_vecs(),
                ranking: Some(ranking.to_f32_vec()),
            }
        };
        self.attach(element_type, number_of_channels, raw_values, values);
        Ok(self)
    }

    fn attach(
        &mut self,
        element_type: ElementType,
        number_of_channels: usize,
        raw_values: bool,
        values: ImageValues<'a>,
    ) {
        let scale = if raw_values {
            1.0
        } else {
            1.0 / element_type.max_possible_value()
        };
        self.image = Some(AnalysedImage {
            values,
            element_type,
            number_of_channels,
            raw_values,
            scale,
        });
        self.sums = None;
        self.percentiles = None;
        self.first_non_zero_indexes = None;
        self.first_non_zero_values = None;
    }

    /// Replace the maximal possible pixel value used for scaling
    ///
    /// Has no effect on raw values.
    ///
    /// # Errors
    ///
    /// Returns an error if no image is attached or the value is not
    /// positive.
    pub fn set_max_possible_value(&mut self, value: f64) -> MeasureResult<&mut Self> {
        if !(value > 0.0 && value.is_finite()) {
            return Err(MeasureError::InvalidParameters(format!(
                "max possible value must be positive, got {value}"
            )));
        }
        let image = self.image.as_mut().ok_or(Error::NotReady("image is not set"))?;
        if !image.raw_values {
            image.scale = 1.0 / value;
        }
        Ok(self)
    }

    /// Mark channels that keep their own percentile levels in
    /// common-levels mode
    pub fn set_separate_channels(&mut self, channels: &[usize]) -> &mut Self {
        self.separate_channels = channels.to_vec();
        self
    }

    /// Set the percentile levels, one list per image channel
    pub fn set_percentile_levels(&mut self, levels_by_channels: Vec<Vec<f64>>) -> &mut Self {
        self.levels_by_channels = levels_by_channels;
        self
    }

    /// Request truncated means between two level indexes
    pub fn set_truncated_mean_bounds(&mut self, bounds: Option<TruncatedMeanBounds>) -> &mut Self {
        self.truncated_mean_bounds = bounds;
        self
    }

    /// Set how ties of the ranking channel are resolved
    pub fn set_tie_mode(&mut self, tie_mode: CommonLevelsTieMode) -> &mut Self {
        self.tie_mode = tie_mode;
        self
    }

    fn image(&self) -> MeasureResult<&AnalysedImage<'a>> {
        Ok(self.image.as_ref().ok_or(Error::NotReady("image is not set"))?)
    }

    fn update_cardinalities(&mut self, cardinalities: Vec<i32>) {
        self.max_label = cardinalities.len();
        if self.max_label == 0 {
            log::warn!(
                "label image of {} pixels has no labelled objects",
                self.labels.len()
            );
        }
        self.cardinalities = Some(cardinalities);
    }

    /// Count the pixels of every object
    pub fn find_cardinalities(&mut self) -> MeasureResult<()> {
        let start = Instant::now();
        let cardinalities = labelstat_labels::find_cardinalities(self.labels.labels(), &self.scheduler)?;
        self.update_cardinalities(cardinalities);
        log::debug!(
            "cardinalities of {} objects found in {:.3} ms",
            self.max_label,
            elapsed_ms(start)
        );
        Ok(())
    }

    /// Sum the channels of every object, for means
    pub fn find_means(&mut self) -> MeasureResult<()> {
        self.find_sums(false)
    }

    /// Sum the channels and their squares, for means and standard deviations
    pub fn find_means_and_standard_deviations(&mut self) -> MeasureResult<()> {
        self.find_sums(true)
    }

    fn find_sums(&mut self, need_squares: bool) -> MeasureResult<()> {
        let start = Instant::now();
        let (mut sums, scale) = {
            let image = self.image()?;
            let (channels, _) = image.values.views();
            let labels = self.labels.labels();
            let sums = dispatch_channels!(&channels, ch => {
                find_sums(labels, ch, need_squares, &self.scheduler)
            })?;
            (sums, image.scale)
        };
        sums.sums.iter_mut().for_each(|s| *s *= scale);
        if let Some(squares) = sums.sums_of_squares.as_mut() {
            squares.iter_mut().for_each(|s| *s *= scale * scale);
        }
        self.update_cardinalities(sums.cardinalities.clone());
        self.sums = Some(sums);
        log::debug!(
            "sums{} of {} objects found in {:.3} ms",
            if need_squares { " and squares" } else { "" },
            self.max_label,
            elapsed_ms(start)
        );
        Ok(())
    }

    /// Build the pixel lists needed by [`Self::find_percentiles`]
    pub fn prepare_lists(&mut self) -> MeasureResult<()> {
        let start = Instant::now();
        let lists = build_label_lists(self.labels.labels(), &self.scheduler)?;
        self.max_label = lists.max_label();
        self.lists = Some(lists);
        log::debug!(
            "pixel lists of {} objects built in {:.3} ms",
            self.max_label,
            elapsed_ms(start)
        );
        Ok(())
    }

    /// Find the percentiles, and truncated means if requested, of every
    /// object
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotReady`] if no image is attached or the lists were
    /// not prepared, and an error if the levels are invalid or their number
    /// differs from the number of channels.
    pub fn find_percentiles(&mut self) -> MeasureResult<()> {
        let start = Instant::now();
        let percentiles = self.run_percentiles_finder()?;
        self.update_cardinalities(percentiles.cardinalities.clone());
        self.percentiles = Some(percentiles);
        log::debug!(
            "percentiles of {} objects found in {:.3} ms",
            self.max_label,
            elapsed_ms(start)
        );
        Ok(())
    }

    fn run_percentiles_finder(&self) -> MeasureResult<ChannelPercentiles> {
        let image = self.image()?;
        let lists = self
            .lists
            .as_ref()
            .ok_or(Error::NotReady("pixel lists are not built"))?;
        if self.levels_by_channels.len() != image.number_of_channels {
            return Err(MeasureError::InvalidParameters(format!(
                "{} percentile level lists for {} channels",
                self.levels_by_channels.len(),
                image.number_of_channels
            )));
        }
        let levels = self
            .levels_by_channels
            .iter()
            .map(|levels| PercentileLevels::new(levels))
            .collect::<Result<Vec<_>, _>>()?;
        let finder = if image.values.has_ranking() {
            PercentilesFinder::by_ranking_channel(
                levels,
                self.truncated_mean_bounds,
                &self.separate_channels,
                self.tie_mode,
            )?
        } else {
            PercentilesFinder::separate(levels, self.truncated_mean_bounds)?
        };
        let (channels, ranking) = image.values.views();
        dispatch_channels!(&channels, ch => {
            find_percentiles_typed(&finder, lists, ch, ranking, &self.scheduler)
        })
    }

    /// Find the first non-zero pixel of every object
    pub fn find_first_non_zero(&mut self) -> MeasureResult<()> {
        let start = Instant::now();
        let (cardinalities, indexes, values) = {
            let image = self.image()?;
            let (channels, _) = image.values.views();
            let labels = self.labels.labels();
            dispatch_channels!(&channels, ch => {
                find_first_non_zero_typed(labels, ch, image.raw_values, image.scale, &self.scheduler)
            })?
        };
        self.update_cardinalities(cardinalities);
        self.first_non_zero_indexes = Some(indexes);
        self.first_non_zero_values = Some(values);
        log::debug!(
            "first non-zero pixels of {} objects found in {:.3} ms",
            self.max_label,
            elapsed_ms(start)
        );
        Ok(())
    }

    /// Highest label seen by the last `find_*` or [`Self::prepare_lists`]
    pub fn max_label(&self) -> usize {
        self.max_label
    }

    /// Number of image channels, 0 without image
    pub fn number_of_channels(&self) -> usize {
        self.image.as_ref().map_or(0, |image| image.number_of_channels)
    }

    /// Element type of the attached image
    pub fn element_type(&self) -> Option<ElementType> {
        self.image.as_ref().map(|image| image.element_type)
    }

    /// Scale applied to aggregated outputs
    pub fn scale(&self) -> Option<f64> {
        self.image.as_ref().map(|image| image.scale)
    }

    /// Check whether cardinalities are available
    pub fn has_cardinalities(&self) -> bool {
        self.cardinalities.is_some()
    }

    /// Pixel count per object, index `label - 1`
    pub fn cardinalities(&self) -> MeasureResult<&[i32]> {
        Ok(self
            .cardinalities
            .as_deref()
            .ok_or(Error::NotReady("cardinalities are not found"))?)
    }

    fn label_sums(&self) -> MeasureResult<&LabelSums> {
        Ok(self.sums.as_ref().ok_or(Error::NotReady("sums are not found"))?)
    }

    /// Scaled sums, interleaved by channel
    pub fn sums(&self) -> MeasureResult<&[f64]> {
        Ok(&self.label_sums()?.sums)
    }

    /// Scaled sums of squares, interleaved by channel
    pub fn sums_of_squares(&self) -> MeasureResult<&[f64]> {
        Ok(self
            .label_sums()?
            .sums_of_squares
            .as_deref()
            .ok_or(Error::NotReady("sums of squares are not found"))?)
    }

    /// Scaled means, interleaved by channel
    pub fn means(&self) -> MeasureResult<Vec<f32>> {
        Ok(self.label_sums()?.means(1.0))
    }

    /// Scaled mean squares, interleaved by channel
    pub fn mean_squares(&self) -> MeasureResult<Vec<f32>> {
        Ok(self
            .label_sums()?
            .mean_squares(1.0)
            .ok_or(Error::NotReady("sums of squares are not found"))?)
    }

    /// Scaled standard deviations, interleaved by channel
    pub fn standard_deviations(&self) -> MeasureResult<Vec<f32>> {
        Ok(self
            .label_sums()?
            .standard_deviations(1.0)
            .ok_or(Error::NotReady("sums of squares are not found"))?)
    }

    /// Pixel lists built by [`Self::prepare_lists`]
    pub fn lists(&self) -> MeasureResult<&LabelLists> {
        Ok(self
            .lists
            .as_ref()
            .ok_or(Error::NotReady("pixel lists are not built"))?)
    }

    fn channel_percentiles(&self) -> MeasureResult<&ChannelPercentiles> {
        Ok(self
            .percentiles
            .as_ref()
            .ok_or(Error::NotReady("percentiles are not found"))?)
    }

    /// Unscaled percentiles, `[channel][level][label - 1]`
    pub fn percentiles_by_channels(&self) -> MeasureResult<&[Vec<Vec<f32>>]> {
        Ok(&self.channel_percentiles()?.percentiles_by_channels)
    }

    fn check_level_index(&self, level: usize) -> MeasureResult<()> {
        let max_levels = self.levels_by_channels.iter().map(Vec::len).max().unwrap_or(0);
        if level >= max_levels {
            return Err(MeasureError::InvalidParameters(format!(
                "percentile level index {level} out of range 0..{max_levels}"
            )));
        }
        Ok(())
    }

    /// Scaled percentiles of level index `level`, interleaved by channel
    pub fn grouped_percentiles_by_level(&self, level: usize) -> MeasureResult<Vec<f32>> {
        let percentiles = self.channel_percentiles()?;
        self.check_level_index(level)?;
        Ok(percentiles.grouped_by_level(level, self.image()?.scale))
    }

    /// Scaled difference of the percentiles at two level indexes
    pub fn percentiles_range(&self, low: usize, high: usize) -> MeasureResult<Vec<f32>> {
        let percentiles = self.channel_percentiles()?;
        self.check_level_index(low)?;
        self.check_level_index(high)?;
        Ok(percentiles.range(low, high, self.image()?.scale))
    }

    /// Scaled truncated means, interleaved by channel
    pub fn truncated_means(&self) -> MeasureResult<Vec<f32>> {
        Ok(self
            .channel_percentiles()?
            .truncated_means(self.image()?.scale)
            .ok_or(Error::NotReady("truncated means were not requested"))?)
    }

    /// Index of the first non-zero pixel per object, `-1` if none
    pub fn first_non_zero_indexes(&self) -> MeasureResult<&[i32]> {
        Ok(self
            .first_non_zero_indexes
            .as_deref()
            .ok_or(Error::NotReady("first non-zero pixels are not found"))?)
    }

    /// Channel values at the first non-zero pixels
    ///
    /// Integers for raw integer images, scaled floats otherwise.
    pub fn first_non_zero_values(&self) -> MeasureResult<&ObjectValues> {
        Ok(self
            .first_non_zero_values
            .as_ref()
            .ok_or(Error::NotReady("first non-zero pixels are not found"))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LABELS: [i32; 6] = [0, 1, 1, 2, 2, 2];
    const BYTES: [u8; 6] = [0, 10, 20, 5, 15, 25];

    #[test]
    fn test_not_ready() {
        let mut analyser = LabelsAnalyser::new(LabelImage::from_slice(&LABELS));
        assert!(analyser.find_means().is_err());
        assert!(analyser.cardinalities().is_err());
        analyser.set_image(Channels::single(&BYTES[..]), true).unwrap();
        assert!(analyser.find_percentiles().is_err());
        assert!(analyser.means().is_err());
    }

    #[test]
    fn test_scaled_means_and_deviations() {
        let mut analyser = LabelsAnalyser::new(LabelImage::from_slice(&LABELS));
        analyser.set_image(Channels::single(&BYTES[..]), false).unwrap();
        analyser.find_means_and_standard_deviations().unwrap();
        assert_eq!(analyser.cardinalities().unwrap(), &[2, 3]);
        let sums = analyser.sums().unwrap();
        assert!((sums[0] - 30.0 / 255.0).abs() < 1e-12);
        assert!((sums[1] - 45.0 / 255.0).abs() < 1e-12);
        let means = analyser.means().unwrap();
        assert!((means[0] - 15.0 / 255.0).abs() < 1e-7);
        let std = analyser.standard_deviations().unwrap();
        assert!((std[0] - 5.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_percentiles_scenario() {
        let mut analyser = LabelsAnalyser::new(LabelImage::from_slice(&LABELS));
        analyser.set_image(Channels::single(&BYTES[..]), true).unwrap();
        analyser
            .set_percentile_levels(vec![vec![0.0, 1.0, 0.5]])
            .set_truncated_mean_bounds(Some(TruncatedMeanBounds::new(0, 1)));
        analyser.prepare_lists().unwrap();
        analyser.find_percentiles().unwrap();
        assert_eq!(analyser.grouped_percentiles_by_level(2).unwrap(), vec![20.0, 15.0]);
        assert_eq!(analyser.percentiles_range(0, 1).unwrap(), vec![10.0, 20.0]);
        assert_eq!(analyser.truncated_means().unwrap(), vec![15.0, 15.0]);
        assert!(analyser.grouped_percentiles_by_level(3).is_err());
    }

    #[test]
    fn test_ranking_of_another_type() {
        let ranking = [0.0f32, 2.0, 1.0, 0.5, 0.1, 0.9];
        let mut analyser = LabelsAnalyser::new(LabelImage::from_slice(&LABELS));
        analyser
            .set_image_and_ranking(Channels::single(&BYTES[..]), ChannelSlice::F32(&ranking), false)
            .unwrap();
        assert_eq!(analyser.scale(), Some(1.0 / 255.0));
        analyser.set_percentile_levels(vec![vec![1.0]]);
        analyser.prepare_lists().unwrap();
        analyser.find_percentiles().unwrap();
        assert_eq!(analyser.percentiles_by_channels().unwrap()[0][0], vec![10.0, 25.0]);
    }

    #[test]
    fn test_first_non_zero_values() {
        let labels = [1, 1, 2, 2];
        let values = [0i32, 7, 0, 0];
        let mut analyser = LabelsAnalyser::new(LabelImage::from_slice(&labels));
        analyser.set_image(Channels::single(&values[..]), true).unwrap();
        analyser.find_first_non_zero().unwrap();
        assert_eq!(analyser.first_non_zero_indexes().unwrap(), &[1, -1]);
        assert_eq!(analyser.first_non_zero_values().unwrap(), &ObjectValues::Int(vec![7, 0]));
    }
}
