//! Measure regression test
//!
//! Runs whole requests on synthetic label images and checks every output
//! against brute-force statistics computed from the pixels of each object.

use labelstat_core::{ChannelSlice, Channels, LabelImage, SchedulerOptions};
use labelstat_measure::{LabelsAnalyser, MeasureOptions, ObjectParameter, measure_labelled_objects};
use labelstat_percentile::CommonLevelsTieMode;
use labelstat_test::generate::{random_bytes, random_labels, random_shorts, seeded_rng, tiled_labels};
use labelstat_test::{RegParams, reference};

#[test]
fn measure_reg() {
    let mut rp = RegParams::new("measure");
    let mut rng = seeded_rng(2024);

    // --- Single short channel, every parameter ---
    eprintln!("=== All parameters on a short channel ===");
    let (width, height) = (160, 120);
    let labels = tiled_labels(width, height, 8).unwrap();
    let shorts = random_shorts(&mut rng, labels.len(), 4000);
    let options = MeasureOptions::new()
        .with_low_percentile(vec![0.1])
        .with_percentile_a(vec![0.5])
        .with_percentile_b(vec![0.75])
        .with_percentile_c(vec![1.0]);
    let image = LabelImage::new(&labels, width, height).unwrap();
    let result = measure_labelled_objects(
        &image,
        None,
        &Channels::single(&shorts[..]),
        None,
        &ObjectParameter::ALL,
        &options,
    )
    .unwrap();
    let scale = 1.0 / 65535.0;
    let cardinalities = reference::cardinalities(&labels);
    rp.compare_values(cardinalities.len() as f64, result.max_label as f64, 0.0);
    rp.compare_int_arrays(&cardinalities, result.ints(ObjectParameter::Cardinality).unwrap());
    for label in 1..=result.max_label {
        let values = reference::object_values(&labels, &shorts, label as i32);
        let k = label - 1;
        if values.is_empty() {
            rp.check(
                result.floats(ObjectParameter::PercentileA).unwrap()[k].is_nan(),
                "empty object gives NaN percentile",
            );
            continue;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let mean_square = values.iter().map(|v| v * v).sum::<f64>() / n;
        let std = (mean_square - mean * mean).max(0.0).sqrt();
        let get = |p: ObjectParameter| result.floats(p).unwrap()[k] as f64;
        rp.compare_values(mean * scale, get(ObjectParameter::Mean), 1e-6);
        rp.compare_values(mean_square * scale * scale, get(ObjectParameter::MeanSquare), 1e-6);
        rp.compare_values(std * scale, get(ObjectParameter::StandardDeviation), 1e-5);
        let low = reference::percentile(&values, 0.1);
        let high = reference::percentile(&values, 0.9);
        rp.compare_values(low * scale, get(ObjectParameter::LowPercentile), 1e-7);
        rp.compare_values(high * scale, get(ObjectParameter::HighPercentile), 1e-7);
        rp.compare_values(
            reference::percentile(&values, 0.5) * scale,
            get(ObjectParameter::PercentileA),
            1e-7,
        );
        rp.compare_values(
            reference::percentile(&values, 0.75) * scale,
            get(ObjectParameter::PercentileB),
            1e-7,
        );
        rp.compare_values(
            reference::percentile(&values, 1.0) * scale,
            get(ObjectParameter::PercentileC),
            1e-7,
        );
        rp.compare_values((high - low) * scale, get(ObjectParameter::PercentilesRange), 1e-6);
        rp.compare_values(
            reference::truncated_mean(&values, 0.1, 0.9) * scale,
            get(ObjectParameter::TruncatedMean),
            1e-6,
        );
        rp.check(
            get(ObjectParameter::LowPercentile) <= get(ObjectParameter::PercentileA)
                && get(ObjectParameter::PercentileA) <= get(ObjectParameter::HighPercentile),
            "percentiles are monotonic",
        );
    }

    // --- Requests are idempotent ---
    eprintln!("=== Repeated request ===");
    let again = measure_labelled_objects(
        &image,
        None,
        &Channels::single(&shorts[..]),
        None,
        &ObjectParameter::ALL,
        &options.clone().with_scheduler(SchedulerOptions::new().with_num_workers(3)),
    )
    .unwrap();
    for parameter in ObjectParameter::ALL {
        let first = result.get(parameter).unwrap().to_f32_vec();
        let second = again.get(parameter).unwrap().to_f32_vec();
        rp.compare_float_arrays(&first, &second, 1e-6);
    }

    // --- Masked byte image with a level image ---
    eprintln!("=== Masked colour image ranked by brightness ===");
    let len = 40_000;
    let labels = random_labels(&mut rng, len, 120, 0.2).unwrap();
    let mask = random_bytes(&mut rng, len, 3);
    let red = random_bytes(&mut rng, len, 255);
    let green = random_bytes(&mut rng, len, 255);
    let brightness = random_bytes(&mut rng, len, 255);
    let colour = Channels::new(vec![&red[..], &green[..]]).unwrap();
    let level = Channels::single(&brightness[..]);
    let masked: Vec<i32> = labels
        .iter()
        .zip(&mask)
        .map(|(&l, &m)| if m == 0 { 0 } else { l })
        .collect();
    for tie_mode in [CommonLevelsTieMode::AverageTies, CommonLevelsTieMode::SinglePixel] {
        let options = MeasureOptions::new()
            .with_raw_values(true)
            .with_percentile_a(vec![0.5])
            .with_separate_channel_percentiles(vec![1])
            .with_tie_mode(tie_mode);
        let result = measure_labelled_objects(
            &LabelImage::from_slice(&labels),
            Some(ChannelSlice::U8(&mask)),
            &colour,
            Some(&level),
            &[ObjectParameter::PercentileA, ObjectParameter::Cardinality],
            &options,
        )
        .unwrap();
        rp.compare_int_arrays(
            &reference::cardinalities(&masked),
            result.ints(ObjectParameter::Cardinality).unwrap(),
        );
        let medians = result.floats(ObjectParameter::PercentileA).unwrap();
        for label in [1, 60, 120] {
            let k = (label - 1) as usize;
            let greens = reference::object_values(&masked, &green, label);
            rp.compare_values(reference::percentile(&greens, 0.5), medians[2 * k + 1] as f64, 0.0);
            let ranks = reference::object_values(&masked, &brightness, label);
            let selected = reference::percentile(&ranks, 0.5);
            let reds: Vec<f64> = reference::object_values(&masked, &red, label)
                .into_iter()
                .zip(&ranks)
                .filter(|(_, r)| **r == selected)
                .map(|(v, _)| v)
                .collect();
            let found = medians[2 * k] as f64;
            match tie_mode {
                CommonLevelsTieMode::AverageTies => {
                    let mean = reds.iter().sum::<f64>() / reds.len() as f64;
                    rp.compare_values(mean, found, 1e-4);
                }
                CommonLevelsTieMode::SinglePixel => {
                    rp.check(reds.contains(&found), "single pixel value is one of the ties");
                }
            }
        }
    }

    // --- Low percentile above 0.5 crosses the truncated mean bounds ---
    eprintln!("=== Crossed truncated mean bounds ===");
    let parameters = [
        ObjectParameter::LowPercentile,
        ObjectParameter::HighPercentile,
        ObjectParameter::TruncatedMean,
    ];
    let crossed = MeasureOptions::new()
        .with_raw_values(true)
        .with_low_percentile(vec![0.8]);
    let single = measure_labelled_objects(
        &LabelImage::from_slice(&labels),
        None,
        &Channels::single(&red[..]),
        None,
        &parameters,
        &crossed,
    )
    .unwrap();
    let red_rank = Channels::single(&red[..]);
    let mut ranked = Vec::new();
    for tie_mode in [CommonLevelsTieMode::AverageTies, CommonLevelsTieMode::SinglePixel] {
        let result = measure_labelled_objects(
            &LabelImage::from_slice(&labels),
            None,
            &colour,
            Some(&red_rank),
            &parameters,
            &crossed.clone().with_tie_mode(tie_mode),
        )
        .unwrap();
        ranked.push(result);
    }
    for label in [1, 60, 120] {
        let k = (label - 1) as usize;
        let reds = reference::object_values(&labels, &red, label);
        let low = reference::percentile(&reds, 0.8);
        let high = reference::percentile(&reds, 1.0 - 0.8);
        rp.compare_values(low, single.floats(ObjectParameter::LowPercentile).unwrap()[k] as f64, 0.0);
        rp.compare_values(high, single.floats(ObjectParameter::HighPercentile).unwrap()[k] as f64, 0.0);
        for result in &ranked {
            let lows = result.floats(ObjectParameter::LowPercentile).unwrap();
            let highs = result.floats(ObjectParameter::HighPercentile).unwrap();
            rp.compare_values(low, lows[2 * k] as f64, 0.0);
            rp.compare_values(high, highs[2 * k] as f64, 0.0);
            rp.check(!lows[2 * k + 1].is_nan(), "ranked bound percentile present");
            rp.check(!highs[2 * k + 1].is_nan(), "ranked bound percentile present");
        }
    }
    for result in ranked.iter().chain([&single]) {
        rp.check(
            result
                .floats(ObjectParameter::TruncatedMean)
                .unwrap()
                .iter()
                .all(|v| v.is_nan()),
            "crossed bounds give NaN truncated means",
        );
    }

    // --- Analyser reuse ---
    eprintln!("=== Analyser passes ===");
    let labels = tiled_labels(64, 64, 16).unwrap();
    let bytes = random_bytes(&mut rng, labels.len(), 255);
    let mut analyser = LabelsAnalyser::new(LabelImage::new(&labels, 64, 64).unwrap());
    analyser.set_image(Channels::single(&bytes[..]), true).unwrap();
    analyser.find_cardinalities().unwrap();
    rp.compare_int_arrays(&reference::cardinalities(&labels), analyser.cardinalities().unwrap());
    analyser.prepare_lists().unwrap();
    analyser.set_percentile_levels(vec![vec![0.5]]);
    analyser.find_percentiles().unwrap();
    let first = analyser.grouped_percentiles_by_level(0).unwrap();
    analyser.find_percentiles().unwrap();
    rp.compare_float_arrays(&first, &analyser.grouped_percentiles_by_level(0).unwrap(), 0.0);

    assert!(rp.cleanup(), "measure regression test failed");
}
