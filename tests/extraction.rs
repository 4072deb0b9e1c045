//! Extraction loop integration tests.
//!
//! Frames come from an in-memory source so every scenario is deterministic
//! and needs no fixture video.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::Duration,
};

use image::{Rgb, RgbImage};
use slide_extract::{
    DiskEncoder, ExportEvent, ExportFormat, ExtractOptions, Frame, FrameEncoder, FrameSource,
    ProgressCallback, ProgressInfo, Roi, SlideError, extract_from_source,
};

const WIDTH: u32 = 64;
const HEIGHT: u32 = 48;
const GRAY: Rgb<u8> = Rgb([100, 100, 100]);
const RED: Rgb<u8> = Rgb([200, 50, 50]);

/// Serves frames from memory through a single reused slot, like a decoder.
struct MemorySource {
    frames: Vec<Frame>,
    next: usize,
    current: Frame,
}

impl MemorySource {
    fn new(images: Vec<RgbImage>) -> Self {
        let frames = images
            .into_iter()
            .enumerate()
            .map(|(index, image)| Frame::new(image, Duration::from_secs(index as u64)))
            .collect();
        Self {
            frames,
            next: 0,
            current: Frame::default(),
        }
    }
}

impl FrameSource for MemorySource {
    fn read_frame(&mut self) -> Result<Option<&Frame>, SlideError> {
        let Some(frame) = self.frames.get(self.next) else {
            return Ok(None);
        };
        self.current = frame.duplicate();
        self.next += 1;
        Ok(Some(&self.current))
    }

    fn frame_count_hint(&self) -> Option<u64> {
        Some(self.frames.len() as u64)
    }
}

/// Fails every format whose extension is listed, and every format for the
/// listed file stems; everything else goes to disk.
#[derive(Default)]
struct SelectiveEncoder {
    failing_extensions: Vec<&'static str>,
    failing_stems: Vec<&'static str>,
}

impl FrameEncoder for SelectiveEncoder {
    fn encode(&self, image: &RgbImage, path: &Path, format: ExportFormat) -> Result<(), SlideError> {
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        let fails = self.failing_extensions.contains(&format.extension())
            || self.failing_stems.iter().any(|failing| stem.ends_with(failing));
        if fails {
            return Err(SlideError::EncodeFailure {
                path: path.to_path_buf(),
                reason: "forced failure".to_string(),
            });
        }
        DiskEncoder.encode(image, path, format)
    }
}

fn solid(color: Rgb<u8>) -> RgbImage {
    RgbImage::from_pixel(WIDTH, HEIGHT, color)
}

fn with_patch(mut image: RgbImage, area: Roi, color: Rgb<u8>) -> RgbImage {
    for y in area.y..area.y + area.height {
        for x in area.x..area.x + area.width {
            image.put_pixel(x, y, color);
        }
    }
    image
}

fn patch_area() -> Roi {
    Roi::new(40, 8, 16, 16).unwrap()
}

fn prefix(directory: &Path) -> String {
    format!("{}/slide_", directory.display())
}

fn written_files(directory: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(directory)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

// ── first frame & basic scenario ────────────────────────────────────

#[test]
fn first_frame_is_always_exported() {
    let directory = tempfile::tempdir().unwrap();
    let mut source = MemorySource::new(vec![solid(GRAY)]);
    let options = ExtractOptions::new().with_threshold(f64::MIN_POSITIVE);

    let summary =
        extract_from_source(&mut source, &DiskEncoder, &prefix(directory.path()), &options)
            .unwrap();

    assert_eq!(summary.exported, 1);
    assert_eq!(written_files(directory.path()), vec!["slide_00_00_00_000.png"]);
}

#[test]
fn duplicate_skipped_and_change_inside_region_exported() {
    let directory = tempfile::tempdir().unwrap();
    let a = solid(GRAY);
    let b = with_patch(solid(GRAY), patch_area(), RED);
    let mut source = MemorySource::new(vec![a.clone(), a, b]);
    let options = ExtractOptions::new()
        .with_threshold(0.999)
        .with_roi(patch_area());

    let summary =
        extract_from_source(&mut source, &DiskEncoder, &prefix(directory.path()), &options)
            .unwrap();

    assert_eq!(summary.frames_processed, 3);
    assert_eq!(summary.exported, 2);
    assert_eq!(summary.failed_exports, 0);
    assert_eq!(
        written_files(directory.path()),
        vec!["slide_00_00_00_000.png", "slide_00_00_02_000.png"]
    );
}

#[test]
fn exported_image_is_full_frame_even_with_region() {
    let directory = tempfile::tempdir().unwrap();
    let mut source = MemorySource::new(vec![solid(GRAY)]);
    let options = ExtractOptions::new().with_roi(Roi::new(0, 0, 4, 4).unwrap());

    extract_from_source(&mut source, &DiskEncoder, &prefix(directory.path()), &options).unwrap();

    let written = image::open(directory.path().join("slide_00_00_00_000.png")).unwrap();
    assert_eq!((written.width(), written.height()), (WIDTH, HEIGHT));
}

#[test]
fn empty_source_exports_nothing() {
    let directory = tempfile::tempdir().unwrap();
    let mut source = MemorySource::new(Vec::new());

    let summary = extract_from_source(
        &mut source,
        &DiskEncoder,
        &prefix(directory.path()),
        &ExtractOptions::new(),
    )
    .unwrap();

    assert_eq!(summary.exported, 0);
    assert_eq!(summary.frames_processed, 0);
    assert!(written_files(directory.path()).is_empty());
}

#[test]
fn count_matches_files_on_disk() {
    let directory = tempfile::tempdir().unwrap();
    let colors = [GRAY, GRAY, RED, RED, Rgb([10, 200, 30]), GRAY, GRAY];
    let mut source = MemorySource::new(colors.iter().map(|&c| solid(c)).collect());

    let summary = extract_from_source(
        &mut source,
        &DiskEncoder,
        &prefix(directory.path()),
        &ExtractOptions::new(),
    )
    .unwrap();

    assert_eq!(summary.exported, 4);
    assert_eq!(written_files(directory.path()).len() as u64, summary.exported);
}

// ── threshold ───────────────────────────────────────────────────────

/// Records paths instead of writing files.
#[derive(Default)]
struct RecordingEncoder {
    paths: Mutex<Vec<PathBuf>>,
}

impl FrameEncoder for RecordingEncoder {
    fn encode(&self, _image: &RgbImage, path: &Path, _format: ExportFormat) -> Result<(), SlideError> {
        self.paths.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }
}

#[test]
fn higher_threshold_never_exports_fewer_frames() {
    // Progressively stronger changes inside the patch.
    let images: Vec<RgbImage> = [100_u8, 104, 120, 160, 220, 220]
        .iter()
        .map(|&red| with_patch(solid(GRAY), patch_area(), Rgb([red, 100, 100])))
        .collect();

    let mut previous = 0;
    for threshold in [0.01, 0.5, 0.9, 0.99, 0.999, 0.99999, 1.0] {
        let mut source = MemorySource::new(images.clone());
        let encoder = RecordingEncoder::default();
        let options = ExtractOptions::new()
            .with_threshold(threshold)
            .with_roi(patch_area());

        let summary = extract_from_source(&mut source, &encoder, "slide_", &options).unwrap();
        assert!(
            summary.exported >= previous,
            "threshold {threshold} exported {} < {previous}",
            summary.exported
        );
        assert_eq!(summary.exported as usize, encoder.paths.lock().unwrap().len());
        previous = summary.exported;
    }
}

#[test]
fn threshold_of_one_exports_identical_frames() {
    let mut source = MemorySource::new(vec![solid(GRAY), solid(GRAY), solid(GRAY)]);
    let encoder = RecordingEncoder::default();
    let options = ExtractOptions::new().with_threshold(1.0);

    let summary = extract_from_source(&mut source, &encoder, "slide_", &options).unwrap();

    assert_eq!(summary.exported, 3);
}

#[test]
fn invalid_threshold_fails_before_decoding() {
    let mut source = MemorySource::new(vec![solid(GRAY)]);
    let options = ExtractOptions::new().with_threshold(0.0);

    let result = extract_from_source(&mut source, &RecordingEncoder::default(), "slide_", &options);

    assert!(matches!(result, Err(SlideError::ThresholdOutOfRange(_))));
    assert_eq!(source.next, 0, "no frame should have been read");
}

// ── region scoping ──────────────────────────────────────────────────

fn exports_for(roi: Option<Roi>) -> u64 {
    let a = solid(GRAY);
    let b = with_patch(solid(GRAY), patch_area(), RED);
    let mut source = MemorySource::new(vec![a, b]);
    let mut options = ExtractOptions::new();
    if let Some(roi) = roi {
        options = options.with_roi(roi);
    }
    extract_from_source(&mut source, &RecordingEncoder::default(), "slide_", &options)
        .unwrap()
        .exported
}

#[test]
fn region_covering_change_exports_second_slide() {
    assert_eq!(exports_for(Some(patch_area())), 2);
}

#[test]
fn full_frame_comparison_exports_second_slide() {
    assert_eq!(exports_for(None), 2);
}

#[test]
fn region_outside_change_ignores_it() {
    assert_eq!(exports_for(Some(Roi::new(0, 30, 20, 18).unwrap())), 1);
}

#[test]
fn region_larger_than_frame_is_rejected() {
    let directory = tempfile::tempdir().unwrap();
    let mut source = MemorySource::new(vec![solid(GRAY)]);
    let options = ExtractOptions::new().with_roi(Roi::new(60, 0, 10, 10).unwrap());

    let result =
        extract_from_source(&mut source, &DiskEncoder, &prefix(directory.path()), &options);

    assert!(matches!(
        result,
        Err(SlideError::RoiOutOfBounds {
            width: WIDTH,
            height: HEIGHT,
            ..
        })
    ));
    assert!(written_files(directory.path()).is_empty());
}

// ── encode fallback ─────────────────────────────────────────────────

#[test]
fn png_failure_falls_back_to_jpeg_and_moves_baseline() {
    let directory = tempfile::tempdir().unwrap();
    let a = solid(GRAY);
    let b = solid(RED);
    let mut source = MemorySource::new(vec![a.clone(), a, b]);
    let encoder = SelectiveEncoder {
        failing_extensions: vec!["png"],
        ..SelectiveEncoder::default()
    };

    let summary = extract_from_source(
        &mut source,
        &encoder,
        &prefix(directory.path()),
        &ExtractOptions::new(),
    )
    .unwrap();

    // The duplicate at t1 is skipped, so the JPEG write became the baseline.
    assert_eq!(summary.exported, 2);
    assert_eq!(summary.failed_exports, 0);
    assert_eq!(
        written_files(directory.path()),
        vec!["slide_00_00_00_000.jpg", "slide_00_00_02_000.jpg"]
    );
}

#[test]
fn frame_failing_every_format_is_dropped_without_moving_baseline() {
    let directory = tempfile::tempdir().unwrap();
    let mut source = MemorySource::new(vec![solid(GRAY), solid(RED), solid(RED)]);
    let encoder = SelectiveEncoder {
        failing_stems: vec!["00_00_01_000"],
        ..SelectiveEncoder::default()
    };

    let summary = extract_from_source(
        &mut source,
        &encoder,
        &prefix(directory.path()),
        &ExtractOptions::new(),
    )
    .unwrap();

    // t2 is still compared against t0, so it becomes the second slide.
    assert_eq!(summary.exported, 2);
    assert_eq!(summary.failed_exports, 1);
    assert_eq!(
        written_files(directory.path()),
        vec!["slide_00_00_00_000.png", "slide_00_00_02_000.png"]
    );
}

#[test]
fn failed_first_frame_leaves_baseline_unset() {
    let directory = tempfile::tempdir().unwrap();
    let mut source = MemorySource::new(vec![solid(GRAY), solid(GRAY)]);
    let encoder = SelectiveEncoder {
        failing_stems: vec!["00_00_00_000"],
        ..SelectiveEncoder::default()
    };

    let summary = extract_from_source(
        &mut source,
        &encoder,
        &prefix(directory.path()),
        &ExtractOptions::new(),
    )
    .unwrap();

    assert_eq!(summary.exported, 1);
    assert_eq!(summary.failed_exports, 1);
    assert_eq!(written_files(directory.path()), vec!["slide_00_00_01_000.png"]);
}

#[test]
fn empty_export_plan_is_rejected() {
    let mut source = MemorySource::new(vec![solid(GRAY)]);
    let options = ExtractOptions::new().with_export_formats(Vec::new());

    let result = extract_from_source(&mut source, &RecordingEncoder::default(), "slide_", &options);

    assert!(matches!(result, Err(SlideError::EmptyExportPlan)));
}

// ── progress ────────────────────────────────────────────────────────

#[derive(Default)]
struct CountingProgress {
    reports: Mutex<Vec<ProgressInfo>>,
    events: Mutex<Vec<ExportEvent>>,
}

impl ProgressCallback for CountingProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.reports.lock().unwrap().push(info.clone());
    }

    fn on_export(&self, event: &ExportEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

#[test]
fn progress_and_export_events_fire() {
    let progress = Arc::new(CountingProgress::default());
    let mut source = MemorySource::new(vec![solid(GRAY), solid(GRAY), solid(RED), solid(RED)]);
    let encoder = SelectiveEncoder {
        failing_extensions: vec!["png"],
        ..SelectiveEncoder::default()
    };
    let directory = tempfile::tempdir().unwrap();
    let options = ExtractOptions::new()
        .with_progress(progress.clone())
        .with_batch_size(2);

    extract_from_source(&mut source, &encoder, &prefix(directory.path()), &options).unwrap();

    let reports = progress.reports.lock().unwrap();
    // Two batch reports plus the final one.
    assert_eq!(reports.len(), 3);
    let last = reports.last().unwrap();
    assert_eq!(last.frames_processed, 4);
    assert_eq!(last.exported, 2);
    assert_eq!(last.total, Some(4));
    assert_eq!(last.percentage, Some(100.0));

    let events = progress.events.lock().unwrap();
    let attempts = events
        .iter()
        .filter(|event| matches!(event, ExportEvent::Attempt { .. }))
        .count();
    let failures = events
        .iter()
        .filter(|event| matches!(event, ExportEvent::Failed { .. }))
        .count();
    let writes = events
        .iter()
        .filter(|event| {
            matches!(
                event,
                ExportEvent::Written {
                    format: ExportFormat::Jpeg { quality: 95 },
                    ..
                }
            )
        })
        .count();
    assert_eq!((attempts, failures, writes), (4, 2, 2));
}
