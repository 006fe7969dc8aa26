//! Analyzing several images one after another.
//!
//! Images are analyzed strictly in order, each one finishing before the next one starts. An image that fails to
//! decode or ends up with nothing to analyze is counted as a failure and skipped; it never aborts the rest of the
//! batch.

use crate::{Analysis, AnalysisBuilder, Result};
use image::RgbaImage;
use log::warn;

/// The outcome of a batch: the successful analyses in input order, and how many images failed.
#[derive(Debug, Clone)]
pub struct BatchReport<K> {
    results: Vec<(K, Analysis)>,
    failed: usize,
    cancelled: bool,
}

impl<K> BatchReport<K> {
    pub fn results(&self) -> &[(K, Analysis)] {
        &self.results
    }

    pub fn into_results(self) -> Vec<(K, Analysis)> {
        self.results
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    /// Whether the batch was stopped before every image was analyzed.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// True if not a single image could be analyzed.
    pub fn is_failure(&self) -> bool {
        self.results.is_empty()
    }
}

/// Analyze every image in order. Each item pairs a caller-chosen key with the decoded image, or the error decoding it
/// ran into.
pub fn analyze_batch<K, I>(images: I, remove_background: bool) -> BatchReport<K>
where
    I: IntoIterator<Item = (K, Result<RgbaImage>)>,
{
    analyze_batch_until(images, remove_background, || false)
}

/// Like [`analyze_batch`], but `is_cancelled` is checked before each image is started. Once it returns true no
/// further images are taken from the iterator. An analysis already in progress always runs to completion.
pub fn analyze_batch_until<K, I, C>(images: I, remove_background: bool, mut is_cancelled: C) -> BatchReport<K>
where
    I: IntoIterator<Item = (K, Result<RgbaImage>)>,
    C: FnMut() -> bool,
{
    let mut report = BatchReport {
        results: Vec::new(),
        failed: 0,
        cancelled: false,
    };

    let mut images = images.into_iter();

    loop {
        if is_cancelled() {
            report.cancelled = true;
            break;
        }

        let (key, image) = match images.next() {
            Some(item) => item,
            None => break,
        };

        let analysis = image.and_then(|image| {
            AnalysisBuilder::from_image(image)
                .remove_background(remove_background)
                .analyze()
        });

        match analysis {
            Ok(analysis) => report.results.push((key, analysis)),
            Err(e) => {
                warn!("Skipping image: {}", e);
                report.failed += 1;
            }
        }
    }

    report
}
