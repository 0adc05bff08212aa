use std::path::Path;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::pipeline::dataset_layout::{discover_utterance_dirs, files_in};
use crate::shared::constants::{IMAGE_EXTENSIONS, STATS_FRAMES_PER_UTTERANCE};
use crate::shared::frame::Frame;
use crate::video::domain::video_reader::VideoReader;

/// Per-channel pixel statistics over pixels scaled to `[0, 1]`.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelStatistics {
    pub mean: Vec<f64>,
    /// Population standard deviation.
    pub std: Vec<f64>,
    pub frames: usize,
    pub utterances: usize,
}

#[derive(Default)]
struct Accumulator {
    sum: Vec<f64>,
    sum_sq: Vec<f64>,
    pixels: usize,
}

impl Accumulator {
    fn add(&mut self, frame: &Frame) {
        let channels = frame.channels() as usize;
        if self.sum.is_empty() {
            self.sum = vec![0.0; channels];
            self.sum_sq = vec![0.0; channels];
        }
        for px in frame.data().chunks_exact(channels) {
            for (c, &v) in px.iter().enumerate() {
                let v = v as f64 / 255.0;
                self.sum[c] += v;
                self.sum_sq[c] += v * v;
            }
        }
        self.pixels += frame.data().len() / channels;
    }

    fn finish(self, frames: usize, utterances: usize) -> ChannelStatistics {
        let n = self.pixels.max(1) as f64;
        let mean: Vec<f64> = self.sum.iter().map(|s| s / n).collect();
        let std = self
            .sum_sq
            .iter()
            .zip(&mean)
            .map(|(sq, m)| (sq / n - m * m).max(0.0).sqrt())
            .collect();
        ChannelStatistics {
            mean,
            std,
            frames,
            utterances,
        }
    }
}

/// Estimates normalisation constants for a frame dataset.
///
/// Samples up to a fixed number of random frames from every
/// `<root>/<actor>/<utterance>/` directory and reduces them to a per-channel
/// mean and standard deviation.
pub struct ImageStatisticsUseCase {
    reader: Box<dyn VideoReader>,
    grayscale: bool,
    samples_per_utterance: usize,
    rng: StdRng,
}

impl ImageStatisticsUseCase {
    /// A fixed `seed` makes the frame sample reproducible.
    pub fn new(reader: Box<dyn VideoReader>, grayscale: bool, seed: Option<u64>) -> Self {
        Self {
            reader,
            grayscale,
            samples_per_utterance: STATS_FRAMES_PER_UTTERANCE,
            rng: seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64),
        }
    }

    pub fn with_samples_per_utterance(mut self, samples: usize) -> Self {
        self.samples_per_utterance = samples.max(1);
        self
    }

    pub fn execute(&mut self, root: &Path) -> Result<ChannelStatistics, Box<dyn std::error::Error>> {
        let dirs = discover_utterance_dirs(root)?;
        let mut acc = Accumulator::default();
        let mut frames = 0;

        for dir in &dirs {
            let files = files_in(&dir.path, IMAGE_EXTENSIONS)?;
            let sample: Vec<_> = files
                .choose_multiple(&mut self.rng, self.samples_per_utterance)
                .cloned()
                .collect();
            for path in sample {
                let frame = self.read_frame(&path)?;
                let frame = if self.grayscale {
                    frame.to_grayscale()
                } else {
                    frame
                };
                if !acc.sum.is_empty() && acc.sum.len() != frame.channels() as usize {
                    return Err(format!("Channel count changed at {}", path.display()).into());
                }
                acc.add(&frame);
                frames += 1;
            }
        }

        if frames == 0 {
            return Err(format!("No frames found under {}", root.display()).into());
        }
        log::info!("{frames} frames used from {} utterances", dirs.len());
        Ok(acc.finish(frames, dirs.len()))
    }

    fn read_frame(&mut self, path: &Path) -> Result<Frame, Box<dyn std::error::Error>> {
        self.reader.open(path)?;
        let first = self.reader.frames().next();
        self.reader.close();
        first.unwrap_or_else(|| Err(format!("No frame decoded from {}", path.display()).into()))
    }
}
