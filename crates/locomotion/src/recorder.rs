//! # Episode Recording
//!
//! Step-level diagnostics for checking reward scale. Recorders receive one
//! [`StepRecord`] per step and never fail the caller.

use crate::env::Step;
use crate::reward::{RewardBreakdown, RewardTerm};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;

/// Episode length used when extrapolating per-step rewards to an episode.
pub const REFERENCE_EPISODE_STEPS: u32 = 120;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub episode: u32,
    pub step: u32,
    pub reward: f32,
    pub terminated: bool,
    pub truncated: bool,
    pub contacts: usize,
    pub breakdown: RewardBreakdown,
    #[serde(default)]
    pub degraded: usize,
}

impl StepRecord {
    #[must_use]
    pub fn new(episode: u32, step: &Step) -> Self {
        Self {
            episode,
            step: step.info.steps,
            reward: step.reward,
            terminated: step.terminated,
            truncated: step.truncated,
            contacts: step.info.contacts,
            breakdown: step.info.breakdown.clone(),
            degraded: step.info.degraded.len(),
        }
    }
}

pub trait EpisodeRecorder {
    fn record(&mut self, record: &StepRecord);
}

impl<R: EpisodeRecorder + ?Sized> EpisodeRecorder for &mut R {
    fn record(&mut self, record: &StepRecord) {
        (**self).record(record);
    }
}

/// Keeps every record in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecorder {
    records: Vec<StepRecord>,
}

impl MemoryRecorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    #[must_use]
    pub fn stats(&self) -> RewardStats {
        RewardStats::from_records(&self.records)
    }
}

impl EpisodeRecorder for MemoryRecorder {
    fn record(&mut self, record: &StepRecord) {
        self.records.push(record.clone());
    }
}

/// Writes one JSON object per line. Write failures are logged and dropped.
#[derive(Debug)]
pub struct JsonLinesRecorder<W: Write> {
    writer: W,
    errors: usize,
}

impl<W: Write> JsonLinesRecorder<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, errors: 0 }
    }

    /// Number of records that could not be written.
    #[must_use]
    pub fn errors(&self) -> usize {
        self.errors
    }

    /// Flushes and returns the writer.
    pub fn into_inner(mut self) -> W {
        if let Err(e) = self.writer.flush() {
            tracing::warn!("failed to flush step records: {e}");
        }
        self.writer
    }

    fn write(&mut self, record: &StepRecord) -> std::io::Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")
    }
}

impl<W: Write> EpisodeRecorder for JsonLinesRecorder<W> {
    fn record(&mut self, record: &StepRecord) {
        if let Err(e) = self.write(record) {
            if self.errors == 0 {
                tracing::warn!("failed to write step record: {e}");
            } else {
                tracing::debug!("failed to write step record: {e}");
            }
            self.errors += 1;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub mean: f32,
    pub min: f32,
    pub max: f32,
}

impl Summary {
    fn of(values: &[f32]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let mean = values.iter().sum::<f32>() / values.len() as f32;
        let min = values.iter().copied().fold(f32::INFINITY, f32::min);
        let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        Some(Self { mean, min, max })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleWarning {
    pub severity: Severity,
    pub message: String,
}

/// Reward statistics over a set of recorded steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RewardStats {
    pub steps: usize,
    pub episodes: usize,
    pub falls: usize,
    pub per_step: Option<Summary>,
    pub per_term: BTreeMap<RewardTerm, Summary>,
}

impl RewardStats {
    #[must_use]
    pub fn from_records(records: &[StepRecord]) -> Self {
        let rewards: Vec<f32> = records.iter().map(|r| r.reward).collect();
        let mut terms: BTreeMap<RewardTerm, Vec<f32>> = BTreeMap::new();
        for record in records {
            for (term, value) in record.breakdown.iter() {
                terms.entry(term).or_default().push(value);
            }
        }
        let mut episodes: Vec<u32> = records.iter().map(|r| r.episode).collect();
        episodes.dedup();
        Self {
            steps: records.len(),
            episodes: episodes.len(),
            falls: records.iter().filter(|r| r.terminated).count(),
            per_step: Summary::of(&rewards),
            per_term: terms
                .into_iter()
                .filter_map(|(term, values)| Summary::of(&values).map(|s| (term, s)))
                .collect(),
        }
    }

    /// Mean step reward extrapolated to [`REFERENCE_EPISODE_STEPS`] steps.
    #[must_use]
    pub fn estimated_episode_reward(&self) -> Option<f32> {
        #[allow(clippy::cast_precision_loss)]
        let steps = REFERENCE_EPISODE_STEPS as f32;
        self.per_step.map(|s| s.mean * steps)
    }

    /// Flags reward scales that tend to destabilise policy optimisation.
    #[must_use]
    pub fn assess(&self) -> Vec<ScaleWarning> {
        let mut warnings = Vec::new();
        let Some(per_step) = self.per_step else {
            return warnings;
        };
        let mut warn = |severity, message: String| warnings.push(ScaleWarning { severity, message });

        if per_step.max > 50.0 {
            warn(Severity::Critical, format!("max step reward {:.2} is above 50", per_step.max));
        } else if per_step.max > 30.0 {
            warn(Severity::Warning, format!("max step reward {:.2} is above 30", per_step.max));
        } else if per_step.max < 5.0 {
            warn(
                Severity::Warning,
                format!("max step reward {:.2} is below 5; the signal may be too weak", per_step.max),
            );
        }

        if let Some(episode) = self.estimated_episode_reward() {
            if episode > 10_000.0 {
                warn(Severity::Critical, format!("estimated episode reward {episode:.0} is above 10000"));
            } else if episode > 5_000.0 {
                warn(Severity::Warning, format!("estimated episode reward {episode:.0} is above 5000"));
            }
        }
        warnings
    }
}
