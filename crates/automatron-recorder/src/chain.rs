//! Chains: several sequences played in order, each looped

use crate::player::{PlaybackReport, SequencePlayer};
use crate::sequence::Sequence;
use crate::storage::SequenceStore;
use automatron_core::{Clock, Error, InputDriver, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainItem {
    pub sequence_file: PathBuf,
    #[serde(default = "default_loops")]
    pub loop_count: u32,
    /// Seconds to wait after each loop, never less than the configured floor
    #[serde(default = "default_extra_delay")]
    pub extra_delay: f64,
}

fn default_loops() -> u32 {
    1
}

fn default_extra_delay() -> f64 {
    1.0
}

impl ChainItem {
    pub fn new(sequence_file: impl Into<PathBuf>) -> Self {
        Self {
            sequence_file: sequence_file.into(),
            loop_count: default_loops(),
            extra_delay: default_extra_delay(),
        }
    }

    pub fn loops(mut self, n: u32) -> Self {
        self.loop_count = n;
        self
    }

    pub fn delay(mut self, secs: f64) -> Self {
        self.extra_delay = secs;
        self
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.loop_count < 1 {
            return Err("loop_count must be at least 1".into());
        }
        if !(self.extra_delay.is_finite() && self.extra_delay >= 0.0) {
            return Err("extra_delay must be a non-negative number".into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainConfig {
    pub items: Vec<ChainItem>,
}

/// Contents of a setup file: a single recording or a chain of them.
#[derive(Debug, Clone, PartialEq)]
pub enum Playbook {
    Sequence(Sequence),
    Chain(ChainConfig),
}

/// Result of one loop of one item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoopOutcome {
    Completed(PlaybackReport),
    Failed { error: Error },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ItemOutcome {
    Skipped { reason: Error },
    Played { loops: Vec<LoopOutcome> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemReport {
    pub sequence_file: PathBuf,
    #[serde(flatten)]
    pub outcome: ItemOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChainReport {
    pub items: Vec<ItemReport>,
}

impl ChainReport {
    pub fn skipped(&self) -> usize {
        self.items
            .iter()
            .filter(|i| matches!(i.outcome, ItemOutcome::Skipped { .. }))
            .count()
    }

    /// Loops that ran every action, across all items.
    pub fn completed_loops(&self) -> usize {
        self.loops().filter(|l| matches!(l, LoopOutcome::Completed(_))).count()
    }

    pub fn failed_loops(&self) -> usize {
        self.loops().filter(|l| matches!(l, LoopOutcome::Failed { .. })).count()
    }

    fn loops(&self) -> impl Iterator<Item = &LoopOutcome> {
        self.items
            .iter()
            .filter_map(|i| match &i.outcome {
                ItemOutcome::Played { loops } => Some(loops),
                ItemOutcome::Skipped { .. } => None,
            })
            .flatten()
    }
}

/// Runs a chain with one player, in order. Nothing here is fatal: bad items
/// are skipped and failed loops are recorded.
pub struct ChainOrchestrator<D, C> {
    player: SequencePlayer<D, C>,
    base_dir: Option<PathBuf>,
}

impl<D: InputDriver, C: Clock> ChainOrchestrator<D, C> {
    pub fn new(player: SequencePlayer<D, C>) -> Self {
        Self {
            player,
            base_dir: None,
        }
    }

    /// Resolve relative `sequence_file` paths against `dir` instead of the
    /// working directory.
    pub fn relative_to(mut self, dir: impl AsRef<Path>) -> Self {
        self.base_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn player(&self) -> &SequencePlayer<D, C> {
        &self.player
    }

    pub fn run(&mut self, chain: &ChainConfig) -> ChainReport {
        let mut report = ChainReport::default();

        for (n, item) in chain.items.iter().enumerate() {
            let position = n + 1;
            let path = self.resolve(&item.sequence_file);
            let shown = path.display().to_string();

            let sequence = match SequenceStore::load(&path) {
                Ok(sequence) => sequence,
                Err(e) => {
                    let err = Error::chain_item_load(position, &shown, &e);
                    tracing::error!(item = position, path = %shown, error = %e, "Chain item skipped");
                    report.items.push(ItemReport {
                        sequence_file: item.sequence_file.clone(),
                        outcome: ItemOutcome::Skipped { reason: err },
                    });
                    continue;
                }
            };

            let mut loops = Vec::new();
            for iteration in 1..=item.loop_count {
                tracing::info!(
                    item = position,
                    path = %shown,
                    iteration,
                    of = item.loop_count,
                    "Playing chain item"
                );
                let outcome = match self.player.play(&sequence) {
                    Ok(played) => LoopOutcome::Completed(played),
                    Err(error) => {
                        tracing::warn!(item = position, iteration, error = %error, "Loop aborted");
                        LoopOutcome::Failed { error }
                    }
                };
                loops.push(outcome);
                self.player.executor().loop_pause(item.extra_delay);
            }

            report.items.push(ItemReport {
                sequence_file: item.sequence_file.clone(),
                outcome: ItemOutcome::Played { loops },
            });
        }

        tracing::info!(
            items = chain.items.len(),
            skipped = report.skipped(),
            failed_loops = report.failed_loops(),
            "Chain complete"
        );
        report
    }

    /// Play a playbook once, then wait one loop pause. A sequence must play
    /// through; a chain keeps its per-item isolation and never fails.
    pub fn run_playbook(&mut self, playbook: &Playbook) -> Result<()> {
        match playbook {
            Playbook::Sequence(sequence) => {
                self.player.play(sequence)?;
            }
            Playbook::Chain(chain) => {
                self.run(chain);
            }
        }
        self.player.executor().loop_pause(0.0);
        Ok(())
    }

    fn resolve(&self, file: &Path) -> PathBuf {
        match &self.base_dir {
            Some(dir) if file.is_relative() => dir.join(file),
            _ => file.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_defaults() {
        let item: ChainItem = serde_json::from_str(r#"{"sequence_file": "a.json"}"#).unwrap();
        assert_eq!(item, ChainItem::new("a.json"));
        assert!(item.validate().is_ok());
    }

    #[test]
    fn item_validation() {
        assert!(ChainItem::new("a.json").loops(0).validate().is_err());
        assert!(ChainItem::new("a.json").delay(f64::NAN).validate().is_err());
        assert!(ChainItem::new("a.json").delay(0.0).validate().is_ok());
    }

    #[test]
    fn chain_is_a_bare_array() {
        let chain = ChainConfig {
            items: vec![ChainItem::new("a.json")],
        };
        let v = serde_json::to_value(&chain).unwrap();
        assert!(v.is_array());
    }
}
