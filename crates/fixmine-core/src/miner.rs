/*!
# Miner

The producer side of the pipeline: classifies every edit of every diff,
specializes the result when enabled, and publishes the records to the
fan-out.
*/

use tracing::{debug, info};

use crate::ast::FileDiff;
use crate::classifier::ClassifierChain;
use crate::pipeline::{ConsumerReport, FanOut, PipelineError};
use crate::rules::ClassifiedRecord;
use crate::source::DatasetCrawler;
use crate::specialize::Specialization;
use crate::{MinerError, Result};

/// Counters for one diff, or summed over many
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MineStats {
    pub edits: u64,
    pub unmatched: u64,
    pub records: u64,
    pub specialized: u64,
}

impl MineStats {
    pub fn merge(&mut self, other: MineStats) {
        self.edits += other.edits;
        self.unmatched += other.unmatched;
        self.records += other.records;
        self.specialized += other.specialized;
    }
}

/// Outcome of a whole run
#[derive(Debug, Clone, Default)]
pub struct MineSummary {
    pub projects: u64,
    pub files: u64,
    pub stats: MineStats,
    pub consumers: Vec<ConsumerReport>,
}

pub struct Miner {
    chain: ClassifierChain,
    specialization: Option<Specialization>,
    fanout: FanOut,
}

impl Miner {
    /// A miner with the standard chain and specialization enabled
    pub fn new(fanout: FanOut) -> Self {
        Self {
            chain: ClassifierChain::standard(),
            specialization: Some(Specialization::new()),
            fanout,
        }
    }

    pub fn with_chain(mut self, chain: ClassifierChain) -> Self {
        self.chain = chain;
        self
    }

    /// Enable or disable the specialized tier
    pub fn specialize(mut self, enabled: bool) -> Self {
        self.specialization = enabled.then(Specialization::new);
        self
    }

    /// Classify one diff and publish its records. A specialized record is
    /// published right after the base record it was derived from.
    pub fn mine_diff(&self, project: &str, diff: &FileDiff) -> Result<MineStats> {
        let mut stats = MineStats::default();

        for edit in diff.edits() {
            stats.edits += 1;
            let Some(rule) = self.chain.classify(&edit) else {
                stats.unmatched += 1;
                continue;
            };

            let specialized = self.specialization.as_ref().and_then(|s| s.specialize(&rule));
            self.fanout.publish(&ClassifiedRecord::new(rule, project))?;
            stats.records += 1;

            if let Some(rule) = specialized {
                self.fanout.publish(&ClassifiedRecord::new(rule, project))?;
                stats.records += 1;
                stats.specialized += 1;
            }
        }

        debug!(
            project,
            file = %diff.path.display(),
            edits = stats.edits,
            records = stats.records,
            "diff mined"
        );
        Ok(stats)
    }

    /// Mine every project the crawler finds, in project order
    pub fn mine_dataset(&self, crawler: &DatasetCrawler) -> Result<MineSummary> {
        let mut summary = MineSummary::default();

        for project in crawler.projects()? {
            let diffs = crawler.diffs(&project)?;
            info!(project = %project.id, files = diffs.len(), "mining project");
            for diff in &diffs {
                summary.stats.merge(self.mine_diff(&project.id, diff)?);
                summary.files += 1;
            }
            summary.projects += 1;
        }

        Ok(summary)
    }

    /// Shut every consumer down and wait for it to finish
    pub fn finish(self) -> Result<Vec<ConsumerReport>> {
        Ok(self.fanout.shutdown()?)
    }

    /// Mine the dataset, then shut the pipeline down. The pipeline is shut
    /// down even when mining fails, so consumers that are still healthy
    /// finalize their output. When mining stopped because a consumer died,
    /// that consumer's own error is returned.
    pub fn run(self, crawler: &DatasetCrawler) -> Result<MineSummary> {
        let mined = self.mine_dataset(crawler);
        let finished = self.finish();

        let summary = match (mined, finished) {
            (Ok(summary), Ok(consumers)) => MineSummary { consumers, ..summary },
            (Err(MinerError::Pipeline(PipelineError::ConsumerDisconnected { .. })), Err(cause)) => return Err(cause),
            (Err(e), _) | (Ok(_), Err(e)) => return Err(e),
        };
        info!(
            projects = summary.projects,
            files = summary.files,
            edits = summary.stats.edits,
            records = summary.stats.records,
            "mining complete"
        );
        Ok(summary)
    }
}
