/*!
# Statistics Renderer

Counts occurrences and distinct projects per rule identifier and writes two
summary tables on shutdown:

- `out-general.csv`: `ruleId,occurrenceCount`
- `out-projects.csv`: `ruleId,distinctProjectCount`

Both tables share one row order: occurrences descending, ties in the order
the rule was first seen.
*/

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::info;

use super::Consumer;
use crate::rules::ClassifiedRecord;

pub const GENERAL_TABLE: &str = "out-general.csv";
pub const PROJECTS_TABLE: &str = "out-projects.csv";

/// Running totals for one rule identifier
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateEntry {
    pub occurrences: u64,
    pub projects: HashSet<String>,
}

/// Consumer aggregating the record stream. The map is only ever touched by
/// the consumer's own worker thread.
pub struct StatisticsRenderer {
    output_dir: PathBuf,
    aggregates: IndexMap<String, AggregateEntry>,
}

impl StatisticsRenderer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            aggregates: IndexMap::new(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn record(&mut self, record: &ClassifiedRecord) {
        let entry = self.aggregates.entry(record.rule.id().to_string()).or_default();
        entry.occurrences += 1;
        if !entry.projects.contains(&record.project) {
            entry.projects.insert(record.project.clone());
        }
    }

    /// Aggregates sorted by occurrences, highest first
    pub fn rows(&self) -> Vec<(&str, &AggregateEntry)> {
        let mut rows: Vec<_> = self
            .aggregates
            .iter()
            .map(|(rule, entry)| (rule.as_str(), entry))
            .collect();
        // Stable sort keeps first-seen order among equal counts.
        rows.sort_by(|a, b| b.1.occurrences.cmp(&a.1.occurrences));
        rows
    }

    /// Write both tables into the output directory
    pub fn write_tables(&self) -> io::Result<()> {
        fs::create_dir_all(&self.output_dir)?;
        let rows = self.rows();

        let mut general = BufWriter::new(File::create(self.output_dir.join(GENERAL_TABLE))?);
        let mut projects = BufWriter::new(File::create(self.output_dir.join(PROJECTS_TABLE))?);
        for (rule, entry) in &rows {
            writeln!(general, "{rule},{}", entry.occurrences)?;
            writeln!(projects, "{rule},{}", entry.projects.len())?;
        }
        general.flush()?;
        projects.flush()?;

        info!(
            rules = rows.len(),
            dir = %self.output_dir.display(),
            "summary tables written"
        );
        Ok(())
    }
}

impl Consumer for StatisticsRenderer {
    fn name(&self) -> &str {
        "statistics"
    }

    fn consume(&mut self, record: ClassifiedRecord) -> anyhow::Result<()> {
        self.record(&record);
        Ok(())
    }

    fn cleanup(&mut self) -> anyhow::Result<()> {
        self.write_tables()?;
        Ok(())
    }
}
