//! Reconciliation of live experiments against a declarative spec

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::domain::experiment::{ExperimentMetadata, ExperimentName, ExperimentStore, SyncSpec};
use crate::domain::DomainError;

/// Choice changes applied to one experiment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChoiceChanges {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl ChoiceChanges {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Everything a sync changed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub dearchived: Vec<String>,
    pub created: Vec<String>,
    pub archived: Vec<String>,
    /// Per-experiment choice diffs, including choices of created experiments
    pub choices: BTreeMap<String, ChoiceChanges>,
}

impl SyncReport {
    /// True when the store already matched the spec
    pub fn is_noop(&self) -> bool {
        self.dearchived.is_empty()
            && self.created.is_empty()
            && self.archived.is_empty()
            && self.choices.values().all(ChoiceChanges::is_empty)
    }

    fn record_added(&mut self, experiment: &ExperimentName, choice: &str) {
        self.choices
            .entry(experiment.to_string())
            .or_default()
            .added
            .push(choice.to_string());
    }

    fn record_removed(&mut self, experiment: &ExperimentName, choice: &str) {
        self.choices
            .entry(experiment.to_string())
            .or_default()
            .removed
            .push(choice.to_string());
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_noop() {
            return writeln!(f, "Experiments already in sync");
        }

        for name in &self.dearchived {
            writeln!(f, "De-archived experiment {}", name)?;
        }

        for name in &self.created {
            writeln!(f, "Created experiment {}", name)?;
        }

        for (name, changes) in &self.choices {
            for choice in &changes.added {
                writeln!(f, "Added choice {} to experiment {}", choice, name)?;
            }

            for choice in &changes.removed {
                writeln!(f, "Removed choice {} from experiment {}", choice, name)?;
            }
        }

        for name in &self.archived {
            writeln!(f, "Archived experiment {}", name)?;
        }

        Ok(())
    }
}

/// Converges the active experiment set and choice lists to a `SyncSpec`
///
/// Nothing is ever deleted: experiments missing from the spec are archived and
/// counters of removed choices are left in place.
#[derive(Debug)]
pub struct SyncService<E: ExperimentStore> {
    store: Arc<E>,
}

impl<E: ExperimentStore> SyncService<E> {
    pub fn new(store: Arc<E>) -> Self {
        Self { store }
    }

    pub async fn sync_from_spec(&self, spec: &SyncSpec) -> Result<SyncReport, DomainError> {
        let mut report = SyncReport::default();

        let mut active = self.store.list_experiments(true).await?;
        let archived = self.store.list_experiments(false).await?;

        for name in spec.names() {
            if archived.contains(name) && !active.contains(name) {
                info!(experiment = %name, "De-archiving experiment");
                self.store.unarchive(name).await?;
                report.dearchived.push(name.to_string());
            }
        }

        if !report.dearchived.is_empty() {
            active = self.store.list_experiments(true).await?;
        }

        for (name, choices) in spec.iter() {
            if active.contains(name) {
                continue;
            }

            info!(experiment = %name, "Creating experiment");
            self.store.add(name, &ExperimentMetadata::now()).await?;
            report.created.push(name.to_string());

            for choice in choices {
                info!(experiment = %name, choice = %choice, "Adding choice");
                self.store.add_choice(name, choice).await?;
                report.record_added(name, choice);
            }
        }

        for name in &active {
            if spec.contains(name) {
                continue;
            }

            info!(experiment = %name, "Archiving experiment");
            self.store.archive(name).await?;
            report.archived.push(name.to_string());
        }

        for name in active.iter().filter(|name| spec.contains(name)) {
            let desired = spec.choices(name).unwrap_or_default();
            self.sync_choices(name, desired, &mut report).await?;
        }

        info!(
            dearchived = report.dearchived.len(),
            created = report.created.len(),
            archived = report.archived.len(),
            "Experiments synced"
        );

        Ok(report)
    }

    async fn sync_choices(
        &self,
        name: &ExperimentName,
        desired: &[String],
        report: &mut SyncReport,
    ) -> Result<(), DomainError> {
        let current = self.store.get_choices(name).await?;
        let current_set: HashSet<&str> = current.iter().map(String::as_str).collect();
        let desired_set: HashSet<&str> = desired.iter().map(String::as_str).collect();

        for choice in desired {
            if !current_set.contains(choice.as_str()) {
                info!(experiment = %name, choice = %choice, "Adding choice");
                self.store.add_choice(name, choice).await?;
                report.record_added(name, choice);
            }
        }

        for choice in &current {
            if !desired_set.contains(choice.as_str()) {
                info!(experiment = %name, choice = %choice, "Removing choice");
                self.store.remove_choice(name, choice).await?;
                report.record_removed(name, choice);
            }
        }

        Ok(())
    }
}
