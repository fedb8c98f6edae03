use crate::{
    foundation::error::LenticularResult,
    history::item::HistoryItem,
    model::project::{Project, ResourceId},
};

const MIB: u64 = 1024 * 1024;

/// Limits of the undo log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct HistoryConfig {
    /// Eviction starts once the gauge reports more than this.
    #[serde(default = "default_ceiling_bytes")]
    pub ceiling_bytes: u64,
    /// Entries always kept regardless of the ceiling.
    #[serde(default = "default_floor")]
    pub floor: usize,
}

fn default_ceiling_bytes() -> u64 {
    1000 * MIB
}

fn default_floor() -> usize {
    10
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            ceiling_bytes: default_ceiling_bytes(),
            floor: default_floor(),
        }
    }
}

/// Measures memory attributed to the undo log.
pub trait MemoryGauge: Send + Sync {
    fn used_bytes(&self, entries: &[HistoryItem]) -> u64;
}

/// Sums [`HistoryItem::footprint_bytes`] over the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogFootprint;

impl MemoryGauge for LogFootprint {
    fn used_bytes(&self, entries: &[HistoryItem]) -> u64 {
        entries.iter().map(HistoryItem::footprint_bytes).sum()
    }
}

/// Linear undo log with a movable pointer.
///
/// `cursor` counts applied entries: `entries[..cursor]` can be undone, `entries[cursor..]`
/// redone. Appending drops the redo part.
pub struct History {
    entries: Vec<HistoryItem>,
    cursor: usize,
    config: HistoryConfig,
    gauge: Box<dyn MemoryGauge>,
}

impl std::fmt::Debug for History {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("History")
            .field("entries", &self.entries.len())
            .field("cursor", &self.cursor)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}

impl History {
    pub fn new(config: HistoryConfig) -> Self {
        Self::with_gauge(config, Box::new(LogFootprint))
    }

    pub fn with_gauge(config: HistoryConfig, gauge: Box<dyn MemoryGauge>) -> Self {
        Self {
            entries: Vec::new(),
            cursor: 0,
            config,
            gauge,
        }
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    pub fn entries(&self) -> &[HistoryItem] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the most recently applied entry, `None` before the first.
    pub fn pointer(&self) -> Option<usize> {
        self.cursor.checked_sub(1)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.entries.len()
    }

    /// Record an edit that has already been applied to `project`.
    pub fn append(&mut self, project: &mut Project, item: HistoryItem) {
        if self.cursor < self.entries.len() {
            let dropped: Vec<HistoryItem> = self.entries.drain(self.cursor..).collect();
            tracing::debug!(dropped = dropped.len(), "redo branch pruned");
            self.dispose(project, &dropped);
        }
        self.entries.push(item);
        self.cursor = self.entries.len();
        self.enforce_budget(project);
    }

    /// Undo the entry at the pointer. `Ok(false)` when there is nothing to undo.
    pub fn undo(&mut self, project: &mut Project) -> LenticularResult<bool> {
        if self.cursor == 0 {
            return Ok(false);
        }
        self.entries[self.cursor - 1].apply_undo(project)?;
        self.cursor -= 1;
        Ok(true)
    }

    /// Redo the entry after the pointer. `Ok(false)` when there is nothing to redo.
    pub fn redo(&mut self, project: &mut Project) -> LenticularResult<bool> {
        if self.cursor == self.entries.len() {
            return Ok(false);
        }
        self.entries[self.cursor].apply_redo(project)?;
        self.cursor += 1;
        Ok(true)
    }

    /// Forget every entry, releasing what they pin.
    pub fn clear(&mut self, project: &mut Project) {
        let dropped = std::mem::take(&mut self.entries);
        self.cursor = 0;
        self.dispose(project, &dropped);
    }

    fn enforce_budget(&mut self, project: &mut Project) {
        let mut evicted = Vec::new();
        while self.entries.len() > self.config.floor
            && self.cursor > 0
            && self.gauge.used_bytes(&self.entries) > self.config.ceiling_bytes
        {
            evicted.push(self.entries.remove(0));
            self.cursor -= 1;
        }
        if !evicted.is_empty() {
            tracing::debug!(
                evicted = evicted.len(),
                remaining = self.entries.len(),
                "history over budget, oldest entries evicted"
            );
            self.dispose(project, &evicted);
        }
    }

    /// Purge resources that only the dropped entries kept alive.
    fn dispose(&self, project: &mut Project, dropped: &[HistoryItem]) {
        let mut pinned: Vec<ResourceId> = Vec::new();
        for item in dropped {
            item.pinned_resources(&mut pinned);
        }
        pinned.sort_unstable();
        pinned.dedup();
        for id in pinned {
            if self.entries.iter().any(|e| e.pins_resource(id)) {
                continue;
            }
            if project.purge_resource(id) {
                tracing::debug!(resource = id.0, "resource released");
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/history/engine.rs"]
mod tests;
