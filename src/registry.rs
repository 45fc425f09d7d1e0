use std::collections::HashMap;

use indexmap::IndexMap;

use crate::ir::ChartId;
use crate::label::OutLabel;

/// Labels of one chart keyed by sector index, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct LabelSet {
    labels: IndexMap<usize, OutLabel>,
}

impl LabelSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, label: OutLabel) -> Option<OutLabel> {
        self.labels.insert(label.index, label)
    }

    pub fn get(&self, index: usize) -> Option<&OutLabel> {
        self.labels.get(&index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut OutLabel> {
        self.labels.get_mut(&index)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.labels.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OutLabel> {
        self.labels.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut OutLabel> {
        self.labels.values_mut()
    }
}

/// Label sets of every chart a plugin instance serves.
///
/// Opening a session and clearing one are the same operation: the chart's
/// set is replaced by an empty one, dropping the old labels and their
/// tooltips.
#[derive(Debug, Default)]
pub struct ChartSessions {
    sets: HashMap<ChartId, LabelSet>,
}

impl ChartSessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_session(&mut self, id: &ChartId) {
        self.sets.insert(id.clone(), LabelSet::new());
    }

    pub fn clear(&mut self, id: &ChartId) {
        self.begin_session(id);
    }

    pub fn get(&self, id: &ChartId) -> Option<&LabelSet> {
        self.sets.get(id)
    }

    pub fn get_mut(&mut self, id: &ChartId) -> Option<&mut LabelSet> {
        self.sets.get_mut(id)
    }

    /// Store a label for a chart with an open session. Returns `false`
    /// (and drops the label) when the chart has none.
    pub fn put(&mut self, id: &ChartId, label: OutLabel) -> bool {
        match self.sets.get_mut(id) {
            Some(set) => {
                set.insert(label);
                true
            }
            None => false,
        }
    }

    /// Forget a chart entirely.
    pub fn remove(&mut self, id: &ChartId) -> Option<LabelSet> {
        self.sets.remove(id)
    }

    pub fn contains(&self, id: &ChartId) -> bool {
        self.sets.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}
