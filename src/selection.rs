//! Node selection state, mirrored into a Slint model for the renderer.

use std::collections::BTreeSet;

use slint::{Model, SharedString, VecModel};

use crate::model::NodeId;

/// Set of selected nodes.
///
/// Kept ordered so that model sync and multi-node operations see a stable order.
#[derive(Debug, Default, Clone)]
pub struct SelectionManager {
    selected: BTreeSet<NodeId>,
}

impl SelectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a click on a node body.
    ///
    /// Plain click selects only `id`; shift-click toggles `id` in or out.
    pub fn handle_interaction(&mut self, id: &NodeId, shift_held: bool) {
        if shift_held {
            if !self.selected.remove(id) {
                self.selected.insert(id.clone());
            }
        } else {
            if self.selected.len() == 1 && self.selected.contains(id) {
                return;
            }
            self.selected.clear();
            self.selected.insert(id.clone());
        }
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Select exactly `ids` (select-all, pasted copies).
    pub fn replace_selection<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = NodeId>,
    {
        self.selected.clear();
        self.selected.extend(ids);
    }

    /// Add ids without touching the rest of the selection (shift + box select).
    pub fn extend<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = NodeId>,
    {
        self.selected.extend(ids);
    }

    pub fn remove(&mut self, id: &NodeId) -> bool {
        self.selected.remove(id)
    }

    /// Drop ids for which `exists` returns false (e.g. after nodes were deleted).
    pub fn retain_existing<F>(&mut self, exists: F)
    where
        F: Fn(&NodeId) -> bool,
    {
        self.selected.retain(|id| exists(id));
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.selected.contains(id)
    }

    /// Selected node ids in id order.
    pub fn iter(&self) -> std::collections::btree_set::Iter<'_, NodeId> {
        self.selected.iter()
    }

    pub fn to_vec(&self) -> Vec<NodeId> {
        self.selected.iter().cloned().collect()
    }

    /// Overwrite `model` with the selected ids.
    pub fn sync_to_model(&self, model: &VecModel<SharedString>) {
        model.set_vec(
            self.selected
                .iter()
                .map(|id| SharedString::from(id.as_str()))
                .collect::<Vec<_>>(),
        );
    }

    /// Take the selection from a model edited on the UI side.
    pub fn sync_from_model(&mut self, model: &dyn Model<Data = SharedString>) {
        self.selected.clear();
        for i in 0..model.row_count() {
            if let Some(id) = model.row_data(i) {
                self.selected.insert(NodeId::new(id.as_str()));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}
