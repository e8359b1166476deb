//! Text anchors.
//!
//! An anchor marks a position in the document and follows the text around it as the document
//! changes. Anchors live inside the document; callers hold a copyable [`AnchorId`].

use crate::change::{AnchorMovementType, DocumentChange};

/// Handle to an anchor created by [`crate::TextDocument::create_anchor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnchorId {
    index: usize,
    generation: u32,
}

/// A position that moves with the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextAnchor {
    offset: usize,
    movement: AnchorMovementType,
    survive_deletion: bool,
    deleted: bool,
}

impl TextAnchor {
    /// Current offset. For a deleted anchor, the offset it had when it was deleted.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// How the anchor moves when text is inserted exactly at its position.
    pub fn movement(&self) -> AnchorMovementType {
        self.movement
    }

    /// Whether the anchor survives the deletion of the text around it.
    pub fn survives_deletion(&self) -> bool {
        self.survive_deletion
    }

    /// Returns `true` once a removal covered the anchor (and it did not survive it).
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    fn apply_change(&mut self, change: &DocumentChange) {
        if self.deleted {
            return;
        }
        if !self.survive_deletion && change.removes_offset(self.offset) {
            self.deleted = true;
            return;
        }
        self.offset = change.new_offset(self.offset, self.movement);
    }
}

#[derive(Debug, Clone)]
struct AnchorSlot {
    generation: u32,
    anchor: Option<TextAnchor>,
}

/// Slab of anchors owned by a document.
#[derive(Debug, Clone, Default)]
pub(crate) struct AnchorSet {
    slots: Vec<AnchorSlot>,
    free: Vec<usize>,
}

impl AnchorSet {
    pub(crate) fn create(
        &mut self,
        offset: usize,
        movement: AnchorMovementType,
        survive_deletion: bool,
    ) -> AnchorId {
        let anchor = TextAnchor {
            offset,
            movement,
            survive_deletion,
            deleted: false,
        };
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.anchor = Some(anchor);
                AnchorId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                self.slots.push(AnchorSlot {
                    generation: 0,
                    anchor: Some(anchor),
                });
                AnchorId {
                    index: self.slots.len() - 1,
                    generation: 0,
                }
            }
        }
    }

    pub(crate) fn get(&self, id: AnchorId) -> Option<&TextAnchor> {
        let slot = self.slots.get(id.index)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.anchor.as_ref()
    }

    pub(crate) fn release(&mut self, id: AnchorId) -> bool {
        let Some(slot) = self.slots.get_mut(id.index) else {
            return false;
        };
        if slot.generation != id.generation || slot.anchor.is_none() {
            return false;
        }
        slot.anchor = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        true
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub(crate) fn apply_change(&mut self, change: &DocumentChange) {
        for anchor in self.slots.iter_mut().filter_map(|slot| slot.anchor.as_mut()) {
            anchor.apply_change(change);
        }
    }
}
