//! Block editing operations
//!
//! Pure, synchronous mutations over an ordered block list. Every operation
//! reports whether it changed anything so the editor session can track
//! unsaved changes.

use uuid::Uuid;

use super::block::{Block, BlockId, BlockKind, BlockPayload, FormatFlag, TextPayload};
use crate::api::{ListItem, RecordId};

/// Ordered blocks of one open note. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockList {
    blocks: Vec<Block>,
}

impl Default for BlockList {
    fn default() -> Self {
        Self::with_empty(BlockKind::Text)
    }
}

impl BlockList {
    /// Wrap blocks; an empty input becomes a single empty text block
    pub fn new(blocks: Vec<Block>) -> Self {
        let mut list = Self { blocks };
        list.ensure_not_empty();
        list
    }

    pub fn with_empty(kind: BlockKind) -> Self {
        Self {
            blocks: vec![Block::empty(kind)],
        }
    }

    fn ensure_not_empty(&mut self) {
        if self.blocks.is_empty() {
            self.blocks.push(Block::empty(BlockKind::Text));
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Block> {
        self.blocks.iter()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn position(&self, id: &BlockId) -> Option<usize> {
        self.blocks.iter().position(|b| &b.id == id)
    }

    pub fn get(&self, id: &BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| &b.id == id)
    }

    fn get_mut(&mut self, id: &BlockId) -> Option<&mut Block> {
        self.blocks.iter_mut().find(|b| &b.id == id)
    }

    /// Replace the payload of a block. No-op if the id is unknown.
    pub fn update_block(&mut self, id: &BlockId, payload: BlockPayload) -> bool {
        match self.get_mut(id) {
            Some(block) if block.payload != payload => {
                block.payload = payload;
                true
            }
            _ => false,
        }
    }

    /// Insert an empty block right after `after_index`, or append when the
    /// index is out of range
    pub fn insert_block(&mut self, kind: BlockKind, after_index: usize) -> BlockId {
        self.insert(Block::empty(kind), after_index)
    }

    fn insert(&mut self, block: Block, after_index: usize) -> BlockId {
        let id = block.id.clone();
        if after_index < self.blocks.len() {
            self.blocks.insert(after_index + 1, block);
        } else {
            self.blocks.push(block);
        }
        id
    }

    /// Append a block at the end
    pub fn push(&mut self, block: Block) -> BlockId {
        let id = block.id.clone();
        self.blocks.push(block);
        id
    }

    /// Remove a block. Removing the last one leaves an empty text block.
    pub fn remove_block(&mut self, id: &BlockId) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        self.blocks.remove(index);
        self.ensure_not_empty();
        true
    }

    /// Split the text block at `index` for an Enter keypress: it keeps
    /// `before`, and a new text block holding `remainder` with the same
    /// formatting is inserted right after it.
    pub fn split_text_block(
        &mut self,
        index: usize,
        before: impl Into<String>,
        remainder: impl Into<String>,
    ) -> Option<BlockId> {
        let block = self.blocks.get_mut(index)?;
        let BlockPayload::Text(text) = &mut block.payload else {
            return None;
        };

        text.text = before.into();
        let tail = Block::new(BlockPayload::Text(TextPayload {
            text: remainder.into(),
            format: text.format,
        }));
        Some(self.insert(tail, index))
    }

    /// Flip one formatting flag of a text block; other kinds are untouched
    pub fn toggle_formatting(&mut self, id: &BlockId, flag: FormatFlag) -> bool {
        match self.get_mut(id) {
            Some(Block {
                payload: BlockPayload::Text(text),
                ..
            }) => {
                text.format.toggle(flag);
                true
            }
            _ => false,
        }
    }

    fn checklist_mut(&mut self, id: &BlockId) -> Option<&mut Vec<ListItem>> {
        match self.get_mut(id) {
            Some(Block {
                payload: BlockPayload::Checklist(items),
                ..
            }) => Some(items),
            _ => None,
        }
    }

    /// Append an unchecked item to a checklist block
    pub fn add_checklist_item(&mut self, id: &BlockId, text: impl Into<String>) -> Option<RecordId> {
        let items = self.checklist_mut(id)?;
        let item_id = RecordId::Text(Uuid::new_v4().to_string());
        items.push(ListItem {
            id: item_id.clone(),
            text: text.into(),
            checked: false,
        });
        Some(item_id)
    }

    pub fn toggle_checklist_item(&mut self, id: &BlockId, item_id: &RecordId) -> bool {
        let Some(items) = self.checklist_mut(id) else {
            return false;
        };
        match items.iter_mut().find(|i| &i.id == item_id) {
            Some(item) => {
                item.checked = !item.checked;
                true
            }
            None => false,
        }
    }

    pub fn remove_checklist_item(&mut self, id: &BlockId, item_id: &RecordId) -> bool {
        let Some(items) = self.checklist_mut(id) else {
            return false;
        };
        let before = items.len();
        items.retain(|i| &i.id != item_id);
        items.len() != before
    }
}

impl<'a> IntoIterator for &'a BlockList {
    type Item = &'a Block;
    type IntoIter = std::slice::Iter<'a, Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}
