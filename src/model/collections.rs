use crate::{
    foundation::error::{StorysheetError, StorysheetResult},
    model::items::{PropItem, SourceId, SourceImage, SourceRef, StoryboardFrame, StyleItem},
};

/// Ordered storyboard panels.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Storyboard {
    frames: Vec<StoryboardFrame>,
}

impl Storyboard {
    /// Empty storyboard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a frame after the current last one (`order = max + 1`, or `0` when empty).
    pub fn add_frame(&mut self, source: SourceRef) -> SourceId {
        let order = self
            .frames
            .iter()
            .map(|f| f.order)
            .max()
            .map_or(0, |m| m.saturating_add(1));
        self.insert_frame_with_order(source, order)
    }

    /// Insert a frame with an explicit sort key.
    pub fn insert_frame_with_order(&mut self, source: SourceRef, order: i64) -> SourceId {
        let image = SourceImage::new(source);
        let id = image.id;
        self.frames.push(StoryboardFrame { image, order });
        id
    }

    /// Replace the pixels of an existing frame, keeping its identity and order.
    pub fn repaint(&mut self, id: SourceId, source: SourceRef) -> StorysheetResult<()> {
        let frame = self
            .frames
            .iter_mut()
            .find(|f| f.image.id == id)
            .ok_or_else(|| unknown(id))?;
        frame.image.source = source;
        Ok(())
    }

    /// Remove a frame; returns it if present.
    pub fn remove(&mut self, id: SourceId) -> Option<StoryboardFrame> {
        let pos = self.frames.iter().position(|f| f.image.id == id)?;
        Some(self.frames.remove(pos))
    }

    /// Swap `order` with the neighbour `delta` steps away in sorted sequence.
    ///
    /// Moving past either end is a no-op. Returns whether anything moved.
    pub fn move_frame(&mut self, id: SourceId, delta: isize) -> StorysheetResult<bool> {
        let sorted: Vec<usize> = self.sorted_indices();
        let here = sorted
            .iter()
            .position(|&i| self.frames[i].image.id == id)
            .ok_or_else(|| unknown(id))?;
        let Some(there) = here.checked_add_signed(delta).filter(|&t| t < sorted.len()) else {
            return Ok(false);
        };
        if here == there {
            return Ok(false);
        }

        let (a, b) = (sorted[here], sorted[there]);
        let (oa, ob) = (self.frames[a].order, self.frames[b].order);
        if oa == ob {
            // Equal keys sort by insertion position; swap entries to swap sequence.
            self.frames.swap(a, b);
        } else {
            self.frames[a].order = ob;
            self.frames[b].order = oa;
        }
        Ok(true)
    }

    /// Drop every frame.
    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// Frames in insertion order.
    pub fn frames(&self) -> &[StoryboardFrame] {
        &self.frames
    }

    /// Frames in compositing order: stable ascending sort by `order`.
    pub fn sequenced(&self) -> Vec<&StoryboardFrame> {
        self.sorted_indices()
            .into_iter()
            .map(|i| &self.frames[i])
            .collect()
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether there are no frames.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    fn sorted_indices(&self) -> Vec<usize> {
        let mut idx: Vec<usize> = (0..self.frames.len()).collect();
        idx.sort_by_key(|&i| self.frames[i].order);
        idx
    }
}

impl FromIterator<StoryboardFrame> for Storyboard {
    fn from_iter<T: IntoIterator<Item = StoryboardFrame>>(iter: T) -> Self {
        Self {
            frames: iter.into_iter().collect(),
        }
    }
}

/// Prop references in collection order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PropSheet {
    items: Vec<PropItem>,
}

impl PropSheet {
    /// Empty sheet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a prop.
    pub fn add(&mut self, source: SourceRef, description: impl Into<String>) -> SourceId {
        let image = SourceImage::new(source);
        let id = image.id;
        self.items.push(PropItem {
            image,
            description: description.into(),
        });
        id
    }

    /// Remove a prop; returns it if present.
    pub fn remove(&mut self, id: SourceId) -> Option<PropItem> {
        let pos = self.items.iter().position(|p| p.image.id == id)?;
        Some(self.items.remove(pos))
    }

    /// Drop every prop.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Props in collection order.
    pub fn items(&self) -> &[PropItem] {
        &self.items
    }

    /// Non-empty descriptions, in order, for prompt enhancement.
    pub fn descriptions(&self) -> Vec<String> {
        self.items
            .iter()
            .map(|p| p.description.trim())
            .filter(|d| !d.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Number of props.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether there are no props.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FromIterator<PropItem> for PropSheet {
    fn from_iter<T: IntoIterator<Item = PropItem>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

/// Style references in collection order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StyleBoard {
    items: Vec<StyleItem>,
}

impl StyleBoard {
    /// Empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a style image.
    pub fn add(&mut self, source: SourceRef) -> SourceId {
        let image = SourceImage::new(source);
        let id = image.id;
        self.items.push(StyleItem { image });
        id
    }

    /// Remove a style image; returns it if present.
    pub fn remove(&mut self, id: SourceId) -> Option<StyleItem> {
        let pos = self.items.iter().position(|s| s.image.id == id)?;
        Some(self.items.remove(pos))
    }

    /// Drop every style image.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Style images in collection order.
    pub fn items(&self) -> &[StyleItem] {
        &self.items
    }

    /// Number of style images.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether there are no style images.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FromIterator<StyleItem> for StyleBoard {
    fn from_iter<T: IntoIterator<Item = StyleItem>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

/// The three source collections a pipeline run consumes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Collections {
    /// Storyboard panels.
    pub storyboard: Storyboard,
    /// Prop references.
    pub props: PropSheet,
    /// Style references.
    pub styles: StyleBoard,
}

fn unknown(id: SourceId) -> StorysheetError {
    StorysheetError::validation(format!("unknown source id {}", id.as_u64()))
}

#[cfg(test)]
#[path = "../../tests/unit/model/collections.rs"]
mod tests;
