//! Index-driven positioning for the horizontal category bar.
//!
//! `active_index` is the only state. Column offsets and the visible window are
//! pure functions of the index, the card width and the viewport width, so the
//! layout can be tested without rendering anything.

use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryStrip {
    len: usize,
    active_index: usize,
    card_width: u16,
    gap: u16,
}

impl CategoryStrip {
    pub fn new(len: usize, card_width: u16, gap: u16) -> Self {
        Self {
            len,
            active_index: 0,
            card_width: card_width.max(1),
            gap,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
    pub fn active_index(&self) -> usize {
        self.active_index
    }
    pub fn card_width(&self) -> u16 {
        self.card_width
    }

    /// Replace the item count, clamping the selection.
    pub fn set_len(&mut self, len: usize) {
        self.len = len;
        self.active_index = self.active_index.min(len.saturating_sub(1));
    }

    pub fn select(&mut self, index: usize) {
        if self.len > 0 {
            self.active_index = index.min(self.len - 1);
        }
    }

    /// Unlike the banner carousel, the strip stops at both ends.
    pub fn next(&mut self) {
        if self.active_index + 1 < self.len {
            self.active_index += 1;
        }
    }

    pub fn prev(&mut self) {
        self.active_index = self.active_index.saturating_sub(1);
    }

    /// Horizontal offset of the card at `index`, in columns.
    pub fn offset_of(&self, index: usize) -> u32 {
        index as u32 * self.pitch()
    }

    /// How many whole cards fit in `viewport` columns (at least one).
    pub fn cards_per_view(&self, viewport: u16) -> usize {
        let fit = (viewport as u32 + self.gap as u32) / self.pitch();
        (fit as usize).max(1)
    }

    /// Scroll offset (columns) that keeps the active card in view, with the
    /// active card centred where possible.
    pub fn scroll_offset(&self, viewport: u16) -> u32 {
        self.offset_of(self.first_visible(viewport))
    }

    /// Indexes of the cards to draw for `viewport` columns.
    pub fn visible_range(&self, viewport: u16) -> Range<usize> {
        if self.len == 0 {
            return 0..0;
        }
        let first = self.first_visible(viewport);
        let last = (first + self.cards_per_view(viewport)).min(self.len);
        first..last
    }

    fn pitch(&self) -> u32 {
        self.card_width as u32 + self.gap as u32
    }

    fn first_visible(&self, viewport: u16) -> usize {
        let per_view = self.cards_per_view(viewport);
        if self.len <= per_view {
            return 0;
        }
        let max_first = self.len - per_view;
        self.active_index.saturating_sub(per_view / 2).min(max_first)
    }
}
