//! Table-of-contents derivation from a flat block list.

use serde::Serialize;

use super::blocks::ContentBlock;

/// Returned by [`min_level`] when there are no headings at all.
pub const NO_HEADINGS_LEVEL: u8 = 10;

/// Horizontal indentation step per heading level, in pixels.
pub const INDENT_STEP_PX: u32 = 16;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeadingEntry {
    pub id: String,
    pub level: u8,
    pub text: String,
}

impl HeadingEntry {
    /// Heading text without `**` emphasis markers.
    pub fn display_text(&self) -> String {
        self.text.replace("**", "")
    }
}

/// Anchor id for a heading: lowercased, each single space replaced by `-`.
///
/// Identical texts produce identical ids; nothing is de-duplicated here.
pub fn heading_anchor(text: &str) -> String {
    text.to_lowercase().split(' ').collect::<Vec<_>>().join("-")
}

/// Extract the heading outline of `blocks`, in document order.
pub fn build_table_of_contents(blocks: &[ContentBlock]) -> Vec<HeadingEntry> {
    blocks
        .iter()
        .filter_map(|block| {
            let level = block.kind.heading_level()?;
            let text = block.rich_text.first().cloned().unwrap_or_default();
            Some(HeadingEntry {
                id: heading_anchor(&text),
                level,
                text,
            })
        })
        .collect()
}

pub fn min_level(entries: &[HeadingEntry]) -> u8 {
    entries
        .iter()
        .map(|entry| entry.level)
        .min()
        .unwrap_or(NO_HEADINGS_LEVEL)
}

/// Relative indentation of an entry given the shallowest level present.
pub fn indent_px(level: u8, min_level: u8) -> u32 {
    u32::from(level.saturating_sub(min_level)) * INDENT_STEP_PX
}
