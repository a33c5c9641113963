//! Ordered content blocks of a page.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockKind {
    Heading1,
    Heading2,
    Heading3,
    Paragraph,
    Code { language: Option<String> },
    BulletedListItem,
    NumberedListItem,
    ToDo,
    Toggle,
    Quote,
    Callout,
    Divider,
    Image,
    Other { name: String },
}

impl BlockKind {
    /// Map a wire type name (`heading_1`, `paragraph`, ...) to a block kind.
    pub fn from_type_name(name: &str, language: Option<String>) -> Self {
        match name {
            "heading_1" => BlockKind::Heading1,
            "heading_2" => BlockKind::Heading2,
            "heading_3" => BlockKind::Heading3,
            "paragraph" => BlockKind::Paragraph,
            "code" => BlockKind::Code { language },
            "bulleted_list_item" => BlockKind::BulletedListItem,
            "numbered_list_item" => BlockKind::NumberedListItem,
            "to_do" => BlockKind::ToDo,
            "toggle" => BlockKind::Toggle,
            "quote" => BlockKind::Quote,
            "callout" => BlockKind::Callout,
            "divider" => BlockKind::Divider,
            "image" => BlockKind::Image,
            other => BlockKind::Other {
                name: other.to_string(),
            },
        }
    }

    /// Heading level for heading blocks.
    pub fn heading_level(&self) -> Option<u8> {
        match self {
            BlockKind::Heading1 => Some(1),
            BlockKind::Heading2 => Some(2),
            BlockKind::Heading3 => Some(3),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentBlock {
    pub id: String,
    pub kind: BlockKind,
    /// Plain text of each rich-text run, in order.
    pub rich_text: Vec<String>,
    pub has_children: bool,
}

impl ContentBlock {
    pub fn new(id: impl Into<String>, kind: BlockKind, rich_text: Vec<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            rich_text,
            has_children: false,
        }
    }

    pub fn heading(id: impl Into<String>, level: u8, text: &str) -> Self {
        let kind = match level {
            1 => BlockKind::Heading1,
            2 => BlockKind::Heading2,
            _ => BlockKind::Heading3,
        };
        Self::new(id, kind, vec![text.to_string()])
    }

    pub fn paragraph(id: impl Into<String>, text: &str) -> Self {
        Self::new(id, BlockKind::Paragraph, vec![text.to_string()])
    }

    /// Runs joined with single spaces; empty for blocks without rich text.
    pub fn plain_text(&self) -> String {
        self.rich_text.join(" ")
    }
}

/// Concatenate the rich text of every block into one body used for word counts.
pub fn body_text(blocks: &[ContentBlock]) -> String {
    blocks
        .iter()
        .map(ContentBlock::plain_text)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_types_are_preserved() {
        let kind = BlockKind::from_type_name("synced_block", None);
        assert_eq!(
            kind,
            BlockKind::Other {
                name: "synced_block".to_string()
            }
        );
        assert_eq!(kind.heading_level(), None);
    }

    #[test]
    fn body_text_joins_runs_and_blocks() {
        let blocks = vec![
            ContentBlock::new(
                "a",
                BlockKind::Paragraph,
                vec!["Hello".to_string(), "world".to_string()],
            ),
            ContentBlock::new("b", BlockKind::Divider, Vec::new()),
            ContentBlock::paragraph("c", "again"),
        ];
        assert_eq!(body_text(&blocks), "Hello world  again");
    }
}
