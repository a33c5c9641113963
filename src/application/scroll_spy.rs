//! Table-of-contents scroll spy as a pure state machine.
//!
//! The rendering surface reports heading visibility as batches of
//! [`VisibilityEvent`]s and exposes geometry through [`ViewportAdapter`].
//! Within one batch the last intersecting heading wins, so the result depends
//! on the order the platform reports entries in, not on page position.

use serde::Serialize;

/// Margin applied to the observed viewport: the lower half is ignored.
pub const ROOT_MARGIN: &str = "0px 0px -50% 0px";
/// Fraction of a heading that must be visible to count as intersecting.
pub const THRESHOLD: f64 = 0.4;
/// Height of the fixed page header.
pub const HEADER_OFFSET_PX: f64 = 66.0;
/// Gap kept between the active link and the table-of-contents edge.
pub const TOC_REVEAL_OFFSET_PX: f64 = 25.0;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", content = "id", rename_all = "snake_case")]
pub enum SpyState {
    #[default]
    Idle,
    Active(String),
}

impl SpyState {
    pub fn active_id(&self) -> Option<&str> {
        match self {
            SpyState::Idle => None,
            SpyState::Active(id) => Some(id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibilityEvent {
    pub id: String,
    pub is_intersecting: bool,
}

impl VisibilityEvent {
    pub fn new(id: impl Into<String>, is_intersecting: bool) -> Self {
        Self {
            id: id.into(),
            is_intersecting,
        }
    }
}

/// Platform side of the scroll spy.
pub trait ViewportAdapter {
    /// Top of the element relative to the viewport, if it exists.
    fn element_top(&self, id: &str) -> Option<f64>;
    fn scroll_y(&self) -> f64;
    /// Start a smooth scroll of the window; does not wait for it to finish.
    fn smooth_scroll_to(&mut self, top: f64);
    fn focus(&mut self, id: &str);
}

#[derive(Debug, Clone, Default)]
pub struct ScrollSpyController {
    headings: Vec<String>,
    state: SpyState,
}

impl ScrollSpyController {
    pub fn new<I, S>(heading_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headings: heading_ids.into_iter().map(Into::into).collect(),
            state: SpyState::Idle,
        }
    }

    pub fn state(&self) -> &SpyState {
        &self.state
    }

    /// Apply one batch of observations. Events for unknown ids and
    /// non-intersecting events leave the state untouched.
    pub fn handle_batch(&mut self, events: &[VisibilityEvent]) -> &SpyState {
        for event in events {
            if event.is_intersecting && self.headings.iter().any(|id| *id == event.id) {
                self.state = SpyState::Active(event.id.clone());
            }
        }
        &self.state
    }

    /// Scroll the window so heading `id` sits below the fixed header, then
    /// focus it. Returns the target offset, or `None` if the element is missing.
    pub fn scroll_to(&self, id: &str, viewport: &mut dyn ViewportAdapter) -> Option<f64> {
        let top = viewport.element_top(id)? + viewport.scroll_y() - HEADER_OFFSET_PX;
        viewport.smooth_scroll_to(top);
        viewport.focus(id);
        Some(top)
    }
}

/// Geometry of the table-of-contents container and its active link, with
/// the link top measured from the container's top.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TocGeometry {
    pub container_scroll_top: f64,
    pub container_height: f64,
    pub link_top: f64,
    pub link_height: f64,
}

impl TocGeometry {
    pub fn link_fully_visible(&self) -> bool {
        let bottom = self.container_scroll_top + self.container_height;
        self.link_top >= self.container_scroll_top && self.link_top + self.link_height <= bottom
    }
}

/// Keeps the active table-of-contents link inside its scrolling container.
#[derive(Debug, Clone, Default)]
pub struct TocAutoScroll {
    last_window_scroll_y: f64,
}

impl TocAutoScroll {
    /// Container scroll target for the active link, or `None` when it is
    /// already fully visible. Records `window_scroll_y` either way.
    pub fn reveal_active_link(&mut self, geometry: TocGeometry, window_scroll_y: f64) -> Option<f64> {
        let scrolling_up = self.last_window_scroll_y > window_scroll_y;
        self.last_window_scroll_y = window_scroll_y;

        if geometry.link_fully_visible() {
            return None;
        }

        Some(if scrolling_up {
            geometry.link_top - geometry.container_height + TOC_REVEAL_OFFSET_PX
        } else {
            geometry.link_top - TOC_REVEAL_OFFSET_PX
        })
    }
}
