//! Region selection state machine
//!
//! `Empty -> Dragging -> Finalized`. Finalized is terminal for the session.

use super::geometry::{Point, Rect};

/// Current state of the region selection
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    #[default]
    Empty,
    /// Pointer held down; `rect` is re-normalized on every move
    Dragging { anchor: Point, rect: Rect },
    /// Selection locked in for toolbar placement and export
    Finalized(Rect),
}

/// Outcome of releasing the pointer while dragging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionRelease {
    /// Selection locked in; the toolbar should be shown
    Finalized(Rect),
    /// Degenerate drag with no hover window: back to Empty
    Discarded,
    /// Not dragging, nothing happened
    Ignored,
}

/// Source of window rectangles for hover auto-selection
pub trait WindowLocator {
    /// Rectangle of the top-level window under `point`, if any
    fn window_rect_at(&self, point: Point) -> Option<Rect>;
}

/// Drives the "pick a rectangular region" interaction
#[derive(Debug, Clone, Default)]
pub struct SelectionController {
    state: SelectionState,
    hover: Option<Rect>,
    /// Finalized selections are clipped to these bounds
    bounds: Option<Rect>,
}

impl SelectionController {
    /// Controller whose final selection is clipped to `bounds`
    pub fn new(bounds: Rect) -> Self {
        Self {
            state: SelectionState::Empty,
            hover: None,
            bounds: Some(bounds),
        }
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    /// Cached rectangle of the window under the pointer
    pub fn hover(&self) -> Option<Rect> {
        self.hover
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, SelectionState::Dragging { .. })
    }

    pub fn is_finalized(&self) -> bool {
        matches!(self.state, SelectionState::Finalized(_))
    }

    /// The rectangle to draw: the live drag rectangle or the final one
    pub fn rect(&self) -> Option<Rect> {
        match self.state {
            SelectionState::Empty => None,
            SelectionState::Dragging { rect, .. } => Some(rect),
            SelectionState::Finalized(rect) => Some(rect),
        }
    }

    pub fn finalized(&self) -> Option<Rect> {
        match self.state {
            SelectionState::Finalized(rect) => Some(rect),
            _ => None,
        }
    }

    /// Start dragging; returns false unless the controller was Empty
    pub fn pointer_down(&mut self, point: Point) -> bool {
        if self.state != SelectionState::Empty {
            return false;
        }
        self.state = SelectionState::Dragging {
            anchor: point,
            rect: Rect::at(point),
        };
        true
    }

    /// Update the drag rectangle; returns true when the state changed
    pub fn pointer_move(&mut self, point: Point) -> bool {
        match &mut self.state {
            SelectionState::Dragging { anchor, rect } => {
                let next = Rect::from_points(*anchor, point);
                let changed = next != *rect;
                *rect = next;
                changed
            }
            _ => false,
        }
    }

    /// Finish the drag, falling back to the hover rectangle when degenerate
    pub fn pointer_up(&mut self, point: Point) -> SelectionRelease {
        let SelectionState::Dragging { anchor, .. } = self.state else {
            return SelectionRelease::Ignored;
        };

        let dragged = Rect::from_points(anchor, point);
        let candidate = if dragged.is_empty() {
            self.hover
        } else {
            Some(dragged)
        };

        match candidate.and_then(|rect| self.clip(rect)) {
            Some(rect) => {
                log::info!(
                    "Selection finalized at ({}, {}) {}x{}",
                    rect.x,
                    rect.y,
                    rect.width,
                    rect.height
                );
                self.state = SelectionState::Finalized(rect);
                SelectionRelease::Finalized(rect)
            }
            None => {
                log::debug!("Degenerate selection discarded");
                self.state = SelectionState::Empty;
                SelectionRelease::Discarded
            }
        }
    }

    /// Refresh the hover rectangle while idle
    ///
    /// Only queries the locator when Empty. Returns true when the cached
    /// rectangle changed and a redraw is needed.
    pub fn update_hover(&mut self, point: Point, locator: &dyn WindowLocator) -> bool {
        if self.state != SelectionState::Empty {
            return false;
        }
        let next = locator.window_rect_at(point).filter(|r| !r.is_empty());
        if next == self.hover {
            return false;
        }
        self.hover = next;
        true
    }

    fn clip(&self, rect: Rect) -> Option<Rect> {
        match self.bounds {
            Some(bounds) => rect.intersect(bounds),
            None if rect.is_empty() => None,
            None => Some(rect),
        }
    }
}
