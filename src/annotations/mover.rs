//! Hit-testing and drag relocation of committed shapes
//!
//! Only text annotations can be moved. Other shapes are ignored by the scan
//! even when they sit on top.

use crate::domain::{Point, Shape, ShapeModel};

/// Cursor feedback for pointer mode
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CursorHint {
    #[default]
    Default,
    Move,
}

/// A shape grabbed for moving
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Grab {
    /// Index of the shape after it was brought to front
    pub index: usize,
    /// Pointer minus the shape's anchor at grab time
    pub offset: Point,
}

/// Topmost movable shape whose bounds contain `point`
pub fn hit_test(shapes: &[Shape], point: Point) -> Option<usize> {
    shapes
        .iter()
        .enumerate()
        .rev()
        .find(|(_, shape)| shape.is_movable() && shape.bounds().contains_point(point))
        .map(|(index, _)| index)
}

/// Grab the topmost movable shape under `point` and bring it to front
pub fn grab(model: &mut ShapeModel, point: Point) -> Option<Grab> {
    let hit = hit_test(model.shapes(), point)?;
    let anchor = model.shapes()[hit].anchor()?;
    let index = model.bring_to_front(hit)?;
    log::debug!("Grabbed shape {} (now {})", hit, index);
    Some(Grab {
        index,
        offset: point.offset_from(anchor),
    })
}

/// Move a grabbed shape so it keeps its offset to the pointer
///
/// Returns true when the shape moved.
pub fn drag(model: &mut ShapeModel, grab: Grab, point: Point) -> bool {
    let Some(shape) = model.get_mut(grab.index) else {
        return false;
    };
    let target = point.offset_from(grab.offset);
    if shape.anchor() == Some(target) {
        return false;
    }
    shape.set_anchor(target)
}

/// Cursor to show while hovering in pointer mode, without mutating anything
pub fn hover_cursor(shapes: &[Shape], point: Point) -> CursorHint {
    if hit_test(shapes, point).is_some() {
        CursorHint::Move
    } else {
        CursorHint::Default
    }
}
