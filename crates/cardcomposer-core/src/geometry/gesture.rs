//! Pointer gesture engine: one-finger drag, two-finger pinch/rotate/zoom.
//!
//! Every change in the number of active pointers takes a fresh baseline from
//! the current pointer positions and the current [`AffineState`], so moving
//! from a pinch back to a drag never jumps.

use super::affine::{AffineState, Point, MAX_SCALE, MIN_SCALE};

/// Host-assigned pointer identity.
pub type PointerId = i32;

/// Pinch distances below this are too small to scale from.
const MIN_PINCH_DISTANCE: f64 = 1e-6;

/// What the active pointers are currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Idle,
    Dragging,
    Pinching,
}

/// Snapshot taken when a gesture (re)starts.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Baseline {
    Drag {
        start: Point,
        origin: AffineState,
    },
    Pinch {
        distance: f64,
        angle: f64,
        centroid: Point,
        origin: AffineState,
    },
}

/// Tracks up to two pointers and turns their motion into [`AffineState`] updates.
///
/// Pointers are kept in the order they went down. Additional pointers beyond
/// the second are ignored until one of the tracked pointers lifts.
#[derive(Debug, Clone, Default)]
pub struct GestureEngine {
    pointers: Vec<(PointerId, Point)>,
    baseline: Option<Baseline>,
}

impl GestureEngine {
    /// Maximum number of simultaneously tracked pointers.
    pub const MAX_POINTERS: usize = 2;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> GesturePhase {
        match self.baseline {
            None => GesturePhase::Idle,
            Some(Baseline::Drag { .. }) => GesturePhase::Dragging,
            Some(Baseline::Pinch { .. }) => GesturePhase::Pinching,
        }
    }

    pub fn active_pointers(&self) -> usize {
        self.pointers.len()
    }

    pub fn is_tracking(&self, id: PointerId) -> bool {
        self.pointers.iter().any(|(pid, _)| *pid == id)
    }

    /// Register a pointer and re-derive the baseline.
    ///
    /// Returns `false` if the pointer was ignored because two are already tracked.
    pub fn pointer_down(&mut self, id: PointerId, position: Point, state: &AffineState) -> bool {
        if let Some(entry) = self.pointers.iter_mut().find(|(pid, _)| *pid == id) {
            entry.1 = position;
        } else if self.pointers.len() < Self::MAX_POINTERS {
            self.pointers.push((id, position));
        } else {
            return false;
        }

        self.rebaseline(state);
        true
    }

    /// Move a tracked pointer and update `state` accordingly.
    ///
    /// Returns `true` if `state` changed. Untracked pointers are ignored.
    pub fn pointer_move(&mut self, id: PointerId, position: Point, state: &mut AffineState) -> bool {
        let Some(entry) = self.pointers.iter_mut().find(|(pid, _)| *pid == id) else {
            return false;
        };
        entry.1 = position;

        match self.baseline {
            Some(Baseline::Drag { start, origin }) => {
                let current = self.pointers[0].1;
                state.tx = origin.tx + (current.x - start.x);
                state.ty = origin.ty + (current.y - start.y);
                true
            }
            Some(Baseline::Pinch {
                distance,
                angle,
                centroid,
                origin,
            }) => {
                let (p1, p2) = (self.pointers[0].1, self.pointers[1].1);
                let current_distance = p1.distance_to(p2);
                let current_centroid = p1.midpoint(p2);

                if distance >= MIN_PINCH_DISTANCE {
                    state.scale =
                        (origin.scale * current_distance / distance).clamp(MIN_SCALE, MAX_SCALE);
                }
                state.rotation = origin.rotation + (p1.angle_to(p2) - angle);
                state.tx = origin.tx + (current_centroid.x - centroid.x);
                state.ty = origin.ty + (current_centroid.y - centroid.y);
                true
            }
            None => false,
        }
    }

    /// Forget a lifted pointer and re-derive the baseline from the rest.
    pub fn pointer_up(&mut self, id: PointerId, state: &AffineState) {
        let before = self.pointers.len();
        self.pointers.retain(|(pid, _)| *pid != id);
        if self.pointers.len() != before {
            self.rebaseline(state);
        }
    }

    /// A cancelled pointer is treated exactly like a lifted one.
    pub fn pointer_cancel(&mut self, id: PointerId, state: &AffineState) {
        self.pointer_up(id, state);
    }

    /// Drop all pointers and end any gesture.
    pub fn reset(&mut self) {
        self.pointers.clear();
        self.baseline = None;
    }

    fn rebaseline(&mut self, state: &AffineState) {
        self.baseline = match self.pointers.as_slice() {
            [] => None,
            [(_, start)] => Some(Baseline::Drag {
                start: *start,
                origin: *state,
            }),
            [(_, p1), (_, p2), ..] => Some(Baseline::Pinch {
                distance: p1.distance_to(*p2),
                angle: p1.angle_to(*p2),
                centroid: p1.midpoint(*p2),
                origin: *state,
            }),
        };
    }
}
