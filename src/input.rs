//! Normalized input events, the per-tick input queue, and gesture tracking.
//!
//! Hosts push raw pointer/wheel/resize events whenever they arrive; the
//! gallery drains the queue once per tick and turns the events into
//! camera gestures.

use glam::Vec2;
use std::collections::{HashMap, VecDeque};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerKind {
    Mouse,
    Touch,
}

/// Screen positions are in pixels from the top-left corner; times are the
/// host's millisecond clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown { id: u64, kind: PointerKind, position: Vec2, time_ms: f64 },
    PointerMove { id: u64, kind: PointerKind, position: Vec2, time_ms: f64 },
    PointerUp { id: u64, kind: PointerKind, position: Vec2, time_ms: f64 },
    PointerCancel { id: u64 },
    /// The pointer left the surface
    PointerLeave,
    Wheel { delta_y: f32, position: Vec2 },
    Resize { width: f32, height: f32 },
}

/// What the camera and hover logic should do in response to input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    DragStart { time_ms: f64 },
    DragMove { delta: Vec2, kind: PointerKind, time_ms: f64 },
    DragEnd { time_ms: f64 },
    DragCancel,
    /// Change in distance between two touches, in pixels
    Pinch { delta_distance: f32, center: Vec2 },
    Wheel { delta_y: f32, anchor: Vec2 },
    /// Mouse position for hover, `None` when it left
    Hover(Option<Vec2>),
    Resize { width: f32, height: f32 },
}

/// FIFO of events waiting for the next tick.
#[derive(Debug, Default)]
pub struct InputQueue {
    events: VecDeque<InputEvent>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: InputEvent) {
        self.events.push_back(event);
    }

    pub fn drain(&mut self) -> impl Iterator<Item = InputEvent> + '_ {
        self.events.drain(..)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[derive(Debug, Clone, Copy)]
struct ActivePointer {
    kind: PointerKind,
    position: Vec2,
}

/// Pointer bookkeeping across events: which pointers are down, where they
/// were last, and the current pinch distance.
#[derive(Debug, Default)]
pub struct InputState {
    pointers: HashMap<u64, ActivePointer>,
    /// Insertion order of `pointers`, oldest first
    order: Vec<u64>,
    pinch_distance: Option<f32>,
    pub hover_position: Option<Vec2>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.pointers.len() == 1
    }

    pub fn is_pinching(&self) -> bool {
        self.pinch_distance.is_some()
    }

    fn touch_pair(&self) -> Option<(Vec2, Vec2)> {
        let mut touches = self
            .order
            .iter()
            .filter_map(|id| self.pointers.get(id))
            .filter(|p| p.kind == PointerKind::Touch)
            .map(|p| p.position);
        Some((touches.next()?, touches.next()?))
    }

    fn remove(&mut self, id: u64) -> Option<ActivePointer> {
        self.order.retain(|&other| other != id);
        self.pointers.remove(&id)
    }

    /// Translate one event into zero or more gestures.
    pub fn process(&mut self, event: InputEvent) -> Vec<Gesture> {
        let mut gestures = Vec::new();

        match event {
            InputEvent::PointerDown { id, kind, position, time_ms } => {
                if self.pointers.insert(id, ActivePointer { kind, position }).is_none() {
                    self.order.push(id);
                }
                match self.pointers.len() {
                    1 => gestures.push(Gesture::DragStart { time_ms }),
                    _ => {
                        if let Some((a, b)) = self.touch_pair() {
                            if self.pinch_distance.is_none() {
                                gestures.push(Gesture::DragCancel);
                            }
                            self.pinch_distance = Some(a.distance(b));
                        }
                    }
                }
            }

            InputEvent::PointerMove { id, kind, position, time_ms } => {
                let previous = self.pointers.get_mut(&id).map(|p| {
                    let previous = p.position;
                    p.position = position;
                    previous
                });

                match previous {
                    Some(_) if self.pinch_distance.is_some() => {
                        if let (Some((a, b)), Some(last)) = (self.touch_pair(), self.pinch_distance) {
                            let distance = a.distance(b);
                            gestures.push(Gesture::Pinch {
                                delta_distance: distance - last,
                                center: (a + b) * 0.5,
                            });
                            self.pinch_distance = Some(distance);
                        }
                    }
                    Some(previous) if self.pointers.len() == 1 => {
                        gestures.push(Gesture::DragMove {
                            delta: position - previous,
                            kind,
                            time_ms,
                        });
                    }
                    Some(_) => {}
                    None if kind == PointerKind::Mouse => {
                        self.hover_position = Some(position);
                        gestures.push(Gesture::Hover(Some(position)));
                    }
                    None => {}
                }
            }

            InputEvent::PointerUp { id, kind, position, time_ms } => {
                if self.remove(id).is_none() {
                    return gestures;
                }
                if self.pinch_distance.is_some() {
                    if self.touch_pair().is_none() {
                        self.pinch_distance = None;
                        // The remaining finger carries on as a fresh drag
                        if !self.pointers.is_empty() {
                            gestures.push(Gesture::DragStart { time_ms });
                        }
                    }
                } else if self.pointers.is_empty() {
                    gestures.push(Gesture::DragEnd { time_ms });
                }
                if kind == PointerKind::Mouse {
                    self.hover_position = Some(position);
                    gestures.push(Gesture::Hover(Some(position)));
                }
            }

            InputEvent::PointerCancel { id } => {
                if self.remove(id).is_some() {
                    self.pinch_distance = None;
                    self.pointers.clear();
                    self.order.clear();
                    gestures.push(Gesture::DragCancel);
                }
            }

            InputEvent::PointerLeave => {
                if !self.pointers.is_empty() {
                    self.pointers.clear();
                    self.order.clear();
                    self.pinch_distance = None;
                    gestures.push(Gesture::DragCancel);
                }
                self.hover_position = None;
                gestures.push(Gesture::Hover(None));
            }

            InputEvent::Wheel { delta_y, position } => {
                gestures.push(Gesture::Wheel {
                    delta_y,
                    anchor: position,
                });
            }

            InputEvent::Resize { width, height } => {
                gestures.push(Gesture::Resize { width, height });
            }
        }

        gestures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn down(id: u64, kind: PointerKind, x: f32, y: f32, t: f64) -> InputEvent {
        InputEvent::PointerDown { id, kind, position: Vec2::new(x, y), time_ms: t }
    }

    fn mv(id: u64, kind: PointerKind, x: f32, y: f32, t: f64) -> InputEvent {
        InputEvent::PointerMove { id, kind, position: Vec2::new(x, y), time_ms: t }
    }

    fn up(id: u64, kind: PointerKind, x: f32, y: f32, t: f64) -> InputEvent {
        InputEvent::PointerUp { id, kind, position: Vec2::new(x, y), time_ms: t }
    }

    #[test]
    fn test_mouse_drag_sequence() {
        let mut input = InputState::new();
        assert_eq!(
            input.process(down(1, PointerKind::Mouse, 10.0, 10.0, 0.0)),
            vec![Gesture::DragStart { time_ms: 0.0 }]
        );
        assert_eq!(
            input.process(mv(1, PointerKind::Mouse, 15.0, 7.0, 16.0)),
            vec![Gesture::DragMove {
                delta: Vec2::new(5.0, -3.0),
                kind: PointerKind::Mouse,
                time_ms: 16.0
            }]
        );
        let gestures = input.process(up(1, PointerKind::Mouse, 15.0, 7.0, 20.0));
        assert_eq!(gestures[0], Gesture::DragEnd { time_ms: 20.0 });
        assert!(!input.is_dragging());
    }

    #[test]
    fn test_mouse_move_without_button_hovers() {
        let mut input = InputState::new();
        let gestures = input.process(mv(1, PointerKind::Mouse, 3.0, 4.0, 0.0));
        assert_eq!(gestures, vec![Gesture::Hover(Some(Vec2::new(3.0, 4.0)))]);
        assert_eq!(input.process(InputEvent::PointerLeave), vec![Gesture::Hover(None)]);
    }

    #[test]
    fn test_two_touches_pinch() {
        let mut input = InputState::new();
        input.process(down(1, PointerKind::Touch, 100.0, 100.0, 0.0));
        let gestures = input.process(down(2, PointerKind::Touch, 200.0, 100.0, 5.0));
        assert_eq!(gestures, vec![Gesture::DragCancel]);
        assert!(input.is_pinching());

        let gestures = input.process(mv(2, PointerKind::Touch, 220.0, 100.0, 10.0));
        assert_eq!(
            gestures,
            vec![Gesture::Pinch {
                delta_distance: 20.0,
                center: Vec2::new(160.0, 100.0)
            }]
        );

        // Lifting one finger resumes panning with the other
        let gestures = input.process(up(2, PointerKind::Touch, 220.0, 100.0, 20.0));
        assert_eq!(gestures, vec![Gesture::DragStart { time_ms: 20.0 }]);
        assert!(!input.is_pinching());
        assert!(input.is_dragging());
    }

    #[test]
    fn test_cancel_aborts_drag() {
        let mut input = InputState::new();
        input.process(down(7, PointerKind::Touch, 0.0, 0.0, 0.0));
        assert_eq!(input.process(InputEvent::PointerCancel { id: 7 }), vec![Gesture::DragCancel]);
        assert!(!input.is_dragging());
    }

    #[test]
    fn test_queue_is_fifo() {
        let mut queue = InputQueue::new();
        queue.push(InputEvent::Wheel { delta_y: 1.0, position: Vec2::ZERO });
        queue.push(InputEvent::Resize { width: 10.0, height: 20.0 });
        let drained: Vec<_> = queue.drain().collect();
        assert!(matches!(drained[0], InputEvent::Wheel { .. }));
        assert!(matches!(drained[1], InputEvent::Resize { .. }));
        assert!(queue.is_empty());
    }
}
