//! Drag and wheel interpretation
//!
//! Pointer input arrives in screen coordinates. Overlays are hit-tested in
//! document space using the same bounds the renderer draws, topmost first:
//! signature, then text, then the stage itself.

use crate::config::EditorConfig;
use crate::domain::{screen_to_document, zoom_around, Point};
use crate::render::geometry::{signature_bounds, text_bounds};
use crate::render::TextFont;

use super::state::EditorState;

/// What a pointer-down grabbed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragTarget {
    Text,
    Signature,
    Stage,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureState {
    Idle,
    Dragging {
        target: DragTarget,
        /// Pointer position at pointer-down, screen coordinates
        start_screen: Point,
        /// Overlay position (document space) or stage pan (screen space) at
        /// pointer-down
        start_position: Point,
    },
}

/// Wheel ratios, one tick each
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelSteps {
    pub overlay: f32,
    pub zoom: f32,
}

impl From<&EditorConfig> for WheelSteps {
    fn from(config: &EditorConfig) -> Self {
        Self {
            overlay: config.overlay_scale_step,
            zoom: config.zoom_step,
        }
    }
}

/// Font and size needed to know where the text box is
#[derive(Debug, Clone, Copy)]
pub struct TextMetrics<'a> {
    pub font: &'a TextFont,
    pub base_font_size: f32,
}

#[derive(Debug)]
pub struct GestureController {
    state: GestureState,
    steps: WheelSteps,
}

impl GestureController {
    pub fn new(steps: WheelSteps) -> Self {
        Self {
            state: GestureState::Idle,
            steps,
        }
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, GestureState::Dragging { .. })
    }

    /// Drop any drag in progress
    pub fn cancel(&mut self) {
        self.state = GestureState::Idle;
    }

    /// Find the topmost layer under a screen point
    pub fn hit_test(editor: &EditorState, metrics: TextMetrics<'_>, screen: Point) -> DragTarget {
        let doc = screen_to_document(screen, editor.view());

        if let Some(signature) = editor.signature_overlay()
            && signature_bounds(&signature).contains_point(doc)
        {
            return DragTarget::Signature;
        }
        if let Some(text) = editor.text_overlay()
            && text_bounds(text, metrics.font, metrics.base_font_size).contains_point(doc)
        {
            return DragTarget::Text;
        }
        DragTarget::Stage
    }

    pub fn pointer_down(&mut self, editor: &EditorState, metrics: TextMetrics<'_>, screen: Point) {
        let target = Self::hit_test(editor, metrics, screen);
        let start_position = match target {
            DragTarget::Text => editor.text().position,
            DragTarget::Signature => editor.signature_placement().position,
            DragTarget::Stage => editor.view().pan,
        };
        log::debug!("Drag start on {:?} at {:?}", target, screen);
        self.state = GestureState::Dragging {
            target,
            start_screen: screen,
            start_position,
        };
    }

    /// Apply a pointer move; returns true when something changed
    pub fn pointer_move(&mut self, editor: &mut EditorState, screen: Point) -> bool {
        let GestureState::Dragging {
            target,
            start_screen,
            start_position,
        } = self.state
        else {
            return false;
        };

        let delta = screen - start_screen;
        match target {
            DragTarget::Text => editor.move_text(start_position + delta / editor.view().zoom),
            DragTarget::Signature => {
                editor.move_signature(start_position + delta / editor.view().zoom)
            }
            DragTarget::Stage => {
                let mut view = *editor.view();
                view.pan = start_position + delta;
                editor.set_view(view);
            }
        }
        true
    }

    pub fn pointer_up(&mut self) {
        if let GestureState::Dragging { target, .. } = self.state {
            log::debug!("Drag end on {:?}", target);
        }
        self.state = GestureState::Idle;
    }

    /// Apply one wheel tick at a screen point; returns true when something
    /// changed.
    ///
    /// Over an overlay this scales the overlay; over the stage it zooms the
    /// view around the pointer. Negative `delta_y` (wheel up) grows.
    pub fn wheel(
        &mut self,
        editor: &mut EditorState,
        metrics: TextMetrics<'_>,
        screen: Point,
        delta_y: f32,
    ) -> bool {
        if delta_y == 0.0 || !delta_y.is_finite() {
            return false;
        }
        let grow = delta_y < 0.0;

        match Self::hit_test(editor, metrics, screen) {
            DragTarget::Signature => {
                editor.scale_signature(tick(self.steps.overlay, grow));
            }
            DragTarget::Text => {
                editor.scale_text(tick(self.steps.overlay, grow));
            }
            DragTarget::Stage => {
                let bounds = editor.defaults().zoom_bounds;
                let view = zoom_around(screen, editor.view(), tick(self.steps.zoom, grow), bounds);
                log::debug!("Zoom {}%", view.zoom_percent());
                editor.set_view(view);
            }
        }
        true
    }
}

fn tick(step: f32, grow: bool) -> f32 {
    if grow { step } else { 1.0 / step }
}
