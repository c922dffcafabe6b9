//! Drawing interaction state machine
//!
//! Turns raw pointer input into finished annotations. Intermediate samples only
//! ever touch the in-memory [`Draft`]; the store sees a gesture once, when it is
//! finalized, so history grows per gesture and not per sample.
//!
//! ```text
//! Idle --down--> Drawing --move--> Drawing --up/leave--> Idle (commit or discard)
//! Idle --down (text/stickyNote/stamp)--> EditingText --submit/close--> Idle
//! ```

use tracing::debug;

use crate::annotation::{
    Annotation, AnnotationId, AnnotationStyle, AnnotationType, DrawMode, Point, SessionClock,
    StampType,
};
use crate::geometry;

/// In-progress annotation built from one gesture; never part of the store
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    /// Reserved up front so the preview and the committed annotation share it
    pub id: AnnotationId,
    pub tool: AnnotationType,
    pub style: AnnotationStyle,
    pub page_number: u32,
    /// Continuous tools: every sample. Shape tools: always `[anchor, endpoint]`.
    pub points: Vec<Point>,
}

impl Draft {
    fn new(tool: AnnotationType, style: AnnotationStyle, page_number: u32, anchor: Point) -> Self {
        let points = match tool.draw_mode() {
            DrawMode::Continuous => vec![anchor],
            _ => vec![anchor, anchor],
        };
        Self {
            id: AnnotationId::generate(),
            tool,
            style,
            page_number,
            points,
        }
    }

    fn extend(&mut self, point: Point) {
        match self.tool.draw_mode() {
            DrawMode::Continuous => {
                if self.points.last() != Some(&point) {
                    self.points.push(point);
                }
            }
            _ => {
                if let Some(end) = self.points.get_mut(1) {
                    *end = point;
                }
            }
        }
    }

    /// Whether the draft is worth committing
    fn is_valid(&self, min_shape_distance: f64) -> bool {
        !geometry::is_degenerate(self.tool, &self.points, min_shape_distance)
    }
}

/// Open text/sticky-note/stamp editor
#[derive(Debug, Clone, PartialEq)]
pub struct TextEntry {
    pub tool: AnnotationType,
    pub anchor: Point,
    pub style: AnnotationStyle,
    pub page_number: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum DrawState {
    #[default]
    Idle,
    Drawing(Draft),
    EditingText(TextEntry),
}

/// What a pointer event did to the machine
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOutcome {
    /// Event did not apply in the current state
    Ignored,
    Started,
    Updated,
    /// Gesture finished with valid geometry; the caller adds it to the store
    Commit(Annotation),
    /// Gesture finished with degenerate geometry
    Discarded(AnnotationType),
    /// Draft dropped without evaluating it (escape)
    Cancelled,
    EditorOpened,
    EditorClosed,
}

/// Per-session drawing state machine
#[derive(Debug, Clone)]
pub struct DrawingMachine {
    state: DrawState,
    clock: SessionClock,
    user_id: String,
    min_shape_distance: f64,
}

impl DrawingMachine {
    pub fn new(user_id: impl Into<String>, min_shape_distance: f64) -> Self {
        Self {
            state: DrawState::Idle,
            clock: SessionClock::new(),
            user_id: user_id.into(),
            min_shape_distance,
        }
    }

    pub fn state(&self) -> &DrawState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == DrawState::Idle
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.state, DrawState::Drawing(_))
    }

    pub fn editor(&self) -> Option<&TextEntry> {
        match &self.state {
            DrawState::EditingText(entry) => Some(entry),
            _ => None,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Next timestamp from the session clock; shared with pastes so ordering holds
    pub fn now(&mut self) -> u64 {
        self.clock.now()
    }

    /// Start a gesture. Ignored for the select tool, while a gesture is already
    /// in progress and while the editor is open.
    pub fn pointer_down(
        &mut self,
        point: Point,
        tool: AnnotationType,
        style: &AnnotationStyle,
        page_number: u32,
    ) -> DrawOutcome {
        if !self.is_idle() || tool == AnnotationType::Select {
            return DrawOutcome::Ignored;
        }

        if tool.draw_mode() == DrawMode::Single {
            self.state = DrawState::EditingText(TextEntry {
                tool,
                anchor: point,
                style: style.clone(),
                page_number,
            });
            debug!(%tool, x = point.x, y = point.y, "editor opened");
            return DrawOutcome::EditorOpened;
        }

        self.state = DrawState::Drawing(Draft::new(tool, style.clone(), page_number, point));
        DrawOutcome::Started
    }

    /// Feed one pointer sample into the draft
    pub fn pointer_move(&mut self, point: Point) -> DrawOutcome {
        match &mut self.state {
            DrawState::Drawing(draft) => {
                draft.extend(point);
                DrawOutcome::Updated
            }
            _ => DrawOutcome::Ignored,
        }
    }

    /// Take the final sample and finalize the gesture
    pub fn pointer_up(&mut self, point: Point) -> DrawOutcome {
        if !self.is_drawing() {
            return DrawOutcome::Ignored;
        }
        self.pointer_move(point);
        self.finish()
    }

    /// Pointer left the surface or capture was lost; same as pointer-up at the
    /// last known position
    pub fn pointer_leave(&mut self) -> DrawOutcome {
        self.finish()
    }

    /// Finalize whatever is in progress before a tool, page or document switch.
    ///
    /// A draft is committed if valid; an open editor is closed without committing.
    pub fn finalize(&mut self) -> DrawOutcome {
        match self.state {
            DrawState::Drawing(_) => self.finish(),
            DrawState::EditingText(_) => self.close_editor(),
            DrawState::Idle => DrawOutcome::Ignored,
        }
    }

    /// Abort the draft or close the editor without touching the store
    pub fn cancel(&mut self) -> DrawOutcome {
        match std::mem::take(&mut self.state) {
            DrawState::Drawing(draft) => {
                debug!(tool = %draft.tool, "draft cancelled");
                DrawOutcome::Cancelled
            }
            DrawState::EditingText(_) => DrawOutcome::EditorClosed,
            DrawState::Idle => DrawOutcome::Ignored,
        }
    }

    fn finish(&mut self) -> DrawOutcome {
        let draft = match std::mem::take(&mut self.state) {
            DrawState::Drawing(draft) => draft,
            other => {
                self.state = other;
                return DrawOutcome::Ignored;
            }
        };

        if !draft.is_valid(self.min_shape_distance) {
            debug!(tool = %draft.tool, "discarded degenerate draft");
            return DrawOutcome::Discarded(draft.tool);
        }

        let mut annotation = Annotation::new(
            draft.tool,
            draft.points,
            draft.style,
            draft.page_number,
            self.clock.now(),
            self.user_id.clone(),
        );
        annotation.id = draft.id;
        DrawOutcome::Commit(annotation)
    }

    /// Commit the editor with `text`; blank text discards
    pub fn submit_text(&mut self, text: &str) -> DrawOutcome {
        let entry = match self.take_editor() {
            Some(entry) => entry,
            None => return DrawOutcome::Ignored,
        };
        let text = text.trim_end();
        if text.trim().is_empty() {
            debug!(tool = %entry.tool, "empty text discarded");
            return DrawOutcome::Discarded(entry.tool);
        }
        let annotation = self.entry_annotation(entry).with_text(text);
        DrawOutcome::Commit(annotation)
    }

    /// Commit the editor as a stamp of `stamp_type`
    pub fn submit_stamp(&mut self, stamp_type: StampType) -> DrawOutcome {
        let mut entry = match self.take_editor() {
            Some(entry) => entry,
            None => return DrawOutcome::Ignored,
        };
        entry.tool = AnnotationType::Stamp;
        entry.style.stamp_type = Some(stamp_type);
        DrawOutcome::Commit(self.entry_annotation(entry))
    }

    /// Close the editor without committing
    pub fn close_editor(&mut self) -> DrawOutcome {
        match self.take_editor() {
            Some(_) => DrawOutcome::EditorClosed,
            None => DrawOutcome::Ignored,
        }
    }

    fn take_editor(&mut self) -> Option<TextEntry> {
        match std::mem::take(&mut self.state) {
            DrawState::EditingText(entry) => Some(entry),
            other => {
                self.state = other;
                None
            }
        }
    }

    fn entry_annotation(&mut self, entry: TextEntry) -> Annotation {
        Annotation::new(
            entry.tool,
            vec![entry.anchor],
            entry.style,
            entry.page_number,
            self.clock.now(),
            self.user_id.clone(),
        )
    }

    /// Live preview of the draft for the renderer
    pub fn preview(&self) -> Option<Annotation> {
        match &self.state {
            DrawState::Drawing(draft) => {
                let mut preview = Annotation::new(
                    draft.tool,
                    draft.points.clone(),
                    draft.style.clone(),
                    draft.page_number,
                    0,
                    self.user_id.clone(),
                );
                preview.id = draft.id.clone();
                Some(preview)
            }
            _ => None,
        }
    }
}
