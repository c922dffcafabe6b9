//! Top-level editing session
//!
//! Owns the store, the drawing machine, the selection controller and the
//! clipboard, and routes host input to them. Pointer coordinates are in
//! document space; `scale` only widens hit tolerances and handle sizes.
//!
//! Ids can vanish between the moment a host captures them and the moment an
//! action fires (an undo in between, for example). Those cases are absorbed
//! here as silent no-ops; only imports report failure.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::annotation::{Annotation, AnnotationId, AnnotationType, Point, StampType, StylePatch};
use crate::clipboard::Clipboard;
use crate::command::{resolve_command, Command, KeyEvent};
use crate::config::EngineConfig;
use crate::drawing::{DrawOutcome, DrawingMachine};
use crate::error::Result;
use crate::hit_test::hit_test;
use crate::render::{render_annotation, render_marquee, render_selection, RenderSurface};
use crate::selection::{SelectionController, SelectionOutcome};
use crate::serialization::{export_annotations, parse_annotations};
use crate::store::{AnnotationStore, DocumentId};

/// Result of a pointer event, by the component that handled it
#[derive(Debug, Clone, PartialEq)]
pub enum PointerOutcome {
    Draw(DrawOutcome),
    Select(SelectionOutcome),
}

impl PointerOutcome {
    /// Whether the event did anything worth a redraw
    pub fn is_handled(&self) -> bool {
        !matches!(
            self,
            PointerOutcome::Draw(DrawOutcome::Ignored)
                | PointerOutcome::Select(SelectionOutcome::Ignored)
        )
    }
}

/// Result of a dispatched [`Command`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Applied,
    /// Preconditions unmet; nothing changed
    NoOp,
    Copied(usize),
    Cut(usize),
    Pasted(usize),
}

impl CommandOutcome {
    fn from_count(count: usize, wrap: fn(usize) -> CommandOutcome) -> Self {
        if count == 0 {
            CommandOutcome::NoOp
        } else {
            wrap(count)
        }
    }

    fn from_flag(changed: bool) -> Self {
        if changed {
            CommandOutcome::Applied
        } else {
            CommandOutcome::NoOp
        }
    }
}

/// One user's editing session over any number of documents
pub struct Session {
    config: EngineConfig,
    store: AnnotationStore,
    drawing: DrawingMachine,
    selection: SelectionController,
    clipboard: Clipboard,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Session {
    pub fn new(config: EngineConfig) -> Self {
        let store = AnnotationStore::new()
            .with_history_limit(config.history_limit)
            .with_defaults(config.default_tool, config.default_style.clone());
        let drawing = DrawingMachine::new(config.user_id.clone(), config.min_shape_distance);
        let selection = SelectionController::new(
            config.min_tap_target_px,
            config.handle_size_px,
            config.min_shape_distance,
        );
        let clipboard = Clipboard::new(config.paste_offset);
        info!(user = %config.user_id, tool = %config.default_tool, "session started");
        Self {
            config,
            store,
            drawing,
            selection,
            clipboard,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    /// Direct store access for hosts that drive mutations themselves
    pub fn store_mut(&mut self) -> &mut AnnotationStore {
        &mut self.store
    }

    pub fn drawing(&self) -> &DrawingMachine {
        &self.drawing
    }

    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    pub fn annotations(&self) -> &[Annotation] {
        self.store.annotations()
    }

    /// Top-most annotation on the active page under `point`
    pub fn annotation_at(&self, point: Point, scale: f64) -> Option<&Annotation> {
        hit_test(
            &point,
            self.store.page_annotations(self.store.active_page()),
            scale,
            self.config.min_tap_target_px,
        )
    }

    // ----- Pointer input -----

    pub fn pointer_down(&mut self, point: Point, shift: bool, scale: f64) -> PointerOutcome {
        match self.store.current_tool() {
            AnnotationType::Select => {
                PointerOutcome::Select(self.selection.pointer_down(&mut self.store, point, shift, scale))
            }
            tool => {
                let page = self.store.active_page();
                let outcome = self
                    .drawing
                    .pointer_down(point, tool, self.store.current_style(), page);
                PointerOutcome::Draw(outcome)
            }
        }
    }

    pub fn pointer_move(&mut self, point: Point) -> PointerOutcome {
        if self.drawing.is_drawing() {
            PointerOutcome::Draw(self.drawing.pointer_move(point))
        } else {
            PointerOutcome::Select(self.selection.pointer_move(point))
        }
    }

    pub fn pointer_up(&mut self, point: Point, scale: f64) -> PointerOutcome {
        if self.drawing.is_drawing() {
            let outcome = self.drawing.pointer_up(point);
            return PointerOutcome::Draw(self.apply_draw(outcome));
        }
        let result = self.selection.pointer_up(&mut self.store, point, scale);
        PointerOutcome::Select(absorb(result, "pointer up").unwrap_or(SelectionOutcome::Released))
    }

    /// Pointer left the canvas or capture was lost; finishes like pointer-up
    pub fn pointer_leave(&mut self, scale: f64) -> PointerOutcome {
        if self.drawing.is_drawing() {
            let outcome = self.drawing.pointer_leave();
            return PointerOutcome::Draw(self.apply_draw(outcome));
        }
        let result = self.selection.pointer_leave(&mut self.store, scale);
        PointerOutcome::Select(absorb(result, "pointer leave").unwrap_or(SelectionOutcome::Released))
    }

    // ----- Text editor -----

    pub fn submit_text(&mut self, text: &str) -> DrawOutcome {
        let outcome = self.drawing.submit_text(text);
        self.apply_draw(outcome)
    }

    pub fn submit_stamp(&mut self, stamp_type: StampType) -> DrawOutcome {
        let outcome = self.drawing.submit_stamp(stamp_type);
        self.apply_draw(outcome)
    }

    pub fn close_editor(&mut self) -> DrawOutcome {
        self.drawing.close_editor()
    }

    fn apply_draw(&mut self, outcome: DrawOutcome) -> DrawOutcome {
        if let DrawOutcome::Commit(annotation) = &outcome {
            if absorb(self.store.add_annotation(annotation.clone()), "commit draft").is_none() {
                return DrawOutcome::Discarded(annotation.kind);
            }
        }
        outcome
    }

    /// Finish in-progress input before the context changes under it
    fn settle(&mut self) {
        let outcome = self.drawing.finalize();
        self.apply_draw(outcome);
        if self.selection.cancel() {
            debug!("selection gesture dropped");
        }
    }

    // ----- Session state -----

    /// Switch tools; an in-progress draft is committed with the tool it started with
    pub fn set_tool(&mut self, tool: AnnotationType) {
        self.settle();
        self.store.set_current_tool(tool);
    }

    /// Change the style for future annotations; false if the result is invalid
    pub fn set_style(&mut self, patch: &StylePatch) -> bool {
        self.store.set_current_style(patch).is_ok()
    }

    /// Change the current style and restyle the selection in one snapshot
    pub fn apply_style_to_selection(&mut self, patch: &StylePatch) -> usize {
        if !self.set_style(patch) {
            return 0;
        }
        let ids = self.store.selected_ids();
        if ids.is_empty() {
            return 0;
        }
        absorb(self.store.restyle(&ids, patch), "restyle").unwrap_or(0)
    }

    pub fn set_page(&mut self, page: u32) {
        self.settle();
        self.store.set_active_page(page);
    }

    pub fn open_document(&mut self, id: DocumentId) {
        self.settle();
        self.store.open_document(id);
    }

    // ----- Commands -----

    /// Resolve a key press and dispatch it. `None` if no command is bound.
    pub fn handle_key(&mut self, event: &KeyEvent) -> Option<CommandOutcome> {
        let command = resolve_command(event)?;
        Some(self.dispatch(command))
    }

    pub fn dispatch(&mut self, command: Command) -> CommandOutcome {
        debug!(?command, "dispatch");
        match command {
            Command::SetTool(tool) => {
                self.set_tool(tool);
                CommandOutcome::Applied
            }
            Command::Undo => CommandOutcome::from_flag(self.undo()),
            Command::Redo => CommandOutcome::from_flag(self.redo()),
            Command::DeleteSelected => {
                self.selection.cancel();
                CommandOutcome::from_count(self.store.delete_selected(), |_| CommandOutcome::Applied)
            }
            Command::Copy => CommandOutcome::from_count(self.copy(), CommandOutcome::Copied),
            Command::Cut => CommandOutcome::from_count(self.cut(), CommandOutcome::Cut),
            Command::Paste => CommandOutcome::from_count(self.paste(), CommandOutcome::Pasted),
            Command::SelectAll => {
                CommandOutcome::from_count(self.store.select_all(), |_| CommandOutcome::Applied)
            }
            Command::BringToFront => {
                let ids = self.store.selected_ids();
                CommandOutcome::from_flag(!ids.is_empty() && self.store.bring_to_front(&ids))
            }
            Command::SendToBack => {
                let ids = self.store.selected_ids();
                CommandOutcome::from_flag(!ids.is_empty() && self.store.send_to_back(&ids))
            }
            Command::Escape => {
                self.escape();
                CommandOutcome::Applied
            }
            Command::SetPage(page) => {
                self.set_page(page);
                CommandOutcome::Applied
            }
            Command::OpenDocument(id) => {
                self.open_document(id);
                CommandOutcome::Applied
            }
        }
    }

    /// Abort the draft, close the editor, clear the selection and pick the select tool
    pub fn escape(&mut self) {
        self.drawing.cancel();
        self.selection.cancel();
        self.store.clear_selection();
        self.store.set_current_tool(AnnotationType::Select);
    }

    pub fn undo(&mut self) -> bool {
        self.selection.cancel();
        self.store.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.selection.cancel();
        self.store.redo()
    }

    pub fn copy(&mut self) -> usize {
        self.clipboard.copy(&self.store)
    }

    pub fn cut(&mut self) -> usize {
        self.selection.cancel();
        self.clipboard.cut(&mut self.store)
    }

    /// Paste onto the active page
    pub fn paste(&mut self) -> usize {
        self.paste_to(self.store.active_page())
    }

    pub fn paste_to(&mut self, page: u32) -> usize {
        let timestamp = self.drawing.now();
        let result = self
            .clipboard
            .paste(&mut self.store, page, timestamp, &self.config.user_id);
        absorb(result, "paste").unwrap_or(0)
    }

    // ----- Import / export -----

    /// Replace the active document's annotations with a JSON payload.
    ///
    /// On failure nothing changes; on success history is reset to the import.
    pub fn import_all(&mut self, json: &str) -> Result<usize> {
        let annotations = parse_annotations(json)?;
        let count = annotations.len();
        self.drawing.cancel();
        self.selection.cancel();
        self.store.import_annotations(annotations)?;
        Ok(count)
    }

    /// The active document's annotations as a JSON array
    pub fn export_all(&self) -> Result<String> {
        Ok(export_annotations(self.store.annotations())?)
    }

    // ----- Rendering -----

    /// Draw the active page: committed annotations, live previews, selection
    /// chrome and the marquee.
    pub fn render_page<S: RenderSurface + ?Sized>(&self, surface: &mut S, scale: f64) {
        let page = self.store.active_page();
        let previews = self.selection.previews(&self.store);
        let replaced: HashSet<&AnnotationId> = previews.iter().map(|p| &p.id).collect();

        for annotation in self.store.page_annotations(page) {
            if !replaced.contains(&annotation.id) {
                render_annotation(surface, annotation, scale);
            }
        }
        for preview in &previews {
            render_annotation(surface, preview, scale);
        }
        if let Some(draft) = self.drawing.preview().filter(|d| d.page_number == page) {
            render_annotation(surface, &draft, scale);
        }

        for id in self.store.selected_ids() {
            let shown = previews
                .iter()
                .find(|preview| preview.id == id)
                .or_else(|| self.store.get(&id));
            if let Some(annotation) = shown {
                render_selection(surface, annotation, scale, self.config.handle_size_px);
            }
        }
        if let Some(marquee) = self.selection.marquee() {
            render_marquee(surface, &marquee, scale);
        }
    }
}

/// Swallow benign engine errors; anything else is logged and also swallowed
fn absorb<T>(result: Result<T>, action: &'static str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(error) if error.is_benign() => {
            debug!(%error, action, "ignored");
            None
        }
        Err(error) => {
            warn!(%error, action, "operation rejected");
            None
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("document", self.store.active_document())
            .field("page", &self.store.active_page())
            .field("tool", &self.store.current_tool())
            .field("annotations", &self.store.len())
            .field("selected", &self.store.selection().len())
            .finish()
    }
}
