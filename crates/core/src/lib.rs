//! Inkpage Core Library
//!
//! Annotation engine for paginated documents: the versioned annotation store
//! with per-document undo/redo, the drawing and selection state machines,
//! hit-testing, clipboard, JSON import/export and a render primitive.

pub mod annotation;
pub mod clipboard;
pub mod command;
pub mod config;
pub mod drawing;
pub mod error;
pub mod geometry;
pub mod history;
pub mod manipulation;
pub mod raster;
pub mod render;
pub mod selection;
pub mod serialization;
pub mod session;
pub mod store;

pub use annotation::{
    Annotation, AnnotationId, AnnotationPatch, AnnotationStyle, AnnotationType, Color, DrawMode,
    InvalidAnnotation, Point, StampType, StylePatch,
};
pub use clipboard::Clipboard;
pub use command::{resolve_command, Command, Key, KeyEvent, Modifiers};
pub use config::{ConfigError, EngineConfig};
pub use drawing::{DrawOutcome, DrawState, DrawingMachine};
pub use error::{EngineError, Result, ValidationError};
pub use geometry::Bounds;
pub use history::{History, Snapshot};
pub use hit_test::hit_test;
pub use manipulation::{generate_handles, HandleType, ManipulationHandle, ManipulationState};
pub use raster::PixmapSurface;
pub use render::{render_annotation, DisplayList, RenderSurface, StrokeStyle};
pub use selection::{SelectionController, SelectionOutcome};
pub use serialization::{export_annotations, parse_annotations, EXPORT_SCHEMA_VERSION};
pub use session::{CommandOutcome, PointerOutcome, Session};
pub use store::{AnnotationStore, DocumentId};
