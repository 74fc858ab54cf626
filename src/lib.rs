//! # pose-scene-kernel
//!
//! Structural core of an interactive 2D interaction-diagram editor.
//!
//! The kernel keeps a scene of cross-linked entities consistent under
//! interactive mutation:
//!
//! > Given an edit to some atoms, what else must change, and how is it undone?
//!
//! ## Core Contract
//!
//! 1. Every entity lives in typed, id-keyed collections with symmetric
//!    cross-reference indices ([`Scene`])
//! 2. Every edit expands to its full dependent set through the indices
//!    ([`AffectedResolver`]) before anything is mutated
//! 3. Every committed edit is one reversible [`HistoryStep`]; reverting it
//!    restores the committed state exactly ([`scene_fingerprint`])
//!
//! ## Architecture
//!
//! ```text
//! SceneEditor ─► AffectedResolver ─► commands (edit) ─► HistoryStep ─► History
//!      │                │                   │
//!      │                └── ConnectionIndex  └──► Scene ─► BoundaryTracker
//!      └── io (SceneDescription import/export)       └──► traversal (rings)
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Every collection is ordered by id, so iteration, neighbour order and
//!   serialization are stable
//! - Ring perception and id renumbering depend only on ids and bonds
//! - Undo restores the exact committed state, including index contents

#![warn(clippy::all)]

pub mod types;
pub mod error;
pub mod store;
pub mod traversal;
pub mod boundary;
pub mod history;
pub mod resolver;
pub mod edit;
pub mod editor;
pub mod io;
pub mod canonical;
pub mod config;

// Re-exports
pub use types::{
    Annotation, AnnotationId, Atom, AtomId, BondType, ControlPoint, ControlPointId, Edge, EdgeId, Endpoint,
    EndpointKind, HydrophobicContact, HydrophobicId, IntermolecularEdge, IntermolecularId, IntermolecularKey,
    IntermolecularKind, LabelSide, Limits, Ring, RingId, RingSystem, RingSystemId, StructureId,
};
pub use error::{EntityKind, ImportError, Result, SceneError};
pub use store::{
    AtomGraph, BoundsRegion, ConnectionIndex, IdWatermarks, Neighbor, PositionKey, Representation, Scene,
    Selection, Structure, StructureIds, StructureInfo, StructureKind,
};
pub use traversal::{
    connected_components, reachable_atoms, traverse, DfsVisitor, EdgeClass, NoopVisitor, TraversalDiagnostic,
    TraversalOptions, TraversalReport, VisitFlow,
};
pub use boundary::{Axis, BoundaryTracker, ChangeDir, Extremum, FixedLimits};
pub use history::{AddRemoveChange, BoundChange, Change, EditAction, History, HistoryStep, Insertable};
pub use resolver::{AffectedResolver, AffectedSet, MoveGranularity, RemovalRequest, RemovalSet};
pub use edit::{AnnotationSwap, HydrophobicSwap, PositionUpdate, SceneFragment, SelectionUpdate, StructureSwap};
pub use editor::{SceneEditor, SceneObserver, SharedEditor};
pub use io::{export_scene, plan_import, ImportPlan, SceneDescription};
pub use canonical::{canonical_hash, canonical_hash_hex, scene_fingerprint, scene_fingerprint_hex, to_canonical_bytes};
pub use config::EditorConfig;

/// Version of the exchange format written by [`export_scene`].
pub const SCENE_FORMAT_VERSION: &str = "1.0.0";
