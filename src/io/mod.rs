//! Scene exchange format: records, import and export.

pub mod format;
pub mod import;
pub mod export;

pub use format::{
    AnnotationRecord, AtomRecord, BondRecord, ControlPointRecord, HydrophobicRecord, IntermolecularRecord,
    RingRecord, RingSystemRecord, SceneDescription, StructureRecord,
};
pub use import::{plan_import, IdMap, ImportPlan, Renumbering};
pub use export::export_scene;
