//! Entity types of the scene graph.

pub mod ids;
pub mod geometry;
pub mod atom;
pub mod edge;
pub mod ring;
pub mod annotation;
pub mod intermolecular;

pub use ids::{
    AtomId, EdgeId, StructureId, RingId, RingSystemId, AnnotationId, HydrophobicId,
    ControlPointId, IntermolecularId, IntermolecularKey,
};
pub use geometry::{Limits, sample_catmull_rom, curve_limits};
pub use atom::{Atom, LabelSide};
pub use edge::{Edge, BondType};
pub use ring::{Ring, RingSystem};
pub use annotation::{Annotation, ControlPoint, HydrophobicContact};
pub use intermolecular::{IntermolecularKind, IntermolecularEdge, Endpoint, EndpointKind};
