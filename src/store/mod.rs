//! Graph storage: per-structure atom graphs and the scene aggregate.

pub mod structure;
pub mod rings;
pub mod index;
pub mod scene;

#[cfg(test)]
pub(crate) mod test_graph;

use serde::{Deserialize, Serialize};

use crate::types::{AtomId, EdgeId};

/// One adjacency entry: the neighbouring atom and the bond leading to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Neighbor {
    /// Atom at the far end.
    pub atom: AtomId,
    /// Bond connecting the two.
    pub edge: EdgeId,
}

/// Read access to an undirected atom/bond graph.
///
/// Implementations must return neighbours in a deterministic order.
pub trait AtomGraph {
    /// All atom ids in ascending order.
    fn atom_ids(&self) -> Vec<AtomId>;

    /// Whether the atom exists.
    fn contains_atom(&self, id: AtomId) -> bool;

    /// Neighbours of `id`; empty for unknown atoms.
    fn neighbors_of(&self, id: AtomId) -> Vec<Neighbor>;
}

pub use structure::{Structure, StructureKind, Representation};
pub use index::ConnectionIndex;
pub use scene::{BoundsRegion, IdWatermarks, PositionKey, Scene, Selection, StructureIds, StructureInfo};
