//! Concrete scene commands.
//!
//! Each command holds the before/after data it needs, so applying and
//! reverting never depend on anything captured from the caller. Commands go
//! into a [`HistoryStep<Scene>`](crate::history::HistoryStep).

use glam::DVec2;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::Result;
use crate::history::{BoundChange, Change, Insertable};
use crate::store::{PositionKey, Representation, Scene, Structure};
use crate::types::{Annotation, AtomId, HydrophobicContact, IntermolecularEdge, StructureId};

/// A batch of whole entities inserted or removed together.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SceneFragment {
    pub structures: Vec<Structure>,
    pub annotations: Vec<Annotation>,
    pub hydrophobic_contacts: Vec<HydrophobicContact>,
    pub intermolecular: Vec<IntermolecularEdge>,
}

impl SceneFragment {
    pub fn is_empty(&self) -> bool {
        self.structures.is_empty()
            && self.annotations.is_empty()
            && self.hydrophobic_contacts.is_empty()
            && self.intermolecular.is_empty()
    }

    /// Number of atoms over all structures.
    pub fn atom_count(&self) -> usize {
        self.structures.iter().map(|s| s.atom_count()).sum()
    }
}

impl Insertable<Scene> for SceneFragment {
    fn insert_into(&self, target: &mut Scene) -> Result<()> {
        target.insert_fragment(self)
    }

    fn remove_from(&self, target: &mut Scene) -> Result<()> {
        target.remove_fragment(self)
    }
}

/// Committed positions before and after an edit.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PositionUpdate {
    pub before: BTreeMap<PositionKey, DVec2>,
    pub after: BTreeMap<PositionKey, DVec2>,
}

impl PositionUpdate {
    /// Record the current position of every key in `after`.
    pub fn capture(scene: &Scene, after: BTreeMap<PositionKey, DVec2>) -> Self {
        let before = after
            .keys()
            .filter_map(|k| scene.position(*k).map(|p| (*k, p)))
            .collect();
        Self { before, after }
    }

    /// Shift every key by `offset` from its current position.
    pub fn translate(scene: &Scene, keys: impl IntoIterator<Item = PositionKey>, offset: DVec2) -> Self {
        let after = keys
            .into_iter()
            .filter_map(|k| scene.position(k).map(|p| (k, p + offset)))
            .collect();
        Self::capture(scene, after)
    }

    pub fn is_empty(&self) -> bool {
        self.after.is_empty()
    }
}

impl Change<Scene> for PositionUpdate {
    fn apply(&self, target: &mut Scene) -> Result<()> {
        target.set_positions(&self.after).map(|_| ())
    }

    fn revert(&self, target: &mut Scene) -> Result<()> {
        target.set_positions(&self.before).map(|_| ())
    }

    fn label(&self) -> &'static str {
        "positions"
    }
}

/// A structure replaced by a new version of itself.
#[derive(Debug, Clone)]
pub struct StructureSwap {
    pub before: Structure,
    pub after: Structure,
}

impl Change<Scene> for StructureSwap {
    fn apply(&self, target: &mut Scene) -> Result<()> {
        target.replace_structure(self.after.clone()).map(|_| ())
    }

    fn revert(&self, target: &mut Scene) -> Result<()> {
        target.replace_structure(self.before.clone()).map(|_| ())
    }

    fn label(&self) -> &'static str {
        "structure"
    }
}

/// An annotation replaced by a new version of itself.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationSwap {
    pub before: Annotation,
    pub after: Annotation,
}

impl Change<Scene> for AnnotationSwap {
    fn apply(&self, target: &mut Scene) -> Result<()> {
        target.replace_annotation(self.after.clone()).map(|_| ())
    }

    fn revert(&self, target: &mut Scene) -> Result<()> {
        target.replace_annotation(self.before.clone()).map(|_| ())
    }

    fn label(&self) -> &'static str {
        "annotation"
    }
}

/// A spline replaced by a new version of itself.
#[derive(Debug, Clone, PartialEq)]
pub struct HydrophobicSwap {
    pub before: HydrophobicContact,
    pub after: HydrophobicContact,
}

impl Change<Scene> for HydrophobicSwap {
    fn apply(&self, target: &mut Scene) -> Result<()> {
        target.replace_hydrophobic(self.after.clone()).map(|_| ())
    }

    fn revert(&self, target: &mut Scene) -> Result<()> {
        target.replace_hydrophobic(self.before.clone()).map(|_| ())
    }

    fn label(&self) -> &'static str {
        "hydrophobic"
    }
}

/// Committed selection before and after an edit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionUpdate {
    pub before: BTreeSet<AtomId>,
    pub after: BTreeSet<AtomId>,
}

impl SelectionUpdate {
    pub fn is_noop(&self) -> bool {
        self.before == self.after
    }
}

impl Change<Scene> for SelectionUpdate {
    fn apply(&self, target: &mut Scene) -> Result<()> {
        target.set_committed_selection(self.after.clone());
        Ok(())
    }

    fn revert(&self, target: &mut Scene) -> Result<()> {
        target.set_committed_selection(self.before.clone());
        Ok(())
    }

    fn label(&self) -> &'static str {
        "selection"
    }
}

/// Arguments of a representation switch: structure, before, after.
pub type RepresentationArgs = (StructureId, Representation, Representation);

fn set_after(scene: &mut Scene, args: &RepresentationArgs) -> Result<()> {
    scene.set_representation(args.0, args.2).map(|_| ())
}

fn set_before(scene: &mut Scene, args: &RepresentationArgs) -> Result<()> {
    scene.set_representation(args.0, args.1).map(|_| ())
}

/// Representation switch as a bound change.
pub fn representation_change(
    structure: StructureId,
    before: Representation,
    after: Representation,
) -> BoundChange<Scene, RepresentationArgs> {
    BoundChange::new((structure, before, after))
        .on_apply(set_after)
        .on_revert(set_before)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::scene_fingerprint;
    use crate::history::{AddRemoveChange, HistoryStep};
    use crate::store::structure::tests::{a, toluene};

    fn loaded() -> Scene {
        let mut scene = Scene::new();
        scene
            .insert_fragment(&SceneFragment {
                structures: vec![toluene(1)],
                ..SceneFragment::default()
            })
            .unwrap();
        scene
    }

    #[test]
    fn test_position_update_round_trip() {
        let mut scene = loaded();
        let print = scene_fingerprint(&scene);
        let update = PositionUpdate::translate(
            &scene,
            [PositionKey::Atom(a(7)), PositionKey::Atom(a(1))],
            DVec2::new(5.0, -5.0),
        );
        update.apply(&mut scene).unwrap();
        assert_eq!(scene.atom(a(7)).unwrap().coordinates, DVec2::new(25.0, -5.0));
        assert_ne!(scene_fingerprint(&scene), print);
        update.revert(&mut scene).unwrap();
        assert_eq!(scene_fingerprint(&scene), print);
        assert!(scene.validate().is_empty());
    }

    #[test]
    fn test_fragment_add_remove() {
        let mut scene = Scene::new();
        let change = AddRemoveChange::add(SceneFragment {
            structures: vec![toluene(4)],
            ..SceneFragment::default()
        });
        change.apply(&mut scene).unwrap();
        assert_eq!(scene.structures().count(), 1);
        change.revert(&mut scene).unwrap();
        assert!(scene.is_empty());
        assert!(scene.limits().is_none());
    }

    #[test]
    fn test_representation_step() {
        let mut scene = loaded();
        let sid = StructureId::new(1);
        let mut step: HistoryStep<Scene> = HistoryStep::new();
        step.push(representation_change(sid, Representation::Full, Representation::Circle));
        step.apply(&mut scene).unwrap();
        assert_eq!(scene.structure(sid).unwrap().representation, Representation::Circle);
        step.revert(&mut scene).unwrap();
        assert_eq!(scene.structure(sid).unwrap().representation, Representation::Full);
    }

    #[test]
    fn test_structure_swap_round_trip() {
        let mut scene = loaded();
        let print = scene_fingerprint(&scene);
        let before = scene.structure(StructureId::new(1)).unwrap().clone();
        let after = before.without_atoms(&[a(7)].into());
        let swap = StructureSwap { before, after };
        swap.apply(&mut scene).unwrap();
        assert!(scene.atom(a(7)).is_none());
        assert!(scene.validate().is_empty());
        swap.revert(&mut scene).unwrap();
        assert_eq!(scene_fingerprint(&scene), print);
    }
}
