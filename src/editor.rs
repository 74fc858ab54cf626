//! Editing façade over a [`Scene`].
//!
//! Every committed edit is built as one [`HistoryStep`], applied, and only
//! then recorded, so a rejected edit leaves both the scene and the history
//! untouched. Gestures (drags, rubber-band selection) run on temporary state
//! and produce a single step when committed.

use glam::DVec2;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::config::EditorConfig;
use crate::edit::{
    representation_change, AnnotationSwap, HydrophobicSwap, PositionUpdate, SceneFragment, SelectionUpdate,
    StructureSwap,
};
use crate::error::{ImportError, Result, SceneError};
use crate::history::{AddRemoveChange, EditAction, History, HistoryStep};
use crate::io::{export_scene, plan_import, ImportPlan, SceneDescription};
use crate::resolver::{AffectedResolver, AffectedSet, MoveGranularity, RemovalRequest, RemovalSet};
use crate::store::{BoundsRegion, PositionKey, Representation, Scene, StructureIds, StructureInfo};
use crate::types::{Atom, AtomId, Edge, IntermolecularEdge, IntermolecularId, IntermolecularKind, StructureId};

/// Hooks for the rendering layer. All default to no-ops.
pub trait SceneObserver {
    /// A positioned element moved by `offset` in a committed edit.
    fn geometry_moved(&mut self, _entity: PositionKey, _offset: DVec2) {}

    /// Bounds of `region` were fully recomputed.
    fn rescan_requested(&mut self, _region: BoundsRegion) {}

    /// A step was committed, undone or redone.
    fn history_changed(&mut self, _actions: &BTreeSet<EditAction>) {}
}

/// An in-progress drag.
#[derive(Debug, Clone)]
struct DragGesture {
    origins: BTreeMap<PositionKey, DVec2>,
    granularity: MoveGranularity,
    offset: DVec2,
}

/// Editor over one scene with undo/redo.
pub struct SceneEditor {
    scene: Scene,
    history: History<Scene>,
    config: EditorConfig,
    observer: Option<Box<dyn SceneObserver + Send>>,
    drag: Option<DragGesture>,
}

/// Editor behind the single exclusive lock hosts use to share it.
pub type SharedEditor = Arc<Mutex<SceneEditor>>;

impl Default for SceneEditor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl std::fmt::Debug for SceneEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneEditor")
            .field("history", &self.history)
            .field("config", &self.config)
            .field("dragging", &self.drag.is_some())
            .finish()
    }
}

impl SceneEditor {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            scene: Scene::with_curve_settings(config.spline_samples_per_segment, config.spline_stroke_radius),
            history: History::new(config.can_clear_scene),
            config,
            observer: None,
            drag: None,
        }
    }

    /// Wrap in an `Arc<Mutex<_>>`.
    pub fn shared(self) -> SharedEditor {
        Arc::new(Mutex::new(self))
    }

    pub fn set_observer(&mut self, observer: Box<dyn SceneObserver + Send>) {
        self.observer = Some(observer);
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn history(&self) -> &History<Scene> {
        &self.history
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn structures(&self) -> impl Iterator<Item = &crate::store::Structure> + '_ {
        self.scene.structures()
    }

    pub fn ids_for_structure(&self, structure: StructureId) -> Option<StructureIds> {
        self.scene.ids_for_structure(structure)
    }

    pub fn additional_information(&self, only_selected: bool) -> Vec<StructureInfo> {
        self.scene.additional_information(only_selected)
    }

    pub fn intermolecular_by_type(&self, kind: IntermolecularKind, id: IntermolecularId) -> Option<&IntermolecularEdge> {
        self.scene.intermolecular_by_type(kind, id)
    }

    pub fn resolver(&self) -> AffectedResolver<'_> {
        AffectedResolver::new(&self.scene)
    }

    pub fn export(&self) -> SceneDescription {
        export_scene(&self.scene)
    }

    // =========================================================================
    // Step plumbing
    // =========================================================================

    fn notify_rescans(&mut self) {
        let regions = self.scene.take_rescans();
        if let Some(observer) = self.observer.as_mut() {
            for region in regions {
                observer.rescan_requested(region);
            }
        }
    }

    fn notify_moved(&mut self, update: &PositionUpdate) {
        let Some(observer) = self.observer.as_mut() else { return };
        for (key, after) in &update.after {
            if let Some(before) = update.before.get(key) {
                observer.geometry_moved(*key, *after - *before);
            }
        }
    }

    /// Apply `step` and record it. Nothing is recorded if apply fails.
    fn commit(&mut self, step: HistoryStep<Scene>) -> Result<()> {
        if !step.has_changes() {
            return Ok(());
        }
        step.apply(&mut self.scene)?;
        let actions = step.actions().clone();
        self.history.add_new_step(step);
        self.notify_rescans();
        if let Some(observer) = self.observer.as_mut() {
            observer.history_changed(&actions);
        }
        Ok(())
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Replace the scene with `description`. History restarts with the load
    /// as its first step.
    pub fn load(&mut self, description: &SceneDescription) -> Result<ImportPlan, ImportError> {
        let config = &self.config;
        self.scene = Scene::with_curve_settings(config.spline_samples_per_segment, config.spline_stroke_radius);
        self.history = History::new(config.can_clear_scene);
        self.drag = None;
        self.import(description)
    }

    /// Merge `description` into the scene as one undoable step.
    pub fn import(&mut self, description: &SceneDescription) -> Result<ImportPlan, ImportError> {
        let plan = plan_import(&self.scene, description, &self.config)?;
        self.scene.check_insertable(&plan.fragment)?;
        let mut step = HistoryStep::new().with_action(EditAction::Import);
        step.push(AddRemoveChange::add(plan.fragment.clone()));
        self.commit(step)?;
        tracing::info!(
            structures = plan.fragment.structures.len(),
            atoms = plan.fragment.atom_count(),
            intermolecular = plan.fragment.intermolecular.len(),
            "Imported scene description"
        );
        Ok(plan)
    }

    /// Parse and import a JSON scene description.
    pub fn import_json(&mut self, json: &str) -> Result<ImportPlan, ImportError> {
        let description = SceneDescription::from_json_str(json)?;
        self.import(&description)
    }

    /// Insert whole entities as one step.
    pub fn add_fragment(&mut self, fragment: SceneFragment) -> Result<()> {
        self.scene.check_insertable(&fragment)?;
        let mut step = HistoryStep::new().with_action(EditAction::Add);
        step.push(AddRemoveChange::add(fragment));
        self.commit(step)
    }

    // =========================================================================
    // Structure edits
    // =========================================================================

    /// Add atoms and bonds to an existing structure. Rings are re-perceived;
    /// existing rings keep their ids.
    pub fn add_atoms(&mut self, structure: StructureId, atoms: Vec<Atom>, edges: Vec<Edge>) -> Result<()> {
        let before = self
            .scene
            .structure(structure)
            .ok_or(SceneError::UnknownStructure(structure))?
            .clone();
        let added = atoms.len();
        let after = before.extended(atoms, edges)?;
        let mut step = HistoryStep::new().with_action(EditAction::Add);
        step.push(StructureSwap { before, after });
        self.commit(step)?;
        tracing::debug!(structure = %structure, atoms = added, "Added atoms");
        Ok(())
    }

    /// Add bonds between existing atoms of a structure.
    pub fn add_edges(&mut self, structure: StructureId, edges: Vec<Edge>) -> Result<()> {
        self.add_atoms(structure, Vec::new(), edges)
    }

    /// Switch a structure between full and circle representation.
    pub fn set_representation(&mut self, structure: StructureId, representation: Representation) -> Result<()> {
        let before = self
            .scene
            .structure(structure)
            .ok_or(SceneError::UnknownStructure(structure))?
            .representation;
        if before == representation {
            return Ok(());
        }
        let mut step = HistoryStep::new().with_action(EditAction::Representation);
        step.push(representation_change(structure, before, representation));
        self.commit(step)
    }

    /// Flip a structure between full and circle representation.
    pub fn toggle_representation(&mut self, structure: StructureId) -> Result<Representation> {
        let next = self
            .scene
            .structure(structure)
            .ok_or(SceneError::UnknownStructure(structure))?
            .representation
            .toggled();
        self.set_representation(structure, next)?;
        Ok(next)
    }

    // =========================================================================
    // Moving
    // =========================================================================

    /// Positions that follow a move of `affected`.
    fn move_keys(&self, affected: &AffectedSet, granularity: MoveGranularity) -> Vec<PositionKey> {
        let mut keys: Vec<PositionKey> = affected.atoms.iter().map(|a| PositionKey::Atom(*a)).collect();
        keys.extend(affected.annotations.iter().map(|a| PositionKey::Annotation(*a)));
        for (spline, points) in &affected.control_points {
            keys.extend(points.iter().map(|cp| PositionKey::ControlPoint(*spline, *cp)));
        }
        if granularity == MoveGranularity::Structure {
            keys.extend(affected.structures.iter().map(|s| PositionKey::StructureOffset(*s)));
        }
        keys
    }

    /// Move atoms (and everything linked to them) by `offset` as one step.
    pub fn move_atoms(&mut self, atoms: &BTreeSet<AtomId>, offset: DVec2, granularity: MoveGranularity) -> Result<()> {
        if atoms.is_empty() {
            return Err(SceneError::EmptySelection);
        }
        if let Some(missing) = atoms.iter().find(|a| self.scene.structure_of_atom(**a).is_none()) {
            return Err(SceneError::UnknownAtom(*missing));
        }
        let affected = self.resolver().affected_by_move(atoms, granularity);
        let update = PositionUpdate::translate(&self.scene, self.move_keys(&affected, granularity), offset);
        self.commit_move(update)?;
        tracing::debug!(atoms = affected.atoms.len(), dx = offset.x, dy = offset.y, "Moved atoms");
        Ok(())
    }

    fn commit_move(&mut self, update: PositionUpdate) -> Result<()> {
        if update.is_empty() {
            return Ok(());
        }
        let mut step = HistoryStep::new().with_action(EditAction::Move);
        step.push(update.clone());
        self.commit(step)?;
        self.notify_moved(&update);
        Ok(())
    }

    /// Start dragging `atoms`. Replaces any drag in progress.
    pub fn begin_drag(&mut self, atoms: &BTreeSet<AtomId>, granularity: MoveGranularity) -> Result<()> {
        if atoms.is_empty() {
            return Err(SceneError::EmptySelection);
        }
        if let Some(missing) = atoms.iter().find(|a| self.scene.structure_of_atom(**a).is_none()) {
            return Err(SceneError::UnknownAtom(*missing));
        }
        self.discard_drag();
        let affected = self.resolver().affected_by_move(atoms, granularity);
        let origins = self
            .move_keys(&affected, granularity)
            .into_iter()
            .filter_map(|k| self.scene.position(k).map(|p| (k, p)))
            .collect();
        self.drag = Some(DragGesture {
            origins,
            granularity,
            offset: DVec2::ZERO,
        });
        Ok(())
    }

    /// Move the drag to `offset` from its origin. Only temporary positions
    /// change. Returns false when no drag is in progress.
    pub fn drag_to(&mut self, offset: DVec2) -> Result<bool> {
        let Some(drag) = self.drag.as_mut() else { return Ok(false) };
        drag.offset = offset;
        let temp: BTreeMap<PositionKey, DVec2> = drag
            .origins
            .iter()
            .filter(|(k, _)| !matches!(k, PositionKey::StructureOffset(_)))
            .map(|(k, p)| (*k, *p + offset))
            .collect();
        self.scene.set_temp_positions(&temp)?;
        Ok(true)
    }

    /// End the drag, committing its last offset as one step.
    pub fn commit_drag(&mut self) -> Result<bool> {
        let Some(drag) = self.drag.take() else { return Ok(false) };
        self.scene.clear_temp_positions();
        if drag.offset == DVec2::ZERO {
            return Ok(true);
        }
        let after = drag.origins.iter().map(|(k, p)| (*k, *p + drag.offset)).collect();
        let update = PositionUpdate {
            before: drag.origins,
            after,
        };
        self.commit_move(update)?;
        tracing::debug!(granularity = ?drag.granularity, dx = drag.offset.x, dy = drag.offset.y, "Committed drag");
        Ok(true)
    }

    /// End the drag leaving committed state untouched.
    pub fn discard_drag(&mut self) {
        if self.drag.take().is_some() {
            self.scene.clear_temp_positions();
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    // =========================================================================
    // Selection
    // =========================================================================

    fn commit_selection_change(&mut self, after: BTreeSet<AtomId>) -> Result<()> {
        let update = SelectionUpdate {
            before: self.scene.selection().committed().clone(),
            after,
        };
        if update.is_noop() {
            self.scene.discard_temporary_selection();
            return Ok(());
        }
        let mut step = HistoryStep::new().with_action(EditAction::Select);
        step.push(update);
        self.commit(step)
    }

    /// Add atoms to the committed selection as one step.
    pub fn select(&mut self, atoms: &BTreeSet<AtomId>) -> Result<()> {
        if let Some(missing) = atoms.iter().find(|a| self.scene.structure_of_atom(**a).is_none()) {
            return Err(SceneError::UnknownAtom(*missing));
        }
        let after = self.scene.selection().committed().union(atoms).copied().collect();
        self.commit_selection_change(after)
    }

    /// Remove atoms from the committed selection as one step.
    pub fn unselect(&mut self, atoms: &BTreeSet<AtomId>) -> Result<()> {
        if let Some(missing) = atoms.iter().find(|a| self.scene.structure_of_atom(**a).is_none()) {
            return Err(SceneError::UnknownAtom(*missing));
        }
        let after = self.scene.selection().committed().difference(atoms).copied().collect();
        self.commit_selection_change(after)
    }

    /// Change the temporary selection during a gesture.
    pub fn select_temporary(&mut self, atoms: &BTreeSet<AtomId>, selected: bool) -> Result<()> {
        if selected {
            self.scene.select_atoms(atoms, true)
        } else {
            self.scene.unselect_atoms(atoms, true)
        }
    }

    /// Fold the temporary selection into the committed one as one step.
    pub fn commit_selection(&mut self) -> Result<()> {
        if !self.scene.selection().has_temporary() {
            return Ok(());
        }
        let after = self.scene.selection().effective();
        self.commit_selection_change(after)
    }

    /// Drop the temporary selection.
    pub fn discard_selection(&mut self) {
        self.scene.discard_temporary_selection();
    }

    // =========================================================================
    // Removal
    // =========================================================================

    /// Build the step removing `set`. Order matters on apply: intermolecular
    /// edges and whole entities go first, then links to removed atoms are
    /// dropped, and only then can atoms leave their structures.
    fn removal_step(&self, set: &RemovalSet) -> HistoryStep<Scene> {
        let keys = set.intermolecular_keys();
        let fragment = SceneFragment {
            structures: set
                .structures
                .iter()
                .filter_map(|id| self.scene.structure(*id).cloned())
                .collect(),
            annotations: set
                .annotations
                .iter()
                .filter_map(|id| self.scene.annotation(*id).cloned())
                .collect(),
            hydrophobic_contacts: set
                .hydrophobic_contacts
                .iter()
                .filter_map(|id| self.scene.hydrophobic_contact(*id).cloned())
                .collect(),
            intermolecular: keys
                .iter()
                .filter_map(|k| self.scene.intermolecular(*k).cloned())
                .collect(),
        };

        let mut step = HistoryStep::new().with_action(EditAction::Remove);
        step.push(AddRemoveChange::remove(fragment));

        for (id, atoms) in &set.annotation_unlinks {
            if let Some(before) = self.scene.annotation(*id) {
                let mut after = before.clone();
                after.atom_links.retain(|a| !atoms.contains(a));
                step.push(AnnotationSwap {
                    before: before.clone(),
                    after,
                });
            }
        }
        for (id, points) in &set.control_point_unlinks {
            if let Some(before) = self.scene.hydrophobic_contact(*id) {
                let mut after = before.clone();
                for cp in after.control_points.iter_mut().filter(|cp| points.contains(&cp.id)) {
                    cp.atom_links.retain(|a| !set.atoms.contains(a));
                }
                step.push(HydrophobicSwap {
                    before: before.clone(),
                    after,
                });
            }
        }
        for (sid, atoms) in &set.partial {
            if let Some(before) = self.scene.structure(*sid) {
                step.push(StructureSwap {
                    before: before.clone(),
                    after: before.without_atoms(atoms),
                });
            }
        }

        let selection = SelectionUpdate {
            before: self.scene.selection().committed().clone(),
            after: self
                .scene
                .selection()
                .committed()
                .difference(&set.atoms)
                .copied()
                .collect(),
        };
        if !selection.is_noop() {
            step.push(selection);
        }
        step
    }

    /// Remove `request` and everything depending on it as one step.
    /// Returns the resolved closure.
    pub fn remove(&mut self, request: &RemovalRequest) -> Result<RemovalSet> {
        if request.is_empty() {
            return Err(SceneError::EmptySelection);
        }
        let set = self.resolver().removal_closure(request)?;
        let step = self.removal_step(&set);
        if let Err(e) = self.commit(step) {
            tracing::warn!(error = %e, "Removal rejected");
            return Err(e);
        }
        tracing::info!(
            structures = set.structures.len(),
            atoms = set.atoms.len(),
            edges = set.edges.len(),
            annotations = set.annotations.len(),
            "Removed entities"
        );
        Ok(set)
    }

    /// Remove the committed selection.
    pub fn remove_selected(&mut self) -> Result<RemovalSet> {
        let atoms = self.scene.selection().committed().clone();
        self.remove(&RemovalRequest::atoms(atoms))
    }

    // =========================================================================
    // Mirroring
    // =========================================================================

    /// Mirror `atoms` of one structure about the vertical axis through
    /// their centre. An empty set mirrors the whole structure. Linked
    /// annotations and control points follow.
    pub fn mirror(&mut self, structure: StructureId, atoms: &BTreeSet<AtomId>) -> Result<()> {
        let before = self
            .scene
            .structure(structure)
            .ok_or(SceneError::UnknownStructure(structure))?
            .clone();
        let atoms: BTreeSet<AtomId> = if atoms.is_empty() {
            before.atoms().map(|a| a.id).collect()
        } else {
            atoms.clone()
        };
        if let Some(missing) = atoms.iter().find(|a| before.atom(**a).is_none()) {
            return Err(SceneError::UnknownAtom(*missing));
        }
        let Some(limits) = crate::types::Limits::from_points(atoms.iter().filter_map(|a| before.atom(*a)).map(|a| a.coordinates))
        else {
            return Err(SceneError::EmptySelection);
        };
        let axis = limits.center().x;
        let reflect = |p: DVec2| DVec2::new(2.0 * axis - p.x, p.y);

        let affected = self.resolver().affected_by_move(&atoms, MoveGranularity::Atoms);
        let mut linked = BTreeMap::new();
        for ann in &affected.annotations {
            if let Some(p) = self.scene.position(PositionKey::Annotation(*ann)) {
                linked.insert(PositionKey::Annotation(*ann), reflect(p));
            }
        }
        for (spline, points) in &affected.control_points {
            for cp in points {
                let key = PositionKey::ControlPoint(*spline, *cp);
                if let Some(p) = self.scene.position(key) {
                    linked.insert(key, reflect(p));
                }
            }
        }

        let mut step = HistoryStep::new().with_action(EditAction::Mirror);
        step.push(StructureSwap {
            after: before.mirrored(&atoms, axis),
            before,
        });
        let update = PositionUpdate::capture(&self.scene, linked);
        if !update.is_empty() {
            step.push(update);
        }
        self.commit(step)?;
        tracing::debug!(structure = %structure, atoms = atoms.len(), axis, "Mirrored atoms");
        Ok(())
    }

    // =========================================================================
    // History
    // =========================================================================

    pub fn can_undo(&self) -> bool {
        self.history.can_revert()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_advance()
    }

    /// Undo the current step. Returns false at the floor.
    pub fn undo(&mut self) -> Result<bool> {
        self.discard_drag();
        let (result, actions) = match self.history.revert() {
            Some(step) => (step.revert(&mut self.scene), step.actions().clone()),
            None => return Ok(false),
        };
        if let Err(e) = result {
            self.history.advance();
            return Err(e);
        }
        self.scene.discard_temporary_selection();
        self.notify_rescans();
        if let Some(observer) = self.observer.as_mut() {
            observer.history_changed(&actions);
        }
        Ok(true)
    }

    /// Redo the next step. Returns false at the tip.
    pub fn redo(&mut self) -> Result<bool> {
        self.discard_drag();
        let (result, actions) = match self.history.advance() {
            Some(step) => (step.apply(&mut self.scene), step.actions().clone()),
            None => return Ok(false),
        };
        if let Err(e) = result {
            self.history.revert();
            return Err(e);
        }
        self.scene.discard_temporary_selection();
        self.notify_rescans();
        if let Some(observer) = self.observer.as_mut() {
            observer.history_changed(&actions);
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::scene_fingerprint;
    use crate::store::structure::tests::{a, toluene};
    use crate::types::{Annotation, AnnotationId, BondType, EdgeId};

    fn editor() -> SceneEditor {
        let mut editor = SceneEditor::default();
        editor
            .add_fragment(SceneFragment {
                structures: vec![toluene(1)],
                annotations: vec![Annotation::new(
                    AnnotationId::new(1),
                    "CH3",
                    DVec2::new(30.0, 0.0),
                    DVec2::new(4.0, 2.0),
                )
                .attached(StructureId::new(1), [a(7)])],
                ..SceneFragment::default()
            })
            .unwrap();
        editor
    }

    #[derive(Default)]
    struct Recorder {
        moved: Vec<(PositionKey, DVec2)>,
    }

    struct Shared(Arc<Mutex<Recorder>>);

    impl SceneObserver for Shared {
        fn geometry_moved(&mut self, entity: PositionKey, offset: DVec2) {
            self.0.lock().moved.push((entity, offset));
        }
    }

    #[test]
    fn test_first_step_cannot_be_undone() {
        let mut editor = editor();
        assert!(!editor.can_undo());
        assert!(!editor.undo().unwrap());
        assert_eq!(editor.history().cur_step(), 0);
    }

    #[test]
    fn test_move_undo_redo() {
        let mut editor = editor();
        let loaded = scene_fingerprint(editor.scene());
        editor
            .move_atoms(&[a(7)].into(), DVec2::new(0.0, 10.0), MoveGranularity::Atoms)
            .unwrap();
        // The annotation is linked only to atom 7, so it follows.
        assert_eq!(
            editor.scene().annotation(AnnotationId::new(1)).unwrap().coordinates,
            DVec2::new(30.0, 10.0)
        );
        let moved = scene_fingerprint(editor.scene());

        assert!(editor.undo().unwrap());
        assert_eq!(scene_fingerprint(editor.scene()), loaded);
        assert!(editor.redo().unwrap());
        assert_eq!(scene_fingerprint(editor.scene()), moved);
        assert!(!editor.redo().unwrap());
    }

    #[test]
    fn test_annotation_waits_for_all_links() {
        let mut editor = editor();
        editor
            .add_fragment(SceneFragment {
                annotations: vec![Annotation::new(
                    AnnotationId::new(2),
                    "C1-C7",
                    DVec2::new(15.0, -10.0),
                    DVec2::new(4.0, 2.0),
                )
                .attached(StructureId::new(1), [a(1), a(7)])],
                ..SceneFragment::default()
            })
            .unwrap();
        editor
            .move_atoms(&[a(7)].into(), DVec2::new(0.0, 10.0), MoveGranularity::Atoms)
            .unwrap();
        assert_eq!(
            editor.scene().annotation(AnnotationId::new(2)).unwrap().coordinates,
            DVec2::new(15.0, -10.0)
        );
    }

    #[test]
    fn test_toggle_representation_undo() {
        let mut editor = editor();
        assert_eq!(editor.toggle_representation(StructureId::new(1)).unwrap(), Representation::Circle);
        assert_eq!(
            editor.scene().structure(StructureId::new(1)).unwrap().representation,
            Representation::Circle
        );
        assert!(editor.undo().unwrap());
        assert_eq!(
            editor.scene().structure(StructureId::new(1)).unwrap().representation,
            Representation::Full
        );
        assert!(editor.toggle_representation(StructureId::new(9)).is_err());
    }

    #[test]
    fn test_observer_sees_committed_moves() {
        let mut editor = editor();
        let recorder = Arc::new(Mutex::new(Recorder::default()));
        editor.set_observer(Box::new(Shared(recorder.clone())));
        editor
            .move_atoms(&[a(2)].into(), DVec2::new(1.0, 0.0), MoveGranularity::Atoms)
            .unwrap();
        assert_eq!(recorder.lock().moved, vec![(PositionKey::Atom(a(2)), DVec2::new(1.0, 0.0))]);
    }

    #[test]
    fn test_drag_commits_one_step() {
        let mut editor = editor();
        let steps = editor.history().len();
        let before = scene_fingerprint(editor.scene());
        editor.begin_drag(&[a(3)].into(), MoveGranularity::Structure).unwrap();
        for i in 1..=5 {
            editor.drag_to(DVec2::new(i as f64, 0.0)).unwrap();
        }
        assert_eq!(editor.history().len(), steps);
        assert_eq!(editor.scene().atom(a(1)).unwrap().temp_coordinates, Some(DVec2::new(15.0, 0.0)));
        assert!(editor.commit_drag().unwrap());
        assert_eq!(editor.history().len(), steps + 1);
        assert_eq!(editor.scene().atom(a(1)).unwrap().coordinates, DVec2::new(15.0, 0.0));
        assert_eq!(editor.scene().structure(StructureId::new(1)).unwrap().movement_offset, DVec2::new(5.0, 0.0));
        editor.undo().unwrap();
        assert_eq!(scene_fingerprint(editor.scene()), before);
    }

    #[test]
    fn test_discarded_drag_leaves_scene() {
        let mut editor = editor();
        let before = scene_fingerprint(editor.scene());
        editor.begin_drag(&[a(3)].into(), MoveGranularity::Atoms).unwrap();
        editor.drag_to(DVec2::new(7.0, 7.0)).unwrap();
        editor.discard_drag();
        assert_eq!(scene_fingerprint(editor.scene()), before);
        assert!(editor.scene().atom(a(3)).unwrap().temp_coordinates.is_none());
    }

    #[test]
    fn test_remove_atom_then_undo() {
        let mut editor = editor();
        editor.select(&[a(7), a(2)].into()).unwrap();
        let before = scene_fingerprint(editor.scene());

        let set = editor.remove(&RemovalRequest::atoms([a(7)])).unwrap();
        assert!(set.structures.is_empty());
        assert!(editor.scene().atom(a(7)).is_none());
        assert!(editor.scene().annotation(AnnotationId::new(1)).unwrap().atom_links.is_empty());
        assert_eq!(editor.scene().selection().committed(), &[a(2)].into());
        assert!(editor.scene().validate().is_empty());

        editor.undo().unwrap();
        assert_eq!(scene_fingerprint(editor.scene()), before);
        assert!(editor.scene().validate().is_empty());
    }

    #[test]
    fn test_remove_structure_then_undo() {
        let mut editor = editor();
        let before = scene_fingerprint(editor.scene());
        let set = editor.remove(&RemovalRequest::structures([StructureId::new(1)])).unwrap();
        assert_eq!(set.annotations, [AnnotationId::new(1)].into());
        assert!(editor.scene().is_empty());
        editor.undo().unwrap();
        assert_eq!(scene_fingerprint(editor.scene()), before);
    }

    #[test]
    fn test_rejected_removal_records_nothing() {
        let mut editor = editor();
        let steps = editor.history().len();
        assert!(editor.remove(&RemovalRequest::atoms([a(42)])).is_err());
        assert_eq!(editor.history().len(), steps);
    }

    #[test]
    fn test_mirror_swaps_wedges_and_reverts() {
        let mut editor = editor();
        let sid = StructureId::new(1);
        editor
            .add_atoms(
                sid,
                vec![Atom::new(a(8), "O", DVec2::new(30.0, 10.0))],
                vec![Edge::new(EdgeId::new(8), a(7), a(8), BondType::Up)],
            )
            .unwrap();
        let before = scene_fingerprint(editor.scene());
        editor.mirror(sid, &BTreeSet::new()).unwrap();
        let s = editor.scene().structure(sid).unwrap();
        assert_eq!(s.edge(EdgeId::new(8)).unwrap().bond_type, BondType::Down);
        // Atoms span x in [-10, 30]; the axis is x = 10.
        assert_eq!(s.atom(a(8)).unwrap().coordinates, DVec2::new(-10.0, 10.0));
        assert_eq!(
            editor.scene().annotation(AnnotationId::new(1)).unwrap().coordinates,
            DVec2::new(-10.0, 0.0)
        );
        editor.undo().unwrap();
        assert_eq!(scene_fingerprint(editor.scene()), before);
    }

    #[test]
    fn test_temporary_selection_commit() {
        let mut editor = editor();
        editor.select_temporary(&[a(1), a(2)].into(), true).unwrap();
        assert!(editor.scene().selection().committed().is_empty());
        editor.commit_selection().unwrap();
        assert_eq!(editor.scene().selection().committed(), &[a(1), a(2)].into());
        assert!(!editor.scene().selection().has_temporary());
        editor.undo().unwrap();
        assert!(editor.scene().selection().committed().is_empty());
    }

    #[test]
    fn test_new_edit_truncates_redo() {
        let mut editor = editor();
        editor.set_representation(StructureId::new(1), Representation::Circle).unwrap();
        editor.undo().unwrap();
        assert!(editor.can_redo());
        editor.select(&[a(1)].into()).unwrap();
        assert!(!editor.can_redo());
        assert_eq!(editor.history().len(), 2);
    }
}
