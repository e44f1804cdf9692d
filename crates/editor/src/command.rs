//! JSON command protocol for driving the editor headlessly.

use serde::{Deserialize, Serialize};
use shared::{AnnotationId, Endpoint, IntermolecularKind, ObjectRef, Point2D, Structure, StructureId};

use crate::closest::CircleMode;
use crate::fixtures;
use crate::harness::Editor;
use crate::state::scene::{object_display_name, short_kind};

/// A command the editor can execute.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum EditorCommand {
    /// Add a full structure record
    AddStructure { structure: Structure },
    /// Add a carbon chain through the given points
    AddChain { name: String, points: Vec<Point2D> },
    /// Add a free label
    AddAnnotation {
        text: String,
        position: Point2D,
        #[serde(default)]
        structure_ids: Vec<StructureId>,
    },
    /// Replace the text of a label
    SetAnnotationText { annotation_id: AnnotationId, text: String },
    /// Attach a label to a structure
    LinkAnnotation {
        annotation_id: AnnotationId,
        structure_id: StructureId,
    },
    /// Detach a label from a structure
    UnlinkAnnotation {
        annotation_id: AnnotationId,
        structure_id: StructureId,
    },
    /// Add a spline through the given control points
    AddSpline { points: Vec<Point2D> },
    /// Add an inter-structure edge
    AddIntermolecular {
        kind: IntermolecularKind,
        from: Endpoint,
        to: Endpoint,
    },
    /// Remove the given objects
    Remove { targets: Vec<ObjectRef> },
    /// Remove the objects owning the selected entries
    RemoveSelected,
    /// Point selection
    Click {
        point: Point2D,
        #[serde(default)]
        additive: bool,
    },
    /// Rectangle selection
    SelectRectangle {
        from: Point2D,
        to: Point2D,
        #[serde(default)]
        additive: bool,
    },
    /// Freehand selection through the given outline vertices
    Lasso {
        points: Vec<Point2D>,
        #[serde(default)]
        additive: bool,
    },
    /// Replace the selection
    Select { targets: Vec<ObjectRef> },
    /// Clear selection.
    ClearSelection,
    /// Drag the selection from one point to another
    Move { from: Point2D, to: Point2D },
    /// Rotate the selection about a pivot (radians, counter-clockwise)
    Rotate { pivot: Point2D, angle: f64 },
    /// Reflect the selection across the line a-b
    Mirror { a: Point2D, b: Point2D },
    /// Hide or show the selection
    SetHidden { hidden: bool },
    /// Set or clear the colour of the selection
    SetColor {
        #[serde(default)]
        color: Option<String>,
    },
    /// Show a structure as its simplified circle, or back as atoms
    SetCircleMode { structure_id: StructureId, active: bool },
    /// Change the default circle mode of proximity searches
    SetDefaultCircleMode { mode: String },
    /// Nearest structure / atom / ring / control_point to a point
    Closest {
        category: String,
        point: Point2D,
        #[serde(default)]
        mode: Option<String>,
    },
    /// Undo the last operation.
    Undo,
    /// Redo the last undone operation.
    Redo,
    /// Inspect the scene: counts, selection and history position.
    Inspect,
    /// Export the scene as JSON.
    ExportScene,
}

/// Response from executing a command.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl CommandResponse {
    fn ok() -> Self {
        Self {
            success: true,
            error: None,
            data: None,
        }
    }

    fn ok_with_data(data: serde_json::Value) -> Self {
        Self {
            success: true,
            error: None,
            data: Some(data),
        }
    }

    fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(msg.into()),
            data: None,
        }
    }
}

fn to_value<T: Serialize>(value: &T) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
}

/// Execute a single command on the editor.
pub fn execute_command(editor: &mut Editor, cmd: EditorCommand) -> CommandResponse {
    match cmd {
        EditorCommand::AddStructure { structure } => {
            let id = editor.add_structure(structure);
            CommandResponse::ok_with_data(serde_json::json!({ "structure_id": id }))
        }

        EditorCommand::AddChain { name, points } => {
            let coords: Vec<(f64, f64)> = points.iter().map(|p| (p.x, p.y)).collect();
            let id = editor.add_structure(fixtures::chain(&name, &coords));
            CommandResponse::ok_with_data(serde_json::json!({ "structure_id": id }))
        }

        EditorCommand::AddAnnotation {
            text,
            position,
            structure_ids,
        } => {
            let mut annotation = fixtures::annotation(&text, position);
            annotation.structure_ids = structure_ids.into_iter().collect();
            let id = editor.add_annotation(annotation);
            CommandResponse::ok_with_data(serde_json::json!({ "annotation_id": id }))
        }

        EditorCommand::SetAnnotationText { annotation_id, text } => {
            let changed = editor.set_annotation_text(annotation_id, text);
            CommandResponse::ok_with_data(serde_json::json!({ "changed": changed }))
        }

        EditorCommand::LinkAnnotation {
            annotation_id,
            structure_id,
        } => {
            let changed = editor.link_annotation(annotation_id, structure_id);
            CommandResponse::ok_with_data(serde_json::json!({ "changed": changed }))
        }

        EditorCommand::UnlinkAnnotation {
            annotation_id,
            structure_id,
        } => {
            let changed = editor.unlink_annotation(annotation_id, structure_id);
            CommandResponse::ok_with_data(serde_json::json!({ "changed": changed }))
        }

        EditorCommand::AddSpline { points } => {
            let coords: Vec<(f64, f64)> = points.iter().map(|p| (p.x, p.y)).collect();
            let id = editor.add_spline(fixtures::spline(&coords));
            CommandResponse::ok_with_data(serde_json::json!({ "spline_id": id }))
        }

        EditorCommand::AddIntermolecular { kind, from, to } => {
            match editor.add_intermolecular(kind, from, to) {
                Some(r) => CommandResponse::ok_with_data(to_value(&ObjectRef::from(r))),
                None => CommandResponse::err(format!("Cannot add {:?} edge between these endpoints", kind)),
            }
        }

        EditorCommand::Remove { targets } => {
            let removed = editor.remove(&targets);
            CommandResponse::ok_with_data(serde_json::json!({ "removed": removed }))
        }

        EditorCommand::RemoveSelected => {
            let removed = editor.remove_selected();
            CommandResponse::ok_with_data(serde_json::json!({ "removed": removed }))
        }

        EditorCommand::Click { point, additive } => {
            let hit = editor.click(point, additive);
            CommandResponse::ok_with_data(serde_json::json!({
                "hit": hit.as_ref().map(to_value),
                "selected": to_value(&editor.selection.all()),
            }))
        }

        EditorCommand::SelectRectangle { from, to, additive } => {
            let found = editor.select_rectangle(from, to, additive);
            CommandResponse::ok_with_data(serde_json::json!({
                "found": found,
                "selected": to_value(&editor.selection.all()),
            }))
        }

        EditorCommand::Lasso { points, additive } => {
            let Some((first, rest)) = points.split_first() else {
                return CommandResponse::err("Lasso needs at least one point");
            };
            editor.begin_lasso(*first);
            for p in rest {
                editor.extend_lasso(*p);
            }
            let found = editor.end_lasso(additive);
            CommandResponse::ok_with_data(serde_json::json!({
                "found": found,
                "selected": to_value(&editor.selection.all()),
            }))
        }

        EditorCommand::Select { targets } => {
            editor.select(&targets);
            CommandResponse::ok_with_data(serde_json::json!({ "selected": to_value(&editor.selection.all()) }))
        }

        EditorCommand::ClearSelection => {
            editor.clear_selection();
            CommandResponse::ok()
        }

        EditorCommand::Move { from, to } => {
            if !editor.begin_move(from) {
                return CommandResponse::err("Nothing selected to move");
            }
            editor.drag_to(to);
            gesture_response(editor.end_gesture())
        }

        EditorCommand::Rotate { pivot, angle } => {
            if !editor.begin_rotation(pivot) {
                return CommandResponse::err("Nothing selected to rotate");
            }
            editor.rotate_to(angle);
            gesture_response(editor.end_gesture())
        }

        EditorCommand::Mirror { a, b } => {
            if editor.selection.count() == 0 {
                return CommandResponse::err("Nothing selected to mirror");
            }
            gesture_response(editor.mirror_selection(a, b))
        }

        EditorCommand::SetHidden { hidden } => {
            let changed = editor.set_selection_hidden(hidden);
            CommandResponse::ok_with_data(serde_json::json!({ "changed": changed }))
        }

        EditorCommand::SetColor { color } => {
            let changed = editor.set_selection_color(color);
            CommandResponse::ok_with_data(serde_json::json!({ "changed": changed }))
        }

        EditorCommand::SetCircleMode {
            structure_id,
            active,
        } => {
            let changed = editor.set_circle_mode(structure_id, active);
            CommandResponse::ok_with_data(serde_json::json!({ "changed": changed }))
        }

        EditorCommand::SetDefaultCircleMode { mode } => {
            let mode = CircleMode::from_name(&mode);
            let changed = editor.update_config(|c| c.proximity.circle_mode = mode);
            CommandResponse::ok_with_data(serde_json::json!({ "changed": changed }))
        }

        EditorCommand::Closest {
            category,
            point,
            mode,
        } => {
            let mode = mode.as_deref().map(CircleMode::from_name);
            let found = match category.as_str() {
                "structure" => editor.closest_structure(point, mode).map(|c| to_value(&c)),
                "atom" => editor.closest_atom(point, mode).map(|c| to_value(&c)),
                "atom_detailed" => editor.closest_atom_detailed(point).map(|c| to_value(&c)),
                "ring" => editor.closest_ring(point, mode).map(|c| to_value(&c)),
                "control_point" => editor.closest_control_point(point).map(|c| to_value(&c)),
                other => {
                    tracing::warn!("Unknown closest category '{}'", other);
                    return CommandResponse::err(format!("Unknown category: {other}"));
                }
            };
            CommandResponse::ok_with_data(serde_json::json!({ "closest": found }))
        }

        EditorCommand::Undo => {
            let success = editor.undo();
            CommandResponse::ok_with_data(serde_json::json!({ "undone": success }))
        }

        EditorCommand::Redo => {
            let success = editor.redo();
            CommandResponse::ok_with_data(serde_json::json!({ "redone": success }))
        }

        EditorCommand::Inspect => {
            let scene = &editor.scene.scene;
            let structures: Vec<serde_json::Value> = scene
                .structures
                .iter()
                .filter(|(_, s)| s.enabled)
                .map(|(id, s)| {
                    serde_json::json!({
                        "id": id,
                        "name": object_display_name(scene, ObjectRef::Structure { structure_id: id }),
                        "hidden": s.hidden,
                        "atom_count": s.atoms.len(),
                        "circle_mode": s.is_circle_mode(),
                    })
                })
                .collect();
            let selection_names: Vec<serde_json::Value> = editor
                .selection
                .all()
                .iter()
                .map(|t| serde_json::json!({ "kind": short_kind(*t), "name": object_display_name(scene, *t) }))
                .collect();
            CommandResponse::ok_with_data(serde_json::json!({
                "structure_count": structures.len(),
                "structures": structures,
                "annotation_count": editor.annotation_count(),
                "spline_count": editor.spline_count(),
                "intermolecular_count": editor.intermolecular_count(),
                "selected": to_value(&editor.selection.all()),
                "selection_names": selection_names,
                "cursor": editor.scene.cursor(),
                "step_count": editor.scene.step_count(),
            }))
        }

        EditorCommand::ExportScene => {
            let json = editor.export_scene_json();
            CommandResponse::ok_with_data(serde_json::json!({ "scene_json": json }))
        }
    }
}

fn gesture_response(step: Option<usize>) -> CommandResponse {
    CommandResponse::ok_with_data(serde_json::json!({ "step": step }))
}

/// Parse and execute a single JSON command string.
pub fn execute_json(editor: &mut Editor, json: &str) -> Result<CommandResponse, String> {
    let cmd: EditorCommand =
        serde_json::from_str(json).map_err(|e| format!("Invalid command JSON: {e}"))?;
    Ok(execute_command(editor, cmd))
}

/// Parse and execute multiple JSON commands (array).
pub fn execute_json_batch(editor: &mut Editor, json: &str) -> Result<Vec<CommandResponse>, String> {
    let cmds: Vec<EditorCommand> =
        serde_json::from_str(json).map_err(|e| format!("Invalid commands JSON: {e}"))?;
    Ok(cmds
        .into_iter()
        .map(|cmd| execute_command(editor, cmd))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_serde_undo() {
        let json = r#"{"command": "undo"}"#;
        let cmd: EditorCommand = serde_json::from_str(json).unwrap();
        assert!(matches!(cmd, EditorCommand::Undo));
    }

    #[test]
    fn test_command_serde_click_defaults_additive() {
        let json = r#"{"command": "click", "point": {"x": 1.0, "y": 2.0}}"#;
        let cmd: EditorCommand = serde_json::from_str(json).unwrap();
        match cmd {
            EditorCommand::Click { point, additive } => {
                assert_eq!(point, Point2D::new(1.0, 2.0));
                assert!(!additive);
            }
            _ => panic!("Expected Click"),
        }
    }

    #[test]
    fn test_command_serde_select_targets() {
        let json = r#"{"command": "select", "targets": [{"type": "structure", "structure_id": 0}]}"#;
        let cmd: EditorCommand = serde_json::from_str(json).unwrap();
        match cmd {
            EditorCommand::Select { targets } => {
                assert_eq!(targets, vec![ObjectRef::Structure { structure_id: 0 }])
            }
            _ => panic!("Expected Select"),
        }
    }

    #[test]
    fn test_execute_add_chain() {
        let mut e = Editor::new();
        let json = r#"{"command": "add_chain", "name": "ligand", "points": [{"x": 0.0, "y": 0.0}, {"x": 1.0, "y": 0.0}]}"#;
        let resp = execute_json(&mut e, json).unwrap();
        assert!(resp.success);
        assert_eq!(resp.data.unwrap()["structure_id"], 0);
        assert_eq!(e.structure_count(), 1);
    }

    #[test]
    fn test_execute_annotation_edits_are_undoable() {
        let mut e = Editor::new();
        e.add_structure(fixtures::chain("ligand", &[(0.0, 0.0), (1.0, 0.0)]));
        let batch = r#"[
            {"command": "add_annotation", "text": "site", "position": {"x": 0.0, "y": 2.0}},
            {"command": "set_annotation_text", "annotation_id": 0, "text": "pocket"},
            {"command": "link_annotation", "annotation_id": 0, "structure_id": 0},
            {"command": "link_annotation", "annotation_id": 0, "structure_id": 0}
        ]"#;
        let responses = execute_json_batch(&mut e, batch).unwrap();
        assert!(responses.iter().all(|r| r.success));
        assert_eq!(responses[1].data.as_ref().unwrap()["changed"], true);
        assert_eq!(responses[3].data.as_ref().unwrap()["changed"], false);

        let annotation = e.scene.scene.annotation(0).unwrap();
        assert_eq!(annotation.text, "pocket");
        assert!(annotation.structure_ids.contains(&0));

        e.undo();
        assert!(!e.scene.scene.annotation(0).unwrap().structure_ids.contains(&0));
        e.undo();
        assert_eq!(e.scene.scene.annotation(0).unwrap().text, "site");

        let resp = execute_json(&mut e, r#"{"command": "unlink_annotation", "annotation_id": 0, "structure_id": 0}"#).unwrap();
        assert_eq!(resp.data.unwrap()["changed"], false);
    }

    #[test]
    fn test_execute_inspect() {
        let mut e = Editor::new();
        e.add_structure(fixtures::chain("a", &[(0.0, 0.0)]));
        e.add_structure(fixtures::chain("b", &[(5.0, 0.0)]));

        let resp = execute_json(&mut e, r#"{"command": "inspect"}"#).unwrap();
        assert!(resp.success);
        let data = resp.data.unwrap();
        assert_eq!(data["structure_count"], 2);
        assert_eq!(data["cursor"], 1);
    }

    #[test]
    fn test_execute_undo_redo() {
        let mut e = Editor::new();
        e.add_structure(fixtures::chain("a", &[(0.0, 0.0)]));

        let resp = execute_json(&mut e, r#"{"command": "undo"}"#).unwrap();
        assert_eq!(resp.data.unwrap()["undone"], true);
        assert_eq!(e.structure_count(), 0);

        let resp = execute_json(&mut e, r#"{"command": "redo"}"#).unwrap();
        assert_eq!(resp.data.unwrap()["redone"], true);
        assert_eq!(e.structure_count(), 1);
    }

    #[test]
    fn test_execute_move_without_selection_fails() {
        let mut e = Editor::new();
        e.add_structure(fixtures::chain("a", &[(0.0, 0.0)]));
        let resp = execute_json(
            &mut e,
            r#"{"command": "move", "from": {"x": 0.0, "y": 0.0}, "to": {"x": 1.0, "y": 0.0}}"#,
        )
        .unwrap();
        assert!(!resp.success);
    }

    #[test]
    fn test_execute_closest_unknown_category() {
        let mut e = Editor::new();
        let resp = execute_json(
            &mut e,
            r#"{"command": "closest", "category": "bond", "point": {"x": 0.0, "y": 0.0}}"#,
        )
        .unwrap();
        assert!(!resp.success);
        assert!(resp.error.unwrap().contains("bond"));
    }

    #[test]
    fn test_execute_export_scene() {
        let mut e = Editor::new();
        e.add_structure(fixtures::chain("a", &[(0.0, 0.0)]));

        let resp = execute_json(&mut e, r#"{"command": "export_scene"}"#).unwrap();
        let data = resp.data.unwrap();
        let scene_json = data["scene_json"].as_str().unwrap();
        assert!(scene_json.contains("structures"));
    }

    #[test]
    fn test_execute_invalid_json() {
        let mut e = Editor::new();
        assert!(execute_json(&mut e, "not valid json").is_err());
    }
}
