//! Structural JSON dump of a scene.

use serde::Serialize;

use crate::config::PhongValues;
use crate::error::{SceneError, SceneResult};
use crate::scene::{Node, NodeId, SceneGraph};

#[derive(Serialize)]
struct SceneDump<'a> {
    root: NodeId,
    nodes: Vec<NodeEntry<'a>>,
    phong_values: &'a PhongValues,
}

#[derive(Serialize)]
struct NodeEntry<'a> {
    id: NodeId,
    #[serde(flatten)]
    node: &'a Node,
}

/// Serialize the live nodes and the Phong configuration to pretty JSON.
///
/// The format is a snapshot for inspection and is not read back.
pub fn dump_scene(graph: &SceneGraph, phong_values: &PhongValues) -> SceneResult<String> {
    let dump = SceneDump {
        root: graph.root(),
        nodes: graph
            .iter()
            .map(|(id, node)| NodeEntry { id, node })
            .collect(),
        phong_values,
    };
    serde_json::to_string_pretty(&dump).map_err(|e| SceneError::Serialize(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{NodeKind, Texture};
    use prism_math::{Transformation, Vec3};

    #[test]
    fn test_dump_contains_structure() {
        let mut scene = SceneGraph::new();
        let group = scene
            .add_group(scene.root(), Transformation::translation(Vec3::X))
            .unwrap();
        scene.set_tag(group, Some(3)).unwrap();
        scene
            .add_child(group, NodeKind::sphere(Vec3::new(1.0, 0.0, 0.0)))
            .unwrap();
        scene
            .add_child(group, NodeKind::texture_box(Texture::new("crate.png")))
            .unwrap();

        let json = dump_scene(&scene, &PhongValues::default()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["root"], 0);
        let nodes = value["nodes"].as_array().unwrap();
        assert_eq!(nodes.len(), 4);
        assert_eq!(nodes[1]["id"], 1);
        assert_eq!(nodes[1]["parent"], 0);
        assert_eq!(nodes[1]["kind"]["Group"]["tag"], 3);
        assert_eq!(nodes[1]["kind"]["Group"]["children"], serde_json::json!([2, 3]));
        assert!(nodes[2]["kind"]["Sphere"].is_object());
        assert_eq!(nodes[3]["kind"]["Textured"]["texture"]["source"], "crate.png");
        assert_eq!(value["phong_values"]["shininess"], 10.0);
    }
}
