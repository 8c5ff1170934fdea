use crate::config::{GlassTarget, SceneConfig};
use atrium_assets::{ChildSelector, ModelData};
use atrium_common::Transform;
use atrium_render::PlacedModel;
use std::sync::Arc;

/// How one glass target resolved against the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetResolution {
    /// Found through the primary selector.
    Resolved { node: usize },
    /// The primary selector missed; the fallback found it.
    Fallback { node: usize },
    /// The top-level node does not exist.
    MissingRoot,
    /// The root exists but no selector matched a child.
    MissingChild,
}

impl TargetResolution {
    pub fn node(&self) -> Option<usize> {
        match self {
            Self::Resolved { node } | Self::Fallback { node } => Some(*node),
            Self::MissingRoot | Self::MissingChild => None,
        }
    }
}

pub fn resolve_target(model: &ModelData, target: &GlassTarget) -> TargetResolution {
    let Some(root) = model.find_root(&target.root) else {
        return TargetResolution::MissingRoot;
    };
    if let Some(node) = model.child(root, &target.child) {
        warn_if_positional(model, target, &target.child, node);
        return TargetResolution::Resolved { node };
    }
    match target.fallback.as_ref() {
        Some(fallback) => match model.child(root, fallback) {
            Some(node) => {
                tracing::warn!(
                    root = %target.root,
                    primary = %target.child,
                    fallback = %fallback,
                    "glass target resolved through fallback"
                );
                TargetResolution::Fallback { node }
            }
            None => TargetResolution::MissingChild,
        },
        None => TargetResolution::MissingChild,
    }
}

fn warn_if_positional(model: &ModelData, target: &GlassTarget, selector: &ChildSelector, node: usize) {
    if let ChildSelector::Index(i) = selector {
        tracing::warn!(
            root = %target.root,
            index = i,
            resolved = model.node_name(node).unwrap_or("<unnamed>"),
            "glass target selected by position; prefer a name selector"
        );
    }
}

/// Scale the model and apply the glass material to every resolvable target.
/// Unresolvable targets are logged and skipped; the model is placed regardless.
pub fn place_model(model: ModelData, config: &SceneConfig) -> (PlacedModel, Vec<TargetResolution>) {
    let model = Arc::new(model);
    let mut placed = PlacedModel::new(model.clone(), Transform::uniform_scale(config.model.scale));
    let glass = config.glass.material();

    let resolutions: Vec<TargetResolution> = config
        .model
        .glass_targets
        .iter()
        .map(|target| {
            let resolution = resolve_target(&model, target);
            match resolution.node() {
                Some(node) => placed.override_material(node, glass.clone()),
                None => tracing::warn!(
                    root = %target.root,
                    child = %target.child,
                    ?resolution,
                    "glass target not found, leaving its material unchanged"
                ),
            }
            resolution
        })
        .collect();

    (placed, resolutions)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use atrium_assets::{MaterialData, MeshData, MeshVertex, ModelNode, Primitive};

    /// Two buildings shaped like the showcase model: `bulding_01` with three
    /// children and `bulding_00_whole` with fourteen, plus a ground plane.
    pub(crate) fn showcase_model() -> ModelData {
        let mut nodes = Vec::new();
        let mut add = |name: String, children: Vec<usize>| {
            nodes.push(ModelNode {
                name: Some(name),
                children,
                mesh: Some(0),
                ..ModelNode::default()
            });
            nodes.len() - 1
        };
        let b1_children: Vec<usize> = (0..3).map(|i| add(format!("b1_part_{i}"), vec![])).collect();
        let b1 = add("bulding_01".into(), b1_children);
        let b0_children: Vec<usize> = (0..14).map(|i| add(format!("b0_part_{i}"), vec![])).collect();
        let b0 = add("bulding_00_whole".into(), b0_children);
        let plane = add("Plane001".into(), vec![]);

        ModelData {
            nodes,
            roots: vec![b1, b0, plane],
            meshes: vec![MeshData {
                name: Some("tri".into()),
                primitives: vec![Primitive {
                    vertices: vec![
                        MeshVertex { position: [0.0, 0.0, 0.0], normal: [0.0, 1.0, 0.0] },
                        MeshVertex { position: [1.0, 0.0, 0.0], normal: [0.0, 1.0, 0.0] },
                        MeshVertex { position: [0.0, 0.0, 1.0], normal: [0.0, 1.0, 0.0] },
                    ],
                    indices: vec![0, 1, 2],
                    material: Some(0),
                }],
            }],
            materials: vec![MaterialData {
                name: "concrete".into(),
                ..MaterialData::default()
            }],
        }
    }

    #[test]
    fn default_targets_resolve_by_index() {
        let model = showcase_model();
        let config = SceneConfig::default();
        let (placed, resolutions) = place_model(model, &config);

        let nodes: Vec<Option<usize>> = resolutions.iter().map(|r| r.node()).collect();
        let b1_glass = placed.model.find_root("bulding_01").and_then(|r| placed.model.child(r, &ChildSelector::Index(2)));
        let b0_glass = placed
            .model
            .find_root("bulding_00_whole")
            .and_then(|r| placed.model.child(r, &ChildSelector::Index(13)));
        assert_eq!(nodes, vec![b1_glass, b0_glass]);
        assert_eq!(placed.model.node_name(b1_glass.unwrap()), Some("b1_part_2"));
        assert_eq!(placed.model.node_name(b0_glass.unwrap()), Some("b0_part_13"));
        assert_eq!(placed.material_override(b1_glass.unwrap()).unwrap().name, "glass");
        assert_eq!(placed.transform.scale, glam::Vec3::splat(5.0));
    }

    #[test]
    fn name_selector_wins_over_fallback() {
        let model = showcase_model();
        let target = GlassTarget {
            root: "bulding_01".into(),
            child: ChildSelector::Name("b1_part_1".into()),
            fallback: Some(ChildSelector::Index(2)),
        };
        let node = model.child(model.find_root("bulding_01").unwrap(), &ChildSelector::Index(1));
        assert_eq!(resolve_target(&model, &target), TargetResolution::Resolved { node: node.unwrap() });
    }

    #[test]
    fn fallback_used_when_name_is_missing() {
        let model = showcase_model();
        let target = GlassTarget {
            root: "bulding_01".into(),
            child: ChildSelector::Name("window_glass".into()),
            fallback: Some(ChildSelector::Index(2)),
        };
        assert!(matches!(resolve_target(&model, &target), TargetResolution::Fallback { .. }));
    }

    #[test]
    fn missing_targets_leave_model_intact() {
        let model = showcase_model();
        let node_count = model.nodes.len();
        let mut config = SceneConfig::default();
        config.model.glass_targets = vec![
            GlassTarget {
                root: "tower".into(),
                child: ChildSelector::Index(0),
                fallback: None,
            },
            GlassTarget {
                root: "bulding_01".into(),
                child: ChildSelector::Index(40),
                fallback: None,
            },
        ];
        let (placed, resolutions) = place_model(model, &config);
        assert_eq!(
            resolutions,
            vec![TargetResolution::MissingRoot, TargetResolution::MissingChild]
        );
        assert_eq!(placed.model.nodes.len(), node_count);
        assert!((0..node_count).all(|n| placed.material_override(n).is_none()));
    }
}
