//! Boundary to the host's scene graph and frame loop
//!
//! The engine never owns a camera, renderer or surface. Effects describe the
//! visual nodes they need and push uniform updates; the host decides how to
//! draw them.

use glam::{Vec2, Vec3, Vec4};

use crate::particles::{EngineBackend, PrecipitationKind};
use crate::weather::FogSettings;

/// Handle returned by the host for an attached node
pub type NodeId = u64;

/// Visual node an effect asks the host to create
#[derive(Debug, Clone, PartialEq)]
pub enum RenderNode {
    Particles {
        kind: PrecipitationKind,
        backend: EngineBackend,
        capacity: usize,
        size: f32,
        color: Vec4,
    },
    Fog(FogSettings),
    CloudLayer {
        altitude: f32,
    },
    Lightning,
    Wind,
}

/// Per-frame values pushed to an attached node
#[derive(Debug, Clone, PartialEq)]
pub enum NodeUniforms {
    Particles {
        intensity: f32,
        visible_count: usize,
    },
    Fog {
        intensity: f32,
        settings: FogSettings,
    },
    CloudLayer {
        opacity: f32,
        darkness: f32,
        offset: Vec2,
    },
    Lightning {
        /// Flash brightness in [0, 1]
        brightness: f32,
        ambient_tint: Vec3,
    },
    Wind {
        intensity: f32,
        vector: Vec3,
    },
}

/// Host-supplied scene graph
pub trait SceneGraph {
    fn attach(&mut self, node: RenderNode) -> NodeId;
    fn update(&mut self, id: NodeId, uniforms: &NodeUniforms);
    fn detach(&mut self, id: NodeId);
}

/// Host frame loop the orchestrator subscribes to
pub trait TickSource {
    fn register(&mut self);
    fn unregister(&mut self);
}

/// Scene that accepts and ignores everything (headless use)
#[derive(Debug, Default)]
pub struct NullScene {
    next_id: NodeId,
}

impl SceneGraph for NullScene {
    fn attach(&mut self, _node: RenderNode) -> NodeId {
        self.next_id += 1;
        self.next_id
    }

    fn update(&mut self, _id: NodeId, _uniforms: &NodeUniforms) {}

    fn detach(&mut self, _id: NodeId) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_scene_hands_out_distinct_ids() {
        let mut scene = NullScene::default();
        let a = scene.attach(RenderNode::Lightning);
        let b = scene.attach(RenderNode::Wind);
        assert_ne!(a, b);
        scene.detach(a);
    }
}
