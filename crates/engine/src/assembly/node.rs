use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::math::{Mat3, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(u32);

impl NodeHandle {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Which position representation reads and writes go through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionSpace {
    #[default]
    Local,
    World,
}

/// Parent-relative position plus Euler rotation in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NodePose {
    pub position: Vec3,
    pub euler_degrees: Vec3,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NodeError {
    #[error("node '{name}' references unknown parent handle {parent}")]
    UnknownParent { name: String, parent: usize },
}

#[derive(Debug, Clone)]
struct SpatialNode {
    name: String,
    parent: Option<NodeHandle>,
    local: NodePose,
}

#[derive(Debug, Clone, Default)]
pub struct NodeArena {
    nodes: Vec<SpatialNode>,
}

impl NodeArena {
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        parent: Option<NodeHandle>,
        local: NodePose,
    ) -> Result<NodeHandle, NodeError> {
        let name = name.into();
        if let Some(parent) = parent {
            if parent.index() >= self.nodes.len() {
                return Err(NodeError::UnknownParent {
                    name,
                    parent: parent.index(),
                });
            }
        }
        let handle = NodeHandle(self.nodes.len() as u32);
        self.nodes.push(SpatialNode {
            name,
            parent,
            local,
        });
        Ok(handle)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, handle: NodeHandle) -> bool {
        handle.index() < self.nodes.len()
    }

    pub fn name(&self, handle: NodeHandle) -> Option<&str> {
        self.nodes.get(handle.index()).map(|node| node.name.as_str())
    }

    pub fn parent(&self, handle: NodeHandle) -> Option<NodeHandle> {
        self.nodes.get(handle.index()).and_then(|node| node.parent)
    }

    pub fn local_pose(&self, handle: NodeHandle) -> Option<NodePose> {
        self.nodes.get(handle.index()).map(|node| node.local)
    }

    pub fn set_local_pose(&mut self, handle: NodeHandle, pose: NodePose) -> bool {
        match self.nodes.get_mut(handle.index()) {
            Some(node) => {
                node.local = pose;
                true
            }
            None => false,
        }
    }

    pub fn euler_degrees(&self, handle: NodeHandle) -> Option<Vec3> {
        self.local_pose(handle).map(|pose| pose.euler_degrees)
    }

    pub fn set_euler_degrees(&mut self, handle: NodeHandle, euler_degrees: Vec3) -> bool {
        match self.nodes.get_mut(handle.index()) {
            Some(node) => {
                node.local.euler_degrees = euler_degrees;
                true
            }
            None => false,
        }
    }

    pub fn world_position(&self, handle: NodeHandle) -> Option<Vec3> {
        let node = self.nodes.get(handle.index())?;
        match node.parent {
            None => Some(node.local.position),
            Some(parent) => {
                let (origin, rotation) = self.world_frame(parent)?;
                Some(origin.add(rotation.transform(node.local.position)))
            }
        }
    }

    pub fn position(&self, handle: NodeHandle, space: PositionSpace) -> Option<Vec3> {
        match space {
            PositionSpace::Local => self.local_pose(handle).map(|pose| pose.position),
            PositionSpace::World => self.world_position(handle),
        }
    }

    pub fn set_position(&mut self, handle: NodeHandle, space: PositionSpace, value: Vec3) -> bool {
        let Some(node) = self.nodes.get(handle.index()) else {
            return false;
        };
        let local = match (space, node.parent) {
            (PositionSpace::Local, _) | (PositionSpace::World, None) => value,
            (PositionSpace::World, Some(parent)) => {
                let Some((origin, rotation)) = self.world_frame(parent) else {
                    return false;
                };
                rotation.transpose().transform(value.sub(origin))
            }
        };
        self.nodes[handle.index()].local.position = local;
        true
    }

    /// World origin and accumulated rotation of a node's own frame.
    fn world_frame(&self, handle: NodeHandle) -> Option<(Vec3, Mat3)> {
        let mut chain = Vec::new();
        let mut cursor = Some(handle);
        while let Some(current) = cursor {
            let node = self.nodes.get(current.index())?;
            chain.push(node.local);
            cursor = node.parent;
            if chain.len() > self.nodes.len() {
                return None;
            }
        }

        let mut origin = Vec3::ZERO;
        let mut rotation = Mat3::IDENTITY;
        for pose in chain.iter().rev() {
            origin = origin.add(rotation.transform(pose.position));
            rotation = rotation.mul(&Mat3::from_euler_degrees(pose.euler_degrees));
        }
        Some((origin, rotation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pose(x: f32, y: f32, z: f32) -> NodePose {
        NodePose {
            position: Vec3::new(x, y, z),
            euler_degrees: Vec3::ZERO,
        }
    }

    fn assert_close(actual: Vec3, expected: Vec3) {
        let eps = 1e-4;
        assert!(
            (actual.x - expected.x).abs() <= eps
                && (actual.y - expected.y).abs() <= eps
                && (actual.z - expected.z).abs() <= eps,
            "{actual:?} vs {expected:?}"
        );
    }

    #[test]
    fn root_world_position_is_local_position_exactly() {
        let mut arena = NodeArena::default();
        let root = arena.insert("root", None, pose(1.25, 2.5, -3.0)).expect("root");
        assert_eq!(arena.world_position(root), Some(Vec3::new(1.25, 2.5, -3.0)));

        assert!(arena.set_position(root, PositionSpace::World, Vec3::new(0.1, 0.2, 0.3)));
        assert_eq!(
            arena.local_pose(root).expect("pose").position,
            Vec3::new(0.1, 0.2, 0.3)
        );
    }

    #[test]
    fn child_world_position_follows_translated_parent() {
        let mut arena = NodeArena::default();
        let parent = arena.insert("bolt", None, pose(4.0, 1.0, 0.0)).expect("parent");
        let child = arena
            .insert("bolt/cap", Some(parent), pose(0.0, 2.0, 0.0))
            .expect("child");
        assert_close(
            arena.world_position(child).expect("world"),
            Vec3::new(4.0, 3.0, 0.0),
        );
    }

    #[test]
    fn child_under_rotated_parent_moves_sideways() {
        let mut arena = NodeArena::default();
        let parent = arena
            .insert(
                "tilted",
                None,
                NodePose {
                    position: Vec3::ZERO,
                    euler_degrees: Vec3::new(0.0, 0.0, 90.0),
                },
            )
            .expect("parent");
        let child = arena
            .insert("tilted/shaft", Some(parent), pose(0.0, 2.0, 0.0))
            .expect("child");
        assert_close(
            arena.world_position(child).expect("world"),
            Vec3::new(-2.0, 0.0, 0.0),
        );
    }

    #[test]
    fn world_write_under_rotated_parent_round_trips() {
        let mut arena = NodeArena::default();
        let parent = arena
            .insert(
                "tilted",
                None,
                NodePose {
                    position: Vec3::new(1.0, 1.0, 0.0),
                    euler_degrees: Vec3::new(10.0, 20.0, 30.0),
                },
            )
            .expect("parent");
        let child = arena
            .insert("tilted/cap", Some(parent), pose(0.5, 0.5, 0.5))
            .expect("child");

        let target = Vec3::new(3.0, -2.0, 0.75);
        assert!(arena.set_position(child, PositionSpace::World, target));
        assert_close(arena.world_position(child).expect("world"), target);
    }

    #[test]
    fn unknown_handles_are_noops() {
        let mut arena = NodeArena::default();
        let mut other = NodeArena::default();
        other.insert("a", None, pose(0.0, 0.0, 0.0)).expect("a");
        let foreign = other.insert("b", None, pose(0.0, 0.0, 0.0)).expect("b");

        assert_eq!(arena.world_position(foreign), None);
        assert!(!arena.set_position(foreign, PositionSpace::Local, Vec3::ZERO));
        assert!(!arena.set_euler_degrees(foreign, Vec3::ZERO));
        assert!(matches!(
            arena.insert("orphan", Some(foreign), pose(0.0, 0.0, 0.0)),
            Err(NodeError::UnknownParent { .. })
        ));
    }
}
