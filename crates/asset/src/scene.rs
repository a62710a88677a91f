//! Importer-agnostic scene graph: a node hierarchy that references a flat
//! list of meshes, each with at most one material.

use anyhow::{Result, bail};
use corelib::Transform;

/// Primitive type of a mesh. A mesh carries exactly one kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrimitiveKind {
    Points,
    Lines,
    Triangles,
}

impl PrimitiveKind {
    /// Indices per primitive.
    pub fn arity(self) -> usize {
        match self {
            PrimitiveKind::Points => 1,
            PrimitiveKind::Lines => 2,
            PrimitiveKind::Triangles => 3,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Material {
    pub name: String,
    pub diffuse_texture: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SceneMesh {
    pub name: String,
    pub primitive: PrimitiveKind,
    pub positions: Vec<[f32; 3]>,
    /// First texture coordinate channel, one entry per position.
    pub uvs: Option<Vec<[f32; 2]>>,
    /// Flat index list, `primitive.arity()` indices per primitive.
    pub indices: Vec<u32>,
    pub material: Option<usize>,
}

impl SceneMesh {
    pub fn triangles(name: impl Into<String>, positions: Vec<[f32; 3]>, indices: Vec<u32>) -> Self {
        Self {
            name: name.into(),
            primitive: PrimitiveKind::Triangles,
            positions,
            uvs: None,
            indices,
            material: None,
        }
    }

    pub fn with_uvs(mut self, uvs: Vec<[f32; 2]>) -> Self {
        self.uvs = Some(uvs);
        self
    }

    pub fn with_material(mut self, material: usize) -> Self {
        self.material = Some(material);
        self
    }

    pub fn primitive_count(&self) -> usize {
        self.indices.len() / self.primitive.arity()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Node {
    pub name: String,
    /// Relative to the parent node.
    pub transform: Transform,
    /// Indices into [`Scene::meshes`].
    pub meshes: Vec<usize>,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_meshes(mut self, meshes: impl IntoIterator<Item = usize>) -> Self {
        self.meshes.extend(meshes);
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
    pub meshes: Vec<SceneMesh>,
    pub materials: Vec<Material>,
    pub root: Node,
}

impl Scene {
    /// Depth-first, pre-order walk yielding `(depth, node)`; the root has depth 0.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            stack: vec![(0, &self.root)],
        }
    }

    pub fn node_count(&self) -> usize {
        self.walk().count()
    }

    pub fn diffuse_texture(&self, mesh: &SceneMesh) -> Option<&str> {
        mesh.material
            .and_then(|m| self.materials.get(m))
            .and_then(|m| m.diffuse_texture.as_deref())
    }

    /// Check that every reference in the scene resolves.
    pub fn validate(&self) -> Result<()> {
        for (_, node) in self.walk() {
            for &mesh in &node.meshes {
                if mesh >= self.meshes.len() {
                    bail!(
                        "node '{}' references mesh {} but the scene has {}",
                        node.name,
                        mesh,
                        self.meshes.len()
                    );
                }
            }
        }

        for (i, mesh) in self.meshes.iter().enumerate() {
            if let Some(material) = mesh.material {
                if material >= self.materials.len() {
                    bail!(
                        "mesh {} ('{}') references material {} but the scene has {}",
                        i,
                        mesh.name,
                        material,
                        self.materials.len()
                    );
                }
            }
            if let Some(uvs) = &mesh.uvs {
                if uvs.len() != mesh.positions.len() {
                    bail!(
                        "mesh {} ('{}') has {} texture coordinates for {} positions",
                        i,
                        mesh.name,
                        uvs.len(),
                        mesh.positions.len()
                    );
                }
            }
            if mesh.indices.len() % mesh.primitive.arity() != 0 {
                bail!(
                    "mesh {} ('{}') has {} indices, not a multiple of {}",
                    i,
                    mesh.name,
                    mesh.indices.len(),
                    mesh.primitive.arity()
                );
            }
            if let Some(&bad) = mesh
                .indices
                .iter()
                .find(|&&idx| idx as usize >= mesh.positions.len())
            {
                bail!(
                    "mesh {} ('{}') index {} out of bounds (len={})",
                    i,
                    mesh.name,
                    bad,
                    mesh.positions.len()
                );
            }
        }
        Ok(())
    }
}

pub struct Walk<'a> {
    stack: Vec<(usize, &'a Node)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (usize, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;
        self.stack
            .extend(node.children.iter().rev().map(|c| (depth + 1, c)));
        Some((depth, node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tri() -> SceneMesh {
        SceneMesh::triangles(
            "tri",
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            vec![0, 1, 2],
        )
    }

    #[test]
    fn walk_is_preorder() {
        let scene = Scene {
            root: Node::new("root")
                .with_child(Node::new("a").with_child(Node::new("a1")))
                .with_child(Node::new("b")),
            ..Default::default()
        };
        let order: Vec<_> = scene
            .walk()
            .map(|(d, n)| (d, n.name.as_str()))
            .collect();
        assert_eq!(order, vec![(0, "root"), (1, "a"), (2, "a1"), (1, "b")]);
        assert_eq!(scene.node_count(), 4);
    }

    #[test]
    fn validate_accepts_consistent_scene() {
        let scene = Scene {
            meshes: vec![tri().with_uvs(vec![[0.0; 2]; 3]).with_material(0)],
            materials: vec![Material {
                name: "m".into(),
                diffuse_texture: Some("a.png".into()),
            }],
            root: Node::new("root").with_meshes([0]),
        };
        scene.validate().unwrap();
        assert_eq!(scene.diffuse_texture(&scene.meshes[0]), Some("a.png"));
    }

    #[test]
    fn validate_rejects_dangling_references() {
        let scene = Scene {
            meshes: vec![tri()],
            root: Node::new("root").with_meshes([1]),
            ..Default::default()
        };
        assert!(scene.validate().is_err());

        let scene = Scene {
            meshes: vec![tri().with_material(3)],
            root: Node::new("root").with_meshes([0]),
            ..Default::default()
        };
        assert!(scene.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_geometry() {
        let mut mesh = tri();
        mesh.indices = vec![0, 1, 5];
        let scene = Scene {
            meshes: vec![mesh],
            root: Node::new("root").with_meshes([0]),
            ..Default::default()
        };
        let err = scene.validate().unwrap_err();
        assert!(err.to_string().contains("out of bounds"));

        let scene = Scene {
            meshes: vec![tri().with_uvs(vec![[0.0; 2]; 2])],
            root: Node::new("root"),
            ..Default::default()
        };
        assert!(scene.validate().is_err());
    }
}
