// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Yombool Contributors

//! CSG (Constructive Solid Geometry) operations using BSP tree
//!
//! Every tree walk is iterative: meshes loaded from STL easily produce trees
//! whose depth is on the order of the triangle count.

use super::{Mesh, Triangle, Vertex};
use nalgebra::{Point3, Vector3};
use rayon::prelude::*;
use std::mem;

const EPSILON: f64 = 1e-5;

const COPLANAR: u8 = 0;
const FRONT: u8 = 1;
const BACK: u8 = 2;
const SPANNING: u8 = 3;

#[derive(Debug, Clone)]
struct Plane {
    normal: Vector3<f64>,
    w: f64,
}

impl Plane {
    fn from_points(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> Option<Self> {
        let normal = (b - a).cross(&(c - a)).try_normalize(1e-12)?;
        Some(Self {
            normal,
            w: normal.dot(&a.coords),
        })
    }

    fn flip(&mut self) {
        self.normal = -self.normal;
        self.w = -self.w;
    }

    fn classify_point(&self, point: &Point3<f64>) -> u8 {
        let distance = self.normal.dot(&point.coords) - self.w;
        if distance < -EPSILON {
            BACK
        } else if distance > EPSILON {
            FRONT
        } else {
            COPLANAR
        }
    }

    /// Sort `polygon` into `partition`, splitting it if it spans the plane
    fn split_polygon(&self, polygon: Polygon, partition: &mut Partition) {
        let types: Vec<u8> = polygon
            .vertices
            .iter()
            .map(|v| self.classify_point(&v.position))
            .collect();
        let polygon_type = types.iter().fold(COPLANAR, |acc, t| acc | t);

        match polygon_type {
            COPLANAR => {
                if self.normal.dot(&polygon.plane.normal) > 0.0 {
                    partition.coplanar_front.push(polygon);
                } else {
                    partition.coplanar_back.push(polygon);
                }
            }
            FRONT => partition.front.push(polygon),
            BACK => partition.back.push(polygon),
            _ => {
                let count = polygon.vertices.len();
                let mut front = Vec::with_capacity(count + 1);
                let mut back = Vec::with_capacity(count + 1);

                for i in 0..count {
                    let j = (i + 1) % count;
                    let (ti, tj) = (types[i], types[j]);
                    let (vi, vj) = (&polygon.vertices[i], &polygon.vertices[j]);

                    if ti != BACK {
                        front.push(*vi);
                    }
                    if ti != FRONT {
                        back.push(*vi);
                    }
                    if ti | tj == SPANNING {
                        let t = (self.w - self.normal.dot(&vi.position.coords))
                            / self.normal.dot(&(vj.position - vi.position));
                        let split = vi.interpolate(vj, t);
                        front.push(split);
                        back.push(split);
                    }
                }

                if front.len() >= 3 {
                    partition.front.push(Polygon {
                        vertices: front,
                        plane: polygon.plane.clone(),
                    });
                }
                if back.len() >= 3 {
                    partition.back.push(Polygon {
                        vertices: back,
                        plane: polygon.plane,
                    });
                }
            }
        }
    }
}

#[derive(Default)]
struct Partition {
    coplanar_front: Vec<Polygon>,
    coplanar_back: Vec<Polygon>,
    front: Vec<Polygon>,
    back: Vec<Polygon>,
}

/// Convex planar polygon
#[derive(Debug, Clone)]
struct Polygon {
    vertices: Vec<Vertex>,
    plane: Plane,
}

impl Polygon {
    fn from_triangle(a: Vertex, b: Vertex, c: Vertex) -> Option<Self> {
        let plane = Plane::from_points(&a.position, &b.position, &c.position)?;
        Some(Self {
            vertices: vec![a, b, c],
            plane,
        })
    }

    fn flip(&mut self) {
        self.vertices.reverse();
        for v in &mut self.vertices {
            v.normal = -v.normal;
        }
        self.plane.flip();
    }
}

/// BSP tree node for CSG operations
#[derive(Default)]
struct BSPNode {
    plane: Option<Plane>,
    front: Option<Box<BSPNode>>,
    back: Option<Box<BSPNode>>,
    polygons: Vec<Polygon>,
}

impl BSPNode {
    fn new(polygons: Vec<Polygon>) -> Self {
        let mut node = Self::default();
        node.build(polygons);
        node
    }

    fn build(&mut self, polygons: Vec<Polygon>) {
        let mut stack: Vec<(&mut BSPNode, Vec<Polygon>)> = vec![(self, polygons)];

        while let Some((node, polygons)) = stack.pop() {
            if polygons.is_empty() {
                continue;
            }

            let BSPNode {
                plane,
                front,
                back,
                polygons: own,
            } = node;
            let plane = plane.get_or_insert_with(|| polygons[0].plane.clone());

            let mut partition = Partition::default();
            for polygon in polygons {
                plane.split_polygon(polygon, &mut partition);
            }
            own.append(&mut partition.coplanar_front);
            own.append(&mut partition.coplanar_back);

            if !partition.front.is_empty() {
                let child = front.get_or_insert_with(Default::default);
                stack.push((&mut **child, partition.front));
            }
            if !partition.back.is_empty() {
                let child = back.get_or_insert_with(Default::default);
                stack.push((&mut **child, partition.back));
            }
        }
    }

    fn all_polygons(&self) -> Vec<Polygon> {
        let mut result = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            result.extend(node.polygons.iter().cloned());
            stack.extend(node.front.as_deref());
            stack.extend(node.back.as_deref());
        }
        result
    }

    /// Remove the parts of `polygons` that lie inside this tree
    fn clip_polygons(&self, polygons: Vec<Polygon>) -> Vec<Polygon> {
        let mut result = Vec::new();
        let mut stack = vec![(self, polygons)];

        while let Some((node, polygons)) = stack.pop() {
            let Some(plane) = &node.plane else {
                result.extend(polygons);
                continue;
            };

            let mut partition = Partition::default();
            for polygon in polygons {
                plane.split_polygon(polygon, &mut partition);
            }
            let mut front = partition.front;
            front.append(&mut partition.coplanar_front);
            let mut back = partition.back;
            back.append(&mut partition.coplanar_back);

            match node.front.as_deref() {
                Some(child) => stack.push((child, front)),
                None => result.append(&mut front),
            }
            if let Some(child) = node.back.as_deref() {
                stack.push((child, back));
            }
        }

        result
    }

    fn clip_to(&mut self, bsp: &BSPNode) {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            node.polygons = bsp.clip_polygons(mem::take(&mut node.polygons));
            let BSPNode { front, back, .. } = node;
            stack.extend(front.as_deref_mut());
            stack.extend(back.as_deref_mut());
        }
    }

    fn invert(&mut self) {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            for polygon in &mut node.polygons {
                polygon.flip();
            }
            if let Some(plane) = &mut node.plane {
                plane.flip();
            }
            mem::swap(&mut node.front, &mut node.back);

            let BSPNode { front, back, .. } = node;
            stack.extend(front.as_deref_mut());
            stack.extend(back.as_deref_mut());
        }
    }
}

impl Drop for BSPNode {
    fn drop(&mut self) {
        let mut stack: Vec<Box<BSPNode>> = Vec::new();
        stack.extend(self.front.take());
        stack.extend(self.back.take());
        while let Some(mut node) = stack.pop() {
            stack.extend(node.front.take());
            stack.extend(node.back.take());
        }
    }
}

/// Convert mesh to polygons, dropping degenerate triangles
fn mesh_to_polygons(mesh: &Mesh) -> Vec<Polygon> {
    mesh.triangles
        .par_iter()
        .filter_map(|tri| {
            let [a, b, c] = mesh.corners(tri);
            Polygon::from_triangle(*a, *b, *c)
        })
        .collect()
}

/// Convert polygons back to mesh by fan triangulation
fn polygons_to_mesh(polygons: &[Polygon]) -> Mesh {
    let mut mesh = Mesh::new();

    for poly in polygons {
        let base = mesh.vertex_count();
        for vertex in &poly.vertices {
            mesh.add_vertex(*vertex);
        }
        for i in 1..poly.vertices.len() - 1 {
            mesh.add_triangle(Triangle::new([base, base + i, base + i + 1]));
        }
    }

    mesh
}

/// Perform CSG union using BSP trees
pub fn csg_union(a: &Mesh, b: &Mesh) -> Mesh {
    if a.is_empty() {
        return b.clone();
    }
    if b.is_empty() {
        return a.clone();
    }

    let mut tree_a = BSPNode::new(mesh_to_polygons(a));
    let mut tree_b = BSPNode::new(mesh_to_polygons(b));

    tree_a.clip_to(&tree_b);
    tree_b.clip_to(&tree_a);
    tree_b.invert();
    tree_b.clip_to(&tree_a);
    tree_b.invert();
    tree_a.build(tree_b.all_polygons());

    polygons_to_mesh(&tree_a.all_polygons())
}

/// Perform CSG difference (A - B) using BSP trees
pub fn csg_difference(a: &Mesh, b: &Mesh) -> Mesh {
    if a.is_empty() {
        return Mesh::empty();
    }
    if b.is_empty() {
        return a.clone();
    }

    let mut tree_a = BSPNode::new(mesh_to_polygons(a));
    let mut tree_b = BSPNode::new(mesh_to_polygons(b));

    tree_a.invert();
    tree_a.clip_to(&tree_b);
    tree_b.clip_to(&tree_a);
    tree_b.invert();
    tree_b.clip_to(&tree_a);
    tree_b.invert();
    tree_a.build(tree_b.all_polygons());
    tree_a.invert();

    polygons_to_mesh(&tree_a.all_polygons())
}

/// Perform CSG intersection using BSP trees
pub fn csg_intersection(a: &Mesh, b: &Mesh) -> Mesh {
    if a.is_empty() || b.is_empty() {
        return Mesh::empty();
    }

    let mut tree_a = BSPNode::new(mesh_to_polygons(a));
    let mut tree_b = BSPNode::new(mesh_to_polygons(b));

    tree_a.invert();
    tree_b.clip_to(&tree_a);
    tree_b.invert();
    tree_a.clip_to(&tree_b);
    tree_b.clip_to(&tree_a);
    tree_a.build(tree_b.all_polygons());
    tree_a.invert();

    polygons_to_mesh(&tree_a.all_polygons())
}
