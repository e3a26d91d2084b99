// Copyright @yucwang 2026

use crate::math::aabb::AABB;
use crate::math::constants::{FLOAT_MAX, Float, Vector3f};
use crate::math::ray::Ray3f;

#[derive(Clone)]
struct BVHNode {
    bounds: AABB,
    left: Option<usize>,
    right: Option<usize>,
    start: usize,
    count: usize,
}

impl BVHNode {
    fn leaf(bounds: AABB, start: usize, count: usize) -> Self {
        Self { bounds, left: None, right: None, start, count }
    }

    fn interior(bounds: AABB, left: usize, right: usize) -> Self {
        Self { bounds, left: Some(left), right: Some(right), start: 0, count: 0 }
    }

    fn is_leaf(&self) -> bool {
        self.count > 0
    }
}

/// Median-split bounding volume hierarchy. Stores only primitive bounds
/// and centroids; primitive intersection is delegated via callbacks so the
/// scene keeps ownership of its objects.
pub struct BVH {
    nodes: Vec<BVHNode>,
    indices: Vec<usize>,
    prim_bounds: Vec<AABB>,
    prim_centroids: Vec<Vector3f>,
    max_leaf_size: usize,
}

impl BVH {
    pub fn new(prim_bounds: Vec<AABB>, prim_centroids: Vec<Vector3f>) -> Self {
        Self::with_max_leaf_size(prim_bounds, prim_centroids, 4)
    }

    pub fn with_max_leaf_size(
        prim_bounds: Vec<AABB>,
        prim_centroids: Vec<Vector3f>,
        max_leaf_size: usize,
    ) -> Self {
        let mut bvh = Self {
            indices: (0..prim_bounds.len()).collect(),
            nodes: Vec::new(),
            prim_bounds,
            prim_centroids,
            max_leaf_size: max_leaf_size.max(1),
        };

        if !bvh.indices.is_empty() {
            bvh.build(0, bvh.indices.len());
        }

        bvh
    }

    /// Traversal returning the closest hit reported by the callback.
    pub fn ray_intersection<F, T>(&self, ray: &Ray3f, mut hit_fn: F) -> Option<(usize, T)>
    where
        F: FnMut(usize, &Ray3f) -> Option<(T, Float)>,
    {
        if self.nodes.is_empty() {
            return None;
        }

        let mut closest: Option<(usize, T)> = None;
        let mut closest_t = FLOAT_MAX;
        let mut stack = vec![0usize];

        while let Some(node_idx) = stack.pop() {
            let node = &self.nodes[node_idx];
            if !node.bounds.ray_intersect(&ray) {
                continue;
            }

            if node.is_leaf() {
                for i in 0..node.count {
                    let prim_idx = self.indices[node.start + i];
                    if let Some((hit, t)) = hit_fn(prim_idx, ray) {
                        if t < closest_t {
                            closest_t = t;
                            closest = Some((prim_idx, hit));
                        }
                    }
                }
            } else {
                if let Some(left) = node.left {
                    stack.push(left);
                }
                if let Some(right) = node.right {
                    stack.push(right);
                }
            }
        }

        closest
    }

    /// Early-out traversal for shadow rays.
    pub fn ray_intersection_t<F>(&self, ray: &Ray3f, mut hit_fn: F) -> bool
    where
        F: FnMut(usize, &Ray3f) -> bool,
    {
        if self.nodes.is_empty() {
            return false;
        }

        let mut stack = vec![0usize];
        while let Some(node_idx) = stack.pop() {
            let node = &self.nodes[node_idx];
            if !node.bounds.ray_intersect(&ray) {
                continue;
            }
            if node.is_leaf() {
                for i in 0..node.count {
                    let prim_idx = self.indices[node.start + i];
                    if hit_fn(prim_idx, ray) {
                        return true;
                    }
                }
            } else {
                if let Some(left) = node.left {
                    stack.push(left);
                }
                if let Some(right) = node.right {
                    stack.push(right);
                }
            }
        }

        false
    }

    fn build(&mut self, start: usize, end: usize) -> usize {
        let count = end - start;
        let (bounds, centroid_bounds) = self.compute_bounds(start, end);

        let axis = centroid_bounds.max_extent() as usize;
        let extent = centroid_bounds.p_max[axis] - centroid_bounds.p_min[axis];
        if count <= self.max_leaf_size || extent.abs() < 1e-6 {
            let node_idx = self.nodes.len();
            self.nodes.push(BVHNode::leaf(bounds, start, count));
            return node_idx;
        }

        // Median split along the widest centroid axis.
        let centroids = &self.prim_centroids;
        let mid = start + count / 2;
        self.indices[start..end].sort_unstable_by(|&a, &b| {
            centroids[a][axis]
                .partial_cmp(&centroids[b][axis])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let node_idx = self.nodes.len();
        self.nodes.push(BVHNode::leaf(bounds, 0, 0));
        let left = self.build(start, mid);
        let right = self.build(mid, end);
        self.nodes[node_idx] = BVHNode::interior(bounds, left, right);
        node_idx
    }

    fn compute_bounds(&self, start: usize, end: usize) -> (AABB, AABB) {
        let mut bounds = AABB::default();
        let mut centroid_bounds = AABB::default();
        for i in start..end {
            let idx = self.indices[i];
            bounds.expand_by_aabb(&self.prim_bounds[idx]);
            centroid_bounds.expand_by_point(&self.prim_centroids[idx]);
        }
        (bounds, centroid_bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::BVH;
    use crate::math::aabb::AABB;
    use crate::math::constants::{Float, Vector3f};
    use crate::math::ray::Ray3f;

    // Axis-aligned unit boxes along x, intersected analytically by slab
    // test against their own bounds.
    fn build_boxes(n: usize) -> Vec<AABB> {
        (0..n)
            .map(|i| {
                let x = i as Float * 3.0;
                AABB::new(Vector3f::new(x, 0.0, 0.0), Vector3f::new(x + 1.0, 1.0, 1.0))
            })
            .collect()
    }

    #[test]
    fn test_bvh_vs_naive() {
        let boxes = build_boxes(9);
        let centroids: Vec<Vector3f> = boxes.iter().map(|b| b.center()).collect();
        let bvh = BVH::new(boxes.clone(), centroids);

        for i in 0..boxes.len() {
            let origin = Vector3f::new(i as Float * 3.0 + 0.5, 0.5, 5.0);
            let ray = Ray3f::new(origin, Vector3f::new(0.0, 0.0, -1.0), None, None);

            let hit = bvh.ray_intersection(&ray, |prim_idx, ray| {
                if boxes[prim_idx].ray_intersect(ray) {
                    Some(((), 4.0))
                } else {
                    None
                }
            });
            assert!(hit.is_some(), "BVH miss for ray {}", i);
            assert_eq!(hit.unwrap().0, i);
        }

        let miss_ray = Ray3f::new(Vector3f::new(-50.0, 0.5, 5.0),
                                  Vector3f::new(0.0, 0.0, -1.0), None, None);
        let miss = bvh.ray_intersection(&miss_ray, |prim_idx, ray| {
            if boxes[prim_idx].ray_intersect(ray) {
                Some(((), 4.0))
            } else {
                None
            }
        });
        assert!(miss.is_none());

        assert!(bvh.ray_intersection_t(
            &Ray3f::new(Vector3f::new(0.5, 0.5, 5.0), Vector3f::new(0.0, 0.0, -1.0), None, None),
            |prim_idx, ray| boxes[prim_idx].ray_intersect(ray),
        ));
    }

    #[test]
    fn test_bvh_empty() {
        let bvh = BVH::new(Vec::new(), Vec::new());
        let ray = Ray3f::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, 1.0), None, None);
        let hit: Option<(usize, ())> = bvh.ray_intersection(&ray, |_, _| None);
        assert!(hit.is_none());
        assert!(!bvh.ray_intersection_t(&ray, |_, _| true));
    }
}
