//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! A binary tree over primitive indices, built once by median splits along
//! the longest axis of the centroid bounds. Traversal visits children
//! near-to-far and skips any child whose box is entered beyond the best hit
//! so far.

use crate::{HitRecord, Primitive};
use rand::RngCore;
use umbra_math::{Aabb, Interval, Ray};

/// Maximum primitives per leaf node before splitting.
const LEAF_MAX_SIZE: usize = 4;

/// BVH node - either a branch with two children or a leaf with primitives.
#[derive(Debug)]
pub enum BvhNode {
    /// Internal node with two children.
    Branch {
        left: Box<BvhNode>,
        right: Box<BvhNode>,
        bbox: Aabb,
    },
    /// Leaf node holding indices into the primitive list.
    Leaf { indices: Vec<usize>, bbox: Aabb },
    /// Empty node (for edge cases).
    Empty,
}

impl BvhNode {
    pub fn bounding_box(&self) -> Aabb {
        match self {
            BvhNode::Empty => Aabb::EMPTY,
            BvhNode::Leaf { bbox, .. } => *bbox,
            BvhNode::Branch { bbox, .. } => *bbox,
        }
    }

    fn depth(&self) -> usize {
        match self {
            BvhNode::Empty | BvhNode::Leaf { .. } => 1,
            BvhNode::Branch { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    fn leaf_count(&self) -> usize {
        match self {
            BvhNode::Empty => 0,
            BvhNode::Leaf { .. } => 1,
            BvhNode::Branch { left, right, .. } => left.leaf_count() + right.leaf_count(),
        }
    }
}

/// Primitives plus the tree built over them. Read-only once built, so one
/// instance can serve every render thread.
#[derive(Debug)]
pub struct Bvh {
    primitives: Vec<Primitive>,
    root: BvhNode,
}

impl Bvh {
    /// Build a BVH. Primitive order is preserved, so indices into
    /// [`primitives`](Self::primitives) stay valid.
    pub fn new(primitives: Vec<Primitive>) -> Self {
        let bounds: Vec<Aabb> = primitives.iter().map(|p| p.bounding_box()).collect();
        let mut indices: Vec<usize> = (0..primitives.len()).collect();

        let root = if indices.is_empty() {
            BvhNode::Empty
        } else {
            Self::build(&bounds, &mut indices)
        };

        log::info!(
            "Built BVH over {} primitives: {} leaves, depth {}",
            primitives.len(),
            root.leaf_count(),
            root.depth()
        );
        Self { primitives, root }
    }

    /// Recursive BVH construction.
    ///
    /// Median split via selection rather than a full sort keeps each level
    /// linear, O(N log N) overall.
    fn build(bounds: &[Aabb], indices: &mut [usize]) -> BvhNode {
        let bbox = indices
            .iter()
            .fold(Aabb::EMPTY, |acc, &i| Aabb::surrounding(&acc, &bounds[i]));

        // Create leaf for small sets
        if indices.len() <= LEAF_MAX_SIZE {
            return BvhNode::Leaf {
                indices: indices.to_vec(),
                bbox,
            };
        }

        // Choose split axis based on centroid spread
        let centroid_bounds = indices.iter().fold(Aabb::EMPTY, |acc, &i| {
            let c = bounds[i].centroid();
            Aabb::surrounding(&acc, &Aabb::from_points(c, c))
        });
        let axis = centroid_bounds.longest_axis();

        let mid = indices.len() / 2;
        indices.select_nth_unstable_by(mid, |&a, &b| {
            let ca = bounds[a].centroid()[axis];
            let cb = bounds[b].centroid()[axis];
            ca.total_cmp(&cb)
        });

        let (left, right) = indices.split_at_mut(mid);
        BvhNode::Branch {
            left: Box::new(Self::build(bounds, left)),
            right: Box::new(Self::build(bounds, right)),
            bbox,
        }
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn root(&self) -> &BvhNode {
        &self.root
    }

    pub fn bounding_box(&self) -> Aabb {
        self.root.bounding_box()
    }

    /// Closest hit with `t > epsilon`, or the default sentinel on a miss.
    pub fn intersect<'a>(&'a self, ray: &Ray, epsilon: f32, rng: &mut dyn RngCore) -> HitRecord<'a> {
        let mut rec = HitRecord::default();
        self.hit_node(&self.root, ray, epsilon, rng, &mut rec);
        rec
    }

    fn hit_node<'a>(
        &'a self,
        node: &'a BvhNode,
        ray: &Ray,
        epsilon: f32,
        rng: &mut dyn RngCore,
        rec: &mut HitRecord<'a>,
    ) {
        match node {
            BvhNode::Empty => {}

            BvhNode::Leaf { indices, .. } => {
                for &i in indices {
                    let prim = &self.primitives[i];
                    prim.hit(ray, Interval::new(epsilon, rec.t), rng, rec);
                }
            }

            BvhNode::Branch { left, right, .. } => {
                let range = Interval::new(epsilon, rec.t);
                let near_left = left.bounding_box().entry(ray, range);
                let near_right = right.bounding_box().entry(ray, range);

                let ordered = match (near_left, near_right) {
                    (Some(l), Some(r)) if r < l => [(right, Some(r)), (left, Some(l))],
                    _ => [(left, near_left), (right, near_right)],
                };
                for (child, entry) in ordered {
                    if let Some(t) = entry {
                        // Prune children entered beyond the best hit so far.
                        if t <= rec.t {
                            self.hit_node(child, ray, epsilon, rng, rec);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::{gen_f32, uniform_sphere};
    use crate::{Color, Material, Triangle};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;
    use umbra_math::Vec3;

    fn grey() -> Arc<Material> {
        Arc::new(Material::diffuse(Color::splat(0.5)))
    }

    fn random_scene(seed: u64, count: usize) -> Vec<Primitive> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mat = grey();
        (0..count)
            .map(|i| {
                let c = Vec3::new(gen_f32(&mut rng), gen_f32(&mut rng), gen_f32(&mut rng)) * 20.0
                    - Vec3::splat(10.0);
                match i % 4 {
                    0 => Primitive::sphere(c, 0.2 + gen_f32(&mut rng), mat.clone()),
                    1 => Primitive::cuboid(c, Vec3::splat(0.5 + gen_f32(&mut rng)), mat.clone()),
                    2 => Primitive::triangle(
                        Triangle::new(c, c + Vec3::new(1.0, 0.2, 0.0), c + Vec3::new(0.1, 1.0, 0.5)),
                        mat.clone(),
                    ),
                    _ => Primitive::cylinder(c, Vec3::new(0.3, 1.0, 0.2), 0.4, mat.clone()),
                }
            })
            .collect()
    }

    /// Linear scan over every primitive.
    fn brute_force<'a>(prims: &'a [Primitive], ray: &Ray, rng: &mut dyn RngCore) -> HitRecord<'a> {
        let mut rec = HitRecord::default();
        for p in prims {
            p.hit(ray, Interval::new(1e-4, rec.t), rng, &mut rec);
        }
        rec
    }

    #[test]
    fn test_bvh_empty() {
        let bvh = Bvh::new(vec![]);
        assert!(matches!(bvh.root(), BvhNode::Empty));

        let mut rng = StdRng::seed_from_u64(0);
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        let rec = bvh.intersect(&ray, 1e-4, &mut rng);
        assert!(!rec.is_hit());
        assert_eq!(rec.t, f32::INFINITY);
    }

    #[test]
    fn test_bvh_single_sphere() {
        let bvh = Bvh::new(vec![Primitive::sphere(Vec3::new(0.0, 0.0, -1.0), 0.5, grey())]);
        assert!(matches!(bvh.root(), BvhNode::Leaf { .. }));

        let mut rng = StdRng::seed_from_u64(0);
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let rec = bvh.intersect(&ray, 1e-4, &mut rng);
        assert!(rec.is_hit());
        assert!((rec.point.z + 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_bvh_picks_nearest_of_many() {
        let prims: Vec<Primitive> = (0..10)
            .map(|i| Primitive::sphere(Vec3::new(0.0, 0.0, -2.0 * (i as f32 + 1.0)), 0.5, grey()))
            .collect();
        let bvh = Bvh::new(prims);
        let mut rng = StdRng::seed_from_u64(0);
        let ray = Ray::new(Vec3::ZERO, -Vec3::Z);
        let rec = bvh.intersect(&ray, 1e-4, &mut rng);
        assert!((rec.t - 1.5).abs() < 1e-4);
    }

    #[test]
    fn test_bvh_matches_brute_force() {
        let bvh = Bvh::new(random_scene(1, 300));
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..2000 {
            let origin = uniform_sphere(&mut rng) * 15.0;
            let ray = Ray::new(origin, uniform_sphere(&mut rng));
            let fast = bvh.intersect(&ray, 1e-4, &mut rng);
            let slow = brute_force(bvh.primitives(), &ray, &mut rng);
            assert_eq!(fast.is_hit(), slow.is_hit());
            if fast.is_hit() {
                assert!((fast.t - slow.t).abs() < 1e-4);
                assert!(fast.t > 1e-4);
                assert!((fast.point - ray.at(fast.t)).length() < 1e-3);
            }
        }
    }

    #[test]
    fn test_bvh_rebuild_is_idempotent() {
        let a = Bvh::new(random_scene(5, 200));
        let b = Bvh::new(random_scene(5, 200));
        let mut rng = StdRng::seed_from_u64(6);
        for _ in 0..500 {
            let ray = Ray::new(uniform_sphere(&mut rng) * 12.0, uniform_sphere(&mut rng));
            let ha = a.intersect(&ray, 1e-4, &mut rng);
            let hb = b.intersect(&ray, 1e-4, &mut rng);
            assert_eq!(ha.t, hb.t);
            assert_eq!(ha.normal, hb.normal);
        }
    }

    #[test]
    fn test_bvh_bounds_nest() {
        fn check(node: &BvhNode, prims: &[Primitive]) {
            match node {
                BvhNode::Empty => {}
                BvhNode::Leaf { indices, bbox } => {
                    assert!(indices.len() <= LEAF_MAX_SIZE);
                    for &i in indices {
                        assert!(bbox.contains(&prims[i].bounding_box()));
                    }
                }
                BvhNode::Branch { left, right, bbox } => {
                    assert!(bbox.contains(&left.bounding_box()));
                    assert!(bbox.contains(&right.bounding_box()));
                    check(left, prims);
                    check(right, prims);
                }
            }
        }
        let bvh = Bvh::new(random_scene(3, 150));
        check(bvh.root(), bvh.primitives());
        assert!(bvh.root().leaf_count() * LEAF_MAX_SIZE >= 150);
    }

    #[test]
    fn test_bvh_coincident_centroids() {
        // Identical primitives must not break the median split.
        let prims: Vec<Primitive> = (0..50)
            .map(|_| Primitive::sphere(Vec3::ZERO, 1.0, grey()))
            .collect();
        let bvh = Bvh::new(prims);
        let mut rng = StdRng::seed_from_u64(0);
        let rec = bvh.intersect(&Ray::new(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z), 1e-4, &mut rng);
        assert!((rec.t - 4.0).abs() < 1e-5);
    }
}
