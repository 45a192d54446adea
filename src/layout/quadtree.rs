use eframe::egui::{Vec2, vec2};

const LEAF_CAPACITY: usize = 8;
const MAX_DEPTH: usize = 12;

#[derive(Clone, Copy, Debug)]
pub(super) struct QuadBounds {
    pub(super) center: Vec2,
    pub(super) half_extent: f32,
}

impl QuadBounds {
    fn covering(points: &[Vec2]) -> Option<Self> {
        let mut min = vec2(f32::INFINITY, f32::INFINITY);
        let mut max = vec2(f32::NEG_INFINITY, f32::NEG_INFINITY);

        for point in points {
            min = min.min(*point);
            max = max.max(*point);
        }

        if !(min.x.is_finite() && min.y.is_finite() && max.x.is_finite() && max.y.is_finite()) {
            return None;
        }

        let span = (max - min).max_elem().max(1.0);
        Some(Self {
            center: (min + max) * 0.5,
            half_extent: span * 0.5 + 1.0,
        })
    }

    fn child(self, quadrant: usize) -> Self {
        let quarter = self.half_extent * 0.5;
        let offset = match quadrant {
            0 => vec2(-quarter, -quarter),
            1 => vec2(quarter, -quarter),
            2 => vec2(-quarter, quarter),
            _ => vec2(quarter, quarter),
        };

        Self {
            center: self.center + offset,
            half_extent: quarter,
        }
    }

    fn quadrant_for(self, point: Vec2) -> usize {
        match (point.x >= self.center.x, point.y >= self.center.y) {
            (false, false) => 0,
            (true, false) => 1,
            (false, true) => 2,
            (true, true) => 3,
        }
    }

    pub(super) fn side_length(self) -> f32 {
        self.half_extent * 2.0
    }

    /// Squared gap between two cells; zero when they touch or overlap.
    pub(super) fn gap_sq(self, other: Self) -> f32 {
        let reach = self.half_extent + other.half_extent;
        let gap = ((self.center - other.center).abs() - vec2(reach, reach)).max(Vec2::ZERO);
        gap.length_sq()
    }
}

/// A region quadtree over a snapshot of points. Internal nodes keep the
/// aggregate count and centroid of everything below them; leaves keep the
/// point indices.
pub(super) struct QuadNode {
    pub(super) bounds: QuadBounds,
    pub(super) centroid: Vec2,
    pub(super) count: usize,
    pub(super) indices: Vec<usize>,
    pub(super) children: [Option<Box<QuadNode>>; 4],
}

impl QuadNode {
    pub(super) fn build(points: &[Vec2]) -> Option<Self> {
        let bounds = QuadBounds::covering(points)?;
        let indices = (0..points.len()).collect::<Vec<_>>();
        Some(Self::build_node(bounds, indices, points, 0))
    }

    fn build_node(bounds: QuadBounds, indices: Vec<usize>, points: &[Vec2], depth: usize) -> Self {
        let count = indices.len();
        let centroid = if count == 0 {
            bounds.center
        } else {
            indices.iter().fold(Vec2::ZERO, |sum, &index| sum + points[index]) / count as f32
        };

        let mut node = Self {
            bounds,
            centroid,
            count,
            indices,
            children: std::array::from_fn(|_| None),
        };

        if depth >= MAX_DEPTH || node.count <= LEAF_CAPACITY {
            return node;
        }

        let mut buckets = std::array::from_fn::<_, 4, _>(|_| Vec::new());
        for &index in &node.indices {
            buckets[bounds.quadrant_for(points[index])].push(index);
        }

        // Coincident points never separate; keep them together in one leaf.
        if buckets.iter().filter(|bucket| !bucket.is_empty()).count() <= 1 {
            return node;
        }

        for (quadrant, bucket) in buckets.into_iter().enumerate() {
            if bucket.is_empty() {
                continue;
            }
            node.children[quadrant] = Some(Box::new(Self::build_node(
                bounds.child(quadrant),
                bucket,
                points,
                depth + 1,
            )));
        }
        node.indices.clear();
        node
    }

    pub(super) fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }

    pub(super) fn children(&self) -> impl Iterator<Item = &QuadNode> {
        self.children.iter().filter_map(|child| child.as_deref())
    }

    /// Calls `visit(a, b)` once for every unordered pair of points whose cells
    /// lie within `max_distance` of each other. Pairs farther apart may be
    /// skipped; nearer pairs never are.
    pub(super) fn for_each_near_pair(&self, max_distance: f32, visit: &mut impl FnMut(usize, usize)) {
        let max_gap_sq = max_distance * max_distance;
        visit_pairs(self, self, true, max_gap_sq, visit);
    }
}

fn visit_pairs(
    node_a: &QuadNode,
    node_b: &QuadNode,
    same_node: bool,
    max_gap_sq: f32,
    visit: &mut impl FnMut(usize, usize),
) {
    if node_a.bounds.gap_sq(node_b.bounds) > max_gap_sq {
        return;
    }

    if node_a.is_leaf() && node_b.is_leaf() {
        if same_node {
            for (offset, &a) in node_a.indices.iter().enumerate() {
                for &b in &node_a.indices[offset + 1..] {
                    visit(a, b);
                }
            }
        } else {
            for &a in &node_a.indices {
                for &b in &node_b.indices {
                    visit(a, b);
                }
            }
        }
        return;
    }

    if same_node {
        let children = node_a.children().collect::<Vec<_>>();
        for (offset, child_a) in children.iter().enumerate() {
            visit_pairs(child_a, child_a, true, max_gap_sq, visit);
            for child_b in &children[offset + 1..] {
                visit_pairs(child_a, child_b, false, max_gap_sq, visit);
            }
        }
        return;
    }

    let split_a = if node_a.is_leaf() {
        false
    } else if node_b.is_leaf() {
        true
    } else {
        node_a.bounds.half_extent >= node_b.bounds.half_extent
    };

    if split_a {
        for child in node_a.children() {
            visit_pairs(child, node_b, false, max_gap_sq, visit);
        }
    } else {
        for child in node_b.children() {
            visit_pairs(node_a, child, false, max_gap_sq, visit);
        }
    }
}
