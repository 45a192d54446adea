use eframe::egui::Vec2;

use crate::error::LayoutError;
use crate::graph::GraphLink;

use super::quadtree::QuadNode;
use super::simulation::{Body, Force, Lcg};

const BARNES_HUT_THETA: f32 = 0.9;
const DISTANCE_MIN_SQ: f32 = 1.0;

/// Replaces exactly-zero components with a jiggle and returns the squared
/// length of the result.
fn jiggled(delta: &mut Vec2, rng: &mut Lcg) -> f32 {
    if delta.x == 0.0 {
        delta.x = rng.jiggle();
    }
    if delta.y == 0.0 {
        delta.y = rng.jiggle();
    }
    delta.length_sq()
}

/// Pairwise charge between all bodies, approximated with Barnes–Hut.
/// Negative strength repels.
#[derive(Clone, Debug)]
pub struct ManyBodyForce {
    strength: f32,
    theta_sq: f32,
    positions: Vec<Vec2>,
}

impl ManyBodyForce {
    pub fn new(strength: f32) -> Self {
        Self {
            strength,
            theta_sq: BARNES_HUT_THETA * BARNES_HUT_THETA,
            positions: Vec::new(),
        }
    }

    pub fn with_theta(mut self, theta: f32) -> Self {
        self.theta_sq = theta * theta;
        self
    }
}

impl Force for ManyBodyForce {
    fn apply(&mut self, bodies: &mut [Body], alpha: f32, rng: &mut Lcg) {
        self.positions.clear();
        self.positions.extend(bodies.iter().map(|body| body.position));
        let Some(tree) = QuadNode::build(&self.positions) else {
            return;
        };

        let scale = self.strength * alpha;
        for (index, body) in bodies.iter_mut().enumerate() {
            accumulate_charge(
                &tree,
                index,
                &self.positions,
                scale,
                self.theta_sq,
                rng,
                &mut body.velocity,
            );
        }
    }
}

fn accumulate_charge(
    node: &QuadNode,
    index: usize,
    positions: &[Vec2],
    scale: f32,
    theta_sq: f32,
    rng: &mut Lcg,
    velocity: &mut Vec2,
) {
    if node.count == 0 {
        return;
    }

    let point = positions[index];

    if !node.is_leaf() {
        let mut delta = node.centroid - point;
        let width = node.bounds.side_length();
        let mut distance_sq = delta.length_sq();
        if width * width / theta_sq < distance_sq {
            distance_sq = jiggled(&mut delta, rng);
            if distance_sq < DISTANCE_MIN_SQ {
                distance_sq = (DISTANCE_MIN_SQ * distance_sq).sqrt();
            }
            *velocity += delta * (scale * node.count as f32 / distance_sq);
            return;
        }

        for child in node.children() {
            accumulate_charge(child, index, positions, scale, theta_sq, rng, velocity);
        }
        return;
    }

    for &other in &node.indices {
        if other == index {
            continue;
        }

        let mut delta = positions[other] - point;
        let mut distance_sq = jiggled(&mut delta, rng);
        if distance_sq < DISTANCE_MIN_SQ {
            distance_sq = (DISTANCE_MIN_SQ * distance_sq).sqrt();
        }
        *velocity += delta * (scale / distance_sq);
    }
}

/// Springs along links. Each link's stiffness is `1 / min(degree)` of its
/// endpoints and the correction is split by relative degree.
#[derive(Clone, Debug)]
pub struct LinkForce {
    distance: f32,
    links: Vec<ResolvedLink>,
}

#[derive(Clone, Copy, Debug)]
struct ResolvedLink {
    source: usize,
    target: usize,
    strength: f32,
    bias: f32,
}

impl LinkForce {
    /// Resolves link endpoints by node id.
    pub fn from_links(
        links: &[GraphLink],
        index_of: impl Fn(&str) -> Option<usize>,
        node_count: usize,
        distance: f32,
    ) -> Result<Self, LayoutError> {
        let resolve = |id: &str, link: &GraphLink| {
            index_of(id)
                .filter(|&index| index < node_count)
                .ok_or_else(|| LayoutError::UnknownNode {
                    source_id: link.source_id.clone(),
                    target_id: link.target_id.clone(),
                    missing: id.to_owned(),
                })
        };

        let pairs = links
            .iter()
            .map(|link| Ok((resolve(&link.source_id, link)?, resolve(&link.target_id, link)?)))
            .collect::<Result<Vec<_>, LayoutError>>()?;

        Ok(Self::from_pairs(&pairs, node_count, distance))
    }

    pub fn from_pairs(pairs: &[(usize, usize)], node_count: usize, distance: f32) -> Self {
        let mut degree = vec![0usize; node_count];
        for &(source, target) in pairs {
            degree[source] += 1;
            degree[target] += 1;
        }

        let links = pairs
            .iter()
            .map(|&(source, target)| {
                let source_degree = degree[source] as f32;
                let target_degree = degree[target] as f32;
                ResolvedLink {
                    source,
                    target,
                    strength: 1.0 / source_degree.min(target_degree),
                    bias: source_degree / (source_degree + target_degree),
                }
            })
            .collect();

        Self { distance, links }
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

impl Force for LinkForce {
    fn apply(&mut self, bodies: &mut [Body], alpha: f32, rng: &mut Lcg) {
        for link in &self.links {
            let source = bodies[link.source];
            let target = bodies[link.target];
            let mut delta =
                (target.position + target.velocity) - (source.position + source.velocity);
            let length = jiggled(&mut delta, rng).sqrt();
            let delta = delta * ((length - self.distance) / length * alpha * link.strength);

            bodies[link.target].velocity -= delta * link.bias;
            bodies[link.source].velocity += delta * (1.0 - link.bias);
        }
    }
}

/// Translates every body so the mean position lands on `center`. Does not
/// touch velocities.
#[derive(Clone, Copy, Debug)]
pub struct CenterForce {
    center: Vec2,
    strength: f32,
}

impl CenterForce {
    pub fn new(center: Vec2) -> Self {
        Self {
            center,
            strength: 1.0,
        }
    }
}

impl Force for CenterForce {
    fn apply(&mut self, bodies: &mut [Body], _alpha: f32, _rng: &mut Lcg) {
        if bodies.is_empty() {
            return;
        }

        let mean = bodies.iter().fold(Vec2::ZERO, |sum, body| sum + body.position)
            / bodies.len() as f32;
        let shift = (mean - self.center) * self.strength;
        for body in bodies {
            body.position -= shift;
        }
    }
}

/// Keeps bodies at least `2 * radius` apart, judged on positions predicted
/// one step ahead.
#[derive(Clone, Debug)]
pub struct CollideForce {
    radius: f32,
    strength: f32,
    predicted: Vec<Vec2>,
}

impl CollideForce {
    pub fn new(radius: f32) -> Self {
        Self {
            radius,
            strength: 1.0,
            predicted: Vec::new(),
        }
    }
}

impl Force for CollideForce {
    fn apply(&mut self, bodies: &mut [Body], _alpha: f32, rng: &mut Lcg) {
        if bodies.len() < 2 || self.radius <= 0.0 {
            return;
        }

        self.predicted.clear();
        self.predicted
            .extend(bodies.iter().map(|body| body.position + body.velocity));
        let Some(tree) = QuadNode::build(&self.predicted) else {
            return;
        };

        let reach = self.radius * 2.0;
        let reach_sq = reach * reach;
        // Equal radii split every correction evenly.
        let share = 0.5;
        let strength = self.strength;

        tree.for_each_near_pair(reach, &mut |first, second| {
            let (a, b) = (bodies[first], bodies[second]);
            let mut delta = (a.position + a.velocity) - (b.position + b.velocity);
            if delta.length_sq() >= reach_sq {
                return;
            }

            let length = jiggled(&mut delta, rng).sqrt();
            let delta = delta * ((reach - length) / length * strength);
            bodies[first].velocity += delta * share;
            bodies[second].velocity -= delta * (1.0 - share);
        });
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// Pulls each body's velocity toward a fixed coordinate on one axis.
#[derive(Clone, Copy, Debug)]
pub struct PositionForce {
    axis: Axis,
    target: f32,
    strength: f32,
}

impl PositionForce {
    pub fn x(target: f32, strength: f32) -> Self {
        Self {
            axis: Axis::X,
            target,
            strength,
        }
    }

    pub fn y(target: f32, strength: f32) -> Self {
        Self {
            axis: Axis::Y,
            target,
            strength,
        }
    }
}

impl Force for PositionForce {
    fn apply(&mut self, bodies: &mut [Body], alpha: f32, _rng: &mut Lcg) {
        let k = self.strength * alpha;
        for body in bodies {
            match self.axis {
                Axis::X => body.velocity.x += (self.target - body.position.x) * k,
                Axis::Y => body.velocity.y += (self.target - body.position.y) * k,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use super::*;

    fn bodies_at(points: &[Vec2]) -> Vec<Body> {
        points
            .iter()
            .map(|&position| Body {
                position,
                ..Body::default()
            })
            .collect()
    }

    fn link(source: &str, target: &str) -> GraphLink {
        GraphLink {
            source_id: source.to_owned(),
            target_id: target.to_owned(),
            relation_key: "symptoms".to_owned(),
            relation_label: "HAS_SYMPTOM".to_owned(),
        }
    }

    #[test]
    fn negative_charge_pushes_bodies_apart() {
        let mut bodies = bodies_at(&[vec2(0.0, 0.0), vec2(10.0, 0.0)]);
        ManyBodyForce::new(-600.0).apply(&mut bodies, 1.0, &mut Lcg::default());

        assert!(bodies[0].velocity.x < 0.0);
        assert!(bodies[1].velocity.x > 0.0);
        assert!((bodies[0].velocity.x + bodies[1].velocity.x).abs() < 1e-4);
        // strength * alpha * dx / dx^2
        assert!((bodies[1].velocity.x - 60.0).abs() < 1e-3);
    }

    #[test]
    fn barnes_hut_tracks_exact_sum_for_distant_cluster() {
        let mut points = vec![vec2(0.0, 0.0)];
        for row in 0..5 {
            for col in 0..5 {
                points.push(vec2(1_000.0 + col as f32 * 4.0, row as f32 * 4.0));
            }
        }

        let mut approximate = bodies_at(&points);
        ManyBodyForce::new(-30.0).apply(&mut approximate, 1.0, &mut Lcg::default());

        let mut exact = bodies_at(&points);
        ManyBodyForce::new(-30.0)
            .with_theta(1e-3)
            .apply(&mut exact, 1.0, &mut Lcg::default());

        let error = (approximate[0].velocity - exact[0].velocity).length();
        assert!(error / exact[0].velocity.length() < 0.01);
    }

    #[test]
    fn link_springs_pull_stretched_pairs_together() {
        let mut bodies = bodies_at(&[vec2(0.0, 0.0), vec2(300.0, 0.0)]);
        let mut force = LinkForce::from_pairs(&[(0, 1)], 2, 100.0);
        force.apply(&mut bodies, 1.0, &mut Lcg::default());

        // Degree 1 at both ends: full strength, even split of the 200 excess.
        assert!((bodies[0].velocity.x - 100.0).abs() < 1e-3);
        assert!((bodies[1].velocity.x + 100.0).abs() < 1e-3);
    }

    #[test]
    fn link_bias_favors_moving_the_lighter_end() {
        let force = LinkForce::from_pairs(&[(0, 1), (0, 2), (0, 3)], 4, 50.0);
        let hub_link = force.links[0];

        assert_eq!(hub_link.strength, 1.0);
        assert!((hub_link.bias - 0.75).abs() < 1e-6);
    }

    #[test]
    fn links_resolve_by_node_id() -> anyhow::Result<()> {
        let ids = ["Depression", "Insomnia"];
        let index_of = |id: &str| ids.iter().position(|candidate| *candidate == id);
        let force = LinkForce::from_links(&[link("Depression", "Insomnia")], index_of, 2, 100.0)?;
        assert_eq!(force.len(), 1);

        let error = LinkForce::from_links(&[link("Depression", "Fatigue")], index_of, 2, 100.0)
            .err();
        assert_eq!(
            error,
            Some(LayoutError::UnknownNode {
                source_id: "Depression".to_owned(),
                target_id: "Fatigue".to_owned(),
                missing: "Fatigue".to_owned(),
            })
        );
        Ok(())
    }

    #[test]
    fn center_force_moves_mean_onto_center() {
        let mut bodies = bodies_at(&[vec2(0.0, 0.0), vec2(20.0, 40.0)]);
        CenterForce::new(vec2(400.0, 400.0)).apply(&mut bodies, 0.5, &mut Lcg::default());

        let mean = (bodies[0].position + bodies[1].position) * 0.5;
        assert!((mean - vec2(400.0, 400.0)).length() < 1e-3);
        assert_eq!(bodies[1].position - bodies[0].position, vec2(20.0, 40.0));
    }

    #[test]
    fn collide_separates_overlapping_bodies() {
        let mut bodies = bodies_at(&[vec2(0.0, 0.0), vec2(10.0, 0.0), vec2(500.0, 0.0)]);
        CollideForce::new(40.0).apply(&mut bodies, 1.0, &mut Lcg::default());

        assert!(bodies[0].velocity.x < 0.0);
        assert!(bodies[1].velocity.x > 0.0);
        assert_eq!(bodies[2].velocity, Vec2::ZERO);
    }

    #[test]
    fn coincident_bodies_still_separate() {
        let mut bodies = bodies_at(&[vec2(5.0, 5.0), vec2(5.0, 5.0)]);
        CollideForce::new(40.0).apply(&mut bodies, 1.0, &mut Lcg::default());

        assert!(bodies[0].velocity.length() > 1.0);
        assert!((bodies[0].velocity + bodies[1].velocity).length() < 1e-3);
    }

    #[test]
    fn position_force_scales_with_alpha() {
        let mut bodies = bodies_at(&[vec2(100.0, 700.0)]);
        PositionForce::x(400.0, 0.03).apply(&mut bodies, 0.5, &mut Lcg::default());
        PositionForce::y(400.0, 0.03).apply(&mut bodies, 0.5, &mut Lcg::default());

        assert!((bodies[0].velocity.x - 4.5).abs() < 1e-4);
        assert!((bodies[0].velocity.y + 4.5).abs() < 1e-4);
    }
}
