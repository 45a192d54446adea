use std::f32::consts::PI;

use eframe::egui::{Vec2, vec2};
use tracing::debug;

pub const ALPHA_MIN: f32 = 0.001;
pub const VELOCITY_DECAY: f32 = 0.4;
const INITIAL_RADIUS: f32 = 10.0;

/// Decay that takes alpha from 1 to `ALPHA_MIN` in 300 ticks.
pub fn default_alpha_decay() -> f32 {
    1.0 - ALPHA_MIN.powf(1.0 / 300.0)
}

/// One simulated point. A pinned body sits exactly on its pin after every
/// tick, with zero velocity.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Body {
    pub position: Vec2,
    pub velocity: Vec2,
    pub pinned: Option<Vec2>,
}

/// Deterministic linear congruential generator, the same sequence for every
/// run so layouts are reproducible.
#[derive(Clone, Debug)]
pub struct Lcg {
    state: u64,
}

impl Default for Lcg {
    fn default() -> Self {
        Self { state: 1 }
    }
}

impl Lcg {
    const A: u64 = 1_664_525;
    const C: u64 = 1_013_904_223;
    const M: u64 = 1 << 32;

    pub fn next_unit(&mut self) -> f32 {
        self.state = (Self::A * self.state + Self::C) % Self::M;
        (self.state as f64 / Self::M as f64) as f32
    }

    /// A tiny nonzero offset used to separate coincident points.
    pub fn jiggle(&mut self) -> f32 {
        let offset = (self.next_unit() - 0.5) * 1e-6;
        if offset == 0.0 { 1e-7 } else { offset }
    }
}

pub trait Force {
    fn apply(&mut self, bodies: &mut [Body], alpha: f32, rng: &mut Lcg);
}

/// The physics engine seam. `tick` always advances one step; `step` only
/// advances while running and stops the engine once alpha has cooled below
/// `alpha_min`.
pub trait Simulation {
    fn set_force(&mut self, name: &str, force: Box<dyn Force>);
    fn force_names(&self) -> Vec<String>;
    fn bodies(&self) -> &[Body];
    fn bodies_mut(&mut self) -> &mut [Body];
    fn tick(&mut self);
    fn alpha(&self) -> f32;
    fn set_alpha(&mut self, alpha: f32);
    fn alpha_target(&self) -> f32;
    fn set_alpha_target(&mut self, target: f32);
    fn alpha_min(&self) -> f32;
    fn restart(&mut self);
    fn stop(&mut self);
    fn is_running(&self) -> bool;

    fn step(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }

        self.tick();
        if self.alpha() < self.alpha_min() {
            debug!(alpha = self.alpha(), "simulation cooled down");
            self.stop();
        }
        true
    }
}

pub struct ForceSimulation {
    bodies: Vec<Body>,
    forces: Vec<(String, Box<dyn Force>)>,
    alpha: f32,
    alpha_target: f32,
    alpha_min: f32,
    alpha_decay: f32,
    velocity_decay: f32,
    running: bool,
    rng: Lcg,
}

impl ForceSimulation {
    /// Bodies without a starting position are placed on a phyllotaxis spiral
    /// around the origin.
    pub fn new(initial: Vec<Option<Vec2>>) -> Self {
        let golden_angle = PI * (3.0 - 5.0_f32.sqrt());
        let bodies = initial
            .into_iter()
            .enumerate()
            .map(|(index, position)| {
                let position = position.filter(|p| p.x.is_finite() && p.y.is_finite());
                let position = position.unwrap_or_else(|| {
                    let radius = INITIAL_RADIUS * (0.5 + index as f32).sqrt();
                    let angle = index as f32 * golden_angle;
                    vec2(radius * angle.cos(), radius * angle.sin())
                });
                Body {
                    position,
                    ..Body::default()
                }
            })
            .collect();

        Self {
            bodies,
            forces: Vec::new(),
            alpha: 1.0,
            alpha_target: 0.0,
            alpha_min: ALPHA_MIN,
            alpha_decay: default_alpha_decay(),
            velocity_decay: 1.0 - VELOCITY_DECAY,
            running: true,
            rng: Lcg::default(),
        }
    }

    fn integrate(&mut self) {
        for body in &mut self.bodies {
            match body.pinned {
                Some(pin) => {
                    body.position = pin;
                    body.velocity = Vec2::ZERO;
                }
                None => {
                    body.velocity *= self.velocity_decay;
                    body.position += body.velocity;
                }
            }
        }
    }
}

impl Simulation for ForceSimulation {
    fn set_force(&mut self, name: &str, force: Box<dyn Force>) {
        match self.forces.iter_mut().find(|(existing, _)| existing == name) {
            Some((_, slot)) => *slot = force,
            None => self.forces.push((name.to_owned(), force)),
        }
    }

    fn force_names(&self) -> Vec<String> {
        self.forces.iter().map(|(name, _)| name.clone()).collect()
    }

    fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    fn bodies_mut(&mut self) -> &mut [Body] {
        &mut self.bodies
    }

    fn tick(&mut self) {
        self.alpha += (self.alpha_target - self.alpha) * self.alpha_decay;
        for (_, force) in &mut self.forces {
            force.apply(&mut self.bodies, self.alpha, &mut self.rng);
        }
        self.integrate();
    }

    fn alpha(&self) -> f32 {
        self.alpha
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha.clamp(0.0, 1.0);
    }

    fn alpha_target(&self) -> f32 {
        self.alpha_target
    }

    fn set_alpha_target(&mut self, target: f32) {
        self.alpha_target = target.clamp(0.0, 1.0);
    }

    fn alpha_min(&self) -> f32 {
        self.alpha_min
    }

    fn restart(&mut self) {
        self.running = true;
    }

    fn stop(&mut self) {
        self.running = false;
    }

    fn is_running(&self) -> bool {
        self.running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lcg_sequence_is_reproducible() {
        let mut first = Lcg::default();
        let mut second = Lcg::default();
        for _ in 0..16 {
            let value = first.next_unit();
            assert_eq!(value, second.next_unit());
            assert!((0.0..1.0).contains(&value));
        }
    }

    #[test]
    fn unplaced_bodies_follow_the_spiral() {
        let sim = ForceSimulation::new(vec![None, Some(vec2(3.0, 4.0)), None]);
        let bodies = sim.bodies();

        assert!((bodies[0].position - vec2(10.0 * 0.5_f32.sqrt(), 0.0)).length() < 1e-4);
        assert_eq!(bodies[1].position, vec2(3.0, 4.0));
        assert!((bodies[2].position.length() - 10.0 * 2.5_f32.sqrt()).abs() < 1e-4);
    }

    #[test]
    fn alpha_cools_below_minimum_in_about_three_hundred_steps() {
        let mut sim = ForceSimulation::new(vec![None; 3]);
        let mut steps = 0;
        while sim.step() {
            steps += 1;
            assert!(steps < 1_000, "simulation never stopped");
        }

        assert!(!sim.is_running());
        assert!(sim.alpha() < ALPHA_MIN);
        assert!((295..=305).contains(&steps), "stopped after {steps} steps");
    }

    #[test]
    fn warm_target_keeps_the_engine_running() {
        let mut sim = ForceSimulation::new(vec![None; 2]);
        sim.set_alpha_target(0.3);
        for _ in 0..2_000 {
            assert!(sim.step());
        }
        assert!((sim.alpha() - 0.3).abs() < 1e-3);
    }

    #[test]
    fn pinned_bodies_snap_to_their_pin() {
        let mut sim = ForceSimulation::new(vec![None, None]);
        sim.bodies_mut()[0].pinned = Some(vec2(100.0, 200.0));
        sim.bodies_mut()[0].velocity = vec2(5.0, 5.0);
        sim.tick();

        assert_eq!(sim.bodies()[0].position, vec2(100.0, 200.0));
        assert_eq!(sim.bodies()[0].velocity, Vec2::ZERO);
    }

    #[test]
    fn replacing_a_force_keeps_its_slot() {
        struct Noop;
        impl Force for Noop {
            fn apply(&mut self, _: &mut [Body], _: f32, _: &mut Lcg) {}
        }

        let mut sim = ForceSimulation::new(Vec::new());
        sim.set_force("charge", Box::new(Noop));
        sim.set_force("link", Box::new(Noop));
        sim.set_force("charge", Box::new(Noop));

        assert_eq!(sim.force_names(), vec!["charge".to_owned(), "link".to_owned()]);
    }
}
