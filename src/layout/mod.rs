//! Drives the force simulation from the graph and config stores.

mod forces;
mod quadtree;
mod simulation;

use std::fmt;

use eframe::egui::Vec2;
use tracing::{debug, info, warn};

use crate::config::{ForceParams, GraphConfig};
use crate::error::LayoutError;
use crate::graph::GraphDataStore;

pub use forces::{Axis, CenterForce, CollideForce, LinkForce, ManyBodyForce, PositionForce};
pub use simulation::{
    ALPHA_MIN, Body, Force, ForceSimulation, Lcg, Simulation, VELOCITY_DECAY, default_alpha_decay,
};

pub const POSITION_STRENGTH: f32 = 0.03;
/// Alpha target held while a node is being dragged.
pub const DRAG_ALPHA_TARGET: f32 = 0.3;
/// Alpha a simulation is reheated to after the view is reset.
pub const REHEAT_ALPHA: f32 = 0.3;

pub type SimulationFactory = Box<dyn Fn(Vec<Option<Vec2>>) -> Box<dyn Simulation>>;

/// Everything whose change requires a fresh simulation.
#[derive(Clone, Copy, Debug, PartialEq)]
struct LayoutKey {
    revision: u64,
    params: ForceParams,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeFrame {
    pub index: usize,
    pub position: Vec2,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinkFrame {
    pub index: usize,
    pub source: Vec2,
    pub target: Vec2,
    pub midpoint: Vec2,
}

/// Positions to draw for one frame. Unpositioned nodes, and links touching
/// them, are left out.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickFrame {
    pub nodes: Vec<NodeFrame>,
    pub links: Vec<LinkFrame>,
}

impl TickFrame {
    pub fn capture(store: &GraphDataStore) -> Self {
        let nodes = store
            .nodes()
            .iter()
            .enumerate()
            .filter_map(|(index, node)| Some(NodeFrame {
                index,
                position: node.position()?,
            }))
            .collect();

        let links = store
            .links()
            .iter()
            .enumerate()
            .filter_map(|(index, link)| {
                let source = store.node(&link.source_id)?.position()?;
                let target = store.node(&link.target_id)?.position()?;
                Some(LinkFrame {
                    index,
                    source,
                    target,
                    midpoint: source + (target - source) * 0.5,
                })
            })
            .collect();

        Self { nodes, links }
    }
}

pub struct LayoutController {
    factory: SimulationFactory,
    simulation: Option<Box<dyn Simulation>>,
    key: Option<LayoutKey>,
    generation: u64,
}

impl Default for LayoutController {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LayoutController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutController")
            .field("key", &self.key)
            .field("generation", &self.generation)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl LayoutController {
    pub fn new() -> Self {
        Self::with_factory(|initial| Box::new(ForceSimulation::new(initial)) as Box<dyn Simulation>)
    }

    pub fn with_factory(
        factory: impl Fn(Vec<Option<Vec2>>) -> Box<dyn Simulation> + 'static,
    ) -> Self {
        Self {
            factory: Box::new(factory),
            simulation: None,
            key: None,
            generation: 0,
        }
    }

    /// Re-initializes only when node/link identity or a force parameter
    /// changed since the live simulation was built. Returns whether it did.
    pub fn sync(
        &mut self,
        store: &mut GraphDataStore,
        config: &GraphConfig,
    ) -> Result<bool, LayoutError> {
        let key = LayoutKey {
            revision: store.revision(),
            params: config.force_params(),
        };
        if self.simulation.is_some() && self.key == Some(key) {
            return Ok(false);
        }

        debug!(
            revision = key.revision,
            previous = ?self.key.map(|key| key.revision),
            "layout key changed"
        );
        self.initialize(store, config)?;
        Ok(true)
    }

    /// Stops any live simulation and starts a new one over the current nodes.
    /// Every pin is cleared.
    pub fn initialize(
        &mut self,
        store: &mut GraphDataStore,
        config: &GraphConfig,
    ) -> Result<(), LayoutError> {
        self.teardown();

        for node in store.nodes_mut() {
            node.unpin();
        }

        let params = config.force_params();
        let node_count = store.nodes().len();
        let link = LinkForce::from_links(
            store.links(),
            |id| store.index_of(id),
            node_count,
            params.link_distance,
        )?;

        let initial = store.nodes().iter().map(|node| node.position()).collect();
        let mut simulation = (self.factory)(initial);
        let actual = simulation.bodies().len();
        if actual != node_count {
            return Err(LayoutError::BodyCountMismatch {
                expected: node_count,
                actual,
            });
        }

        let center = params.center();
        simulation.set_force("charge", Box::new(ManyBodyForce::new(params.charge_strength)));
        simulation.set_force("link", Box::new(link));
        simulation.set_force("center", Box::new(CenterForce::new(center)));
        simulation.set_force("collide", Box::new(CollideForce::new(params.collision_radius())));
        simulation.set_force("x", Box::new(PositionForce::x(center.x, POSITION_STRENGTH)));
        simulation.set_force("y", Box::new(PositionForce::y(center.y, POSITION_STRENGTH)));

        self.simulation = Some(simulation);
        self.key = Some(LayoutKey {
            revision: store.revision(),
            params,
        });
        self.generation += 1;

        info!(
            generation = self.generation,
            nodes = node_count,
            links = store.links().len(),
            charge = params.charge_strength,
            link_distance = params.link_distance,
            "layout simulation started"
        );
        Ok(())
    }

    /// Steps a running simulation once and writes positions back into the
    /// store. `None` when idle.
    pub fn tick(&mut self, store: &mut GraphDataStore) -> Option<TickFrame> {
        let simulation = self.simulation.as_mut()?;
        if !simulation.is_running() {
            return None;
        }

        if simulation.bodies().len() != store.nodes().len() {
            warn!(
                bodies = simulation.bodies().len(),
                nodes = store.nodes().len(),
                "graph changed without a layout sync; skipping tick"
            );
            return None;
        }

        for (body, node) in simulation.bodies_mut().iter_mut().zip(store.nodes()) {
            body.pinned = node.pinned();
        }

        simulation.step();

        for (node, body) in store.nodes_mut().iter_mut().zip(simulation.bodies()) {
            node.set_position(body.position);
        }

        Some(TickFrame::capture(store))
    }

    pub fn frame(&self, store: &GraphDataStore) -> TickFrame {
        TickFrame::capture(store)
    }

    pub fn teardown(&mut self) {
        if let Some(mut simulation) = self.simulation.take() {
            simulation.stop();
            debug!(generation = self.generation, "layout simulation stopped");
        }
        self.key = None;
    }

    pub fn set_alpha_target(&mut self, target: f32) {
        if let Some(simulation) = self.simulation.as_mut() {
            simulation.set_alpha_target(target);
        }
    }

    /// Sets alpha and restarts the simulation.
    pub fn reheat(&mut self, alpha: f32) {
        if let Some(simulation) = self.simulation.as_mut() {
            simulation.set_alpha(alpha);
            simulation.restart();
        }
    }

    pub fn restart(&mut self) {
        if let Some(simulation) = self.simulation.as_mut() {
            simulation.restart();
        }
    }

    pub fn alpha(&self) -> Option<f32> {
        self.simulation.as_ref().map(|simulation| simulation.alpha())
    }

    pub fn alpha_target(&self) -> Option<f32> {
        self.simulation
            .as_ref()
            .map(|simulation| simulation.alpha_target())
    }

    pub fn is_running(&self) -> bool {
        self.simulation
            .as_ref()
            .is_some_and(|simulation| simulation.is_running())
    }

    pub fn has_simulation(&self) -> bool {
        self.simulation.is_some()
    }

    pub fn force_names(&self) -> Vec<String> {
        self.simulation
            .as_ref()
            .map(|simulation| simulation.force_names())
            .unwrap_or_default()
    }

    /// Increments every time a simulation is built.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for LayoutController {
    fn drop(&mut self) {
        self.teardown();
    }
}
