use std::cell::RefCell;
use std::collections::HashSet;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context};
use tracing::{error, info, warn};

use crate::config::{ConfigEvent, ConfigPatch, ConfigStore};
use crate::events::SubscriptionId;
use crate::graph::{GraphBuilder, GraphDataStore, GraphEvent, GraphModel, NodeIdScheme};
use crate::interaction::InteractionController;
use crate::knowledge::{demo_entities, load_entities};
use crate::layout::{LayoutController, TickFrame};

mod graph;
mod render_utils;
mod ui;

/// Where entities come from and how they become graph nodes.
#[derive(Clone, Debug)]
pub struct LoadRequest {
    pub data: Option<PathBuf>,
    pub id_scheme: NodeIdScheme,
}

impl LoadRequest {
    fn source_label(&self) -> String {
        match &self.data {
            Some(path) => path.display().to_string(),
            None => "built-in demo".to_owned(),
        }
    }

    fn run(&self) -> anyhow::Result<GraphModel> {
        let entities = match &self.data {
            Some(path) => load_entities(path)?,
            None => demo_entities(),
        };
        let model = GraphBuilder::new(self.id_scheme).build(&entities);
        info!(
            entities = entities.len(),
            nodes = model.nodes.len(),
            links = model.links.len(),
            "knowledge graph built"
        );
        Ok(model)
    }
}

pub struct ExplorerApp {
    request: LoadRequest,
    startup_config: ConfigPatch,
    state: AppState,
    reload_rx: Option<Receiver<Result<GraphModel, String>>>,
}

enum Transition {
    Loaded(GraphModel),
    Failed(String),
    Retry,
}

enum AppState {
    Loading {
        rx: Receiver<Result<GraphModel, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    graph: GraphDataStore,
    config: ConfigStore,
    layout: LayoutController,
    interaction: InteractionController,
    frame: TickFrame,
    search: String,
    search_match_cache: Option<SearchMatchCache>,
    selected: Option<String>,
    hovered: Option<usize>,
    layout_error: Option<String>,
    status: Rc<RefCell<Option<String>>>,
    graph_subscription: SubscriptionId,
    config_subscription: SubscriptionId,
}

struct SearchMatchCache {
    query: String,
    revision: u64,
    matches: Arc<HashSet<usize>>,
}

impl ExplorerApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        request: LoadRequest,
        startup_config: ConfigPatch,
    ) -> Self {
        let state = Self::start_load(&request);
        Self {
            request,
            startup_config,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(request: &LoadRequest) -> Receiver<Result<GraphModel, String>> {
        let (tx, rx) = mpsc::channel();
        let request = request.clone();

        thread::spawn(move || {
            let result = request.run().map_err(|error| {
                error!(error = %format!("{error:#}"), "failed to load knowledge graph");
                format!("{error:#}")
            });
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(request: &LoadRequest) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(request),
        }
    }

    fn ready(&self, model: GraphModel) -> AppState {
        AppState::Ready(Box::new(ViewModel::new(model, self.startup_config.clone())))
    }
}

impl eframe::App for ExplorerApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(Ok(model)) => transition = Some(Transition::Loaded(model)),
                    Ok(Err(error)) => transition = Some(Transition::Failed(error)),
                    Err(TryRecvError::Empty) => ctx.request_repaint(),
                    Err(TryRecvError::Disconnected) => {
                        transition = Some(Transition::Failed(
                            "Background load worker disconnected".to_owned(),
                        ));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading knowledge graph...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load the knowledge graph");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Transition::Retry);
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                let source = self.request.source_label();
                model.show(ctx, &source, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(&self.request));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(result) => model.finish_reload(result),
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                            ctx.request_repaint();
                        }
                        Err(TryRecvError::Disconnected) => model.finish_reload(Err(
                            "Background load worker disconnected".to_owned(),
                        )),
                    }
                }
            }
        }

        if let Some(transition) = transition {
            self.reload_rx = None;
            self.state = match transition {
                Transition::Loaded(model) => self.ready(model),
                Transition::Failed(error) => AppState::Error(error),
                Transition::Retry => Self::start_load(&self.request),
            };
        }
    }
}

impl ViewModel {
    fn new(model: GraphModel, startup_config: ConfigPatch) -> Self {
        let status = Rc::new(RefCell::new(None));

        let mut graph = GraphDataStore::new();
        let graph_status = Rc::clone(&status);
        let graph_subscription = graph.subscribe(move |event| {
            let message = match event {
                GraphEvent::Replaced {
                    node_count,
                    link_count,
                    ..
                } => format!("Loaded {node_count} nodes and {link_count} links"),
                GraphEvent::ColorsChanged { changed } => format!("Recolored {changed} node(s)"),
            };
            *graph_status.borrow_mut() = Some(message);
        });
        graph.replace(model);

        let mut config = ConfigStore::new();
        let config_status = Rc::clone(&status);
        let config_subscription = config.subscribe(move |event: &ConfigEvent| {
            if event.forces_changed() {
                *config_status.borrow_mut() = Some("Forces changed; layout restarted".to_owned());
            }
        });
        config.update_config(startup_config);

        Self {
            graph,
            config,
            layout: LayoutController::new(),
            interaction: InteractionController::new(),
            frame: TickFrame::default(),
            search: String::new(),
            search_match_cache: None,
            selected: None,
            hovered: None,
            layout_error: None,
            status,
            graph_subscription,
            config_subscription,
        }
    }

    fn replace_graph(&mut self, model: GraphModel) {
        self.graph.replace(model);
        self.search_match_cache = None;
        self.hovered = None;
        self.layout_error = None;
        if let Some(selected) = &self.selected
            && self.graph.node(selected).is_none()
        {
            self.selected = None;
        }
    }

    /// A failed reload keeps the current graph and only reports the error.
    fn finish_reload(&mut self, result: Result<GraphModel, String>) {
        match result {
            Ok(model) => self.replace_graph(model),
            Err(error) => {
                warn!(%error, "reload failed; keeping the current graph");
                *self.status.borrow_mut() = Some(format!("Reload failed: {error}"));
            }
        }
    }

    fn status_text(&self) -> Option<String> {
        self.status.borrow().clone()
    }
}

impl Drop for ViewModel {
    fn drop(&mut self) {
        self.graph.unsubscribe(self.graph_subscription);
        self.config.unsubscribe(self.config_subscription);
    }
}
