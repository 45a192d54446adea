//! Force-directed explorer for medical knowledge graphs: entity loading,
//! graph building, a d3-style layout engine and the eframe front end.

pub mod app;
pub mod config;
pub mod error;
pub mod events;
pub mod graph;
pub mod interaction;
pub mod knowledge;
pub mod layout;
mod util;

pub use app::{ExplorerApp, LoadRequest};
