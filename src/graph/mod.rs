mod build;
mod model;
mod store;

pub use build::{
    DEFAULT_RELATIONS, GraphBuilder, LinkDirection, NodeIdScheme, RelationSpec, build_graph,
    categories, colors, legend,
};
pub use model::{GraphLink, GraphModel, GraphNode};
pub use store::{GraphDataStore, GraphEvent};
