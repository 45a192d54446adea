mod demo;
mod entity;
mod load;

pub use demo::demo_entities;
pub use entity::{Category, DomainEntity, RelatedEntity};
pub use load::{load_entities, parse_entities};
