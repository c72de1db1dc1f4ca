pub mod bus;
pub mod context;
pub mod entity;
pub mod member;
pub mod operation;
mod ordering;

pub use bus::{BusStats, Event, EventError, EventKind, Reaction};
pub use context::{BuildError, BuildSession, BuilderId};
pub use entity::EntityBuilder;
pub use member::MemberBuilder;
pub use operation::OperationBuilder;
