pub mod config;
pub mod ids;
pub mod object;
pub mod project;
pub mod stage;
pub mod status;
pub mod violation;

pub use config::*;
pub use ids::*;
pub use object::*;
pub use project::*;
pub use stage::*;
pub use status::*;
