pub mod check;
pub mod filter;
pub mod object_ops;
pub mod project_ops;
pub mod selection;
pub mod stage_ops;
