pub mod ssa_builder;
pub mod ssa_loader;
pub mod ssa_nodes;
