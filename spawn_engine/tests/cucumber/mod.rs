mod escrow_world;
mod setups;
mod steps;

pub use escrow_world::{EscrowSystem, EscrowWorld};
