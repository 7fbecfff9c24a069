/// Particle swarm optimizers over real and binary search spaces.
pub mod particles;
