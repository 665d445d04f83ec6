pub mod env;
pub mod helix;
pub mod telemetry;
pub mod token;

#[cfg(test)]
pub mod testing;
