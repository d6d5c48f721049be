pub mod consumption;
pub mod memory;
pub mod store;
