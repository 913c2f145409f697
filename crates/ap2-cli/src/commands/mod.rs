pub mod audit;
pub mod demo;
