pub mod contract;
pub mod recommendation;
