pub mod models;
pub mod recommendation;
