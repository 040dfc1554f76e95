pub mod area;
pub mod board;
pub mod column;
pub mod planning;
pub mod project;
pub mod share;
pub mod store;
pub mod task;
pub mod user;
pub mod workspace;
