pub mod collections;
pub mod items;
pub mod project;
