pub mod blend;
pub mod surface;
pub mod text;
