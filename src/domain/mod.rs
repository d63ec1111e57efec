pub mod entity;
pub mod glyph;
pub mod grid;
pub mod physics;
pub mod tile;
