//! Helper items to assist the construction of crystal cells.

pub mod element;
pub mod geometry;
pub(crate) mod misc;
