pub mod base;
pub mod invidious;
pub mod normalize;
