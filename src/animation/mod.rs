pub mod anim;
pub mod curve;
pub mod ease;
pub mod ops;
pub mod spring;
