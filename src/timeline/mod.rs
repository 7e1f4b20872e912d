pub mod tree;
pub mod window;
