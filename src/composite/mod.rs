pub mod compositor;
pub mod params;
pub mod transform;
