pub mod contour;
pub mod occupancy;
pub mod shape;
