pub mod masks;
pub mod raster;
