pub mod alpha_bleed;
pub mod cli;
pub mod commands;
pub mod config;
pub mod fetch;
pub mod pack;
pub mod palette;
pub mod paths;
pub mod quantize;
pub mod raster;
pub mod summary;
pub mod svg;
