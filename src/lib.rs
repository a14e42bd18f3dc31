pub mod alert_log;
pub mod analytics_config;
pub mod detections;
pub mod errors;
pub mod frame_processor;
pub mod geometry_utils;
pub mod render;
pub mod systems;

pub type Point2D = (i32, i32);
