//! holoscene - walk-through glTF viewer
//!
//! - WASD moves the camera in the ground plane, dragging turns it
//! - Model meshes under the pointer light up as holograms
//! - Images and videos dropped on the cube become its texture
//!
//! Usage: `holoscene [MODEL_PATH]`

mod app;
mod assets;
mod config;
mod controller;
mod media;
mod render;
mod scene;
mod ui;

use std::path::PathBuf;

fn main() {
    let model_arg = std::env::args_os().nth(1).map(PathBuf::from);
    app::run(model_arg);
}
