//! Frame output.
//!
//! The tick loop always draws into a [`FrameRecorder`]; that part needs no
//! GPU and is what tests inspect. With the `renderer` feature, the
//! [`DebugRenderer`] turns a recorded frame into coloured triangles with wgpu
//! and [`run_windowed`] drives the game inside a winit window.

pub mod recorder;
pub mod text;

pub use recorder::{DrawCommand, FrameRecorder};

#[cfg(feature = "renderer")]
pub mod app;
#[cfg(feature = "renderer")]
pub mod renderer;

#[cfg(feature = "renderer")]
pub use app::run_windowed;
#[cfg(feature = "renderer")]
pub use renderer::{Camera2D, DebugRenderer};
