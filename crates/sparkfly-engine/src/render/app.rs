//! Windowed runner.
//!
//! [`run_windowed`] takes ownership of a [`TickLoop`] and drives it inside a
//! winit event loop. Window events are folded into the loop's input frame
//! as they arrive; each `RedrawRequested` runs one tick and presents the
//! frame it recorded.

use std::sync::Arc;

use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{WindowAttributes, WindowId};

use sparkfly_ecs::geometry::Vec2;
use sparkfly_ecs::input::{InputFrame, Key, Modifiers, MouseButton};

use super::renderer::{Camera2D, DebugRenderer};
use crate::tick::TickLoop;

/// Run the game in a window until it finishes or the player quits.
///
/// The window is sized by [`TickConfig::window_size`](crate::tick::TickConfig::window_size)
/// and titled with the level and death count, refreshed every tick.
///
/// # Errors
///
/// Returns an error if the event loop cannot be created, if the window or
/// renderer cannot be initialized, or if a tick fails.
pub fn run_windowed(tick_loop: TickLoop) -> Result<(), anyhow::Error> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(winit::event_loop::ControlFlow::Poll);

    let mut app = App {
        state: AppState::Pending { tick_loop },
        failure: None,
    };

    event_loop.run_app(&mut app)?;

    match app.failure {
        Some(message) => Err(anyhow::anyhow!(message)),
        None => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Input mapping
// ---------------------------------------------------------------------------

fn map_key(code: KeyCode) -> Option<Key> {
    Some(match code {
        KeyCode::ArrowUp => Key::Up,
        KeyCode::ArrowDown => Key::Down,
        KeyCode::ArrowLeft => Key::Left,
        KeyCode::ArrowRight => Key::Right,
        KeyCode::KeyW => Key::W,
        KeyCode::KeyA => Key::A,
        KeyCode::KeyS => Key::S,
        KeyCode::KeyD => Key::D,
        KeyCode::Space => Key::Space,
        KeyCode::Escape => Key::Escape,
        _ => return None,
    })
}

fn map_button(button: winit::event::MouseButton) -> Option<MouseButton> {
    match button {
        winit::event::MouseButton::Left => Some(MouseButton::Left),
        winit::event::MouseButton::Middle => Some(MouseButton::Middle),
        winit::event::MouseButton::Right => Some(MouseButton::Right),
        _ => None,
    }
}

/// Wheel button for a scroll delta; positive y scrolls up.
fn wheel_button(delta: MouseScrollDelta) -> Option<MouseButton> {
    let y = match delta {
        MouseScrollDelta::LineDelta(_, y) => f64::from(y),
        MouseScrollDelta::PixelDelta(pos) => pos.y,
    };
    if y > 0.0 {
        Some(MouseButton::WheelUp)
    } else if y < 0.0 {
        Some(MouseButton::WheelDown)
    } else {
        None
    }
}

/// Fold one window event into `input`. `to_canvas` converts a physical
/// cursor position into canvas pixels.
fn apply_event(input: &mut InputFrame, event: &WindowEvent, to_canvas: impl Fn(f64, f64) -> Vec2) {
    match event {
        WindowEvent::KeyboardInput { event, .. } => {
            let PhysicalKey::Code(code) = event.physical_key else {
                return;
            };
            let Some(key) = map_key(code) else {
                return;
            };
            match event.state {
                ElementState::Pressed => {
                    input.press_key(key);
                    if key == Key::Escape {
                        input.request_exit();
                    }
                }
                ElementState::Released => input.release_key(key),
            }
        }
        WindowEvent::MouseInput { state, button, .. } => {
            if let Some(button) = map_button(*button) {
                match state {
                    ElementState::Pressed => input.press_button(button),
                    ElementState::Released => input.release_button(button),
                }
            }
        }
        WindowEvent::MouseWheel { delta, .. } => {
            // A wheel notch is a click with no hold.
            if let Some(button) = wheel_button(*delta) {
                input.press_button(button);
                input.release_button(button);
            }
        }
        WindowEvent::CursorMoved { position, .. } => {
            input.move_pointer(to_canvas(position.x, position.y));
        }
        WindowEvent::ModifiersChanged(modifiers) => {
            let state = modifiers.state();
            input.set_modifiers(Modifiers {
                shift: state.shift_key(),
                ctrl: state.control_key(),
                alt: state.alt_key(),
            });
        }
        _ => {}
    }
}

// ---------------------------------------------------------------------------
// Internal state machine
// ---------------------------------------------------------------------------

/// Winit 0.30 creates windows inside `resumed`, so the app starts
/// `Pending` and becomes `Running` once the window and renderer exist.
enum AppState {
    Pending {
        tick_loop: TickLoop,
    },
    Running {
        tick_loop: TickLoop,
        renderer: DebugRenderer,
    },
    /// Placeholder while moving between states.
    Transitioning,
}

struct App {
    state: AppState,
    /// Why the event loop was stopped early, if it was.
    failure: Option<String>,
}

fn fail(failure: &mut Option<String>, event_loop: &ActiveEventLoop, message: String) {
    tracing::error!(error = %message, "stopping windowed game");
    *failure = Some(message);
    event_loop.exit();
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let state = std::mem::replace(&mut self.state, AppState::Transitioning);
        let tick_loop = match state {
            AppState::Pending { tick_loop } => tick_loop,
            running @ AppState::Running { .. } => {
                self.state = running;
                return;
            }
            AppState::Transitioning => {
                tracing::warn!("resumed called during state transition");
                return;
            }
        };

        let (width, height) = tick_loop.config().window_size();
        let window_attrs = WindowAttributes::default()
            .with_title(tick_loop.title())
            .with_inner_size(winit::dpi::PhysicalSize::new(width, height));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                self.state = AppState::Pending { tick_loop };
                fail(&mut self.failure, event_loop, format!("failed to create window: {e}"));
                return;
            }
        };

        let camera = Camera2D::new(
            tick_loop.config().canvas_width as f32,
            tick_loop.config().canvas_height as f32,
        );
        match pollster::block_on(DebugRenderer::new(window.clone(), camera)) {
            Ok(renderer) => {
                tracing::info!(width, height, "game window created");
                window.request_redraw();
                self.state = AppState::Running {
                    tick_loop,
                    renderer,
                };
            }
            Err(e) => {
                self.state = AppState::Pending { tick_loop };
                fail(&mut self.failure, event_loop, format!("failed to initialize renderer: {e}"));
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let AppState::Running {
            tick_loop,
            renderer,
        } = &mut self.state
        else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                tracing::info!(
                    ticks = tick_loop.tick_count(),
                    deaths = tick_loop.deaths(),
                    "window close requested"
                );
                tick_loop.input_mut().request_exit();
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                tracing::debug!(
                    width = new_size.width,
                    height = new_size.height,
                    "window resized"
                );
                renderer.resize(new_size);
            }
            WindowEvent::RedrawRequested => {
                let phase = match tick_loop.tick() {
                    Ok(phase) => phase,
                    Err(e) => {
                        let message = format!("tick failed: {e}");
                        fail(&mut self.failure, event_loop, message);
                        return;
                    }
                };

                renderer.window().set_title(&tick_loop.title());

                match renderer.render(tick_loop.frame().commands()) {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost) => {
                        let size = renderer.window().inner_size();
                        renderer.resize(size);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        fail(&mut self.failure, event_loop, "GPU out of memory".to_owned());
                        return;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "surface error during render");
                    }
                }

                if phase.is_terminal() {
                    tracing::info!(
                        ?phase,
                        level = tick_loop.level(),
                        deaths = tick_loop.deaths(),
                        "game over"
                    );
                    event_loop.exit();
                    return;
                }
                renderer.window().request_redraw();
            }
            other => {
                let size = renderer.window().inner_size();
                let config = tick_loop.config();
                let sx = f64::from(config.canvas_width) / f64::from(size.width.max(1));
                let sy = f64::from(config.canvas_height) / f64::from(size.height.max(1));
                apply_event(tick_loop.input_mut(), &other, |x, y| {
                    Vec2::new(x * sx, y * sy)
                });
            }
        }
    }
}
