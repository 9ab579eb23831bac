//! Glimmer demo application.
//!
//! Opens a window, builds a small scene with a lit cube, and drives the
//! renderer from the winit event loop. The viewer moves with WASD/QE and
//! looks around with the arrow keys.

use std::sync::Arc;

use anyhow::Result;
use ash::vk;
use glam::Vec3;
use tracing::{error, info};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::WindowId;

use glimmer_core::Timer;
use glimmer_platform::{InputState, KeyCode, Window};
use glimmer_renderer::{
    FrameContext, GlobalUbo, PointLightSystem, Renderer, SimpleRenderSystem,
};
use glimmer_resources::{Model, ModelData};
use glimmer_rhi::buffer::{Buffer, BufferUsage};
use glimmer_rhi::descriptor::{
    self, DescriptorBindingBuilder, DescriptorPool, DescriptorSetLayout,
};
use glimmer_rhi::sync::MAX_FRAMES_IN_FLIGHT;
use glimmer_scene::{Camera, GameObjectId, GameObjectMap, KeyboardController, PointLight, Transform};

const WINDOW_WIDTH: u32 = 1280;
const WINDOW_HEIGHT: u32 = 720;
const FOV_Y_DEGREES: f32 = 50.0;
const NEAR_PLANE: f32 = 0.5;
const FAR_PLANE: f32 = 100.0;

/// Everything that needs the Vulkan device.
///
/// Field order matters for teardown: the renderer is declared last so the
/// buffers, descriptor objects, and systems above it release their device
/// references before the renderer destroys the instance.
struct RenderState {
    _global_set_layout: DescriptorSetLayout,
    _descriptor_pool: DescriptorPool,
    ubo_buffers: Vec<Buffer>,
    global_descriptor_sets: Vec<vk::DescriptorSet>,
    simple_system: SimpleRenderSystem,
    point_light_system: PointLightSystem,
    game_objects: GameObjectMap,
    light_id: GameObjectId,
    camera: Camera,
    viewer: Transform,
    controller: KeyboardController,
    renderer: Renderer,
}

impl RenderState {
    fn new(window: &Window) -> Result<Self> {
        let renderer = Renderer::new(window)?;
        let device = renderer.device().clone();

        // Per-slot uniform buffers for the global UBO
        let mut ubo_buffers = Vec::with_capacity(MAX_FRAMES_IN_FLIGHT);
        for _ in 0..MAX_FRAMES_IN_FLIGHT {
            ubo_buffers.push(Buffer::new(
                device.clone(),
                BufferUsage::Uniform,
                GlobalUbo::SIZE as vk::DeviceSize,
            )?);
        }

        let global_set_layout = DescriptorSetLayout::new(
            device.clone(),
            &[DescriptorBindingBuilder::uniform_buffer(
                0,
                vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT,
            )],
        )?;

        let pool_size = vk::DescriptorPoolSize::default()
            .ty(vk::DescriptorType::UNIFORM_BUFFER)
            .descriptor_count(MAX_FRAMES_IN_FLIGHT as u32);
        let descriptor_pool = DescriptorPool::new(
            device.clone(),
            MAX_FRAMES_IN_FLIGHT as u32,
            std::slice::from_ref(&pool_size),
        )?;

        let layouts = vec![global_set_layout.handle(); MAX_FRAMES_IN_FLIGHT];
        let global_descriptor_sets = descriptor_pool.allocate(&layouts)?;

        for (set, buffer) in global_descriptor_sets.iter().zip(ubo_buffers.iter()) {
            let info = descriptor::buffer_info(buffer.handle(), 0, GlobalUbo::SIZE as vk::DeviceSize);
            let write = vk::WriteDescriptorSet::default()
                .dst_set(*set)
                .dst_binding(0)
                .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                .buffer_info(std::slice::from_ref(&info));
            descriptor::update_descriptor_sets(&device, std::slice::from_ref(&write));
        }

        let simple_system = SimpleRenderSystem::new(
            device.clone(),
            renderer.swapchain_render_pass(),
            global_set_layout.handle(),
        )?;
        let point_light_system = PointLightSystem::new(
            device.clone(),
            renderer.swapchain_render_pass(),
            global_set_layout.handle(),
        )?;

        let (game_objects, light_id) = build_scene(&device)?;

        let mut viewer = Transform::default();
        viewer.translation.z = -2.5;

        Ok(Self {
            _global_set_layout: global_set_layout,
            _descriptor_pool: descriptor_pool,
            ubo_buffers,
            global_descriptor_sets,
            simple_system,
            point_light_system,
            game_objects,
            light_id,
            camera: Camera::new(),
            viewer,
            controller: KeyboardController::new(),
            renderer,
        })
    }

    fn draw(&mut self, window: &mut Window, input: &InputState, dt: f32) -> Result<()> {
        self.controller.move_in_plane_xz(input, dt, &mut self.viewer);
        self.camera
            .set_view_yxz(self.viewer.translation, self.viewer.rotation);
        self.camera.set_perspective_projection(
            FOV_Y_DEGREES.to_radians(),
            self.renderer.aspect_ratio(),
            NEAR_PLANE,
            FAR_PLANE,
        );

        let command_buffer = match self.renderer.begin_frame(window)? {
            Some(cmd) => cmd,
            // Degenerate extent or swapchain rebuild, skip this tick
            None => return Ok(()),
        };

        let frame_index = self.renderer.frame_index();

        let mut ubo = GlobalUbo::default();
        ubo.projection = self.camera.projection();
        ubo.view = self.camera.view();
        if let Some(light) = self.game_objects.get(self.light_id) {
            ubo.light_position = (light.transform.translation, 1.0).into();
            let intensity = light.point_light.map(|l| l.intensity).unwrap_or(1.0);
            ubo.light_color = (light.color, intensity).into();
        }
        self.ubo_buffers[frame_index].write_data(0, bytemuck::bytes_of(&ubo))?;

        self.renderer.begin_render_pass(command_buffer);

        let ctx = FrameContext {
            frame_index,
            frame_time: dt,
            command_buffer,
            camera: &self.camera,
            global_descriptor_set: self.global_descriptor_sets[frame_index],
            game_objects: &self.game_objects,
        };
        self.simple_system.render(&ctx);
        self.point_light_system.render(&ctx);

        self.renderer.end_render_pass(command_buffer);
        self.renderer.end_frame(window)?;

        Ok(())
    }
}

/// Builds the demo scene: a cube and a single point light.
fn build_scene(
    device: &Arc<glimmer_rhi::device::Device>,
) -> Result<(GameObjectMap, GameObjectId)> {
    let mut game_objects = GameObjectMap::new();

    let cube_model = Arc::new(Model::new(device.clone(), &ModelData::cube(Vec3::ZERO))?);

    let cube_id = game_objects.spawn();
    if let Some(cube) = game_objects.get_mut(cube_id) {
        cube.model = Some(cube_model);
        cube.transform.translation = Vec3::new(0.0, 0.0, 2.5);
        cube.transform.scale = Vec3::splat(0.5);
    }

    let light_id = game_objects.spawn();
    if let Some(light) = game_objects.get_mut(light_id) {
        light.point_light = Some(PointLight::new(1.0));
        light.transform.translation = Vec3::new(-1.0, -1.0, -1.0);
        light.color = Vec3::ONE;
    }

    Ok((game_objects, light_id))
}

struct App {
    window: Option<Window>,
    state: Option<RenderState>,
    input: InputState,
    timer: Timer,
    fatal: Option<anyhow::Error>,
}

impl App {
    fn new() -> Self {
        Self {
            window: None,
            state: None,
            input: InputState::new(),
            timer: Timer::new(),
            fatal: None,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window = match Window::new(event_loop, WINDOW_WIDTH, WINDOW_HEIGHT, "Glimmer") {
            Ok(window) => window,
            Err(e) => {
                error!("Failed to create window: {:?}", e);
                self.fatal = Some(e.into());
                event_loop.exit();
                return;
            }
        };

        match RenderState::new(&window) {
            Ok(state) => {
                info!("Initialization complete, entering main loop");
                self.state = Some(state);
                self.window = Some(window);
            }
            Err(e) => {
                error!("Failed to initialize renderer: {:?}", e);
                self.fatal = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(ref mut window) = self.window {
                    window.on_resized(size.width, size.height);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    if event.state.is_pressed() {
                        self.input.on_key_pressed(key);
                    } else {
                        self.input.on_key_released(key);
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                if self.input.is_key_just_pressed(KeyCode::Escape) {
                    event_loop.exit();
                    return;
                }

                let dt = self.timer.delta_secs();
                if let (Some(state), Some(window)) = (self.state.as_mut(), self.window.as_mut()) {
                    if let Err(e) = state.draw(window, &self.input, dt) {
                        error!("Render error: {:?}", e);
                        self.fatal = Some(e);
                        event_loop.exit();
                    }
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        self.input.begin_frame();
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    glimmer_core::init_logging();
    info!("Starting Glimmer");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new();
    event_loop.run_app(&mut app)?;

    match app.fatal {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
