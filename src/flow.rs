//! The viewer application and its event loop.
//!
//! Lifecycle: construct the [`Context`], attach the stage (ground plane
//! only), kick off the one asset load, and run the render loop forever. On
//! load success the decoded subgraph joins the stage and the lighting cues
//! and clip playback are armed as one-shot timers. On load failure the loop
//! keeps drawing the empty stage.
//!
//! Everything user-visible happens on the event loop thread: the decode runs
//! off-thread and posts its result back as a user event, and timers are
//! drained at the top of each frame, so no two callbacks ever interleave.

use std::sync::Arc;

use instant::{Duration, Instant};

use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    window::Window,
};

use crate::{
    animation::{AnimationAction, AnimationMixer, LoopMode},
    context::{Context, MouseButtonState},
    data_structures::{
        instance::Instance,
        model::{Material, Mesh, Model},
        scene_graph::{ModelNode, SceneNode},
        texture::Texture,
    },
    lighting::{BASE_TIMEOUT, stage_cues},
    render::render_frame,
    resources::{AnimationClip, DecodedModel, Loader, codec::GltfCodec},
    timer::{FrameClock, TimerQueue},
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// How long after load completion the clips start playing.
fn animation_delay() -> Duration {
    BASE_TIMEOUT + Duration::from_millis(2500)
}

/// What to show and how to label the window.
pub struct ViewerConfig {
    pub asset: String,
    pub title: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            asset: "monkey.glb".to_string(),
            title: "limelight".to_string(),
        }
    }
}

/// A delayed one-shot mutation of the running viewer.
type CueAction = Box<dyn FnOnce(&mut Context, &mut Stage) + Send>;

/// Scene content owned by the running viewer: the ground plane, at most one
/// loaded model, and the model's animation state.
pub struct Stage {
    pub plane: Box<dyn SceneNode>,
    pub model: Option<Box<dyn SceneNode>>,
    pub clips: Vec<Arc<AnimationClip>>,
    pub mixer: AnimationMixer,
}

impl Stage {
    fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let layout = Material::layout(device);
        let material = Material::new(
            device,
            "plane",
            Texture::solid_color([0.6, 0.6, 0.6, 1.0], device, queue, "plane"),
            &layout,
        );
        let model = Model {
            meshes: vec![Mesh::plane(device, 10.0, 0)],
            materials: vec![material],
        };
        let plane = ModelNode::new(None, Instance::default(), model, true, device);

        Self {
            plane: Box::new(plane),
            model: None,
            clips: Vec::new(),
            mixer: AnimationMixer::new(),
        }
    }

    /// Advance the model's animation by `dt` seconds and push the resulting
    /// transforms to the GPU.
    fn advance(&mut self, dt: f32, queue: &wgpu::Queue) {
        let Some(model) = &mut self.model else {
            return;
        };
        self.mixer.update(dt, model.as_mut());
        model.update_world_transforms(&Instance::default());
        model.write_to_buffers(queue);
    }
}

/// Application state bundle: GPU context, stage content, timers and clock.
pub struct AppState {
    ctx: Context,
    stage: Stage,
    timers: TimerQueue<CueAction>,
    clock: FrameClock,
    is_surface_configured: bool,
}

impl AppState {
    async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let ctx = Context::new(window).await?;
        let stage = Stage::new(&ctx.device, &ctx.queue);
        Ok(Self {
            ctx,
            stage,
            timers: TimerQueue::new(),
            clock: FrameClock::new(),
            is_surface_configured: false,
        })
    }

    fn resize(&mut self, size: winit::dpi::PhysicalSize<u32>, scale_factor: f64) {
        if size.width > 0 && size.height > 0 {
            self.is_surface_configured = true;
            self.ctx.resize(size, scale_factor);
        }
    }

    /// Merge a freshly decoded model into the stage and arm the delayed
    /// lighting and animation cues. Called exactly once per process, and
    /// only on load success.
    fn attach_model(&mut self, decoded: DecodedModel) {
        let DecodedModel { mut root, clips } = decoded;

        root.set_cast_shadows(true);
        root.update_world_transforms(&Instance::default());
        root.write_to_buffers(&self.ctx.queue);

        self.stage.model = Some(root);
        self.stage.clips = clips;
        self.stage.mixer = AnimationMixer::new();

        for cue in stage_cues() {
            self.timers.schedule(
                cue.delay,
                Box::new(move |ctx: &mut Context, _: &mut Stage| {
                    ctx.lighting.add_light(cue.light, &ctx.queue);
                }),
            );
        }

        self.timers.schedule(
            animation_delay(),
            Box::new(|_: &mut Context, stage: &mut Stage| {
                for clip in stage.clips.clone() {
                    let mut action = AnimationAction::new(clip);
                    action.loop_mode = LoopMode::Once;
                    stage.mixer.play(action);
                }
            }),
        );
    }

    /// One render-loop invocation.
    fn frame(&mut self) {
        // Keep the loop running no matter what happens below.
        self.ctx.window.request_redraw();

        if !self.is_surface_configured {
            return;
        }

        let now = Instant::now();

        // Due timers first; they never interleave with the frame body.
        for action in self.timers.poll(now) {
            action(&mut self.ctx, &mut self.stage);
        }

        // The first invocation only establishes the timing baseline.
        let Some(dt) = self.clock.tick(now) else {
            return;
        };
        let dt = dt.as_secs_f32();

        self.stage.advance(dt, &self.ctx.queue);

        let Context {
            camera,
            projection,
            queue,
            ..
        } = &mut self.ctx;
        camera
            .controller
            .update(&mut camera.camera, projection, dt);
        camera.uniform.update_view_proj(&camera.camera, projection);
        queue.write_buffer(
            &camera.buffer,
            0,
            bytemuck::cast_slice(&[camera.uniform]),
        );

        match render_frame(&self.ctx, &self.stage) {
            Ok(()) => {}
            // Reconfigure the surface if it's lost or outdated
            Err(wgpu::CurrentSurfaceTexture::Lost | wgpu::CurrentSurfaceTexture::Outdated) => {
                let size = self.ctx.window.inner_size();
                let scale_factor = self.ctx.window.scale_factor();
                self.resize(size, scale_factor);
            }
            Err(e) => {
                log::error!("Unable to render {:?}", e);
            }
        }
    }
}

pub(crate) enum ViewerEvent {
    #[allow(dead_code)]
    Initialized(AppState),
    Loaded(anyhow::Result<DecodedModel>),
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    proxy: EventLoopProxy<ViewerEvent>,
    state: Option<AppState>,
    config: ViewerConfig,
    load_started: bool,
}

impl App {
    fn new(event_loop: &EventLoop<ViewerEvent>, config: ViewerConfig) -> Self {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new().unwrap();
        Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            state: None,
            config,
            load_started: false,
        }
    }

    /// Kick off the single asset load. The decode runs off the loop thread
    /// and posts its terminal result back as a [`ViewerEvent::Loaded`].
    fn start_load(&mut self) {
        let Some(state) = &self.state else {
            return;
        };
        if self.load_started {
            return;
        }
        self.load_started = true;

        let asset = self.config.asset.clone();
        // Device and queue are internally refcounted; the clones share them
        // with the load task.
        let device = state.ctx.device.clone();
        let queue = state.ctx.queue.clone();
        let proxy = self.proxy.clone();

        let load = async move {
            let mut loader = Loader::new();
            loader.set_codec(GltfCodec);
            loader
                .load(&asset, &device, &queue, |loaded, total| {
                    if total > 0 {
                        log::info!("{}% loaded", loaded * 100 / total);
                    } else {
                        log::info!("{} bytes loaded", loaded);
                    }
                })
                .await
        };

        #[cfg(not(target_arch = "wasm32"))]
        self.async_runtime.spawn(async move {
            let result = load.await;
            if proxy.send_event(ViewerEvent::Loaded(result)).is_err() {
                log::error!("event loop closed before the model finished loading");
            }
        });

        #[cfg(target_arch = "wasm32")]
        wasm_bindgen_futures::spawn_local(async move {
            let result = load.await;
            assert!(proxy.send_event(ViewerEvent::Loaded(result)).is_ok());
        });
    }
}

impl ApplicationHandler<ViewerEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        #[allow(unused_mut)]
        let mut window_attributes =
            Window::default_attributes().with_title(self.config.title.clone());

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let window = wgpu::web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document.get_element_by_id(CANVAS_ID).unwrap_throw();
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        let window = Arc::new(event_loop.create_window(window_attributes).unwrap());

        #[cfg(not(target_arch = "wasm32"))]
        {
            let state = match self.async_runtime.block_on(AppState::new(window)) {
                Ok(state) => state,
                Err(e) => panic!("App initialization failed. Cannot create the main context: {e}"),
            };
            self.state = Some(state);
            self.start_load();
            if let Some(state) = &self.state {
                state.ctx.window.request_redraw();
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let state = AppState::new(window)
                    .await
                    .expect("App initialization failed. Cannot create the main context");
                assert!(proxy.send_event(ViewerEvent::Initialized(state)).is_ok());
            });
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: ViewerEvent) {
        match event {
            ViewerEvent::Initialized(state) => {
                // The message from our wasm `spawn_local`
                self.state = Some(state);
                let state = self.state.as_mut().unwrap();
                let size = state.ctx.window.inner_size();
                let scale_factor = state.ctx.window.scale_factor();
                state.resize(size, scale_factor);
                self.start_load();
                if let Some(state) = &self.state {
                    state.ctx.window.request_redraw();
                }
            }
            ViewerEvent::Loaded(Ok(decoded)) => {
                if let Some(state) = &mut self.state {
                    state.attach_model(decoded);
                }
            }
            ViewerEvent::Loaded(Err(e)) => {
                // Terminal: the stage stays as it is, plane and all.
                log::error!("An error happened while loading the model: {e:#}");
            }
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        let Some(state) = &mut self.state else {
            return;
        };
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            match state.ctx.mouse.pressed {
                MouseButtonState::Left => state.ctx.camera.controller.handle_mouse(dx, dy),
                MouseButtonState::Right => state.ctx.camera.controller.handle_pan(dx, dy),
                MouseButtonState::None => {}
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = &mut self.state else {
            return;
        };

        state.ctx.camera.controller.handle_window_events(&event);

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                let scale_factor = state.ctx.window.scale_factor();
                state.resize(size, scale_factor);
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                let size = state.ctx.window.inner_size();
                state.resize(size, scale_factor);
            }
            WindowEvent::MouseInput {
                state: button_state,
                button,
                ..
            } => match (button, button_state.is_pressed()) {
                (MouseButton::Left, true) => state.ctx.mouse.pressed = MouseButtonState::Left,
                (MouseButton::Right, true) => state.ctx.mouse.pressed = MouseButtonState::Right,
                (_, false) => state.ctx.mouse.pressed = MouseButtonState::None,
                _ => (),
            },
            WindowEvent::RedrawRequested => state.frame(),
            _ => {}
        }
    }
}

pub fn run(config: ViewerConfig) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info).unwrap_throw();
    }

    let event_loop: EventLoop<ViewerEvent> = EventLoop::with_user_event().build()?;

    let mut app = App::new(&event_loop, config);

    event_loop.run_app(&mut app)?;

    Ok(())
}
