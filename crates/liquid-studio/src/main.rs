//! Liquid studio: a scrolling demo page with three glass lenses on top.
//!
//! Keys: PageUp/PageDown/Home/End scroll, T toggles tilt on the first lens,
//! S toggles shadows, R forces a fresh snapshot, Esc quits.

mod backdrop;
mod host;
mod page;

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use anyhow::Result;

use liquid_engine::coords::{ColorRgba, Vec2, Viewport};
use liquid_engine::core::{App, AppControl, FrameCtx};
use liquid_engine::device::GpuInit;
use liquid_engine::dynamic::NodeEvent;
use liquid_engine::input::{InputEvent, Key};
use liquid_engine::lens::ShadowCompanion;
use liquid_engine::logging::{init_logging, LoggingConfig};
use liquid_engine::render::GlassPresenter;
use liquid_engine::window::{Runtime, RuntimeConfig};
use liquid_engine::{LensEvent, LensHandle, LensOptions, Renderer, RendererConfig};
use winit::window::WindowId;

use crate::backdrop::Backdrop;
use crate::host::{PageHost, PageRasterizer, SharedPage};
use crate::page::Page;

const PAGE_STEP: f32 = 0.85;
const BACKGROUND: ColorRgba = ColorRgba { r: 0.0, g: 0.0, b: 0.0, a: 1.0 };

struct Lenses {
    tilt: LensHandle,
    frost: LensHandle,
    magnifier: LensHandle,
}

/// Everything created once a GPU context exists.
struct Engine {
    renderer: Renderer<PageHost, PageRasterizer>,
    presenter: GlassPresenter,
    backdrop: Option<Backdrop>,
    lenses: Lenses,
}

struct Studio {
    page: SharedPage,
    engine: Option<Engine>,
    fatal: Rc<RefCell<Option<anyhow::Error>>>,
    tilt: bool,
    shadows: bool,
}

impl Studio {
    fn new(fatal: Rc<RefCell<Option<anyhow::Error>>>) -> Self {
        let page = Page::new(Viewport::new(1280.0, 720.0), 1.0, Instant::now());
        Self {
            page: Rc::new(RefCell::new(page)),
            engine: None,
            fatal,
            tilt: true,
            shadows: true,
        }
    }

    fn start(&self, ctx: &FrameCtx<'_, '_>, now: Instant) -> Result<Engine> {
        self.page.borrow_mut().set_viewport(ctx.viewport(), ctx.window.scale_factor());

        let info = ctx.gpu.adapter_info();
        log::info!("adapter: {} ({:?})", info.name, info.backend);

        let config = RendererConfig::default().with_max_texture_dimension(ctx.gpu.max_texture_dimension());
        let mut renderer = Renderer::new(
            PageHost::new(self.page.clone()),
            PageRasterizer::new(self.page.clone()),
            config,
            now,
        );

        let (ids, pulse) = {
            let page = self.page.borrow();
            (page.lens_ids(), page.pulse())
        };
        let lenses = Lenses {
            tilt: renderer.add_lens(ids.tilt, LensOptions::default().with_tilt(true, 10.0), now),
            frost: renderer.add_lens(ids.frost, LensOptions::default().with_frost(6.0), now),
            magnifier: renderer.add_lens(ids.magnifier, LensOptions::default().with_magnify(1.6), now),
        };
        for h in [lenses.tilt, lenses.frost, lenses.magnifier] {
            renderer.set_shadow(h, self.shadows);
        }

        renderer.register_dynamic(".pulse");
        renderer.notify_node_event(pulse, &NodeEvent::AnimationStart);

        let presenter = GlassPresenter::new(ctx.gpu.device())?;
        Ok(Engine { renderer, presenter, backdrop: None, lenses })
    }

    fn handle_input(&mut self, ctx: &mut FrameCtx<'_, '_>, now: Instant) -> AppControl {
        let Some(engine) = self.engine.as_mut() else { return AppControl::Continue; };
        let frame = ctx.input_frame;
        let mut page = self.page.borrow_mut();

        if frame.pressed(Key::Escape) {
            ctx.runtime.exit();
            return AppControl::Exit;
        }

        let (_, wheel_y) = frame.wheel;
        if wheel_y != 0.0 {
            page.scroll_by(-wheel_y);
        }
        let step = page.viewport().height * PAGE_STEP;
        if frame.pressed(Key::PageDown) || frame.pressed(Key::Space) {
            page.scroll_by(step);
        }
        if frame.pressed(Key::PageUp) {
            page.scroll_by(-step);
        }
        if frame.pressed(Key::ArrowDown) {
            page.scroll_by(step / 8.0);
        }
        if frame.pressed(Key::ArrowUp) {
            page.scroll_by(-step / 8.0);
        }
        if frame.pressed(Key::Home) {
            page.scroll_to(0.0);
        }
        if frame.pressed(Key::End) {
            page.scroll_to(f32::MAX);
        }

        if frame.pressed(Key::T) {
            self.tilt = !self.tilt;
            engine.renderer.set_tilt(engine.lenses.tilt, self.tilt);
            log::info!("tilt {}", if self.tilt { "on" } else { "off" });
        }
        if frame.pressed(Key::S) {
            self.shadows = !self.shadows;
            for h in [engine.lenses.tilt, engine.lenses.frost, engine.lenses.magnifier] {
                engine.renderer.set_shadow(h, self.shadows);
            }
        }
        if frame.pressed(Key::R) {
            engine.renderer.notify_resize(now);
        }

        let pointer = frame.events.iter().rev().find_map(|ev| match ev {
            InputEvent::PointerMoved(p) => Some(Vec2::new(p.x, p.y)),
            _ => None,
        });
        // The page borrow must end before the renderer queries the host.
        if let Some(p) = pointer {
            page.set_pointer(Some(p));
            drop(page);
            engine.renderer.pointer_moved(p, now);
        } else if frame.pointer_left {
            page.set_pointer(None);
            drop(page);
            engine.renderer.pointer_left(now);
        }

        AppControl::Continue
    }
}

impl App for Studio {
    fn on_resize(&mut self, _window_id: WindowId, viewport: Viewport) {
        let Some(engine) = self.engine.as_mut() else { return; };
        let dpr = self.page.borrow().dpr();
        self.page.borrow_mut().set_viewport(viewport, dpr);
        engine.renderer.notify_resize(Instant::now());
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let now = ctx.time.now;

        if self.engine.is_none() {
            match self.start(ctx, now) {
                Ok(engine) => self.engine = Some(engine),
                Err(err) => {
                    *self.fatal.borrow_mut() = Some(err.context("failed to start the glass renderer"));
                    ctx.runtime.exit();
                    return AppControl::Exit;
                }
            }
        }

        {
            let mut page = self.page.borrow_mut();
            let dpr = ctx.window.scale_factor();
            if page.dpr() != dpr {
                let vp = page.viewport();
                page.set_viewport(vp, dpr);
            }
            page.advance(now);
        }

        if self.handle_input(ctx, now) == AppControl::Exit {
            return AppControl::Exit;
        }

        let Some(engine) = self.engine.as_mut() else { return AppControl::Exit; };
        let plan = engine.renderer.frame(now);
        finish_mirror_transitions(&mut engine.renderer);

        for event in engine.renderer.drain_events() {
            match event {
                LensEvent::Initialized(h) => log::info!("lens {h:?} revealed"),
                LensEvent::MirrorRemoved(h) => log::debug!("mirror of {h:?} removed"),
            }
        }

        let writes = engine.renderer.texture_mut().drain_writes();
        let shadows: Vec<ShadowCompanion> =
            engine.renderer.lenses().filter_map(|(_, lens)| lens.shadow().copied()).collect();
        let page = self.page.borrow();
        let live = [page.pulse(), page.video()];
        let scroll = page.scroll();

        ctx.render(BACKGROUND, |rctx, target| {
            let Engine { presenter, backdrop, .. } = engine;
            presenter.begin_frame();
            presenter.upload(rctx, writes);

            if let Some(b) = backdrop.as_mut() {
                b.sync(rctx, presenter.blit(), &page, &live);
            } else {
                *backdrop = Some(Backdrop::new(rctx, presenter.blit(), &page));
            }
            if let Some(b) = backdrop.as_ref() {
                b.draw(rctx, target, presenter.blit_mut(), scroll, &shadows);
            }

            if let Some(plan) = plan.as_ref() {
                presenter.render(rctx, target, plan);
            }
        })
    }
}

/// The studio has no CSS transitions, so a tilt reset counts as finished once
/// the lens is flat again.
fn finish_mirror_transitions(renderer: &mut Renderer<PageHost, PageRasterizer>) {
    let done: Vec<LensHandle> = renderer
        .lenses()
        .filter(|(_, lens)| lens.tilt().teardown_pending() && lens.tilt().angles() == (0.0, 0.0))
        .map(|(h, _)| h)
        .collect();
    for h in done {
        renderer.mirror_transition_ended(h);
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let fatal = Rc::new(RefCell::new(None));
    let studio = Studio::new(fatal.clone());
    Runtime::run(
        RuntimeConfig {
            title: "liquid studio".to_string(),
            ..RuntimeConfig::default()
        },
        GpuInit::default(),
        studio,
    )?;

    match fatal.borrow_mut().take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
