//! End-to-end frame scenarios against the recording driver.
//!
//! Each test drives a full `Renderer` through public operations only and
//! checks the driver call log.

use std::cell::RefCell;
use std::rc::Rc;

use marduk_render::context::ContextLostEvent;
use marduk_render::device::{DriverCall, RecordingDriver};
use marduk_render::object_renderer::{ObjectRenderer, ObjectRendererId};
use marduk_render::texture::{
    BaseTexture, GcMode, GcSettings, RenderTexture, TextureLike, TextureSource,
};
use marduk_render::{DisplayObject, FrameOptions, Renderer, RendererEvent, RendererOptions};

fn renderer(units: usize) -> Renderer<RecordingDriver> {
    Renderer::new(RecordingDriver::new(units), RendererOptions::default()).unwrap()
}

fn texture(seed: u8) -> Rc<BaseTexture> {
    BaseTexture::new(TextureSource::from_pixels(1, 1, &[[seed, seed, seed, 255]]))
}

#[derive(Default)]
struct Calls {
    starts: u32,
    stops: u32,
    flushes: u32,
}

/// Batch renderer that only counts its lifecycle hooks.
struct CountingBatch(Rc<RefCell<Calls>>);

impl ObjectRenderer<RecordingDriver> for CountingBatch {
    fn start(&mut self, _: &mut Renderer<RecordingDriver>) {
        self.0.borrow_mut().starts += 1;
    }

    fn stop(&mut self, renderer: &mut Renderer<RecordingDriver>) {
        self.0.borrow_mut().stops += 1;
        self.flush(renderer);
    }

    fn flush(&mut self, _: &mut Renderer<RecordingDriver>) {
        self.0.borrow_mut().flushes += 1;
    }
}

/// Scene that draws its textures through a batch renderer.
struct Sprites {
    batch: ObjectRendererId,
    textures: Vec<Rc<BaseTexture>>,
}

impl DisplayObject<RecordingDriver> for Sprites {
    fn render(&mut self, renderer: &mut Renderer<RecordingDriver>) {
        renderer.set_object_renderer(self.batch);
        for texture in &self.textures {
            renderer.bind_texture(texture, None, false);
        }
    }
}

#[test]
fn four_units_bind_a_b_c_a() {
    let mut r = renderer(4);
    let (a, b, c) = (texture(1), texture(2), texture(3));

    let slot_a = r.bind_texture(&a, None, false);
    let slot_b = r.bind_texture(&b, None, false);
    let slot_c = r.bind_texture(&c, None, false);

    let mut slots = vec![slot_a, slot_b, slot_c];
    slots.sort_unstable();
    slots.dedup();
    assert_eq!(slots.len(), 3, "A, B and C must occupy distinct units");

    let binds = r.driver().texture_binds();
    assert_eq!(r.bind_texture(&a, None, false), slot_a);
    assert_eq!(r.driver().texture_binds(), binds, "second bind of A must not reach the driver");
}

#[test]
fn repeated_binds_reach_the_driver_once() {
    let mut r = renderer(4);
    let a = texture(1);
    r.driver_mut().clear_calls();

    for _ in 0..10 {
        r.bind_texture(&a, None, false);
    }
    assert_eq!(r.driver().texture_binds(), 1);
}

#[test]
fn non_forced_binds_never_duplicate_a_texture() {
    let mut r = renderer(3);
    let pool: Vec<_> = (0..5).map(texture).collect();

    for step in 0..40usize {
        let tex = &pool[(step * 7 + step / 3) % pool.len()];
        let suggestion = (step % 4 == 0).then_some(step % 3);
        r.bind_texture(tex, suggestion, false);

        let slots = r.texture_slots();
        for t in &pool {
            let holding = (0..slots.len()).filter(|&u| slots.holds(u, t)).count();
            assert!(holding <= 1, "step {step}: texture resident in {holding} units");
        }
    }
}

#[test]
fn second_gc_pass_releases_nothing() {
    let mut r = Renderer::new(
        RecordingDriver::new(4),
        RendererOptions {
            gc: GcSettings {
                mode: GcMode::Manual,
                max_idle: 1,
                check_period: 600,
            },
            ..RendererOptions::default()
        },
    )
    .unwrap();
    let batch = r.register_object_renderer("sprite", Box::new(CountingBatch(Default::default())));

    let mut scene = Sprites {
        batch,
        textures: (0..3).map(texture).collect(),
    };
    r.render(&mut scene, FrameOptions::default());
    scene.textures.truncate(1);
    for _ in 0..3 {
        r.render(&mut scene, FrameOptions::default());
    }

    assert_eq!(r.run_gc(), 2);
    let deletes = r.driver().count_calls(|c| matches!(c, DriverCall::DeleteTexture(_)));
    assert_eq!(r.run_gc(), 0);
    assert_eq!(
        r.driver().count_calls(|c| matches!(c, DriverCall::DeleteTexture(_))),
        deletes
    );
}

#[test]
fn switching_to_the_current_renderer_is_a_no_op() {
    let mut r = renderer(2);
    let calls = Rc::new(RefCell::new(Calls::default()));
    let id = r.register_object_renderer("sprite", Box::new(CountingBatch(calls.clone())));

    r.set_object_renderer(id);
    r.set_object_renderer(id);

    let c = calls.borrow();
    assert_eq!(c.starts + c.stops, 1);
}

#[test]
fn restore_rebuilds_placeholders_for_the_new_generation() {
    let mut r = renderer(4);
    let calls = Rc::new(RefCell::new(Calls::default()));
    let batch = r.register_object_renderer("sprite", Box::new(CountingBatch(calls)));
    let target = RenderTexture::new(16, 16);

    let mut scene = Sprites {
        batch,
        textures: (0..3).map(texture).collect(),
    };
    r.render(&mut scene, FrameOptions::default());
    r.render(&mut scene, FrameOptions::to_texture(&target));

    let old = r.context_id();
    let old_placeholders: Vec<_> = (0..4)
        .map(|u| r.texture_slots().placeholder(u).clone())
        .collect();

    r.driver_mut().simulate_context_loss();
    r.handle_context_lost(&mut ContextLostEvent::new());
    r.render(&mut scene, FrameOptions::default());
    r.handle_context_restored();

    let new = r.context_id();
    assert_ne!(old, new);
    let slots = r.texture_slots();
    for unit in 0..slots.len() {
        assert!(slots.is_vacant(unit));
        assert!(slots.get(unit).has_gl_texture(new));
        assert!(!slots.get(unit).has_gl_texture(old));
        assert!(!Rc::ptr_eq(slots.get(unit), &old_placeholders[unit]));
    }
    assert!(scene.textures.iter().all(|t| !t.has_gl_texture(old)));
    assert!(!target.base_texture().has_gl_texture(old));

    r.render(&mut scene, FrameOptions::default());
    r.render(&mut scene, FrameOptions::to_texture(&target));
    assert_eq!(r.driver().invalid_handle_uses(), 0);
    assert!(scene.textures.iter().all(|t| t.has_gl_texture(new)));
}

#[test]
fn restoring_one_renderer_keeps_shared_textures_alive_in_another() {
    let mut r1 = renderer(2);
    let mut r2 = renderer(2);
    let tex = texture(3);
    r1.bind_texture(&tex, None, false);
    r2.bind_texture(&tex, None, false);

    r1.driver_mut().simulate_context_loss();
    r1.handle_context_lost(&mut ContextLostEvent::new());
    r1.handle_context_restored();
    assert!(tex.has_gl_texture(r2.context_id()));

    r2.unbind_texture(&tex);
    r2.driver_mut().clear_calls();
    r2.bind_texture(&tex, None, false);
    let created = r2
        .driver()
        .count_calls(|c| matches!(c, DriverCall::CreateTexture(_)));
    assert_eq!(created, 0);
    assert_eq!(r2.managed_texture_count(), 1);
    assert_eq!(r2.driver().invalid_handle_uses(), 0);
}

#[test]
fn rendering_on_a_lost_context_does_nothing() {
    let mut r = renderer(2);
    let events = Rc::new(RefCell::new(Vec::new()));
    let log = events.clone();
    r.on(move |e| log.borrow_mut().push(*e));

    r.driver_mut().simulate_context_loss();
    r.driver_mut().clear_calls();

    let mut scene = Sprites {
        batch: ObjectRendererId::EMPTY,
        textures: vec![texture(9)],
    };
    r.render(&mut scene, FrameOptions::default());

    assert!(r.driver().calls().is_empty());
    assert!(events.borrow().is_empty());
    assert!(r.is_context_lost());
}

#[test]
fn changing_targets_flushes_the_batch_once() {
    let mut r = renderer(4);
    let calls = Rc::new(RefCell::new(Calls::default()));
    let batch = r.register_object_renderer("sprite", Box::new(CountingBatch(calls.clone())));
    let (t1, t2) = (RenderTexture::new(8, 8), RenderTexture::new(8, 8));

    r.bind_render_texture(Some(&t1), None);
    r.set_object_renderer(batch);
    r.bind_texture(&texture(1), None, false);
    let before = calls.borrow().flushes;
    r.bind_render_texture(Some(&t2), None);

    assert_eq!(calls.borrow().flushes - before, 1);
    assert_eq!(calls.borrow().stops, 0);
    assert_eq!(r.current_object_renderer(), batch);
}

#[test]
fn frame_events_bracket_the_draw() {
    let mut r = renderer(2);
    let events = Rc::new(RefCell::new(Vec::new()));
    let log = events.clone();
    r.on(move |e| log.borrow_mut().push(*e));

    let mut scene = Sprites {
        batch: ObjectRendererId::EMPTY,
        textures: Vec::new(),
    };
    r.render(&mut scene, FrameOptions::default());
    assert_eq!(*events.borrow(), vec![RendererEvent::PreRender, RendererEvent::PostRender]);
}

#[test]
fn destroy_deletes_every_texture_it_created() {
    let mut r = renderer(2);
    let target = RenderTexture::new(4, 4);
    let mut scene = Sprites {
        batch: ObjectRendererId::EMPTY,
        textures: vec![texture(1), texture(2)],
    };
    r.render(&mut scene, FrameOptions::to_texture(&target));

    let driver = r.destroy(false);
    let created = driver.count_calls(|c| matches!(c, DriverCall::CreateTexture(_)));
    let deleted = driver.count_calls(|c| matches!(c, DriverCall::DeleteTexture(_)));
    assert_eq!(created, deleted);
    assert_eq!(driver.invalid_handle_uses(), 0);
}
