//! End-to-end rendering tests
//!
//! These drive the full stack: context -> pipeline cache -> command buffer
//! -> wgpu submission -> readback. They return early when no GPU adapter is
//! available (headless CI).

use lumo_core::{Color, Path, Point, Rect, Size};
use lumo_draw::{BlendMode, ClipOptions, FillStyle, GraphicsContext, PipelineStates, Shading};
use lumo_gpu::wgpu::{WgpuBuffer, WgpuGraphicsDevice};
use lumo_gpu::{
    BufferImageOrigin, CommandBuffer, CommandEncoder, CommandQueue, CommandQueueFlags,
    CopyCommandEncoder, CpuCacheMode, GpuBuffer, GraphicsDevice, StorageMode, TextureOrigin,
    TextureSize,
};
use std::sync::Arc;

const SIZE: u32 = 64; // 64 * 4 bytes per pixel = one aligned copy row

struct Harness {
    device: Arc<WgpuGraphicsDevice>,
    queue: Arc<dyn CommandQueue>,
    pipeline: Arc<PipelineStates>,
}

impl Harness {
    fn new() -> Option<Self> {
        let device = WgpuGraphicsDevice::new_blocking().ok()?;
        let queue = device.make_command_queue(CommandQueueFlags::RENDER | CommandQueueFlags::COPY)?;
        let pipeline = PipelineStates::new(&queue)?;
        Some(Self {
            device,
            queue,
            pipeline,
        })
    }

    fn make_context(&self, command_buffer: &Arc<dyn CommandBuffer>) -> GraphicsContext {
        GraphicsContext::new(
            self.pipeline.clone(),
            command_buffer.clone(),
            Rect::new(0.0, 0.0, SIZE as f32, SIZE as f32),
            Point::ZERO,
            1.0,
            Size::new(SIZE as f32, SIZE as f32),
        )
        .expect("context creation")
    }

    /// Commits, waits and reads the context's backdrop back as RGBA bytes.
    fn read_backdrop(&self, context: &GraphicsContext) -> Vec<u8> {
        let command_buffer = context.command_buffer().clone();
        assert!(command_buffer.commit(), "commit must succeed");
        self.device.wait_for_completion();

        let backdrop = context.render_targets().backdrop().clone();
        let bytes_per_row = SIZE * 4; // 256-byte aligned for SIZE = 64
        let readback = self
            .device
            .make_buffer(
                (bytes_per_row * SIZE) as u64,
                StorageMode::Shared,
                CpuCacheMode::Default,
            )
            .expect("readback buffer");

        let copy_buffer = self.queue.make_command_buffer().expect("copy buffer");
        let mut encoder = copy_buffer.make_copy_command_encoder().expect("copy encoder");
        encoder.copy_texture_to_buffer(
            &backdrop,
            TextureOrigin::default(),
            &readback,
            BufferImageOrigin {
                offset: 0,
                image_width: SIZE,
                image_height: SIZE,
            },
            TextureSize::new(SIZE, SIZE, 1),
        );
        encoder.end_encoding();
        assert!(copy_buffer.commit());
        self.device.wait_for_completion();

        readback
            .as_any()
            .downcast_ref::<WgpuBuffer>()
            .expect("wgpu buffer")
            .read_sync()
            .expect("mapped readback")
    }
}

fn pixel(data: &[u8], x: u32, y: u32) -> [u8; 4] {
    let offset = (y * SIZE * 4 + x * 4) as usize;
    data[offset..offset + 4].try_into().unwrap()
}

fn assert_pixel(data: &[u8], x: u32, y: u32, expected: [u8; 4], what: &str) {
    let actual = pixel(data, x, y);
    for (a, e) in actual.iter().zip(expected.iter()) {
        assert!(
            (*a as i32 - *e as i32).abs() <= 2,
            "{what}: pixel ({x},{y}) = {actual:?}, expected {expected:?}"
        );
    }
}

#[test]
fn solid_red_square_over_transparent() {
    let Some(harness) = Harness::new() else { return };
    let command_buffer = harness.queue.make_command_buffer().unwrap();
    let mut context = harness.make_context(&command_buffer);

    let path = Path::rect(Rect::new(16.0, 16.0, 32.0, 32.0));
    context.fill(&path, &Shading::Color(Color::RED), FillStyle::default());

    let data = harness.read_backdrop(&context);
    assert_pixel(&data, 32, 32, [255, 0, 0, 255], "inside the square");
    assert_pixel(&data, 8, 8, [0, 0, 0, 0], "outside the square");
    assert_pixel(&data, 56, 32, [0, 0, 0, 0], "right of the square");
}

#[test]
fn multiply_white_preserves_backdrop() {
    let Some(harness) = Harness::new() else { return };
    let command_buffer = harness.queue.make_command_buffer().unwrap();
    let mut context = harness.make_context(&command_buffer);

    context.clear(Color::BLUE);
    context.blend_mode = BlendMode::Multiply;
    let path = Path::rect(Rect::new(0.0, 0.0, SIZE as f32, SIZE as f32));
    context.fill(&path, &Shading::Color(Color::WHITE), FillStyle::default());

    let data = harness.read_backdrop(&context);
    assert_pixel(&data, 32, 32, [0, 0, 255, 255], "multiply by white");
    assert_pixel(&data, 4, 60, [0, 0, 255, 255], "multiply by white, corner");
}

#[test]
fn opposite_windings_cancel() {
    let Some(harness) = Harness::new() else { return };
    let command_buffer = harness.queue.make_command_buffer().unwrap();
    let mut context = harness.make_context(&command_buffer);

    // Outer rect clockwise, inner rect counter-clockwise: the non-zero
    // rule leaves a hole where the windings cancel.
    let mut path = Path::rect(Rect::new(8.0, 8.0, 48.0, 48.0));
    path.move_to(Point::new(24.0, 24.0))
        .line_to(Point::new(24.0, 40.0))
        .line_to(Point::new(40.0, 40.0))
        .line_to(Point::new(40.0, 24.0))
        .close();

    context.fill(&path, &Shading::Color(Color::RED), FillStyle::default());

    let data = harness.read_backdrop(&context);
    assert_pixel(&data, 12, 32, [255, 0, 0, 255], "ring");
    assert_pixel(&data, 32, 12, [255, 0, 0, 255], "ring top");
    assert_pixel(&data, 32, 32, [0, 0, 0, 0], "hole");
}

#[test]
fn nested_clips_intersect_in_either_order() {
    let Some(harness) = Harness::new() else { return };

    let mut outputs: Vec<Vec<u8>> = Vec::new();
    for order in 0..2 {
        let command_buffer = harness.queue.make_command_buffer().unwrap();
        let mut context = harness.make_context(&command_buffer);

        let left = Path::rect(Rect::new(0.0, 0.0, 32.0, SIZE as f32));
        let top = Path::rect(Rect::new(0.0, 0.0, SIZE as f32, 32.0));
        let (first, second) = if order == 0 { (&left, &top) } else { (&top, &left) };
        context.clip(first, FillStyle::default(), ClipOptions::empty());
        context.clip(second, FillStyle::default(), ClipOptions::empty());

        let full = Path::rect(Rect::new(0.0, 0.0, SIZE as f32, SIZE as f32));
        context.fill(&full, &Shading::Color(Color::RED), FillStyle::default());

        let data = harness.read_backdrop(&context);
        assert_pixel(&data, 8, 8, [255, 0, 0, 255], "intersection quadrant");
        assert_pixel(&data, 48, 8, [0, 0, 0, 0], "right of the clip");
        assert_pixel(&data, 8, 48, [0, 0, 0, 0], "below the clip");
        outputs.push(data);
    }
    assert_eq!(outputs[0], outputs[1], "clip order must not matter");
}

#[test]
fn copy_blend_reproduces_source_exactly() {
    let Some(harness) = Harness::new() else { return };
    let command_buffer = harness.queue.make_command_buffer().unwrap();
    let mut context = harness.make_context(&command_buffer);

    context.clear(Color::GREEN);
    context.blend_mode = BlendMode::Copy;
    let path = Path::rect(Rect::new(0.0, 0.0, SIZE as f32, SIZE as f32));
    context.fill(
        &path,
        &Shading::Color(Color::new(0.5, 0.25, 1.0, 1.0)),
        FillStyle::default(),
    );

    let data = harness.read_backdrop(&context);
    assert_pixel(&data, 32, 32, [128, 64, 255, 255], "copy round-trip");
}
