//! Frame lifecycle tracking and the per-frame context.
//!
//! [`FrameLifecycle`] is the renderer's state machine, kept free of Vulkan
//! calls so its contracts can be unit tested without a GPU. The renderer
//! drives it through `begin_frame`, the render pass markers, and `end_frame`;
//! any out-of-order call is a programming error and panics.
//!
//! The begin-frame and rebuild decisions live here as pure functions for the
//! same reason: [`plan_acquired_frame`], [`plan_rebuild`], and
//! [`needs_rebuild_after_present`] take acquire and present outcomes as
//! values and return what the renderer should do, with no Vulkan objects
//! involved.

use ash::vk;
use glimmer_rhi::swapchain::{AcquireResult, PresentResult};
use glimmer_rhi::sync::MAX_FRAMES_IN_FLIGHT;
use glimmer_scene::camera::Camera;
use glimmer_scene::game_object::GameObjectMap;

/// Phase of the frame state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FramePhase {
    /// No frame is being recorded.
    Idle,
    /// A swapchain image has been acquired and its command buffer is recording.
    FrameStarted,
    /// The frame's render pass is open.
    InRenderPass,
}

/// Tracks the frame phase, the acquired image index, and the frame slot.
///
/// The frame slot index cycles through `[0, MAX_FRAMES_IN_FLIGHT)` and selects
/// per-slot resources such as uniform buffers and descriptor sets. It only
/// advances when a frame completes; skipped ticks (degenerate extent,
/// out-of-date acquire) leave it untouched. It advances in lockstep with the
/// swapchain's own slot counter, though the two need not be equal: a rebuilt
/// swapchain restarts its counter at slot 0 while this one keeps its value,
/// leaving a fixed offset between them.
#[derive(Clone, Copy, Debug)]
pub struct FrameLifecycle {
    phase: FramePhase,
    image_index: u32,
    frame_index: usize,
}

impl FrameLifecycle {
    /// Creates a lifecycle in the idle phase at frame slot 0.
    pub fn new() -> Self {
        Self {
            phase: FramePhase::Idle,
            image_index: 0,
            frame_index: 0,
        }
    }

    /// Returns the current phase.
    #[inline]
    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    /// Returns true if a frame is being recorded.
    #[inline]
    pub fn is_frame_in_progress(&self) -> bool {
        self.phase != FramePhase::Idle
    }

    /// Returns the swapchain image index of the frame in progress.
    ///
    /// Only meaningful while a frame is in progress.
    #[inline]
    pub fn image_index(&self) -> u32 {
        self.image_index
    }

    /// Returns the current frame slot index.
    #[inline]
    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    /// Marks the start of a frame targeting `image_index`.
    ///
    /// # Panics
    ///
    /// Panics if a frame is already in progress.
    pub fn start_frame(&mut self, image_index: u32) {
        assert!(
            self.phase == FramePhase::Idle,
            "begin_frame called while a frame is already in progress"
        );
        self.phase = FramePhase::FrameStarted;
        self.image_index = image_index;
    }

    /// Marks the render pass as open.
    ///
    /// # Panics
    ///
    /// Panics unless a frame is started and no render pass is open.
    pub fn enter_render_pass(&mut self) {
        assert!(
            self.phase == FramePhase::FrameStarted,
            "begin_render_pass called outside a started frame"
        );
        self.phase = FramePhase::InRenderPass;
    }

    /// Marks the render pass as closed.
    ///
    /// # Panics
    ///
    /// Panics if no render pass is open.
    pub fn exit_render_pass(&mut self) {
        assert!(
            self.phase == FramePhase::InRenderPass,
            "end_render_pass called with no render pass open"
        );
        self.phase = FramePhase::FrameStarted;
    }

    /// Completes the frame and advances the frame slot round-robin.
    ///
    /// # Panics
    ///
    /// Panics if no frame is in progress or the render pass is still open.
    pub fn finish_frame(&mut self) {
        assert!(
            self.phase == FramePhase::FrameStarted,
            "end_frame called with no frame in progress or a render pass still open"
        );
        self.phase = FramePhase::Idle;
        self.frame_index = (self.frame_index + 1) % MAX_FRAMES_IN_FLIGHT;
    }
}

impl Default for FrameLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// What a tick should do with an acquire outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickPlan {
    /// The swapchain must be rebuilt and this tick skipped. Exactly one
    /// rebuild happens; the next tick acquires from the new swapchain.
    RebuildAndSkip,
    /// Render into the acquired image.
    Render {
        /// Index of the acquired swapchain image.
        image_index: u32,
        /// The swapchain no longer matches the surface exactly. The frame
        /// still completes; present reports the condition and triggers the
        /// rebuild afterwards.
        suboptimal: bool,
    },
}

/// What a swapchain rebuild request should do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RebuildPlan {
    /// Rebuild the swapchain now.
    pub run: bool,
    /// Clear the window's resize flag. Only a completed rebuild clears it;
    /// a deferred rebuild leaves the flag set so the next frame retries.
    pub clear_resize_flag: bool,
}

/// Returns true if `extent` can back a swapchain.
///
/// A minimized window reports a zero dimension and cannot be rendered to.
#[inline]
pub fn extent_renderable(extent: vk::Extent2D) -> bool {
    extent.width > 0 && extent.height > 0
}

/// Decides what a tick does with the outcome of an image acquisition.
///
/// Out-of-date means no image exists to render into, so the tick is skipped
/// after a rebuild. A suboptimal acquire still yields a usable image, so the
/// frame runs to completion rather than discarding the acquired image.
pub fn plan_acquired_frame(acquire: AcquireResult) -> TickPlan {
    match acquire {
        AcquireResult::OutOfDate => TickPlan::RebuildAndSkip,
        AcquireResult::Ready {
            image_index,
            suboptimal,
        } => TickPlan::Render {
            image_index,
            suboptimal,
        },
    }
}

/// Decides whether a requested swapchain rebuild runs now or is deferred.
///
/// A degenerate extent defers the rebuild and keeps the resize flag set, so
/// the request is not lost while the window is minimized.
pub fn plan_rebuild(extent: vk::Extent2D) -> RebuildPlan {
    let run = extent_renderable(extent);
    RebuildPlan {
        run,
        clear_resize_flag: run,
    }
}

/// Returns true if the swapchain must be rebuilt after presenting.
///
/// Presentation reporting anything but a clean present, or a pending window
/// resize, both require a rebuild before the next frame.
#[inline]
pub fn needs_rebuild_after_present(present: PresentResult, window_resized: bool) -> bool {
    present != PresentResult::Ok || window_resized
}

/// Asserts that a rebuilt swapchain kept the old color and depth formats.
///
/// Pipelines are built against those formats through the render pass, so a
/// rebuild that changes either cannot reuse them.
///
/// # Panics
///
/// Panics if `stable` is false.
pub fn ensure_formats_stable(stable: bool) {
    assert!(
        stable,
        "Swapchain color or depth format changed across rebuild"
    );
}

/// Everything a render system needs for one frame.
///
/// Built by the application each tick and passed by reference to every
/// render system between `begin_render_pass` and `end_render_pass`.
pub struct FrameContext<'a> {
    /// Frame slot index, selects per-slot uniform buffers and descriptor sets.
    pub frame_index: usize,
    /// Seconds elapsed since the previous frame.
    pub frame_time: f32,
    /// The command buffer being recorded for this frame.
    pub command_buffer: vk::CommandBuffer,
    /// The camera used for this frame.
    pub camera: &'a Camera,
    /// Descriptor set holding the global uniform buffer for this slot.
    pub global_descriptor_set: vk::DescriptorSet,
    /// The scene's game objects.
    pub game_objects: &'a GameObjectMap,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_starts_idle() {
        let lifecycle = FrameLifecycle::new();
        assert_eq!(lifecycle.phase(), FramePhase::Idle);
        assert!(!lifecycle.is_frame_in_progress());
        assert_eq!(lifecycle.frame_index(), 0);
    }

    #[test]
    fn test_full_frame_cycle() {
        let mut lifecycle = FrameLifecycle::new();

        lifecycle.start_frame(1);
        assert!(lifecycle.is_frame_in_progress());
        assert_eq!(lifecycle.image_index(), 1);

        lifecycle.enter_render_pass();
        assert_eq!(lifecycle.phase(), FramePhase::InRenderPass);

        lifecycle.exit_render_pass();
        lifecycle.finish_frame();

        assert!(!lifecycle.is_frame_in_progress());
        assert_eq!(lifecycle.frame_index(), 1);
    }

    #[test]
    fn test_frame_index_advances_round_robin() {
        let mut lifecycle = FrameLifecycle::new();

        for expected in [1, 0, 1, 0] {
            lifecycle.start_frame(0);
            lifecycle.finish_frame();
            assert_eq!(lifecycle.frame_index(), expected);
        }
    }

    #[test]
    fn test_skipped_tick_leaves_frame_index() {
        let lifecycle = FrameLifecycle::new();
        // A tick that never starts a frame must not advance the slot
        assert_eq!(lifecycle.frame_index(), 0);

        let mut lifecycle = FrameLifecycle::new();
        lifecycle.start_frame(0);
        lifecycle.finish_frame();
        let before = lifecycle.frame_index();
        // No start_frame here, slot stays put
        assert_eq!(lifecycle.frame_index(), before);
    }

    #[test]
    #[should_panic(expected = "already in progress")]
    fn test_double_begin_frame_panics() {
        let mut lifecycle = FrameLifecycle::new();
        lifecycle.start_frame(0);
        lifecycle.start_frame(1);
    }

    #[test]
    #[should_panic(expected = "no frame in progress")]
    fn test_end_frame_without_begin_panics() {
        let mut lifecycle = FrameLifecycle::new();
        lifecycle.finish_frame();
    }

    #[test]
    #[should_panic(expected = "outside a started frame")]
    fn test_render_pass_without_frame_panics() {
        let mut lifecycle = FrameLifecycle::new();
        lifecycle.enter_render_pass();
    }

    #[test]
    #[should_panic(expected = "render pass still open")]
    fn test_end_frame_inside_render_pass_panics() {
        let mut lifecycle = FrameLifecycle::new();
        lifecycle.start_frame(0);
        lifecycle.enter_render_pass();
        lifecycle.finish_frame();
    }

    #[test]
    #[should_panic(expected = "no render pass open")]
    fn test_exit_render_pass_without_enter_panics() {
        let mut lifecycle = FrameLifecycle::new();
        lifecycle.start_frame(0);
        lifecycle.exit_render_pass();
    }

    #[test]
    fn test_extent_renderable() {
        let ok = vk::Extent2D {
            width: 800,
            height: 600,
        };
        assert!(extent_renderable(ok));

        // Minimized windows report a zero dimension
        let zero_width = vk::Extent2D {
            width: 0,
            height: 600,
        };
        let zero_height = vk::Extent2D {
            width: 800,
            height: 0,
        };
        assert!(!extent_renderable(zero_width));
        assert!(!extent_renderable(zero_height));
    }

    #[test]
    fn test_out_of_date_acquire_skips_tick_after_rebuild() {
        // No image exists to render into, so the tick is skipped and the
        // swapchain is rebuilt exactly once
        assert_eq!(
            plan_acquired_frame(AcquireResult::OutOfDate),
            TickPlan::RebuildAndSkip
        );
    }

    #[test]
    fn test_suboptimal_acquire_still_renders() {
        // The acquired image is usable; the frame completes and present
        // triggers the rebuild afterwards
        let plan = plan_acquired_frame(AcquireResult::Ready {
            image_index: 2,
            suboptimal: true,
        });
        assert_eq!(
            plan,
            TickPlan::Render {
                image_index: 2,
                suboptimal: true,
            }
        );
    }

    #[test]
    fn test_clean_acquire_renders() {
        let plan = plan_acquired_frame(AcquireResult::Ready {
            image_index: 0,
            suboptimal: false,
        });
        assert_eq!(
            plan,
            TickPlan::Render {
                image_index: 0,
                suboptimal: false,
            }
        );
    }

    #[test]
    fn test_degenerate_rebuild_is_deferred_and_keeps_resize_flag() {
        let plan = plan_rebuild(vk::Extent2D {
            width: 0,
            height: 0,
        });
        assert!(!plan.run);
        assert!(!plan.clear_resize_flag);
    }

    #[test]
    fn test_completed_rebuild_clears_resize_flag() {
        let plan = plan_rebuild(vk::Extent2D {
            width: 1280,
            height: 720,
        });
        assert!(plan.run);
        assert!(plan.clear_resize_flag);
    }

    #[test]
    fn test_resize_flag_cleared_exactly_once_per_completed_rebuild() {
        // A resize while minimized: the first rebuild request defers and
        // leaves the flag set, the request after restoring clears it once
        let minimized = vk::Extent2D {
            width: 0,
            height: 0,
        };
        let restored = vk::Extent2D {
            width: 1280,
            height: 720,
        };

        let mut resized = true;
        for extent in [minimized, minimized, restored] {
            let plan = plan_rebuild(extent);
            if plan.clear_resize_flag {
                resized = false;
            }
            if plan.run {
                // Only the completed rebuild cleared the flag
                assert!(!resized);
            } else {
                assert!(resized, "deferred rebuild must not clear the flag");
            }
        }
        assert!(!resized);
    }

    #[test]
    fn test_needs_rebuild_after_present() {
        assert!(!needs_rebuild_after_present(PresentResult::Ok, false));
        assert!(needs_rebuild_after_present(PresentResult::Ok, true));
        assert!(needs_rebuild_after_present(PresentResult::OutOfDate, false));
        assert!(needs_rebuild_after_present(PresentResult::Suboptimal, false));
    }

    #[test]
    fn test_stable_formats_pass() {
        ensure_formats_stable(true);
    }

    #[test]
    #[should_panic(expected = "format changed across rebuild")]
    fn test_changed_formats_panic() {
        ensure_formats_stable(false);
    }
}
