//! Timed, animated notification stack.
//!
//! Items live for a fixed total time, then linger for one exit window while
//! they slide away. Layout is recomputed from scratch every frame from the
//! ordered item list; no per-item offsets persist between frames. Visual
//! state is a pure function of an item's remaining time:
//!
//! - entry: slide in over `entry_secs`, cubic ease-out, no fade
//! - steady: at rest, fully opaque
//! - exit: once remaining time crosses zero, slide back out and fade over
//!   `exit_secs`; purged when remaining passes `-exit_secs`

use tracing::debug;

use crate::frame::{Color, Frame};
use crate::resources::Resources;
use crate::text;

pub const DEFAULT_TTL_SECS: f32 = 2.6;

const PANEL_BG: Color = [16, 18, 26, 235];
const PANEL_BORDER: Color = [92, 106, 126, 255];
const TEXT_COLOR: Color = [240, 240, 244, 255];
const ICON_FALLBACK_COLOR: Color = [235, 200, 90, 255];

#[derive(Debug, Clone, PartialEq)]
pub struct ToastSpec {
    pub text: String,
    pub icon: Option<String>,
    pub ttl_secs: f32,
    pub sound: Option<String>,
}

impl ToastSpec {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            icon: None,
            ttl_secs: DEFAULT_TTL_SECS,
            sound: None,
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_ttl(mut self, ttl_secs: f32) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }

    pub fn with_sound(mut self, sound: impl Into<String>) -> Self {
        self.sound = Some(sound.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToastStyle {
    pub entry_secs: f32,
    pub exit_secs: f32,
    /// Distance items travel while sliding in and back out.
    pub slide_px: f32,
    pub margin_px: f32,
    pub gap_px: f32,
    pub pad_x_px: f32,
    pub pad_y_px: f32,
    pub text_scale: i32,
    pub icon_size_px: f32,
}

impl Default for ToastStyle {
    fn default() -> Self {
        Self {
            entry_secs: 0.28,
            exit_secs: 0.35,
            slide_px: 42.0,
            margin_px: 14.0,
            gap_px: 8.0,
            pad_x_px: 10.0,
            pad_y_px: 8.0,
            text_scale: 2,
            icon_size_px: 18.0,
        }
    }
}

#[derive(Debug, Clone)]
struct Toast {
    text: String,
    icon: Option<String>,
    ttl_secs: f32,
    remaining_secs: f32,
    width: f32,
    height: f32,
}

/// One laid-out item for the current frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ToastView<'a> {
    pub text: &'a str,
    pub icon: Option<&'a str>,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub alpha: u8,
}

#[derive(Debug, Default)]
pub struct ToastStack {
    style: ToastStyle,
    items: Vec<Toast>,
    queued_sounds: Vec<String>,
}

impl ToastStack {
    pub fn new(style: ToastStyle) -> Self {
        Self {
            style,
            items: Vec::new(),
            queued_sounds: Vec::new(),
        }
    }

    pub fn style(&self) -> &ToastStyle {
        &self.style
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn push(&mut self, spec: ToastSpec) {
        let (width, height) = measure_box(&self.style, &spec.text, spec.icon.is_some());
        debug!(text = %spec.text, ttl_secs = spec.ttl_secs, "toast_pushed");
        if let Some(sound) = spec.sound {
            self.queued_sounds.push(sound);
        }
        self.items.push(Toast {
            text: spec.text,
            icon: spec.icon,
            ttl_secs: spec.ttl_secs.max(0.0),
            remaining_secs: spec.ttl_secs.max(0.0),
            width,
            height,
        });
    }

    pub fn update(&mut self, dt: f32) {
        let exit_secs = self.style.exit_secs;
        for item in &mut self.items {
            item.remaining_secs -= dt;
        }
        self.items
            .retain(|item| item.remaining_secs > -exit_secs);
    }

    /// Sound keys queued by `push` since the last drain. The host feeds
    /// these to its audio sink; the kernel never plays anything itself.
    pub fn take_queued_sounds(&mut self) -> Vec<String> {
        std::mem::take(&mut self.queued_sounds)
    }

    /// Computes this frame's layout, anchored to the top-right corner.
    /// First pushed item is topmost; vertical targets account for the
    /// cumulative height and gap of everything above, so simultaneous items
    /// never overlap.
    pub fn layout(&self, frame_width: u32) -> Vec<ToastView<'_>> {
        let style = &self.style;
        let mut views = Vec::with_capacity(self.items.len());
        let mut y = style.margin_px;
        for item in &self.items {
            let rest_x = frame_width as f32 - style.margin_px - item.width;
            let slide = slide_offset(item.remaining_secs, item.ttl_secs, style);
            views.push(ToastView {
                text: &item.text,
                icon: item.icon.as_deref(),
                x: rest_x + slide,
                y,
                width: item.width,
                height: item.height,
                alpha: alpha_for(item.remaining_secs, style),
            });
            y += item.height + style.gap_px;
        }
        views
    }

    pub fn draw(&self, frame: &mut Frame, resources: &mut Resources) {
        let style = self.style;
        for view in self.layout(frame.width()) {
            let x = view.x.round() as i32;
            let y = view.y.round() as i32;
            let w = view.width.round() as i32;
            let h = view.height.round() as i32;

            let mut bg = PANEL_BG;
            bg[3] = scale_alpha(bg[3], view.alpha);
            let mut border = PANEL_BORDER;
            border[3] = scale_alpha(border[3], view.alpha);
            frame.fill_rect(x, y, w, h, bg);
            frame.outline_rect(x, y, w, h, border);

            let mut text_x = x + style.pad_x_px as i32;
            if let Some(icon_key) = view.icon {
                let icon_px = style.icon_size_px as i32;
                match resources.image(icon_key) {
                    Some(icon) => {
                        let icon_y = y + (h - icon.height as i32) / 2;
                        frame.blit_rgba(
                            text_x,
                            icon_y,
                            icon.width,
                            icon.height,
                            &icon.rgba,
                            view.alpha,
                        );
                    }
                    None => {
                        // Missing decorative icon degrades to a plain badge.
                        let mut badge = ICON_FALLBACK_COLOR;
                        badge[3] = view.alpha;
                        frame.fill_circle(text_x + icon_px / 2, y + h / 2, icon_px / 2, badge);
                    }
                }
                text_x += icon_px + style.pad_x_px as i32 / 2;
            }

            let mut color = TEXT_COLOR;
            color[3] = view.alpha;
            let (_, text_h) = text::measure(view.text, style.text_scale);
            text::draw_text(
                frame,
                text_x,
                y + (h - text_h) / 2,
                view.text,
                style.text_scale,
                color,
            );
        }
    }
}

fn measure_box(style: &ToastStyle, text: &str, has_icon: bool) -> (f32, f32) {
    let (text_w, text_h) = text::measure(text, style.text_scale);
    let mut width = text_w as f32 + style.pad_x_px * 2.0;
    let mut height = text_h as f32 + style.pad_y_px * 2.0;
    if has_icon {
        width += style.icon_size_px + style.pad_x_px / 2.0;
        height = height.max(style.icon_size_px + style.pad_y_px * 2.0);
    }
    (width, height)
}

fn ease_out_cubic(t: f32) -> f32 {
    let u = 1.0 - t.clamp(0.0, 1.0);
    1.0 - u * u * u
}

/// Horizontal offset from the rest position. Positive pushes toward the
/// anchored edge (off screen).
fn slide_offset(remaining_secs: f32, ttl_secs: f32, style: &ToastStyle) -> f32 {
    if remaining_secs < 0.0 {
        // Exit phase: slide back out, linear with the fade.
        let k = (-remaining_secs / style.exit_secs).clamp(0.0, 1.0);
        return k * style.slide_px;
    }
    let age = ttl_secs - remaining_secs;
    if age < style.entry_secs {
        let k = ease_out_cubic(age / style.entry_secs);
        return (1.0 - k) * style.slide_px;
    }
    0.0
}

/// 255 through entry and steady, fading to 0 at `-exit_secs`.
fn alpha_for(remaining_secs: f32, style: &ToastStyle) -> u8 {
    if remaining_secs >= 0.0 {
        return 255;
    }
    let k = (-remaining_secs / style.exit_secs).clamp(0.0, 1.0);
    (255.0 * (1.0 - k)).round() as u8
}

fn scale_alpha(base: u8, scale: u8) -> u8 {
    ((base as u32 * scale as u32) / 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack_with(n: usize) -> ToastStack {
        let mut stack = ToastStack::default();
        for index in 0..n {
            stack.push(ToastSpec::new(format!("toast number {index}")));
        }
        stack
    }

    #[test]
    fn layout_positions_are_strictly_increasing_and_non_overlapping() {
        let stack = stack_with(5);
        let views = stack.layout(960);
        assert_eq!(views.len(), 5);
        for pair in views.windows(2) {
            assert!(pair[1].y > pair[0].y);
            assert!(pair[1].y >= pair[0].y + pair[0].height);
        }
    }

    #[test]
    fn opacity_is_full_through_the_steady_phase() {
        let style = ToastStyle::default();
        assert_eq!(alpha_for(2.0, &style), 255);
        assert_eq!(alpha_for(0.0, &style), 255);
    }

    #[test]
    fn opacity_is_zero_at_the_end_of_the_exit_window() {
        let style = ToastStyle::default();
        assert_eq!(alpha_for(-style.exit_secs, &style), 0);
        let mid = alpha_for(-style.exit_secs / 2.0, &style);
        assert!(mid > 0 && mid < 255);
    }

    #[test]
    fn entry_slide_eases_toward_rest_without_fading() {
        let style = ToastStyle::default();
        let ttl = DEFAULT_TTL_SECS;
        let at_push = slide_offset(ttl, ttl, &style);
        let mid = slide_offset(ttl - style.entry_secs / 2.0, ttl, &style);
        let settled = slide_offset(ttl - style.entry_secs, ttl, &style);
        assert_eq!(at_push, style.slide_px);
        assert!(mid > 0.0 && mid < style.slide_px);
        assert_eq!(settled, 0.0);
        assert_eq!(alpha_for(ttl - style.entry_secs / 2.0, &style), 255);
    }

    #[test]
    fn items_purge_once_remaining_passes_the_exit_window() {
        let mut stack = ToastStack::default();
        stack.push(ToastSpec::new("short").with_ttl(0.1));
        let exit = stack.style().exit_secs;
        stack.update(0.1 + exit * 0.9);
        assert_eq!(stack.len(), 1);
        stack.update(exit * 0.2);
        assert!(stack.is_empty());
    }

    #[test]
    fn layout_recomputes_after_purge() {
        let mut stack = ToastStack::default();
        stack.push(ToastSpec::new("first").with_ttl(0.1));
        stack.push(ToastSpec::new("second").with_ttl(5.0));
        let before = stack.layout(960);
        assert_eq!(before.len(), 2);
        let second_y_before = before[1].y;

        stack.update(1.0);
        let after = stack.layout(960);
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].text, "second");
        assert!(after[0].y < second_y_before);
    }

    #[test]
    fn queued_sounds_drain_once() {
        let mut stack = ToastStack::default();
        stack.push(ToastSpec::new("ding").with_sound("chime.wav"));
        stack.push(ToastSpec::new("quiet"));
        assert_eq!(stack.take_queued_sounds(), vec!["chime.wav".to_string()]);
        assert!(stack.take_queued_sounds().is_empty());
    }

    #[test]
    fn wider_text_measures_wider_boxes() {
        let mut stack = ToastStack::default();
        stack.push(ToastSpec::new("hi"));
        stack.push(ToastSpec::new("a considerably longer line"));
        let views = stack.layout(960);
        assert!(views[1].width > views[0].width);
        // Same entry offset, so both right edges line up.
        assert!((views[0].x + views[0].width - (views[1].x + views[1].width)).abs() < 1e-3);
    }

    #[test]
    fn icon_reserves_extra_width() {
        let mut stack = ToastStack::default();
        stack.push(ToastSpec::new("same text"));
        stack.push(ToastSpec::new("same text").with_icon("trophy.png"));
        let views = stack.layout(960);
        assert!(views[1].width > views[0].width);
    }
}
