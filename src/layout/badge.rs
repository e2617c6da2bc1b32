//! Rounded label badges laid out left to right on a single row.
//!
//! A badge whose starting x would pass the printable margin is dropped together with every
//! label after it. The row never wraps.

use super::canvas::{Canvas, Color};
use super::fonts::{Measure, Weight};

#[derive(Debug, Clone, Copy)]
pub struct BadgeStyle {
    pub size: f32,
    pub padding_x: f32,
    pub height: f32,
    pub gap: f32,
    pub radius: f32,
    pub fill: Color,
    pub text_color: Color,
}

impl Default for BadgeStyle {
    fn default() -> Self {
        Self {
            size: 8.0,
            padding_x: 2.5,
            height: 6.0,
            gap: 2.0,
            radius: 1.5,
            fill: Color::BADGE,
            text_color: Color::WHITE,
        }
    }
}

/// A badge that made it onto the row.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedBadge<'a> {
    pub label: &'a str,
    pub x: f32,
    pub width: f32,
}

pub fn layout_badges<'a, I>(
    labels: I,
    measure: &Measure<'_>,
    start_x: f32,
    max_x: f32,
    style: &BadgeStyle,
) -> Vec<PlacedBadge<'a>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut placed = Vec::new();
    let mut x = start_x;
    for label in labels {
        // only the start is checked; a badge starting inside the margin may run past it
        if x > max_x {
            break;
        }
        let width = measure.width(label) + 2.0 * style.padding_x;
        placed.push(PlacedBadge { label, x, width });
        x += width + style.gap;
    }
    placed
}

/// Draw a laid-out row with its top edge at `y`.
pub fn draw_badges(canvas: &mut Canvas<'_>, badges: &[PlacedBadge<'_>], y: f32, style: &BadgeStyle) {
    for badge in badges {
        canvas.rounded_rect(badge.x, y, badge.width, style.height, style.radius, Some(style.fill), None);
        canvas.text(
            badge.x + style.padding_x,
            y + style.height * 0.68,
            badge.label,
            style.size,
            Weight::Bold,
            style.text_color,
        );
    }
}
