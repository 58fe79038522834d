//! Rendering hand-off
//!
//! The simulation never talks to a graphics API. Screens draw through the
//! `RenderSurface` trait; `DrawList` records the calls so a backend can replay
//! them or upload the tessellated `Vertex` buffer in one go.

pub mod shapes;
pub mod sprites;
pub mod vertex;

use std::sync::Arc;

use glam::{IVec2, UVec2};

use crate::assets::Image;

pub use vertex::{Vertex, colors};

pub type Color = [f32; 4];

/// Drawing target in screen pixels
pub trait RenderSurface {
    fn size(&self) -> UVec2;
    fn clear(&mut self, color: Color);
    fn fill_rect(&mut self, pos: IVec2, size: UVec2, color: Color);
    fn outline_rect(&mut self, pos: IVec2, size: UVec2, color: Color);
    fn fill_circle(&mut self, center: IVec2, radius: f32, color: Color);
    fn ring(&mut self, center: IVec2, radius: f32, width: f32, color: Color);
    /// `pos` is the top-left corner of the text box
    fn text(&mut self, pos: IVec2, text: &str, size: u32, color: Color);
    /// Decoded image with its top-left corner at `pos`
    fn image(&mut self, pos: IVec2, image: &Arc<Image>);
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear(Color),
    Rect { pos: IVec2, size: UVec2, color: Color },
    Outline { pos: IVec2, size: UVec2, color: Color },
    Circle { center: IVec2, radius: f32, color: Color },
    Ring { center: IVec2, radius: f32, width: f32, color: Color },
    Text { pos: IVec2, text: String, size: u32, color: Color },
    Image { pos: IVec2, image: Arc<Image> },
}

/// Recording surface
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    size: UVec2,
    commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new(size: UVec2) -> Self {
        Self {
            size,
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn reset(&mut self) {
        self.commands.clear();
    }

    /// Text lines in draw order
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Triangles for every shape command since the last clear. Text and
    /// images are left to the backend's font and texture paths.
    pub fn vertices(&self) -> Vec<Vertex> {
        let start = self
            .commands
            .iter()
            .rposition(|c| matches!(c, DrawCommand::Clear(_)))
            .map_or(0, |i| i + 1);
        let mut out = Vec::new();
        for command in &self.commands[start..] {
            match command {
                DrawCommand::Rect { pos, size, color } => {
                    out.extend(shapes::rect(pos.as_vec2(), size.as_vec2(), *color));
                }
                DrawCommand::Outline { pos, size, color } => {
                    out.extend(shapes::rect_outline(pos.as_vec2(), size.as_vec2(), 1.0, *color));
                }
                DrawCommand::Circle { center, radius, color } => {
                    out.extend(shapes::circle(
                        center.as_vec2(),
                        *radius,
                        *color,
                        shapes::segments_for(*radius),
                    ));
                }
                DrawCommand::Ring {
                    center,
                    radius,
                    width,
                    color,
                } => {
                    out.extend(shapes::ring(
                        center.as_vec2(),
                        (radius - width).max(0.0),
                        *radius,
                        *color,
                        shapes::segments_for(*radius),
                    ));
                }
                DrawCommand::Clear(_) | DrawCommand::Text { .. } | DrawCommand::Image { .. } => {}
            }
        }
        out
    }

    /// Vertex buffer bytes ready for upload
    pub fn vertex_bytes(&self) -> Vec<u8> {
        bytemuck::cast_slice(&self.vertices()).to_vec()
    }
}

impl RenderSurface for DrawList {
    fn size(&self) -> UVec2 {
        self.size
    }

    fn clear(&mut self, color: Color) {
        self.commands.push(DrawCommand::Clear(color));
    }

    fn fill_rect(&mut self, pos: IVec2, size: UVec2, color: Color) {
        self.commands.push(DrawCommand::Rect { pos, size, color });
    }

    fn outline_rect(&mut self, pos: IVec2, size: UVec2, color: Color) {
        self.commands.push(DrawCommand::Outline { pos, size, color });
    }

    fn fill_circle(&mut self, center: IVec2, radius: f32, color: Color) {
        self.commands.push(DrawCommand::Circle { center, radius, color });
    }

    fn ring(&mut self, center: IVec2, radius: f32, width: f32, color: Color) {
        self.commands.push(DrawCommand::Ring {
            center,
            radius,
            width,
            color,
        });
    }

    fn text(&mut self, pos: IVec2, text: &str, size: u32, color: Color) {
        self.commands.push(DrawCommand::Text {
            pos,
            text: text.to_owned(),
            size,
            color,
        });
    }

    fn image(&mut self, pos: IVec2, image: &Arc<Image>) {
        self.commands.push(DrawCommand::Image {
            pos,
            image: Arc::clone(image),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertices_start_after_last_clear() {
        let mut list = DrawList::new(UVec2::new(100, 100));
        list.fill_rect(IVec2::ZERO, UVec2::splat(4), colors::RED);
        list.clear(colors::SKY);
        list.fill_rect(IVec2::new(1, 1), UVec2::splat(2), colors::GREEN);
        list.text(IVec2::ZERO, "hi", 12, colors::WHITE);
        list.image(IVec2::ZERO, &Arc::new(Image::solid(UVec2::splat(2), colors::RED)));

        let vertices = list.vertices();
        assert_eq!(vertices.len(), 6);
        assert!(vertices.iter().all(|v| v.color == colors::GREEN));
        assert_eq!(list.vertex_bytes().len(), 6 * std::mem::size_of::<Vertex>());
        assert_eq!(list.texts().collect::<Vec<_>>(), vec!["hi"]);
    }
}
