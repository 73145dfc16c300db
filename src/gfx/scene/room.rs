//! # Procedural Room
//!
//! Floor, ceiling and four walls as quads authored directly in world
//! coordinates. Each quad is wound counter-clockwise when seen from inside the
//! room and carries texture coordinates in world units, so a checker pattern
//! shows one tile per unit.

use super::{
    object::{Material, ObjectSpec, SurfacePattern, Topology},
    vertex::Vertex3D,
};

/// Room dimensions and surface colors
#[derive(Debug, Clone, PartialEq)]
pub struct RoomConfig {
    /// Extent along X
    pub width: f32,
    /// Extent along Z
    pub depth: f32,
    /// Distance from floor to ceiling
    pub height: f32,
    /// Y coordinate of the floor
    pub floor_y: f32,
    pub floor_material: Material,
    pub ceiling_material: Material,
    pub wall_material: Material,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            width: 10.0,
            depth: 10.0,
            height: 3.0,
            floor_y: -0.5,
            floor_material: Material::rgb("floor", 0.55, 0.55, 0.55)
                .with_pattern(SurfacePattern::Checker),
            ceiling_material: Material::rgb("ceiling", 0.9, 0.9, 0.85),
            wall_material: Material::rgb("wall", 0.76, 0.8, 0.86),
        }
    }
}

impl RoomConfig {
    pub fn with_size(mut self, width: f32, depth: f32, height: f32) -> Self {
        self.width = width;
        self.depth = depth;
        self.height = height;
        self
    }

    pub fn with_floor_y(mut self, floor_y: f32) -> Self {
        self.floor_y = floor_y;
        self
    }
}

fn quad(corners: [[f32; 3]; 4], u_len: f32, v_len: f32) -> Vec<Vertex3D> {
    let uvs = [[0.0, 0.0], [u_len, 0.0], [u_len, v_len], [0.0, v_len]];
    corners
        .iter()
        .zip(uvs.iter())
        .map(|(p, uv)| Vertex3D::new(*p, *uv))
        .collect()
}

/// Builds the room surfaces in draw order: floor, ceiling, back, front, left, right.
pub fn default_room(config: &RoomConfig) -> Vec<ObjectSpec> {
    let w = config.width / 2.0;
    let d = config.depth / 2.0;
    let y0 = config.floor_y;
    let y1 = config.floor_y + config.height;
    let (width, depth, height) = (config.width, config.depth, config.height);

    let surfaces = [
        (
            "floor",
            quad([[-w, y0, d], [w, y0, d], [w, y0, -d], [-w, y0, -d]], width, depth),
            &config.floor_material,
        ),
        (
            "ceiling",
            quad([[-w, y1, -d], [w, y1, -d], [w, y1, d], [-w, y1, d]], width, depth),
            &config.ceiling_material,
        ),
        (
            "wall_back",
            quad([[-w, y0, -d], [w, y0, -d], [w, y1, -d], [-w, y1, -d]], width, height),
            &config.wall_material,
        ),
        (
            "wall_front",
            quad([[w, y0, d], [-w, y0, d], [-w, y1, d], [w, y1, d]], width, height),
            &config.wall_material,
        ),
        (
            "wall_left",
            quad([[-w, y0, d], [-w, y0, -d], [-w, y1, -d], [-w, y1, d]], depth, height),
            &config.wall_material,
        ),
        (
            "wall_right",
            quad([[w, y0, -d], [w, y0, d], [w, y1, d], [w, y1, -d]], depth, height),
            &config.wall_material,
        ),
    ];

    surfaces
        .into_iter()
        .map(|(name, vertices, material)| {
            ObjectSpec::procedural(name, vertices, Topology::QuadList)
                .with_material(material.clone())
        })
        .collect()
}
