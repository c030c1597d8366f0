//! Fundamental, backend-independent world data types (component C1/C2/C9/C10).

mod block;
mod direction;
mod frustum;
mod mesh;
mod raycast;

pub use block::{face_uv, face_visible, is_light_source, is_opaque, is_solid, is_sprite, BlockId};
pub use direction::Direction;
pub use frustum::{aabb_in_frustum, Aabb, Frustum};
pub use mesh::{
    pack, pack_face, pack_sprite_quad, unpack, PackError, VertexAttrs, FACE_INDEX_PATTERN, MAX_CHUNK_HEIGHT, MAX_CHUNK_WIDTH,
    SPRITE_QUADS,
};
pub use raycast::{raycast, RaycastHit};
