//! Chunk coordinate helpers

use glam::{DVec3, IVec2};

/// Width of a chunk cell in blocks (cells are CHUNK_SIZE x CHUNK_SIZE columns)
pub const CHUNK_SIZE: i32 = 16;

/// Horizontal chunk cell coordinate, `x` = chunk x, `y` = chunk z
pub type ChunkCoord = IVec2;

/// Chunk cell containing a world position
pub fn chunk_of(pos: DVec3) -> ChunkCoord {
    chunk_of_xz(pos.x, pos.z)
}

/// Chunk cell containing the column at (x, z)
pub fn chunk_of_xz(x: f64, z: f64) -> ChunkCoord {
    let block_x = x.floor() as i32;
    let block_z = z.floor() as i32;
    IVec2::new(block_x.div_euclid(CHUNK_SIZE), block_z.div_euclid(CHUNK_SIZE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_of_positive() {
        assert_eq!(chunk_of(DVec3::new(0.0, 64.0, 0.0)), IVec2::new(0, 0));
        assert_eq!(chunk_of(DVec3::new(15.9, 64.0, 31.0)), IVec2::new(0, 1));
        assert_eq!(chunk_of(DVec3::new(16.0, 64.0, 16.0)), IVec2::new(1, 1));
    }

    #[test]
    fn test_chunk_of_negative() {
        // Negative coordinates round towards negative infinity
        assert_eq!(chunk_of(DVec3::new(-0.5, 0.0, -1.0)), IVec2::new(-1, -1));
        assert_eq!(chunk_of(DVec3::new(-16.0, 0.0, -16.5)), IVec2::new(-1, -2));
        assert_eq!(chunk_of(DVec3::new(-17.0, 0.0, 0.0)), IVec2::new(-2, 0));
    }
}
