//! HTTP API DTOs.

use serde::Serialize;

/// One room in the `/api/rooms` listing.
#[derive(Debug, Clone, Serialize)]
pub struct RoomSummaryDto {
    pub id: u32,
    pub occupancy: usize,
    pub capacity: u32,
}
