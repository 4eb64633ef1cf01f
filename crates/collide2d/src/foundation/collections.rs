//! Specialized collection types

pub use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Stable handle to a shape registered with the collision registry
    ///
    /// Handles stay valid until the shape is purged; a purged handle never
    /// aliases a newer shape.
    pub struct ShapeHandle;
}

/// Handle-based map for registered shapes
pub type ShapeMap<T> = SlotMap<ShapeHandle, T>;
