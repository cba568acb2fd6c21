//! Geometry APIs
//!
//! The offset box scripts observe through offsetWidth/offsetHeight.

/// Element offset box
///
/// Defaults to an empty box: without a layout pass an element reports
/// zero offsetWidth/offsetHeight, the same as one hidden with `display: none`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ElementGeometry {
    pub offset_top: f64,
    pub offset_left: f64,
    pub offset_width: f64,
    pub offset_height: f64,
}

impl ElementGeometry {
    /// Box of the given size at the origin
    pub fn sized(width: f64, height: f64) -> Self {
        Self {
            offset_width: width,
            offset_height: height,
            ..Self::default()
        }
    }

    /// Whether the element occupies any rendered area
    ///
    /// Mirrors the `offsetWidth < 1 && offsetHeight < 1` visibility test.
    pub fn has_box(&self) -> bool {
        self.offset_width >= 1.0 || self.offset_height >= 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_box() {
        assert!(!ElementGeometry::default().has_box());
        assert!(ElementGeometry::sized(1.0, 0.0).has_box());
        assert!(ElementGeometry::sized(0.0, 1.0).has_box());
        assert!(!ElementGeometry::sized(0.5, 0.5).has_box());
    }
}
