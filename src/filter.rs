use crate::color::Lab;

/// A trait used to implement pixel filters for the sampling pass.
///
/// During sampling, filters are used to drop pixels before they reach any histogram or the palette. A dropped pixel
/// does not count towards the analysis' pixel count either. The estimated background model is one such filter; this
/// trait allows the library consumer to implement their own.
///
/// See [`crate::AnalysisBuilder::add_filter`] on how to add filters to the sampling pass.
pub trait Filter: Send + Sync {
    /// Return whether a given pixel should be counted. The same color is given in both 8-bit sRGB and CIELAB for
    /// convenience.
    fn is_allowed(&self, rgb: (u8, u8, u8), lab: Lab) -> bool;
}

impl<F> Filter for F
where
    F: Fn((u8, u8, u8), Lab) -> bool + Send + Sync,
{
    fn is_allowed(&self, rgb: (u8, u8, u8), lab: Lab) -> bool {
        self(rgb, lab)
    }
}
