//! Metric scale bar.

use envmap_geometry_models::Crs;
use envmap_projection::{ProjectionError, Projector, Reproject, WebMercator};
use serde::Serialize;

use crate::view::MapView;

/// A scale bar for the current view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleBar {
    /// Ground distance represented by the bar, in meters.
    pub length_m: f64,
    /// Bar width in pixels.
    pub width_px: f64,
    /// Display label, e.g. `"200 m"` or `"5 km"`.
    pub label: String,
}

impl ScaleBar {
    /// Computes the longest 1-2-5 step bar that fits in `max_width_px`.
    ///
    /// Web Mercator stretches distances by `1 / cos(latitude)`, so the
    /// ground resolution is taken at the latitude of the view center.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError`] if the view center cannot be converted to
    /// a latitude.
    pub fn for_view(
        view: &MapView,
        max_width_px: f64,
        projector: &Projector,
    ) -> Result<Self, ProjectionError> {
        let latitude = projector.reproject(&view.center(), Crs::Wgs84)?.y;
        let meters_per_px = view.resolution() * WebMercator::scale_factor(latitude);

        let length_m = nice_length(max_width_px * meters_per_px);

        Ok(Self {
            length_m,
            width_px: length_m / meters_per_px,
            label: format_length(length_m),
        })
    }
}

/// Largest `{1, 2, 5} x 10^n` not exceeding `max`.
fn nice_length(max: f64) -> f64 {
    if !max.is_finite() || max <= 0.0 {
        return 0.0;
    }

    let base = 10f64.powf(max.log10().floor());
    [5.0, 2.0, 1.0]
        .into_iter()
        .map(|step| step * base)
        .find(|length| *length <= max)
        .unwrap_or(base)
}

fn format_length(meters: f64) -> String {
    if meters >= 1000.0 {
        format!("{} km", meters / 1000.0)
    } else {
        format!("{meters} m")
    }
}
