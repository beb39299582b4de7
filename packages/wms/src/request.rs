//! `GetFeatureInfo` request construction.

use envmap_geometry_models::{Crs, Extent, ScreenPoint, ViewSize};
use reqwest::Url;

use crate::{WmsError, WmsLayer};

/// A fully specified `GetFeatureInfo` request for one layer and one click.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureInfoRequest {
    /// Id of the layer being queried.
    pub layer_id: String,
    /// Service endpoint.
    pub url: String,
    /// WMS version.
    pub version: String,
    /// Sub-layers sent as both `LAYERS` and `QUERY_LAYERS`.
    pub query_layers: String,
    /// Requested `INFO_FORMAT`.
    pub info_format: String,
    /// Current view extent.
    pub extent: Extent,
    /// Current view size in pixels.
    pub size: ViewSize,
    /// Pixel column of the click.
    pub i: i64,
    /// Pixel row of the click.
    pub j: i64,
}

impl FeatureInfoRequest {
    /// Describes a click at `screen` on a view showing `extent` at `size`.
    ///
    /// # Errors
    ///
    /// Returns [`WmsError::EmptyView`] if the view has no pixels.
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(
        layer: &WmsLayer,
        extent: Extent,
        size: ViewSize,
        screen: ScreenPoint,
    ) -> Result<Self, WmsError> {
        if size.is_empty() {
            return Err(WmsError::EmptyView {
                width: size.width,
                height: size.height,
            });
        }

        Ok(Self {
            layer_id: layer.id.clone(),
            url: layer.url.clone(),
            version: layer.version.clone(),
            query_layers: layer.query_layers.clone(),
            info_format: layer.info_format.clone(),
            extent,
            size,
            i: screen.x.round() as i64,
            j: screen.y.round() as i64,
        })
    }

    /// The `BBOX` value. WMS 1.3.0 orders EPSG:4326 bounds latitude first.
    #[must_use]
    pub fn bbox(&self) -> String {
        let Extent {
            xmin,
            ymin,
            xmax,
            ymax,
            crs,
        } = self.extent;

        if crs.is_geographic() && self.version.starts_with("1.3") {
            format!("{ymin},{xmin},{ymax},{xmax}")
        } else {
            format!("{xmin},{ymin},{xmax},{ymax}")
        }
    }

    /// Builds the request URL.
    ///
    /// Versions before 1.3.0 use `SRS`, `X` and `Y` in place of `CRS`, `I`
    /// and `J`.
    ///
    /// # Errors
    ///
    /// Returns [`WmsError::InvalidUrl`] if the service URL cannot be parsed.
    pub fn to_url(&self) -> Result<Url, WmsError> {
        let mut url = Url::parse(&self.url).map_err(|e| WmsError::InvalidUrl {
            url: self.url.clone(),
            message: e.to_string(),
        })?;

        let legacy = !self.version.starts_with("1.3");
        let (crs_key, i_key, j_key) = if legacy {
            ("SRS", "X", "Y")
        } else {
            ("CRS", "I", "J")
        };

        url.query_pairs_mut()
            .append_pair("SERVICE", "WMS")
            .append_pair("VERSION", &self.version)
            .append_pair("REQUEST", "GetFeatureInfo")
            .append_pair("LAYERS", &self.query_layers)
            .append_pair("QUERY_LAYERS", &self.query_layers)
            .append_pair("STYLES", "")
            .append_pair("INFO_FORMAT", &self.info_format)
            .append_pair(crs_key, &self.extent.crs.to_string())
            .append_pair("BBOX", &self.bbox())
            .append_pair("WIDTH", &self.size.width.to_string())
            .append_pair("HEIGHT", &self.size.height.to_string())
            .append_pair(i_key, &self.i.to_string())
            .append_pair(j_key, &self.j.to_string());

        Ok(url)
    }
}
