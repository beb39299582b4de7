//! Drawing session state.
//!
//! The session works in "single" creation mode: one completed shape ends
//! the session.

use envmap_geometry_models::{DrawTool, DrawnGeometry};
use serde::Serialize;

use crate::ViewerError;

/// Whether a shape is being drawn, and with which tool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DrawingSession {
    /// No shape is being drawn.
    #[default]
    Idle,
    /// A shape is being drawn.
    Drawing {
        /// Active tool.
        tool: DrawTool,
    },
}

impl DrawingSession {
    /// Starts drawing with `tool`, replacing any unfinished shape.
    pub fn start(&mut self, tool: DrawTool) {
        if let Self::Drawing { tool: previous } = self {
            log::debug!("Abandoning unfinished {previous} sketch");
        }
        *self = Self::Drawing { tool };
    }

    /// Abandons the current shape.
    pub fn cancel(&mut self) {
        *self = Self::Idle;
    }

    /// Accepts a completed shape and returns to [`Self::Idle`].
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::NotDrawing`] if no session is active, and
    /// [`ViewerError::GeometryMismatch`] if the shape is not what the active
    /// tool produces. The session stays active on a mismatch.
    pub fn complete(&mut self, geometry: &DrawnGeometry) -> Result<DrawTool, ViewerError> {
        let Self::Drawing { tool } = *self else {
            return Err(ViewerError::NotDrawing);
        };

        if tool.produces() != geometry.geometry_type() {
            return Err(ViewerError::GeometryMismatch {
                expected: tool.produces(),
                actual: geometry.geometry_type(),
            });
        }

        *self = Self::Idle;
        Ok(tool)
    }

    /// Whether a session is active.
    #[must_use]
    pub const fn is_drawing(&self) -> bool {
        matches!(self, Self::Drawing { .. })
    }
}
