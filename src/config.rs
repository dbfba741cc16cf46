/// Canvas and normalisation constants for the layered layout.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutConfig {
    pub width: f64,
    pub height: f64,
    /// Vertical distance between adjacent levels as a fraction of `height`.
    pub level_spacing_ratio: f64,
    /// Horizontal stretch applied once barycenter passes are done.
    pub x_stretch: f64,
    pub x_normalizer: f64,
    pub y_normalizer: f64,
    /// Deeper graphs get proportionally wider: `1 + (levels / divisor)`.
    pub level_scale_divisor: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            width: 1500.0,
            height: 1000.0,
            level_spacing_ratio: 0.5,
            x_stretch: 3.0,
            x_normalizer: 3000.0,
            y_normalizer: 1000.0,
            level_scale_divisor: 25.0,
        }
    }
}

impl LayoutConfig {
    pub fn with_canvas(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn level_spacing(&self) -> f64 {
        self.height * self.level_spacing_ratio
    }

    /// Maps canvas coordinates into the resolution-independent space handed to renderers.
    pub fn normalize(&self, x: f64, y: f64, max_level: usize) -> (f64, f64) {
        let x_scale = (1.0 + (max_level as f64 + 1.0) / self.level_scale_divisor) / self.x_normalizer;
        (x * x_scale, y / self.y_normalizer)
    }
}
