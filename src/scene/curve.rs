use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CurveKind {
    #[default]
    Linear,
    /// Passes through every control point with a continuous tangent.
    CatmullRom,
}

/// Named path through a list of control points, evaluated on `[0, 1]`.
#[derive(Debug, Clone)]
pub struct Curve {
    name: String,
    kind: CurveKind,
    points: Vec<Vec3>,
}

impl Curve {
    pub fn new(name: impl Into<String>, kind: CurveKind) -> Self {
        Self {
            name: name.into(),
            kind,
            points: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> CurveKind {
        self.kind
    }

    pub fn add_point(&mut self, point: Vec3) {
        self.points.push(point);
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn segment_count(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    /// Position at parameter `t`, spread evenly over the segments. Returns
    /// `None` for a curve without points.
    pub fn evaluate(&self, t: f32) -> Option<Vec3> {
        let segments = self.segment_count();
        if segments == 0 {
            return self.points.first().copied();
        }

        let scaled = t.clamp(0.0, 1.0) * segments as f32;
        let segment = (scaled.floor() as usize).min(segments - 1);
        let local = scaled - segment as f32;

        let p1 = self.points[segment];
        let p2 = self.points[segment + 1];
        Some(match self.kind {
            CurveKind::Linear => p1.lerp(p2, local),
            CurveKind::CatmullRom => {
                // endpoints are duplicated to pin the curve to them
                let p0 = self.points[segment.saturating_sub(1)];
                let p3 = self.points[(segment + 2).min(self.points.len() - 1)];
                catmull_rom(p0, p1, p2, p3, local)
            }
        })
    }

    /// Length of the control polygon.
    pub fn polygon_length(&self) -> f32 {
        self.points.windows(2).map(|w| w[0].distance(w[1])).sum()
    }
}

fn catmull_rom(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3, t: f32) -> Vec3 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * ((2.0 * p1)
        + (p2 - p0) * t
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (3.0 * p1 - p0 - 3.0 * p2 + p3) * t3)
}
