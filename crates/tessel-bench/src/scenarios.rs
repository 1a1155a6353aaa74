//! Benchmark scenarios: procedural mesh, pinning and config per case.
//!
//! Six canonical scenarios:
//! 1. **Separated**: two triangles far apart (no pairs)
//! 2. **Overlapping**: two triangles hovering within contact distance
//! 3. **Random soup**: seeded independent triangles in a cube
//! 4. **Folded sheet**: a grid folded flat onto itself (dense contacts)
//! 5. **Coincident**: every corner on one point (degenerate bound)
//! 6. **Sphere**: a closed UV sphere (large connected mesh)

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use tessel_contact::CollisionConfig;
use tessel_math::Vec3;
use tessel_mesh::generators::{
    coincident_cluster, folded_sheet, random_triangle_soup, unit_triangle, uv_sphere,
};
use tessel_mesh::TriangleMesh;
use tessel_solver::SolverConfig;

/// Which benchmark scenario to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScenarioKind {
    Separated,
    Overlapping,
    /// `count` triangles scattered with the given seed.
    RandomSoup { count: usize, seed: u64 },
    FoldedSheet,
    Coincident,
    Sphere,
}

impl ScenarioKind {
    pub const DEFAULT_SOUP_COUNT: usize = 4096;
    pub const DEFAULT_SOUP_SEED: u64 = 42;

    /// Default triangle soup used by [`ScenarioKind::all`] and the CLI.
    pub const DEFAULT_SOUP: ScenarioKind = ScenarioKind::RandomSoup {
        count: Self::DEFAULT_SOUP_COUNT,
        seed: Self::DEFAULT_SOUP_SEED,
    };

    /// Returns all scenario kinds.
    pub fn all() -> &'static [ScenarioKind] {
        &[
            ScenarioKind::Separated,
            ScenarioKind::Overlapping,
            ScenarioKind::DEFAULT_SOUP,
            ScenarioKind::FoldedSheet,
            ScenarioKind::Coincident,
            ScenarioKind::Sphere,
        ]
    }

    /// Returns a human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioKind::Separated => "separated",
            ScenarioKind::Overlapping => "overlapping",
            ScenarioKind::RandomSoup { .. } => "random_soup",
            ScenarioKind::FoldedSheet => "folded_sheet",
            ScenarioKind::Coincident => "coincident",
            ScenarioKind::Sphere => "sphere",
        }
    }
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioKind::RandomSoup { count, seed } => {
                write!(f, "random_soup:{count}:{seed}")
            }
            other => f.write_str(other.name()),
        }
    }
}

/// Parses a scenario name; `random_soup[:count[:seed]]` takes optional
/// parameters.
impl FromStr for ScenarioKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(':');
        let name = parts.next().unwrap_or_default();
        let kind = match name {
            "separated" => ScenarioKind::Separated,
            "overlapping" => ScenarioKind::Overlapping,
            "folded_sheet" => ScenarioKind::FoldedSheet,
            "coincident" => ScenarioKind::Coincident,
            "sphere" => ScenarioKind::Sphere,
            "random_soup" => {
                let mut count = ScenarioKind::DEFAULT_SOUP_COUNT;
                let mut seed = ScenarioKind::DEFAULT_SOUP_SEED;
                if let Some(c) = parts.next() {
                    count = c.parse().map_err(|e| format!("bad triangle count '{c}': {e}"))?;
                }
                if let Some(text) = parts.next() {
                    seed = text.parse().map_err(|e| format!("bad seed '{text}': {e}"))?;
                }
                ScenarioKind::RandomSoup { count, seed }
            }
            other => return Err(format!("unknown scenario '{other}'")),
        };
        if parts.next().is_some() {
            return Err(format!("too many parameters in '{s}'"));
        }
        Ok(kind)
    }
}

/// A fully specified benchmark scenario.
pub struct Scenario {
    /// Scenario type.
    pub kind: ScenarioKind,
    /// Simulated mesh.
    pub mesh: TriangleMesh,
    /// Per-vertex pinning.
    pub pinned: Vec<bool>,
    /// Detection configuration.
    pub collision: CollisionConfig,
    /// Integrator configuration.
    pub solver: SolverConfig,
    /// Detection cycles to run.
    pub cycles: u32,
    /// Per-vertex mass (kg).
    pub vertex_mass: f32,
}

impl Scenario {
    fn new(kind: ScenarioKind, mesh: TriangleMesh) -> Self {
        let n = mesh.vertex_count();
        Self {
            kind,
            mesh,
            pinned: vec![false; n],
            collision: CollisionConfig::default(),
            solver: SolverConfig::default(),
            cycles: 60,
            vertex_mass: 0.002,
        }
    }

    /// Two unit triangles 4m apart.
    pub fn separated() -> Self {
        let mut mesh = unit_triangle(0.0, 0.0);
        mesh.append(&unit_triangle(5.0, 0.0));
        Self::new(ScenarioKind::Separated, mesh)
    }

    /// Two unit triangles, the second 5mm above and offset by 0.25m.
    pub fn overlapping() -> Self {
        let mut mesh = unit_triangle(0.0, 0.0);
        mesh.append(&unit_triangle(0.25, 0.005));
        Self::new(ScenarioKind::Overlapping, mesh)
    }

    /// Seeded triangle soup in a cube whose density stays roughly
    /// constant with `count`.
    pub fn random_soup(count: usize, seed: u64) -> Self {
        let extent = (count.max(1) as f32).cbrt() * 0.25;
        let mesh = random_triangle_soup(count, extent, 0.1, seed);
        Self::new(ScenarioKind::RandomSoup { count, seed }, mesh)
    }

    /// A 1m × 1m sheet at 24×24 resolution folded with a 4mm gap.
    /// The lower layer is pinned.
    pub fn folded_sheet() -> Self {
        let mesh = folded_sheet(24, 24, 1.0, 0.004);
        let half = mesh.vertex_count() / 2;
        let mut scenario = Self::new(ScenarioKind::FoldedSheet, mesh);
        scenario.pinned[..half].fill(true);
        scenario
    }

    /// 256 triangles collapsed onto a single point.
    pub fn coincident() -> Self {
        let mut scenario = Self::new(
            ScenarioKind::Coincident,
            coincident_cluster(256, Vec3::new(0.0, 1.0, 0.0)),
        );
        scenario.pinned.fill(true);
        scenario
    }

    /// A 0.5m radius sphere at 32×64 resolution.
    pub fn sphere() -> Self {
        Self::new(ScenarioKind::Sphere, uv_sphere(0.5, 32, 64))
    }

    /// Create a scenario by kind.
    pub fn from_kind(kind: ScenarioKind) -> Self {
        match kind {
            ScenarioKind::Separated => Self::separated(),
            ScenarioKind::Overlapping => Self::overlapping(),
            ScenarioKind::RandomSoup { count, seed } => Self::random_soup(count, seed),
            ScenarioKind::FoldedSheet => Self::folded_sheet(),
            ScenarioKind::Coincident => Self::coincident(),
            ScenarioKind::Sphere => Self::sphere(),
        }
    }

    /// Replace the detection configuration.
    pub fn with_collision(mut self, collision: CollisionConfig) -> Self {
        self.collision = collision;
        self
    }
}
