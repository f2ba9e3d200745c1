//! # Region Tasks
//!
//! A region task names the chunks a pregeneration run should produce and the
//! order they are handed out in. Enumeration is lazy, finite and restartable:
//! [`RegionTask::iter`] always starts from the beginning.
//!
//! ## Orders
//!
//! | order | walk |
//! |-------|------|
//! | `Spiral` | ring by ring outward from the shape's center |
//! | `RowMajor` | z outer, x inner |
//! | `Regions` | 32x32-chunk regions row-major, chunks row-major inside each |
//!
//! Order only affects which chunks finish first; every coordinate of the
//! shape is produced exactly once.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use lithos_procedural::{ChunkCoord, WorldSeed, REGION_SIZE};
use serde::{Deserialize, Serialize};

/// Lazy coordinate sequence.
pub type Coords = Box<dyn Iterator<Item = ChunkCoord> + Send>;

/// The world a task or method is bound to.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorldIdentity {
    /// World name.
    pub name: String,
    /// World seed.
    pub seed: WorldSeed,
}

impl WorldIdentity {
    /// Creates an identity.
    #[must_use]
    pub fn new(name: impl Into<String>, seed: WorldSeed) -> Self {
        Self {
            name: name.into(),
            seed,
        }
    }
}

impl fmt::Display for WorldIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (seed {})", self.name, self.seed.value())
    }
}

/// Enumeration order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Order {
    /// Center-out rings.
    #[default]
    Spiral,
    /// Rows of constant z.
    #[serde(alias = "row")]
    RowMajor,
    /// Grouped by 32x32 region.
    Regions,
}

impl FromStr for Order {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "spiral" => Ok(Self::Spiral),
            "row" | "row_major" | "rowmajor" => Ok(Self::RowMajor),
            "regions" | "region" => Ok(Self::Regions),
            other => Err(format!("unknown order '{other}' (spiral, row, regions)")),
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Spiral => "spiral",
            Self::RowMajor => "row",
            Self::Regions => "regions",
        })
    }
}

/// Which chunks a task covers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Shape {
    /// The square of chunks within `radius` (Chebyshev) of `center`.
    Radius {
        /// Center chunk.
        center: ChunkCoord,
        /// Radius in chunks; 0 is the center alone.
        radius: u32,
    },
    /// Every chunk in the inclusive rectangle `min..=max`.
    Rect {
        /// Lowest corner.
        min: ChunkCoord,
        /// Highest corner.
        max: ChunkCoord,
    },
    /// An explicit list, de-duplicated on construction.
    List(Vec<ChunkCoord>),
}

impl Shape {
    /// A rectangle spanning two corners in any order.
    #[must_use]
    pub fn rect(a: ChunkCoord, b: ChunkCoord) -> Self {
        Self::Rect {
            min: ChunkCoord::new(a.x.min(b.x), a.z.min(b.z)),
            max: ChunkCoord::new(a.x.max(b.x), a.z.max(b.z)),
        }
    }

    /// An explicit list; later duplicates are dropped.
    #[must_use]
    pub fn list(coords: impl IntoIterator<Item = ChunkCoord>) -> Self {
        let mut seen = HashSet::new();
        Self::List(coords.into_iter().filter(|c| seen.insert(*c)).collect())
    }

    /// Returns true if `coord` belongs to the shape.
    #[must_use]
    pub fn contains(&self, coord: ChunkCoord) -> bool {
        match self.bounds() {
            Some(bounds) => bounds.contains(coord),
            None => matches!(self, Self::List(list) if list.contains(&coord)),
        }
    }

    /// Number of coordinates in the shape.
    #[must_use]
    pub fn len(&self) -> u64 {
        match (self, self.bounds()) {
            (Self::List(list), _) => list.len() as u64,
            (_, Some(bounds)) => bounds.len(),
            (_, None) => 0,
        }
    }

    /// Returns true if the shape has no coordinates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn bounds(&self) -> Option<Bounds> {
        match *self {
            Self::Radius { center, radius } => {
                let r = i32::try_from(radius).unwrap_or(i32::MAX);
                Some(Bounds {
                    min: ChunkCoord::new(center.x.saturating_sub(r), center.z.saturating_sub(r)),
                    max: ChunkCoord::new(center.x.saturating_add(r), center.z.saturating_add(r)),
                    center,
                })
            }
            Self::Rect { min, max } => Some(Bounds {
                min,
                max,
                center: ChunkCoord::new(midpoint(min.x, max.x), midpoint(min.z, max.z)),
            }),
            Self::List(_) => None,
        }
    }
}

fn midpoint(a: i32, b: i32) -> i32 {
    i32::try_from((i64::from(a) + i64::from(b)).div_euclid(2)).unwrap_or(a)
}

#[derive(Clone, Copy, Debug)]
struct Bounds {
    min: ChunkCoord,
    max: ChunkCoord,
    center: ChunkCoord,
}

impl Bounds {
    fn contains(self, c: ChunkCoord) -> bool {
        (self.min.x..=self.max.x).contains(&c.x) && (self.min.z..=self.max.z).contains(&c.z)
    }

    #[allow(clippy::cast_sign_loss)]
    fn len(self) -> u64 {
        let w = (i64::from(self.max.x) - i64::from(self.min.x) + 1) as u64;
        let d = (i64::from(self.max.z) - i64::from(self.min.z) + 1) as u64;
        w * d
    }

    fn rows(self) -> Coords {
        let Self { min, max, .. } = self;
        Box::new((min.z..=max.z).flat_map(move |z| (min.x..=max.x).map(move |x| ChunkCoord::new(x, z))))
    }

    fn spiral(self) -> Coords {
        let c = self.center;
        let reach = [c.x - self.min.x, self.max.x - c.x, c.z - self.min.z, self.max.z - c.z]
            .into_iter()
            .max()
            .unwrap_or(0);
        Box::new((0..=reach).flat_map(move |k| ring(c, k, self)))
    }

    fn regions(self) -> Coords {
        let (rmin, rmax) = (self.min.region(), self.max.region());
        Box::new(
            (rmin.1..=rmax.1)
                .flat_map(move |rz| (rmin.0..=rmax.0).map(move |rx| (rx, rz)))
                .flat_map(move |(rx, rz)| {
                    let clip = Bounds {
                        min: ChunkCoord::new(
                            (rx * REGION_SIZE).max(self.min.x),
                            (rz * REGION_SIZE).max(self.min.z),
                        ),
                        max: ChunkCoord::new(
                            (rx * REGION_SIZE + REGION_SIZE - 1).min(self.max.x),
                            (rz * REGION_SIZE + REGION_SIZE - 1).min(self.max.z),
                        ),
                        center: self.center,
                    };
                    clip.rows()
                }),
        )
    }
}

/// The part of the square ring at Chebyshev distance `k` around `c` that
/// lies inside `clip`, clockwise from the low corner.
///
/// Each edge is clipped before it is walked, so a ring costs only the
/// coordinates it yields.
#[allow(clippy::cast_possible_truncation)]
fn ring(c: ChunkCoord, k: i32, clip: Bounds) -> Vec<ChunkCoord> {
    let (lo_x, hi_x) = (i64::from(clip.min.x), i64::from(clip.max.x));
    let (lo_z, hi_z) = (i64::from(clip.min.z), i64::from(clip.max.z));
    let k = i64::from(k);
    let (x0, z0) = (i64::from(c.x) - k, i64::from(c.z) - k);
    let (x1, z1) = (i64::from(c.x) + k, i64::from(c.z) + k);
    let at = |x: i64, z: i64| ChunkCoord::new(x as i32, z as i32);

    if k == 0 {
        return if clip.contains(c) { vec![c] } else { Vec::new() };
    }

    let mut out = Vec::new();
    if (lo_z..=hi_z).contains(&z0) {
        out.extend((x0.max(lo_x)..=x1.min(hi_x)).map(|x| at(x, z0)));
    }
    if (lo_x..=hi_x).contains(&x1) {
        out.extend(((z0 + 1).max(lo_z)..=z1.min(hi_z)).map(|z| at(x1, z)));
    }
    if (lo_z..=hi_z).contains(&z1) {
        out.extend((x0.max(lo_x)..=(x1 - 1).min(hi_x)).rev().map(|x| at(x, z1)));
    }
    if (lo_x..=hi_x).contains(&x0) {
        out.extend(((z0 + 1).max(lo_z)..=(z1 - 1).min(hi_z)).rev().map(|z| at(x0, z)));
    }
    out
}

/// A set of chunks, an order, and the world they belong to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegionTask {
    /// Covered chunks.
    pub shape: Shape,
    /// Enumeration order.
    pub order: Order,
    /// Target world.
    pub world: WorldIdentity,
}

impl RegionTask {
    /// Creates a task with spiral order.
    #[must_use]
    pub fn new(world: WorldIdentity, shape: Shape) -> Self {
        Self {
            shape,
            order: Order::default(),
            world,
        }
    }

    /// The square of radius `radius` around `center`.
    #[must_use]
    pub fn radius(world: WorldIdentity, center: ChunkCoord, radius: u32) -> Self {
        Self::new(world, Shape::Radius { center, radius })
    }

    /// The rectangle spanning `a` and `b`.
    #[must_use]
    pub fn rect(world: WorldIdentity, a: ChunkCoord, b: ChunkCoord) -> Self {
        Self::new(world, Shape::rect(a, b))
    }

    /// An explicit coordinate list.
    #[must_use]
    pub fn list(world: WorldIdentity, coords: impl IntoIterator<Item = ChunkCoord>) -> Self {
        Self::new(world, Shape::list(coords))
    }

    /// Sets the order.
    #[must_use]
    pub const fn with_order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }

    /// Number of coordinates.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.shape.len()
    }

    /// Returns true if the task covers nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shape.is_empty()
    }

    /// Enumerates every coordinate once, in order.
    #[must_use]
    pub fn iter(&self) -> Coords {
        if let Some(bounds) = self.shape.bounds() {
            return match self.order {
                Order::Spiral => bounds.spiral(),
                Order::RowMajor => bounds.rows(),
                Order::Regions => bounds.regions(),
            };
        }

        let mut list = match &self.shape {
            Shape::List(list) => list.clone(),
            _ => Vec::new(),
        };
        match self.order {
            Order::Spiral => {
                if let Some(&first) = list.first() {
                    list.sort_by_key(|c| c.ring_distance(first));
                }
            }
            Order::RowMajor => list.sort_by_key(|c| (c.z, c.x)),
            Order::Regions => list.sort_by_key(|c| {
                let (rx, rz) = c.region();
                (rz, rx, c.z, c.x)
            }),
        }
        Box::new(list.into_iter())
    }

    /// Enumerates every coordinate not in `done`, in order.
    #[must_use]
    pub fn coords_excluding(&self, done: &HashSet<ChunkCoord>) -> Coords {
        if done.is_empty() {
            return self.iter();
        }
        let done = done.clone();
        Box::new(self.iter().filter(move |c| !done.contains(c)))
    }
}
