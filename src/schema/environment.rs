//! Grid environment: dimensions, walls, start and end cells.
//!
//! The environment is immutable once built and is shared read-only by every
//! evaluation worker.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::config::{ConfigError, HEIGHT_RANGE, WIDTH_RANGE, check_range};

/// Integer grid coordinate. `y` grows upward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Coordinate shifted by `(dx, dy)`.
    #[inline]
    pub const fn offset(self, (dx, dy): (i32, i32)) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Manhattan distance to `other`.
    #[inline]
    pub fn manhattan(self, other: Coord) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Kind of a single grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    Empty,
    Wall,
    Start,
    End,
}

/// Immutable grid description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    width: usize,
    height: usize,
    /// Row-major wall map, indexed by `y * width + x`.
    walls: Vec<bool>,
    start: Coord,
    end: Coord,
}

impl Environment {
    /// Build an environment from its walls.
    ///
    /// Walls outside the grid are rejected; a wall placed on the start or end
    /// cell is dropped since both must stay walkable.
    pub fn new(
        width: usize,
        height: usize,
        start: Coord,
        end: Coord,
        walls: impl IntoIterator<Item = Coord>,
    ) -> Result<Self, EnvironmentError> {
        if width == 0 || height == 0 {
            return Err(EnvironmentError::EmptyGrid);
        }

        let mut env = Self {
            width,
            height,
            walls: vec![false; width * height],
            start,
            end,
        };

        for (what, coord) in [("start", start), ("end", end)] {
            if !env.contains(coord) {
                return Err(EnvironmentError::OutOfBounds {
                    what,
                    coord,
                    width,
                    height,
                });
            }
        }

        for wall in walls {
            let idx = env.index(wall).ok_or(EnvironmentError::OutOfBounds {
                what: "obstacle",
                coord: wall,
                width,
                height,
            })?;
            if wall != start && wall != end {
                env.walls[idx] = true;
            }
        }

        Ok(env)
    }

    /// Obstacle-free grid with start in the bottom-left corner and end in the
    /// top-right corner.
    pub fn open(width: usize, height: usize) -> Result<Self, EnvironmentError> {
        let end = Coord::new(width as i32 - 1, height as i32 - 1);
        Self::new(width, height, Coord::new(0, 0), end, std::iter::empty())
    }

    /// Load an environment file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, EnvironmentError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| EnvironmentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let env = Self::parse(&text)?;
        log::info!(
            "Loaded {}x{} environment from {} ({} walls)",
            env.width,
            env.height,
            path.display(),
            env.wall_count()
        );
        Ok(env)
    }

    /// Parse the environment text format.
    ///
    /// Line 1 holds the start coordinate, line 2 the end coordinate and every
    /// following line one obstacle, each as `x y`. Grid dimensions are one past
    /// the largest obstacle coordinates and must fit the accepted width and
    /// height ranges.
    pub fn parse(text: &str) -> Result<Self, EnvironmentError> {
        let mut coords = text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| parse_coord(i + 1, line));

        let start = coords
            .next()
            .ok_or(EnvironmentError::MissingCoordinate("start"))??;
        let end = coords
            .next()
            .ok_or(EnvironmentError::MissingCoordinate("end"))??;
        let walls = coords.collect::<Result<Vec<_>, _>>()?;

        let width = walls.iter().map(|c| c.x as usize + 1).max().unwrap_or(0);
        let height = walls.iter().map(|c| c.y as usize + 1).max().unwrap_or(0);
        check_range("width", width, &WIDTH_RANGE)?;
        check_range("height", height, &HEIGHT_RANGE)?;

        Self::new(width, height, start, end, walls)
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn start(&self) -> Coord {
        self.start
    }

    #[inline]
    pub fn end(&self) -> Coord {
        self.end
    }

    /// Whether `coord` lies inside the grid.
    #[inline]
    pub fn contains(&self, coord: Coord) -> bool {
        coord.x >= 0
            && coord.y >= 0
            && (coord.x as usize) < self.width
            && (coord.y as usize) < self.height
    }

    #[inline]
    fn index(&self, coord: Coord) -> Option<usize> {
        self.contains(coord)
            .then(|| coord.y as usize * self.width + coord.x as usize)
    }

    /// Whether a creature may stand on `coord`.
    #[inline]
    pub fn is_walkable(&self, coord: Coord) -> bool {
        self.index(coord).is_some_and(|idx| !self.walls[idx])
    }

    /// Kind of the cell at `coord`, or `None` outside the grid.
    pub fn cell(&self, coord: Coord) -> Option<CellKind> {
        let idx = self.index(coord)?;
        Some(if coord == self.start {
            CellKind::Start
        } else if coord == self.end {
            CellKind::End
        } else if self.walls[idx] {
            CellKind::Wall
        } else {
            CellKind::Empty
        })
    }

    /// Number of wall cells.
    pub fn wall_count(&self) -> usize {
        self.walls.iter().filter(|&&w| w).count()
    }
}

fn parse_coord(line_no: usize, line: &str) -> Result<Coord, EnvironmentError> {
    let malformed = || EnvironmentError::Malformed {
        line: line_no,
        content: line.to_string(),
    };

    let mut parts = line.split_whitespace();
    let x = parts.next().ok_or_else(malformed)?;
    let y = parts.next().ok_or_else(malformed)?;
    if parts.next().is_some() {
        return Err(malformed());
    }

    let x: u16 = x.parse().map_err(|_| malformed())?;
    let y: u16 = y.parse().map_err(|_| malformed())?;
    Ok(Coord::new(x.into(), y.into()))
}

/// Errors raised while building or loading an environment.
#[derive(Debug, thiserror::Error)]
pub enum EnvironmentError {
    #[error("Cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Line {line} is not an \"x y\" coordinate: {content:?}")]
    Malformed { line: usize, content: String },
    #[error("Missing {0} coordinate")]
    MissingCoordinate(&'static str),
    #[error("Grid dimensions must be non-zero")]
    EmptyGrid,
    #[error("The {what} coordinate {coord} is outside the {width}x{height} grid")]
    OutOfBounds {
        what: &'static str,
        coord: Coord,
        width: usize,
        height: usize,
    },
    #[error(transparent)]
    Dimensions(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const FLAT: &str = "0 0\n9 0\n0 4\n9 4\n4 2\n5 2\n";

    #[test]
    fn test_parse_dimensions_from_obstacles() {
        let env = Environment::parse(FLAT).unwrap();
        assert_eq!(env.width(), 10);
        assert_eq!(env.height(), 5);
        assert_eq!(env.start(), Coord::new(0, 0));
        assert_eq!(env.end(), Coord::new(9, 0));
        assert_eq!(env.wall_count(), 4);
        assert_eq!(env.cell(Coord::new(4, 2)), Some(CellKind::Wall));
        assert_eq!(env.cell(Coord::new(0, 0)), Some(CellKind::Start));
        assert_eq!(env.cell(Coord::new(9, 0)), Some(CellKind::End));
        assert_eq!(env.cell(Coord::new(1, 1)), Some(CellKind::Empty));
        assert_eq!(env.cell(Coord::new(10, 0)), None);
    }

    #[test]
    fn test_parse_rejects_small_grid() {
        let err = Environment::parse("0 0\n1 1\n3 2\n").unwrap_err();
        assert!(matches!(
            err,
            EnvironmentError::Dimensions(ConfigError::OutOfRange { name: "width", .. })
        ));

        let err = Environment::parse("0 0\n1 1\n6 5\n").unwrap_err();
        assert!(matches!(
            err,
            EnvironmentError::Dimensions(ConfigError::OutOfRange { name: "height", .. })
        ));
    }

    #[test]
    fn test_parse_rejects_malformed_line() {
        let err = Environment::parse("0 0\n4 2\n4 x\n").unwrap_err();
        assert!(matches!(err, EnvironmentError::Malformed { line: 3, .. }));

        let err = Environment::parse("0 0\n4 2\n-1 2\n").unwrap_err();
        assert!(matches!(err, EnvironmentError::Malformed { line: 3, .. }));
    }

    #[test]
    fn test_parse_requires_start_and_end() {
        assert!(matches!(
            Environment::parse("").unwrap_err(),
            EnvironmentError::MissingCoordinate("start")
        ));
        assert!(matches!(
            Environment::parse("0 0\n").unwrap_err(),
            EnvironmentError::MissingCoordinate("end")
        ));
    }

    #[test]
    fn test_end_outside_grid_rejected() {
        let err = Environment::parse("0 0\n9 4\n4 2\n").unwrap_err();
        assert!(matches!(err, EnvironmentError::OutOfBounds { what: "end", .. }));
    }

    #[test]
    fn test_wall_on_start_is_dropped() {
        let env = Environment::parse("1 1\n4 2\n1 1\n4 2\n").unwrap();
        assert!(env.is_walkable(Coord::new(1, 1)));
        assert!(env.is_walkable(Coord::new(4, 2)));
        assert_eq!(env.wall_count(), 0);
    }

    #[test]
    fn test_open_environment() {
        let env = Environment::open(5, 3).unwrap();
        assert_eq!(env.start(), Coord::new(0, 0));
        assert_eq!(env.end(), Coord::new(4, 2));
        assert_eq!(env.wall_count(), 0);
        assert!(!env.is_walkable(Coord::new(-1, 0)));
        assert!(!env.is_walkable(Coord::new(0, 3)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FLAT.as_bytes()).unwrap();

        let env = Environment::load(file.path()).unwrap();
        assert_eq!(env, Environment::parse(FLAT).unwrap());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Environment::load(dir.path().join("missing.txt")).unwrap_err();
        assert!(matches!(err, EnvironmentError::Io { .. }));
    }

    #[test]
    fn test_bundled_areas() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("areas");

        let flat = Environment::load(dir.join("Flat.txt")).unwrap();
        assert_eq!(flat, Environment::open(10, 5).unwrap());

        let walls = Environment::load(dir.join("Walls.txt")).unwrap();
        assert_eq!((walls.width(), walls.height()), (10, 5));
        assert_eq!(walls.wall_count(), 12);

        let narrow = Environment::load(dir.join("Narrow.txt")).unwrap();
        assert_eq!((narrow.width(), narrow.height()), (7, 3));
        assert_eq!(narrow.start(), Coord::new(0, 1));
    }

    #[test]
    fn test_manhattan() {
        assert_eq!(Coord::new(0, 0).manhattan(Coord::new(4, 2)), 6);
        assert_eq!(Coord::new(3, 1).manhattan(Coord::new(1, 2)), 3);
    }
}
