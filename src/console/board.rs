//! ASCII rendering of the environment grid.

use std::collections::HashSet;

use crate::schema::{CellKind, Coord, Environment};

/// Character for a cell kind.
pub fn cell_char(kind: CellKind) -> char {
    match kind {
        CellKind::Empty => ' ',
        CellKind::Wall => '#',
        CellKind::Start => 'S',
        CellKind::End => 'E',
    }
}

/// Character marking a visited empty cell.
pub const PATH_CHAR: char = '*';

/// Render the grid with the top row (`y = height - 1`) first.
///
/// Empty cells listed in `path` are drawn with [`PATH_CHAR`]; start, end
/// and walls keep their own symbol.
pub fn render_board(env: &Environment, path: Option<&[Coord]>) -> String {
    let visited: HashSet<Coord> = path.unwrap_or_default().iter().copied().collect();
    let mut out = String::with_capacity((env.width() + 1) * env.height());

    for y in (0..env.height() as i32).rev() {
        for x in 0..env.width() as i32 {
            let coord = Coord::new(x, y);
            let ch = match env.cell(coord) {
                Some(CellKind::Empty) if visited.contains(&coord) => PATH_CHAR,
                Some(kind) => cell_char(kind),
                None => ' ',
            };
            out.push(ch);
        }
        out.push('\n');
    }
    out
}
