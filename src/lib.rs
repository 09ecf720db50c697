//! Quantum Tic-Tac-Toe game logic with arena-based superposition tracking.
//!
//! # Rules recap
//!
//! Each turn a player marks *two* cells with a single quantum move (a
//! superposition). A cell accumulates superposed marks until it collapses
//! to a classical symbol. Pending moves form a graph over the nine cells
//! (nodes = cells, edges = moves); when a new move would connect two cells
//! that are already connected, it closes a cycle and the whole cycle must
//! collapse: every move in the loop resolves to exactly one of its two
//! cells, in one consistent rotational direction.
//!
//! # Move identity
//!
//! A move is shared by its two endpoint cells until collapse releases it
//! from both. Moves live once in an arena (`Vec<Move>`) owned by the board;
//! cells hold [`MoveId`] indices into it. Two moves linking the same pair
//! of cells therefore stay distinct, which matters because exactly that
//! configuration forms the minimal (2-move) cycle.
//!
//! Cell indices (row-major order):
//! ```text
//!   0 1 2
//!   3 4 5
//!   6 7 8
//! ```
//!
//! # Calling order
//!
//! [`Board::detect_cycle`] must run *before* [`Board::try_place`] commits
//! the candidate move: the search relies on the candidate not yet being
//! registered on its endpoint cells. The session layer in [`game`] wraps
//! this sequence; callers driving the board directly must respect it.

pub mod game;
#[cfg(feature = "wasm")]
pub mod wasm;

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Player identifier, doubling as the classical symbol a cell collapses to.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Player {
    X = 0,
    O = 1,
}

impl Player {
    /// Get the opponent player.
    #[inline]
    pub fn opponent(self) -> Player {
        match self {
            Player::X => Player::O,
            Player::O => Player::X,
        }
    }

    /// The classical symbol for this player.
    #[inline]
    pub fn symbol(self) -> char {
        match self {
            Player::X => 'X',
            Player::O => 'O',
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Position on the 3x3 board (0-8).
///
/// Layout:
/// ```text
///   0 1 2
///   3 4 5
///   6 7 8
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub struct Pos(pub u8);

impl Pos {
    /// Create a position from row and column (0-2 each).
    #[inline]
    pub fn from_row_col(row: u8, col: u8) -> Pos {
        debug_assert!(row < 3 && col < 3);
        Pos(row * 3 + col)
    }

    /// Get the row (0-2).
    #[inline]
    pub fn row(self) -> u8 {
        self.0 / 3
    }

    /// Get the column (0-2).
    #[inline]
    pub fn col(self) -> u8 {
        self.0 % 3
    }

    /// Check if this is a valid position (0-8).
    #[inline]
    pub fn is_valid(self) -> bool {
        self.0 < 9
    }

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }

    /// Iterate over all 9 positions.
    pub fn all() -> impl Iterator<Item = Pos> {
        (0..9).map(Pos)
    }
}

/// Stable identity of a move within one board's arena.
///
/// Ids are assigned by [`Board::new_move`] and stay valid for the lifetime
/// of the board (and of its clones, since cloning copies the arena).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub struct MoveId(u32);

impl MoveId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// An immutable quantum move spanning two cells.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Move {
    /// Per-player move count at creation time, 1-based. Display only.
    pub number: u32,
    /// The player who made the move.
    pub player: Player,
    /// First endpoint cell.
    pub a: Pos,
    /// Second endpoint cell.
    pub b: Pos,
}

impl Move {
    /// Display label, e.g. `"X3"` for X's third move.
    pub fn label(&self) -> String {
        format!("{}{}", self.player.symbol(), self.number)
    }

    /// Whether `cell` is one of this move's two endpoints.
    #[inline]
    pub fn touches(&self, cell: Pos) -> bool {
        cell == self.a || cell == self.b
    }

    /// The endpoint that is not `cell`.
    ///
    /// # Panics
    ///
    /// Panics if `cell` is not an endpoint of this move.
    #[inline]
    pub fn other(&self, cell: Pos) -> Pos {
        assert!(self.touches(cell), "{:?} is not an endpoint of {:?}", cell, self);
        if cell == self.a {
            self.b
        } else {
            self.a
        }
    }
}

/// State of a single cell: either still superposed (holding pending move
/// references in insertion order) or collapsed to a classical symbol.
///
/// A collapsed cell holds no pending references. A superposed cell's
/// references all name this cell as one of their endpoints, and each is
/// mirrored on the move's other endpoint cell until one side collapses.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Cell {
    /// Pending superposition marks, oldest first.
    Superposed(Vec<MoveId>),
    /// Classical symbol, final.
    Collapsed(Player),
}

impl Cell {
    fn new() -> Cell {
        Cell::Superposed(Vec::new())
    }

    /// Check if the cell has collapsed to a classical symbol.
    #[inline]
    pub fn is_collapsed(&self) -> bool {
        matches!(self, Cell::Collapsed(_))
    }

    /// True iff the cell can still take part in a superposition.
    #[inline]
    pub fn can_accept(&self) -> bool {
        !self.is_collapsed()
    }

    /// The classical symbol, or `None` while superposed.
    #[inline]
    pub fn symbol(&self) -> Option<Player> {
        match self {
            Cell::Collapsed(p) => Some(*p),
            Cell::Superposed(_) => None,
        }
    }

    /// Pending move references, oldest first. Empty once collapsed.
    #[inline]
    pub fn pending(&self) -> &[MoveId] {
        match self {
            Cell::Superposed(ids) => ids,
            Cell::Collapsed(_) => &[],
        }
    }

    fn add(&mut self, id: MoveId) {
        match self {
            Cell::Superposed(ids) => ids.push(id),
            Cell::Collapsed(_) => panic!("cannot add a superposition to a collapsed cell"),
        }
    }

    /// Remove a reference if present; no-op if absent or already collapsed.
    fn remove(&mut self, id: MoveId) {
        if let Cell::Superposed(ids) = self {
            ids.retain(|&m| m != id);
        }
    }

    /// Set the classical symbol, discarding all pending references.
    ///
    /// This does not clean up the other endpoints of the discarded moves;
    /// [`Board::collapse_cycle`] owns that sweep.
    fn collapse(&mut self, player: Player) {
        *self = Cell::Collapsed(player);
    }
}

/// The quantum board: nine cells plus the arena of every move created on it.
///
/// `Clone` is a deep value copy: the clone shares nothing with the
/// original, so snapshotting for caller-side undo is just a structural copy.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Board {
    cells: [Cell; 9],
    /// Move arena. Entries are immutable and never removed, so ids stay
    /// stable even for moves that were rejected or collapsed away.
    moves: Vec<Move>,
}

impl Board {
    /// The 8 winning lines: 3 rows, 3 columns, 2 diagonals.
    const WIN_LINES: [[Pos; 3]; 8] = [
        [Pos(0), Pos(1), Pos(2)], // Row 0
        [Pos(3), Pos(4), Pos(5)], // Row 1
        [Pos(6), Pos(7), Pos(8)], // Row 2
        [Pos(0), Pos(3), Pos(6)], // Col 0
        [Pos(1), Pos(4), Pos(7)], // Col 1
        [Pos(2), Pos(5), Pos(8)], // Col 2
        [Pos(0), Pos(4), Pos(8)], // Main diagonal
        [Pos(2), Pos(4), Pos(6)], // Anti-diagonal
    ];

    /// Create a new board with all cells superposed and empty.
    pub fn new() -> Board {
        Board {
            cells: std::array::from_fn(|_| Cell::new()),
            moves: Vec::new(),
        }
    }

    /// Register a move in the arena, returning its stable identity.
    ///
    /// The move is not placed on any cell yet; run [`Board::detect_cycle`]
    /// and then [`Board::try_place`] with the returned id. `number` is the
    /// player's own 1-based move count, used only for display labels.
    ///
    /// # Panics
    ///
    /// Panics if either endpoint is outside 0-8. Equal endpoints are
    /// accepted here and rejected by `try_place`.
    pub fn new_move(&mut self, number: u32, player: Player, a: Pos, b: Pos) -> MoveId {
        assert!(a.is_valid() && b.is_valid(), "cell index out of range: {:?}, {:?}", a, b);
        let id = MoveId(self.moves.len() as u32);
        self.moves.push(Move { number, player, a, b });
        id
    }

    /// Look up a move by id.
    #[inline]
    pub fn mov(&self, id: MoveId) -> &Move {
        &self.moves[id.index()]
    }

    /// Access a cell's state.
    #[inline]
    pub fn cell(&self, pos: Pos) -> &Cell {
        &self.cells[pos.index()]
    }

    /// Check if the cell at `pos` has collapsed.
    #[inline]
    pub fn is_collapsed(&self, pos: Pos) -> bool {
        self.cells[pos.index()].is_collapsed()
    }

    /// Whether a move spanning `a` and `b` could currently be placed.
    #[inline]
    pub fn accepts(&self, a: Pos, b: Pos) -> bool {
        a != b && self.cells[a.index()].can_accept() && self.cells[b.index()].can_accept()
    }

    // ========== Placement ==========

    /// Commit a registered move onto both of its endpoint cells.
    ///
    /// Returns `false`, with no state mutated, if the endpoints are equal
    /// or either endpoint has already collapsed. On success the move is
    /// registered symmetrically on both cells.
    pub fn try_place(&mut self, id: MoveId) -> bool {
        let mv = *self.mov(id);
        if !self.accepts(mv.a, mv.b) {
            return false;
        }
        self.cells[mv.a.index()].add(id);
        self.cells[mv.b.index()].add(id);
        true
    }

    // ========== Cycle Detection ==========

    /// Determine whether committing the candidate move would close a cycle.
    ///
    /// Must be called before `try_place` commits the candidate: the search
    /// covers only moves already registered on cells, so the candidate is
    /// excluded exactly when the calling order is respected.
    ///
    /// Returns the existing path from `a` to `b` (moves in traversal
    /// order) with the candidate appended as the final element, or `None`
    /// if the endpoints are not yet connected. The search is depth-first
    /// over pending moves in insertion order, visiting each cell at most
    /// once, so the result is deterministic for a fixed placement history.
    /// Any simple path is acceptable; collapse needs a closed walk, not the
    /// shortest one.
    pub fn detect_cycle(&self, id: MoveId) -> Option<Vec<MoveId>> {
        let mv = self.mov(id);
        debug_assert!(
            !self.cells[mv.a.index()].pending().contains(&id),
            "detect_cycle must run before the candidate is placed"
        );
        if mv.a == mv.b {
            return None;
        }
        let mut cycle = self.find_path(mv.a, mv.b)?;
        cycle.push(id);
        Some(cycle)
    }

    /// DFS for a path between two cells over the pending-move graph.
    fn find_path(&self, start: Pos, end: Pos) -> Option<Vec<MoveId>> {
        let mut visited = [false; 9];
        let mut path = Vec::new();
        if self.dfs(start, end, &mut visited, &mut path) {
            Some(path)
        } else {
            None
        }
    }

    fn dfs(&self, current: Pos, target: Pos, visited: &mut [bool; 9], path: &mut Vec<MoveId>) -> bool {
        if current == target {
            return true;
        }
        visited[current.index()] = true;

        for &id in self.cells[current.index()].pending() {
            let next = self.mov(id).other(current);
            if visited[next.index()] {
                continue;
            }
            path.push(id);
            if self.dfs(next, target, visited, path) {
                return true;
            }
            path.pop();
        }
        false
    }

    // ========== Cycle Orientation ==========

    /// Turn a detected cycle plus the chosen winning cell of its triggering
    /// (last) move into a complete move-to-winning-cell mapping.
    ///
    /// Pure with respect to board state: only the move arena is read. The
    /// mapping covers every move in the cycle exactly once and assigns each
    /// move one of its own endpoints, all following a single rotational
    /// direction around the loop consistent with the chosen winner.
    ///
    /// # Panics
    ///
    /// Panics if the cycle is empty or `winner` is not an endpoint of the
    /// triggering move.
    pub fn orient_cycle(&self, cycle: &[MoveId], winner: Pos) -> HashMap<MoveId, Pos> {
        let trigger = *cycle.last().expect("cannot orient an empty cycle");
        let tm = *self.mov(trigger);
        assert!(
            tm.touches(winner),
            "winner {:?} is not an endpoint of the triggering move {}",
            winner,
            tm.label()
        );

        // Two moves linking the same pair of cells form the minimal cycle:
        // the newer move takes the chosen cell, the older its opposite.
        if cycle.len() == 2 {
            let older = cycle[0];
            let mut map = HashMap::with_capacity(2);
            map.insert(trigger, winner);
            map.insert(older, self.mov(older).other(winner));
            return map;
        }

        // Rebuild the ordered cell loop from the path portion of the cycle.
        // The path may have been discovered from either endpoint of the
        // triggering move; start the walk where the first path move is.
        let (mut start, mut end) = (tm.a, tm.b);
        if !self.mov(cycle[0]).touches(start) {
            std::mem::swap(&mut start, &mut end);
        }
        let mut cells: Vec<Pos> = Vec::with_capacity(cycle.len() + 1);
        cells.push(start);
        for &id in &cycle[..cycle.len() - 1] {
            let last = *cells.last().expect("loop walk is never empty");
            cells.push(self.mov(id).other(last));
        }
        debug_assert_eq!(*cells.last().expect("loop walk is never empty"), end);

        // Close the loop, then orient it so traversal ends on the winner.
        cells.push(start);
        if *cells.last().expect("loop walk is never empty") != winner {
            cells.reverse();
        }

        // Walk consecutive pairs (u, v); the move linking them wins v.
        let mut map = HashMap::with_capacity(cycle.len());
        for pair in cells.windows(2) {
            let (u, v) = (pair[0], pair[1]);
            let id = *cycle
                .iter()
                .find(|&&id| self.mov(id).touches(u) && self.mov(id).touches(v))
                .expect("no cycle move links adjacent loop cells");
            map.insert(id, v);
        }
        map
    }

    // ========== Cycle Collapse ==========

    /// Collapse a detected cycle given a winner-per-move mapping.
    ///
    /// For every move in the cycle: the winning cell collapses to the
    /// move's player and the move reference is removed from the losing
    /// cell. Afterwards a sweep strips, from every still-superposed cell,
    /// any pending move whose other endpoint has collapsed. Moves that
    /// touched a newly collapsed cell without being part of the cycle lose
    /// the stale reference but are not themselves collapsed.
    ///
    /// # Panics
    ///
    /// Panics if the mapping is missing an entry for a cycle move, or maps
    /// a move to a cell that is not one of its endpoints.
    pub fn collapse_cycle(&mut self, cycle: &[MoveId], winner_by_move: &HashMap<MoveId, Pos>) {
        for &id in cycle {
            let winner = *winner_by_move
                .get(&id)
                .unwrap_or_else(|| panic!("winner mapping missing for move {}", self.mov(id).label()));
            let mv = *self.mov(id);
            let loser = mv.other(winner);
            self.cells[winner.index()].collapse(mv.player);
            self.cells[loser.index()].remove(id);
        }
        self.sweep_collapsed();
    }

    /// Drop pending references that point into collapsed cells.
    fn sweep_collapsed(&mut self) {
        let collapsed: [bool; 9] = std::array::from_fn(|i| self.cells[i].is_collapsed());
        let Board { cells, moves } = self;
        for (i, cell) in cells.iter_mut().enumerate() {
            if let Cell::Superposed(ids) = cell {
                ids.retain(|&id| {
                    let other = moves[id.index()].other(Pos(i as u8));
                    !collapsed[other.index()]
                });
            }
        }
    }

    // ========== Win Detection & Queries ==========

    /// The set of players holding at least one fully collapsed line.
    ///
    /// A line counts only if all three cells are collapsed to the same
    /// symbol. A single collapse can complete lines for both players at
    /// once, so the set may hold both.
    pub fn get_winners(&self) -> HashSet<Player> {
        let mut winners = HashSet::new();
        for line in &Self::WIN_LINES {
            let symbol = match self.cells[line[0].index()].symbol() {
                Some(s) => s,
                None => continue,
            };
            if self.cells[line[1].index()].symbol() == Some(symbol)
                && self.cells[line[2].index()].symbol() == Some(symbol)
            {
                winners.insert(symbol);
            }
        }
        winners
    }

    /// True iff every cell has collapsed.
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Cell::is_collapsed)
    }

    /// Textual content of a cell: the collapsed symbol, the comma-joined
    /// labels of pending moves, or empty for a fresh cell.
    pub fn cell_display(&self, pos: Pos) -> String {
        match &self.cells[pos.index()] {
            Cell::Collapsed(p) => p.to_string(),
            Cell::Superposed(ids) => ids
                .iter()
                .map(|&id| self.mov(id).label())
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..3 {
            for col in 0..3 {
                write!(f, "[{}]", self.cell_display(Pos::from_row_col(row, col)))?;
            }
            if row < 2 {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
