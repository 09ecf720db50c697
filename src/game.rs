//! Turn sequencing, undo, and game-over detection on top of [`Board`].
//!
//! The board is a pure state container; everything stateful about a match
//! lives here: whose turn it is, per-player move numbering for labels like
//! `"X3"`, snapshot-based undo, the pending-collapse handshake, and the
//! injected strategy that names the winning cell when a cycle closes.

use std::collections::HashMap;

use log::{debug, info};

use crate::{Board, MoveId, Player, Pos};

/// Picks the winning cell for the triggering move of a detected cycle.
///
/// `chooser` is the player making the choice, by convention the player who
/// did *not* place the triggering move. Implementations must return one of
/// the triggering (last) move's two endpoints.
pub trait CollapseChooser {
    fn choose(&mut self, chooser: Player, board: &Board, cycle: &[MoveId]) -> Pos;
}

impl<F> CollapseChooser for F
where
    F: FnMut(Player, &Board, &[MoveId]) -> Pos,
{
    fn choose(&mut self, chooser: Player, board: &Board, cycle: &[MoveId]) -> Pos {
        self(chooser, board, cycle)
    }
}

/// Final result of a finished game.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameResult {
    /// One player completed a line.
    Win(Player),
    /// Both players completed lines in the same collapse; the player who
    /// spent fewer quantum moves wins.
    WinByFewerMoves(Player),
    /// Equal move counts with lines for both, or a full board with none.
    Draw,
}

/// What a single placement attempt did.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum TurnOutcome {
    /// Nothing changed: the game is over, a collapse is still pending, the
    /// endpoints are equal, or an endpoint has already collapsed.
    Rejected,
    /// The move was placed without closing a cycle.
    Placed(MoveId),
    /// The move was placed and closed a cycle. Placement stays blocked
    /// until [`Game::resolve_collapse`] names the winning cell.
    CycleClosed { id: MoveId, cycle: Vec<MoveId> },
}

#[derive(Clone, Debug)]
struct Snapshot {
    board: Board,
    current: Player,
    moves_by: [u32; 2],
    pending: Option<Vec<MoveId>>,
    result: Option<GameResult>,
}

/// One match of Quantum Tic-Tac-Toe. X moves first.
#[derive(Clone, Debug)]
pub struct Game {
    board: Board,
    current: Player,
    moves_by: [u32; 2],
    pending: Option<Vec<MoveId>>,
    result: Option<GameResult>,
    history: Vec<Snapshot>,
}

impl Game {
    pub fn new() -> Game {
        Game {
            board: Board::new(),
            current: Player::X,
            moves_by: [0; 2],
            pending: None,
            result: None,
            history: Vec::new(),
        }
    }

    /// The underlying board, for rendering and queries.
    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// The player whose turn it is.
    #[inline]
    pub fn current_player(&self) -> Player {
        self.current
    }

    /// Number of quantum moves `player` has placed.
    #[inline]
    pub fn moves_placed(&self, player: Player) -> u32 {
        self.moves_by[player as usize]
    }

    /// Final result, once the game is over.
    #[inline]
    pub fn result(&self) -> Option<GameResult> {
        self.result
    }

    #[inline]
    pub fn is_over(&self) -> bool {
        self.result.is_some()
    }

    /// The detected cycle awaiting collapse resolution, if any.
    pub fn pending_cycle(&self) -> Option<&[MoveId]> {
        self.pending.as_deref()
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            board: self.board.clone(),
            current: self.current,
            moves_by: self.moves_by,
            pending: self.pending.clone(),
            result: self.result,
        }
    }

    /// Place the current player's move across cells `a` and `b`.
    ///
    /// On success the turn passes to the opponent. If the move closed a
    /// cycle the game enters a pending state: the non-triggering player
    /// must name the winning cell via [`Game::resolve_collapse`] before
    /// anyone can place again.
    pub fn place(&mut self, a: Pos, b: Pos) -> TurnOutcome {
        if self.result.is_some() || self.pending.is_some() || !self.board.accepts(a, b) {
            debug!("placement ({}, {}) rejected", a.0, b.0);
            return TurnOutcome::Rejected;
        }
        self.history.push(self.snapshot());

        let mover = self.current;
        let number = self.moves_by[mover as usize] + 1;
        let id = self.board.new_move(number, mover, a, b);
        let cycle = self.board.detect_cycle(id);
        let placed = self.board.try_place(id);
        debug_assert!(placed, "accepts() pre-checked this placement");

        self.moves_by[mover as usize] += 1;
        self.current = mover.opponent();
        debug!("{} placed across {} and {}", self.board.mov(id).label(), a.0, b.0);

        match cycle {
            None => TurnOutcome::Placed(id),
            Some(cycle) => {
                info!("move {} closed a cycle of {} moves", self.board.mov(id).label(), cycle.len());
                self.pending = Some(cycle.clone());
                TurnOutcome::CycleClosed { id, cycle }
            }
        }
    }

    /// Resolve the pending cycle by naming the winning cell of its
    /// triggering move.
    ///
    /// Returns `false`, leaving the pending state intact, if no collapse
    /// is pending or `winner` is not an endpoint of the triggering move.
    pub fn resolve_collapse(&mut self, winner: Pos) -> bool {
        let cycle = match self.pending.take() {
            Some(cycle) => cycle,
            None => return false,
        };
        let trigger = *cycle.last().expect("pending cycle is never empty");
        if !self.board.mov(trigger).touches(winner) {
            self.pending = Some(cycle);
            return false;
        }

        let winners = self.board.orient_cycle(&cycle, winner);
        self.board.collapse_cycle(&cycle, &winners);
        info!("cycle collapsed, triggering move won cell {}", winner.0);
        self.check_for_win();
        true
    }

    /// Place a move and, if it closes a cycle, let `chooser` resolve the
    /// collapse immediately.
    ///
    /// # Panics
    ///
    /// Panics if the chooser returns a cell that is not an endpoint of the
    /// triggering move.
    pub fn play(&mut self, a: Pos, b: Pos, chooser: &mut dyn CollapseChooser) -> TurnOutcome {
        let outcome = self.place(a, b);
        if let TurnOutcome::CycleClosed { ref cycle, .. } = outcome {
            // After place() the turn has passed, so `current` is the
            // non-triggering player.
            let winner = chooser.choose(self.current, &self.board, cycle);
            let resolved = self.resolve_collapse(winner);
            assert!(resolved, "chooser must return an endpoint of the triggering move");
        }
        outcome
    }

    /// Collapse with a caller-built mapping instead of the orientation of
    /// a single chosen cell. The mapping must cover every cycle move.
    pub fn apply_collapse(&mut self, cycle: &[MoveId], winner_by_move: &HashMap<MoveId, Pos>) {
        self.pending = None;
        self.board.collapse_cycle(cycle, winner_by_move);
        self.check_for_win();
    }

    /// Roll back to the state before the most recent placement.
    pub fn undo(&mut self) -> bool {
        let prev = match self.history.pop() {
            Some(prev) => prev,
            None => return false,
        };
        self.board = prev.board;
        self.current = prev.current;
        self.moves_by = prev.moves_by;
        self.pending = prev.pending;
        self.result = prev.result;
        debug!("undo: back to {}'s turn", self.current);
        true
    }

    /// Start over with an empty board and cleared history.
    pub fn reset(&mut self) {
        *self = Game::new();
    }

    fn check_for_win(&mut self) {
        let winners = self.board.get_winners();
        if !winners.is_empty() {
            self.result = Some(if winners.len() == 1 {
                GameResult::Win(winners.into_iter().next().expect("non-empty"))
            } else {
                // Both players hold a line; fewer quantum moves wins.
                let x = self.moves_by[Player::X as usize];
                let o = self.moves_by[Player::O as usize];
                if x < o {
                    GameResult::WinByFewerMoves(Player::X)
                } else if o < x {
                    GameResult::WinByFewerMoves(Player::O)
                } else {
                    GameResult::Draw
                }
            });
        } else if self.board.is_full() {
            self.result = Some(GameResult::Draw);
        }
        if let Some(result) = self.result {
            info!("game over: {:?}", result);
        }
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}
