//! WASM bindings for qttt-core
//!
//! Provides a JavaScript-friendly API for driving a game from a browser
//! frontend. Collapse resolution is a two-step handshake: `place` reports
//! `"cycle"`, the frontend shows `pendingCycle()` to the choosing player,
//! then calls `resolveCollapse` with the chosen cell.

use wasm_bindgen::prelude::*;

use crate::game::{Game, GameResult, TurnOutcome};
use crate::{Player, Pos};

/// WASM-friendly wrapper around a running game.
#[wasm_bindgen]
pub struct WasmGame {
    inner: Game,
}

#[wasm_bindgen]
impl WasmGame {
    /// Start a new game. X moves first.
    #[wasm_bindgen(constructor)]
    pub fn new() -> WasmGame {
        WasmGame { inner: Game::new() }
    }

    /// Place the current player's move across cells `a` and `b` (0-8).
    /// Returns "placed", "cycle" (collapse pending), or "rejected".
    pub fn place(&mut self, a: u8, b: u8) -> String {
        if a > 8 || b > 8 {
            return "rejected".to_string();
        }
        match self.inner.place(Pos(a), Pos(b)) {
            TurnOutcome::Rejected => "rejected",
            TurnOutcome::Placed(_) => "placed",
            TurnOutcome::CycleClosed { .. } => "cycle",
        }
        .to_string()
    }

    /// The cycle awaiting resolution as a JSON array of
    /// `{ label, player, number, a, b }`, or an empty array.
    #[wasm_bindgen(js_name = pendingCycle)]
    pub fn pending_cycle(&self) -> JsValue {
        let moves: Vec<CycleMove> = self
            .inner
            .pending_cycle()
            .unwrap_or(&[])
            .iter()
            .map(|&id| {
                let mv = self.inner.board().mov(id);
                CycleMove {
                    label: mv.label(),
                    player: mv.player.symbol().to_string(),
                    number: mv.number,
                    a: mv.a.0,
                    b: mv.b.0,
                }
            })
            .collect();
        serde_wasm_bindgen::to_value(&moves).unwrap()
    }

    /// Resolve the pending collapse by naming the winning cell of the
    /// triggering move. Returns false for an invalid cell.
    #[wasm_bindgen(js_name = resolveCollapse)]
    pub fn resolve_collapse(&mut self, cell: u8) -> bool {
        cell <= 8 && self.inner.resolve_collapse(Pos(cell))
    }

    /// Textual content of a cell: collapsed symbol, comma-joined pending
    /// move labels, or "".
    #[wasm_bindgen(js_name = cellDisplay)]
    pub fn cell_display(&self, cell: u8) -> String {
        self.inner.board().cell_display(Pos(cell))
    }

    /// Whether a cell has collapsed to a classical symbol.
    #[wasm_bindgen(js_name = isCollapsed)]
    pub fn is_collapsed(&self, cell: u8) -> bool {
        self.inner.board().is_collapsed(Pos(cell))
    }

    /// Current player's symbol ("X" or "O").
    #[wasm_bindgen(js_name = currentPlayer)]
    pub fn current_player(&self) -> String {
        self.inner.current_player().symbol().to_string()
    }

    /// Game result: "ongoing", "x_wins", "o_wins", "x_wins_fewer_moves",
    /// "o_wins_fewer_moves", or "draw".
    pub fn result(&self) -> String {
        match self.inner.result() {
            None => "ongoing",
            Some(GameResult::Win(Player::X)) => "x_wins",
            Some(GameResult::Win(Player::O)) => "o_wins",
            Some(GameResult::WinByFewerMoves(Player::X)) => "x_wins_fewer_moves",
            Some(GameResult::WinByFewerMoves(Player::O)) => "o_wins_fewer_moves",
            Some(GameResult::Draw) => "draw",
        }
        .to_string()
    }

    #[wasm_bindgen(js_name = isOver)]
    pub fn is_over(&self) -> bool {
        self.inner.is_over()
    }

    #[wasm_bindgen(js_name = isFull)]
    pub fn is_full(&self) -> bool {
        self.inner.board().is_full()
    }

    /// Roll back the most recent placement.
    pub fn undo(&mut self) -> bool {
        self.inner.undo()
    }

    /// Start over.
    pub fn reset(&mut self) {
        self.inner.reset();
    }

    /// Render the 3x3 grid as text (for debugging).
    pub fn render(&self) -> String {
        format!("{}", self.inner.board())
    }
}

impl Default for WasmGame {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable cycle move for JavaScript.
#[derive(serde::Serialize)]
struct CycleMove {
    label: String,
    player: String,
    number: u32,
    a: u8,
    b: u8,
}
