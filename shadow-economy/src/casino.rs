//! Casino games: wager parsing and payout resolution.
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::catalog::CasinoGame;
use crate::error::Conflict;

const ROULETTE_RED: [u8; 18] = [
    1, 3, 5, 7, 9, 12, 14, 16, 18, 19, 21, 23, 25, 27, 30, 32, 34, 36,
];
const ROULETTE_BLACK: [u8; 18] = [
    2, 4, 6, 8, 10, 11, 13, 15, 17, 20, 22, 24, 26, 28, 29, 31, 33, 35,
];
const ROULETTE_MAX: u8 = 36;
const EVEN_MONEY: f64 = 2.0;
const DICE_SEVEN_PAYOUT: f64 = 5.0;
const ROULETTE_STRAIGHT_PAYOUT: f64 = 36.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoinSide {
    Heads,
    Tails,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiceCall {
    Over,
    Under,
    Seven,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouletteCall {
    Red,
    Black,
    Even,
    Odd,
    Number(i64),
    /// Unrecognized call; the stake is taken and never pays.
    Void,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotSymbol {
    Cherry,
    Lemon,
    Bell,
    Diamond,
    Seven,
    Clover,
}

impl SlotSymbol {
    const REEL: [Self; 6] = [
        Self::Cherry,
        Self::Lemon,
        Self::Bell,
        Self::Diamond,
        Self::Seven,
        Self::Clover,
    ];

    /// Bet multiplier for three of this symbol.
    #[must_use]
    pub const fn triple_payout(self) -> f64 {
        match self {
            Self::Cherry => 5.0,
            Self::Lemon => 8.0,
            Self::Bell => 12.0,
            Self::Diamond => 25.0,
            Self::Seven => 50.0,
            Self::Clover => 100.0,
        }
    }
}

/// A validated wager for one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "game", content = "call", rename_all = "snake_case")]
pub enum Wager {
    Coinflip(CoinSide),
    Dice(DiceCall),
    Slots,
    Roulette(RouletteCall),
}

impl Wager {
    /// Parse a client `choice` for `game`.
    ///
    /// # Errors
    ///
    /// Coinflip and dice reject unknown choices. Roulette accepts anything.
    pub fn parse(game: CasinoGame, choice: &str) -> Result<Self, Conflict> {
        let choice = choice.trim().to_ascii_lowercase();
        match game {
            CasinoGame::Coinflip => match choice.as_str() {
                "heads" => Ok(Self::Coinflip(CoinSide::Heads)),
                "tails" => Ok(Self::Coinflip(CoinSide::Tails)),
                _ => Err(Conflict::InvalidChoice(
                    "choice must be heads or tails".to_string(),
                )),
            },
            CasinoGame::Dice => match choice.as_str() {
                "over" => Ok(Self::Dice(DiceCall::Over)),
                "under" => Ok(Self::Dice(DiceCall::Under)),
                "seven" => Ok(Self::Dice(DiceCall::Seven)),
                _ => Err(Conflict::InvalidChoice(
                    "choice must be over, under or seven".to_string(),
                )),
            },
            CasinoGame::Slots => Ok(Self::Slots),
            CasinoGame::Roulette => Ok(Self::Roulette(match choice.as_str() {
                "red" => RouletteCall::Red,
                "black" => RouletteCall::Black,
                "even" => RouletteCall::Even,
                "odd" => RouletteCall::Odd,
                other => other.parse().map_or(RouletteCall::Void, RouletteCall::Number),
            })),
        }
    }

    #[must_use]
    pub const fn game(&self) -> CasinoGame {
        match self {
            Self::Coinflip(_) => CasinoGame::Coinflip,
            Self::Dice(_) => CasinoGame::Dice,
            Self::Slots => CasinoGame::Slots,
            Self::Roulette(_) => CasinoGame::Roulette,
        }
    }
}

/// What the table showed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "game", rename_all = "snake_case")]
pub enum TableResult {
    Coinflip { flip: CoinSide },
    Dice { dice: [u8; 2], total: u8 },
    Slots { reels: [SlotSymbol; 3] },
    Roulette { number: u8 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CasinoRound {
    pub result: TableResult,
    /// Gross amount returned, stake included; zero on a loss.
    pub payout: f64,
}

impl CasinoRound {
    #[must_use]
    pub fn net(&self, bet: f64) -> f64 {
        self.payout - bet
    }

    #[must_use]
    pub fn is_win(&self) -> bool {
        self.payout > 0.0
    }
}

fn slots_multiplier(reels: [SlotSymbol; 3]) -> f64 {
    if reels[0] == reels[1] && reels[1] == reels[2] {
        reels[0].triple_payout()
    } else if reels[0] == reels[1] || reels[1] == reels[2] {
        EVEN_MONEY
    } else {
        0.0
    }
}

fn roulette_multiplier(call: RouletteCall, number: u8) -> f64 {
    let hit = match call {
        RouletteCall::Red => ROULETTE_RED.contains(&number),
        RouletteCall::Black => ROULETTE_BLACK.contains(&number),
        RouletteCall::Even => number != 0 && number % 2 == 0,
        RouletteCall::Odd => number % 2 == 1,
        RouletteCall::Number(chosen) => i64::from(number) == chosen,
        RouletteCall::Void => false,
    };
    match (hit, call) {
        (false, _) => 0.0,
        (true, RouletteCall::Number(_)) => ROULETTE_STRAIGHT_PAYOUT,
        (true, _) => EVEN_MONEY,
    }
}

/// Play one round of `wager` for `bet`.
pub fn play<R: Rng + ?Sized>(wager: Wager, bet: f64, rng: &mut R) -> CasinoRound {
    let (result, multiplier) = match wager {
        Wager::Coinflip(side) => {
            let flip = if rng.gen_bool(0.5) {
                CoinSide::Heads
            } else {
                CoinSide::Tails
            };
            let multiplier = if flip == side { EVEN_MONEY } else { 0.0 };
            (TableResult::Coinflip { flip }, multiplier)
        }
        Wager::Dice(call) => {
            let dice = [rng.gen_range(1..=6u8), rng.gen_range(1..=6u8)];
            let total = dice[0] + dice[1];
            let multiplier = match call {
                DiceCall::Over if total > 7 => EVEN_MONEY,
                DiceCall::Under if total < 7 => EVEN_MONEY,
                DiceCall::Seven if total == 7 => DICE_SEVEN_PAYOUT,
                _ => 0.0,
            };
            (TableResult::Dice { dice, total }, multiplier)
        }
        Wager::Slots => {
            let mut spin = || *SlotSymbol::REEL.choose(rng).unwrap_or(&SlotSymbol::Cherry);
            let reels = [spin(), spin(), spin()];
            (TableResult::Slots { reels }, slots_multiplier(reels))
        }
        Wager::Roulette(call) => {
            let number = rng.gen_range(0..=ROULETTE_MAX);
            (
                TableResult::Roulette { number },
                roulette_multiplier(call, number),
            )
        }
    };
    CasinoRound {
        result,
        payout: bet * multiplier,
    }
}
