//! Opening explorer data types

use serde::Deserialize;

#[derive(Debug, Clone, Default)]
pub struct LookupParams {
    pub rating: Option<RatingBand>,
    pub max_moves: Option<u32>,
}

impl LookupParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rating(mut self, band: RatingBand) -> Self {
        self.rating = Some(band);
        self
    }

    pub fn max_moves(mut self, count: u32) -> Self {
        self.max_moves = Some(count);
        self
    }
}

/// Rating bucket filtering which games feed the statistics. Values are
/// the explorer's bucket lower bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingBand {
    R400,
    R1000,
    R1200,
    R1400,
    R1600,
    R1800,
    R2000,
    R2200,
    R2500,
}

impl RatingBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            RatingBand::R400 => "400",
            RatingBand::R1000 => "1000",
            RatingBand::R1200 => "1200",
            RatingBand::R1400 => "1400",
            RatingBand::R1600 => "1600",
            RatingBand::R1800 => "1800",
            RatingBand::R2000 => "2000",
            RatingBand::R2200 => "2200",
            RatingBand::R2500 => "2500",
        }
    }

    /// Parses a bucket lower bound, e.g. `"1600"`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "400" => Some(RatingBand::R400),
            "1000" => Some(RatingBand::R1000),
            "1200" => Some(RatingBand::R1200),
            "1400" => Some(RatingBand::R1400),
            "1600" => Some(RatingBand::R1600),
            "1800" => Some(RatingBand::R1800),
            "2000" => Some(RatingBand::R2000),
            "2200" => Some(RatingBand::R2200),
            "2500" => Some(RatingBand::R2500),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerResponse {
    #[serde(default)]
    pub white: u64,
    #[serde(default)]
    pub draws: u64,
    #[serde(default)]
    pub black: u64,
    #[serde(default)]
    pub moves: Vec<ExplorerMove>,
    #[serde(default)]
    pub opening: Option<Opening>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerMove {
    pub uci: String,
    pub san: String,
    #[serde(default)]
    pub average_rating: Option<u32>,
    pub white: u64,
    pub draws: u64,
    pub black: u64,
}

impl ExplorerMove {
    pub fn total_games(&self) -> u64 {
        self.white + self.draws + self.black
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Opening {
    pub eco: String,
    pub name: String,
}
