//! Market data access port trait.

use crate::domain::error::PapertraderError;
use crate::domain::instrument::Instrument;
use crate::domain::series::MarketTick;

pub trait DataPort {
    fn load_instruments(&self) -> Result<Vec<Instrument>, PapertraderError>;

    /// Ticks in file order (expected chronological). `symbols` filters when
    /// non-empty; `limit` caps the number of ticks returned.
    fn load_ticks(
        &self,
        symbols: &[String],
        limit: Option<usize>,
    ) -> Result<Vec<MarketTick>, PapertraderError>;
}
