//! Price data access port.

use chrono::NaiveDate;

use crate::domain::error::AdaptraderError;
use crate::domain::price::PricePoint;

/// The only thing the core asks of a data collaborator: an ordered daily
/// price series for one symbol.
pub trait PriceDataPort {
    fn fetch_prices(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PricePoint>, AdaptraderError>;
}
