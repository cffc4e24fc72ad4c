//! Raw station records from the bulk price feed.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::catalog::StationUpdate;
use crate::domain::StationId;

use super::error::{EnrichError, InvalidRecord};

/// One row of the price feed.
///
/// CSV files use the feed's column headers; JSON imports may use the
/// snake_case aliases instead.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StationRecord {
    #[serde(rename = "OPIS Truckstop ID", alias = "id")]
    pub id: String,
    #[serde(rename = "Truckstop Name", alias = "name", default)]
    pub name: String,
    #[serde(rename = "Address", alias = "address", default)]
    pub address: String,
    #[serde(rename = "City", alias = "city", default)]
    pub city: String,
    #[serde(rename = "State", alias = "state", default)]
    pub state: String,
    #[serde(rename = "Rack ID", alias = "rack_id", default)]
    pub rack_id: Option<String>,
    /// USD per gallon. Empty means unknown.
    #[serde(rename = "Retail Price", alias = "price", default)]
    pub price: Option<f64>,
}

impl StationRecord {
    /// Validate the record into a catalog update.
    pub fn into_update(self) -> Result<StationUpdate, InvalidRecord> {
        let id = StationId::parse(&self.id).map_err(|e| InvalidRecord::new(e.to_string()))?;

        if let Some(price) = self.price {
            if !price.is_finite() || price < 0.0 {
                return Err(InvalidRecord::new(format!(
                    "station {}: price {} is not a valid amount",
                    id, price
                )));
            }
        }

        let address = self.address.trim().to_string();
        let city = self.city.trim().to_string();
        let state = self.state.trim().to_string();
        if address.is_empty() && city.is_empty() && state.is_empty() {
            return Err(InvalidRecord::new(format!("station {id}: address is empty")));
        }

        let rack_id = self
            .rack_id
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());

        Ok(StationUpdate {
            id,
            name: self.name.trim().to_string(),
            address,
            city,
            state,
            rack_id,
            price: self.price,
        })
    }
}

/// Read every row of a price-feed CSV.
///
/// Failing to open the file or read its header is an error. A row that
/// cannot be deserialized becomes an `Err` entry so the rest of the batch
/// still runs.
pub fn read_csv(path: impl AsRef<Path>) -> Result<Vec<Result<StationRecord, InvalidRecord>>, EnrichError> {
    let file = std::fs::File::open(path.as_ref()).map_err(csv::Error::from)?;
    from_reader(file)
}

/// Read price-feed rows from any reader. See [`read_csv`].
pub fn from_reader<R: Read>(reader: R) -> Result<Vec<Result<StationRecord, InvalidRecord>>, EnrichError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    reader.headers()?;

    Ok(reader
        .deserialize::<StationRecord>()
        .map(|row| row.map_err(InvalidRecord::from))
        .collect())
}
