use async_trait::async_trait;
use core_types::{DataError, Instrument, InstrumentRepository};

/// The instrument list as configured.
#[derive(Debug, Clone, Default)]
pub struct StaticInstrumentRepository {
    instruments: Vec<Instrument>,
}

impl StaticInstrumentRepository {
    pub fn new(instruments: Vec<Instrument>) -> Self {
        Self { instruments }
    }
}

#[async_trait]
impl InstrumentRepository for StaticInstrumentRepository {
    async fn get_instruments(&self) -> Result<Vec<Instrument>, DataError> {
        Ok(self.instruments.clone())
    }
}
