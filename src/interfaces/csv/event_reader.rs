use crate::domain::event::PosEvent;
use crate::error::{PosError, Result};
use std::io::Read;

/// Reads POS session events from a CSV source.
///
/// Fields are trimmed and records may omit trailing columns, so a commit line
/// can be written as just `commit, <order>`.
pub struct EventReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> EventReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily deserializes events, one `Result` per record.
    pub fn events(self) -> impl Iterator<Item = Result<PosEvent>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(PosError::from))
    }
}
