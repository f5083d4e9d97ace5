use crate::errors::InvalidForecastRow;
use crate::external_conditions::WeatherHour;
use csv::ReaderBuilder as CsvReaderBuilder;
use std::io::Read;

/// Read an hourly forecast from CSV with a header row naming at least `time` and `temp`
/// (or `outdoorTemp`), plus optional `humidity` and `dtHours` columns. Times are local ISO
/// datetimes such as `2025-01-06T05:00:00`; an empty humidity cell means "not reported".
pub fn forecast_from_csv(file: impl Read) -> anyhow::Result<Vec<WeatherHour>> {
    let mut reader = CsvReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);

    reader
        .deserialize::<WeatherHour>()
        .enumerate()
        .map(|(i, row)| {
            // header is line 1
            row.map_err(|err| anyhow::Error::from(InvalidForecastRow::new(i + 2, err)))
        })
        .collect()
}
