use super::TdmCliError;
use crate::model::{
    distribution::{Flow, FlowMatrix, FlowRow},
    friction::{TravelTimeMatrix, TravelTimeRecord},
    generation::TripPurposeModel,
    survey::HouseholdRecord,
    zone::{ImputationPolicy, ZoneId, ZoneRecord, ZoneTable},
    TdmError, TripPurpose,
};
use itertools::Itertools;
use kdam::tqdm;
use serde::{de::DeserializeOwned, Serialize};
use std::{collections::BTreeMap, io::Read, path::Path};

/// reads the zone table CSV and builds the zone table.
pub fn read_zones(path: &Path, policy: ImputationPolicy) -> Result<ZoneTable, TdmCliError> {
    let records: Vec<ZoneRecord> = read_csv_rows(open_csv(path)?, "read zones")?;
    log::info!("read {} zones from {}", records.len(), path.to_string_lossy());
    Ok(ZoneTable::new(records, policy)?)
}

/// reads household survey microdata.
pub fn read_households(path: &Path) -> Result<Vec<HouseholdRecord>, TdmCliError> {
    let households: Vec<HouseholdRecord> = read_csv_rows(open_csv(path)?, "read survey")?;
    log::info!(
        "read {} survey households from {}",
        households.len(),
        path.to_string_lossy()
    );
    Ok(households)
}

/// reads the (origin, destination, time) skim and resolves it against the zone table.
pub fn read_travel_times(path: &Path, zones: &ZoneTable) -> Result<TravelTimeMatrix, TdmCliError> {
    let records: Vec<TravelTimeRecord> = read_csv_rows(open_csv(path)?, "read travel times")?;
    let matrix = TravelTimeMatrix::new(&records, zones)?;
    log::info!(
        "read {} zone pairs with travel times from {}",
        matrix.len(),
        path.to_string_lossy()
    );
    Ok(matrix)
}

/// reads a flow file written by a previous run back into a flow matrix.
pub fn read_flows(
    path: &Path,
    purpose: TripPurpose,
    zones: &ZoneTable,
) -> Result<FlowMatrix, TdmCliError> {
    let rows: Vec<FlowRow> = read_csv_rows(open_csv(path)?, "read flows")?;
    Ok(flow_matrix_from_rows(purpose, &rows, zones)?)
}

pub fn flow_matrix_from_rows(
    purpose: TripPurpose,
    rows: &[FlowRow],
    zones: &ZoneTable,
) -> Result<FlowMatrix, TdmError> {
    let lookup = |id: &str, role: &str| {
        zones
            .index_of(&ZoneId::new(id))
            .ok_or_else(|| TdmError::UnknownZone(id.to_string(), role.to_string()))
    };
    let flows = rows
        .iter()
        .map(|row| {
            Ok(Flow {
                origin: lookup(&row.origin, "flow origin")?,
                destination: lookup(&row.destination, "flow destination")?,
                flow: row.flow,
            })
        })
        .collect::<Result<Vec<_>, TdmError>>()?;
    Ok(FlowMatrix::new(purpose, zones.len(), flows))
}

/// reads models previously written to models.json.
pub fn read_models(path: &Path) -> Result<BTreeMap<TripPurpose, TripPurposeModel>, TdmCliError> {
    let s = std::fs::read_to_string(path)?;
    let models: Vec<TripPurposeModel> = serde_json::from_str(&s)?;
    Ok(models.into_iter().map(|m| (m.purpose, m)).collect())
}

/// deserializes every row of a headered CSV, failing on the first row that
/// cannot be decoded (including rows missing a required column).
pub fn read_csv_rows<R, T>(mut reader: csv::Reader<R>, desc: &str) -> Result<Vec<T>, TdmCliError>
where
    R: Read,
    T: DeserializeOwned,
{
    let row_iter = tqdm!(reader.deserialize::<T>(), desc = desc);
    let rows = row_iter.collect::<Result<Vec<T>, csv::Error>>()?;
    eprintln!();
    Ok(rows)
}

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T], desc: &str) -> Result<(), TdmCliError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_path(path)?;
    let write_iter = tqdm!(rows.iter(), desc = desc, total = rows.len());
    for row in write_iter {
        writer.serialize(row)?;
    }
    writer.flush()?;
    eprintln!();
    Ok(())
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), TdmCliError> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    log::info!("wrote {}", path.to_string_lossy());
    Ok(())
}

fn open_csv(path: &Path) -> Result<csv::Reader<std::fs::File>, TdmCliError> {
    let reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)?;
    Ok(reader)
}
