use super::{ImputationPolicy, ZoneId, ZoneRecord};
use crate::model::{Predictor, TdmError};
use crate::util::stats_ops;
use std::collections::HashMap;

const ZONE_PREDICTORS: [Predictor; 5] = [
    Predictor::Log2Income,
    Predictor::HasChildren,
    Predictor::HasElderly,
    Predictor::OwnsHome,
    Predictor::HasVehicle,
];

/// the validated, immutable zone attribute table. zones are addressed by a
/// dense index in input order, which is the index used by every downstream
/// table.
#[derive(Clone, Debug)]
pub struct ZoneTable {
    zones: Vec<ZoneRecord>,
    lookup: HashMap<ZoneId, usize>,
    imputation_policy: ImputationPolicy,
    region_medians: HashMap<Predictor, f64>,
}

impl ZoneTable {
    /// validates the records and precomputes the region-wide medians used to
    /// impute missing predictor values.
    pub fn new(
        zones: Vec<ZoneRecord>,
        imputation_policy: ImputationPolicy,
    ) -> Result<ZoneTable, TdmError> {
        if zones.is_empty() {
            return Err(TdmError::InvalidZoneData(String::from(
                "zone table contains no zones",
            )));
        }
        let mut lookup: HashMap<ZoneId, usize> = HashMap::with_capacity(zones.len());
        for (idx, zone) in zones.iter().enumerate() {
            zone.validate().map_err(TdmError::InvalidZoneData)?;
            if lookup.insert(zone.zone_id.clone(), idx).is_some() {
                return Err(TdmError::InvalidZoneData(format!(
                    "duplicate zone_id {}",
                    zone.zone_id
                )));
            }
        }

        let region_medians = ZONE_PREDICTORS
            .into_iter()
            .filter_map(|p| {
                let observed = zones
                    .iter()
                    .filter(|z| z.households > 0.0)
                    .filter_map(|z| z.observed_predictor(&p));
                stats_ops::median(observed).map(|m| (p, m))
            })
            .collect::<HashMap<_, _>>();

        let table = ZoneTable {
            zones,
            lookup,
            imputation_policy,
            region_medians,
        };
        table.log_imputation();
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn zones(&self) -> &[ZoneRecord] {
        &self.zones
    }

    pub fn get(&self, index: usize) -> Option<&ZoneRecord> {
        self.zones.get(index)
    }

    pub fn zone_id(&self, index: usize) -> Option<&ZoneId> {
        self.zones.get(index).map(|z| &z.zone_id)
    }

    pub fn index_of(&self, zone_id: &ZoneId) -> Option<usize> {
        self.lookup.get(zone_id).copied()
    }

    pub fn zone_ids(&self) -> impl Iterator<Item = &ZoneId> + '_ {
        self.zones.iter().map(|z| &z.zone_id)
    }

    /// the zone-aggregate predictor value for the zone at `index`, imputed
    /// according to this table's [`ImputationPolicy`] when the zone does not
    /// provide it.
    pub fn get_predictor(&self, index: usize, predictor: &Predictor) -> Result<f64, TdmError> {
        let zone = self.zones.get(index).ok_or_else(|| {
            TdmError::InternalError(format!("zone index {index} out of bounds"))
        })?;
        if let Some(value) = zone.observed_predictor(predictor) {
            return Ok(value);
        }
        match self.imputation_policy {
            ImputationPolicy::Fail => Err(TdmError::InvalidZoneData(format!(
                "zone {} has no usable value for predictor {predictor}",
                zone.zone_id
            ))),
            ImputationPolicy::RegionMedian => {
                self.region_medians.get(predictor).copied().ok_or_else(|| {
                    TdmError::InvalidZoneData(format!(
                        "no zone provides predictor {predictor}, cannot impute a region median"
                    ))
                })
            }
        }
    }

    /// the number of zones with households that will have `predictor` imputed.
    pub fn missing_count(&self, predictor: &Predictor) -> usize {
        self.zones
            .iter()
            .filter(|z| z.households > 0.0 && z.observed_predictor(predictor).is_none())
            .count()
    }

    /// the number of zones with a median income that is present but not
    /// positive. these zones are treated as missing an income predictor.
    pub fn non_positive_income_count(&self) -> usize {
        self.zones
            .iter()
            .filter(|z| matches!(z.median_income, Some(income) if income <= 0.0))
            .count()
    }

    fn log_imputation(&self) {
        let non_positive = self.non_positive_income_count();
        if non_positive > 0 {
            log::warn!(
                "{non_positive} zones have a non-positive median_income, treating it as missing"
            );
        }
        for predictor in ZONE_PREDICTORS.iter() {
            let missing = self.missing_count(predictor);
            if missing == 0 {
                continue;
            }
            match (self.imputation_policy, self.region_medians.get(predictor)) {
                (ImputationPolicy::RegionMedian, Some(median)) => log::warn!(
                    "{missing} of {} zones have no value for {predictor}, imputing region median {median:.4}",
                    self.zones.len()
                ),
                _ => log::warn!(
                    "{missing} of {} zones have no value for {predictor} and cannot be imputed",
                    self.zones.len()
                ),
            }
        }
    }
}
