use super::{io_ops, TdmCliError};
use crate::{
    config::TdmConfiguration,
    model::{
        aggregation::{FlowAggregator, FlowSummary, MarginalReportRow},
        calibration::{CalibrationResult, DecayCalibration},
        distribution::{ConvergenceReport, GravityBalancer, GravitySolution},
        friction::{FrictionFactorTable, TravelTimeMatrix},
        generation::{
            ProductionAttractionEngine, ProductionAttractionTable, PurposeTripEnds,
            TripPurposeModel,
        },
        survey::HouseholdRecord,
        zone::ZoneTable,
        TdmError, TripPurpose,
    },
};
use chrono::{DateTime, Utc};
use itertools::Itertools;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, path::Path};

/// distribution result of one purpose.
#[derive(Clone, Debug)]
pub struct PurposeResult {
    pub decay_rate: f64,
    pub solution: GravitySolution,
    pub calibration: Option<CalibrationResult>,
    pub summary: FlowSummary,
    pub marginals: Vec<MarginalReportRow>,
}

/// everything a run produces, before it is written.
#[derive(Clone, Debug)]
pub struct TdmOutputs {
    pub models: BTreeMap<TripPurpose, TripPurposeModel>,
    pub trip_ends: ProductionAttractionTable,
    pub results: BTreeMap<TripPurpose, PurposeResult>,
    /// purposes that failed on their own data or model, with the reason
    pub failures: BTreeMap<TripPurpose, String>,
}

/// contents of summary.json.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RunSummary {
    pub generated_at: DateTime<Utc>,
    pub purposes: Vec<PurposeSummary>,
    #[serde(default)]
    pub failed: Vec<PurposeFailure>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PurposeFailure {
    pub purpose: TripPurpose,
    pub error: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PurposeSummary {
    pub purpose: TripPurpose,
    pub decay_rate: f64,
    pub total_production: f64,
    pub total_attraction: f64,
    pub converged: bool,
    pub flows: FlowSummary,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub calibration: Option<CalibrationResult>,
}

/// fits one trip purpose model per configured purpose.
pub fn fit_models(
    households: &[HouseholdRecord],
    config: &TdmConfiguration,
) -> Result<BTreeMap<TripPurpose, TripPurposeModel>, TdmError> {
    config
        .purposes
        .iter()
        .map(|purpose| {
            let predictors = config.get_predictors(purpose);
            TripPurposeModel::fit(households, *purpose, &predictors, config.income_policy)
                .map(|model| (*purpose, model))
        })
        .collect()
}

/// trip generation followed by trip distribution for every configured purpose.
/// purposes are distributed in parallel when the configuration allows it.
pub fn run(
    zones: &ZoneTable,
    travel_times: &TravelTimeMatrix,
    models: BTreeMap<TripPurpose, TripPurposeModel>,
    config: &TdmConfiguration,
) -> Result<TdmOutputs, TdmError> {
    let models = config
        .purposes
        .iter()
        .map(|purpose| match models.get(purpose) {
            Some(model) => Ok((*purpose, model.clone())),
            None => Err(TdmError::ConfigurationError(format!(
                "no trip purpose model available for {purpose}"
            ))),
        })
        .collect::<Result<BTreeMap<_, _>, _>>()?;

    let engine = ProductionAttractionEngine::new(
        &models,
        zones,
        &config.attraction_rates,
        config.production_floor,
    );
    let mut failures: BTreeMap<TripPurpose, TdmError> = BTreeMap::new();
    let mut generated = BTreeMap::new();
    for purpose in models.keys() {
        match engine.compute_purpose(purpose) {
            Ok(ends) => {
                log::info!(
                    "{} generates {:.1} trips, attraction scale {:.4}",
                    ends.purpose,
                    ends.total_production(),
                    ends.scale
                );
                generated.insert(*purpose, ends);
            }
            Err(e) => record_failure(*purpose, e, &mut failures)?,
        }
    }
    let trip_ends = ProductionAttractionTable(generated);

    let distribute_purpose = |(purpose, ends): (&TripPurpose, &PurposeTripEnds)| {
        (*purpose, distribute(*purpose, ends, zones, travel_times, config))
    };
    let distributed: Vec<(TripPurpose, Result<PurposeResult, TdmError>)> = if config.parallelize {
        trip_ends.0.par_iter().map(distribute_purpose).collect()
    } else {
        trip_ends.0.iter().map(distribute_purpose).collect()
    };
    let mut results = BTreeMap::new();
    for (purpose, result) in distributed.into_iter() {
        match result {
            Ok(r) => {
                results.insert(purpose, r);
            }
            Err(e) => record_failure(purpose, e, &mut failures)?,
        }
    }

    if results.is_empty() {
        if let Some((_, error)) = failures.into_iter().next() {
            return Err(error);
        }
        return Err(TdmError::ConfigurationError(String::from(
            "no trip purposes to run",
        )));
    }
    let failures = failures
        .into_iter()
        .map(|(purpose, error)| (purpose, error.to_string()))
        .collect();

    Ok(TdmOutputs {
        models,
        trip_ends,
        results,
        failures,
    })
}

/// keeps a purpose-fatal error local to its purpose. any other error ends the run.
fn record_failure(
    purpose: TripPurpose,
    error: TdmError,
    failures: &mut BTreeMap<TripPurpose, TdmError>,
) -> Result<(), TdmError> {
    if error.is_recoverable() {
        log::error!("{purpose} failed with require_convergence set: {error}");
        Err(error)
    } else if error.is_purpose_fatal() {
        log::error!("{purpose} failed, continuing with remaining purposes: {error}");
        failures.insert(purpose, error);
        Ok(())
    } else {
        Err(error)
    }
}

/// solves the gravity model of one purpose, calibrating its decay rate first
/// when configured to and an observed mean trip time is available.
pub fn distribute(
    purpose: TripPurpose,
    ends: &PurposeTripEnds,
    zones: &ZoneTable,
    travel_times: &TravelTimeMatrix,
    config: &TdmConfiguration,
) -> Result<PurposeResult, TdmError> {
    let observed = config.get_observed_average_time(&purpose);
    let (decay_rate, calibration) = match observed {
        Some(obs) if config.calibrate_decay => {
            let result = DecayCalibration::new(
                purpose,
                &ends.productions,
                &ends.balanced_attractions,
                zones,
                travel_times,
                config.solver.clone(),
                config.calibration.clone(),
            )
            .calibrate(obs)?;
            (result.decay_rate, Some(result))
        }
        _ => (config.decay_rates.get_rate(&purpose)?, None),
    };

    let friction = FrictionFactorTable::with_decay_rate(purpose, travel_times, decay_rate)?;
    let balancer = GravityBalancer::new(
        purpose,
        ends.productions.clone(),
        ends.balanced_attractions.clone(),
        friction,
        config.solver.clone(),
    )?;
    let solution = balancer.solve();
    if config.require_convergence {
        solution.ensure_converged(zones)?;
    }

    let aggregator = FlowAggregator::new(zones, travel_times);
    let summary = aggregator.summarize(&solution.flows, &config.aggregation, observed)?;
    let marginals = aggregator.marginal_report(
        &solution.flows,
        &ends.productions,
        &ends.balanced_attractions,
    );
    Ok(PurposeResult {
        decay_rate,
        solution,
        calibration,
        summary,
        marginals,
    })
}

/// writes the production/attraction table, per-purpose flows and marginal
/// reports, and the models, convergence and summary JSON files.
pub fn write_outputs(
    outputs: &TdmOutputs,
    zones: &ZoneTable,
    output_directory: &Path,
) -> Result<(), TdmCliError> {
    std::fs::create_dir_all(output_directory)?;
    io_ops::write_csv(
        &output_directory.join("productions_attractions.csv"),
        &outputs.trip_ends.rows(zones),
        "writing productions_attractions.csv",
    )?;
    for (purpose, result) in outputs.results.iter() {
        let flows_filename = format!("flows_{purpose}.csv");
        io_ops::write_csv(
            &output_directory.join(&flows_filename),
            &result.solution.flows.rows(zones),
            &format!("writing {flows_filename}"),
        )?;
        let marginals_filename = format!("marginals_{purpose}.csv");
        io_ops::write_csv(
            &output_directory.join(&marginals_filename),
            &result.marginals,
            &format!("writing {marginals_filename}"),
        )?;
    }

    let models = outputs.models.values().collect_vec();
    io_ops::write_json(&output_directory.join("models.json"), &models)?;
    let convergence: Vec<ConvergenceReport> = outputs
        .results
        .values()
        .map(|r| r.solution.report(zones))
        .collect();
    io_ops::write_json(&output_directory.join("convergence.json"), &convergence)?;
    io_ops::write_json(
        &output_directory.join("summary.json"),
        &run_summary(outputs),
    )?;
    Ok(())
}

pub fn run_summary(outputs: &TdmOutputs) -> RunSummary {
    let purposes = outputs
        .results
        .iter()
        .map(|(purpose, result)| {
            let (total_production, total_attraction) = match outputs.trip_ends.get(purpose) {
                Some(ends) => (ends.total_production(), ends.total_balanced_attraction()),
                None => (0.0, 0.0),
            };
            PurposeSummary {
                purpose: *purpose,
                decay_rate: result.decay_rate,
                total_production,
                total_attraction,
                converged: result.solution.is_converged(),
                flows: result.summary.clone(),
                calibration: result.calibration.clone(),
            }
        })
        .collect_vec();
    let failed = outputs
        .failures
        .iter()
        .map(|(purpose, error)| PurposeFailure {
            purpose: *purpose,
            error: error.clone(),
        })
        .collect_vec();
    RunSummary {
        generated_at: Utc::now(),
        purposes,
        failed,
    }
}
