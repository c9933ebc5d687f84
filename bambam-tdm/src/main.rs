use bambam_tdm::{
    app::{io_ops, tdm_run, TdmCliError},
    config::TdmConfiguration,
    model::{aggregation::FlowAggregator, TripPurpose},
};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::Path;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct TdmAppArguments {
    #[command(subcommand)]
    app: App,
}

#[derive(Subcommand)]
pub enum App {
    /// fit trip purpose models from household survey microdata
    Fit {
        #[arg(long, help = "path to household survey CSV")]
        survey_file: String,
        #[arg(long, help = "path to file with bambam-tdm parameters")]
        configuration_file: Option<String>,
        #[arg(long, help = "output path for fitted models JSON")]
        output_file: String,
    },
    /// run trip generation and gravity model distribution
    Run {
        #[arg(long, help = "path to zone attribute CSV")]
        zones_file: String,
        #[arg(long, help = "path to household survey CSV, used to fit models")]
        survey_file: Option<String>,
        #[arg(long, help = "path to previously fitted models JSON, used instead of a survey")]
        models_file: Option<String>,
        #[arg(long, help = "path to origin,destination,time travel time CSV")]
        travel_times_file: String,
        #[arg(long, help = "path to file with bambam-tdm parameters")]
        configuration_file: Option<String>,
        #[arg(long, help = "output directory for run results")]
        output_directory: String,
    },
    /// summarize a flow file written by a previous run
    Summarize {
        #[arg(long, help = "path to zone attribute CSV")]
        zones_file: String,
        #[arg(long, help = "path to origin,destination,time travel time CSV")]
        travel_times_file: String,
        #[arg(long, help = "path to origin,destination,flow CSV")]
        flows_file: String,
        #[arg(long, value_enum, help = "trip purpose of the flow file")]
        purpose: TripPurpose,
        #[arg(long, help = "path to file with bambam-tdm parameters")]
        configuration_file: Option<String>,
    },
}

fn read_configuration(configuration_file: &Option<String>) -> Result<TdmConfiguration, TdmCliError> {
    match configuration_file {
        None => Ok(TdmConfiguration::default()),
        Some(f) => {
            log::info!("reading bambam-tdm configuration from {f}");
            TdmConfiguration::try_from(f)
        }
    }
}

pub fn run(app: &App) -> Result<(), TdmCliError> {
    env_logger::init();
    log::info!("starting bambam-tdm at {}", Utc::now());
    match app {
        App::Fit {
            survey_file,
            configuration_file,
            output_file,
        } => {
            let conf = read_configuration(configuration_file)?;
            let households = io_ops::read_households(Path::new(survey_file))?;
            let models = tdm_run::fit_models(&households, &conf)?;
            let models = models.values().collect::<Vec<_>>();
            io_ops::write_json(Path::new(output_file), &models)?;
            eprintln!("finished.");
            Ok(())
        }
        App::Run {
            zones_file,
            survey_file,
            models_file,
            travel_times_file,
            configuration_file,
            output_directory,
        } => {
            let conf = read_configuration(configuration_file)?;
            let zones = io_ops::read_zones(Path::new(zones_file), conf.imputation_policy)?;
            let travel_times = io_ops::read_travel_times(Path::new(travel_times_file), &zones)?;
            let models = match (models_file, survey_file) {
                (Some(f), _) => io_ops::read_models(Path::new(f))?,
                (None, Some(f)) => {
                    let households = io_ops::read_households(Path::new(f))?;
                    tdm_run::fit_models(&households, &conf)?
                }
                (None, None) => {
                    return Err(TdmCliError::ConfigurationError(String::from(
                        "run requires either --survey-file or --models-file",
                    )))
                }
            };
            let outputs = tdm_run::run(&zones, &travel_times, models, &conf)?;
            match tdm_run::write_outputs(&outputs, &zones, Path::new(output_directory)) {
                Ok(_) => {
                    eprintln!("finished.");
                    Ok(())
                }
                Err(e) => {
                    log::error!("bambam-tdm failed: {e}");
                    Err(e)
                }
            }
        }
        App::Summarize {
            zones_file,
            travel_times_file,
            flows_file,
            purpose,
            configuration_file,
        } => {
            let conf = read_configuration(configuration_file)?;
            let zones = io_ops::read_zones(Path::new(zones_file), conf.imputation_policy)?;
            let travel_times = io_ops::read_travel_times(Path::new(travel_times_file), &zones)?;
            let flows = io_ops::read_flows(Path::new(flows_file), *purpose, &zones)?;
            let summary = FlowAggregator::new(&zones, &travel_times).summarize(
                &flows,
                &conf.aggregation,
                conf.get_observed_average_time(purpose),
            )?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
    }
}

fn main() {
    let args = TdmAppArguments::parse();
    if let Err(e) = run(&args.app) {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
