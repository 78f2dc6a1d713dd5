use std::io;
use std::path::PathBuf;
use std::time::Instant;

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{debug, info};

use crime_analytics::analysis::{Summary, PREVIEW_ROWS};
use crime_analytics::config::Config;
use crime_analytics::dataset::DatasetStore;
use crime_analytics::forms::{
    CaseClosureForm, CrimeDomainForm, SelectionOptions, AGE_RANGE, POLICE_RANGE,
};
use crime_analytics::inference::{predict_case_closure, predict_crime_domain};
use crime_analytics::model::ModelRegistry;
use crime_analytics::telemetry::{init_logging, monitor_memory};
use crime_analytics::Result;

#[derive(Parser, Debug)]
#[command(author, version, about = "Crime analytics and prediction", long_about = None)]
#[command(propagate_version = true)]
struct CrimeAppArgs {
    #[arg(long, help = "Incident dataset (.csv or .parquet)")]
    data: Option<PathBuf>,
    #[arg(long, help = "Crime domain model artifact")]
    domain_model: Option<PathBuf>,
    #[arg(long, help = "Case closure model artifact")]
    closure_model: Option<PathBuf>,
    #[arg(short, long, action = clap::ArgAction::Count, help = "Verbose level")]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Case closure, victim gender, top cities and top crime types
    Summary {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// First rows of the dataset
    Preview {
        #[arg(short, long, default_value_t = PREVIEW_ROWS)]
        rows: usize,
    },
    /// Values accepted by each prediction input
    Options,
    /// Predict the crime domain of an incident
    PredictDomain(DomainArgs),
    /// Predict whether a case gets closed
    PredictClosure(ClosureArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Csv,
}

#[derive(Args, Debug)]
struct DomainArgs {
    #[arg(long)]
    city: String,
    #[arg(long)]
    age: Option<i64>,
    #[arg(long)]
    gender: String,
    #[arg(long)]
    weapon: String,
    #[arg(long)]
    description: String,
}

#[derive(Args, Debug)]
struct ClosureArgs {
    #[arg(long)]
    city: String,
    #[arg(long)]
    description: String,
    #[arg(long)]
    age: Option<i64>,
    #[arg(long)]
    gender: String,
    #[arg(long)]
    weapon: String,
    #[arg(long)]
    domain: String,
    #[arg(long)]
    police: Option<i64>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = CrimeAppArgs::parse();
    init_logging(cli.verbose);
    debug!("Arguments {:#?}", cli);

    let config = Config::default()
        .with_dataset(cli.data.clone())
        .with_models(cli.domain_model.clone(), cli.closure_model.clone());

    crime_app(config, cli.command).await
}

async fn crime_app(config: Config, command: Command) -> Result<()> {
    let start_time = Instant::now();
    let start_memory = monitor_memory();

    let store = DatasetStore::load(&config.dataset_path).await?;

    info!("startup took {:?}", start_time.elapsed());
    info!(
        "memory used: {} bytes",
        monitor_memory().saturating_sub(start_memory)
    );

    match command {
        Command::Summary { format } => {
            let summary = Summary::from_dataset(&store)?;
            match format {
                OutputFormat::Text => print!("{summary}"),
                OutputFormat::Csv => summary.write_csv(io::stdout())?,
            }
        }
        Command::Preview { rows } => {
            println!("{}", store.preview(rows));
        }
        Command::Options => {
            let options = SelectionOptions::from_dataset(&store)?;
            print_options("City", &options.cities);
            print_options("Victim Gender", &options.genders);
            print_options("Weapon Used", &options.weapons);
            print_options("Crime Description", &options.crime_descriptions);
            print_options("Crime Domain", &options.domains);
            println!("Victim Age: {}..={}", AGE_RANGE.start(), AGE_RANGE.end());
            println!(
                "Police Deployed: {}..={}",
                POLICE_RANGE.start(),
                POLICE_RANGE.end()
            );
        }
        Command::PredictDomain(args) => {
            let registry = load_registry(&config)?;
            let options = SelectionOptions::from_dataset(&store)?;
            let request = CrimeDomainForm {
                city: args.city,
                age: args.age,
                gender: args.gender,
                weapon: args.weapon,
                crime_description: args.description,
            }
            .submit(&options)?;
            let domain = predict_crime_domain(&registry, &request)?;
            println!("Predicted Crime Domain: {domain}");
        }
        Command::PredictClosure(args) => {
            let registry = load_registry(&config)?;
            let options = SelectionOptions::from_dataset(&store)?;
            let request = CaseClosureForm {
                city: args.city,
                age: args.age,
                gender: args.gender,
                weapon: args.weapon,
                domain: args.domain,
                crime_description: args.description,
                police_deployed: args.police,
            }
            .submit(&options)?;
            let state = predict_case_closure(&registry, &request)?;
            println!("Prediction: {state}");
        }
    }

    Ok(())
}

fn load_registry(config: &Config) -> Result<ModelRegistry> {
    let start_time = Instant::now();
    let registry = ModelRegistry::load(config)?;
    info!("models loaded in {:?}", start_time.elapsed());
    Ok(registry)
}

fn print_options<'a>(title: &str, values: impl IntoIterator<Item = &'a String>) {
    let values: Vec<&str> = values.into_iter().map(String::as_str).collect();
    println!("{title}: {}", values.join(", "));
}
