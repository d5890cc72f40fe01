use crate::infra::build_service;
use crate::server;
use btm_qualifier::config::AppConfig;
use btm_qualifier::error::AppError;
use btm_qualifier::settings::Settings;
use btm_qualifier::telemetry;
use btm_qualifier::workflows::qualification::Report;
use clap::{Args, Parser, Subcommand};
use std::io::Write;

#[derive(Parser, Debug)]
#[command(
    name = "BTM Location Qualifier",
    about = "Check retail addresses against Bitcoin ATM placement requirements",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Qualify a single address and print the result
    Qualify(QualifyArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Args, Debug)]
pub(crate) struct QualifyArgs {
    /// Street address of the candidate store
    pub(crate) address: String,
    /// Print the raw result as JSON instead of the text report
    #[arg(long)]
    pub(crate) json: bool,
    /// Minimum population density (people per square mile)
    #[arg(long)]
    pub(crate) min_density: Option<f64>,
    /// Kiosk search radius in miles
    #[arg(long)]
    pub(crate) radius: Option<f64>,
}

impl QualifyArgs {
    fn settings(&self, defaults: Settings) -> Settings {
        Settings {
            minimum_population_density: self
                .min_density
                .unwrap_or(defaults.minimum_population_density),
            search_radius_miles: self.radius.unwrap_or(defaults.search_radius_miles),
        }
    }
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Qualify(args) => run_qualify(args).await,
    }
}

async fn run_qualify(args: QualifyArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let service = build_service(&config)?;
    let settings = args.settings(config.defaults);
    let result = service.qualify(&args.address, &settings).await?;

    let mut stdout = std::io::stdout().lock();
    if args.json {
        serde_json::to_writer_pretty(&mut stdout, &result).map_err(std::io::Error::from)?;
        writeln!(stdout)?;
    } else {
        write!(stdout, "{}", Report(&result))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["btm-qualifier-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn qualify_flags_override_configured_defaults() {
        let cli = Cli::try_parse_from([
            "btm-qualifier-api",
            "qualify",
            "1200 Grand Ave, Des Moines, IA",
            "--min-density",
            "750",
            "--json",
        ])
        .expect("parses");

        let Some(Command::Qualify(args)) = cli.command else {
            panic!("expected qualify command");
        };
        assert!(args.json);
        assert_eq!(args.address, "1200 Grand Ave, Des Moines, IA");

        let settings = args.settings(Settings {
            minimum_population_density: 1_000.0,
            search_radius_miles: 2.0,
        });
        assert_eq!(settings.minimum_population_density, 750.0);
        assert_eq!(settings.search_radius_miles, 2.0);
    }
}
