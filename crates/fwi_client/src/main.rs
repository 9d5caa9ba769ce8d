//! FWI client CLI
//!
//! Issues a single prediction request built from command-line readings.

use anyhow::Result;
use clap::Parser;
use fwi_client::{ClientError, FwiClient, WeatherObservation};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fwi-client")]
#[command(author = "FWI Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Request a Fire Weather Index prediction", long_about = None)]
struct Args {
    /// Base URL of the prediction API
    #[arg(long, default_value = "http://localhost:8000")]
    url: String,

    #[arg(long, default_value_t = 15)]
    day: u32,

    #[arg(long, default_value_t = 7)]
    month: u32,

    #[arg(long, default_value_t = 2012)]
    year: i32,

    /// Noon temperature (°C)
    #[arg(long, default_value_t = 30.0)]
    temperature: f64,

    /// Relative humidity (%)
    #[arg(long, default_value_t = 40.0)]
    rh: f64,

    /// Wind speed (km/h)
    #[arg(long, default_value_t = 6.0)]
    ws: f64,

    /// Rain (mm)
    #[arg(long, default_value_t = 0.0)]
    rain: f64,

    /// Fine Fuel Moisture Code
    #[arg(long, default_value_t = 85.0)]
    ffmc: f64,

    /// Duff Moisture Code
    #[arg(long, default_value_t = 25.0)]
    dmc: f64,

    /// Drought Code
    #[arg(long, default_value_t = 60.0)]
    dc: f64,

    /// Initial Spread Index
    #[arg(long, default_value_t = 5.0)]
    isi: f64,

    /// Buildup Index
    #[arg(long, default_value_t = 30.0)]
    bui: f64,
}

impl Args {
    fn observation(&self) -> WeatherObservation {
        WeatherObservation {
            day: self.day,
            month: self.month,
            year: self.year,
            temperature: self.temperature,
            relative_humidity: self.rh,
            wind_speed: self.ws,
            rain: self.rain,
            ffmc: self.ffmc,
            dmc: self.dmc,
            dc: self.dc,
            isi: self.isi,
            bui: self.bui,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .init();

    let args = Args::parse();
    let client = FwiClient::new(args.url.clone());

    match client.predict(&args.observation()).await {
        Ok(prediction) => {
            println!("Predicted FWI: {:.3}", prediction.value);
            println!("Fire risk: {}", prediction.risk);
            Ok(())
        }
        Err(ClientError::Server { status, message }) => {
            eprintln!("Error ({status}): {message}");
            std::process::exit(1);
        }
        Err(err) => Err(err.into()),
    }
}
