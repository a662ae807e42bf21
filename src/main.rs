use actix_web::body::BoxBody;
use actix_web::{get, web, App, HttpRequest, HttpResponse, HttpServer, Responder};
use chrono::DateTime;
use ecopompe_lib::{
    normalise_address, normalise_station_name, normalise_town, postcodes_from_town_id, DataProvider, FuelType,
    Position, PriceRanker, ProviderConfig, RankingConfig, Station, StationNames,
};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

fn default_port() -> u16 {
    8080
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_data_staleness_secs() -> u64 {
    60 * 60
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

fn default_price_staleness_days() -> i64 {
    7
}

fn default_stale_price_penalty() -> f64 {
    1000.0
}

#[derive(Deserialize, Clone, Debug)]
struct Config {
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default = "default_host")]
    host: String,
    data_url: String,
    #[serde(default = "default_data_staleness_secs")]
    data_staleness_secs: u64,
    #[serde(default = "default_fetch_timeout_secs")]
    fetch_timeout_secs: u64,
    #[serde(default = "default_price_staleness_days")]
    price_staleness_days: i64,
    #[serde(default = "default_stale_price_penalty")]
    stale_price_penalty: f64,
    names_path: Option<String>,
}

struct AppState {
    provider: DataProvider,
    ranker: PriceRanker,
    names: StationNames,
}

#[derive(Serialize)]
struct StationView {
    #[serde(flatten)]
    station: Arc<Station>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    display_town: String,
    display_address: String,
}

impl StationView {
    fn new(station: Arc<Station>, name: Option<&str>) -> Self {
        Self {
            name: name.map(normalise_station_name),
            display_town: normalise_town(&station.town),
            display_address: normalise_address(&station.address),
            station,
        }
    }
}

#[derive(Serialize)]
struct StationList {
    updated_at: Option<i64>,
    updated_at_str: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fuel: Option<FuelType>,
    stations: Vec<StationView>,
}

impl Responder for StationList {
    type Body = BoxBody;
    fn respond_to(self, _req: &HttpRequest) -> HttpResponse<Self::Body> {
        match serde_json::to_string(&self) {
            Ok(body) => HttpResponse::Ok()
                .content_type("application/json")
                .body(body),
            Err(err) => {
                warn!("failed to serialise station list: {}", err);
                HttpResponse::InternalServerError().finish()
            }
        }
    }
}

#[derive(Deserialize)]
struct FuelQuery {
    fuel: Option<String>,
}

#[derive(Deserialize)]
struct RadiusQuery {
    lat: f64,
    lon: f64,
    radius: u32,
    fuel: Option<String>,
}

fn millis_to_datetime(millis: i64) -> String {
    let datetime_utc = DateTime::from_timestamp_millis(millis).unwrap_or_default();
    datetime_utc.format("%Y-%m-%d %H:%M:%S%.3f UTC").to_string()
}

fn parse_fuel(fuel: Option<String>) -> Result<Option<FuelType>, actix_web::Error> {
    fuel.map(|f| f.parse::<FuelType>())
        .transpose()
        .map_err(actix_web::error::ErrorBadRequest)
}

impl AppState {
    fn present(&self, mut stations: Vec<Arc<Station>>, fuel: Option<FuelType>) -> StationList {
        if let Some(fuel) = fuel {
            self.ranker.sort_by_increasing_price(&mut stations, fuel);
        }

        let updated_at = self.provider.last_refresh_millis();
        StationList {
            updated_at,
            updated_at_str: updated_at.map(millis_to_datetime),
            fuel,
            stations: stations
                .into_iter()
                .map(|station| {
                    let name = self.names.get(&station.id);
                    StationView::new(station, name)
                })
                .collect(),
        }
    }
}

#[get("/stations/postcodes/{codes}")]
async fn get_by_postcodes(
    path: web::Path<String>,
    query: web::Query<FuelQuery>,
    data: web::Data<AppState>,
) -> actix_web::Result<StationList> {
    let fuel = parse_fuel(query.into_inner().fuel)?;
    let codes = path.into_inner();
    let list = web::block(move || {
        let codes: Vec<&str> = codes.split(',').filter(|c| !c.is_empty()).collect();
        data.present(data.provider.get_by_postcodes(&codes), fuel)
    })
    .await?;
    Ok(list)
}

#[get("/stations/town/{town_id}")]
async fn get_by_town(
    path: web::Path<String>,
    query: web::Query<FuelQuery>,
    data: web::Data<AppState>,
) -> actix_web::Result<StationList> {
    let fuel = parse_fuel(query.into_inner().fuel)?;
    let town_id = path.into_inner();
    let list = web::block(move || {
        let codes = postcodes_from_town_id(&town_id);
        data.present(data.provider.get_by_postcodes(&codes), fuel)
    })
    .await?;
    Ok(list)
}

#[get("/stations/department/{id}")]
async fn get_by_department(
    path: web::Path<String>,
    query: web::Query<FuelQuery>,
    data: web::Data<AppState>,
) -> actix_web::Result<StationList> {
    let fuel = parse_fuel(query.into_inner().fuel)?;
    let department = path.into_inner();
    let list = web::block(move || data.present(data.provider.get_by_department(&department), fuel)).await?;
    Ok(list)
}

#[get("/stations/radius")]
async fn get_within_radius(
    query: web::Query<RadiusQuery>,
    data: web::Data<AppState>,
) -> actix_web::Result<StationList> {
    let query = query.into_inner();
    let fuel = parse_fuel(query.fuel)?;
    let position = Position::new(query.lat, query.lon);
    let list = web::block(move || data.present(data.provider.get_within_radius(position, query.radius), fuel)).await?;
    Ok(list)
}

#[get("/version")]
async fn get_version() -> impl Responder {
    env!("CARGO_PKG_VERSION")
}

fn main() -> std::io::Result<()> {
    env_logger::init();

    let config = envy::from_env::<Config>().map_err(std::io::Error::other)?;
    let address = format!("{}:{}", config.host, config.port);

    let provider_config = ProviderConfig::new(config.data_url.clone())
        .with_staleness_threshold(Duration::from_secs(config.data_staleness_secs));
    let fetcher = ecopompe_lib::UrlFetcher::new(Duration::from_secs(config.fetch_timeout_secs))
        .map_err(std::io::Error::other)?;
    let provider = DataProvider::with_parts(
        provider_config,
        Box::new(fetcher),
        Box::new(ecopompe_lib::JsonDecoder),
        Arc::new(ecopompe_lib::SystemClock),
    );

    info!("warming up station data from {}", config.data_url);
    match provider.refresh() {
        Ok(count) => info!("loaded {} stations", count),
        Err(e) => warn!("initial station data load failed, will retry on first query: {}", e),
    }

    let ranker = PriceRanker::new(RankingConfig {
        staleness_threshold_days: config.price_staleness_days,
        stale_price_penalty: config.stale_price_penalty,
    });
    let names = config
        .names_path
        .as_deref()
        .map(StationNames::load)
        .unwrap_or_default();

    let data = web::Data::new(AppState {
        provider,
        ranker,
        names,
    });

    info!("starting http server @ {}", address);

    // The blocking HTTP client must be dropped outside of the async runtime,
    // so the last handle on the state stays here.
    let server_data = data.clone();
    let result = actix_web::rt::System::new().block_on(async move {
        HttpServer::new(move || {
            App::new()
                .app_data(server_data.clone())
                .service(get_by_postcodes)
                .service(get_by_town)
                .service(get_by_department)
                .service(get_within_radius)
                .service(get_version)
        })
        .bind(address)?
        .run()
        .await
    });

    drop(data);
    result
}
