use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use osmgeo::osm::FileFormat;

#[derive(Debug, thiserror::Error)]
#[error("{0}: {1}")]
struct MapLoadError(PathBuf, #[source] osmgeo::osm::Error);

#[derive(Debug, thiserror::Error)]
#[error("no route between the given positions")]
struct NoRouteError;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    /// Guess the format from the file content
    Auto,
    Xml,
    XmlGz,
    XmlBz2,
}

impl From<Format> for FileFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Auto => FileFormat::Unknown,
            Format::Xml => FileFormat::Xml,
            Format::XmlGz => FileFormat::XmlGz,
            Format::XmlBz2 => FileFormat::XmlBz2,
        }
    }
}

/// Finds the shortest route over roads of an OSM file,
/// and prints it as GeoJSON.
#[derive(Parser)]
struct Cli {
    /// The path to the OSM file
    osm_file: PathBuf,

    /// Latitude of the start point
    start_lat: f64,

    /// Longitude of the start point
    start_lon: f64,

    /// Latitude of the end point
    end_lat: f64,

    /// Longitude of the end point
    end_lon: f64,

    /// Format of the OSM file
    #[arg(long, value_enum, default_value_t = Format::Auto)]
    format: Format,

    /// Respect one-way streets and roundabouts
    #[arg(long)]
    oneway: bool,

    /// Maximum number of vertices to expand before giving up
    #[arg(long, default_value_t = osmgeo::DEFAULT_STEP_LIMIT)]
    step_limit: usize,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    colog::init();
    let cli = Cli::parse();

    let options = osmgeo::osm::Options {
        classifier: if cli.oneway {
            &osmgeo::osm::ONEWAY_CLASSIFIER
        } else {
            &osmgeo::osm::DEFAULT_CLASSIFIER
        },
        file_format: cli.format.into(),
        ..osmgeo::osm::Options::default()
    };

    let map = load_map(&options, &cli.osm_file)?;

    let route = map.find_route(
        cli.start_lat,
        cli.start_lon,
        cli.end_lat,
        cli.end_lon,
        cli.step_limit,
    )?;

    if !route.is_reachable() {
        return Err(NoRouteError.into());
    }
    log::info!("route over {} vertices, {:.3} km", route.nodes.len(), route.cost);

    println!("{{");
    println!("  \"type\": \"FeatureCollection\",");
    println!("  \"features\": [");
    println!("    {{");
    println!("      \"type\": \"Feature\",");
    println!("      \"properties\": {{\"distance_km\": {}}},", route.cost);

    println!("      \"geometry\": {{");
    println!("        \"type\": \"LineString\",");
    println!("        \"coordinates\": [");

    let mut points = map.route_coordinates(&route).into_iter().peekable();
    while let Some(p) = points.next() {
        let suffix = if points.peek().is_some() { "," } else { "" };
        println!("          [{}, {}]{}", p.lon, p.lat, suffix);
    }

    println!("        ]");
    println!("      }}");
    println!("    }}");
    println!("  ]");
    println!("}}");

    Ok(())
}

fn load_map<P: AsRef<Path>>(
    options: &osmgeo::osm::Options,
    path: P,
) -> Result<osmgeo::osm::Map, MapLoadError> {
    osmgeo::osm::load_from_file(options, path.as_ref())
        .map_err(|e| MapLoadError(PathBuf::from(path.as_ref()), e))
}
