pub mod route;
pub mod track;

use gpxstats::{Route, Source};
use std::error::Error;
use std::fmt::Display;
use std::io::{self, Read, Write};
use std::path::Path;

/// Builds a document from `file`, or from stdin when no file (or `-`) is given.
pub fn load<T>(
    file: Option<&Path>,
    build: impl FnOnce(Source<'_>) -> gpxstats::Result<T>,
) -> Result<T, Box<dyn Error>> {
    match file {
        Some(path) if path.as_os_str() != "-" => Ok(build(Source::Path(path))?),
        _ => {
            let mut input = String::new();
            io::stdin().lock().read_to_string(&mut input)?;
            Ok(build(Source::Text(&input))?)
        }
    }
}

pub fn write_stat(out: &mut impl Write, label: &str, value: impl Display) -> io::Result<()> {
    writeln!(out, "{label}: {value}")
}

pub fn write_route_stats(out: &mut impl Write, route: &Route) -> io::Result<()> {
    write_stat(out, "name", route.name())?;
    write_stat(out, "positions", route.num_positions())?;
    write_stat(out, "total length", format!("{:.1} m", route.total_length()))?;
    write_stat(out, "net length", format!("{:.1} m", route.net_length()))?;
    write_stat(
        out,
        "total height gain",
        format!("{:.1} m", route.total_height_gain()),
    )?;
    write_stat(
        out,
        "net height gain",
        format!("{:.1} m", route.net_height_gain()),
    )?;
    write_stat(
        out,
        "latitude",
        format!("{:.6} to {:.6}", route.min_latitude(), route.max_latitude()),
    )?;
    write_stat(
        out,
        "longitude",
        format!("{:.6} to {:.6}", route.min_longitude(), route.max_longitude()),
    )?;
    write_stat(
        out,
        "elevation",
        format!("{:.1} m to {:.1} m", route.min_elevation(), route.max_elevation()),
    )?;
    write_stat(out, "max gradient", format!("{:.2}°", route.max_gradient()))?;
    write_stat(out, "min gradient", format!("{:.2}°", route.min_gradient()))?;
    write_stat(
        out,
        "steepest gradient",
        format!("{:.2}°", route.steepest_gradient()),
    )
}

pub fn write_lookup(out: &mut impl Write, route: &Route, name: &str) -> io::Result<()> {
    match route.find_position(name) {
        Ok(position) => write_stat(out, &format!("'{name}'"), position)?,
        Err(e) => write_stat(out, &format!("'{name}'"), e)?,
    }
    write_stat(
        out,
        &format!("'{name}' visits"),
        route.times_visited_named(name),
    )
}
