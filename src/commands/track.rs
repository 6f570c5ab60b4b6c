use crate::DocumentArgs;
use crate::commands::{load, write_lookup, write_route_stats, write_stat};
use gpxstats::Track;
use std::error::Error;
use std::io::{self, Write};

pub fn track_command(args: &DocumentArgs) -> Result<(), Box<dyn Error>> {
    let track = load(args.file.as_deref(), |source| {
        Track::new(source, args.granularity)
    })?;

    let mut out = io::stdout().lock();
    if args.report {
        write!(out, "{}", track.build_report())?;
    }
    write_route_stats(&mut out, &track)?;
    write_stat(&mut out, "total time", format!("{} s", track.total_time()))?;
    write_stat(&mut out, "resting time", format!("{} s", track.resting_time()))?;
    write_stat(
        &mut out,
        "travelling time",
        format!("{} s", track.travelling_time()),
    )?;
    write_stat(&mut out, "max speed", format!("{:.2} m/s", track.max_speed()))?;
    write_stat(
        &mut out,
        "average speed",
        format!("{:.2} m/s", track.average_speed(true)),
    )?;
    write_stat(
        &mut out,
        "average moving speed",
        format!("{:.2} m/s", track.average_speed(false)),
    )?;
    write_stat(
        &mut out,
        "max rate of ascent",
        format!("{:.2} m/s", track.max_rate_of_ascent()),
    )?;
    write_stat(
        &mut out,
        "max rate of descent",
        format!("{:.2} m/s", track.max_rate_of_descent()),
    )?;
    if let Some(name) = &args.lookup {
        write_lookup(&mut out, &track, name)?;
    }

    Ok(())
}
