use crate::DocumentArgs;
use crate::commands::{load, write_lookup, write_route_stats};
use gpxstats::Route;
use std::error::Error;
use std::io::{self, Write};

pub fn route_command(args: &DocumentArgs) -> Result<(), Box<dyn Error>> {
    let route = load(args.file.as_deref(), |source| {
        Route::new(source, args.granularity)
    })?;

    let mut out = io::stdout().lock();
    if args.report {
        write!(out, "{}", route.build_report())?;
    }
    write_route_stats(&mut out, &route)?;
    if let Some(name) = &args.lookup {
        write_lookup(&mut out, &route, name)?;
    }

    Ok(())
}
