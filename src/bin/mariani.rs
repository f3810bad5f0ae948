// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

extern crate clap;
extern crate env_logger;
extern crate image;
#[macro_use]
extern crate log;
extern crate mariani;
extern crate num;

use clap::{App, Arg, ArgMatches};
use image::pnm::PNMEncoder;
use image::pnm::{PNMSubtype, SampleEncoding};
use image::ColorType;
use mariani::{Bitmap, MarianiRenderer, Viewport};
use num::Complex;
use std::fs::File;
use std::str::FromStr;

fn parse_pair<T>(s: &str, separator: char) -> Option<(T, T)>
where
    T: FromStr,
{
    match s.find(separator) {
        None => None,
        Some(index) => match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

fn parse_complex(s: &str) -> Option<Complex<f64>> {
    match parse_pair(s, ',') {
        Some((re, im)) => Some(Complex { re, im }),
        None => None,
    }
}

fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    match parse_pair::<T>(s, separator) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

fn validate_range<T: FromStr + Ord>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

const OUTPUT: &str = "output";
const SIZE: &str = "size";
const START: &str = "start";
const STOP: &str = "stop";
const ITERATIONS: &str = "iterations";
const TILE: &str = "tile";
const MINCELL: &str = "min-cell";
const PADDING: &str = "padding";
const DISTANCE: &str = "distance-estimate";

fn args<'a>() -> ArgMatches<'a> {
    App::new("mariani")
        .version(mariani::version())
        .about("Adaptive Mandelbrot rasterizer using Mariani-Silver boundary tracing")
        .arg(
            Arg::with_name(OUTPUT)
                .required(true)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .help("Output file (binary PGM)"),
        )
        .arg(
            Arg::with_name(SIZE)
                .required(false)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value("400x240")
                .validator(|s| validate_pair::<usize>(&s, 'x', "Could not parse output image size"))
                .help("Size of output image"),
        )
        .arg(
            Arg::with_name(START)
                .required(false)
                .long(START)
                .takes_value(true)
                .default_value("-2.5,1.0")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse start corner"))
                .help("Top left corner of the rendered plane region"),
        )
        .arg(
            Arg::with_name(STOP)
                .required(false)
                .long(STOP)
                .takes_value(true)
                .default_value("1.0,-1.0")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse stop corner"))
                .help("Bottom right corner of the rendered plane region"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .required(false)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .default_value("64")
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        1_000_000,
                        "Could not parse iteration count",
                        "Iteration count must be between 1 and 1000000",
                    )
                })
                .help("Membership test iteration budget"),
        )
        .arg(
            Arg::with_name(TILE)
                .required(false)
                .long(TILE)
                .short("t")
                .takes_value(true)
                .default_value("80")
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        4096,
                        "Could not parse tile size",
                        "Tile size must be between 1 and 4096",
                    )
                })
                .help("Top level tile size in pixels"),
        )
        .arg(
            Arg::with_name(MINCELL)
                .required(false)
                .long(MINCELL)
                .short("m")
                .takes_value(true)
                .default_value("10")
                .validator(move |s| {
                    validate_range(
                        &s,
                        2,
                        4096,
                        "Could not parse minimum cell size",
                        "Minimum cell size must be between 2 and 4096",
                    )
                })
                .help("Cell size below which pixels are tested individually"),
        )
        .arg(
            Arg::with_name(PADDING)
                .required(false)
                .long(PADDING)
                .short("p")
                .takes_value(true)
                .default_value("0")
                .validator(move |s| {
                    validate_range(
                        &s,
                        0,
                        64,
                        "Could not parse padding column count",
                        "Padding must be between 0 and 64 columns",
                    )
                })
                .help("Hardware padding columns folded into the row stride"),
        )
        .arg(
            Arg::with_name(DISTANCE)
                .required(false)
                .long(DISTANCE)
                .short("d")
                .help("Classify flat cells with the distance estimator"),
        )
        .get_matches()
}

/// Expand the one-bit surface to eight-bit gray and write it out as
/// a binary PGM: members ink black on a white page.
fn write_image(outfile: &str, frame: &Bitmap) -> Result<(), std::io::Error> {
    let mut pixels: Vec<u8> = Vec::with_capacity(frame.width() * frame.height());
    for row in 0..frame.height() {
        for column in 0..frame.width() {
            pixels.push(if frame.get(column, row) { 0 } else { 255 });
        }
    }
    let output = File::create(outfile)?;
    let mut encoder =
        PNMEncoder::new(output).with_subtype(PNMSubtype::Graymap(SampleEncoding::Binary));
    encoder.encode(
        &pixels[..],
        frame.width() as u32,
        frame.height() as u32,
        ColorType::Gray(8),
    )?;
    Ok(())
}

fn main() {
    env_logger::init();
    let matches = args();

    let size =
        parse_pair(matches.value_of(SIZE).unwrap(), 'x').expect("Error parsing image dimensions");
    let start =
        parse_complex(matches.value_of(START).unwrap()).expect("Error parsing start corner");
    let stop = parse_complex(matches.value_of(STOP).unwrap()).expect("Error parsing stop corner");
    let iterations = usize::from_str(matches.value_of(ITERATIONS).unwrap())
        .expect("Could not parse iteration count");
    let tile = usize::from_str(matches.value_of(TILE).unwrap()).expect("Could not parse tile size");
    let min_cell = usize::from_str(matches.value_of(MINCELL).unwrap())
        .expect("Could not parse minimum cell size");
    let padding =
        usize::from_str(matches.value_of(PADDING).unwrap()).expect("Could not parse padding");

    let viewport = Viewport::new(size.0, size.1, start, stop);
    let mut frame = Bitmap::with_padding(size.0, size.1, padding);
    let renderer = MarianiRenderer::new(iterations)
        .tile_size(tile)
        .min_cell(min_cell)
        .distance_estimate(matches.is_present(DISTANCE));

    match renderer.render(&viewport, &mut frame) {
        Err(e) => {
            eprintln!("Render failure: {}", e);
            std::process::exit(1);
        }
        Ok(stats) => {
            info!(
                "{} oracle calls for {} pixels across {} cells",
                stats.oracle_calls,
                size.0 * size.1,
                stats.cells
            );
            if let Err(e) = write_image(matches.value_of(OUTPUT).unwrap(), &frame) {
                eprintln!("Could not write {}: {}", matches.value_of(OUTPUT).unwrap(), e);
                std::process::exit(1);
            }
        }
    }
}
