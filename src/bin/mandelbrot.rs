// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use clap::{App, Arg, ArgMatches};
use failure::format_err;
use log::{error, info};
use mandelbrot::{Palette, QualityMode, Rasterizer, Session, ViewState};
use std::path::{Path, PathBuf};
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

fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    match parse_pair::<T>(s, separator) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

fn validate_size(s: &str) -> Result<(), String> {
    match parse_pair::<u16>(s, 'x') {
        Some((w, h)) if w > 0 && h > 0 => Ok(()),
        Some(_) => Err("Image width and height must both be at least 1".to_string()),
        None => Err(format!(
            "Could not parse output image size; each side must be 1 to {}",
            u16::MAX
        )),
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

fn validate_zoom(s: &str) -> Result<(), String> {
    match f64::from_str(s) {
        Ok(z) if z.is_finite() && z > 0.0 => Ok(()),
        Ok(_) => Err("Zoom must be greater than zero".to_string()),
        Err(_) => Err("Could not parse zoom".to_string()),
    }
}

fn validate_parse<T: FromStr<Err = String>>(s: &str) -> Result<(), String> {
    T::from_str(s).map(|_| ())
}

const OUTPUT: &str = "output";
const SIZE: &str = "size";
const CENTER: &str = "center";
const ZOOM: &str = "zoom";
const MODE: &str = "mode";
const PALETTE: &str = "palette";
const THREADS: &str = "threads";
const FRAMES: &str = "frames";

fn args<'a>() -> ArgMatches<'a> {
    let max_threads = num_cpus::get();

    App::new("mandelbrot")
        .version("0.1.0")
        .about("Mandelbrot escape-time renderer")
        .arg(
            Arg::with_name(OUTPUT)
                .required(true)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .help("Output file; the extension picks the format"),
        )
        .arg(
            Arg::with_name(SIZE)
                .required(false)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value("800x800")
                .validator(|s| validate_size(&s))
                .help("Size of output image"),
        )
        .arg(
            Arg::with_name(CENTER)
                .required(false)
                .long(CENTER)
                .short("c")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("-0.5,0")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse center point"))
                .help("Point of the complex plane drawn at the center of the image"),
        )
        .arg(
            Arg::with_name(ZOOM)
                .required(false)
                .long(ZOOM)
                .short("z")
                .takes_value(true)
                .default_value("300")
                .validator(|s| validate_zoom(&s))
                .help("Pixels per unit of the complex plane"),
        )
        .arg(
            Arg::with_name(MODE)
                .required(false)
                .long(MODE)
                .short("m")
                .takes_value(true)
                .default_value("fast")
                .validator(|s| validate_parse::<QualityMode>(&s))
                .help("Iteration budget: fast or scaled"),
        )
        .arg(
            Arg::with_name(PALETTE)
                .required(false)
                .long(PALETTE)
                .short("p")
                .takes_value(true)
                .default_value("bands")
                .validator(|s| validate_parse::<Palette>(&s))
                .help("Color palette: bands or gray"),
        )
        .arg(
            Arg::with_name(THREADS)
                .required(false)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        max_threads,
                        "Could not parse thread count",
                        &format!("Thread count must be between 1 and {}", max_threads),
                    )
                })
                .help("Number of worker threads (default: one per CPU)"),
        )
        .arg(
            Arg::with_name(FRAMES)
                .required(false)
                .long(FRAMES)
                .short("f")
                .takes_value(true)
                .default_value("1")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        10_000,
                        "Could not parse frame count",
                        "Frame count must be between 1 and 10000",
                    )
                })
                .help("Number of auto-zoom frames to render"),
        )
        .get_matches()
}

/// With a single frame the output path is used as given; otherwise the
/// frame number goes between the file stem and the extension.
fn frame_path(output: &Path, frame: usize, frames: usize) -> PathBuf {
    if frames == 1 {
        return output.to_path_buf();
    }
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match output.extension() {
        Some(ext) => format!("{}-{:04}.{}", stem, frame, ext.to_string_lossy()),
        None => format!("{}-{:04}", stem, frame),
    };
    output.with_file_name(name)
}

fn run(matches: &ArgMatches) -> Result<(), failure::Error> {
    // Every value below has a default or passed its validator.
    let (width, height) = parse_pair::<u16>(matches.value_of(SIZE).unwrap_or_default(), 'x')
        .ok_or_else(|| format_err!("Error parsing image dimensions"))?;
    let (width, height) = (usize::from(width), usize::from(height));
    let (x_offset, y_offset) = parse_pair::<f64>(matches.value_of(CENTER).unwrap_or_default(), ',')
        .ok_or_else(|| format_err!("Error parsing center point"))?;
    let zoom = f64::from_str(matches.value_of(ZOOM).unwrap_or_default())?;
    let mode = QualityMode::from_str(matches.value_of(MODE).unwrap_or_default())
        .map_err(|e| format_err!("{}", e))?;
    let palette = Palette::from_str(matches.value_of(PALETTE).unwrap_or_default())
        .map_err(|e| format_err!("{}", e))?;
    let threads = match matches.value_of(THREADS) {
        Some(t) => usize::from_str(t)?,
        None => num_cpus::get(),
    };
    let frames = usize::from_str(matches.value_of(FRAMES).unwrap_or_default())?;
    let output = Path::new(matches.value_of(OUTPUT).unwrap_or_default());

    let view = ViewState::new(x_offset, y_offset, zoom)?;
    let rasterizer = Rasterizer::with_mapper(threads, palette.mapper())?;
    info!(
        "Rendering {} frame(s) of {}x{} with {} threads, {} mode, {} palette",
        frames,
        width,
        height,
        rasterizer.threads(),
        mode,
        palette
    );

    let mut session = Session::new(rasterizer, width, height).with_view(view);
    session.set_mode(mode);
    for frame in 0..frames {
        if frame > 0 {
            session.auto_zoom_step()?;
        }
        let result = session.render()?;
        let image = result
            .buffer
            .into_image()
            .ok_or_else(|| format_err!("Pixel buffer does not match its dimensions"))?;
        let path = frame_path(output, frame, frames);
        image.save(&path)?;
        info!("Image saved to: {}", path.display());
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let matches = args();
    if let Err(e) = run(&matches) {
        error!("Render failure: {}", e);
        std::process::exit(1);
    }
}
