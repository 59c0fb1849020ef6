//! Command-line definition

use clap::{Arg, ArgAction, Command as ClapCommand};

/// Environment variable naming the default batch folder
pub const DATA_DIR_ENV: &str = "DUSTKIT_DATA_DIR";

fn input_arg() -> Arg {
    Arg::new("input")
        .help("Input GeoTIFF file")
        .value_name("FILE")
        .required(true)
        .index(1)
}

fn output_arg(help: &'static str) -> Arg {
    Arg::new("output")
        .short('o')
        .long("output")
        .help(help)
        .value_name("FILE")
}

fn crop_args() -> Vec<Arg> {
    vec![
        Arg::new("bbox")
            .long("bbox")
            .help("Bounding box as minx,miny,maxx,maxy")
            .value_name("BBOX")
            .allow_hyphen_values(true),
        Arg::new("crs")
            .long("crs")
            .help("CRS of the bounding box (e.g. EPSG:3857, EPSG:4326)")
            .value_name("CRS"),
        Arg::new("policy")
            .long("policy")
            .help("Partial overlap handling: clamp or strict")
            .value_name("POLICY")
            .value_parser(["clamp", "strict"]),
        Arg::new("compression")
            .long("compression")
            .help("Compression of the cropped GeoTIFF (none, lzw, deflate, zstd)")
            .value_name("NAME"),
    ]
}

fn detect_args() -> Vec<Arg> {
    vec![
        Arg::new("rule")
            .long("rule")
            .help("Classifier rule: canonical, bright or rgb")
            .value_name("RULE"),
        Arg::new("cleanup")
            .long("cleanup")
            .help("Run morphological open then close on the mask")
            .action(ArgAction::SetTrue)
            .conflicts_with("no-cleanup"),
        Arg::new("no-cleanup")
            .long("no-cleanup")
            .help("Skip morphological cleanup")
            .action(ArgAction::SetTrue),
        Arg::new("kernel-size")
            .long("kernel-size")
            .help("Side of the square structuring element (odd)")
            .value_name("PIXELS")
            .value_parser(clap::value_parser!(u32)),
        Arg::new("connectivity")
            .long("connectivity")
            .help("Pixel connectivity of dust regions: 4 or 8")
            .value_name("N")
            .value_parser(["4", "8"]),
        Arg::new("preview")
            .long("preview")
            .help("Also write a side-by-side preview PNG")
            .action(ArgAction::SetTrue),
        Arg::new("output-dir")
            .long("output-dir")
            .help("Directory for all outputs instead of next to the input")
            .value_name("DIR"),
    ]
}

/// The `dustkit` command line
pub fn build_cli() -> ClapCommand {
    ClapCommand::new("dustkit")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Crop satellite GeoTIFFs and export dust regions as GeoJSON")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Pipeline configuration file (TOML)")
                .value_name("FILE")
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .help("Write log records to this file as well as the console")
                .value_name("FILE")
                .global(true),
        )
        .subcommand(
            ClapCommand::new("crop")
                .about("Crop a GeoTIFF to a bounding box")
                .arg(input_arg())
                .args(crop_args())
                .arg(output_arg("Output GeoTIFF (default <stem>_cropped.tif)")),
        )
        .subcommand(
            ClapCommand::new("detect")
                .about("Detect dust in a GeoTIFF and write GeoJSON")
                .arg(input_arg())
                .args(detect_args())
                .arg(output_arg("Output GeoJSON (default <stem>_dust.geojson)")),
        )
        .subcommand(
            ClapCommand::new("run")
                .about("Crop, then detect dust in the cropped raster")
                .arg(input_arg())
                .args(crop_args())
                .args(detect_args()),
        )
        .subcommand(
            ClapCommand::new("batch")
                .about("Run the configured pipeline over every GeoTIFF in a folder")
                .arg(
                    Arg::new("folder")
                        .help("Folder to scan")
                        .value_name("DIR")
                        .env(DATA_DIR_ENV)
                        .required(true)
                        .index(1),
                )
                .args(crop_args())
                .args(detect_args())
                .arg(
                    Arg::new("no-progress")
                        .long("no-progress")
                        .help("Hide the progress bar")
                        .action(ArgAction::SetTrue),
                ),
        )
}
