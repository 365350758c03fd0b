use aa_logo_rs::error::LogoError;
use aa_logo_rs::logo::register_label_font;
use aa_logo_rs::maker::{LogoMaker, LogoOptions, DEFAULT_FLANK};
use aa_logo_rs::scales::{ScaleTable, DEFAULT_THEME};
use aa_logo_rs::style::StyleConfig;
use aa_logo_rs::types::{FontType, Orientation};
use clap::{Parser, ValueEnum};
use polars::prelude::*;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, Level};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// One logo per position column
    Single,
    /// Start and stop logo of a transmembrane domain
    Tmd,
}

#[derive(Parser)]
#[command(
    name = "aa-logo",
    about = "Draws amino acid sequence logos around alignment positions",
    long_about = "Extracts fixed windows of residues around a reference position of every sequence \
                  in a table, tabulates per offset amino acid frequencies and renders them as a \
                  stacked glyph logo on top of shaded membrane / juxtamembrane regions.",
    version,
    after_help = "Example usage:\n    \
                  aa-logo proteins.csv --positions tmd_start,tmd_stop --mode tmd --style LogoStyle.ini --section OG_AA_config\n    \
                  aa-logo proteins.csv --positions tmd_start --left 10 --right 8 --theme Hessa",
    color = clap::ColorChoice::Always
)]
#[derive(Debug)]
struct Args {
    /// Path to input data file (CSV format)
    /// Must contain the sequence column and every position column
    #[arg(value_name = "DATA_FILE")]
    data_file: PathBuf,

    /// Logo name, used as prefix of the output files
    #[arg(long, default_value = "AAlogo")]
    name: String,

    /// Column holding the amino acid sequences
    #[arg(long, default_value = "sequence")]
    sequence_column: String,

    /// Position columns, comma separated (TMD mode: start,stop)
    #[arg(long, value_delimiter = ',')]
    positions: Vec<String>,

    #[arg(long, value_enum, default_value_t = Mode::Single)]
    mode: Mode,

    /// Residues left of the reference position (1-40)
    #[arg(long, default_value_t = DEFAULT_FLANK as i64, allow_hyphen_values = true)]
    left: i64,

    /// Residues right of the reference position (1-40)
    #[arg(long, default_value_t = DEFAULT_FLANK as i64, allow_hyphen_values = true)]
    right: i64,

    /// Whether positions mark a start (n-term) or a stop (c-term) boundary
    #[arg(long, value_enum, default_value_t = Orientation::NTerminal)]
    orientation: Orientation,

    #[arg(long, value_enum, default_value_t = FontType::Bold)]
    font: FontType,

    /// Hydrophobicity scale ranking the gradient colors
    #[arg(long, default_value = DEFAULT_THEME)]
    theme: String,

    /// Category section of the style file, overrides every gradient option
    #[arg(long)]
    section: Option<String>,

    /// Top gradient color as r,g,b
    #[arg(long, value_delimiter = ',', requires = "gradient_bottom")]
    gradient_top: Option<Vec<f64>>,

    /// Bottom gradient color as r,g,b
    #[arg(long, value_delimiter = ',', requires = "gradient_top")]
    gradient_bottom: Option<Vec<f64>>,

    /// Explicit gradient ranking as one letter codes, top first
    #[arg(long)]
    gradient_order: Option<String>,

    /// Titles over the left and right region as left,right
    #[arg(long, value_delimiter = ',')]
    headers: Option<Vec<String>>,

    /// Do not draw the category legend
    #[arg(long)]
    no_legend: bool,

    /// Style file with bg_style and category sections
    #[arg(long, default_value = "LogoStyle.ini")]
    style: PathBuf,

    /// Glyph asset directory
    #[arg(long, default_value = "assets")]
    assets: PathBuf,

    /// Scale table (CSV with an aa_code column); built-in Kyte-Doolittle if absent
    #[arg(long)]
    scales: Option<PathBuf>,

    /// TrueType font for titles, ticks and legend labels
    #[arg(long)]
    label_font: Option<PathBuf>,

    #[arg(long, default_value = "output")]
    output_dir: PathBuf,

    /// Also write the frequency table of every logo as CSV into this directory
    #[arg(long)]
    table_dir: Option<PathBuf>,

    /// List the themes of the scale table and exit
    #[arg(long)]
    list_themes: bool,

    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), LogoError> {
    let start_time = Instant::now();
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        })
        .init();
    info!(
        "begin process at {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );

    let scales = match &args.scales {
        Some(path) => ScaleTable::read_csv(path)?,
        None => ScaleTable::kyte_doolittle(),
    };
    if args.list_themes {
        for theme in scales.themes() {
            println!("{}", theme);
        }
        return Ok(());
    }

    let style = if args.style.is_file() {
        StyleConfig::load(&args.style)?
    } else {
        info!(
            "no style file at {}, using default colors",
            args.style.display()
        );
        StyleConfig::default()
    };

    let mut builder = LogoOptions::builder()
        .length_left(args.left)
        .length_right(args.right)
        .orientation(args.orientation)
        .font(args.font)
        .theme(args.theme.clone())
        .legend(!args.no_legend);
    if let Some(section) = &args.section {
        builder = builder.section(section.clone());
    }
    if let (Some(top), Some(bottom)) = (&args.gradient_top, &args.gradient_bottom) {
        builder = builder.gradient_colors(vec![top.clone(), bottom.clone()]);
    }
    if let Some(order) = &args.gradient_order {
        builder = builder.gradient_order(order.clone());
    }
    if let Some(headers) = &args.headers {
        builder = builder.headers(headers.clone());
    }
    let options = builder.build()?;

    if let Some(font) = &args.label_font {
        register_label_font(font)?;
    }

    let df = LazyCsvReader::new(&args.data_file)
        .with_has_header(true)
        .finish()?
        .collect()?;
    info!("{} sequences read from {}", df.height(), args.data_file.display());

    let mut maker = LogoMaker::new(
        &df,
        args.name.clone(),
        args.sequence_column.clone(),
        args.positions.clone(),
        &style,
        &scales,
        args.assets.clone(),
        args.output_dir.clone(),
    )?;
    if let Some(dir) = &args.table_dir {
        maker = maker.with_table_dir(dir.clone());
    }

    let written = match args.mode {
        Mode::Single => maker.single_mode(&options)?,
        Mode::Tmd => maker.tmd_mode(&options)?,
    };
    for path in &written {
        println!("{}", path.display());
    }

    info!(
        "end process at {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!(
        "total execution time: {:.4} seconds",
        start_time.elapsed().as_secs_f64()
    );
    Ok(())
}
