use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use rnalayout_core::{
    decompose, layout_tree, numbering_labels, GeneralLayoutProps, NumberingLabel,
    NumberingProps, OutermostLoopShape, Partners, PerBaseLayoutProps, StrictLayout,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

mod dot_bracket;

/// RNA secondary structure strict layout
#[derive(Parser)]
#[command(name = "rnalayout", version)]
struct Cli {
    /// Dot-bracket structure notation
    #[arg(short, long, required_unless_present = "partners")]
    structure: Option<String>,

    /// Partners table as comma-separated 1-indexed positions (0 = unpaired)
    #[arg(short, long, conflicts_with = "structure")]
    partners: Option<String>,

    /// General layout props as a JSON file
    #[arg(long)]
    props: Option<PathBuf>,

    /// Per-base layout props as a JSON file keyed by position
    #[arg(long)]
    per_base: Option<PathBuf>,

    /// Rotation of the drawing in degrees
    #[arg(short, long)]
    rotation: Option<f64>,

    /// Extra spacing between the free 5' and 3' ends
    #[arg(long)]
    termini_gap: Option<f64>,

    /// Lay the outermost loop around a circle instead of a line
    #[arg(long)]
    round_outermost: bool,

    /// Flip the stems containing these positions, comma-separated
    #[arg(long, value_delimiter = ',')]
    flip: Vec<usize>,

    /// Also emit numbering labels every N positions
    #[arg(short = 'n', long)]
    numbering_increment: Option<u32>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Serialize)]
struct Output<'a> {
    #[serde(flatten)]
    layout: &'a StrictLayout,
    #[serde(skip_serializing_if = "Option::is_none")]
    numbering: Option<Vec<NumberingLabel>>,
}

fn fail(msg: impl std::fmt::Display) -> ! {
    eprintln!("error: {msg}");
    process::exit(1);
}

fn read_json<T: DeserializeOwned>(path: &Path) -> T {
    let text = std::fs::read_to_string(path)
        .unwrap_or_else(|e| fail(format!("failed to read {}: {e}", path.display())));
    serde_json::from_str(&text)
        .unwrap_or_else(|e| fail(format!("failed to parse {}: {e}", path.display())))
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let cli = Cli::parse();

    let parsed = match (&cli.structure, &cli.partners) {
        (Some(structure), _) => dot_bracket::parse(structure),
        (None, Some(table)) => dot_bracket::parse_table(table),
        (None, None) => Ok(Partners::default()),
    };
    let partners = parsed.unwrap_or_else(|e| fail(e));

    let mut general: GeneralLayoutProps = match &cli.props {
        Some(path) => read_json(path),
        None => GeneralLayoutProps::default(),
    };
    if let Some(degrees) = cli.rotation {
        general.rotation = degrees.to_radians();
    }
    if let Some(gap) = cli.termini_gap {
        general.termini_gap = gap;
    }
    if cli.round_outermost {
        general.outermost_loop_shape = OutermostLoopShape::Round;
    }

    let mut per_base: PerBaseLayoutProps = match &cli.per_base {
        Some(path) => read_json(path),
        None => PerBaseLayoutProps::default(),
    };
    let tree = decompose(&partners).unwrap_or_else(|e| fail(e));
    for &position in &cli.flip {
        match tree.stem_containing(position) {
            Some(stem) => per_base.toggle_flip_stem(stem),
            None => fail(format!("position {position} is not in a stem")),
        }
    }

    let layout = layout_tree(&tree, &general, &per_base);
    for anomaly in &layout.anomalies {
        tracing::info!(%anomaly, "layout anomaly");
    }

    let numbering = cli.numbering_increment.map(|increment| {
        let props = NumberingProps {
            increment,
            ..NumberingProps::default()
        };
        numbering_labels(&layout.coordinates, &partners, &props)
    });

    let out = Output {
        layout: &layout,
        numbering,
    };
    let json = if cli.pretty {
        serde_json::to_string_pretty(&out)
    } else {
        serde_json::to_string(&out)
    }
    .unwrap_or_else(|e| fail(format!("failed to serialise layout: {e}")));

    if let Some(path) = cli.output {
        if let Err(e) = std::fs::write(&path, &json) {
            fail(format!("failed to write {}: {e}", path.display()));
        }
    } else {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        if let Err(e) = writeln!(handle, "{json}") {
            fail(format!("write failed: {e}"));
        }
    }
}
