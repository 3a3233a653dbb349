//! CLI logic for the Trellis interaction graph tool.
//!
//! A snapshot is a TOML document holding the semantic interaction and its
//! notation. The CLI builds the interaction graph, applies row nudges,
//! resolves path queries and writes a plain-text report.

pub mod error_adapter;

mod args;
mod config;
mod error;
mod report;

pub use args::{Args, Nudge};
pub use error::CliError;

use std::fs;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use trellis::{
    GraphBuilder, GraphError, adapter::NotationSurface, notation::Diagram, semantic::Interaction,
};

use report::Report;

/// A semantic interaction together with its notation.
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    interaction: Interaction,
    #[serde(default)]
    notation: Diagram,
}

/// Run the Trellis CLI application
///
/// This function builds the interaction graph of the input snapshot, applies
/// the requested nudges and writes the report.
///
/// # Arguments
///
/// * `args` - Command-line arguments
///
/// # Errors
///
/// Returns `CliError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Invalid snapshots
/// - Graph construction, mutation and query errors
pub fn run(args: &Args) -> Result<(), CliError> {
    info!(
        input_path = args.input,
        output_path:? = args.output;
        "Processing snapshot"
    );

    let app_config = config::load_config(args.config.as_ref())?;

    let source = fs::read_to_string(&args.input)?;
    let snapshot: Snapshot =
        toml::from_str(&source).map_err(|err| CliError::snapshot(&err, &source))?;

    let mut surface = NotationSurface::new(snapshot.notation);
    let builder = GraphBuilder::new(app_config);
    let mut graph = builder.build(&snapshot.interaction, surface.diagram(), &surface)?;

    for nudge in &args.nudges {
        debug!(row = nudge.row, delta = nudge.delta; "Applying nudge");
        graph.nudge(nudge.row, nudge.delta, &mut surface)?;
    }

    let mut report = Report::new(&graph);
    for query in &args.queries {
        let resolved = graph.resolve(query).map_err(GraphError::from)?;
        report = report.with_query(query, resolved);
    }
    let report = report.to_string();

    match &args.output {
        Some(output) => {
            fs::write(output, &report)?;
            info!(output_file = output; "Report written");
        }
        None => print!("{report}"),
    }

    if let Some(path) = &args.write_snapshot {
        let snapshot = Snapshot {
            interaction: snapshot.interaction,
            notation: surface.into_diagram(),
        };
        let content =
            toml::to_string(&snapshot).map_err(|err| CliError::Serialize(err.to_string()))?;
        fs::write(path, content)?;
        info!(snapshot_file = path; "Snapshot written");
    }

    Ok(())
}
