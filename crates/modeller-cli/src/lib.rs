//! CLI logic for the Modeller diagram tool.
//!
//! Loads a JSON catalogue into an in-memory store and runs one command
//! against it.

pub mod error_adapter;

mod args;
mod config;

pub use args::{Args, Command, Emit};

use std::{
    fs,
    io::{self, Write},
    path::Path,
};

use log::{info, warn};

use modeller::{
    DiagramRequest, DiagramService, ModellerError, codec,
    compiler::{CompileReport, DiagramLayout},
    markup::Direction,
    store::{Catalogue, MemoryStore},
};

/// Run the Modeller CLI application
///
/// # Errors
///
/// Returns `ModellerError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Malformed catalogue files
/// - Unknown element ids
/// - Codec errors
pub fn run(args: &Args) -> Result<(), ModellerError> {
    let app_config = config::load_config(args.config.as_ref())?;

    match &args.command {
        Command::Compile {
            catalogue,
            elements,
            title,
            left_to_right,
            enterprise,
            emit,
            output,
        } => {
            let catalogue = load_catalogue(catalogue)?;
            let element_ids: Vec<u64> = if elements.is_empty() {
                catalogue.elements.iter().map(|e| e.id).collect()
            } else {
                elements.clone()
            };
            let direction = if *left_to_right {
                Direction::LeftToRight
            } else {
                Direction::TopToBottom
            };

            let service = DiagramService::new(app_config, MemoryStore::from_catalogue(catalogue));
            let mut request = DiagramRequest::new(1, title.as_str(), element_ids)
                .with_layout(DiagramLayout::new(direction));
            if let Some(enterprise) = enterprise {
                request = request.with_enterprise_filter(enterprise.as_str());
            }

            let outcome = service.compile_diagram(request)?;
            log_report(&outcome.report);

            let diagram = outcome.diagram;
            let text = match emit {
                Emit::Markup => diagram.markup_source.clone(),
                Emit::Token => diagram.encoded_token.clone(),
                Emit::Url => service.render_url(&diagram),
            };
            write_output(output.as_deref(), &text)
        }
        Command::Element {
            catalogue,
            id,
            emit,
            output,
        } => {
            let catalogue = load_catalogue(catalogue)?;
            let service = DiagramService::new(app_config, MemoryStore::from_catalogue(catalogue));
            let diagram = service.element_diagram(*id)?;

            let text = match emit {
                Emit::Markup => diagram.markup_source,
                Emit::Token => diagram.encoded_token,
                Emit::Url => service
                    .config()
                    .renderer()
                    .render_url(&diagram.encoded_token),
            };
            write_output(output.as_deref(), &text)
        }
        Command::Encode { input, output } => {
            let markup = fs::read_to_string(input)?;
            let token = codec::encode(&markup)?;
            write_output(output.as_deref(), &token)
        }
        Command::Decode { token, output } => {
            let markup = codec::decode(token)?;
            write_output(output.as_deref(), &markup)
        }
        Command::DeriveRelationships { catalogue, output } => {
            let catalogue = load_catalogue(catalogue)?;
            let service = DiagramService::new(app_config, MemoryStore::from_catalogue(catalogue));
            let proposed = service.derive_relationships()?;
            info!(proposed = proposed.len(); "Relationships derived");

            let json = serde_json::to_string_pretty(&proposed)
                .map_err(|e| ModellerError::validation(e.to_string()))?;
            write_output(output.as_deref(), &json)
        }
    }
}

fn load_catalogue(path: impl AsRef<Path>) -> Result<Catalogue, ModellerError> {
    let path = path.as_ref();
    info!(path = path.display().to_string(); "Loading catalogue");

    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| {
        ModellerError::validation(format!("invalid catalogue {}: {e}", path.display()))
    })
}

fn log_report(report: &CompileReport) {
    if !report.missing_elements.is_empty() {
        warn!(element_ids:? = report.missing_elements; "Elements not in catalogue were skipped");
    }
    if !report.filtered_elements.is_empty() {
        info!(element_ids:? = report.filtered_elements; "Elements outside the enterprise were skipped");
    }
}

fn write_output(path: Option<&str>, text: &str) -> Result<(), ModellerError> {
    match path {
        Some(path) => {
            fs::write(path, text)?;
            info!(output_file = path; "Output written");
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            if !text.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
        }
    }
    Ok(())
}
