//! Makefile generator for Go projects.
//!
//! A project directory is inspected, the option list is turned into
//! Makefile fragments, and the rendered lines are handed from a producer
//! thread to a writer that appends them to the output.

pub mod config;
pub mod contexts;
pub mod error;
pub mod options;
pub mod project;
pub mod render;
pub mod templates;
pub mod writer;

use crate::config::Settings;
use crate::error::GomakerError;
use crate::options::{BuildFlags, parse_options};
use crate::project::Project;
use crate::writer::{Destination, pipe, send_lines};
use std::path::PathBuf;
use tracing::info;

/// Outcome of a successful [`generate`] run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    pub destination: Destination,
    pub lines: usize,
    /// Where the previous output file was copied, with `backup` set.
    pub backup: Option<PathBuf>,
}

/// Collects the fragments for `settings`. Fails on malformed substitutions.
pub fn build_flags(settings: &Settings) -> Result<BuildFlags, GomakerError> {
    BuildFlags::from_options(&parse_options(&settings.options))
        .with_tags(&settings.tags)
        .with_ldflags(&settings.ldflags)
        .with_substitutions(&settings.substitutions)
}

/// Writes the Makefile for `project`.
pub fn generate(project: &Project, settings: &Settings) -> Result<Generated, GomakerError> {
    let flags = build_flags(settings)?;
    let ctx = render::makefile_context(project, &flags, &settings.version);

    let destination = Destination::parse(&settings.output, &project.dir);
    info!("[Gomaker] Makefile: {}", destination);
    let mut opened = destination.open(settings.backup, settings.no_clobber)?;

    let lines = pipe(
        move |tx| {
            let lines = render::makefile_lines(&ctx)?;
            send_lines(lines, &tx)
        },
        &mut opened.out,
    )?;

    Ok(Generated {
        destination,
        lines,
        backup: opened.backup,
    })
}
