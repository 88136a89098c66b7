//! # Shapeforge CLI
//!
//! Command-line interface for blend-shape editing on JSON mesh documents.
//!
//! ## Commands
//! - `info` - List blend shapes, frame counts, weights and extended ranges
//! - `extend` - Add an extended-range copy of a blend shape
//! - `remove` - Remove blend shapes
//! - `merge` - Merge blend shapes into a new one
//! - `rename` - Rename a blend shape in place
//! - `set-weight` - Set a live blend-shape weight

pub mod config;
pub mod document;

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use indexmap::IndexMap;
use thiserror::Error;

use shapeforge_core::{Mesh, ShapeKeyError};
use shapeforge_ops::{BlendShapeFacade, BlendShapeTarget, OperationResult, SkinnedMeshRenderer};

use crate::config::ToolConfig;
use crate::document::MeshDocument;

/// CLI errors
#[derive(Error, Debug)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid mesh: {0}")]
    Mesh(#[from] ShapeKeyError),

    #[error("{0}")]
    Operation(String),
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Shapeforge blend-shape tool
#[derive(Parser)]
#[command(name = "shapeforge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// List blend shapes
    Info {
        /// Mesh document
        input: PathBuf,
    },

    /// Add an extended-range copy of a blend shape right after it
    Extend {
        /// Mesh document
        input: PathBuf,

        /// Blend shape to extend
        #[arg(long)]
        channel: String,

        /// Range minimum
        #[arg(long, allow_negative_numbers = true)]
        min: Option<i32>,

        /// Range maximum
        #[arg(long, allow_negative_numbers = true)]
        max: Option<i32>,

        /// Name of the new blend shape (defaults to `{channel}_min:{min}_max:{max}`)
        #[arg(long)]
        name: Option<String>,

        /// Output document (defaults to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Remove blend shapes
    Remove {
        /// Mesh document
        input: PathBuf,

        /// Blend shape to remove (repeatable)
        #[arg(long = "channel", required = true)]
        channels: Vec<String>,

        /// Output document (defaults to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Merge blend shapes into a new one
    Merge {
        /// Mesh document
        input: PathBuf,

        /// Name of the merged blend shape
        #[arg(long)]
        name: String,

        /// Source blend shape and its weight as NAME=VALUE (repeatable)
        #[arg(long = "weight", required = true, value_parser = parse_weight)]
        weights: Vec<(String, f32)>,

        /// Output document (defaults to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Rename a blend shape in place
    Rename {
        /// Mesh document
        input: PathBuf,

        #[arg(long)]
        from: String,

        #[arg(long)]
        to: String,

        /// Output document (defaults to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Set a live blend-shape weight
    SetWeight {
        /// Mesh document
        input: PathBuf,

        /// Blend shape position
        #[arg(long)]
        index: usize,

        /// Weight value
        #[arg(long, allow_negative_numbers = true)]
        value: f32,

        /// Output document (defaults to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Commands {
    fn input(&self) -> &Path {
        match self {
            Self::Info { input }
            | Self::Extend { input, .. }
            | Self::Remove { input, .. }
            | Self::Merge { input, .. }
            | Self::Rename { input, .. }
            | Self::SetWeight { input, .. } => input.as_path(),
        }
    }

    fn output(&self) -> Option<&Path> {
        match self {
            Self::Info { .. } => None,
            Self::Extend { output, .. }
            | Self::Remove { output, .. }
            | Self::Merge { output, .. }
            | Self::Rename { output, .. }
            | Self::SetWeight { output, .. } => output.as_deref(),
        }
    }
}

/// Parse a `NAME=VALUE` merge weight
fn parse_weight(arg: &str) -> Result<(String, f32), String> {
    let (name, value) = arg
        .rsplit_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{arg}'"))?;
    if name.is_empty() {
        return Err(format!("missing blend shape name in '{arg}'"));
    }
    let value = value
        .parse()
        .map_err(|_| format!("invalid weight '{value}' in '{arg}'"))?;
    Ok((name.to_string(), value))
}

/// Execute the CLI command
pub fn execute(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => ToolConfig::load(path)?,
        None => ToolConfig::default(),
    };

    let filter = if cli.verbose { "debug" } else { config.log_filter.as_str() };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    run(&cli.command, &config)
}

/// Run one command against its document
pub fn run(command: &Commands, config: &ToolConfig) -> Result<()> {
    let input = command.input();
    let document = MeshDocument::load(input)?;

    let facade = BlendShapeFacade::new();
    let found = facade.track_mesh(&document.mesh);
    if found > 0 {
        log::debug!("Found {} extended blend shapes", found);
    }
    let mut renderer = document.into_renderer();

    if let Commands::Info { .. } = command {
        print_info(&facade, &renderer);
        return Ok(());
    }

    let result = edit(&facade, &mut renderer, command, config);
    if !result.success {
        bail!(result.message);
    }
    if !result.message.is_empty() {
        log::info!("{}", result.message);
    }

    let output = command.output().unwrap_or(input);
    document::save_renderer(&renderer, output, config.pretty_json)?;
    log::info!("Saved {}", output.display());
    Ok(())
}

/// Apply an editing command through the facade
pub fn edit(
    facade: &BlendShapeFacade,
    renderer: &mut SkinnedMeshRenderer,
    command: &Commands,
    config: &ToolConfig,
) -> OperationResult {
    match command {
        Commands::Info { .. } => OperationResult::ok(String::new()),

        Commands::Extend { channel, min, max, name, .. } => {
            let min = min.unwrap_or(config.default_min);
            let max = max.unwrap_or(config.default_max);
            match name {
                Some(name) => facade.create_extended(renderer, channel, name, min, max),
                None => facade.create_extended_default(renderer, channel, min, max),
            }
        }

        Commands::Remove { channels, .. } => facade.remove_many(renderer, channels.as_slice()),

        Commands::Merge { name, weights, .. } => {
            let weights: IndexMap<String, f32> = weights.iter().cloned().collect();
            facade.merge(renderer, name, &weights)
        }

        Commands::Rename { from, to, .. } => facade.rename(renderer, from, to),

        Commands::SetWeight { index, value, .. } => facade.apply_weight(renderer, *index, *value),
    }
}

fn print_info(facade: &BlendShapeFacade, renderer: &SkinnedMeshRenderer) {
    let Some(mesh) = renderer.shared_mesh() else {
        return;
    };

    println!("{}", summary(mesh));
    for (index, (name, channel)) in mesh.channels().enumerate() {
        let weight = renderer.blend_shape_weight(index).unwrap_or(0.0);
        match facade.extended_info(renderer, name) {
            Some(info) => println!(
                "  [{index}] {name}  frames={}  weight={weight}  range={}..{} of '{}'",
                channel.frame_count(),
                info.min_value,
                info.max_value,
                info.original_name
            ),
            None => {
                println!("  [{index}] {name}  frames={}  weight={weight}", channel.frame_count())
            }
        }
    }
}

fn summary(mesh: &Mesh) -> String {
    let size = mesh.geometry().bounds.size();
    format!(
        "{}: {} vertices, {} triangles, {} blend shapes, bounds {} x {} x {}",
        mesh.name(),
        mesh.vertex_count(),
        mesh.geometry().indices.len() / 3,
        mesh.channel_count(),
        size.x,
        size.y,
        size.z
    )
}
