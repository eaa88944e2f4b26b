// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! graphser-dump - Inspect graphser-encoded blobs
//!
//! Prints the header and schema section of a message. With `--data` the data
//! section is decoded against an empty registry, so every composite is
//! materialized as a synthesized record.

mod render;

use clap::Parser;
use colored::*;
use graphser::serializer::{decode, read_schema_section};
use graphser::wire::has_magic;
use graphser::{EngineConfig, SerializationContext, SerializerFactory, TypeRegistry, Whitelist};
use render::Identities;
use std::path::PathBuf;
use std::sync::Arc;

/// Inspect a graphser-encoded blob
#[derive(Parser, Debug)]
#[command(name = "graphser-dump")]
#[command(version)]
#[command(about = "Print header, schema section and (optionally) data of a graphser blob")]
struct Args {
    /// Encoded message
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Also decode the data section through type synthesis
    #[arg(long)]
    data: bool,

    /// Emit JSON instead of the pretty view
    #[arg(long)]
    json: bool,

    /// Engine limits (YAML); GRAPHSER_* environment overrides apply on top
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => EngineConfig::from_yaml_file(path)?,
        None => EngineConfig::default(),
    }
    .with_env_overrides();
    config.validate()?;

    let bytes = std::fs::read(&args.file)?;
    if !has_magic(&bytes) {
        return Err(format!("{} is not a graphser message", args.file.display()).into());
    }
    log::debug!("[dump] read {} bytes from {}", bytes.len(), args.file.display());

    let (header, schema) = read_schema_section(&bytes, config.max_message_size)?;
    let data = if args.data {
        let factory = SerializerFactory::new(
            Arc::new(TypeRegistry::new()),
            Whitelist::empty(),
            Vec::new(),
            config,
        );
        Some(decode(&factory, &bytes, &SerializationContext::testing())?)
    } else {
        None
    };

    let mut ids = Identities::default();
    if args.json {
        let mut out = serde_json::json!({
            "header": render::header_json(&header, bytes.len()),
            "schema": render::schema_json(&schema),
        });
        if let Some(value) = &data {
            out["data"] = render::value_json(value, &mut ids);
        }
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        render::print_header(&header, bytes.len());
        render::print_schema(&schema);
        if let Some(value) = &data {
            println!();
            print!("{} ", "Data".bold());
            render::print_value(value, &mut ids, 0);
        }
    }
    Ok(())
}
