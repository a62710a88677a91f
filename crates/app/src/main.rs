//! Entry point for the beagle asset tool.
//! `export`: source model -> beagleasset. `inspect`: load and summarise an asset.

use std::path::PathBuf;

use anyhow::{Context, Result};
use asset::{
    DEFAULT_TEXTURE_ROOT, ExportOptions, export_to_path, import_scene, load_asset_from_path,
    loader::resolve_texture_path, texture::TextureData,
};
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "beagle", version, about = "Convert models to beagleasset and inspect them")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Import a model (.obj, .gltf, .glb) and write it as a beagleasset.
    Export {
        /// Source model file.
        input: PathBuf,
        /// Output file.
        #[arg(short, long, env = "BEAGLE_OUTPUT", default_value = "export.beagleasset")]
        output: PathBuf,
        /// Write world-space positions instead of mesh-local ones.
        #[arg(long)]
        bake_transforms: bool,
        /// Replace texture directories with this prefix.
        #[arg(long)]
        texture_prefix: Option<String>,
    },
    /// Load a beagleasset and print what it contains.
    Inspect {
        asset: PathBuf,
        /// Directory texture paths are resolved against.
        #[arg(long, env = "BEAGLE_TEXTURE_ROOT", default_value = DEFAULT_TEXTURE_ROOT)]
        texture_root: PathBuf,
        /// Also decode the texture and report its size.
        #[arg(long)]
        load_texture: bool,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Cli::parse().command {
        Command::Export {
            input,
            output,
            bake_transforms,
            texture_prefix,
        } => export(input, output, ExportOptions {
            bake_transforms,
            texture_prefix,
        }),
        Command::Inspect {
            asset,
            texture_root,
            load_texture,
        } => inspect(asset, texture_root, load_texture),
    }
}

fn export(input: PathBuf, output: PathBuf, options: ExportOptions) -> Result<()> {
    log::info!("Provided file: {}", input.display());

    let scene = import_scene(&input)?;
    let stats = export_to_path(&scene, &output, &options)?;

    if stats.meshes_skipped > 0 {
        log::warn!(
            "{} mesh(es) without triangle primitives were not exported",
            stats.meshes_skipped
        );
    }
    println!(
        "{} -> {}: {} mesh(es), {} vertices, {} faces, {} texture(s)",
        input.display(),
        output.display(),
        stats.meshes_written,
        stats.vertices,
        stats.faces,
        stats.textures
    );
    Ok(())
}

fn inspect(path: PathBuf, texture_root: PathBuf, load_texture: bool) -> Result<()> {
    let asset = load_asset_from_path(&path)?;
    let mesh = &asset.mesh;

    println!("{}", path.display());
    println!("  vertices:  {}", mesh.vertices.len());
    println!("  triangles: {}", mesh.triangle_count());
    println!("  blocks:    {}", asset.blocks.len());
    match mesh.bounds() {
        Some(b) => println!(
            "  bounds:    min {:?} max {:?} (size {:?})",
            b.min.to_array(),
            b.max.to_array(),
            b.size().to_array()
        ),
        None => println!("  bounds:    empty"),
    }

    for (i, block) in asset.blocks.iter().enumerate() {
        let texture = block
            .texture
            .as_deref()
            .map(|t| resolve_texture_path(&texture_root, t).display().to_string())
            .unwrap_or_else(|| "-".to_owned());
        println!(
            "  [{i}] vertices {}..{} indices {}..{} texture {}",
            block.first_vertex,
            block.first_vertex + block.vertex_count,
            block.first_index,
            block.first_index + block.index_count,
            texture
        );
    }

    if load_texture {
        let texture_path = asset
            .resolve_texture(&texture_root)
            .with_context(|| format!("{} names no texture", path.display()))?;
        let texture = TextureData::load(&texture_path)
            .with_context(|| format!("Failed to load texture for {}", path.display()))?;
        println!(
            "  texture:   {} ({}x{})",
            texture_path.display(),
            texture.width,
            texture.height
        );
    }

    Ok(())
}
