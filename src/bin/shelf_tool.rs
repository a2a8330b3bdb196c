use anyhow::{anyhow, Result};
use bigshelf::catalog::Catalog;
use bigshelf::layout::{pack, PackOptions};
use std::env;
use std::process;

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:?}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let mut args = env::args().skip(1);
    let Some(command) = args.next() else {
        print_usage();
        return Ok(());
    };
    match command.as_str() {
        "validate" => {
            let catalog_path = args
                .next()
                .ok_or_else(|| anyhow!("validate requires a path: shelf_tool validate <catalog>"))?;
            cmd_validate(&catalog_path)
        }
        "pack" => {
            let catalog_path = args
                .next()
                .ok_or_else(|| anyhow!("pack requires a path: shelf_tool pack <catalog> [length]"))?;
            let mut length = 100.0_f32;
            let mut deterministic = false;
            for arg in args {
                match arg.as_str() {
                    "--deterministic" => deterministic = true,
                    other => {
                        length = other
                            .parse()
                            .map_err(|_| anyhow!("invalid shelf length '{other}'"))?;
                    }
                }
            }
            cmd_pack(&catalog_path, length, deterministic)
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => Err(anyhow!("unknown command '{other}'")),
    }
}

fn print_usage() {
    eprintln!(
        "Shelf Tool

Usage:
  shelf_tool validate <catalog_path>                Parse a catalog, report skipped records
  shelf_tool pack <catalog_path> [length] [--deterministic]
                                                    Pack and print per-row statistics
  shelf_tool help                                   Show this message
"
    );
}

fn cmd_validate(catalog_path: &str) -> Result<()> {
    let catalog = Catalog::load_from_path(catalog_path)?;
    println!("{} boxes parsed", catalog.boxes.len());
    let mut missing_models = 0;
    for b in &catalog.boxes {
        if b.model_path.is_none() {
            missing_models += 1;
        }
        if !(b.width.is_finite() && b.height.is_finite() && b.depth.is_finite()) {
            println!("box {} ({}) has non-finite dimensions", b.id, b.slug);
        }
    }
    if missing_models > 0 {
        println!("{missing_models} boxes have no model path (placeholder only)");
    }
    println!("OK");
    Ok(())
}

fn cmd_pack(catalog_path: &str, length: f32, deterministic: bool) -> Result<()> {
    let catalog = Catalog::load_from_path(catalog_path)?;
    let options = if deterministic {
        PackOptions { front_flip_chance: 0.0, ..PackOptions::default() }
    } else {
        PackOptions::default()
    };
    let layout = pack(&catalog.boxes, length, &options, &mut rand::thread_rng());
    println!(
        "{} boxes in {} rows, effective shelf length {:.2}",
        layout.box_count(),
        layout.rows.len(),
        layout.shelf_length
    );
    for (index, row) in layout.rows.iter().enumerate() {
        let footprint: f32 = row.boxes.iter().map(|b| b.shelf_footprint).sum();
        println!(
            "row {index:>3}: {:>3} boxes, footprint {footprint:>7.2}, max height {:>5.2}, y {:>8.2}",
            row.boxes.len(),
            row.max_height,
            row.y
        );
    }
    Ok(())
}
