use std::fs::{self, File};
use std::path::Path;

use anyhow::Context;
use structopt::StructOpt;

mod cli;

use amlres::ResourceImage;

/// Opens and decodes the resource image at `path`.
fn open_image(path: &Path, verify: bool) -> Result<ResourceImage, anyhow::Error> {
    let mut file = File::open(path)
        .with_context(|| format!("Failed to open resource image '{}'", path.display()))?;

    let image = if verify {
        ResourceImage::from_reader_strict(&mut file)
    } else {
        ResourceImage::from_reader(&mut file)
    }
    .with_context(|| format!("Failed to parse resource image '{}'", path.display()))?;

    Ok(image)
}

fn list_image(opts: &cli::ListOpts) -> Result<(), anyhow::Error> {
    println!("Listing assets in {}", opts.image.display());

    let image = open_image(&opts.image, opts.verify)?;

    println!("{:?}", image.header());

    for item in image.items() {
        println!("    {:?}", item);
    }

    Ok(())
}

fn unpack_image(opts: &cli::UnpackOpts) -> Result<(), anyhow::Error> {
    println!("Unpacking assets in {}", opts.image.display());

    let image = open_image(&opts.image, opts.verify)?;

    fs::create_dir_all(&opts.output).with_context(|| {
        format!("Failed to create output directory '{}'", opts.output.display())
    })?;

    for item in image.items() {
        // Extracted assets are bitmaps by convention
        let filename = opts.output.join(format!("{}.bmp", item.name()));

        println!("Unpacking {}", item.name());

        fs::write(&filename, item.data())
            .with_context(|| format!("Failed to write asset file '{}'", filename.display()))?;
    }

    Ok(())
}

fn pack_image(opts: &cli::PackOpts) -> Result<(), anyhow::Error> {
    println!(
        "Packing {} assets into {}",
        opts.assets.len(),
        opts.image.display()
    );

    let mut assets = Vec::with_capacity(opts.assets.len());

    for path in &opts.assets {
        // The asset name is the filename minus its extension
        let name = path
            .file_stem()
            .with_context(|| format!("Cannot derive an asset name from '{}'", path.display()))?
            .to_string_lossy()
            .into_owned();

        let data = fs::read(path)
            .with_context(|| format!("Failed to read asset file '{}'", path.display()))?;

        assets.push((name, data));
    }

    let mut image = ResourceImage::from_assets(assets);
    let packed = image.pack()?;

    fs::write(&opts.image, &packed)
        .with_context(|| format!("Failed to write resource image '{}'", opts.image.display()))?;

    println!("Packed {} bytes", packed.len());

    Ok(())
}

fn main() -> Result<(), anyhow::Error> {
    // Create a timestamped logger, configured through the environment
    pretty_env_logger::init_timed();

    // Parse the command-line arguments
    let opts = cli::Opts::from_args();

    match &opts.command {
        cli::Command::List(list_opts) => list_image(list_opts)?,
        cli::Command::Unpack(unpack_opts) => unpack_image(unpack_opts)?,
        cli::Command::Pack(pack_opts) => pack_image(pack_opts)?,
    }

    Ok(())
}
