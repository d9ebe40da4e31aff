use std::path::PathBuf;

use structopt::StructOpt;

#[derive(StructOpt, Debug)]
pub enum Command {
    /// List the assets packed into a resource image
    List(ListOpts),
    /// Extract the assets from a resource image into individual files
    Unpack(UnpackOpts),
    /// Pack asset files into a new resource image
    Pack(PackOpts),
}

#[derive(StructOpt, Debug)]
pub struct ListOpts {
    /// The resource image file
    pub image: PathBuf,

    /// Recompute and check the stored item checksums while reading
    #[structopt(long = "verify")]
    pub verify: bool,
}

#[derive(StructOpt, Debug)]
pub struct UnpackOpts {
    /// The resource image file
    pub image: PathBuf,

    /// The directory to write the extracted assets to
    #[structopt(short = "o", long = "output", default_value = ".")]
    pub output: PathBuf,

    /// Recompute and check the stored item checksums while reading
    #[structopt(long = "verify")]
    pub verify: bool,
}

#[derive(StructOpt, Debug)]
pub struct PackOpts {
    /// The resource image file to create
    pub image: PathBuf,

    /// The asset files to pack, in chain order
    #[structopt(required = true)]
    pub assets: Vec<PathBuf>,
}

#[derive(StructOpt, Debug)]
pub struct Opts {
    #[structopt(subcommand)]
    pub command: Command,
}
