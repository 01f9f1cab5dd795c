use anyhow::*;
use fs_extra::copy_items;
use fs_extra::dir::CopyOptions;
use std::env;
use std::path::PathBuf;

const CASTLE_MODEL: &str = "assets/models/castle1.glb";

fn main() -> Result<()> {
    println!("cargo:rerun-if-changed=assets/*");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let assets_src = manifest_dir.join("assets");
    if !manifest_dir.join(CASTLE_MODEL).exists() {
        println!(
            "cargo:warning={CASTLE_MODEL} is missing, the viewer will show the scene without the castle"
        );
    }

    // Bundlers serving the wasm build pick the assets up next to the generated package.
    if assets_src.exists() {
        let out_dir = env::var("OUT_DIR")?;
        let mut copy_options = CopyOptions::new();
        copy_options.overwrite = true;
        copy_items(&[assets_src], out_dir, &copy_options)
            .context("could not copy the assets directory")?;
    }

    Ok(())
}
