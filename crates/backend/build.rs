use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Каталог target/<profile>, в который cargo кладет бинарники
fn profile_dir() -> Option<PathBuf> {
    let out_dir = PathBuf::from(env::var_os("OUT_DIR")?);
    let profile = env::var("PROFILE").ok()?;
    out_dir
        .ancestors()
        .find(|p| p.ends_with(&profile))
        .map(Path::to_path_buf)
}

fn main() {
    println!("cargo:rerun-if-changed=../../config.toml");

    let source_config = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config.toml");
    let Some(target_dir) = profile_dir() else {
        println!("cargo:warning=target profile directory not found, config.toml not copied");
        return;
    };

    // Рядом с бинарниками backend и order-cli
    if source_config.exists() {
        let dest_config = target_dir.join("config.toml");
        if let Err(e) = fs::copy(&source_config, &dest_config) {
            println!("cargo:warning=Failed to copy config.toml: {}", e);
        }
    } else {
        println!(
            "cargo:warning=config.toml not found at {:?}, using embedded defaults",
            source_config
        );
    }
}
