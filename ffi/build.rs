use std::env;
use std::path::{Path, PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=src/types.rs");
    println!("cargo:rerun-if-changed=cbindgen.toml");
    println!("cargo:rerun-if-env-changed=ROUNDTRIP_NATIVE_LIB_DIR");
    println!("cargo:rerun-if-env-changed=ROUNDTRIP_HEADER_DIR");

    let crate_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR is set by cargo"));
    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));
    generate_header(&crate_dir, &out_dir);

    if env::var_os("CARGO_FEATURE_FOUNDATION").is_some() {
        link_native();
    }
}

/// Emit `roundtrip.h` into `OUT_DIR` so the native implementation can
/// compile against the same layouts as `src/types.rs`.
///
/// The source tree is only written when `ROUNDTRIP_HEADER_DIR` names a
/// directory; `include/roundtrip.h` is refreshed that way.
fn generate_header(crate_dir: &Path, out_dir: &Path) {
    let config = match cbindgen::Config::from_file(crate_dir.join("cbindgen.toml")) {
        Ok(config) => config,
        Err(e) => {
            println!("cargo:warning=skipping header generation: {e}");
            return;
        }
    };
    let bindings = match cbindgen::Builder::new()
        .with_crate(crate_dir)
        .with_config(config)
        .generate()
    {
        Ok(bindings) => bindings,
        Err(e) => {
            println!("cargo:warning=skipping header generation: {e}");
            return;
        }
    };

    bindings.write_to_file(out_dir.join("roundtrip.h"));
    if let Some(dir) = env::var_os("ROUNDTRIP_HEADER_DIR") {
        bindings.write_to_file(Path::new(&dir).join("roundtrip.h"));
    }
}

/// The platform library providing `RoundTrip` / `FreeHTTPResponse` is built
/// outside cargo; point `ROUNDTRIP_NATIVE_LIB_DIR` at it.
fn link_native() {
    if let Ok(dir) = env::var("ROUNDTRIP_NATIVE_LIB_DIR") {
        println!("cargo:rustc-link-search=native={dir}");
    }
    println!("cargo:rustc-link-lib=static=roundtrip_native");
    println!("cargo:rustc-link-lib=objc");
}
