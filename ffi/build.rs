use std::path::PathBuf;

/// Set to a directory to also copy the generated header there.
const HEADER_DIR_ENV: &str = "CEP_LOOKUP_HEADER_DIR";

fn main() {
    println!("cargo:rerun-if-changed=src/lib.rs");
    println!("cargo:rerun-if-changed=src/types.rs");
    println!("cargo:rerun-if-env-changed={HEADER_DIR_ENV}");

    let crate_dir = PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").unwrap_or_default());
    let Ok(out_dir) = std::env::var("OUT_DIR") else {
        println!("cargo:warning=OUT_DIR not set, header not generated");
        return;
    };

    let generated = cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_language(cbindgen::Language::C)
        .with_include_guard("CEP_LOOKUP_H")
        .with_no_includes()
        .with_sys_include("stdbool.h")
        .with_sys_include("stdint.h")
        .generate();

    let bindings = match generated {
        Ok(bindings) => bindings,
        Err(err) => {
            println!("cargo:warning=cbindgen failed, header not generated: {err}");
            return;
        }
    };

    bindings.write_to_file(PathBuf::from(out_dir).join("cep_lookup.h"));

    if let Ok(dir) = std::env::var(HEADER_DIR_ENV) {
        let dir = PathBuf::from(dir);
        if let Err(err) = std::fs::create_dir_all(&dir) {
            println!("cargo:warning=cannot create {}: {err}", dir.display());
            return;
        }
        bindings.write_to_file(dir.join("cep_lookup.h"));
    }
}
