//! Generates `$OUT_DIR/config.rs` with the compile-time settings read by `src/config.rs`.
//!
//! Every setting can be overridden with an environment variable named
//! `TROUBLE_STDIO_<NAME>`, e.g. `TROUBLE_STDIO_CONNECTIONS_MAX=1 cargo build`.

use std::env;
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

static CONFIGS: &[(&str, usize)] = &[
    // (name, default)
    ("CONNECTIONS_MAX", 3),
    ("PAYLOAD_MAX", 244),
    ("INPUT_QUEUE_SIZE", 4),
];

/// Slots are labelled `A` through `Z`.
const IDENTITIES_MAX: usize = 26;

fn main() {
    let mut data = String::new();

    for (name, default) in CONFIGS {
        let var = format!("TROUBLE_STDIO_{}", name);
        println!("cargo:rerun-if-env-changed={}", var);

        let value = match env::var(&var) {
            Ok(value) => match value.parse::<usize>() {
                Ok(value) => value,
                Err(_) => panic!("{} must be an unsigned integer, got {:?}", var, value),
            },
            Err(_) => *default,
        };

        if value == 0 {
            panic!("{} must be greater than zero", var);
        }
        if *name == "CONNECTIONS_MAX" && value > IDENTITIES_MAX {
            panic!("{} must be at most {}, one slot per letter", var, IDENTITIES_MAX);
        }

        writeln!(&mut data, "pub const {}: usize = {};", name, value).unwrap();
    }

    let out_dir = PathBuf::from(env::var_os("OUT_DIR").unwrap());
    fs::write(out_dir.join("config.rs"), data).unwrap();
    println!("cargo:rerun-if-changed=build.rs");
}
