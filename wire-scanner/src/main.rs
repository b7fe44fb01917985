//! Protocol code generator CLI: reads a `<protocol>` XML file and writes
//! generated Rust bindings for either the client or server side.
//!
//! ```text
//! wire-scanner --xml protocol/wayland.xml --out src/wayland.rs --client
//! wire-scanner --xml protocol/wayland.xml --out src/wayland_server.rs --config wayland.toml
//! ```

mod codegen;
mod config;
mod ident;
mod xml;

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use codegen::Side;
use config::Config;

#[derive(Parser, Debug)]
#[command(name = "wire-scanner", about = "Generate wire-core bindings from a protocol XML file")]
struct Args {
    /// Path to the `<protocol>` XML file.
    #[arg(long = "xml")]
    xml: PathBuf,

    /// Path to write the generated Rust source to.
    #[arg(long = "out")]
    out: PathBuf,

    /// Optional TOML config with the interface-name prefix to strip and any
    /// cross-protocol imports.
    #[arg(long = "config")]
    config: Option<PathBuf>,

    /// Generate client-side bindings (requests sent, events listened for).
    /// Omit for server-side bindings.
    #[arg(long = "client", default_value_t = false)]
    client: bool,
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let side = if args.client { Side::Client } else { Side::Server };

    let cfg = match args.config {
        Some(path) => Config::load(&path, side)?,
        None => Config::empty(),
    };

    let xml_bytes = fs::File::open(&args.xml)
        .map_err(|e| format!("opening {}: {e}", args.xml.display()))?;
    let protocol = xml::parse_stream(xml_bytes)?;

    let source = codegen::generate(&protocol, &cfg, side);

    fs::write(&args.out, source)
        .map_err(|e| format!("writing {}: {e}", args.out.display()))?;

    log::info!(
        "generated {} interfaces from {} into {}",
        protocol.interfaces.len(),
        args.xml.display(),
        args.out.display()
    );
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("wire-scanner: {e}");
            ExitCode::FAILURE
        }
    }
}
