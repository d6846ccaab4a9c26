//! # CRD Generator
//!
//! Generates Kubernetes CustomResourceDefinition (CRD) YAML from Rust type definitions.
//!
//! ## Usage
//!
//! ```bash
//! # Generate both CRDs
//! cargo run --bin crdgen > config/crd/bases.yaml
//!
//! # Generate one and apply directly
//! cargo run --bin crdgen -- --kind wavefront | kubectl apply -f -
//! ```

use clap::{Parser, ValueEnum};
use kube::core::CustomResourceExt;
use wavefront_operator::crd::{ResourceOverrideSet, Wavefront};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Kind {
    Wavefront,
    ResourceOverrideSet,
}

#[derive(Debug, Parser)]
#[command(name = "crdgen", about = "Print the operator's CustomResourceDefinitions as YAML")]
struct Cli {
    /// Only print this kind; both are printed when omitted
    #[arg(long, value_enum)]
    kind: Option<Kind>,
}

fn main() {
    let cli = Cli::parse();
    let crds = match cli.kind {
        Some(Kind::Wavefront) => vec![Wavefront::crd()],
        Some(Kind::ResourceOverrideSet) => vec![ResourceOverrideSet::crd()],
        None => vec![Wavefront::crd(), ResourceOverrideSet::crd()],
    };

    println!("# This file is auto-generated by crdgen");
    println!("# DO NOT EDIT THIS FILE MANUALLY");
    println!("#");
    for crd in crds {
        match serde_yaml::to_string(&crd) {
            Ok(yaml) => {
                println!("---");
                print!("{yaml}");
            }
            Err(e) => {
                eprintln!("Failed to serialize CRD to YAML: {e}");
                std::process::exit(1);
            }
        }
    }
}
