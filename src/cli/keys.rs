//! The `keys` subcommand: inspect the working-point key spaces.

use clap::Args;

use crate::wp::{DijetKey, DilepKey, FlatKey, JetKey, LepKey, QuadKey};

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum TableLevel {
    Lepton,
    Dilepton,
    Jet,
    Dijet,
    Quad,
}

#[derive(Args)]
pub struct KeysArgs {
    /// Table level to inspect (all levels when omitted)
    #[arg(long)]
    pub level: Option<TableLevel>,

    /// Decode a flat key value at the selected level
    #[arg(long, requires = "level")]
    pub decode: Option<usize>,
}

/// Execute keys subcommand
///
/// # Errors
///
/// Returns an error when asked to decode a value outside the level's
/// domain.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: KeysArgs) -> anyhow::Result<()> {
    match (args.level, args.decode) {
        (Some(level), Some(raw)) => decode_one(level, raw),
        (Some(level), None) => {
            list_level(level);
            Ok(())
        }
        _ => {
            for level in [
                TableLevel::Lepton,
                TableLevel::Dilepton,
                TableLevel::Jet,
                TableLevel::Dijet,
                TableLevel::Quad,
            ] {
                list_level(level);
            }
            Ok(())
        }
    }
}

fn level_summary(level: TableLevel) -> (&'static str, &'static str, usize) {
    match level {
        TableLevel::Lepton => ("lepton", "(id, iso)", LepKey::DOMAIN),
        TableLevel::Dilepton => ("dilepton", "(id1, iso1, id2, iso2)", DilepKey::DOMAIN),
        TableLevel::Jet => ("jet", "(id, btag)", JetKey::DOMAIN),
        TableLevel::Dijet => (
            "dijet",
            "(id1, id2, btag1, btag2, rank)",
            DijetKey::DOMAIN,
        ),
        TableLevel::Quad => (
            "quad",
            "(lep1 id, lep1 iso, lep2 id, lep2 iso, jet1 id, jet2 id, btag1, btag2, rank)",
            QuadKey::DOMAIN,
        ),
    }
}

fn list_level(level: TableLevel) {
    let (name, fields, domain) = level_summary(level);
    println!("{name}: {domain} cells, field order {fields}");
}

fn decode_one(level: TableLevel, raw: usize) -> anyhow::Result<()> {
    let label = match level {
        TableLevel::Lepton => LepKey::decode(raw).map(|key| key.to_string()),
        TableLevel::Dilepton => DilepKey::decode(raw).map(|key| key.to_string()),
        TableLevel::Jet => JetKey::decode(raw).map(|key| key.to_string()),
        TableLevel::Dijet => DijetKey::decode(raw).map(|key| key.to_string()),
        TableLevel::Quad => QuadKey::decode(raw).map(|key| key.to_string()),
    };
    let (name, _, domain) = level_summary(level);
    match label {
        Some(label) => {
            println!("{name} key {raw} = {label}");
            Ok(())
        }
        None => anyhow::bail!("{raw} is outside the {name} domain (0..{domain})"),
    }
}
