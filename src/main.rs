use std::{env, path::Path, process};

use anyhow::Context;
use log::info;
use visual_dna::{merge_all, CodecConfig, GaussianDistribution};

/// Names a JSON file holding the `CodecConfig` used when writing archives.
const CODEC_CONFIG_ENV: &str = "VISUAL_DNA_CODEC";

fn usage(program: &str) -> String {
    format!(
        "Usage:\n  {program} inspect <path>\n  {program} merge <out> <in> <in> [<in>...]"
    )
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("visual-dna");

    let result = match args.get(1..).unwrap_or_default() {
        [cmd, path] if cmd == "inspect" => inspect(Path::new(path)),
        [cmd, out, inputs @ ..] if cmd == "merge" && inputs.len() >= 2 => {
            merge(Path::new(out), inputs)
        }
        _ => {
            eprintln!("{}", usage(program));
            process::exit(2);
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn codec_config() -> anyhow::Result<CodecConfig> {
    match env::var_os(CODEC_CONFIG_ENV) {
        Some(path) => CodecConfig::from_json_file(&path)
            .with_context(|| format!("reading codec config {}", Path::new(&path).display())),
        None => Ok(CodecConfig::default()),
    }
}

fn inspect(path: &Path) -> anyhow::Result<()> {
    let dist = GaussianDistribution::open(path)
        .with_context(|| format!("opening {}", path.display()))?;

    println!(
        "{} distribution, {} sample(s), {} layer(s), {} neuron(s), extractor: {}",
        dist.kind(),
        dist.sample_count(),
        dist.num_layers(),
        dist.num_neurons(),
        dist.extractor().unwrap_or("unknown")
    );

    if !dist.has_measured_variance() {
        println!("variances are placeholders: fitted from a single sample");
    }

    for layer in dist.layer_names() {
        let stats = dist.layer(layer)?;
        println!(
            "  {layer}: {} neuron(s), mean mu {:.6}, mean var {:.6}",
            stats.len(),
            stats.mu().mean().unwrap_or(f64::NAN),
            stats.var().mean().unwrap_or(f64::NAN)
        );
    }

    Ok(())
}

fn merge(out: &Path, inputs: &[String]) -> anyhow::Result<()> {
    let config = codec_config()?;

    let shards = inputs
        .iter()
        .map(|input| {
            GaussianDistribution::open(Path::new(input))
                .with_context(|| format!("opening {input}"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let merged = merge_all(&shards).context("merging distributions")?;
    merged
        .save(out, &config)
        .with_context(|| format!("saving {}", out.display()))?;

    info!(
        "merged {} distributions into {} ({} samples)",
        shards.len(),
        out.display(),
        merged.sample_count()
    );
    Ok(())
}
