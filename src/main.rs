use std::path::PathBuf;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, bail};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use faultgen::config::GenerationConfig;
use faultgen::metadata;
use faultgen::palette::GradientPalette;
use faultgen::rng::splitmix64;

fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn random_seed() -> u32 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    splitmix64(nanos) as u32
}

/// Parse a positional argument, or fall back when it is absent or `-`.
fn parse_arg<T>(raw: Option<&str>, name: &str, default: impl FnOnce() -> T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(s) => s.parse().with_context(|| format!("bad {name} {s:?}")),
        None => Ok(default()),
    }
}

/// Usage: faultgen [seed] [iterations] [base_elevation] [elevation_delta] [out.png] [#rrggbb ...]
fn main() -> anyhow::Result<()> {
    init_logging();
    let args: Vec<String> = std::env::args().collect();
    let defaults = GenerationConfig::default();

    let arg = |i: usize| args.get(i).map(String::as_str).filter(|s| *s != "-");
    let config = GenerationConfig {
        random_seed: parse_arg(arg(1), "seed", random_seed)?,
        iterations_num: parse_arg(arg(2), "iterations", || defaults.iterations_num)?,
        base_elevation: parse_arg(arg(3), "base elevation", || defaults.base_elevation)?,
        elevation_delta: parse_arg(arg(4), "elevation delta", || defaults.elevation_delta)?,
        ..defaults
    };
    config.validate()?;

    let out: PathBuf = arg(5)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("planet.png"));
    let palette = if args.len() > 6 {
        GradientPalette::from_hex(&args[6..])?
    } else {
        GradientPalette::default()
    };

    info!(
        "Generating {}x{} surface with seed={}, iterations={}, base={}, delta={}",
        config.width,
        config.height,
        config.random_seed,
        config.iterations_num,
        config.base_elevation,
        config.elevation_delta
    );

    let on_progress = |p: f32| {
        if p > 0.0 {
            info!("{:3.0}%", p * 100.0);
        }
    };
    let Some((surface, timings)) = faultgen::build_surface(&config, &palette, on_progress, || false)
    else {
        bail!("generation was cancelled");
    };

    info!("Timings:");
    for t in &timings {
        info!("  {:20} {:8.1} ms", t.name, t.ms);
    }

    if let Some(dir) = out.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).context("failed to create output directory")?;
    }
    let png = metadata::encode_png(&surface.rgb, &metadata::to_pairs(&config, &palette))?;
    std::fs::write(&out, png).with_context(|| format!("failed to save {}", out.display()))?;
    info!("Saved {}", out.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_argument_uses_default() {
        assert_eq!(parse_arg::<u32>(None, "iterations", || 2000).unwrap(), 2000);
    }

    #[test]
    fn present_argument_is_parsed() {
        assert_eq!(parse_arg::<i32>(Some("90"), "base elevation", || 100).unwrap(), 90);
    }

    #[test]
    fn malformed_argument_is_an_error() {
        let err = parse_arg::<u32>(Some("lots"), "iterations", || 2000).unwrap_err();
        assert!(err.to_string().contains("bad iterations \"lots\""));
        assert!(parse_arg::<u32>(Some("-3"), "elevation delta", || 2).is_err());
    }
}
