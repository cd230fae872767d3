use syncfrac::model::ParamVector;
use syncfrac::{Metric, PairEvaluator, Suppression, SweepCache, SweepConfig, SweepOrchestrator};

// An analytic stand-in for the external correlation model: a smooth surface
// over the synchrony parameters with a pole-free denominator.
fn correlation(p: &ParamVector) -> f64 {
    let shh = p.get("Shh").unwrap_or(0.0);
    let spp = p.get("Spp").unwrap_or(0.0);
    let mh = p.get("mh").unwrap_or(0.0);
    let mp = p.get("mp").unwrap_or(0.0);
    let cpp = p.get("Cpp").unwrap_or(0.0);
    (shh + spp + cpp + 0.5 * (mh + mp)) / (1.0 + shh * spp + mh * mp)
}

// Two varying parameters at nine samples each; the rest pinned at defaults.
const CONFIG: &str = r#"{
    "args": { "resolution": 9, "processes": 2 },
    "params": {
        "Shh": { "default": 0.5, "range": [0.0, 1.0] },
        "Spp": { "default": 0.3 },
        "mh":  { "default": 0.25, "range": [0.0, 0.5] },
        "mp":  { "default": 0.2 },
        "Cpp": { "default": 0.1 }
    }
}"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = SweepConfig::from_json(CONFIG)?;

    // Cache files land under out/: rerunning the demo replays the aggregate
    // instead of recomputing anything.
    std::fs::create_dir_all("out")?;
    let orchestrator = SweepOrchestrator::new(SweepCache::new("out/demo"), config.settings.workers);

    let evaluator = PairEvaluator::new(correlation, Suppression::parasitoid_synchrony());
    let result = orchestrator.run(&config.space, &evaluator)?;

    println!("varying parameters: {:?}", result.varying());

    // The ratio surface for (Shh, mh): rows sweep Shh, columns sweep mh.
    let shh_samples = config.space.samples("Shh")?;
    let mh_samples = config.space.samples("mh")?;
    let ratio = result
        .get_by_name(Metric::Ratio, "Shh", "mh")
        .expect("pair was swept");

    println!();
    println!("fraction of synchrony (ratio), Shh rows x mh columns:");
    print!("{:>8}", "Shh\\mh");
    for mh in mh_samples {
        print!("{mh:>8.3}");
    }
    println!();
    for (i, shh) in shh_samples.iter().enumerate() {
        print!("{shh:>8.3}");
        for j in 0..mh_samples.len() {
            print!("{:>8.3}", ratio.get(i, j).expect("in range"));
        }
        println!();
    }

    // The 1-D diagonal sweep of mh against itself.
    let diag = result
        .get_by_name(Metric::Num, "mh", "mh")
        .expect("pair was swept");
    println!();
    println!("suppressed correlation (num) along the mh diagonal:");
    for (i, mh) in mh_samples.iter().enumerate() {
        println!("  mh = {mh:.3} -> {:.4}", diag.get(i, i).expect("in range"));
    }

    Ok(())
}
