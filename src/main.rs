use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use slider_pg::projection::{com_zmp_along_x, com_zmp_along_y, feet_height, footprints, ComZmpCurves};
use slider_pg::stability::{LegReach, ValidityOracle, ZmpInsideFootprints};
use slider_pg::trajectory::InstantFeatures;
use slider_pg::{Composition, PlannerConfig, SlidingPlanner};

#[derive(Parser, Debug)]
#[command(name = "slider-pg")]
#[command(about = "Generate a sliding half-step walking trajectory")]
struct Args {
    /// TOML planner configuration (defaults to two 10 cm steps)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory receiving the .dat plot files
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Reject samples whose ZMP leaves the support polygon by less than this
    /// margin (m)
    #[arg(long)]
    zmp_margin: Option<f64>,

    /// Reject samples where a foot is farther from the CoM than a two-link
    /// leg with these segment lengths (m) can reach
    #[arg(long, num_args = 2, value_names = ["UPPER", "LOWER"])]
    leg_reach: Option<Vec<f64>>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => PlannerConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => PlannerConfig::default(),
    };

    let zmp_check = args
        .zmp_margin
        .map(|margin| ZmpInsideFootprints::new(config.ft_dim).with_margin(margin));
    let leg_reach = match args.leg_reach.as_deref() {
        Some(&[upper, lower]) => Some(LegReach::new(upper, lower)),
        _ => None,
    };
    let oracle = move |sample: &InstantFeatures| {
        zmp_check.map_or(true, |check| check.is_valid(sample))
            && leg_reach.map_or(true, |reach| reach.is_valid(sample))
    };

    let planner = SlidingPlanner::new(config.clone(), oracle)?;
    let composition = planner.produce_traj(&config.steps)?;
    print_summary(&composition);

    if let Some(dir) = &args.output {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        write_outputs(dir, &composition, &config)?;
        info!(dir = %dir.display(), "plot files written");
    }
    Ok(())
}

fn print_summary(composition: &Composition) {
    let traj = &composition.trajectory;
    println!("Sliding walking pattern");
    println!("=======================\n");
    println!("  Half-steps:     {}", composition.half_steps.len());
    println!("  Samples:        {}", traj.size());
    println!("  Duration:       {:.3} s", traj.duration());
    println!("  Start indexes:  {:?}", traj.half_steps_start_indexes);
    if let Some(last) = traj.last() {
        println!("  Final CoM:      [{:.3}, {:.3}, {:.3}]", last.com_x, last.com_y, last.com_height);
    }
    println!();
    println!("{:<6} {:<8} {:<20} {:<10} {:<10}", "Step", "Support", "Landing [x, y, th]", "Overlap", "Height");
    println!("{}", "-".repeat(58));
    for (i, h) in composition.half_steps.iter().enumerate() {
        let landing = h.landing_pose();
        println!(
            "{:<6} {:<8} [{:.2}, {:.2}, {:.2}]   {:<10.3} {:<10.3}",
            i,
            format!("{:?}", h.definition.support_foot),
            landing.x,
            landing.y,
            landing.theta,
            h.negative_overlap,
            h.reduction_coef,
        );
    }
    for rejection in &composition.rejections {
        println!("  ! {rejection}");
    }
}

fn create(dir: &Path, name: &str) -> Result<BufWriter<File>> {
    let path = dir.join(name);
    let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    Ok(BufWriter::new(file))
}

fn write_com_zmp(dir: &Path, name: &str, curves: &ComZmpCurves) -> Result<()> {
    let mut out = create(dir, name)?;
    writeln!(out, "# t com zmp")?;
    for (&(t, com), &(_, zmp)) in curves.com.iter().zip(&curves.zmp) {
        writeln!(out, "{t:.4} {com:.6} {zmp:.6}")?;
    }
    out.flush()?;
    Ok(())
}

fn write_outputs(dir: &Path, composition: &Composition, config: &PlannerConfig) -> Result<()> {
    let traj = &composition.trajectory;
    write_com_zmp(dir, "com_zmp_x.dat", &com_zmp_along_x(traj))?;
    write_com_zmp(dir, "com_zmp_y.dat", &com_zmp_along_y(traj))?;

    let feet = feet_height(traj);
    let mut out = create(dir, "feet_height.dat")?;
    writeln!(out, "# t left right")?;
    for (&(t, left), &(_, right)) in feet.left.iter().zip(&feet.right) {
        writeln!(out, "{t:.4} {left:.6} {right:.6}")?;
    }
    out.flush()?;

    // Closed polygons separated by blank lines.
    let mut out = create(dir, "steps.dat")?;
    writeln!(out, "# x y")?;
    for corners in footprints(composition, &config.ft_dim) {
        for p in corners.iter().chain(corners.first()) {
            writeln!(out, "{:.6} {:.6}", p.x, p.y)?;
        }
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}
