//! CSMA/CD 仿真入口
//!
//! 构建参考拓扑、运行仿真并打印汇总。

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use csmacd_sim::net::Network;
use csmacd_sim::report::{ReportLog, RunSummary};
use csmacd_sim::topo::single_bus::{SingleBusOpts, build_single_bus};
use csmacd_sim::topo::two_segment::{TwoSegmentOpts, build_two_segment};
use csmacd_sim::{SimConfig, SimError};
use tracing::error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Topology {
    SingleBus,
    TwoSegment,
}

#[derive(Debug, Parser)]
#[command(name = "csmacd-sim", about = "CSMA/CD 共享介质 + 双网段路由仿真")]
struct Args {
    /// JSON 配置文件（缺省字段取参考值）
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Topology::TwoSegment)]
    topology: Topology,

    /// 单总线拓扑的站点总数；双网段拓扑为每个网段的站点数
    #[arg(long, default_value_t = 2)]
    stations: usize,

    /// 双网段之间的并行链路数
    #[arg(long, default_value_t = 2)]
    links: usize,

    /// 仿真运行多少毫秒（覆盖配置文件）
    #[arg(long)]
    duration_ms: Option<u64>,

    #[arg(long)]
    seed: Option<u64>,

    /// 每时隙每站点的平均到达帧数
    #[arg(long)]
    arrival_mean: Option<f64>,

    /// 输出事件 JSON 文件
    #[arg(long)]
    report_json: Option<PathBuf>,

    /// 以 JSON 打印汇总
    #[arg(long)]
    summary_json: bool,
}

fn load_config(args: &Args) -> Result<SimConfig, SimError> {
    let mut config = match &args.config {
        Some(path) => SimConfig::from_json_file(path)?,
        None => SimConfig::default(),
    };
    if let Some(ms) = args.duration_ms {
        config.duration_us = ms.saturating_mul(1_000);
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(mean) = args.arrival_mean {
        config.arrival_mean = mean;
    }
    Ok(config)
}

fn print_summary(summary: &RunSummary) {
    println!("There were {} collisions.", summary.total_collisions);
    for s in &summary.stations {
        println!(
            "Node {} has {} waiting\n\tand has {} collisions\n\tand sent out {} frames.",
            s.name, s.outstanding, s.collisions, s.sent
        );
    }
    println!(
        "done @ {:.6}s, delivered_frames={}, hop_deliveries={}",
        summary.ended_at_us as f64 / 1_000_000.0,
        summary.frames_delivered,
        summary.hop_deliveries
    );
}

fn run(args: Args) -> Result<(), SimError> {
    let config = load_config(&args)?;
    let mut net = Network::new(config);

    match args.topology {
        Topology::SingleBus => {
            build_single_bus(&mut net, &SingleBusOpts { stations: args.stations })?;
        }
        Topology::TwoSegment => {
            build_two_segment(
                &mut net,
                &TwoSegmentOpts {
                    stations_per_segment: args.stations,
                    parallel_links: args.links,
                },
            )?;
        }
    }

    let log = ReportLog::default();
    if args.report_json.is_some() {
        net.set_sink(log.clone());
    }

    let summary = net.run()?;

    if args.summary_json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }

    if let Some(path) = args.report_json {
        let json = serde_json::to_string_pretty(&log.events())?;
        fs::write(&path, json).map_err(|source| SimError::ReportWrite {
            path: path.clone(),
            source,
        })?;
        eprintln!("wrote report events to {}", path.display());
    }
    Ok(())
}

fn main() -> ExitCode {
    // 初始化 tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "仿真中止");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
