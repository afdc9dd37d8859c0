use anyhow::Context;
use montyhall::*;
use tracing::{info, Level};

const USAGE: &str = "usage: montyhall [--config <file>] [--trials <n>] [--seed <n>] \
[--parallel] [--play] [--json] [-v]";

#[derive(Debug, Default)]
struct Args {
    config: Option<String>,
    trials: Option<u32>,
    seed: Option<u64>,
    parallel: bool,
    play: bool,
    json: bool,
    verbose: u8,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = Args::default();
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => args.config = Some(value(&mut iter, &arg)?),
            "--trials" => {
                let v = value(&mut iter, &arg)?;
                let trials = v.parse().with_context(|| format!("Invalid --trials value: {v}"))?;
                args.trials = Some(trials);
            }
            "--seed" => {
                let v = value(&mut iter, &arg)?;
                let seed = v.parse().with_context(|| format!("Invalid --seed value: {v}"))?;
                args.seed = Some(seed);
            }
            "--parallel" => args.parallel = true,
            "--play" => args.play = true,
            "--json" => args.json = true,
            "-v" | "--verbose" => args.verbose += 1,
            "-vv" => args.verbose += 2,
            "-h" | "--help" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            other => anyhow::bail!("Unknown argument: {other}\n{USAGE}"),
        }
    }
    Ok(args)
}

fn value(iter: &mut impl Iterator<Item = String>, flag: &str) -> anyhow::Result<String> {
    iter.next().with_context(|| format!("Missing value for {flag}"))
}

// 配置文件打底，命令行参数覆盖
fn load_settings(args: &Args) -> anyhow::Result<Settings> {
    let mut settings = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {path}"))?;
            serde_json::from_str(&text).with_context(|| format!("Invalid config file {path}"))?
        }
        None => Settings::default(),
    };

    if let Some(trials) = args.trials {
        settings.trials = trials;
    }
    if let Some(seed) = args.seed {
        settings.seed = Some(seed);
    }
    settings.parallel |= args.parallel;
    Ok(settings)
}

fn main() -> anyhow::Result<()> {
    let args = parse_args()?;

    let level = match args.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let settings = load_settings(&args)?;
    info!(?settings, "settings loaded");

    if args.play {
        let mut simulator = match settings.seed {
            Some(seed) => Simulator::seeded(seed),
            None => Simulator::from_entropy(),
        };
        let play = simulator.play_one()?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&play)?);
        } else {
            println!("门后内容: {:?}", play.game().doors());
            println!(
                "最初选择: {}，主持人打开: {}",
                play.initial_pick(),
                play.opened_door()
            );
            for (strategy, outcome) in play.outcomes().iter() {
                println!("{strategy}: {outcome:?}");
            }
        }
        return Ok(());
    }

    // 每个策略一行：(策略, 统计)
    let rows: Vec<(Strategy, BatchSummary)> = Strategy::ALL
        .into_iter()
        .map(|s| settings.simulate(s).map(|batch| (s, *batch.summary())))
        .collect::<Result<_>>()?;

    if args.json {
        let summaries: Vec<_> = rows
            .iter()
            .map(|(strategy, summary)| {
                serde_json::json!({
                    "strategy": strategy,
                    "trials": summary.played(*strategy),
                    "wins": summary.wins(*strategy),
                    "win_rate": summary.strategy_win_rate(*strategy),
                    "initial_pick_win": summary.initial_pick_win(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    // first 列：第一次就选中汽车的比例，坚持选择的胜率应与之相同
    println!(
        "{:<8} {:>8} {:>8} {:>8} {:>8}",
        "strategy", "trials", "wins", "win", "first"
    );
    for (strategy, summary) in &rows {
        println!(
            "{:<8} {:>8} {:>8} {:>8.2} {:>8.2}",
            strategy.to_string(),
            summary.played(*strategy),
            summary.wins(*strategy),
            summary.strategy_win_rate(*strategy).unwrap_or_default(),
            summary.initial_pick_rate().unwrap_or_default()
        );
    }

    Ok(())
}
