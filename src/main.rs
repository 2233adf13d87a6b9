use std::env;
use std::process;

use squaremat::simd::backend_name;
use squaremat::validate::{validate_strategy, SWEEP_LEN};
use squaremat::Strategy;

struct Config {
    runs: usize,
    lower: i32,
    upper: i32,
    strategies: Vec<Strategy>,
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("squaremat");
    if args.len() < 4 {
        print_usage(program);
        return;
    }

    let config = match parse_args(&args[1..]) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            print_usage(program);
            process::exit(2);
        }
    };

    assert!(
        config.lower < config.upper,
        "invalid bounds: lower bound {} must be below upper bound {}",
        config.lower,
        config.upper
    );

    println!(
        "{} runs x {SWEEP_LEN} sizes, values in [{}, {}], {} lanes",
        config.runs,
        config.lower,
        config.upper,
        backend_name()
    );

    for strategy in config.strategies {
        match validate_strategy(strategy, config.runs, config.lower, config.upper) {
            Ok(report) => println!("{report}"),
            Err(err) => {
                eprintln!("error: {strategy}: {err}");
                process::exit(1);
            }
        }
    }
}

fn parse_args(args: &[String]) -> Result<Config, String> {
    let runs = args[0]
        .parse::<usize>()
        .map_err(|err| format!("invalid run count '{}': {err}", args[0]))?;
    let lower = parse_bound(&args[1], "lower")?;
    let upper = parse_bound(&args[2], "upper")?;

    let strategies = if args.len() > 3 {
        args[3..]
            .iter()
            .map(|name| name.parse::<Strategy>().map_err(|err| err.to_string()))
            .collect::<Result<Vec<_>, _>>()?
    } else {
        Strategy::ALL
            .into_iter()
            .filter(|&strategy| strategy != Strategy::Naive)
            .collect()
    };

    Ok(Config {
        runs,
        lower,
        upper,
        strategies,
    })
}

fn parse_bound(value: &str, which: &str) -> Result<i32, String> {
    value
        .parse::<i32>()
        .map_err(|err| format!("invalid {which} bound '{value}': {err}"))
}

fn print_usage(program: &str) {
    eprintln!("Usage: {program} <runs> <lower> <upper> [strategy...]");
    eprintln!();
    eprintln!(
        "Checks every strategy against NAIVE for N = 4, 8, ..., 256."
    );
    eprintln!("Strategies (default: all but NAIVE):");
    for strategy in Strategy::ALL {
        eprintln!("  {strategy}");
    }
}
