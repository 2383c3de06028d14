use clap::{arg, crate_version, Command};
use fibvec::FibVec;
use std::io::{BufRead, Write};

const RCH: &str = "unreachable was reached";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let long_help = "Examples:
---------
Pack:     `fibvec pack -i numbers.txt -o numbers.fib`
Unpack:   `fibvec unpack -i numbers.fib`
Stats:    `fibvec stats -i numbers.fib`";

    let mut main_cmd = Command::new("fibvec")
        .about("Compress and query a Fibonacci-coded integer vector")
        .after_long_help(long_help)
        .version(crate_version!());

    main_cmd = main_cmd.subcommand(
        Command::new("pack")
            .arg(arg!(-i --input <PATH> "newline-delimited signed integers").required(true))
            .arg(arg!(-o --output <PATH> "output path for the serialized vector").required(true))
            .about("build a vector from a file and serialize it"),
    );
    main_cmd = main_cmd.subcommand(
        Command::new("unpack")
            .arg(arg!(-i --input <PATH> "serialized vector path").required(true))
            .about("print every value in a serialized vector, one per line"),
    );
    main_cmd = main_cmd.subcommand(
        Command::new("stats")
            .arg(arg!(-i --input <PATH> "serialized vector path").required(true))
            .about("print length, size, and bytes-per-value for a serialized vector"),
    );

    let matches = main_cmd.get_matches();

    if let Some(cmd) = matches.subcommand_matches("pack") {
        let path_in = cmd.get_one::<String>("input").expect(RCH);
        let path_out = cmd.get_one::<String>("output").expect(RCH);
        let file = std::fs::File::open(path_in)?;
        let mut vec = FibVec::new();
        for line in std::io::BufReader::new(file).lines() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let n: i64 = trimmed.parse()?;
            vec.add(n)?;
        }
        std::fs::write(path_out, vec.encode())?;
        println!("len={} size={}", vec.len(), vec.size());
    }

    if let Some(cmd) = matches.subcommand_matches("unpack") {
        let path_in = cmd.get_one::<String>("input").expect(RCH);
        let blob = std::fs::read(path_in)?;
        let vec = FibVec::decode(&blob)?;
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        if vec.len() > 0 {
            for v in vec.get_values(0, vec.len())? {
                writeln!(out, "{v}")?;
            }
        }
    }

    if let Some(cmd) = matches.subcommand_matches("stats") {
        let path_in = cmd.get_one::<String>("input").expect(RCH);
        let blob = std::fs::read(path_in)?;
        let vec = FibVec::decode(&blob)?;
        let len = vec.len();
        let size = vec.size();
        let bytes_per_value = if len > 0 { size as f64 / len as f64 } else { 0.0 };
        println!("len={len} size={size} bytes_per_value={bytes_per_value:.3}");
    }

    Ok(())
}
