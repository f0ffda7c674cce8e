use clap::Parser;
use modula_cli::{CliArgs, ModulaCli};

fn main() {
    let args = CliArgs::parse();

    let result = ModulaCli::from_args("modula", &args).and_then(|cli| cli.run(args));
    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
