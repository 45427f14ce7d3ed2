use concierge::app;

fn output_header() -> &'static str {
    "Concierge\nConcierge is a Discord community-management bot with guild-configurable onboarding workflows."
}

fn print_header() {
    println!("{}\n", output_header());
}

fn run() -> Result<(), String> {
    print_header();
    let args: Vec<String> = std::env::args().skip(1).collect();
    let output = app::run_cli(args)?;
    println!("{output}");
    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
