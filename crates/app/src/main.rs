mod html;
mod stream;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:?}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let config = stream::StreamConfig::from_args(&args)?;
    stream::run(config)
}
