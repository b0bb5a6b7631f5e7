use clap::Parser;

fn main() -> miette::Result<()> {
    rmsweep::App::parse().run()
}
