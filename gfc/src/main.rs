use gfc_schema::args::{clap::Parser, Args, Command, ControlArgs};

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match &args.command {
        None => gfc_daemon::run(&args, &ControlArgs::default()),
        Some(Command::Run(control)) => gfc_daemon::run(&args, control),
        Some(Command::Once(control)) => gfc_daemon::once(&args, control),
        Some(Command::Detect(detect)) => gfc_daemon::detect(&args, detect),
    }
}
