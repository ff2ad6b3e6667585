mod app;

use clap::Parser;

use app::{Args, FolderViewApp};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("folderview=info".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    let app = FolderViewApp::new(Args::parse());
    std::process::exit(app.run());
}
