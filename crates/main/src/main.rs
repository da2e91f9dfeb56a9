use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use log::{info, LevelFilter};

use report_helper::config::{Margins, PageSize, ReportSettings};
use report_helper::http::ReportEndpoint;
use report_helper::samples;
use report_helper::Report;

/// Renders or serves the report_helper sample reports.
///
/// PDF geometry defaults to `REPORT_HELPER_MARGINS` and
/// `REPORT_HELPER_PAGE_SIZE`; the flags below take precedence. Flowing
/// documents need the fonts described in `report_helper::fonts`.
#[derive(Parser)]
#[command(author, version, about = "Convenience CLI for report_helper samples")]
struct Cli {
    /// Page margins in centimetres as "top,bottom,left,right".
    #[arg(long, global = true)]
    margins: Option<String>,

    /// Page size: letter, a4 or legal, optionally with a "-landscape" suffix.
    #[arg(long, global = true)]
    page_size: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write every sample report into a directory.
    #[command(name = "render", aliases = ["run-all", "all"])]
    Render {
        #[arg(long, short, default_value = "target/report_samples")]
        output_dir: PathBuf,
    },

    /// Serve the sample reports as downloads.
    #[command(name = "serve")]
    Serve {
        #[arg(long, default_value = "127.0.0.1:8000")]
        addr: String,
    },
}

fn main() {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Info)
        .parse_env(env_logger::Env::default().filter_or("REPORT_HELPER_LOG", "info"))
        .init();

    let cli = Cli::parse();

    let result = settings(&cli).and_then(|settings| match cli.command {
        Commands::Render { output_dir } => render(&output_dir, settings),
        Commands::Serve { addr } => serve(&addr, settings),
    });

    if let Err(err) = result {
        eprintln!("Error: {}", err);
        print_error_sources(err.as_ref());
        std::process::exit(1);
    }
}

fn settings(cli: &Cli) -> Result<ReportSettings, Box<dyn Error>> {
    let mut settings = ReportSettings::from_env()?;
    if let Some(margins) = &cli.margins {
        settings.margins = margins.parse::<Margins>()?;
    }
    if let Some(page_size) = &cli.page_size {
        settings.page_size = page_size.parse::<PageSize>()?;
    }
    Ok(settings)
}

fn render(output_dir: &Path, settings: ReportSettings) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(output_dir)?;

    for mut report in samples::all(settings) {
        let file = report.file()?;
        let path = file.save_in(output_dir)?;
        println!(
            "Generated {} ({}, {} bytes)",
            path.display(),
            file.content_type,
            file.bytes.len()
        );
    }

    println!("All reports rendered successfully.");
    Ok(())
}

fn serve(addr: &str, settings: ReportSettings) -> Result<(), Box<dyn Error>> {
    let mut endpoint = ReportEndpoint::bind(addr)?;
    endpoint
        .route("/libro_mayor.csv", samples::ledger_csv)
        .route("/libro_mayor.pdf", move || samples::ledger_canvas(settings))
        .route("/balance.pdf", move || samples::balance_document(settings))
        .route("/notas.pdf", move || samples::notes_document(settings));

    for path in endpoint.paths() {
        info!("Registered {}", path);
    }
    endpoint.serve()?;
    Ok(())
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}
