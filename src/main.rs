//! populator - fill user folders with synthetic documents

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use log::LevelFilter;

use populator::{
    FileFactory, Format, PopulateConfig, PopulateStats, populate, target_folders,
    user_directories, validate,
};

#[derive(Parser)]
#[command(name = "populator")]
#[command(version, about = "Fill user folders with synthetic documents", long_about = None)]
#[command(after_help = "EXAMPLES:
    populator                                Populate every account under C:\\Users
    populator --users-root /home             Populate every account under /home
    populator ./Desktop ./Documents          Populate the given folders only
    populator --sample pdf --output a.pdf    Write a single PDF")]
struct Cli {
    /// Folders to populate directly (skips user discovery)
    #[arg(value_name = "DIR")]
    dirs: Vec<PathBuf>,

    /// Directory holding one folder per user account
    #[arg(long, value_name = "PATH", default_value = default_users_root())]
    users_root: PathBuf,

    /// Seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// JSON file with population settings
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Validate every file after writing it
    #[arg(long)]
    verify: bool,

    /// Suppress informational messages
    #[arg(short, long)]
    quiet: bool,

    /// Also append log records to this file
    /// [default: created_files.txt beside the executable]
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Write a single file of this format instead of populating folders
    #[arg(long, value_name = "EXT", requires = "output")]
    sample: Option<Format>,

    /// Destination for --sample
    #[arg(short, long, value_name = "PATH", requires = "sample")]
    output: Option<PathBuf>,
}

fn default_users_root() -> &'static str {
    if cfg!(windows) { "C:\\Users" } else { "/home" }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let log_path = cli.log_file.clone().unwrap_or_else(default_log_file);
    match OpenOptions::new().create(true).append(true).open(&log_path) {
        Ok(file) => init_logging(cli.quiet, Some(file)),
        Err(e) => {
            init_logging(cli.quiet, None);
            log::warn!("Logging to the terminal only, cannot open {}: {e}", log_path.display());
        }
    }

    let mut factory = match cli.seed {
        Some(seed) => FileFactory::seeded(seed),
        None => FileFactory::from_entropy(),
    };

    let result = match (cli.sample, &cli.output) {
        (Some(format), Some(output)) => write_sample(&mut factory, format, output, cli.verify),
        _ => run(&mut factory, &cli),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn default_log_file() -> PathBuf {
    let name = Path::new("created_files.txt");
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(name)))
        .unwrap_or_else(|| name.to_path_buf())
}

/// Copies every log record to stderr and a persistent file.
struct Tee {
    file: File,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        self.file.flush()
    }
}

fn init_logging(quiet: bool, file: Option<File>) {
    let level = if quiet {
        LevelFilter::Warn
    } else {
        LevelFilter::Info
    };
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(level)
        .parse_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        });
    if let Some(file) = file {
        builder.target(env_logger::Target::Pipe(Box::new(Tee { file })));
    }
    builder.init();
}

fn load_config(cli: &Cli) -> Result<PopulateConfig, String> {
    let mut config = match &cli.config {
        Some(path) => {
            let data = fs::read_to_string(path)
                .map_err(|e| format!("reading {}: {e}", path.display()))?;
            serde_json::from_str(&data).map_err(|e| format!("parsing {}: {e}", path.display()))?
        }
        None => PopulateConfig::default(),
    };
    config.verify |= cli.verify;
    if config.formats.is_empty() {
        return Err("config enables no formats".to_string());
    }
    Ok(config)
}

fn run(factory: &mut FileFactory, cli: &Cli) -> Result<(), String> {
    let config = load_config(cli)?;

    let stats = if cli.dirs.is_empty() {
        let users = user_directories(&cli.users_root, &config).map_err(|e| e.to_string())?;
        let mut stats = PopulateStats::default();
        for user in users {
            log::info!("Processing user: {}", user.display());
            match target_folders(&user, &config) {
                Ok(dirs) => stats += populate(factory, &dirs, &config),
                Err(e) => log::warn!("Skipping {}: {e}", user.display()),
            }
        }
        stats
    } else {
        populate(factory, &cli.dirs, &config)
    };

    log::info!(
        "Created {} files in {} new subdirectories ({} failures)",
        stats.files,
        stats.subdirs,
        stats.failures
    );
    Ok(())
}

fn write_sample(
    factory: &mut FileFactory,
    format: Format,
    output: &Path,
    verify: bool,
) -> Result<(), String> {
    factory
        .create_file(output, format.extension())
        .map_err(|e| e.to_string())?;
    if verify {
        let bytes = fs::read(output).map_err(|e| e.to_string())?;
        validate::check(format, &bytes).map_err(|e| e.to_string())?;
    }
    log::info!("File created: {}", output.display());
    Ok(())
}
