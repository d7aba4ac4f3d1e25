mod report;

use std::path::{Path, PathBuf};

use davfs_nautilus::{FileStatusProvider, StatusConfig};
use report::{print_mount_notice, print_mount_points, print_path_reports, print_settings};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, PartialEq, Eq)]
enum CliMode {
    Resolve(Vec<PathBuf>),
    Mounts,
    Info(PathBuf),
    ShowSettings,
    Help,
}

fn parse_cli_mode<I>(args: I) -> anyhow::Result<CliMode>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter().skip(1);
    let mut paths = Vec::new();
    let mut mode = None;
    while let Some(arg) = args.next() {
        let next = match arg.as_str() {
            "--mounts" => CliMode::Mounts,
            "--show-settings" => CliMode::ShowSettings,
            "--info" => {
                let Some(path) = args.next() else {
                    anyhow::bail!("--info expects a path");
                };
                CliMode::Info(absolute(Path::new(&path)))
            }
            "--help" | "-h" => return Ok(CliMode::Help),
            other if other.starts_with('-') && other != "-" => {
                anyhow::bail!("unknown argument: {other}")
            }
            path => {
                paths.push(absolute(Path::new(path)));
                continue;
            }
        };
        if mode.replace(next).is_some() {
            anyhow::bail!("only one of --mounts, --info, --show-settings may be given");
        }
    }

    match mode {
        Some(mode) if paths.is_empty() => Ok(mode),
        Some(_) => anyhow::bail!("paths cannot be combined with --mounts, --info or --show-settings"),
        None if paths.is_empty() => anyhow::bail!("no paths given (see --help)"),
        None => Ok(CliMode::Resolve(paths)),
    }
}

// Relative arguments are anchored at the working directory; symlinks are left alone.
fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn print_help() {
    println!("Usage: davfs-status [PATH... | --mounts | --info PATH | --show-settings]");
    println!("  PATH...          Print the sync state of each path as JSON");
    println!("  --mounts         List the davfs-sync mount points");
    println!("  --info PATH      Show which mount contains PATH");
    println!("  --show-settings  Print the effective configuration");
    println!("Environment: DAVFS_MOUNT_TABLE, DAVFS_MOUNT_TTL_MS, DAVFS_MATCH_ANY_FUSE, RUST_LOG");
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let mode = parse_cli_mode(std::env::args())?;
    let config = StatusConfig::from_env();
    tracing::debug!(?config, "loaded configuration");
    let provider = FileStatusProvider::from_config(&config);
    match mode {
        CliMode::Resolve(paths) => print_path_reports(&provider, &paths),
        CliMode::Mounts => print_mount_points(&provider),
        CliMode::Info(path) => print_mount_notice(&provider, &path),
        CliMode::ShowSettings => print_settings(&config),
        CliMode::Help => {
            print_help();
            Ok(())
        }
    }
}
