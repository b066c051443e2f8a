//! Runs the architecture lint over `backend/src`.
//!
//! Pass the backend directory as the only argument, or run from anywhere in
//! the workspace and let the binary find it next to the workspace manifest.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

fn main() -> ExitCode {
    let Some(backend_dir) = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(locate_backend)
    else {
        let _ = writeln!(
            io::stderr().lock(),
            "no backend/ directory found; pass its path as the first argument"
        );
        return ExitCode::FAILURE;
    };

    let outcome = architecture_lint::lint_backend_sources(&backend_dir);
    let mut stderr = io::stderr().lock();
    match outcome {
        Ok(checked) => {
            let _ = writeln!(stderr, "architecture lint passed ({checked} files checked)");
            ExitCode::SUCCESS
        }
        Err(err) => {
            let _ = writeln!(stderr, "{err}");
            ExitCode::FAILURE
        }
    }
}

/// First ancestor of the working directory (then of this crate) holding both
/// a workspace manifest and `backend/`.
fn locate_backend() -> Option<PathBuf> {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let cwd = std::env::current_dir().ok();
    cwd.iter()
        .map(PathBuf::as_path)
        .chain([manifest_dir])
        .flat_map(Path::ancestors)
        .find(|dir| is_workspace_root(dir))
        .map(|dir| dir.join("backend"))
}

fn is_workspace_root(dir: &Path) -> bool {
    dir.join("backend").is_dir()
        && std::fs::read_to_string(dir.join("Cargo.toml"))
            .is_ok_and(|manifest| manifest.contains("[workspace]"))
}
