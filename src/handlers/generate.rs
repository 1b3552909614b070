use crate::{GenerateOptions, generate};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

/// Read a job description, generate manifests, and write them out.
///
/// `None` for either path means standard input/output. Nothing is written unless
/// generation succeeds for every job.
pub fn handle_generate(
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    options: &GenerateOptions,
) -> crate::Result<()> {
    let content = read_input(input.as_deref())?;
    let manifests = generate(&content, options)?;
    write_output(output.as_deref(), &manifests)?;
    Ok(())
}

fn read_input(path: Option<&Path>) -> crate::Result<String> {
    match path {
        Some(path) => {
            log::info!("Reading job description from {}", path.display());
            Ok(fs::read_to_string(path)?)
        }
        None => {
            log::info!("Reading job description from stdin");
            let mut content = String::new();
            io::stdin().read_to_string(&mut content)?;
            Ok(content)
        }
    }
}

fn write_output(path: Option<&Path>, manifests: &str) -> crate::Result<()> {
    match path {
        Some(path) => {
            log::info!("Writing manifests to {}", path.display());
            fs::write(path, manifests)?;
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(manifests.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}
