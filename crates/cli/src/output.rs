//! Output formatting for CLI

use colored::Colorize;
use isle_core::Error;
use std::io::{self, Write};

const RULE: &str = "═══════════════════════════════════════════════════════════════";

/// Print error message, ignoring a closed stderr
pub fn print_error(message: &str) {
    let _ = writeln!(io::stderr(), "❌ {}", message);
}

/// Headline, explanation and remediation heading for conditions that get a banner
fn banner(err: &Error) -> Option<(&'static str, Vec<String>, &'static str)> {
    match err {
        Error::ScriptValidation { .. } => Some((
            "ERROR: CLI scripts are missing or not executable",
            Vec::new(),
            "The following scripts could not be validated:",
        )),
        Error::DockerGroupMissing { group } => Some((
            "ERROR: Docker Permission Denied",
            vec![
                format!("Your user is not in the \"{}\" group.", group),
                "This is required to run Docker commands without sudo.".to_string(),
            ],
            "To fix this, run the following commands:",
        )),
        Error::DockerDaemonUnreachable { group } => Some((
            "WARNING: Cannot access Docker daemon",
            vec![
                format!("You may be in the \"{}\" group, but the group change hasn't", group),
                "taken effect yet in this session.".to_string(),
            ],
            "To apply the group change, run:",
        )),
        Error::NamespaceRequired { command, namespaces } => Some((
            "ERROR: Command moved under a namespace",
            vec![format!(
                "'isle {}' is no longer a top-level command. It now lives under: {}",
                command,
                namespaces.join(", ")
            )],
            "Use one of:",
        )),
        _ => None,
    }
}

/// Write the user-facing explanation of a fatal condition
pub fn render_fatal<W: Write>(err: &Error, out: &mut W) -> io::Result<()> {
    let steps = err.remediation();

    let Some((title, explanation, heading)) = banner(err) else {
        writeln!(out, "❌ {}", err)?;
        for step in &steps {
            writeln!(out, "   {}", step)?;
        }
        return Ok(());
    };

    writeln!(out, "{}", RULE.red())?;
    writeln!(out, "{}", format!("  {}", title).red().bold())?;
    writeln!(out, "{}", RULE.red())?;
    if !explanation.is_empty() {
        writeln!(out)?;
    }
    for line in &explanation {
        writeln!(out, "{}", line.yellow())?;
    }
    if !steps.is_empty() {
        writeln!(out)?;
        writeln!(out, "{}", heading)?;
        writeln!(out)?;
        for step in &steps {
            writeln!(out, "  {}", step.cyan())?;
        }
    }
    if matches!(err, Error::DockerGroupMissing { .. } | Error::DockerDaemonUnreachable { .. }) {
        writeln!(out)?;
        writeln!(out, "{}", "Then try the command again.".yellow())?;
    }
    writeln!(out, "{}", RULE.red())?;
    Ok(())
}

/// Print a fatal condition to stderr and return the exit code it maps to
pub fn report(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<Error>() {
        Some(e) => {
            let _ = render_fatal(e, &mut io::stderr().lock());
            e.exit_code()
        }
        None => {
            print_error(&format!("{:#}", err));
            isle_core::EXIT_FAILURE
        }
    }
}
