//! Usage text
//!
//! Each built-in manifest version has its own hand-written usage text. A
//! custom manifest file gets a listing generated from its command summaries.

use isle_core::CliManifest;
use std::io::{self, Write};

const USAGE_V1: &str = r#"Isle-Mesh CLI - Orchestrate Isle-Mesh Docker Compose projects

Usage:
  isle <command> [subcommand] [options]

Commands:
  test-cli              - Test if the CLI is working
  uninstall             - Uninstall this CLI tool globally

  run [project]         - Run a specific project using Docker Compose

  mesh-proxy|proxy [action] - Manage mesh-proxy
    up                  - Start the mesh-proxy services
    down                - Stop the mesh-proxy services
    build               - Build the mesh-proxy builder
    logs                - View mesh-proxy logs

  embed-jinja|jinja [action] - Manage embed-jinja (framework automation)
    up/start            - Start embed-jinja auto workflow
    down/stop           - Stop embed-jinja services
    logs                - View workflow logs
    app-logs            - View application logs
    status              - Show service status
    clean               - Clean and reset

  mdns [action]         - Manage Isle Mesh mDNS system setup (REAL infrastructure)
    install/up          - Install mDNS on host system
    uninstall/down      - Uninstall mDNS from host
    status              - Check installation status
    broadcast           - Test mDNS broadcast

  sample <name> [action] - Manage sample/demo environments (EXAMPLES)
    localhost-mdns      - Hand-crafted localhost mDNS demo
    list                - List available samples

  help                  - Show this help message

Examples:
  isle mesh-proxy build                # Build mesh proxy
  isle jinja up                        # Start embed-jinja automation
  isle mdns install                    # Install real mDNS system
  isle sample localhost-mdns up        # Start demo environment
  isle sample list                     # List sample projects
"#;

const USAGE_V2: &str = r#"Isle-Mesh CLI - Orchestrate Isle-Mesh networks and mesh-apps

Usage:
  isle <namespace> <subcommand> [options]
  isle <command> [options]

Namespaces:
  app <subcommand>      - Manage mesh-apps in the current project
    init                - Initialize a mesh-app
    up/down             - Start/stop the mesh-app (Docker Compose)
    logs/ps             - View logs and running services
    prune               - Remove stopped containers and volumes
    scaffold            - Generate a mesh-app from a compose file
    config              - Show or edit the mesh-app configuration
    discover            - Discover services on the mesh
    ssl <action>        - Manage SSL certificates
    sample <name>       - Manage sample/demo environments

  router <subcommand>   - Control the network-namespace router
    up/down             - Start/stop the router
    status              - Show router status
    logs                - View router logs

  agent <subcommand>    - Control the mesh agent
    up/down             - Start/stop the agent and its proxy
    status              - Show agent status
    mdns <action>       - Manage mDNS broadcasting
    logs                - View agent logs

Global commands:
  create                - Create a new mesh-app in the current directory
  install [target]      - Install the CLI or an optional component
  uninstall [target]    - Uninstall the CLI or an optional component
  permissions [args]    - Inspect and repair script permissions
  fix-docker [args]     - Add your user to the docker group
  help                  - Show this help message

Examples:
  isle app up                          # Start the mesh-app in this directory
  isle app ssl generate                # Generate certificates
  isle router up                       # Start the router
  isle agent mdns status               # Check mDNS broadcasting
  isle app sample localhost-mdns up    # Start demo environment
"#;

/// Hand-written usage for a built-in manifest version
pub fn usage(version: &str) -> Option<&'static str> {
    match version {
        "v1" => Some(USAGE_V1),
        "v2" => Some(USAGE_V2),
        _ => None,
    }
}

/// Write usage text for the active manifest
pub fn render<W: Write>(manifest: &CliManifest, out: &mut W) -> io::Result<()> {
    if let Some(text) = usage(&manifest.version) {
        return write!(out, "{}", text);
    }

    writeln!(out, "Isle-Mesh CLI ({})", manifest.version)?;
    writeln!(out)?;
    writeln!(out, "Usage:")?;
    writeln!(out, "  isle <command> [subcommand] [options]")?;
    writeln!(out)?;
    writeln!(out, "Commands:")?;
    for spec in manifest.commands.iter().filter(|c| c.is_dispatchable()) {
        let mut names = vec![spec.name.as_str()];
        names.extend(spec.aliases.iter().map(String::as_str));
        writeln!(out, "  {:<22}- {}", names.join("|"), spec.summary)?;
    }
    writeln!(out, "  {:<22}- Show this help message", "help")?;
    Ok(())
}
