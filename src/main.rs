//! Merganser - turn statically rendered mermaid code blocks into live
//! diagram containers.
//!
//! # Usage
//!
//! ```bash
//! merganser page.html -o page.out.html
//! merganser --in-place page.html
//! merganser --watch --in-place page.html
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use merganser::app::App;
use merganser::config::{
    ConfigFlags, clear_config_flags, global_config_path, load_config_flags, local_override_path,
    parse_flag_tokens, save_config_flags,
};
use merganser::render::Theme;

/// Turn statically rendered mermaid code blocks into live diagram containers
#[derive(Parser, Debug)]
#[command(name = "merganser", version, about, long_about = None)]
struct Cli {
    /// HTML page to process
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Write the result to a file instead of stdout
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Rewrite the input file in place
    #[arg(long)]
    in_place: bool,

    /// Watch the input file and re-run on changes
    #[arg(short, long)]
    watch: bool,

    /// Only mark the blocks; skip the render bootstrap scripts
    #[arg(long)]
    no_inject: bool,

    /// Report what would change without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Renderer theme for the injected configuration
    #[arg(long, value_enum)]
    theme: Option<Theme>,

    /// Load the rendering library from this URL instead of the default CDN
    #[arg(long, value_name = "URL")]
    script_src: Option<String>,

    /// Selector locating source blocks
    #[arg(long, value_name = "SELECTOR")]
    source_selector: Option<String>,

    /// Selector locating the styled container to replace
    #[arg(long, value_name = "SELECTOR")]
    container_selector: Option<String>,

    /// Class assigned to replacement elements
    #[arg(long, value_name = "CLASS")]
    marker_class: Option<String>,

    /// Save current command-line flags as defaults in .merganserrc
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    if !cli.file.exists() {
        anyhow::bail!("File not found: {}", cli.file.display());
    }

    let app = App::new(cli.file)
        .with_output(cli.output)
        .with_in_place(effective.in_place)
        .with_watch(effective.watch)
        .with_no_inject(effective.no_inject)
        .with_dry_run(cli.dry_run)
        .with_theme(cli.theme.or(effective.theme))
        .with_script_src(cli.script_src.or(effective.script_src))
        .with_selectors(cli.source_selector, cli.container_selector)
        .with_marker_class(cli.marker_class);

    app.run()
}
