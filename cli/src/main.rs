mod config;
mod test_runner;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use tracing_subscriber::EnvFilter;

use pdl::Blocks;
use viewer::Session;

const SUBCOMMANDS: &[&str] = &["render", "code", "outline", "check", "test", "help"];

#[derive(Parser)]
#[command(name = "pdl-view", version, about = "Render PDL execution traces as HTML")]
struct Cli {
    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,

    /// Log rendering steps to stderr (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a trace to a standalone HTML page
    Render(RenderArgs),

    /// Print the cleaned program text of a trace
    Code(TraceArgs),

    /// Print the block kinds of a trace as an indented tree
    Outline(TraceArgs),

    /// Load and render a trace, reporting errors only
    Check(TraceArgs),

    /// Run .test.json test files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct TraceArgs {
    /// JSON trace file
    file: String,
}

#[derive(clap::Args)]
struct RenderArgs {
    /// JSON trace file
    file: String,

    /// Write the page here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Config file (default: pdl-view.toml beside the trace)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Page title
    #[arg(long)]
    title: Option<String>,

    /// Element id of the code slot
    #[arg(long)]
    code_slot_id: Option<String>,

    /// Stylesheet to inline instead of the built-in one
    #[arg(long)]
    stylesheet: Option<PathBuf>,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.json file or directory containing them
    path: String,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    // `pdl-view trace.json` works like `pdl-view render trace.json`.
    let mut args: Vec<String> = std::env::args().collect();
    let first_pos = args
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, a)| !a.starts_with('-'))
        .map(|(pos, a)| (pos, a.clone()));
    if let Some((pos, first)) = first_pos {
        if !SUBCOMMANDS.contains(&first.as_str()) {
            args.insert(pos, "render".to_string());
        }
    }

    let cli = Cli::parse_from(&args);
    init_logging(cli.verbose, cli.no_color);

    match cli.command {
        Command::Render(render_args) => do_render(render_args, cli.no_color),
        Command::Code(trace_args) => {
            let trace = load_trace(&trace_args.file, cli.no_color);
            println!("{}", viewer::code_text(&trace));
        }
        Command::Outline(trace_args) => {
            let trace = load_trace(&trace_args.file, cli.no_color);
            print_outline(&trace, 0);
        }
        Command::Check(trace_args) => {
            let trace = load_trace(&trace_args.file, cli.no_color);
            let _session = start_session(&trace, "code");
            eprintln!("ok: {} renders successfully", trace_args.file);
        }
        Command::Test(test_args) => {
            let path = Path::new(&test_args.path);
            if test_args.list_categories {
                test_runner::list_categories(path);
                return;
            }
            let exit_code = test_runner::run_tests(path, cli.no_color, &test_args.category);
            process::exit(exit_code);
        }
    }
}

fn init_logging(verbose: bool, no_color: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(!no_color)
        .without_time()
        .try_init();
}

fn do_render(args: RenderArgs, no_color: bool) {
    let trace = load_trace(&args.file, no_color);

    let overrides = config::Overrides {
        title: args.title,
        code_slot_id: args.code_slot_id,
        stylesheet: args.stylesheet,
    };
    let settings = config::load_config(Path::new(&args.file), args.config.as_deref(), overrides)
        .and_then(|settings| config::stylesheet(&settings).map(|css| (settings, css)));
    let (settings, css) = match settings {
        Ok(pair) => pair,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };

    let session = start_session(&trace, &settings.code_slot_id);
    let page = session.to_html(&settings, &css);

    match &args.output {
        Some(path) => {
            if let Err(e) = std::fs::write(path, page) {
                eprintln!("error: cannot write '{}': {}", path.display(), e);
                process::exit(1);
            }
            tracing::info!(path = %path.display(), "page written");
        }
        None => print!("{}", page),
    }
}

/// Read and decode a trace file, printing diagnostics and exiting on failure.
fn load_trace(file: &str, no_color: bool) -> Blocks {
    let source = match std::fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", file, e);
            process::exit(1);
        }
    };

    let mut files = SimpleFiles::new();
    let file_id = files.add(file.to_string(), source.clone());

    match pdl::parse_trace(&source, file_id) {
        Ok(trace) => trace,
        Err(error) => {
            let color_choice = if no_color {
                ColorChoice::Never
            } else {
                ColorChoice::Auto
            };
            let writer = StandardStream::stderr(color_choice);
            let config = term::Config::default();
            let diagnostic = error.to_diagnostic();
            let _ = term::emit_to_write_style(&mut writer.lock(), &config, &files, &diagnostic);
            process::exit(1);
        }
    }
}

fn start_session<'a>(trace: &'a Blocks, code_slot_id: &str) -> Session<'a> {
    match Session::new(trace, code_slot_id) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("render error: {}", e);
            process::exit(1);
        }
    }
}

fn print_outline(blocks: &Blocks, indent: usize) {
    let pad = "  ".repeat(indent);
    match blocks {
        Blocks::Scalar(_) => {
            let text = pdl::to_structural_text(blocks);
            let short: String = text.chars().take(40).collect();
            let more = if text.chars().count() > 40 { "..." } else { "" };
            println!("{}{}{}", pad, short.replace('\n', " "), more);
        }
        Blocks::Sequence(items) => {
            for item in items {
                print_outline(item, indent);
            }
        }
        Blocks::Unrecognized(object) => {
            let kind = object.get("kind").map(|kind| kind.to_string()).unwrap_or_default();
            println!("{}(unknown kind {})", pad, kind);
        }
        Blocks::Mapping(map) => {
            println!("{}(no kind)", pad);
            for (key, value) in map {
                println!("{}  {}:", pad, key);
                print_outline(value, indent + 2);
            }
        }
        Blocks::Block(block) => {
            match &block.def {
                Some(def) => println!("{}{} [{}]", pad, block.kind.name(), def),
                None => println!("{}{}", pad, block.kind.name()),
            }
            for child in block.children() {
                print_outline(child, indent + 1);
            }
        }
    }
}
